// Loading the signed-in user's features from the backend.
use js_sys::Reflect;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

use crate::geojson_features::FeatureCollection;
use crate::{console_log, fetch_json};

/// Identifies one data request. Tickets are ordered by issue time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

impl FetchTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

// Ticket numbers travel through JS as plain integers
impl From<u64> for FetchTicket {
    fn from(value: u64) -> Self {
        FetchTicket(value)
    }
}

/// Hands out tickets and tells whether a finished request is still the
/// newest one. Responses for older tickets must not be committed.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: u64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> FetchTicket {
        self.latest += 1;
        FetchTicket(self.latest)
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.latest
    }

    /// Make every outstanding ticket stale, e.g. on sign-out.
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }
}

/// Interpret a data endpoint response.
///
/// `Err` for non-success statuses. `Ok(None)` when the body is not a feature
/// collection (not JSON, or no `features` array). Otherwise the collection,
/// which may be empty.
pub fn read_response(status: u16, body: &str) -> Result<Option<FeatureCollection>, String> {
    if !(200..300).contains(&status) {
        return Err(format!("Data request failed with status {}", status));
    }
    let collection = FeatureCollection::from_json_str(body);
    if collection.is_none() {
        console_log!("Data response has no 'features', treating it as empty");
    }
    Ok(collection)
}

/// GET `url` through the page's JS fetch helper, sending the session cookie.
pub async fn fetch_feature_collection(url: &str) -> Result<Option<FeatureCollection>, String> {
    let promise = fetch_json(url).map_err(|e| js_error("fetch", &e))?;
    let response = JsFuture::from(promise)
        .await
        .map_err(|e| js_error("fetch", &e))?;

    let status = Reflect::get(&response, &JsValue::from_str("status"))
        .map_err(|e| js_error("status", &e))?
        .as_f64()
        .ok_or_else(|| "Response is missing a numeric status".to_string())? as u16;
    let body = Reflect::get(&response, &JsValue::from_str("body"))
        .map_err(|e| js_error("body", &e))?
        .as_string()
        .unwrap_or_default();

    read_response(status, &body)
}

fn js_error(stage: &str, err: &JsValue) -> String {
    format!(
        "Data {} error: {}",
        stage,
        err.as_string().unwrap_or_else(|| format!("{:?}", err))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_latest_ticket_is_current() {
        let mut seq = RequestSequencer::new();
        let first = seq.issue();
        let second = seq.issue();

        assert!(first < second);
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));

        seq.invalidate();
        assert!(!seq.is_current(second));
    }

    #[test]
    fn failed_statuses_are_errors() {
        let err = read_response(401, r#"{"message":"Non autorisé"}"#).unwrap_err();
        assert!(err.contains("401"));
        assert!(read_response(500, "").is_err());
    }

    #[test]
    fn success_without_features_is_no_data() {
        assert_eq!(read_response(200, r#"{"geojson":null}"#), Ok(None));
        assert_eq!(read_response(200, "<html>"), Ok(None));
    }

    #[test]
    fn success_with_features_is_a_collection() {
        let fc = read_response(
            200,
            r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":{"type":"Point","coordinates":[1,2]},"properties":{"id":4}}]}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(fc.len(), 1);

        let empty = read_response(200, r#"{"type":"FeatureCollection","features":[]}"#)
            .unwrap()
            .unwrap();
        assert!(empty.is_empty());
    }
}
