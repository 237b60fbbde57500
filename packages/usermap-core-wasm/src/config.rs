use serde::{Deserialize, Serialize};

use crate::basemaps::BasemapId;

// Initial view: Montréal, in EPSG:3857
pub const DEFAULT_CENTER: [f64; 2] = [-8_230_000.0, 5_700_000.0];
pub const DEFAULT_ZOOM: f64 = 6.0;

// Viewport fit applied when thematic data arrives
pub const FIT_PADDING_PX: f64 = 50.0;
pub const FIT_DURATION_MS: u32 = 1000;

pub const DATA_ENDPOINT: &str = "/api/data";
pub const ENTRY_PAGE: &str = "/";

/// Settings a host page may override when mounting a map.
/// Every field is optional on the JS side.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MapConfig {
    pub default_basemap: BasemapId,
    pub center: [f64; 2],
    pub zoom: f64,
    pub fit_padding: f64,
    pub fit_duration_ms: u32,
    /// Extra pixels around geometries accepted as a click hit
    pub hit_tolerance: f64,
    pub data_endpoint: String,
    pub entry_page: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            default_basemap: BasemapId::default(),
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            fit_padding: FIT_PADDING_PX,
            fit_duration_ms: FIT_DURATION_MS,
            hit_tolerance: 0.0,
            data_endpoint: DATA_ENDPOINT.to_string(),
            entry_page: ENTRY_PAGE.to_string(),
        }
    }
}
