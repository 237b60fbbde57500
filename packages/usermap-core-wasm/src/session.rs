// Page-level gate around the map: session status decides whether the map
// page renders, waits or sends the visitor back to the sign-in page.
use serde::Serialize;
use std::sync::Arc;

use crate::config::MapConfig;
use crate::console_log;
use crate::data_provider::{FetchTicket, RequestSequencer};
use crate::geojson_features::FeatureCollection;

pub const SESSION_LOADING_TEXT: &str = "Chargement de la session...";
pub const MAP_LOADING_TEXT: &str = "Chargement de la carte...";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Loading,
    Authenticated { user_name: Option<String> },
    Unauthenticated,
}

impl SessionStatus {
    /// Parse the status strings used by the auth client.
    pub fn parse(status: &str, user_name: Option<String>) -> Result<Self, String> {
        match status {
            "loading" => Ok(SessionStatus::Loading),
            "authenticated" => Ok(SessionStatus::Authenticated { user_name }),
            "unauthenticated" => Ok(SessionStatus::Unauthenticated),
            other => Err(format!("Unknown session status '{}'", other)),
        }
    }
}

/// Side effects the host page must carry out.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PageCommand {
    Redirect { to: String },
    FetchData { url: String, ticket: u64 },
}

/// What the page shows right now.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "view", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PageView {
    /// Session still resolving; show a placeholder.
    Suspended { message: String },
    /// Redirect issued; nothing is rendered.
    Empty,
    /// Signed in, data not yet arrived.
    Loading {
        user_name: Option<String>,
        message: String,
    },
    Map { user_name: Option<String> },
}

#[derive(Clone, Debug, PartialEq)]
enum DataState {
    Pending,
    Loaded(Option<Arc<FeatureCollection>>),
}

/// Outcome of a finished data request.
#[derive(Clone, Debug, PartialEq)]
pub enum DataUpdate {
    /// New thematic data to hand to the map controller.
    Commit(Option<Arc<FeatureCollection>>),
    /// Stale response; nothing to apply.
    Ignored,
}

pub struct MapPage {
    entry_page: String,
    data_endpoint: String,
    status: SessionStatus,
    data: DataState,
    sequencer: RequestSequencer,
}

impl MapPage {
    pub fn new(config: &MapConfig) -> Self {
        MapPage {
            entry_page: config.entry_page.clone(),
            data_endpoint: config.data_endpoint.clone(),
            status: SessionStatus::Loading,
            data: DataState::Pending,
            sequencer: RequestSequencer::new(),
        }
    }

    /// React to a session status report. Reporting the same status twice
    /// produces no new commands.
    pub fn on_session(&mut self, status: SessionStatus) -> Vec<PageCommand> {
        if status == self.status {
            return Vec::new();
        }
        self.status = status;

        match &self.status {
            SessionStatus::Loading => Vec::new(),
            SessionStatus::Unauthenticated => {
                self.sequencer.invalidate();
                self.data = DataState::Pending;
                vec![PageCommand::Redirect {
                    to: self.entry_page.clone(),
                }]
            }
            SessionStatus::Authenticated { .. } => {
                let ticket = self.sequencer.issue();
                vec![PageCommand::FetchData {
                    url: self.data_endpoint.clone(),
                    ticket: ticket.value(),
                }]
            }
        }
    }

    /// Apply a finished request. A failure clears the thematic data but
    /// leaves the page view where it was, so a first load keeps showing the
    /// loading placeholder.
    pub fn on_data(
        &mut self,
        ticket: FetchTicket,
        result: Result<Option<FeatureCollection>, String>,
    ) -> DataUpdate {
        if !self.sequencer.is_current(ticket) {
            console_log!("Discarding stale data response #{}", ticket.value());
            return DataUpdate::Ignored;
        }
        match result {
            Ok(collection) => {
                let collection = collection.map(Arc::new);
                self.data = DataState::Loaded(collection.clone());
                DataUpdate::Commit(collection)
            }
            Err(err) => {
                console_log!("Error loading map data: {}", err);
                DataUpdate::Commit(None)
            }
        }
    }

    /// Ticket for a data request started outside a session transition.
    pub fn refetch(&mut self) -> Option<PageCommand> {
        if !matches!(self.status, SessionStatus::Authenticated { .. }) {
            return None;
        }
        let ticket = self.sequencer.issue();
        Some(PageCommand::FetchData {
            url: self.data_endpoint.clone(),
            ticket: ticket.value(),
        })
    }

    pub fn sign_out(&mut self) -> PageCommand {
        self.status = SessionStatus::Unauthenticated;
        self.data = DataState::Pending;
        self.sequencer.invalidate();
        PageCommand::Redirect {
            to: self.entry_page.clone(),
        }
    }

    pub fn view(&self) -> PageView {
        match (&self.status, &self.data) {
            (SessionStatus::Loading, _) => PageView::Suspended {
                message: SESSION_LOADING_TEXT.to_string(),
            },
            (SessionStatus::Unauthenticated, _) => PageView::Empty,
            (SessionStatus::Authenticated { user_name }, DataState::Pending) => PageView::Loading {
                user_name: user_name.clone(),
                message: MAP_LOADING_TEXT.to_string(),
            },
            (SessionStatus::Authenticated { user_name }, DataState::Loaded(_)) => PageView::Map {
                user_name: user_name.clone(),
            },
        }
    }
}
