use lazy_static::lazy_static;
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::collections::HashMap;

use crate::config::MapConfig;
use crate::controller::MapController;
use crate::data_provider::FetchTicket;
use crate::geojson_features::FeatureCollection;
use crate::session::{DataUpdate, MapPage, PageCommand, SessionStatus};

/// One mounted map page: its session gate and its map controller.
pub struct MapInstance {
    pub page: MapPage,
    pub controller: MapController,
}

impl MapInstance {
    pub fn new(config: MapConfig) -> Self {
        MapInstance {
            page: MapPage::new(&config),
            controller: MapController::new(config),
        }
    }

    /// Feed a session report through the page gate. Losing the session drops
    /// the previous user's features from the controller.
    pub fn on_session(&mut self, status: SessionStatus) -> Vec<PageCommand> {
        let signed_out = status == SessionStatus::Unauthenticated;
        let commands = self.page.on_session(status);
        if signed_out {
            self.controller.set_thematic_data(None);
        }
        commands
    }

    pub fn sign_out(&mut self) -> PageCommand {
        let command = self.page.sign_out();
        self.controller.set_thematic_data(None);
        command
    }

    /// Apply a finished data request. Returns false for stale responses.
    pub fn apply_data(
        &mut self,
        ticket: FetchTicket,
        result: Result<Option<FeatureCollection>, String>,
    ) -> bool {
        match self.page.on_data(ticket, result) {
            DataUpdate::Commit(collection) => {
                self.controller.set_thematic_data(collection);
                true
            }
            DataUpdate::Ignored => false,
        }
    }
}

// Module state keeping every live map, keyed by handle id
pub struct ModuleState {
    pub maps: HashMap<String, MapInstance>,
}

// Create a global static instance of the module state
lazy_static! {
    static ref MODULE_STATE: ReentrantMutex<RefCell<ModuleState>> =
        ReentrantMutex::new(RefCell::new(ModuleState::new()));
}

impl ModuleState {
    pub fn new() -> Self {
        ModuleState {
            maps: HashMap::new(),
        }
    }

    pub fn with_mut<F, R>(f: F) -> R
    where
        F: FnOnce(&mut ModuleState) -> R,
    {
        let guard = MODULE_STATE.lock();
        let mut borrow = guard.borrow_mut();
        f(&mut borrow)
    }

    pub fn with<F, R>(f: F) -> R
    where
        F: FnOnce(&ModuleState) -> R,
    {
        let guard = MODULE_STATE.lock();
        let borrow = guard.borrow();
        f(&borrow)
    }

    pub fn register(&mut self, id: String, instance: MapInstance) {
        self.maps.insert(id, instance);
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut MapInstance> {
        self.maps.get_mut(id)
    }

    /// Tear the map down and forget it. Returns false for unknown ids.
    pub fn remove(&mut self, id: &str) -> bool {
        match self.maps.remove(id) {
            Some(mut instance) => {
                instance.controller.teardown();
                true
            }
            None => false,
        }
    }

    pub fn map_count(&self) -> usize {
        self.maps.len()
    }
}

impl Default for ModuleState {
    fn default() -> Self {
        Self::new()
    }
}
