use serde::Serialize;
use wasm_bindgen::prelude::*;

// Create a console module for logging
pub mod console;
pub mod basemaps;
pub mod config;
pub mod controller;
pub mod data_provider;
pub mod geojson_features;
pub mod layers;
pub mod models;
// Global registry of mounted maps
mod module_state;
pub mod projection;
pub mod session;
pub mod style;
pub mod viewport;

use basemaps::{basemap_options, BasemapId};
use config::MapConfig;
use data_provider::{fetch_feature_collection, FetchTicket};
use module_state::{MapInstance, ModuleState};
use session::{PageCommand, SessionStatus};

// Enable better panic messages in console during development
#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

#[wasm_bindgen]
extern "C" {
    // JavaScript helper performing a credentialed GET, resolving to
    // `{ status, body }`
    #[wasm_bindgen(js_namespace = wasmJsHelpers, js_name = fetchJson, catch)]
    pub fn fetch_json(url: &str) -> Result<js_sys::Promise, JsValue>;
}

// Use the macro from our console module
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => (crate::console::log(&format!($($t)*)))
}

use std::sync::Once;
static INIT: Once = Once::new();

// This sets up the wasm_bindgen start functionality
#[wasm_bindgen(start)]
pub fn start() {
    INIT.call_once(|| {
        // Set the panic hook for better error messages
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        console_log!("usermap WASM module initialized");
    });
}

// Plain JSON-compatible objects rather than JS Maps
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize result: {}", e)))
}

fn unknown_map(id: &str) -> JsValue {
    JsValue::from_str(&format!("No map registered with id '{}'", id))
}

fn redirect(to: &str) {
    let Some(window) = web_sys::window() else {
        console_log!("No window available to redirect to {}", to);
        return;
    };
    if let Err(e) = window.location().set_href(to) {
        console_log!("Redirect to {} failed: {:?}", to, e);
    }
}

/// Ordered `{ id, name }` list for the basemap picker.
#[wasm_bindgen]
pub fn get_basemap_options() -> Result<JsValue, JsValue> {
    to_js(&basemap_options())
}

/// Number of registered maps, to spot handles that were never disposed.
#[wasm_bindgen]
pub fn active_map_count() -> usize {
    ModuleState::with(|state| state.map_count())
}

/// JS handle on one mounted map page.
#[wasm_bindgen]
pub struct MapHandle {
    id: String,
}

#[wasm_bindgen]
impl MapHandle {
    /// Register a new map. `config` is an optional partial `MapConfig`.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<MapHandle, JsValue> {
        start();
        let config: MapConfig = if config.is_undefined() || config.is_null() {
            MapConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid map config: {}", e)))?
        };

        let id = uuid::Uuid::new_v4().to_string();
        ModuleState::with_mut(|state| state.register(id.clone(), MapInstance::new(config)));
        Ok(MapHandle { id })
    }

    #[wasm_bindgen(getter)]
    pub fn id(&self) -> String {
        self.id.clone()
    }

    /// Create the display for the element `mount`. Returns false if the map
    /// was already initialized.
    pub fn initialize(&self, mount: &str) -> Result<bool, JsValue> {
        self.with_instance(|m| m.controller.initialize(mount))
    }

    /// Show the basemap `id`. Unknown ids are a configuration error and throw.
    pub fn set_basemap(&self, id: &str) -> Result<(), JsValue> {
        let basemap: BasemapId = id.parse().map_err(|e: String| {
            console_log!("{}", e);
            JsValue::from_str(&e)
        })?;
        self.with_instance(|m| m.controller.set_active_basemap(basemap))
    }

    pub fn set_thematic_visible(&self, visible: bool) -> Result<(), JsValue> {
        self.with_instance(|m| m.controller.set_thematic_visibility(visible))
    }

    pub fn resize(&self, width: f64, height: f64) -> Result<(), JsValue> {
        self.with_instance(|m| m.controller.resize(width, height))
    }

    /// Resolve a click; returns the hit feature or `null`.
    pub fn click(&self, x: f64, y: f64) -> Result<JsValue, JsValue> {
        let hit = self.with_instance(|m| m.controller.handle_click([x, y]))?;
        match hit {
            Some(result) => to_js(&result),
            None => Ok(JsValue::NULL),
        }
    }

    /// Report the auth client's session status ("loading", "authenticated",
    /// "unauthenticated"). Redirects and data loads are started here.
    pub fn set_session(&self, status: &str, user_name: Option<String>) -> Result<JsValue, JsValue> {
        let status = SessionStatus::parse(status, user_name).map_err(|e| JsValue::from_str(&e))?;
        let commands = self.with_instance(|m| m.on_session(status))?;
        self.run_commands(&commands);
        to_js(&commands)
    }

    /// Load the data again, e.g. after the user's records changed.
    pub fn reload(&self) -> Result<JsValue, JsValue> {
        let commands: Vec<PageCommand> = self
            .with_instance(|m| m.page.refetch())?
            .into_iter()
            .collect();
        self.run_commands(&commands);
        to_js(&commands)
    }

    pub fn sign_out(&self) -> Result<JsValue, JsValue> {
        let command = self.with_instance(|m| m.sign_out())?;
        self.run_commands(std::slice::from_ref(&command));
        to_js(&command)
    }

    pub fn page_view(&self) -> Result<JsValue, JsValue> {
        let view = self.with_instance(|m| m.page.view())?;
        to_js(&view)
    }

    /// Current frame description, or `null` before initialization.
    pub fn frame(&self) -> Result<JsValue, JsValue> {
        match self.with_instance(|m| m.controller.frame_state())? {
            Some(frame) => to_js(&frame),
            None => Ok(JsValue::NULL),
        }
    }

    pub fn styled_features(&self) -> Result<JsValue, JsValue> {
        let features = self.with_instance(|m| m.controller.styled_features())?;
        to_js(&features)
    }

    /// Called by the renderer once the pending view animation has played.
    pub fn complete_animation(&self) -> Result<bool, JsValue> {
        self.with_instance(|m| m.controller.complete_animation().is_some())
    }

    pub fn teardown(&self) -> Result<bool, JsValue> {
        self.with_instance(|m| m.controller.teardown())
    }

    /// Tear down and unregister. The handle is unusable afterwards.
    pub fn dispose(&self) -> bool {
        ModuleState::with_mut(|state| state.remove(&self.id))
    }
}

impl MapHandle {
    fn with_instance<R>(&self, f: impl FnOnce(&mut MapInstance) -> R) -> Result<R, JsValue> {
        ModuleState::with_mut(|state| state.get_mut(&self.id).map(f))
            .ok_or_else(|| unknown_map(&self.id))
    }

    fn run_commands(&self, commands: &[PageCommand]) {
        for command in commands {
            match command {
                PageCommand::Redirect { to } => redirect(to),
                PageCommand::FetchData { url, ticket } => {
                    let id = self.id.clone();
                    let url = url.clone();
                    let ticket = FetchTicket::from(*ticket);
                    wasm_bindgen_futures::spawn_local(async move {
                        let result = fetch_feature_collection(&url).await;
                        commit_data(&id, ticket, result);
                    });
                }
            }
        }
    }
}

fn commit_data(id: &str, ticket: FetchTicket, result: Result<Option<geojson_features::FeatureCollection>, String>) {
    ModuleState::with_mut(|state| {
        let Some(instance) = state.get_mut(id) else {
            console_log!("Map {} went away before its data arrived", id);
            return;
        };
        instance.apply_data(ticket, result);
    });
}
