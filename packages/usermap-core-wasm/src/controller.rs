// Map controller: the single owner of a map display. It mirrors the external
// state (selected basemap, thematic visibility, current features) and
// reconciles the display's layers, viewport and highlight with it.
use std::sync::Arc;

use crate::basemaps::BasemapId;
use crate::config::MapConfig;
use crate::console_log;
use crate::geojson_features::{geometry_to_value, FeatureCollection};
use crate::hit_test::geometry_hit;
use crate::layers::{BasemapLayers, FeatureKey, ThematicLayer};
use crate::models::{
    ClickResult, FrameState, LayerKind, LayerSummary, StyledFeature, TileRef, ViewState,
};
use crate::projection::mercator_to_lon_lat;
use crate::style::feature_style;
use crate::viewport::{ViewAnimation, Viewport};

pub const THEMATIC_LAYER_ID: &str = "thematic";

/// The mounted display surface and every layer attached to it.
#[derive(Debug)]
pub struct MapDisplay {
    mount: String,
    basemaps: BasemapLayers,
    thematic: Option<ThematicLayer>,
    viewport: Viewport,
    highlighted: Option<FeatureKey>,
}

impl MapDisplay {
    pub fn mount(&self) -> &str {
        &self.mount
    }

    pub fn basemaps(&self) -> &BasemapLayers {
        &self.basemaps
    }

    pub fn thematic(&self) -> Option<&ThematicLayer> {
        self.thematic.as_ref()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn highlighted(&self) -> Option<FeatureKey> {
        self.highlighted
    }
}

pub struct MapController {
    config: MapConfig,
    display: Option<MapDisplay>,
    active_basemap: BasemapId,
    thematic_visible: bool,
    data: Option<Arc<FeatureCollection>>,
    generation: u64,
}

impl MapController {
    pub fn new(config: MapConfig) -> Self {
        MapController {
            active_basemap: config.default_basemap,
            config,
            display: None,
            thematic_visible: true,
            data: None,
            generation: 0,
        }
    }

    pub fn display(&self) -> Option<&MapDisplay> {
        self.display.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.display.is_some()
    }

    pub fn active_basemap(&self) -> BasemapId {
        self.active_basemap
    }

    pub fn thematic_visible(&self) -> bool {
        self.thematic_visible
    }

    /// Create the display on `mount`. Does nothing if a display already
    /// exists. The new display picks up the current basemap, visibility and
    /// features. Returns true if a display was created.
    pub fn initialize(&mut self, mount: &str) -> bool {
        if self.display.is_some() {
            return false;
        }

        self.display = Some(MapDisplay {
            mount: mount.to_string(),
            basemaps: BasemapLayers::new(self.active_basemap),
            thematic: None,
            viewport: Viewport::new(self.config.center, self.config.zoom),
            highlighted: None,
        });
        console_log!("Map initialized on '{}' with basemap {}", mount, self.active_basemap);

        if self.data.is_some() {
            self.rebuild_thematic_layer();
        }
        true
    }

    pub fn set_active_basemap(&mut self, id: BasemapId) {
        self.active_basemap = id;
        if let Some(display) = self.display.as_mut() {
            display.basemaps.activate(id);
        }
    }

    /// Replace the thematic data. The previous thematic layer is always
    /// discarded; `None` leaves the map without one.
    pub fn set_thematic_data(&mut self, collection: Option<Arc<FeatureCollection>>) {
        self.data = collection;
        self.rebuild_thematic_layer();
    }

    pub fn set_thematic_visibility(&mut self, visible: bool) {
        self.thematic_visible = visible;
        if let Some(layer) = self.display.as_mut().and_then(|d| d.thematic.as_mut()) {
            layer.visible = visible;
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        if let Some(display) = self.display.as_mut() {
            if !display.viewport.set_size(width, height) {
                console_log!("Ignoring invalid map size {}x{}", width, height);
            }
        }
    }

    /// Resolve a click at `pixel` and update the highlight. Returns the
    /// feature that was hit, if any.
    pub fn handle_click(&mut self, pixel: [f64; 2]) -> Option<ClickResult> {
        let tolerance = self.config.hit_tolerance;
        let display = self.display.as_mut()?;

        let hit = display.thematic.as_ref().and_then(|layer| {
            hit_test_layer(layer, &display.viewport, pixel, tolerance, display.highlighted)
        });

        match hit {
            Some(key) => {
                if let Some(previous) = display.highlighted.filter(|&k| k != key) {
                    console_log!("Clearing highlight on feature {}", previous.index);
                }
                display.highlighted = Some(key);
                let feature = display.thematic.as_ref()?.resolve(key)?;
                Some(ClickResult {
                    key,
                    id: feature.id.clone(),
                    properties: feature.properties.clone(),
                })
            }
            None => {
                display.highlighted = None;
                None
            }
        }
    }

    /// Detach the display and drop its layers. Safe to call repeatedly.
    pub fn teardown(&mut self) -> bool {
        match self.display.take() {
            Some(display) => {
                console_log!("Map on '{}' torn down", display.mount);
                true
            }
            None => false,
        }
    }

    pub fn complete_animation(&mut self) -> Option<ViewAnimation> {
        self.display.as_mut()?.viewport.complete_animation()
    }

    pub fn frame_state(&self) -> Option<FrameState> {
        let display = self.display.as_ref()?;
        let viewport = &display.viewport;
        let center = viewport.center();
        let lon_lat = mercator_to_lon_lat(center);
        let (width, height) = viewport.size();

        let mut layers: Vec<LayerSummary> = display
            .basemaps
            .iter()
            .map(|l| LayerSummary {
                id: l.id.as_str().to_string(),
                kind: LayerKind::Tile,
                visible: l.visible,
                feature_count: None,
            })
            .collect();
        if let Some(layer) = display.thematic.as_ref() {
            layers.push(LayerSummary {
                id: THEMATIC_LAYER_ID.to_string(),
                kind: LayerKind::Vector,
                visible: layer.visible,
                feature_count: Some(layer.len()),
            });
        }

        let source = &self.active_basemap.descriptor().source;
        let tiles = viewport
            .covering_tiles(source.max_zoom)
            .into_iter()
            .map(|(x, y, z)| TileRef {
                url: source.tile_url(x, y, z),
                x,
                y,
                z,
            })
            .collect();

        Some(FrameState {
            mount: display.mount.clone(),
            view: ViewState {
                center: [center.x, center.y],
                center_lon_lat: [lon_lat.x, lon_lat.y],
                resolution: viewport.resolution(),
                zoom: viewport.zoom(),
                size: [width, height],
                animation: viewport.animation().cloned(),
            },
            layers,
            tiles,
            attribution: source.attribution.to_string(),
            highlighted: display.highlighted,
        })
    }

    /// Drawable thematic features with their current style, bottom to top.
    /// Empty while the thematic layer is hidden.
    pub fn styled_features(&self) -> Vec<StyledFeature> {
        let Some(display) = self.display.as_ref() else {
            return Vec::new();
        };
        let Some(layer) = display.thematic.as_ref().filter(|l| l.visible) else {
            return Vec::new();
        };

        layer
            .features()
            .iter()
            .enumerate()
            .filter_map(|(index, feature)| {
                let key = layer.key(index);
                Some(StyledFeature {
                    key,
                    geometry: geometry_to_value(feature.geometry.as_ref()?),
                    style: *feature_style(key, display.highlighted),
                })
            })
            .collect()
    }

    fn rebuild_thematic_layer(&mut self) {
        let padding = self.config.fit_padding;
        let duration = self.config.fit_duration_ms;
        let Some(display) = self.display.as_mut() else {
            return;
        };

        if let Some(old) = display.thematic.take() {
            console_log!("Detached thematic layer generation {}", old.generation());
        }
        // The highlighted feature belonged to the old layer
        display.highlighted = None;

        let Some(collection) = self.data.as_ref() else {
            return;
        };

        self.generation += 1;
        let layer = ThematicLayer::from_collection(collection, self.generation, self.thematic_visible);
        console_log!(
            "Attached thematic layer generation {} with {} features",
            layer.generation(),
            layer.len()
        );

        if let Some(extent) = layer.extent() {
            if display.viewport.fit(extent, padding, duration) {
                console_log!("Fitting view to thematic extent over {}ms", duration);
            }
        }
        display.thematic = Some(layer);
    }
}

// Topmost feature under `pixel`; later features draw above earlier ones.
fn hit_test_layer(
    layer: &ThematicLayer,
    viewport: &Viewport,
    pixel: [f64; 2],
    tolerance: f64,
    highlighted: Option<FeatureKey>,
) -> Option<FeatureKey> {
    if !layer.visible {
        return None;
    }
    let at = viewport.pixel_to_coordinate(pixel);
    let resolution = viewport.resolution();

    layer
        .features()
        .iter()
        .enumerate()
        .rev()
        .find(|(index, feature)| {
            let Some(geometry) = feature.geometry.as_ref() else {
                return false;
            };
            let (point_px, line_px) = feature_style(layer.key(*index), highlighted).hit_reach();
            geometry_hit(
                geometry,
                at,
                (point_px + tolerance) * resolution,
                (line_px + tolerance) * resolution,
            )
        })
        .map(|(index, _)| layer.key(index))
}
