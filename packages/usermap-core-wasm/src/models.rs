// This is the models module containing structures handed to the JS renderer
use serde::Serialize;
use serde_json::{Map, Value};

use crate::layers::FeatureKey;
use crate::style::Style;
use crate::viewport::ViewAnimation;

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub center: [f64; 2],
    pub center_lon_lat: [f64; 2],
    pub resolution: f64,
    pub zoom: f64,
    pub size: [f64; 2],
    pub animation: Option<ViewAnimation>,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Tile,
    Vector,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LayerSummary {
    pub id: String,
    pub kind: LayerKind,
    pub visible: bool,
    pub feature_count: Option<usize>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct TileRef {
    pub url: String,
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

/// Everything the renderer needs to draw one frame. Layers are listed
/// bottom to top.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FrameState {
    pub mount: String,
    pub view: ViewState,
    pub layers: Vec<LayerSummary>,
    pub tiles: Vec<TileRef>,
    pub attribution: String,
    pub highlighted: Option<FeatureKey>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct StyledFeature {
    pub key: FeatureKey,
    /// GeoJSON geometry in EPSG:3857
    pub geometry: Value,
    pub style: Style,
}

/// Feature found under a click, for the info popup.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ClickResult {
    pub key: FeatureKey,
    pub id: Option<Value>,
    pub properties: Map<String, Value>,
}
