// Layers owned by a map display: the fixed basemap arena and the single
// thematic layer built from the user's features.
use geo::{coord, BoundingRect, Geometry, Rect};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::basemaps::BasemapId;
use crate::geojson_features::FeatureCollection;
use crate::projection::project_geometry;

/// Non-owning reference to a thematic feature. Keys from an older layer
/// generation no longer resolve.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FeatureKey {
    pub generation: u64,
    pub index: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BasemapLayer {
    pub id: BasemapId,
    pub visible: bool,
}

/// One slot per registered basemap, indexed by `BasemapId::index`. Layers are
/// never added or removed; only their visibility changes.
#[derive(Clone, Debug, PartialEq)]
pub struct BasemapLayers {
    slots: Vec<BasemapLayer>,
}

impl BasemapLayers {
    pub fn new(active: BasemapId) -> Self {
        let slots = BasemapId::ALL
            .iter()
            .map(|&id| BasemapLayer { id, visible: id == active })
            .collect();
        BasemapLayers { slots }
    }

    pub fn activate(&mut self, active: BasemapId) {
        for layer in self.slots.iter_mut() {
            layer.visible = layer.id == active;
        }
    }

    pub fn get(&self, id: BasemapId) -> &BasemapLayer {
        &self.slots[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &BasemapLayer> {
        self.slots.iter()
    }

    pub fn visible(&self) -> impl Iterator<Item = &BasemapLayer> {
        self.slots.iter().filter(|l| l.visible)
    }
}

/// A feature ready for display: geometry in EPSG:3857.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectedFeature {
    pub id: Option<Value>,
    pub geometry: Option<Geometry<f64>>,
    pub properties: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ThematicLayer {
    generation: u64,
    features: Vec<ProjectedFeature>,
    extent: Option<Rect<f64>>,
    pub visible: bool,
}

impl ThematicLayer {
    pub fn from_collection(collection: &FeatureCollection, generation: u64, visible: bool) -> Self {
        let features: Vec<ProjectedFeature> = collection
            .features
            .iter()
            .map(|f| ProjectedFeature {
                id: f.id.clone(),
                geometry: f.geometry.as_ref().and_then(project_geometry),
                properties: f.properties.clone(),
            })
            .collect();
        let extent = combined_extent(&features);

        ThematicLayer {
            generation,
            features,
            extent,
            visible,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn features(&self) -> &[ProjectedFeature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Bounding box of every drawable geometry, if any.
    pub fn extent(&self) -> Option<Rect<f64>> {
        self.extent
    }

    pub fn key(&self, index: usize) -> FeatureKey {
        FeatureKey {
            generation: self.generation,
            index,
        }
    }

    pub fn resolve(&self, key: FeatureKey) -> Option<&ProjectedFeature> {
        if key.generation != self.generation {
            return None;
        }
        self.features.get(key.index)
    }
}

fn combined_extent(features: &[ProjectedFeature]) -> Option<Rect<f64>> {
    features
        .iter()
        .filter_map(|f| f.geometry.as_ref()?.bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exactly_one_basemap_is_visible() {
        let mut layers = BasemapLayers::new(BasemapId::Osm);
        assert_eq!(layers.iter().count(), 4);
        layers.activate(BasemapId::Satellite);

        let visible: Vec<BasemapId> = layers.visible().map(|l| l.id).collect();
        assert_eq!(visible, vec![BasemapId::Satellite]);
        assert!(!layers.get(BasemapId::Osm).visible);
    }

    #[test]
    fn thematic_layer_projects_and_measures_extent() {
        let fc = FeatureCollection::from_value(&json!({
            "features": [
                { "geometry": { "type": "Point", "coordinates": [0, 0] } },
                { "geometry": { "type": "Point", "coordinates": [1, 1] } },
                { "geometry": null }
            ]
        }))
        .unwrap();

        let layer = ThematicLayer::from_collection(&fc, 3, true);
        assert_eq!(layer.len(), 3);
        let extent = layer.extent().unwrap();
        assert!(extent.min().x.abs() < 1e-6 && extent.min().y.abs() < 1e-6);
        assert!((extent.max().x - 111_319.49).abs() < 1.0);
        assert!(layer.features()[2].geometry.is_none());
    }

    #[test]
    fn keys_from_other_generations_do_not_resolve() {
        let fc = FeatureCollection::from_value(&json!({
            "features": [{ "geometry": { "type": "Point", "coordinates": [0, 0] } }]
        }))
        .unwrap();
        let layer = ThematicLayer::from_collection(&fc, 2, true);

        assert!(layer.resolve(layer.key(0)).is_some());
        assert!(layer.resolve(FeatureKey { generation: 1, index: 0 }).is_none());
        assert!(layer.resolve(layer.key(5)).is_none());
    }

    #[test]
    fn empty_layer_has_no_extent() {
        let layer = ThematicLayer::from_collection(&FeatureCollection::default(), 1, true);
        assert!(layer.is_empty());
        assert!(layer.extent().is_none());
    }
}
