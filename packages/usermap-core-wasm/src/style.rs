// Presentation styles for thematic features.
use serde::{Serialize, Serializer};

use crate::layers::FeatureKey;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Rgba { r, g, b, a }
    }

    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

// Canvas APIs take CSS color strings
impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_css())
    }
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    pub fill: Rgba,
    pub stroke: Rgba,
    pub stroke_width: f64,
    /// Radius of the circle marker drawn for point geometries
    pub point_radius: f64,
}

impl Style {
    /// Pixel distance from a geometry at which a click still lands on it.
    pub fn hit_reach(&self) -> (f64, f64) {
        (self.point_radius + self.stroke_width / 2.0, self.stroke_width / 2.0)
    }
}

/// Translucent blue with a dark blue outline.
pub const DEFAULT_STYLE: Style = Style {
    fill: Rgba::new(0, 150, 255, 0.4),
    stroke: Rgba::new(0, 51, 102, 1.0),
    stroke_width: 2.0,
    point_radius: 6.0,
};

pub const HIGHLIGHT_STYLE: Style = Style {
    fill: Rgba::new(255, 255, 0, 1.0),
    stroke: Rgba::new(255, 204, 0, 1.0),
    stroke_width: 3.0,
    point_radius: 7.0,
};

/// Style of a feature given the current highlight. Pure: nothing is stored on
/// the feature itself.
pub fn feature_style(key: FeatureKey, highlighted: Option<FeatureKey>) -> &'static Style {
    if highlighted == Some(key) {
        &HIGHLIGHT_STYLE
    } else {
        &DEFAULT_STYLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_highlighted_key_gets_the_highlight_style() {
        let a = FeatureKey { generation: 1, index: 0 };
        let b = FeatureKey { generation: 1, index: 1 };
        let stale = FeatureKey { generation: 0, index: 0 };

        assert_eq!(feature_style(a, None), &DEFAULT_STYLE);
        assert_eq!(feature_style(a, Some(a)), &HIGHLIGHT_STYLE);
        assert_eq!(feature_style(b, Some(a)), &DEFAULT_STYLE);
        assert_eq!(feature_style(a, Some(stale)), &DEFAULT_STYLE);
    }

    #[test]
    fn colors_serialize_as_css() {
        let json = serde_json::to_value(DEFAULT_STYLE).unwrap();
        assert_eq!(json["fill"], "rgba(0, 150, 255, 0.4)");
        assert_eq!(json["stroke"], "rgba(0, 51, 102, 1)");
        assert_eq!(json["strokeWidth"], 2.0);
    }

    #[test]
    fn highlight_is_opaque() {
        assert_eq!(HIGHLIGHT_STYLE.fill.a, 1.0);
        assert_eq!(HIGHLIGHT_STYLE.stroke.a, 1.0);
    }
}
