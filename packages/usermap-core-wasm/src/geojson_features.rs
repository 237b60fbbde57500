// GeoJSON FeatureCollection model, parsed directly from serde_json values.
use geo_types::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use serde_json::{json, Map, Value};

use crate::console_log;

/// One record of the user's data. Geometry is in lon/lat degrees and may be
/// absent (GeoJSON `"geometry": null`).
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub id: Option<Value>,
    pub geometry: Option<Geometry<f64>>,
    pub properties: Map<String, Value>,
}

/// Immutable once built; a refetch produces a new collection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        FeatureCollection { features }
    }

    /// Read a collection from a parsed JSON document.
    ///
    /// Returns `None` when the document has no `features` array, which callers
    /// treat as "no thematic data". Features that cannot be read are skipped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let raw = value.get("features")?.as_array()?;

        let mut features = Vec::with_capacity(raw.len());
        let mut skipped = 0usize;
        for entry in raw {
            match parse_feature(entry) {
                Ok(feature) => features.push(feature),
                Err(_) => skipped += 1,
            }
        }
        if skipped > 0 {
            console_log!("Skipped {} malformed features out of {}", skipped, raw.len());
        }

        Some(FeatureCollection { features })
    }

    pub fn from_json_str(json: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(json).ok()?;
        Self::from_value(&value)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

fn parse_feature(value: &Value) -> Result<Feature, String> {
    let obj = value
        .as_object()
        .ok_or_else(|| "Feature is not an object".to_string())?;

    let geometry = match obj.get("geometry") {
        None | Some(Value::Null) => None,
        Some(g) => Some(parse_geometry(g)?),
    };

    let properties = obj
        .get("properties")
        .and_then(|p| p.as_object())
        .cloned()
        .unwrap_or_default();

    Ok(Feature {
        id: obj.get("id").filter(|v| !v.is_null()).cloned(),
        geometry,
        properties,
    })
}

pub fn parse_geometry(value: &Value) -> Result<Geometry<f64>, String> {
    let kind = value
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| "Geometry is missing 'type'".to_string())?;

    if kind == "GeometryCollection" {
        let members = value
            .get("geometries")
            .and_then(|g| g.as_array())
            .ok_or_else(|| "GeometryCollection is missing 'geometries'".to_string())?;
        let parsed = members
            .iter()
            .map(parse_geometry)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Geometry::GeometryCollection(GeometryCollection(parsed)));
    }

    let coords = value
        .get("coordinates")
        .ok_or_else(|| format!("{} is missing 'coordinates'", kind))?;

    let geometry = match kind {
        "Point" => Geometry::Point(Point::from(parse_position(coords)?)),
        "MultiPoint" => Geometry::MultiPoint(MultiPoint::new(
            parse_positions(coords)?.into_iter().map(Point::from).collect(),
        )),
        "LineString" => Geometry::LineString(LineString::new(parse_positions(coords)?)),
        "MultiLineString" => Geometry::MultiLineString(MultiLineString::new(
            as_array(coords)?
                .iter()
                .map(|line| parse_positions(line).map(LineString::new))
                .collect::<Result<Vec<_>, _>>()?,
        )),
        "Polygon" => Geometry::Polygon(parse_polygon(coords)?),
        "MultiPolygon" => Geometry::MultiPolygon(MultiPolygon::new(
            as_array(coords)?
                .iter()
                .map(parse_polygon)
                .collect::<Result<Vec<_>, _>>()?,
        )),
        other => return Err(format!("Unsupported geometry type '{}'", other)),
    };
    Ok(geometry)
}

fn as_array(value: &Value) -> Result<&Vec<Value>, String> {
    value
        .as_array()
        .ok_or_else(|| "Expected a coordinate array".to_string())
}

// [lng, lat, (elevation ignored)]
fn parse_position(value: &Value) -> Result<Coord<f64>, String> {
    let pair = as_array(value)?;
    if pair.len() < 2 {
        return Err("Position needs at least two numbers".to_string());
    }
    match (pair[0].as_f64(), pair[1].as_f64()) {
        (Some(x), Some(y)) => Ok(Coord { x, y }),
        _ => Err("Position values must be numbers".to_string()),
    }
}

fn parse_positions(value: &Value) -> Result<Vec<Coord<f64>>, String> {
    as_array(value)?.iter().map(parse_position).collect()
}

fn parse_polygon(value: &Value) -> Result<Polygon<f64>, String> {
    let mut rings = as_array(value)?
        .iter()
        .map(|ring| parse_positions(ring).map(LineString::new))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter();
    let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
    Ok(Polygon::new(exterior, rings.collect()))
}

/// GeoJSON geometry object for a geometry, used to hand projected shapes to
/// the renderer.
pub fn geometry_to_value(geometry: &Geometry<f64>) -> Value {
    fn pos(c: &Coord<f64>) -> Value {
        json!([c.x, c.y])
    }
    fn line(ls: &LineString<f64>) -> Value {
        Value::Array(ls.0.iter().map(pos).collect())
    }
    fn poly(p: &Polygon<f64>) -> Value {
        Value::Array(std::iter::once(p.exterior()).chain(p.interiors()).map(line).collect())
    }

    match geometry {
        Geometry::Point(p) => json!({ "type": "Point", "coordinates": pos(&p.0) }),
        Geometry::MultiPoint(mp) => json!({
            "type": "MultiPoint",
            "coordinates": mp.iter().map(|p| pos(&p.0)).collect::<Vec<_>>()
        }),
        Geometry::Line(l) => json!({
            "type": "LineString",
            "coordinates": [pos(&l.start), pos(&l.end)]
        }),
        Geometry::LineString(ls) => json!({ "type": "LineString", "coordinates": line(ls) }),
        Geometry::MultiLineString(mls) => json!({
            "type": "MultiLineString",
            "coordinates": mls.iter().map(line).collect::<Vec<_>>()
        }),
        Geometry::Polygon(p) => json!({ "type": "Polygon", "coordinates": poly(p) }),
        Geometry::MultiPolygon(mp) => json!({
            "type": "MultiPolygon",
            "coordinates": mp.iter().map(poly).collect::<Vec<_>>()
        }),
        Geometry::Rect(r) => json!({ "type": "Polygon", "coordinates": poly(&r.to_polygon()) }),
        Geometry::Triangle(t) => json!({ "type": "Polygon", "coordinates": poly(&t.to_polygon()) }),
        Geometry::GeometryCollection(gc) => json!({
            "type": "GeometryCollection",
            "geometries": gc.iter().map(geometry_to_value).collect::<Vec<_>>()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_mixed_geometries_and_properties() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[-73.6, 45.5], [-73.4, 45.5], [-73.4, 45.7], [-73.6, 45.7], [-73.6, 45.5]]]
                    },
                    "properties": { "name": "Zone test Montréal" }
                },
                {
                    "type": "Feature",
                    "id": 7,
                    "geometry": { "type": "Point", "coordinates": [2.35, 48.85, 35.0] },
                    "properties": null
                },
                {
                    "type": "Feature",
                    "geometry": {
                        "type": "MultiLineString",
                        "coordinates": [[[0, 0], [1, 1]], [[2, 2], [3, 3]]]
                    }
                }
            ]
        });

        let fc = FeatureCollection::from_value(&doc).unwrap();
        assert_eq!(fc.len(), 3);
        assert_eq!(fc.features[0].properties["name"], "Zone test Montréal");
        match &fc.features[0].geometry {
            Some(Geometry::Polygon(p)) => {
                assert_eq!(p.exterior().0.len(), 5);
                assert!(p.interiors().is_empty());
            }
            other => panic!("expected polygon, got {:?}", other),
        }
        assert_eq!(fc.features[1].id, Some(json!(7)));
        assert!(fc.features[1].properties.is_empty());
        assert!(matches!(
            fc.features[2].geometry,
            Some(Geometry::MultiLineString(ref m)) if m.0.len() == 2
        ));
    }

    #[test]
    fn missing_features_means_no_collection() {
        assert!(FeatureCollection::from_value(&json!({ "message": "Non autorisé" })).is_none());
        assert!(FeatureCollection::from_value(&json!({ "features": 3 })).is_none());
        assert!(FeatureCollection::from_json_str("not json").is_none());
    }

    #[test]
    fn empty_collection_is_valid() {
        let fc = FeatureCollection::from_json_str(r#"{"type":"FeatureCollection","features":[]}"#)
            .unwrap();
        assert!(fc.is_empty());
    }

    #[test]
    fn malformed_features_are_skipped() {
        let doc = json!({
            "features": [
                "nonsense",
                { "geometry": { "type": "Point", "coordinates": ["a", 1] } },
                { "geometry": { "type": "Circle", "coordinates": [0, 0] } },
                { "geometry": null, "properties": { "kept": true } },
                { "geometry": { "type": "LineString", "coordinates": [[0, 0], [1, 0]] } }
            ]
        });
        let fc = FeatureCollection::from_value(&doc).unwrap();
        assert_eq!(fc.len(), 2);
        assert!(fc.features[0].geometry.is_none());
        assert_eq!(fc.features[0].properties["kept"], true);
    }

    #[test]
    fn polygon_holes_become_interiors() {
        let g = parse_geometry(&json!({
            "type": "Polygon",
            "coordinates": [
                [[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]],
                [[2, 2], [4, 2], [4, 4], [2, 2]]
            ]
        }))
        .unwrap();
        let Geometry::Polygon(p) = g else { panic!("not a polygon") };
        assert_eq!(p.interiors().len(), 1);
    }

    #[test]
    fn geometry_collection_recurses() {
        let g = parse_geometry(&json!({
            "type": "GeometryCollection",
            "geometries": [
                { "type": "Point", "coordinates": [1, 2] },
                { "type": "LineString", "coordinates": [[0, 0], [1, 1]] }
            ]
        }))
        .unwrap();
        let Geometry::GeometryCollection(gc) = g else { panic!("not a collection") };
        assert_eq!(gc.0.len(), 2);
    }

    #[test]
    fn geometries_write_back_to_geojson() {
        let source = json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 0.0]]]
        });
        let written = geometry_to_value(&parse_geometry(&source).unwrap());
        assert_eq!(written, source);
    }
}
