// EPSG:4326 (lon/lat degrees) <-> EPSG:3857 (Web Mercator metres)
use geo::{Coord, CoordsIter, Geometry, MapCoords};
use std::f64::consts::PI;

pub const EARTH_RADIUS: f64 = 6_378_137.0;
pub const MAX_LATITUDE: f64 = 85.051_128_779_8;
/// Half the width of the projected world, in metres.
pub const HALF_WORLD: f64 = PI * EARTH_RADIUS;

pub fn lon_lat_to_mercator(c: Coord<f64>) -> Coord<f64> {
    let lat = c.y.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    Coord {
        x: EARTH_RADIUS * c.x.to_radians(),
        y: EARTH_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln(),
    }
}

pub fn mercator_to_lon_lat(c: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (c.x / EARTH_RADIUS).to_degrees(),
        y: (2.0 * (c.y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees(),
    }
}

/// Project a geographic geometry for display.
/// Returns `None` if any coordinate is not finite.
pub fn project_geometry(geometry: &Geometry<f64>) -> Option<Geometry<f64>> {
    let finite = geometry
        .coords_iter()
        .all(|c| c.x.is_finite() && c.y.is_finite());
    finite.then(|| geometry.map_coords(lon_lat_to_mercator))
}
