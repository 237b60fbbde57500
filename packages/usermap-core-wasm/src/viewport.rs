// View state of a map display: center and resolution in EPSG:3857, size in pixels.
use geo::{coord, Coord, Rect};
use serde::{Deserialize, Serialize};

use crate::projection::HALF_WORLD;

pub const TILE_SIZE: f64 = 256.0;
/// Metres per pixel at zoom 0.
pub const MAX_RESOLUTION: f64 = 2.0 * HALF_WORLD / TILE_SIZE;
pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 28.0;

pub const DEFAULT_WIDTH: f64 = 800.0;
pub const DEFAULT_HEIGHT: f64 = 500.0;
/// Largest accepted width or height in pixels, the common browser canvas limit.
pub const MAX_SIZE: f64 = 16_384.0;

pub fn zoom_to_resolution(zoom: f64) -> f64 {
    MAX_RESOLUTION / 2f64.powf(zoom.clamp(MIN_ZOOM, MAX_ZOOM))
}

pub fn resolution_to_zoom(resolution: f64) -> f64 {
    (MAX_RESOLUTION / resolution).log2().clamp(MIN_ZOOM, MAX_ZOOM)
}

/// A pending eased transition, played back by the renderer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViewAnimation {
    pub from_center: [f64; 2],
    pub from_resolution: f64,
    pub to_center: [f64; 2],
    pub to_resolution: f64,
    pub duration_ms: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    center: Coord<f64>,
    resolution: f64,
    width: f64,
    height: f64,
    animation: Option<ViewAnimation>,
}

impl Viewport {
    pub fn new(center: [f64; 2], zoom: f64) -> Self {
        Viewport {
            center: coord! { x: center[0], y: center[1] },
            resolution: zoom_to_resolution(zoom),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            animation: None,
        }
    }

    pub fn center(&self) -> Coord<f64> {
        self.center
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn zoom(&self) -> f64 {
        resolution_to_zoom(self.resolution)
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn animation(&self) -> Option<&ViewAnimation> {
        self.animation.as_ref()
    }

    /// Sizes outside `(0, MAX_SIZE]` are rejected and leave the viewport as is.
    pub fn set_size(&mut self, width: f64, height: f64) -> bool {
        let valid = |v: f64| v > 0.0 && v <= MAX_SIZE;
        if !(valid(width) && valid(height)) {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }

    pub fn complete_animation(&mut self) -> Option<ViewAnimation> {
        self.animation.take()
    }

    // Pixel origin is the top-left corner, y grows downwards.
    pub fn pixel_to_coordinate(&self, pixel: [f64; 2]) -> Coord<f64> {
        coord! {
            x: self.center.x + (pixel[0] - self.width / 2.0) * self.resolution,
            y: self.center.y - (pixel[1] - self.height / 2.0) * self.resolution,
        }
    }

    pub fn coordinate_to_pixel(&self, c: Coord<f64>) -> [f64; 2] {
        [
            (c.x - self.center.x) / self.resolution + self.width / 2.0,
            (self.center.y - c.y) / self.resolution + self.height / 2.0,
        ]
    }

    pub fn visible_extent(&self) -> Rect<f64> {
        let half_w = self.width / 2.0 * self.resolution;
        let half_h = self.height / 2.0 * self.resolution;
        Rect::new(
            coord! { x: self.center.x - half_w, y: self.center.y - half_h },
            coord! { x: self.center.x + half_w, y: self.center.y + half_h },
        )
    }

    /// Move the view so `extent` fills the viewport minus `padding` pixels on
    /// every side. The view jumps to the target immediately and records the
    /// transition for the renderer. Returns false for non-finite extents.
    pub fn fit(&mut self, extent: Rect<f64>, padding: f64, duration_ms: u32) -> bool {
        let (min, max) = (extent.min(), extent.max());
        if ![min.x, min.y, max.x, max.y].iter().all(|v| v.is_finite()) {
            return false;
        }

        let usable_w = (self.width - 2.0 * padding).max(1.0);
        let usable_h = (self.height - 2.0 * padding).max(1.0);
        let fitted = (extent.width() / usable_w).max(extent.height() / usable_h);
        // A single point has no size to fit; keep the current zoom
        let resolution = if fitted > 0.0 {
            fitted.clamp(zoom_to_resolution(MAX_ZOOM), MAX_RESOLUTION)
        } else {
            self.resolution
        };
        let center = extent.center();

        self.animation = Some(ViewAnimation {
            from_center: [self.center.x, self.center.y],
            from_resolution: self.resolution,
            to_center: [center.x, center.y],
            to_resolution: resolution,
            duration_ms,
        });
        self.center = center;
        self.resolution = resolution;
        true
    }

    /// XYZ tiles covering the visible extent at the zoom level nearest to the
    /// current resolution, capped at `max_zoom`.
    pub fn covering_tiles(&self, max_zoom: u32) -> Vec<(u32, u32, u32)> {
        let z = (self.zoom().round() as u32).min(max_zoom);
        let n = 2u32.pow(z);
        let world = 2.0 * HALF_WORLD;
        let extent = self.visible_extent();

        let to_tile = |v: f64| -> u32 { ((v / world * n as f64).floor().max(0.0) as u32).min(n - 1) };
        let min_x = to_tile(extent.min().x + HALF_WORLD);
        let max_x = to_tile(extent.max().x + HALF_WORLD);
        // Tile rows count down from the top of the world
        let min_y = to_tile(HALF_WORLD - extent.max().y);
        let max_y = to_tile(HALF_WORLD - extent.min().y);

        let mut tiles = Vec::new();
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                tiles.push((x, y, z));
            }
        }
        tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6 * a.abs().max(1.0)
    }

    #[test]
    fn zoom_and_resolution_are_inverse() {
        assert!(close(zoom_to_resolution(0.0), 156_543.033_928_040_97));
        assert!(close(resolution_to_zoom(zoom_to_resolution(6.0)), 6.0));
        assert!(close(zoom_to_resolution(60.0), zoom_to_resolution(MAX_ZOOM)));
    }

    #[test]
    fn pixel_transform_round_trips_around_center() {
        let v = Viewport::new([-8_230_000.0, 5_700_000.0], 6.0);
        let c = v.pixel_to_coordinate([400.0, 250.0]);
        assert!(close(c.x, -8_230_000.0) && close(c.y, 5_700_000.0));

        let above = v.pixel_to_coordinate([400.0, 0.0]);
        assert!(above.y > c.y);

        let px = v.coordinate_to_pixel(v.pixel_to_coordinate([13.0, 77.0]));
        assert!(close(px[0], 13.0) && close(px[1], 77.0));
    }

    #[test]
    fn fit_centers_extent_inside_padding() {
        let mut v = Viewport::new([0.0, 0.0], 2.0);
        let extent = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 70_000.0, y: 10_000.0 });
        assert!(v.fit(extent, 50.0, 1000));

        assert!(close(v.center().x, 35_000.0) && close(v.center().y, 5_000.0));
        // Width is the limiting side: 70 km over 700 usable pixels
        assert!(close(v.resolution(), 100.0));

        let anim = v.animation().unwrap();
        assert_eq!(anim.duration_ms, 1000);
        assert!(close(anim.from_resolution, zoom_to_resolution(2.0)));
        assert_eq!(anim.to_center, [35_000.0, 5_000.0]);

        assert!(v.complete_animation().is_some());
        assert!(v.animation().is_none());
    }

    #[test]
    fn fit_on_point_extent_keeps_resolution() {
        let mut v = Viewport::new([0.0, 0.0], 10.0);
        let before = v.resolution();
        let p = coord! { x: 1_000.0, y: 2_000.0 };
        assert!(v.fit(Rect::new(p, p), 50.0, 1000));
        assert_eq!(v.resolution(), before);
        assert_eq!(v.center(), p);
    }

    #[test]
    fn fit_rejects_non_finite_extent() {
        let mut v = Viewport::new([0.0, 0.0], 3.0);
        let bad = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: f64::INFINITY, y: 1.0 });
        assert!(!v.fit(bad, 50.0, 1000));
        assert!(v.animation().is_none());
        assert_eq!(v.center(), coord! { x: 0.0, y: 0.0 });
    }

    #[test]
    fn invalid_sizes_are_ignored() {
        let mut v = Viewport::new([0.0, 0.0], 3.0);
        assert!(!v.set_size(0.0, 300.0));
        assert!(!v.set_size(f64::NAN, 300.0));
        assert!(v.set_size(1024.0, 768.0));
        assert!(!v.set_size(1e7, 1e7));
        assert!(!v.set_size(f64::INFINITY, 300.0));
        assert_eq!(v.size(), (1024.0, 768.0));
    }

    #[test]
    fn largest_viewport_needs_a_bounded_tile_count() {
        let mut v = Viewport::new([0.0, 0.0], 14.4);
        assert!(v.set_size(MAX_SIZE, MAX_SIZE));
        // Tiles render at no less than 181px once the zoom is rounded
        let per_axis = (MAX_SIZE / 181.0).ceil() as usize + 1;
        assert!(v.covering_tiles(19).len() <= per_axis * per_axis);
    }

    #[test]
    fn whole_world_at_zoom_zero_is_one_tile() {
        let mut v = Viewport::new([0.0, 0.0], 0.0);
        v.set_size(256.0, 256.0);
        assert_eq!(v.covering_tiles(19), vec![(0, 0, 0)]);
    }

    #[test]
    fn covering_tiles_respect_max_zoom() {
        let v = Viewport::new([0.0, 0.0], 12.0);
        let tiles = v.covering_tiles(4);
        assert!(!tiles.is_empty());
        assert!(tiles.iter().all(|&(_, _, z)| z == 4));
        // Null island sits on the corner of the four center tiles
        assert!(tiles.contains(&(7, 7, 4)) || tiles.contains(&(8, 8, 4)));
    }
}
