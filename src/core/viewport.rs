use crate::core::geo::{LatLng, Point};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Manages the current view of the map: center, zoom, bearing and screen dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: f64,
    /// The size of the viewport in pixels
    pub size: Point,
    /// Rotation in degrees, clockwise from north
    pub bearing: f64,
    /// The minimum allowed zoom level
    pub min_zoom: f64,
    /// The maximum allowed zoom level
    pub max_zoom: f64,
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        Self {
            center,
            zoom: zoom.clamp(0.0, 22.0),
            size,
            bearing: 0.0,
            min_zoom: 0.0,
            max_zoom: 22.0,
        }
    }

    pub fn set_center(&mut self, center: LatLng) {
        self.center = LatLng::new(center.lat.clamp(-90.0, 90.0), LatLng::wrap_lng(center.lng));
    }

    /// Sets the zoom level, clamping to valid range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    pub fn set_size(&mut self, size: Point) {
        self.size = size;
    }

    /// Sets the bearing, normalised to [0, 360)
    pub fn set_bearing(&mut self, bearing: f64) {
        self.bearing = bearing.rem_euclid(360.0);
    }

    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
    }

    /// Gets the scale factor for the current zoom level
    pub fn scale(&self) -> f64 {
        2_f64.powf(self.zoom)
    }

    /// Projection scale (pixels per radian) matching a host map at this zoom:
    /// `width / 2π × 2^zoom`, multiplied by `adjustment`
    pub fn projection_scale(&self, adjustment: f64) -> f64 {
        self.size.x / (2.0 * PI) * self.scale() * adjustment
    }

    /// Midpoint of the viewport in pixels
    pub fn midpoint(&self) -> Point {
        Point::new(self.size.x / 2.0, self.size.y / 2.0)
    }

    /// Converts a pixel position to clip space ([-1, 1], y up)
    pub fn pixel_to_clip(&self, pixel: &Point) -> [f32; 2] {
        if self.size.x <= 0.0 || self.size.y <= 0.0 {
            return [0.0, 0.0];
        }
        [
            (pixel.x / self.size.x * 2.0 - 1.0) as f32,
            (1.0 - pixel.y / self.size.y * 2.0) as f32,
        ]
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(LatLng::default(), 1.0, Point::new(1024.0, 768.0))
    }
}
