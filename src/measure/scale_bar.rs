use crate::core::constants::{EARTH_RADIUS, IXEARTH_SCALE_FACTOR, TILE_SIZE};
use crate::measure::format::{format_scale_label, get_nice_scale_distance};
use serde::Serialize;
use std::f64::consts::PI;

/// IxEarth kilometers covered by one screen pixel of a Web Mercator map at
/// `lat` and `zoom`
pub fn ground_resolution_km(lat: f64, zoom: f64) -> f64 {
    let earth_km_per_px = (lat.to_radians().cos() * 2.0 * PI * EARTH_RADIUS)
        / (TILE_SIZE as f64 * 2_f64.powf(zoom))
        / 1000.0;
    earth_km_per_px * IXEARTH_SCALE_FACTOR
}

/// A scale bar snapped to a round distance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleBar {
    pub distance_km: f64,
    pub width_px: f64,
    pub label: String,
}

impl ScaleBar {
    /// Longest round distance that fits in `max_width_px`.
    ///
    /// `None` when the resolution is unusable, or when even the shortest
    /// rung of the ladder is wider than `max_width_px`.
    pub fn compute(km_per_pixel: f64, max_width_px: f64) -> Option<Self> {
        if !(km_per_pixel.is_finite() && km_per_pixel > 0.0 && max_width_px > 0.0) {
            return None;
        }
        let distance_km = get_nice_scale_distance(km_per_pixel * max_width_px);
        let width_px = distance_km / km_per_pixel;
        if width_px > max_width_px {
            return None;
        }
        Some(Self {
            distance_km,
            width_px,
            label: format_scale_label(distance_km),
        })
    }

    /// Scale bar for a Web Mercator view
    pub fn for_view(lat: f64, zoom: f64, max_width_px: f64) -> Option<Self> {
        Self::compute(ground_resolution_km(lat, zoom), max_width_px)
    }
}
