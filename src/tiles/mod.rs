pub mod cache;

use crate::core::constants::MAX_ZOOM;
use crate::core::geo::LatLng;
use crate::projection::ProjectionType;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

pub use cache::{CacheStats, ProjectionCache};

/// Identity of one transformed tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileKey {
    pub projection_type: ProjectionType,
    pub zoom: u8,
    pub tile_x: u32,
    pub tile_y: u32,
}

impl TileKey {
    pub fn new(projection_type: ProjectionType, zoom: u8, tile_x: u32, tile_y: u32) -> Self {
        Self {
            projection_type,
            zoom,
            tile_x,
            tile_y,
        }
    }

    /// Slippy-map tile containing `lat_lng` at `zoom`
    pub fn containing(projection_type: ProjectionType, lat_lng: &LatLng, zoom: u8) -> Self {
        let lat_rad = LatLng::clamp_lat(lat_lng.lat).to_radians();
        let n = 2_f64.powi(zoom as i32);
        let max = (n as u32).saturating_sub(1);

        let x = ((lat_lng.lng + 180.0) / 360.0 * n).floor().max(0.0) as u32;
        let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n).floor().max(0.0) as u32;

        Self::new(projection_type, zoom, x.min(max), y.min(max))
    }

    /// Checks if the tile is valid for its zoom level
    pub fn is_valid(&self) -> bool {
        if self.zoom > MAX_ZOOM {
            return false;
        }
        let max_coord = 1_u64 << self.zoom;
        (self.tile_x as u64) < max_coord && (self.tile_y as u64) < max_coord
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.projection_type, self.zoom, self.tile_x, self.tile_y
        )
    }
}
