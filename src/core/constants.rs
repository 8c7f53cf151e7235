//! Engine-wide constants for the IxEarth world and its map canvas.
//! Keeping them in a single place makes it easier to tweak the magic numbers.

/// Multiplier from Earth-accurate geodesic results to IxEarth units.
pub const IXEARTH_SCALE_FACTOR: f64 = 1.4777;

/// Longitude used as zero reference by the IxMaps canvas (30°E).
pub const IXMAPS_PRIME_MERIDIAN_LNG: f64 = 30.0;

/// Native IxMaps canvas size in pixels.
pub const IXMAPS_CANVAS_WIDTH: f64 = 8192.0;
pub const IXMAPS_CANVAS_HEIGHT: f64 = 4096.0;

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Deepest zoom whose tile indices fit in `u32`.
pub const MAX_ZOOM: u8 = 32;

/// Default number of transformed tiles kept by the projection cache.
pub const DEFAULT_CACHE_ENTRIES: usize = 100;

/// Web Mercator equatorial radius, meters.
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Scale-bar ladder in kilometers (1-2-5 series).
pub const NICE_SCALE_DISTANCES: [f64; 19] = [
    0.01, 0.02, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 200.0, 500.0,
    1000.0, 2000.0, 5000.0, 10000.0,
];

pub const FEET_PER_METER: f64 = 3.28084;
pub const MILES_PER_KM: f64 = 0.621371;
pub const SQ_FEET_PER_SQ_METER: f64 = 10.7639;
pub const SQ_MILES_PER_SQ_KM: f64 = 0.386102;
