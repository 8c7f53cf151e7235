//! Distance, area and scale-bar utilities in IxEarth units

pub mod format;
pub mod geodesic;
pub mod scale_bar;

pub use format::{format_area, format_distance, get_nice_scale_distance};
pub use geodesic::{
    calculate_distance_from_lng_lat, calculate_polygon_area, calculate_polyline_distance,
    GeodesicMeasure,
};
pub use scale_bar::{ground_resolution_km, ScaleBar};
