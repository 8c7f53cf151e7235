pub mod dateline;
pub mod geojson;

pub use dateline::{repair_collection, DatelineMode, DatelineReport};
pub use geojson::{FeatureSet, GeoJson, GeoJsonFeature, GeoJsonGeometry, Position};
