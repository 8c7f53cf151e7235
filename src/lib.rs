//! # ixmaps
//!
//! Map projection, measurement and tile-cache engine for the IxEarth world.
//!
//! The crate covers the numeric side of the IxMaps viewer: the linear IxMaps
//! coordinate system with its 30°E prime meridian, the standard world
//! projections behind one [`Projection`] trait, IxEarth-scaled geodesic
//! measurement, an LRU cache of projected tile features, and a render layer
//! that re-projects GeoJSON into a host map's frame.

pub mod core;
pub mod data;
pub mod layers;
pub mod measure;
pub mod prelude;
pub mod projection;
pub mod rendering;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::MapConfig,
    geo::{LatLng, Point},
    viewport::Viewport,
};

pub use data::dateline::{repair_collection, DatelineMode};
pub use data::geojson::{FeatureSet, GeoJson, GeoJsonFeature, GeoJsonGeometry};

pub use projection::{
    factory::{create_ixmaps_projection, create_projection},
    ixmaps::{IxMapsConfig, IxMapsTransform},
    Projection, ProjectionOptions, ProjectionType,
};

pub use measure::{
    format::{format_area, format_distance, get_nice_scale_distance},
    geodesic::GeodesicMeasure,
};

pub use tiles::{cache::ProjectionCache, TileKey};

pub use layers::{
    base::CustomLayer,
    custom::{create_custom_projection_layer, CustomProjectionLayer},
};

pub use rendering::{MapHost, RenderBackend};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported projection: {0}")]
    UnsupportedProjection(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Error type alias for convenience
pub type Error = MapError;
