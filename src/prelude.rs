//! Prelude module for common ixmaps types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use ixmaps::prelude::*;`

pub use crate::core::{
    config::{CacheConfig, CacheProfile, LayerConfig, MapConfig, MeasurementConfig},
    geo::{LatLng, Point},
    viewport::Viewport,
};

pub use crate::data::{
    dateline::{repair_collection, DatelineMode, DatelineReport},
    geojson::{FeatureSet, GeoJson, GeoJsonFeature, GeoJsonGeometry, Position},
};

pub use crate::projection::{
    factory::{
        create_any_projection, create_ixmaps_projection, create_projection, recommended_center,
        recommended_scale,
    },
    ixmaps::{IxMapsConfig, IxMapsTransform},
    transform::{project_feature, project_features},
    Projection, ProjectionOptions, ProjectionType,
};

pub use crate::measure::{
    format_area, format_distance, get_nice_scale_distance, GeodesicMeasure, ScaleBar,
};

pub use crate::tiles::{CacheStats, ProjectionCache, TileKey};

pub use crate::layers::{create_custom_projection_layer, CustomLayer, CustomProjectionLayer};

pub use crate::rendering::{MapHost, RenderBackend, ViewportEvent};

pub use crate::{MapError, Result};

// Fast hash maps, as used for listener and resource tables
pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
