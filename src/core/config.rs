//! Configuration for the projection subsystem
//!
//! Every section deserializes from JSON with missing fields taking their
//! defaults, so a config file only needs to name what it overrides. Cache
//! sizing also comes in presets through [`CacheProfile`].

use crate::core::constants::{DEFAULT_CACHE_ENTRIES, IXEARTH_SCALE_FACTOR};
use crate::measure::GeodesicMeasure;
use crate::projection::ixmaps::{IxMapsConfig, IxMapsTransform};
use crate::projection::ProjectionType;
use crate::tiles::ProjectionCache;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheProfile {
    Standard,
    Compact,
    Extended,
    Custom(CacheConfig),
}

impl CacheProfile {
    pub fn resolve(&self) -> CacheConfig {
        match self {
            Self::Standard => CacheConfig {
                max_entries: DEFAULT_CACHE_ENTRIES,
            },
            Self::Compact => CacheConfig { max_entries: 32 },
            Self::Extended => CacheConfig { max_entries: 512 },
            Self::Custom(config) => config.clone(),
        }
    }
}

impl Default for CacheProfile {
    fn default() -> Self {
        Self::Standard
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheProfile::default().resolve()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MeasurementConfig {
    /// Ratio of IxEarth lengths to Earth lengths
    pub scale_factor: f64,
    /// Append imperial units to formatted values
    pub dual_units: bool,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            scale_factor: IXEARTH_SCALE_FACTOR,
            dual_units: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayerConfig {
    pub projection: ProjectionType,
    /// Multiplier on the zoom-derived projection scale
    pub scale_adjustment: f64,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            projection: ProjectionType::EqualEarth,
            scale_adjustment: 1.0,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapConfig {
    pub ixmaps: IxMapsConfig,
    pub cache: CacheConfig,
    pub measurement: MeasurementConfig,
    pub layer: LayerConfig,
}

impl MapConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        log::debug!("loading map config from {}", path.as_ref().display());
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        self.ixmaps.validate()?;
        if self.cache.max_entries == 0 {
            return Err(MapError::InvalidConfig(
                "cache.maxEntries must be at least 1".to_string(),
            ));
        }
        if !(self.measurement.scale_factor.is_finite() && self.measurement.scale_factor > 0.0) {
            return Err(MapError::InvalidConfig(format!(
                "measurement.scaleFactor must be positive, got {}",
                self.measurement.scale_factor
            )));
        }
        if !(self.layer.scale_adjustment.is_finite() && self.layer.scale_adjustment > 0.0) {
            return Err(MapError::InvalidConfig(format!(
                "layer.scaleAdjustment must be positive, got {}",
                self.layer.scale_adjustment
            )));
        }
        if self.layer.projection == ProjectionType::Globe {
            return Err(MapError::InvalidConfig(
                "layer.projection cannot be globe; the host renders it natively".to_string(),
            ));
        }
        Ok(())
    }

    pub fn projection_cache(&self) -> ProjectionCache {
        ProjectionCache::new(self.cache.max_entries)
    }

    pub fn measure(&self) -> GeodesicMeasure {
        GeodesicMeasure::new(self.measurement.scale_factor)
    }

    pub fn ixmaps_transform(&self) -> Result<IxMapsTransform> {
        IxMapsTransform::new(self.ixmaps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_profile_presets() {
        assert_eq!(CacheProfile::Standard.resolve().max_entries, 100);
        assert_eq!(CacheProfile::Compact.resolve().max_entries, 32);
        assert_eq!(CacheProfile::Extended.resolve().max_entries, 512);

        let custom = CacheProfile::Custom(CacheConfig { max_entries: 7 });
        assert_eq!(custom.resolve().max_entries, 7);
        assert_eq!(CacheConfig::default(), CacheProfile::Standard.resolve());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "cache": { "maxEntries": 16 },
            "layer": { "projection": "naturalEarth" }
        }"#;
        let config = MapConfig::from_json_str(json).unwrap();
        assert_eq!(config.cache.max_entries, 16);
        assert_eq!(config.layer.projection, ProjectionType::NaturalEarth);
        assert_eq!(config.layer.scale_adjustment, 1.0);
        assert_eq!(config.measurement, MeasurementConfig::default());
        assert_eq!(config.ixmaps, IxMapsConfig::default());

        assert_eq!(config.projection_cache().capacity(), 16);
        assert_eq!(config.measure().scale_factor, IXEARTH_SCALE_FACTOR);
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            MapConfig::from_json_str(r#"{ "cache": { "maxEntries": 0 } }"#),
            Err(MapError::InvalidConfig(_))
        ));
        assert!(matches!(
            MapConfig::from_json_str(r#"{ "layer": { "projection": "globe" } }"#),
            Err(MapError::InvalidConfig(_))
        ));
        assert!(matches!(
            MapConfig::from_json_str(r#"{ "ixmaps": { "pixelsPerLongitude": 0 } }"#),
            Err(MapError::InvalidConfig(_))
        ));
        assert!(matches!(
            MapConfig::from_json_str("{ not json"),
            Err(MapError::Serialization(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            MapConfig::from_file("/nonexistent/ixmaps.json"),
            Err(MapError::Io(_))
        ));
    }
}
