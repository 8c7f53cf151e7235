//! Linear IxMaps canvas transform
//!
//! IxMaps places the IxEarth world on a fixed pixel canvas with a custom prime
//! meridian. The mapping is linear in both axes (equirectangular); no
//! trigonometry is involved, so the inverse is exact up to floating point.

use crate::core::constants::{
    IXMAPS_CANVAS_HEIGHT, IXMAPS_CANVAS_WIDTH, IXMAPS_PRIME_MERIDIAN_LNG,
};
use crate::core::geo::{LatLng, Point};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};

/// Canvas placement of the IxMaps coordinate system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IxMapsConfig {
    /// Pixel column of the reference meridian
    pub prime_meridian_x: f64,
    /// Pixel row of the equator
    pub equator_y: f64,
    pub pixels_per_longitude: f64,
    pub pixels_per_latitude: f64,
    /// Longitude drawn at `prime_meridian_x`
    pub prime_meridian_reference_lng: f64,
}

impl IxMapsConfig {
    /// Fails when either scale factor is zero or not finite
    pub fn validate(&self) -> Result<()> {
        if self.pixels_per_longitude == 0.0 || !self.pixels_per_longitude.is_finite() {
            return Err(MapError::InvalidConfig(format!(
                "pixels_per_longitude must be non-zero, got {}",
                self.pixels_per_longitude
            )));
        }
        if self.pixels_per_latitude == 0.0 || !self.pixels_per_latitude.is_finite() {
            return Err(MapError::InvalidConfig(format!(
                "pixels_per_latitude must be non-zero, got {}",
                self.pixels_per_latitude
            )));
        }
        Ok(())
    }
}

impl Default for IxMapsConfig {
    fn default() -> Self {
        let pixels_per_longitude = IXMAPS_CANVAS_WIDTH / 360.0;
        Self {
            prime_meridian_x: (IXMAPS_PRIME_MERIDIAN_LNG + 180.0) * pixels_per_longitude,
            equator_y: IXMAPS_CANVAS_HEIGHT / 2.0,
            pixels_per_longitude,
            pixels_per_latitude: IXMAPS_CANVAS_HEIGHT / 180.0,
            prime_meridian_reference_lng: IXMAPS_PRIME_MERIDIAN_LNG,
        }
    }
}

/// Geographic coordinate to IxMaps canvas pixel
pub fn lat_lng_to_pixel(lat: f64, lng: f64, config: &IxMapsConfig) -> Result<Point> {
    config.validate()?;
    Ok(forward(lat, lng, config))
}

/// IxMaps canvas pixel to geographic coordinate
pub fn pixel_to_lat_lng(x: f64, y: f64, config: &IxMapsConfig) -> Result<LatLng> {
    config.validate()?;
    Ok(inverse(x, y, config))
}

fn forward(lat: f64, lng: f64, config: &IxMapsConfig) -> Point {
    Point::new(
        config.prime_meridian_x
            + (lng - config.prime_meridian_reference_lng) * config.pixels_per_longitude,
        config.equator_y - lat * config.pixels_per_latitude,
    )
}

fn inverse(x: f64, y: f64, config: &IxMapsConfig) -> LatLng {
    LatLng::new(
        (config.equator_y - y) / config.pixels_per_latitude,
        (x - config.prime_meridian_x) / config.pixels_per_longitude
            + config.prime_meridian_reference_lng,
    )
}

/// Validated transform; construction is the only fallible step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IxMapsTransform {
    config: IxMapsConfig,
}

impl IxMapsTransform {
    pub fn new(config: IxMapsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &IxMapsConfig {
        &self.config
    }

    pub fn lat_lng_to_pixel(&self, lat_lng: LatLng) -> Point {
        forward(lat_lng.lat, lat_lng.lng, &self.config)
    }

    pub fn pixel_to_lat_lng(&self, pixel: Point) -> LatLng {
        inverse(pixel.x, pixel.y, &self.config)
    }

    /// Canvas pixels per radian of longitude
    pub fn pixels_per_radian(&self) -> f64 {
        self.config.pixels_per_longitude.abs() * 180.0 / std::f64::consts::PI
    }
}

impl Default for IxMapsTransform {
    fn default() -> Self {
        Self {
            config: IxMapsConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prime_meridian_maps_to_reference_column() {
        let config = IxMapsConfig::default();
        let pixel = lat_lng_to_pixel(0.0, 30.0, &config).unwrap();
        assert!((pixel.x - config.prime_meridian_x).abs() < 1e-9);
        assert!((pixel.y - config.equator_y).abs() < 1e-9);
    }

    #[test]
    fn test_default_canvas_corners() {
        let config = IxMapsConfig::default();
        let nw = lat_lng_to_pixel(90.0, -180.0, &config).unwrap();
        let se = lat_lng_to_pixel(-90.0, 180.0, &config).unwrap();
        assert!(nw.x.abs() < 1e-9 && nw.y.abs() < 1e-9);
        assert!((se.x - IXMAPS_CANVAS_WIDTH).abs() < 1e-9);
        assert!((se.y - IXMAPS_CANVAS_HEIGHT).abs() < 1e-9);
    }

    #[test]
    fn test_round_trip_grid() {
        let transform = IxMapsTransform::default();
        let mut lat = -90.0;
        while lat <= 90.0 {
            let mut lng = -180.0;
            while lng <= 180.0 {
                let pixel = transform.lat_lng_to_pixel(LatLng::new(lat, lng));
                let back = transform.pixel_to_lat_lng(pixel);
                assert!((back.lat - lat).abs() < 1e-9, "lat {} -> {}", lat, back.lat);
                assert!((back.lng - lng).abs() < 1e-9, "lng {} -> {}", lng, back.lng);
                lng += 7.5;
            }
            lat += 5.0;
        }
    }

    #[test]
    fn test_zero_scale_is_rejected() {
        let config = IxMapsConfig {
            pixels_per_longitude: 0.0,
            ..IxMapsConfig::default()
        };
        assert!(matches!(
            lat_lng_to_pixel(0.0, 0.0, &config),
            Err(MapError::InvalidConfig(_))
        ));
        assert!(pixel_to_lat_lng(0.0, 0.0, &config).is_err());

        let config = IxMapsConfig {
            pixels_per_latitude: 0.0,
            ..IxMapsConfig::default()
        };
        assert!(IxMapsTransform::new(config).is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: IxMapsConfig = serde_json::from_str(r#"{"equatorY": 100.0}"#).unwrap();
        assert_eq!(config.equator_y, 100.0);
        assert_eq!(config.prime_meridian_reference_lng, 30.0);
    }
}
