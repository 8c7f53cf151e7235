use crate::core::constants::IXMAPS_PRIME_MERIDIAN_LNG;
use crate::core::geo::{LatLng, Point};
use crate::projection::ixmaps::{IxMapsConfig, IxMapsTransform};
use crate::projection::raw::RawProjection;
use crate::projection::{Projection, ProjectionOptions, ProjectionType};
use crate::{MapError, Result};
use std::f64::consts::PI;

/// Builds a configured flat projection for `projection_type`.
///
/// `Globe` cannot be represented as a flat forward/inverse pair and is left to
/// the host renderer. `IxMaps` has its own wrapper constructor,
/// [`create_ixmaps_projection`], because it needs the canvas configuration.
pub fn create_projection(
    projection_type: ProjectionType,
    options: &ProjectionOptions,
) -> Result<Box<dyn Projection>> {
    let raw = match projection_type {
        ProjectionType::Mercator => RawProjection::Mercator,
        ProjectionType::EqualEarth => RawProjection::EqualEarth,
        ProjectionType::NaturalEarth => RawProjection::NaturalEarth,
        ProjectionType::Globe => {
            return Err(MapError::UnsupportedProjection(
                "globe is rendered natively by the host map and has no flat projection".into(),
            ))
        }
        ProjectionType::IxMaps => {
            return Err(MapError::UnsupportedProjection(
                "ixmaps uses its own wrapper, call create_ixmaps_projection".into(),
            ))
        }
    };

    log::debug!("creating {} projection {}x{}", projection_type, options.width, options.height);
    Ok(Box::new(GeoProjection::new(projection_type, raw, options)))
}

/// Builds the IxMaps projection over the canvas described by `config`
pub fn create_ixmaps_projection(
    options: &ProjectionOptions,
    config: IxMapsConfig,
) -> Result<IxMapsProjection> {
    let transform = IxMapsTransform::new(config)?;
    Ok(IxMapsProjection::new(transform, options))
}

/// Builds any flat projection, routing `IxMaps` through its wrapper
pub fn create_any_projection(
    projection_type: ProjectionType,
    options: &ProjectionOptions,
    ixmaps: IxMapsConfig,
) -> Result<Box<dyn Projection>> {
    match projection_type {
        ProjectionType::IxMaps => Ok(Box::new(create_ixmaps_projection(options, ixmaps)?)),
        other => create_projection(other, options),
    }
}

/// Scale (pixels per radian) that fits the whole world into `width` × `height`
pub fn recommended_scale(projection_type: ProjectionType, width: f64, height: f64) -> f64 {
    let scale = match projection_type {
        ProjectionType::Globe => width.min(height) / 2.0,
        ProjectionType::IxMaps => (width / (2.0 * PI)).min(height / PI),
        ProjectionType::Mercator => fit(RawProjection::Mercator, width, height),
        ProjectionType::EqualEarth => fit(RawProjection::EqualEarth, width, height),
        ProjectionType::NaturalEarth => fit(RawProjection::NaturalEarth, width, height),
    };

    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

fn fit(raw: RawProjection, width: f64, height: f64) -> f64 {
    let (world_width, world_height) = raw.world_extent();
    (width / world_width).min(height / world_height)
}

/// Default geographic center for `projection_type`
pub fn recommended_center(projection_type: ProjectionType) -> LatLng {
    match projection_type {
        ProjectionType::IxMaps | ProjectionType::Globe => {
            LatLng::new(0.0, IXMAPS_PRIME_MERIDIAN_LNG)
        }
        _ => LatLng::default(),
    }
}

fn resolve_options(
    projection_type: ProjectionType,
    options: &ProjectionOptions,
) -> (f64, LatLng, Point) {
    (
        options
            .scale
            .unwrap_or_else(|| recommended_scale(projection_type, options.width, options.height)),
        options
            .center
            .unwrap_or_else(|| recommended_center(projection_type)),
        options
            .translate
            .unwrap_or_else(|| Point::new(options.width / 2.0, options.height / 2.0)),
    )
}

/// Standard world projection with d3-style scale, center and translate
#[derive(Debug, Clone)]
pub struct GeoProjection {
    projection_type: ProjectionType,
    raw: RawProjection,
    scale: f64,
    center: LatLng,
    translate: Point,
    /// Raw coordinates of `center`
    origin: (f64, f64),
}

impl GeoProjection {
    fn new(
        projection_type: ProjectionType,
        raw: RawProjection,
        options: &ProjectionOptions,
    ) -> Self {
        let (scale, center, translate) = resolve_options(projection_type, options);
        let mut projection = Self {
            projection_type,
            raw,
            scale,
            center,
            translate,
            origin: (0.0, 0.0),
        };
        projection.update_origin();
        projection
    }

    fn update_origin(&mut self) {
        self.origin = self
            .raw
            .forward(self.center.lng.to_radians(), self.center.lat.to_radians())
            .unwrap_or((0.0, 0.0));
    }
}

impl Projection for GeoProjection {
    fn projection_type(&self) -> ProjectionType {
        self.projection_type
    }

    fn project(&self, lat_lng: LatLng) -> Option<Point> {
        let (x, y) = self
            .raw
            .forward(lat_lng.lng.to_radians(), lat_lng.lat.to_radians())?;
        let point = Point::new(
            self.translate.x + self.scale * (x - self.origin.0),
            self.translate.y - self.scale * (y - self.origin.1),
        );
        point.is_finite().then_some(point)
    }

    fn invert(&self, point: Point) -> Option<LatLng> {
        if self.scale == 0.0 {
            return None;
        }
        let x = (point.x - self.translate.x) / self.scale + self.origin.0;
        let y = self.origin.1 - (point.y - self.translate.y) / self.scale;
        let (lambda, phi) = self.raw.inverse(x, y)?;
        Some(LatLng::new(phi.to_degrees(), lambda.to_degrees()))
    }

    fn scale(&self) -> f64 {
        self.scale
    }

    fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    fn center(&self) -> LatLng {
        self.center
    }

    fn set_center(&mut self, center: LatLng) {
        self.center = center;
        self.update_origin();
    }

    fn translate(&self) -> Point {
        self.translate
    }

    fn set_translate(&mut self, translate: Point) {
        self.translate = translate;
    }
}

/// IxMaps canvas transform exposed as a scaled forward/inverse pair.
///
/// `scale` keeps the d3 meaning (pixels per radian of longitude); at
/// `transform.pixels_per_radian()` the output matches native canvas pixels.
#[derive(Debug, Clone)]
pub struct IxMapsProjection {
    transform: IxMapsTransform,
    scale: f64,
    center: LatLng,
    translate: Point,
}

impl IxMapsProjection {
    pub fn new(transform: IxMapsTransform, options: &ProjectionOptions) -> Self {
        let (scale, center, translate) = resolve_options(ProjectionType::IxMaps, options);
        Self {
            transform,
            scale,
            center,
            translate,
        }
    }

    pub fn transform(&self) -> &IxMapsTransform {
        &self.transform
    }

    fn ratio(&self) -> f64 {
        self.scale / self.transform.pixels_per_radian()
    }
}

impl Projection for IxMapsProjection {
    fn projection_type(&self) -> ProjectionType {
        ProjectionType::IxMaps
    }

    fn project(&self, lat_lng: LatLng) -> Option<Point> {
        let canvas = self.transform.lat_lng_to_pixel(lat_lng);
        let origin = self.transform.lat_lng_to_pixel(self.center);
        let point = self
            .translate
            .add(&canvas.subtract(&origin).multiply(self.ratio()));
        point.is_finite().then_some(point)
    }

    fn invert(&self, point: Point) -> Option<LatLng> {
        let ratio = self.ratio();
        if ratio == 0.0 || !ratio.is_finite() {
            return None;
        }
        let origin = self.transform.lat_lng_to_pixel(self.center);
        let canvas = point.subtract(&self.translate).multiply(1.0 / ratio).add(&origin);
        Some(self.transform.pixel_to_lat_lng(canvas))
    }

    fn scale(&self) -> f64 {
        self.scale
    }

    fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    fn center(&self) -> LatLng {
        self.center
    }

    fn set_center(&mut self, center: LatLng) {
        self.center = center;
    }

    fn translate(&self) -> Point {
        self.translate
    }

    fn set_translate(&mut self, translate: Point) {
        self.translate = translate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_globe_and_ixmaps_are_rejected() {
        let options = ProjectionOptions::default();
        assert!(matches!(
            create_projection(ProjectionType::Globe, &options),
            Err(MapError::UnsupportedProjection(_))
        ));
        match create_projection(ProjectionType::IxMaps, &options) {
            Err(MapError::UnsupportedProjection(message)) => {
                assert!(message.contains("create_ixmaps_projection"))
            }
            _ => panic!("ixmaps must go through its wrapper"),
        }
    }

    #[test]
    fn test_center_lands_on_translate() {
        let options = ProjectionOptions::new(800.0, 400.0)
            .with_center(LatLng::new(20.0, 45.0))
            .with_scale(300.0);
        for projection_type in [
            ProjectionType::Mercator,
            ProjectionType::EqualEarth,
            ProjectionType::NaturalEarth,
        ] {
            let projection = create_projection(projection_type, &options).unwrap();
            let point = projection.project(LatLng::new(20.0, 45.0)).unwrap();
            assert!((point.x - 400.0).abs() < 1e-9, "{}", projection_type);
            assert!((point.y - 200.0).abs() < 1e-9, "{}", projection_type);
        }
    }

    #[test]
    fn test_north_is_up() {
        let projection =
            create_projection(ProjectionType::EqualEarth, &ProjectionOptions::default()).unwrap();
        let north = projection.project(LatLng::new(40.0, 0.0)).unwrap();
        let south = projection.project(LatLng::new(-40.0, 0.0)).unwrap();
        assert!(north.y < south.y);
    }

    #[test]
    fn test_project_invert_round_trip() {
        let options = ProjectionOptions::new(1024.0, 512.0).with_center(LatLng::new(10.0, 30.0));
        for projection_type in [
            ProjectionType::Mercator,
            ProjectionType::EqualEarth,
            ProjectionType::NaturalEarth,
        ] {
            let projection = create_projection(projection_type, &options).unwrap();
            let original = LatLng::new(-33.9, 151.2);
            let back = projection
                .invert(projection.project(original).unwrap())
                .unwrap();
            assert!((back.lat - original.lat).abs() < 1e-6, "{}", projection_type);
            assert!((back.lng - original.lng).abs() < 1e-6, "{}", projection_type);
        }
    }

    #[test]
    fn test_ixmaps_wrapper() {
        let options = ProjectionOptions::new(1000.0, 500.0);
        let projection = create_ixmaps_projection(&options, IxMapsConfig::default()).unwrap();
        assert_eq!(projection.projection_type(), ProjectionType::IxMaps);

        let center = projection.project(LatLng::new(0.0, 30.0)).unwrap();
        assert!((center.x - 500.0).abs() < 1e-9);
        assert!((center.y - 250.0).abs() < 1e-9);

        let point = LatLng::new(45.0, -120.0);
        let back = projection.invert(projection.project(point).unwrap()).unwrap();
        assert!((back.lat - point.lat).abs() < 1e-9);
        assert!((back.lng - point.lng).abs() < 1e-9);
    }

    #[test]
    fn test_ixmaps_native_scale_matches_canvas() {
        let config = IxMapsConfig::default();
        let transform = IxMapsTransform::new(config).unwrap();
        let options = ProjectionOptions::new(8192.0, 4096.0)
            .with_scale(transform.pixels_per_radian())
            .with_translate(Point::new(config.prime_meridian_x, config.equator_y));
        let projection = create_ixmaps_projection(&options, config).unwrap();

        let target = LatLng::new(12.0, 80.0);
        let expected = transform.lat_lng_to_pixel(target);
        let actual = projection.project(target).unwrap();
        assert!((expected.x - actual.x).abs() < 1e-6);
        assert!((expected.y - actual.y).abs() < 1e-6);
    }

    #[test]
    fn test_ixmaps_wrapper_rejects_zero_scale_config() {
        let config = IxMapsConfig {
            pixels_per_latitude: 0.0,
            ..IxMapsConfig::default()
        };
        assert!(create_ixmaps_projection(&ProjectionOptions::default(), config).is_err());
    }

    #[test]
    fn test_recommended_scale_fits_world() {
        for projection_type in [
            ProjectionType::Mercator,
            ProjectionType::EqualEarth,
            ProjectionType::NaturalEarth,
        ] {
            let options = ProjectionOptions::new(960.0, 500.0);
            let projection = create_projection(projection_type, &options).unwrap();
            let east = projection.project(LatLng::new(0.0, 180.0)).unwrap();
            let west = projection.project(LatLng::new(0.0, -180.0)).unwrap();
            assert!(east.x <= 960.0 + 1e-6, "{}", projection_type);
            assert!(west.x >= -1e-6, "{}", projection_type);
        }
        assert_eq!(recommended_scale(ProjectionType::Globe, 800.0, 600.0), 300.0);
        assert_eq!(recommended_scale(ProjectionType::Mercator, 0.0, 0.0), 1.0);
    }

    #[test]
    fn test_recommended_center() {
        assert_eq!(recommended_center(ProjectionType::IxMaps).lng, 30.0);
        assert_eq!(recommended_center(ProjectionType::Mercator), LatLng::default());
    }

    #[test]
    fn test_any_projection_routes_ixmaps() {
        let projection = create_any_projection(
            ProjectionType::IxMaps,
            &ProjectionOptions::default(),
            IxMapsConfig::default(),
        )
        .unwrap();
        assert_eq!(projection.projection_type(), ProjectionType::IxMaps);
        assert!(create_any_projection(
            ProjectionType::Globe,
            &ProjectionOptions::default(),
            IxMapsConfig::default()
        )
        .is_err());
    }
}
