use crate::core::config::MapConfig;
use crate::core::geo::Point;
use crate::core::viewport::Viewport;
use crate::data::geojson::{FeatureSet, GeoJsonFeature, GeoJsonGeometry, Position};
use crate::layers::base::{CustomLayer, LayerProperties};
use crate::projection::factory::create_any_projection;
use crate::projection::ixmaps::IxMapsConfig;
use crate::projection::transform::project_geometry;
use crate::projection::{Projection, ProjectionOptions, ProjectionType};
use crate::rendering::backend::{BufferHandle, ProgramHandle, RenderBackend};
use crate::rendering::host::{ListenerId, MapHost, ViewportEvent};
use crate::rendering::shaders;
use crate::{MapError, Result};
use fxhash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GpuState {
    Detached,
    Ready {
        program: ProgramHandle,
        buffer: BufferHandle,
    },
    /// Attached, but the program could not be built
    Disabled,
}

/// Draws GeoJSON features through a flat projection on top of a tiled map.
///
/// Projected geometry is not kept between frames: every `render` rebuilds the
/// projection from the host viewport and reprojects the loaded features.
/// Viewport listeners only exist so the host schedules those frames.
pub struct CustomProjectionLayer {
    properties: LayerProperties,
    projection: Box<dyn Projection>,
    ixmaps: IxMapsConfig,
    scale_adjustment: f64,
    features: Vec<GeoJsonFeature>,
    gpu: GpuState,
    listeners: FxHashMap<ViewportEvent, ListenerId>,
}

impl CustomProjectionLayer {
    pub fn new(
        id: impl Into<String>,
        projection_type: ProjectionType,
        ixmaps: IxMapsConfig,
    ) -> Result<Self> {
        let id = id.into();
        let projection = layer_projection(projection_type, &ProjectionOptions::default(), ixmaps)?;
        Ok(Self {
            properties: LayerProperties::new(id.clone(), id),
            projection,
            ixmaps,
            scale_adjustment: 1.0,
            features: Vec::new(),
            gpu: GpuState::Detached,
            listeners: FxHashMap::default(),
        })
    }

    /// Multiplier applied on top of the zoom-derived scale
    pub fn with_scale_adjustment(mut self, scale_adjustment: f64) -> Self {
        self.scale_adjustment = scale_adjustment;
        self
    }

    pub fn projection_type(&self) -> ProjectionType {
        self.projection.projection_type()
    }

    pub fn projection(&self) -> &dyn Projection {
        self.projection.as_ref()
    }

    pub fn features(&self) -> &[GeoJsonFeature] {
        &self.features
    }

    /// True while attached with a usable program
    pub fn is_enabled(&self) -> bool {
        matches!(self.gpu, GpuState::Ready { .. })
    }

    pub fn is_attached(&self) -> bool {
        self.gpu != GpuState::Detached
    }

    /// Switches to another flat projection and asks for a repaint.
    ///
    /// Does nothing when `projection_type` is already active. The globe is
    /// drawn by the host itself and is rejected.
    pub fn update_projection(
        &mut self,
        projection_type: ProjectionType,
        host: Option<&mut dyn MapHost>,
    ) -> Result<()> {
        if projection_type == self.projection_type() {
            return Ok(());
        }
        let options = ProjectionOptions::default()
            .with_scale(self.projection.scale())
            .with_center(self.projection.center())
            .with_translate(self.projection.translate());
        self.projection = layer_projection(projection_type, &options, self.ixmaps)?;
        log::debug!(
            "layer {} switched to {} projection",
            self.properties.id,
            projection_type
        );
        self.request_repaint(host);
        Ok(())
    }

    /// Replaces the loaded features
    pub fn load_features(
        &mut self,
        features: impl Into<FeatureSet>,
        host: Option<&mut dyn MapHost>,
    ) {
        self.features = features.into().into_inner();
        log::debug!(
            "layer {} loaded {} features",
            self.properties.id,
            self.features.len()
        );
        self.request_repaint(host);
    }

    pub fn clear_features(&mut self, host: Option<&mut dyn MapHost>) {
        self.features.clear();
        self.request_repaint(host);
    }

    fn request_repaint(&self, host: Option<&mut dyn MapHost>) {
        if let (true, Some(host)) = (self.is_attached(), host) {
            host.trigger_repaint();
        }
    }

    /// Matches the projection to the host camera
    fn sync_projection(&mut self, viewport: &Viewport) {
        self.projection
            .set_scale(viewport.projection_scale(self.scale_adjustment));
        self.projection.set_center(viewport.center);
        self.projection.set_translate(viewport.midpoint());
    }

    /// Clip-space vertices of every drawable run.
    ///
    /// Point and MultiPoint geometries have no line strip to draw. They are
    /// left out of the frame and counted in `skipped`, as are geometries with
    /// no position the projection can place.
    fn build_vertices(&self, viewport: &Viewport) -> Frame {
        let mut frame = Frame::default();
        let midpoint = viewport.midpoint();

        for feature in &self.features {
            let Some(geometry) = feature.geometry.as_ref() else {
                continue;
            };
            let runs_before = frame.runs.len();
            if let Some(projected) = project_geometry(self.projection.as_ref(), geometry) {
                let Frame { vertices, runs, .. } = &mut frame;
                for_each_run(&projected, &mut |run: &[Position]| {
                    let first = (vertices.len() / 2) as u32;
                    for position in run {
                        let screen = Point::new(position[0], position[1])
                            .rotate_around(&midpoint, -viewport.bearing);
                        vertices.extend_from_slice(&viewport.pixel_to_clip(&screen));
                    }
                    runs.push((first, run.len() as u32));
                });
            }
            if frame.runs.len() == runs_before {
                log::debug!(
                    "layer {}: {} feature has nothing to draw as line strips",
                    self.properties.id,
                    geometry.type_name()
                );
                frame.skipped += 1;
            }
        }
        frame
    }
}

/// Vertex data for one render pass
#[derive(Debug, Default)]
struct Frame {
    vertices: Vec<f32>,
    /// `(first, count)` per line strip
    runs: Vec<(u32, u32)>,
    /// Features that contributed no line strip
    skipped: usize,
}

impl CustomLayer for CustomProjectionLayer {
    fn properties(&self) -> &LayerProperties {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut LayerProperties {
        &mut self.properties
    }

    fn on_add(&mut self, host: &mut dyn MapHost, backend: &mut dyn RenderBackend) {
        if self.is_attached() {
            log::warn!("layer {} is already attached", self.properties.id);
            return;
        }

        self.gpu = match backend.compile_program(shaders::LINE_VERTEX, shaders::LINE_FRAGMENT) {
            Ok(program) => match backend.create_buffer() {
                Ok(buffer) => GpuState::Ready { program, buffer },
                Err(e) => {
                    log::error!(
                        "layer {}: vertex buffer allocation failed: {}",
                        self.properties.id,
                        e
                    );
                    backend.delete_program(program);
                    GpuState::Disabled
                }
            },
            Err(e) => {
                log::error!("layer {}: shader program failed: {}", self.properties.id, e);
                GpuState::Disabled
            }
        };
        if !self.is_enabled() {
            return;
        }

        for event in ViewportEvent::REPROJECTING {
            let listener = host.subscribe(event);
            self.listeners.insert(event, listener);
        }
        host.trigger_repaint();
    }

    fn render(
        &mut self,
        host: &mut dyn MapHost,
        backend: &mut dyn RenderBackend,
    ) -> Result<usize> {
        let GpuState::Ready { program, buffer } = self.gpu else {
            return Ok(0);
        };
        if !self.properties.visible || self.features.is_empty() {
            return Ok(0);
        }

        let viewport = host.viewport();
        self.sync_projection(&viewport);
        let frame = self.build_vertices(&viewport);
        if frame.runs.is_empty() {
            return Ok(0);
        }

        backend.upload_vertices(buffer, &frame.vertices)?;
        for &(first, count) in &frame.runs {
            backend.draw_line_strip(program, buffer, first, count)?;
        }
        Ok(frame.runs.len())
    }

    fn on_remove(&mut self, host: &mut dyn MapHost, backend: &mut dyn RenderBackend) {
        if let GpuState::Ready { program, buffer } = self.gpu {
            backend.delete_program(program);
            backend.delete_buffer(buffer);
        }
        for (_, listener) in self.listeners.drain() {
            host.unsubscribe(listener);
        }
        self.gpu = GpuState::Detached;
    }
}

fn layer_projection(
    projection_type: ProjectionType,
    options: &ProjectionOptions,
    ixmaps: IxMapsConfig,
) -> Result<Box<dyn Projection>> {
    if projection_type == ProjectionType::Globe {
        return Err(MapError::UnsupportedProjection(
            "globe is rendered natively by the host map, not by a custom layer".to_string(),
        ));
    }
    create_any_projection(projection_type, options, ixmaps)
}

/// Calls `f` with every run of at least two positions that can be drawn as
/// one line strip: line strings and polygon rings, including Multi* members
fn for_each_run<F: FnMut(&[Position])>(geometry: &GeoJsonGeometry, f: &mut F) {
    if let GeoJsonGeometry::GeometryCollection { geometries } = geometry {
        for geometry in geometries {
            for_each_run(geometry, &mut *f);
        }
        return;
    }

    let mut emit = |run: &[Position]| {
        if run.len() >= 2 {
            f(run);
        }
    };
    match geometry {
        GeoJsonGeometry::LineString { coordinates } => emit(coordinates),
        GeoJsonGeometry::Polygon { coordinates }
        | GeoJsonGeometry::MultiLineString { coordinates } => {
            coordinates.iter().for_each(|ring| emit(ring))
        }
        GeoJsonGeometry::MultiPolygon { coordinates } => coordinates
            .iter()
            .flatten()
            .for_each(|ring| emit(ring)),
        _ => {}
    }
}

/// Creates a custom layer configured from `config`.
///
/// The layer draws through `projection_type` when given, otherwise through
/// `config.layer.projection`. Scale adjustment and IxMaps placement always
/// come from `config`.
pub fn create_custom_projection_layer(
    id: impl Into<String>,
    projection_type: Option<ProjectionType>,
    config: &MapConfig,
) -> Result<CustomProjectionLayer> {
    let projection_type = projection_type.unwrap_or(config.layer.projection);
    Ok(CustomProjectionLayer::new(id, projection_type, config.ixmaps)?
        .with_scale_adjustment(config.layer.scale_adjustment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::headless::{HeadlessHost, RecordingBackend};

    fn line(coordinates: Vec<Position>) -> GeoJsonFeature {
        GeoJsonFeature::new(GeoJsonGeometry::LineString { coordinates })
    }

    fn attached_layer() -> (CustomProjectionLayer, HeadlessHost, RecordingBackend) {
        let mut layer = create_custom_projection_layer(
            "countries",
            Some(ProjectionType::EqualEarth),
            &MapConfig::default(),
        )
        .unwrap();
        let mut host = HeadlessHost::default();
        let mut backend = RecordingBackend::new();
        layer.on_add(&mut host, &mut backend);
        (layer, host, backend)
    }

    #[test]
    fn test_on_add_allocates() {
        let (layer, host, backend) = attached_layer();
        assert!(layer.is_enabled());
        assert_eq!(backend.live_programs(), 1);
        assert_eq!(backend.live_buffers(), 1);
        assert_eq!(host.listener_count(), 3);
    }

    #[test]
    fn test_compile_failure_disables_rendering() {
        let mut layer =
            CustomProjectionLayer::new("broken", ProjectionType::Mercator, IxMapsConfig::default())
                .unwrap();
        let mut host = HeadlessHost::default();
        let mut backend = RecordingBackend::failing_compile();

        layer.on_add(&mut host, &mut backend);
        layer.load_features(vec![line(vec![[0.0, 0.0], [10.0, 0.0]])], Some(&mut host));

        assert!(layer.is_attached());
        assert!(!layer.is_enabled());
        assert_eq!(layer.render(&mut host, &mut backend).unwrap(), 0);
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn test_render_draws_line_strips() {
        let (mut layer, mut host, mut backend) = attached_layer();
        let point = GeoJsonFeature::new(GeoJsonGeometry::Point {
            coordinates: [5.0, 5.0],
        });
        layer.load_features(vec![line(vec![[0.0, 0.0], [10.0, 0.0]]), point], None);

        assert_eq!(layer.render(&mut host, &mut backend).unwrap(), 1);
        let draw = backend.draws()[0];
        assert_eq!((draw.first, draw.count), (0, 2));

        // the viewport center lands in the middle of clip space
        let vertices = backend.buffer_contents(draw.buffer).unwrap();
        assert!(vertices[0].abs() < 1e-6 && vertices[1].abs() < 1e-6);
        assert!(vertices[2] > 0.0);
        assert!(vertices[3].abs() < 1e-6);
    }

    #[test]
    fn test_render_scale_follows_zoom() {
        let (mut layer, mut host, mut backend) = attached_layer();
        layer.load_features(vec![line(vec![[0.0, 0.0], [10.0, 0.0]])], None);
        host.zoom_to(4.0);
        layer.render(&mut host, &mut backend).unwrap();

        let viewport = host.viewport();
        let expected = viewport.size.x / (2.0 * std::f64::consts::PI) * 16.0;
        assert!((layer.projection().scale() - expected).abs() < 1e-9);
        assert_eq!(layer.projection().translate(), viewport.midpoint());
    }

    #[test]
    fn test_render_multi_geometries() {
        let (mut layer, mut host, mut backend) = attached_layer();
        let ring = |lng: f64| vec![[lng, 0.0], [lng + 5.0, 0.0], [lng + 5.0, 5.0], [lng, 0.0]];
        let multi = GeoJsonFeature::new(GeoJsonGeometry::MultiPolygon {
            coordinates: vec![vec![ring(0.0)], vec![ring(20.0), ring(40.0)]],
        });
        let lines = GeoJsonFeature::new(GeoJsonGeometry::MultiLineString {
            coordinates: vec![vec![[0.0, 10.0], [5.0, 10.0]], vec![[0.0, 20.0]]],
        });
        layer.load_features(vec![multi, lines], None);

        assert_eq!(layer.render(&mut host, &mut backend).unwrap(), 4);
        let firsts: Vec<u32> = backend.draws().iter().map(|d| d.first).collect();
        assert_eq!(firsts, vec![0, 4, 8, 12]);
    }

    #[test]
    fn test_bearing_rotates_output() {
        let (mut layer, mut host, mut backend) = attached_layer();
        layer.load_features(vec![line(vec![[0.0, 0.0], [10.0, 0.0]])], None);
        host.rotate_to(90.0);
        layer.render(&mut host, &mut backend).unwrap();

        let draw = backend.draws()[0];
        let vertices = backend.buffer_contents(draw.buffer).unwrap();
        // east points up once the map faces east
        assert!(vertices[2].abs() < 1e-5);
        assert!(vertices[3] > 0.0);
    }

    #[test]
    fn test_update_projection() {
        let (mut layer, mut host, _backend) = attached_layer();
        let before = host.repaint_requests();

        layer
            .update_projection(ProjectionType::EqualEarth, Some(&mut host))
            .unwrap();
        assert_eq!(host.repaint_requests(), before);

        layer
            .update_projection(ProjectionType::NaturalEarth, Some(&mut host))
            .unwrap();
        assert_eq!(layer.projection_type(), ProjectionType::NaturalEarth);
        assert_eq!(host.repaint_requests(), before + 1);

        assert!(matches!(
            layer.update_projection(ProjectionType::Globe, Some(&mut host)),
            Err(MapError::UnsupportedProjection(_))
        ));
        assert_eq!(layer.projection_type(), ProjectionType::NaturalEarth);

        layer
            .update_projection(ProjectionType::IxMaps, Some(&mut host))
            .unwrap();
        assert_eq!(layer.projection_type(), ProjectionType::IxMaps);
    }

    #[test]
    fn test_on_remove_releases_everything() {
        let (mut layer, mut host, mut backend) = attached_layer();
        layer.on_remove(&mut host, &mut backend);
        assert_eq!(backend.live_programs(), 0);
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(host.listener_count(), 0);
        assert!(!layer.is_attached());

        layer.on_remove(&mut host, &mut backend);
        assert_eq!(layer.render(&mut host, &mut backend).unwrap(), 0);

        // a fresh attach after removal works
        layer.on_add(&mut host, &mut backend);
        assert!(layer.is_enabled());
        assert_eq!(backend.live_programs(), 1);
    }

    #[test]
    fn test_clear_features_repaints_when_attached() {
        let (mut layer, mut host, mut backend) = attached_layer();
        layer.load_features(vec![line(vec![[0.0, 0.0], [1.0, 1.0]])], Some(&mut host));
        let before = host.repaint_requests();
        layer.clear_features(Some(&mut host));
        assert_eq!(host.repaint_requests(), before + 1);
        assert!(layer.features().is_empty());
        assert_eq!(layer.render(&mut host, &mut backend).unwrap(), 0);
    }

    #[test]
    fn test_factory_defaults_to_configured_projection() {
        let config = MapConfig::from_json_str(
            r#"{ "layer": { "projection": "naturalEarth", "scaleAdjustment": 2.0 } }"#,
        )
        .unwrap();

        let configured = create_custom_projection_layer("configured", None, &config).unwrap();
        assert_eq!(configured.projection_type(), ProjectionType::NaturalEarth);
        assert_eq!(configured.scale_adjustment, 2.0);

        let explicit =
            create_custom_projection_layer("explicit", Some(ProjectionType::Mercator), &config)
                .unwrap();
        assert_eq!(explicit.projection_type(), ProjectionType::Mercator);
    }

    #[test]
    fn test_point_geometries_are_counted_as_skipped() {
        let (mut layer, host, _backend) = attached_layer();
        let points = GeoJsonFeature::new(GeoJsonGeometry::MultiPoint {
            coordinates: vec![[1.0, 1.0], [2.0, 2.0]],
        });
        let point = GeoJsonFeature::new(GeoJsonGeometry::Point {
            coordinates: [5.0, 5.0],
        });
        layer.load_features(vec![points, line(vec![[0.0, 0.0], [3.0, 0.0]]), point], None);

        let viewport = host.viewport();
        layer.sync_projection(&viewport);
        let frame = layer.build_vertices(&viewport);
        assert_eq!(frame.runs.len(), 1);
        assert_eq!(frame.vertices.len(), 4);
        assert_eq!(frame.skipped, 2);
    }

    #[test]
    fn test_globe_rejected_at_creation() {
        assert!(
            CustomProjectionLayer::new("globe", ProjectionType::Globe, IxMapsConfig::default())
                .is_err()
        );
    }
}
