//! In-process host and backend for tests and offline tooling

use crate::core::geo::{LatLng, Point};
use crate::core::viewport::Viewport;
use crate::rendering::backend::{BufferHandle, ProgramHandle, RenderBackend};
use crate::rendering::host::{ListenerId, MapHost, ViewportEvent};
use crate::{MapError, Result};
use fxhash::{FxHashMap, FxHashSet};

/// Map host driven by explicit viewport changes
#[derive(Debug, Default)]
pub struct HeadlessHost {
    viewport: Viewport,
    listeners: FxHashMap<ListenerId, ViewportEvent>,
    next_listener: u64,
    repaint_requests: usize,
}

impl HeadlessHost {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Default::default()
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Repaints requested so far, by layers or by fired events
    pub fn repaint_requests(&self) -> usize {
        self.repaint_requests
    }

    pub fn pan_to(&mut self, center: LatLng) {
        self.viewport.set_center(center);
        self.fire(ViewportEvent::Move);
    }

    pub fn zoom_to(&mut self, zoom: f64) {
        self.viewport.set_zoom(zoom);
        self.fire(ViewportEvent::Zoom);
    }

    pub fn rotate_to(&mut self, bearing: f64) {
        self.viewport.set_bearing(bearing);
        self.fire(ViewportEvent::Rotate);
    }

    pub fn resize(&mut self, size: Point) {
        self.viewport.set_size(size);
        self.fire(ViewportEvent::Resize);
    }

    /// A fired event schedules one repaint if anyone listens to it
    fn fire(&mut self, event: ViewportEvent) {
        if self.listeners.values().any(|e| *e == event) {
            self.repaint_requests += 1;
        }
    }
}

impl MapHost for HeadlessHost {
    fn viewport(&self) -> Viewport {
        self.viewport.clone()
    }

    fn subscribe(&mut self, event: ViewportEvent) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.insert(id, event);
        id
    }

    fn unsubscribe(&mut self, listener: ListenerId) {
        self.listeners.remove(&listener);
    }

    fn trigger_repaint(&mut self) {
        self.repaint_requests += 1;
    }
}

/// One recorded line-strip draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub program: ProgramHandle,
    pub buffer: BufferHandle,
    pub first: u32,
    pub count: u32,
}

/// Backend that records every call instead of touching a GPU
#[derive(Debug, Default)]
pub struct RecordingBackend {
    programs: FxHashSet<ProgramHandle>,
    buffers: FxHashMap<BufferHandle, Vec<f32>>,
    draws: Vec<DrawCall>,
    next_handle: u32,
    fail_compile: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose shader compilation always fails
    pub fn failing_compile() -> Self {
        Self {
            fail_compile: true,
            ..Default::default()
        }
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    pub fn take_draws(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.draws)
    }

    /// Last upload to `buffer`
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<&[f32]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    fn next_handle(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl RenderBackend for RecordingBackend {
    fn compile_program(&mut self, vertex_src: &str, fragment_src: &str) -> Result<ProgramHandle> {
        if self.fail_compile || vertex_src.trim().is_empty() || fragment_src.trim().is_empty() {
            return Err(MapError::Render("shader compilation failed".to_string()));
        }
        let program = ProgramHandle(self.next_handle());
        self.programs.insert(program);
        Ok(program)
    }

    fn create_buffer(&mut self) -> Result<BufferHandle> {
        let buffer = BufferHandle(self.next_handle());
        self.buffers.insert(buffer, Vec::new());
        Ok(buffer)
    }

    fn upload_vertices(&mut self, buffer: BufferHandle, vertices: &[f32]) -> Result<()> {
        let contents = self
            .buffers
            .get_mut(&buffer)
            .ok_or_else(|| MapError::Render(format!("unknown buffer {:?}", buffer)))?;
        contents.clear();
        contents.extend_from_slice(vertices);
        Ok(())
    }

    fn draw_line_strip(
        &mut self,
        program: ProgramHandle,
        buffer: BufferHandle,
        first: u32,
        count: u32,
    ) -> Result<()> {
        if !self.programs.contains(&program) {
            return Err(MapError::Render(format!("unknown program {:?}", program)));
        }
        let len = self
            .buffers
            .get(&buffer)
            .map(|v| v.len() / 2)
            .ok_or_else(|| MapError::Render(format!("unknown buffer {:?}", buffer)))?;
        if (first + count) as usize > len {
            return Err(MapError::Render(format!(
                "draw of {}..{} overruns {} vertices",
                first,
                first + count,
                len
            )));
        }
        self.draws.push(DrawCall {
            program,
            buffer,
            first,
            count,
        });
        Ok(())
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer);
    }
}
