pub mod backend;
pub mod headless;
pub mod host;
#[cfg(feature = "render")]
pub mod wgpu_backend;

pub use backend::{BufferHandle, ProgramHandle, RenderBackend};
pub use headless::{DrawCall, HeadlessHost, RecordingBackend};
pub use host::{ListenerId, MapHost, ViewportEvent};
#[cfg(feature = "render")]
pub use wgpu_backend::WgpuLineBackend;

pub mod shaders {
    pub const LINE_VERTEX: &str = include_str!("shaders/line.vert.wgsl");
    pub const LINE_FRAGMENT: &str = include_str!("shaders/line.frag.wgsl");
}
