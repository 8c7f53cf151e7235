use crate::core::viewport::Viewport;
use serde::{Deserialize, Serialize};

/// Viewport changes a layer can listen to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewportEvent {
    Move,
    Zoom,
    Rotate,
    Resize,
}

impl ViewportEvent {
    /// Events after which projected geometry is stale
    pub const REPROJECTING: [ViewportEvent; 3] =
        [ViewportEvent::Move, ViewportEvent::Zoom, ViewportEvent::Rotate];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// The interactive map a custom layer is attached to.
///
/// The host owns the viewport and the frame schedule: layers read the
/// viewport during `render` and ask for another frame through
/// `trigger_repaint`.
pub trait MapHost {
    fn viewport(&self) -> Viewport;

    /// Registers interest in `event`; the host repaints when it fires
    fn subscribe(&mut self, event: ViewportEvent) -> ListenerId;

    fn unsubscribe(&mut self, listener: ListenerId);

    fn trigger_repaint(&mut self);
}
