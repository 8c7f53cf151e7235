use crate::rendering::backend::RenderBackend;
use crate::rendering::host::MapHost;
use crate::Result;

/// Common layer state
#[derive(Debug, Clone)]
pub struct LayerProperties {
    pub id: String,
    pub name: String,
    pub z_index: i32,
    pub opacity: f32,
    pub visible: bool,
    pub options: serde_json::Value,
}

impl LayerProperties {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            z_index: 0,
            opacity: 1.0,
            visible: true,
            options: serde_json::Value::Null,
        }
    }
}

impl Default for LayerProperties {
    fn default() -> Self {
        Self::new("default".to_string(), "Default Layer".to_string())
    }
}

/// A layer drawn by the host's render loop with its own GPU program.
///
/// The host calls `on_add` once when the layer is attached, `render` for
/// every frame, and `on_remove` when the layer is detached.
pub trait CustomLayer {
    fn properties(&self) -> &LayerProperties;

    fn properties_mut(&mut self) -> &mut LayerProperties;

    fn id(&self) -> &str {
        &self.properties().id
    }

    fn is_visible(&self) -> bool {
        self.properties().visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.properties_mut().visible = visible;
    }

    fn opacity(&self) -> f32 {
        self.properties().opacity
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.properties_mut().opacity = opacity.clamp(0.0, 1.0);
    }

    fn on_add(&mut self, host: &mut dyn MapHost, backend: &mut dyn RenderBackend);

    /// Draws one frame; returns the number of draw calls issued
    fn render(&mut self, host: &mut dyn MapHost, backend: &mut dyn RenderBackend)
        -> Result<usize>;

    fn on_remove(&mut self, host: &mut dyn MapHost, backend: &mut dyn RenderBackend);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_properties() {
        let props = LayerProperties::new("test".to_string(), "Test Layer".to_string());

        assert_eq!(props.id, "test");
        assert_eq!(props.name, "Test Layer");
        assert_eq!(props.opacity, 1.0);
        assert!(props.visible);
        assert_eq!(props.z_index, 0);
    }
}
