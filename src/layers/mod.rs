pub mod base;
pub mod custom;

pub use base::{CustomLayer, LayerProperties};
pub use custom::{create_custom_projection_layer, CustomProjectionLayer};
