//! GPU rendering subsystem.
//!
//! Shape renderers consume `scene` draw lists and issue GPU commands via wgpu.
//! [`SceneRenderer`] owns one renderer per shape type and paints the list
//! layer by layer, so a rect at a higher z lands on top of text below it.
//!
//! Convention:
//! - CPU geometry is in logical pixels (top-left origin, +Y down).
//! - Vertex shaders convert to NDC using a viewport uniform.

mod ctx;
mod scene_renderer;
pub mod shapes;

pub use ctx::{RenderCtx, RenderTarget};
pub use scene_renderer::SceneRenderer;
