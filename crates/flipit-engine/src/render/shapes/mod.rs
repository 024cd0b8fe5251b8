//! Shape renderers.
//!
//! Every renderer follows the same two-step contract:
//! - `prepare` walks the draw list once, uploads one instance buffer for the
//!   whole frame, and remembers which instance range belongs to which z layer
//! - `draw_layer` records the draw call for one layer into its own pass
//!
//! Uploading once per frame matters: `queue.write_buffer` calls all land
//! before the frame's command buffer runs, so re-uploading between layers
//! would leave every pass reading the last upload.

mod common;

pub mod circle;
pub mod rect;
pub mod text;
