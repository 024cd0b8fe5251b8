//! FlipIt engine crate.
//!
//! Owns the platform + GPU runtime pieces the clock face is drawn with:
//! window modes, the event loop and its tick timer, input translation,
//! the draw list, and the shape/text renderers.

pub mod core;
pub mod device;
pub mod input;
pub mod time;
pub mod window;

pub mod coords;
pub mod logging;
pub mod paint;
pub mod render;
pub mod scene;
pub mod text;
