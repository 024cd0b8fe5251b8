//! Core engine-facing contracts.
//!
//! This module defines the interface between the runtime (platform loop) and
//! the application drawn inside it. Runtime internals stay private; callbacks
//! get a window handle, a command buffer, and for frames a ready GPU context.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
