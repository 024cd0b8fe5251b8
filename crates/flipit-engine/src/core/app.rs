use anyhow::Result;

use crate::input::InputEvent;
use crate::window::RuntimeCtx;

use super::ctx::{FrameCtx, WindowCtx};

/// Control directive returned by frame callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
///
/// All callbacks run on the event-loop thread. Requests such as redraws,
/// timer changes or exit go through [`RuntimeCtx`] and are applied once the
/// callback returns.
pub trait App {
    /// Called once after the window and its GPU surface exist, before any
    /// frame is drawn. An error here stops the runtime and is returned from
    /// [`Runtime::run`](crate::window::Runtime::run).
    fn on_load(&mut self, window: &WindowCtx<'_>, runtime: &mut RuntimeCtx) -> Result<()> {
        let _ = (window, runtime);
        Ok(())
    }

    /// Called for every translated input event.
    fn on_input(&mut self, event: &InputEvent, runtime: &mut RuntimeCtx) {
        let _ = (event, runtime);
    }

    /// Called each time the runtime ticker fires.
    fn on_timer(&mut self, runtime: &mut RuntimeCtx) {
        let _ = runtime;
    }

    /// Called for each redraw of the window.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
