use flipit_engine::input::{InputEvent, PointerMoveEvent};

/// Pointer travel, per axis and in logical pixels, that still counts as
/// jitter. Anything strictly larger ends the screensaver.
pub const EXIT_THRESHOLD: f32 = 5.0;

/// Why the screensaver decided to exit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExitReason {
    PointerMoved { dx: f32, dy: f32 },
    ButtonPressed,
    KeyPressed,
}

/// Decides when user input should end the screensaver.
///
/// In preview mode nothing ever exits and the pointer is not tracked.
#[derive(Debug, Clone, Default)]
pub struct ExitPolicy {
    preview: bool,
    pointer: Option<(f32, f32)>,
}

impl ExitPolicy {
    pub fn new(preview: bool) -> Self {
        Self { preview, pointer: None }
    }

    #[inline]
    pub fn is_preview(&self) -> bool {
        self.preview
    }

    /// Last pointer position seen, if any.
    #[inline]
    pub fn pointer(&self) -> Option<(f32, f32)> {
        self.pointer
    }

    /// Feeds one input event; returns the reason to exit, if any.
    pub fn observe(&mut self, event: &InputEvent) -> Option<ExitReason> {
        if self.preview {
            return None;
        }

        match event {
            InputEvent::PointerMoved(PointerMoveEvent { x, y }) => self.pointer_moved(*x, *y),
            ev if ev.is_button_press() => Some(ExitReason::ButtonPressed),
            ev if ev.is_key_press() => Some(ExitReason::KeyPressed),
            _ => None,
        }
    }

    fn pointer_moved(&mut self, x: f32, y: f32) -> Option<ExitReason> {
        let previous = self.pointer.replace((x, y));
        let (px, py) = previous?;
        let (dx, dy) = (x - px, y - py);
        if dx.abs() > EXIT_THRESHOLD || dy.abs() > EXIT_THRESHOLD {
            Some(ExitReason::PointerMoved { dx, dy })
        } else {
            None
        }
    }
}
