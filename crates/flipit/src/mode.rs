use flipit_engine::window::WindowMode;

/// Where the clock is shown. The variants are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMode {
    /// Covers the current monitor.
    Fullscreen,
    /// Placed at an explicit rectangle, in physical pixels.
    Bounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    /// Embedded in the host's preview pane, given as a native window handle.
    Preview { parent: isize },
}

impl ClockMode {
    #[inline]
    pub fn is_preview(self) -> bool {
        matches!(self, ClockMode::Preview { .. })
    }

    /// Window placement the runtime should create for this mode.
    pub fn window_mode(self) -> WindowMode {
        match self {
            ClockMode::Fullscreen => WindowMode::Fullscreen,
            ClockMode::Bounds { x, y, width, height } => WindowMode::Bounds { x, y, width, height },
            ClockMode::Preview { parent } => WindowMode::Embedded { parent },
        }
    }
}
