/// Viewport size in logical pixels.
///
/// The clock face centers itself in this; renderers use it to map logical
/// positions to NDC.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Whole-pixel size, truncated the way window client areas are reported.
    #[inline]
    pub fn size_px(self) -> (i32, i32) {
        (self.width as i32, self.height as i32)
    }
}
