use crate::coords::Rect;
use crate::paint::{Color, LinearGradient, Paint};
use crate::scene::{DrawCmd, DrawList, ZIndex};

/// Rectangle draw payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RectCmd {
    pub rect: Rect,
    pub paint: Paint,
}

impl RectCmd {
    #[inline]
    pub fn new(rect: Rect, paint: Paint) -> Self {
        Self { rect, paint }
    }
}

impl DrawList {
    /// Records a rectangle draw command.
    #[inline]
    pub fn push_rect(&mut self, z: ZIndex, rect: Rect, paint: Paint) {
        self.push(z, DrawCmd::Rect(RectCmd::new(rect, paint)));
    }

    /// Records a solid rectangle draw command.
    #[inline]
    pub fn push_solid_rect(&mut self, z: ZIndex, rect: Rect, color: Color) {
        self.push_rect(z, rect, Paint::Solid(color));
    }

    /// Records a gradient-filled rectangle.
    #[inline]
    pub fn push_gradient_rect(&mut self, z: ZIndex, rect: Rect, gradient: LinearGradient) {
        self.push_rect(z, rect, Paint::LinearGradient(gradient));
    }

    /// Records a horizontal line of the given thickness, centered on `y`.
    #[inline]
    pub fn push_hline(&mut self, z: ZIndex, x0: f32, x1: f32, y: f32, width: f32, color: Color) {
        let rect = Rect::new(x0, y - width * 0.5, x1 - x0, width);
        self.push_solid_rect(z, rect, color);
    }
}
