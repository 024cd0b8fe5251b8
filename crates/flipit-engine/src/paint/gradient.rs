use crate::coords::Vec2;

use super::Color;

/// Two-stop linear gradient in logical pixel space.
///
/// Semantics:
/// - `start` and `end` are positions in the same coordinate space as geometry.
/// - Points before `start` take `from`, points past `end` take `to` (pad).
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    pub start: Vec2,
    pub end: Vec2,
    pub from: Color,
    pub to: Color,
}

impl LinearGradient {
    pub fn new(start: Vec2, end: Vec2, from: Color, to: Color) -> Self {
        Self { start, end, from, to }
    }

    /// Top-to-bottom gradient spanning `top..bottom` on the y axis.
    pub fn vertical(top: f32, bottom: f32, from: Color, to: Color) -> Self {
        Self::new(Vec2::new(0.0, top), Vec2::new(0.0, bottom), from, to)
    }

    /// Returns true when the axis has a length and every value is finite.
    pub fn is_valid(&self) -> bool {
        self.start.is_finite()
            && self.end.is_finite()
            && self.from.is_finite()
            && self.to.is_finite()
            && self.start != self.end
    }
}
