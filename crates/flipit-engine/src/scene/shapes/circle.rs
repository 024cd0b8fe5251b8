use crate::coords::Vec2;
use crate::paint::{Color, Paint};
use crate::scene::{DrawCmd, DrawList, ZIndex};

/// Filled circle draw payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CircleCmd {
    pub center: Vec2,
    pub radius: f32,
    pub paint: Paint,
}

impl CircleCmd {
    #[inline]
    pub fn new(center: Vec2, radius: f32, paint: Paint) -> Self {
        Self { center, radius, paint }
    }
}

impl DrawList {
    /// Records a filled circle.
    #[inline]
    pub fn push_circle(&mut self, z: ZIndex, center: Vec2, radius: f32, paint: Paint) {
        self.push(z, DrawCmd::Circle(CircleCmd::new(center, radius, paint)));
    }

    /// Records a solid circle.
    #[inline]
    pub fn push_solid_circle(&mut self, z: ZIndex, center: Vec2, radius: f32, color: Color) {
        self.push_circle(z, center, radius, Paint::Solid(color));
    }

    /// Records a solid circle inscribed in the `diameter`-sized square at
    /// `(x, y)`, the way ellipse fills are usually specified.
    #[inline]
    pub fn push_solid_disc(&mut self, z: ZIndex, x: f32, y: f32, diameter: f32, color: Color) {
        let r = diameter * 0.5;
        self.push_solid_circle(z, Vec2::new(x + r, y + r), r, color);
    }
}
