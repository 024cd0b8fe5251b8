use crate::coords::{Rect, Vec2};
use crate::paint::Color;
use crate::scene::{DrawCmd, DrawList, ZIndex};
use crate::text::FontId;

/// Where a text run is placed.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TextAnchor {
    /// Top-left of the line box, in logical pixels.
    TopLeft(Vec2),
    /// Centered horizontally and vertically inside the box.
    Centered(Rect),
}

/// Text draw payload.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCmd {
    pub text: String,
    pub font: FontId,
    /// Font size in logical pixels (em size).
    pub size: f32,
    pub color: Color,
    pub anchor: TextAnchor,
}

impl DrawList {
    /// Records a text draw command.
    pub fn push_text(
        &mut self,
        z: ZIndex,
        text: impl Into<String>,
        font: FontId,
        size: f32,
        color: Color,
        anchor: TextAnchor,
    ) {
        self.push(z, DrawCmd::Text(TextCmd {
            text: text.into(),
            font,
            size,
            color,
            anchor,
        }));
    }
}
