use crate::scene::DrawList;
use crate::text::FontSystem;

use super::shapes::circle::CircleRenderer;
use super::shapes::rect::RectRenderer;
use super::shapes::text::TextRenderer;
use super::{RenderCtx, RenderTarget};

/// Paints a whole [`DrawList`] in z order across shape types.
///
/// Within one layer the order is rects, circles, then text. Items that must
/// cover text (a divider line, say) belong on a higher layer.
#[derive(Default)]
pub struct SceneRenderer {
    rect: RectRenderer,
    circle: CircleRenderer,
    text: TextRenderer,
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        draw_list: &mut DrawList,
        fonts: &FontSystem,
    ) {
        if draw_list.is_empty() || !ctx.viewport.is_valid() {
            return;
        }

        self.rect.prepare(ctx, draw_list);
        self.circle.prepare(ctx, draw_list);
        self.text.prepare(ctx, draw_list, fonts);

        for z in draw_list.layers() {
            self.rect.draw_layer(target, z);
            self.circle.draw_layer(target, z);
            self.text.draw_layer(target, z);
        }
    }
}
