use bytemuck::{Pod, Zeroable};

use crate::render::{RenderCtx, RenderTarget};
use crate::scene::{DrawCmd, DrawList, ZIndex};

use super::common::{resolve_paint, viewport_bind_group, QuadBatch, QuadPipelineDesc};

/// Renderer for `DrawCmd::Rect`, solid or linear-gradient filled.
pub struct RectRenderer {
    batch: QuadBatch,
    bind_group: Option<wgpu::BindGroup>,
    bind_group_generation: u64,
    instances: Vec<RectInstance>,
    zs: Vec<ZIndex>,
}

impl Default for RectRenderer {
    fn default() -> Self {
        Self {
            batch: QuadBatch::new("flipit rect"),
            bind_group: None,
            bind_group_generation: u64::MAX,
            instances: Vec::new(),
            zs: Vec::new(),
        }
    }
}

impl RectRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads every rect in `draw_list` for this frame.
    pub fn prepare(&mut self, ctx: &RenderCtx<'_>, draw_list: &mut DrawList) {
        self.instances.clear();
        self.zs.clear();

        for item in draw_list.iter_in_paint_order() {
            let DrawCmd::Rect(cmd) = &item.cmd else { continue };
            let r = cmd.rect.normalized();
            if r.is_empty() || !r.is_finite() {
                continue;
            }
            let (color0, color1, grad_p0, grad_p1) = resolve_paint(&cmd.paint);
            self.instances.push(RectInstance {
                origin: [r.origin.x, r.origin.y],
                size: [r.size.x, r.size.y],
                color0,
                color1,
                grad_p0,
                grad_p1,
            });
            self.zs.push(item.key.z);
        }

        self.batch.ensure(ctx, QuadPipelineDesc {
            label: "flipit rect pipeline",
            shader_src: include_str!("shaders/rect.wgsl"),
            instance_layout: RectInstance::layout(),
            extra_entries: &[],
        });

        if self.bind_group_generation != self.batch.generation() || self.bind_group.is_none() {
            self.bind_group = viewport_bind_group(ctx, &self.batch, "flipit rect bind group");
            self.bind_group_generation = self.batch.generation();
        }

        self.batch.upload(ctx, &self.instances, self.zs.iter().copied());
    }

    /// Draws the rects prepared for layer `z`.
    pub fn draw_layer(&self, target: &mut RenderTarget<'_>, z: ZIndex) {
        self.batch.draw_layer(target, z, self.bind_group.as_ref());
    }
}

/// Instance data layout (64 bytes):
///
///  offset  0  origin   [f32; 2]   loc 1
///  offset  8  size     [f32; 2]   loc 2
///  offset 16  color0   [f32; 4]   loc 3
///  offset 32  color1   [f32; 4]   loc 4
///  offset 48  grad_p0  [f32; 2]   loc 5
///  offset 56  grad_p1  [f32; 2]   loc 6
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct RectInstance {
    origin: [f32; 2],
    size: [f32; 2],
    color0: [f32; 4],
    color1: [f32; 4],
    grad_p0: [f32; 2],
    grad_p1: [f32; 2],
}

impl RectInstance {
    const ATTRS: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
        1 => Float32x2,
        2 => Float32x2,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x2,
        6 => Float32x2
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<RectInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_layout_matches_struct() {
        assert_eq!(std::mem::size_of::<RectInstance>(), 64);
        assert_eq!(RectInstance::layout().array_stride, 64);
    }
}
