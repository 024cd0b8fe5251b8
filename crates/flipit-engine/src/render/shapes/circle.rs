use bytemuck::{Pod, Zeroable};

use crate::paint::Paint;
use crate::render::{RenderCtx, RenderTarget};
use crate::scene::{DrawCmd, DrawList, ZIndex};

use super::common::{viewport_bind_group, QuadBatch, QuadPipelineDesc};

/// Renderer for `DrawCmd::Circle`.
///
/// Circles are drawn as instanced bounding quads with an analytic SDF edge.
/// Gradient paints fall back to their `from` color.
pub struct CircleRenderer {
    batch: QuadBatch,
    bind_group: Option<wgpu::BindGroup>,
    bind_group_generation: u64,
    instances: Vec<CircleInstance>,
    zs: Vec<ZIndex>,
}

impl Default for CircleRenderer {
    fn default() -> Self {
        Self {
            batch: QuadBatch::new("flipit circle"),
            bind_group: None,
            bind_group_generation: u64::MAX,
            instances: Vec::new(),
            zs: Vec::new(),
        }
    }
}

impl CircleRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads every circle in `draw_list` for this frame.
    pub fn prepare(&mut self, ctx: &RenderCtx<'_>, draw_list: &mut DrawList) {
        self.instances.clear();
        self.zs.clear();

        for item in draw_list.iter_in_paint_order() {
            let DrawCmd::Circle(cmd) = &item.cmd else { continue };
            if cmd.radius <= 0.0 || !cmd.radius.is_finite() || !cmd.center.is_finite() {
                continue;
            }
            let color = match &cmd.paint {
                Paint::Solid(c) => *c,
                Paint::LinearGradient(g) => g.from,
            };
            self.instances.push(CircleInstance {
                center: [cmd.center.x, cmd.center.y],
                radius: cmd.radius,
                _pad: 0.0,
                color: color.to_array(),
            });
            self.zs.push(item.key.z);
        }

        self.batch.ensure(ctx, QuadPipelineDesc {
            label: "flipit circle pipeline",
            shader_src: include_str!("shaders/circle.wgsl"),
            instance_layout: CircleInstance::layout(),
            extra_entries: &[],
        });

        if self.bind_group_generation != self.batch.generation() || self.bind_group.is_none() {
            self.bind_group = viewport_bind_group(ctx, &self.batch, "flipit circle bind group");
            self.bind_group_generation = self.batch.generation();
        }

        self.batch.upload(ctx, &self.instances, self.zs.iter().copied());
    }

    /// Draws the circles prepared for layer `z`.
    pub fn draw_layer(&self, target: &mut RenderTarget<'_>, z: ZIndex) {
        self.batch.draw_layer(target, z, self.bind_group.as_ref());
    }
}

/// Instance data layout (32 bytes):
///
///  offset  0  center  [f32; 2]   loc 1
///  offset  8  radius  f32        loc 2
///  offset 12  _pad    f32
///  offset 16  color   [f32; 4]   loc 3
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct CircleInstance {
    center: [f32; 2],
    radius: f32,
    _pad: f32,
    color: [f32; 4],
}

impl CircleInstance {
    const ATTRS: [wgpu::VertexAttribute; 3] = [
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 0,
            shader_location: 1,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32,
            offset: 8,
            shader_location: 2,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x4,
            offset: 16,
            shader_location: 3,
        },
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<CircleInstance>() as u64,
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
        assert_eq!(std::mem::size_of::<CircleInstance>(), 32);
        assert_eq!(CircleInstance::layout().array_stride, 32);
    }
}
