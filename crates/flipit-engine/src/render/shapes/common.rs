//! GPU plumbing shared by the shape renderers.

use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::paint::Paint;
use crate::render::{RenderCtx, RenderTarget};
use crate::scene::ZIndex;

// ── blend ─────────────────────────────────────────────────────────────────

fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

// ── viewport uniform ──────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ViewportUniform {
    viewport: [f32; 2],
    _pad: [f32; 2], // 16-byte alignment
}

fn viewport_ubo_min_binding_size() -> Option<wgpu::BufferSize> {
    wgpu::BufferSize::new(std::mem::size_of::<ViewportUniform>() as u64)
}

// ── quad vertex ───────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct QuadVertex {
    pos: [f32; 2], // 0..1
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { pos: [0.0, 0.0] },
    QuadVertex { pos: [1.0, 0.0] },
    QuadVertex { pos: [1.0, 1.0] },
    QuadVertex { pos: [0.0, 1.0] },
];

const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

// ── paint resolution ──────────────────────────────────────────────────────

/// Converts a `Paint` to `(color0, color1, grad_p0, grad_p1)` for gradient-capable shaders.
///
/// Solid fills produce identical colors and a zero-length gradient axis, which
/// the shaders treat as a uniform `color0` fill.
pub(super) fn resolve_paint(paint: &Paint) -> ([f32; 4], [f32; 4], [f32; 2], [f32; 2]) {
    match paint {
        Paint::Solid(c) => {
            let col = c.to_array();
            (col, col, [0.0, 0.0], [0.0, 0.0])
        }
        Paint::LinearGradient(g) if !g.is_valid() => {
            let col = g.from.to_array();
            (col, col, [0.0, 0.0], [0.0, 0.0])
        }
        Paint::LinearGradient(g) => (
            g.from.to_array(),
            g.to.to_array(),
            [g.start.x, g.start.y],
            [g.end.x, g.end.y],
        ),
    }
}

// ── layer runs ────────────────────────────────────────────────────────────

/// Instance ranges per z layer, built from instances recorded in paint order.
#[derive(Debug, Default)]
pub(super) struct LayerRuns {
    runs: Vec<(ZIndex, Range<u32>)>,
}

impl LayerRuns {
    pub(super) fn from_paint_order(zs: impl IntoIterator<Item = ZIndex>) -> Self {
        let mut runs: Vec<(ZIndex, Range<u32>)> = Vec::new();
        for (i, z) in zs.into_iter().enumerate() {
            let i = i as u32;
            match runs.last_mut() {
                Some((last_z, range)) if *last_z == z => range.end = i + 1,
                _ => runs.push((z, i..i + 1)),
            }
        }
        Self { runs }
    }

    pub(super) fn get(&self, z: ZIndex) -> Option<Range<u32>> {
        self.runs
            .iter()
            .find(|(rz, _)| *rz == z)
            .map(|(_, r)| r.clone())
    }

    pub(super) fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

// ── instanced quad batch ──────────────────────────────────────────────────

/// Pipeline description for one instanced-quad shape type.
pub(super) struct QuadPipelineDesc<'a> {
    pub label: &'static str,
    pub shader_src: &'static str,
    pub instance_layout: wgpu::VertexBufferLayout<'a>,
    /// Bindings after the viewport uniform at binding 0.
    pub extra_entries: &'a [wgpu::BindGroupLayoutEntry],
}

/// The GPU objects every shape renderer needs: a pipeline drawing one unit
/// quad per instance, the viewport uniform, and a growable instance buffer.
///
/// Everything is created lazily on first use and rebuilt when the surface
/// format changes. `generation` bumps on rebuild so owners know to recreate
/// bind groups.
pub(super) struct QuadBatch {
    label: &'static str,

    format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    viewport_ubo: Option<wgpu::Buffer>,
    generation: u64,

    quad_vbo: Option<wgpu::Buffer>,
    quad_ibo: Option<wgpu::Buffer>,

    instance_vbo: Option<wgpu::Buffer>,
    instance_capacity: usize,

    runs: LayerRuns,
}

impl QuadBatch {
    pub(super) fn new(label: &'static str) -> Self {
        Self {
            label,
            format: None,
            pipeline: None,
            bind_group_layout: None,
            viewport_ubo: None,
            generation: 0,
            quad_vbo: None,
            quad_ibo: None,
            instance_vbo: None,
            instance_capacity: 0,
            runs: LayerRuns::default(),
        }
    }

    #[inline]
    pub(super) fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub(super) fn bind_group_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.bind_group_layout.as_ref()
    }

    #[inline]
    pub(super) fn viewport_ubo(&self) -> Option<&wgpu::Buffer> {
        self.viewport_ubo.as_ref()
    }

    /// Builds the pipeline (and the buffers it needs) if missing or stale.
    pub(super) fn ensure(&mut self, ctx: &RenderCtx<'_>, desc: QuadPipelineDesc<'_>) {
        if self.quad_vbo.is_none() || self.quad_ibo.is_none() {
            self.quad_vbo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(self.label),
                contents: bytemuck::cast_slice(&QUAD_VERTICES),
                usage: wgpu::BufferUsages::VERTEX,
            }));
            self.quad_ibo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(self.label),
                contents: bytemuck::cast_slice(&QUAD_INDICES),
                usage: wgpu::BufferUsages::INDEX,
            }));
        }

        if self.format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(desc.shader_src.into()),
        });

        let mut entries = vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: viewport_ubo_min_binding_size(),
            },
            count: None,
        }];
        entries.extend_from_slice(desc.extra_entries);

        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(desc.label),
                    entries: &entries,
                });

        let pipeline_layout =
            ctx.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some(desc.label),
                    bind_group_layouts: &[&bind_group_layout],
                    immediate_size: 0,
                });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.label),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout(), desc.instance_layout],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(premul_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let viewport_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(self.label),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        self.format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);
        self.viewport_ubo = Some(viewport_ubo);
        self.generation = self.generation.wrapping_add(1);
    }

    /// Uploads this frame's instances and the viewport, and records layer runs.
    ///
    /// `zs` must yield one z per instance, in the same (paint) order.
    pub(super) fn upload<T: Pod>(
        &mut self,
        ctx: &RenderCtx<'_>,
        instances: &[T],
        zs: impl IntoIterator<Item = ZIndex>,
    ) {
        self.runs = LayerRuns::from_paint_order(zs);
        if instances.is_empty() {
            return;
        }

        if let Some(ubo) = self.viewport_ubo.as_ref() {
            let u = ViewportUniform {
                viewport: [ctx.viewport.width.max(1.0), ctx.viewport.height.max(1.0)],
                _pad: [0.0; 2],
            };
            ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&u));
        }

        if instances.len() > self.instance_capacity || self.instance_vbo.is_none() {
            let new_cap = instances.len().next_power_of_two().max(64);
            self.instance_vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(self.label),
                size: (new_cap * std::mem::size_of::<T>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.instance_capacity = new_cap;
        }

        if let Some(vbo) = self.instance_vbo.as_ref() {
            ctx.queue.write_buffer(vbo, 0, bytemuck::cast_slice(instances));
        }
    }

    /// Draws the instances recorded for layer `z`, if any.
    pub(super) fn draw_layer(
        &self,
        target: &mut RenderTarget<'_>,
        z: ZIndex,
        bind_group: Option<&wgpu::BindGroup>,
    ) {
        if self.runs.is_empty() {
            return;
        }
        let Some(range) = self.runs.get(z) else { return };
        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(bind_group) = bind_group else { return };
        let Some(quad_vbo) = self.quad_vbo.as_ref() else { return };
        let Some(quad_ibo) = self.quad_ibo.as_ref() else { return };
        let Some(instance_vbo) = self.instance_vbo.as_ref() else { return };

        let mut rpass = target.begin_load_pass(self.label);
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, quad_vbo.slice(..));
        rpass.set_vertex_buffer(1, instance_vbo.slice(..));
        rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..6, 0, range);
    }
}

/// Creates a bind group holding only the viewport uniform.
pub(super) fn viewport_bind_group(
    ctx: &RenderCtx<'_>,
    batch: &QuadBatch,
    label: &'static str,
) -> Option<wgpu::BindGroup> {
    let layout = batch.bind_group_layout()?;
    let ubo = batch.viewport_ubo()?;
    Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: ubo.as_entire_binding(),
        }],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Vec2;
    use crate::paint::{Color, LinearGradient};

    #[test]
    fn runs_group_consecutive_layers() {
        let zs = [0, 0, 1, 1, 1, 3].map(ZIndex);
        let runs = LayerRuns::from_paint_order(zs);
        assert_eq!(runs.get(ZIndex(0)), Some(0..2));
        assert_eq!(runs.get(ZIndex(1)), Some(2..5));
        assert_eq!(runs.get(ZIndex(3)), Some(5..6));
        assert_eq!(runs.get(ZIndex(2)), None);
    }

    #[test]
    fn no_instances_means_no_runs() {
        let runs = LayerRuns::from_paint_order(std::iter::empty());
        assert!(runs.is_empty());
    }

    #[test]
    fn solid_paint_has_degenerate_axis() {
        let (c0, c1, p0, p1) = resolve_paint(&Paint::Solid(Color::BLACK));
        assert_eq!(c0, c1);
        assert_eq!(p0, p1);
    }

    #[test]
    fn gradient_paint_keeps_endpoints() {
        let top = Color::gray(15);
        let bottom = Color::gray(10);
        let g = LinearGradient::new(Vec2::new(0.0, 5.0), Vec2::new(0.0, 95.0), top, bottom);
        let (c0, c1, p0, p1) = resolve_paint(&Paint::LinearGradient(g));
        assert_eq!(c0, top.to_array());
        assert_eq!(c1, bottom.to_array());
        assert_eq!(p0, [0.0, 5.0]);
        assert_eq!(p1, [0.0, 95.0]);
    }

    #[test]
    fn invalid_gradient_degrades_to_solid() {
        let g = LinearGradient::vertical(5.0, 5.0, Color::gray(15), Color::gray(10));
        let (c0, c1, p0, p1) = resolve_paint(&Paint::LinearGradient(g));
        assert_eq!(c0, c1);
        assert_eq!(p0, p1);
    }
}
