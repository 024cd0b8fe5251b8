use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use fontdue::layout::{
    CoordinateSystem, GlyphRasterConfig, HorizontalAlign, Layout, LayoutSettings, TextStyle,
    VerticalAlign,
};

use crate::render::{RenderCtx, RenderTarget};
use crate::scene::{DrawCmd, DrawList, TextAnchor, ZIndex};
use crate::text::FontSystem;

use super::common::{QuadBatch, QuadPipelineDesc};

// ── atlas constants ────────────────────────────────────────────────────────

const ATLAS_SIZE: u32 = 2048;
const GLYPH_PADDING: u32 = 1; // pixels between glyphs in the atlas

/// Largest em size glyphs are rasterized at. Bigger text is drawn from this
/// raster, scaled up. A glyph fits in an em square, so at this size a
/// 5 × 5 grid of them fits in the atlas.
const MAX_RASTER_PX: f32 = 400.0;

const ATLAS_ENTRIES: [wgpu::BindGroupLayoutEntry; 2] = [
    wgpu::BindGroupLayoutEntry {
        binding: 1,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    },
    wgpu::BindGroupLayoutEntry {
        binding: 2,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    },
];

struct CachedGlyph {
    uv_min: [f32; 2],
    uv_max: [f32; 2],
}

/// Shelf packer over the square glyph atlas.
#[derive(Debug)]
struct ShelfPacker {
    cursor_x: u32,
    cursor_y: u32,
    row_height: u32,
}

impl Default for ShelfPacker {
    fn default() -> Self {
        Self {
            cursor_x: GLYPH_PADDING,
            cursor_y: GLYPH_PADDING,
            row_height: 0,
        }
    }
}

impl ShelfPacker {
    /// Reserves a `w × h` slot, returning its top-left corner, or `None` when
    /// the atlas has no room left for it.
    fn place(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if w + 2 * GLYPH_PADDING > ATLAS_SIZE {
            return None;
        }

        let (mut x, mut y, mut row) = (self.cursor_x, self.cursor_y, self.row_height);
        if x + w + GLYPH_PADDING > ATLAS_SIZE {
            y += row + GLYPH_PADDING;
            x = GLYPH_PADDING;
            row = 0;
        }
        if y + h + GLYPH_PADDING > ATLAS_SIZE {
            return None;
        }

        self.cursor_x = x + w + GLYPH_PADDING;
        self.cursor_y = y;
        self.row_height = row.max(h);
        Some((x, y))
    }
}

/// Raster pixels per logical pixel for text of `size` logical px on a
/// display with `scale_factor`.
///
/// Text is rasterized at its physical size, capped at [`MAX_RASTER_PX`].
fn raster_scale(size: f32, scale_factor: f32) -> f32 {
    let physical = size * scale_factor;
    if physical > MAX_RASTER_PX {
        MAX_RASTER_PX / size
    } else {
        scale_factor
    }
}

/// Builds fontdue layout settings for an anchor, in raster pixels
/// (`k` raster px per logical px).
fn layout_settings(anchor: TextAnchor, k: f32) -> LayoutSettings {
    match anchor {
        TextAnchor::TopLeft(p) => LayoutSettings {
            x: p.x * k,
            y: p.y * k,
            ..LayoutSettings::default()
        },
        TextAnchor::Centered(r) => LayoutSettings {
            x: r.origin.x * k,
            y: r.origin.y * k,
            max_width: Some(r.size.x.max(0.0) * k),
            max_height: Some(r.size.y.max(0.0) * k),
            horizontal_align: HorizontalAlign::Center,
            vertical_align: VerticalAlign::Middle,
            ..LayoutSettings::default()
        },
    }
}

/// Renderer for `DrawCmd::Text`.
///
/// Maintains a 2048 × 2048 R8Unorm glyph atlas. Glyphs are rasterized on
/// first use via fontdue at the display's physical size and cached. When the
/// atlas fills up it is emptied and this frame's glyphs are packed again.
///
/// The cache key is `fontdue::layout::GlyphRasterConfig` (font, glyph, pixel
/// size), so the same digit at the same size is rasterized once no matter how
/// many frames draw it.
pub struct TextRenderer {
    batch: QuadBatch,

    bind_group: Option<wgpu::BindGroup>,
    bind_group_key: Option<(u64, u64)>,
    sampler: Option<wgpu::Sampler>,

    atlas_texture: Option<wgpu::Texture>,
    atlas_view: Option<wgpu::TextureView>,
    atlas_generation: u64,
    packer: ShelfPacker,

    glyph_cache: HashMap<GlyphRasterConfig, CachedGlyph>,

    instances: Vec<GlyphInstance>,
    zs: Vec<ZIndex>,

    layout: Layout<()>,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self {
            batch: QuadBatch::new("flipit text"),
            bind_group: None,
            bind_group_key: None,
            sampler: None,
            atlas_texture: None,
            atlas_view: None,
            atlas_generation: 0,
            packer: ShelfPacker::default(),
            glyph_cache: HashMap::new(),
            instances: Vec::new(),
            zs: Vec::new(),
            layout: Layout::new(CoordinateSystem::PositiveYDown),
        }
    }
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lays out every text command in `draw_list`, rasterizes glyphs not yet
    /// in the atlas, and uploads this frame's glyph quads.
    pub fn prepare(
        &mut self,
        ctx: &RenderCtx<'_>,
        draw_list: &mut DrawList,
        font_system: &FontSystem,
    ) {
        self.ensure_atlas(ctx);
        self.ensure_sampler(ctx);

        if !self.collect_glyphs(ctx, draw_list, font_system) {
            log::debug!("TextRenderer: glyph atlas full, repacking");
            self.packer = ShelfPacker::default();
            self.glyph_cache.clear();
            if !self.collect_glyphs(ctx, draw_list, font_system) {
                log::warn!("TextRenderer: frame needs more glyphs than the atlas holds");
            }
        }

        self.batch.ensure(ctx, QuadPipelineDesc {
            label: "flipit text pipeline",
            shader_src: include_str!("shaders/text.wgsl"),
            instance_layout: GlyphInstance::layout(),
            extra_entries: &ATLAS_ENTRIES,
        });
        self.ensure_bind_group(ctx);

        self.batch.upload(ctx, &self.instances, self.zs.iter().copied());
    }

    /// Lays out and rasterizes every text command into `instances`. Returns
    /// `false` if some glyph found no room in the atlas.
    fn collect_glyphs(
        &mut self,
        ctx: &RenderCtx<'_>,
        draw_list: &mut DrawList,
        font_system: &FontSystem,
    ) -> bool {
        self.instances.clear();
        self.zs.clear();
        let mut complete = true;

        for item in draw_list.iter_in_paint_order() {
            let DrawCmd::Text(cmd) = &item.cmd else { continue };
            if cmd.text.is_empty() || cmd.size <= 0.0 || !cmd.size.is_finite() {
                continue;
            }
            let Some(font) = font_system.get(cmd.font) else {
                log::warn!("TextRenderer: unknown FontId {:?}, skipping", cmd.font);
                continue;
            };

            let color = cmd.color.to_array();
            let k = raster_scale(cmd.size, ctx.scale_factor);

            self.layout.reset(&layout_settings(cmd.anchor, k));
            self.layout.append(&[font], &TextStyle::new(&cmd.text, cmd.size * k, 0));

            // Snapshot positions so the borrow on `self.layout` ends before
            // glyph upload needs `&mut self`.
            let glyphs: Vec<(GlyphRasterConfig, f32, f32, usize, usize)> = self
                .layout
                .glyphs()
                .iter()
                .filter(|g| g.char_data.rasterize() && g.width > 0 && g.height > 0)
                .map(|g| (g.key, g.x, g.y, g.width, g.height))
                .collect();

            for (key, x, y, w, h) in glyphs {
                if !self.glyph_cache.contains_key(&key) {
                    let (metrics, bitmap) = font.rasterize_config(key);
                    if metrics.width == 0 || metrics.height == 0 {
                        continue;
                    }
                    match self.upload_glyph(ctx, &bitmap, metrics.width as u32, metrics.height as u32)
                    {
                        Some(entry) => {
                            self.glyph_cache.insert(key, entry);
                        }
                        None => {
                            complete = false;
                            continue;
                        }
                    }
                }

                let Some(cached) = self.glyph_cache.get(&key) else { continue };

                self.instances.push(GlyphInstance {
                    dst_min: [x / k, y / k],
                    dst_max: [(x + w as f32) / k, (y + h as f32) / k],
                    uv_min: cached.uv_min,
                    uv_max: cached.uv_max,
                    color,
                });
                self.zs.push(item.key.z);
            }
        }

        complete
    }

    /// Draws the glyphs prepared for layer `z`.
    pub fn draw_layer(&self, target: &mut RenderTarget<'_>, z: ZIndex) {
        self.batch.draw_layer(target, z, self.bind_group.as_ref());
    }

    fn upload_glyph(
        &mut self,
        ctx: &RenderCtx<'_>,
        bitmap: &[u8],
        w: u32,
        h: u32,
    ) -> Option<CachedGlyph> {
        let atlas = self.atlas_texture.as_ref()?;
        let (gx, gy) = self.packer.place(w, h)?;

        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: atlas,
                mip_level: 0,
                origin: wgpu::Origin3d { x: gx, y: gy, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            bitmap,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(w),
                rows_per_image: Some(h),
            },
            wgpu::Extent3d { width: w, height: h, depth_or_array_layers: 1 },
        );

        let atlas_f = ATLAS_SIZE as f32;
        Some(CachedGlyph {
            uv_min: [gx as f32 / atlas_f, gy as f32 / atlas_f],
            uv_max: [(gx + w) as f32 / atlas_f, (gy + h) as f32 / atlas_f],
        })
    }

    fn ensure_atlas(&mut self, ctx: &RenderCtx<'_>) {
        if self.atlas_texture.is_some() {
            return;
        }

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("flipit text atlas"),
            size: wgpu::Extent3d {
                width: ATLAS_SIZE,
                height: ATLAS_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.atlas_view = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        self.atlas_texture = Some(texture);
        self.atlas_generation += 1;
        self.packer = ShelfPacker::default();
        self.glyph_cache.clear();
    }

    fn ensure_sampler(&mut self, ctx: &RenderCtx<'_>) {
        if self.sampler.is_some() {
            return;
        }
        self.sampler = Some(ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("flipit text sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        }));
    }

    fn ensure_bind_group(&mut self, ctx: &RenderCtx<'_>) {
        let key = (self.batch.generation(), self.atlas_generation);
        if self.bind_group_key == Some(key) && self.bind_group.is_some() {
            return;
        }

        let Some(layout) = self.batch.bind_group_layout() else { return };
        let Some(ubo) = self.batch.viewport_ubo() else { return };
        let Some(atlas_view) = self.atlas_view.as_ref() else { return };
        let Some(sampler) = self.sampler.as_ref() else { return };

        self.bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("flipit text bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(atlas_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        }));
        self.bind_group_key = Some(key);
    }
}

// ── GPU types ─────────────────────────────────────────────────────────────

/// Instance data layout (48 bytes):
///
///  offset  0  dst_min  [f32; 2]   loc 1
///  offset  8  dst_max  [f32; 2]   loc 2
///  offset 16  uv_min   [f32; 2]   loc 3
///  offset 24  uv_max   [f32; 2]   loc 4
///  offset 32  color    [f32; 4]   loc 5
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct GlyphInstance {
    dst_min: [f32; 2],
    dst_max: [f32; 2],
    uv_min: [f32; 2],
    uv_max: [f32; 2],
    color: [f32; 4],
}

impl GlyphInstance {
    const ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        1 => Float32x2, // dst_min
        2 => Float32x2, // dst_max
        3 => Float32x2, // uv_min
        4 => Float32x2, // uv_max
        5 => Float32x4  // color
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GlyphInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}
