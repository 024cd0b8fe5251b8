use anyhow::{Context, Result};
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::window::Window;

/// GPU settings for the clock window.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Pick an sRGB surface format when the surface offers one.
    pub prefer_srgb: bool,

    /// Swap behavior. FIFO is supported everywhere.
    pub present_mode: wgpu::PresentMode,

    /// Adapter preference. The clock redraws at most once a second.
    pub power_preference: wgpu::PowerPreference,

    /// Retry with a software adapter when no hardware adapter can drive the
    /// surface (remote sessions, headless lock screens).
    pub allow_software: bool,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            power_preference: wgpu::PowerPreference::LowPower,
            allow_software: true,
        }
    }
}

/// wgpu device, queue and the window's configured surface.
///
/// The surface borrows the window for `'w`; the runtime keeps both in one
/// self-referencing entry so the window always outlives this value.
pub struct Gpu<'w> {
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    /// Last size reported by the window, physical pixels. May be zero while
    /// minimized; `config` keeps the last non-zero size.
    size: PhysicalSize<u32>,
}

/// One acquired surface texture plus the encoder recording into it.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

/// What the frame loop should do after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; draw again on the next redraw.
    Reconfigured,
    SkipFrame,
    /// Out of memory; stop the runtime.
    Fatal,
}

impl<'w> Gpu<'w> {
    /// Creates the device and configures a surface for `window`.
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = match request_adapter(&instance, &surface, &init, false).await {
            Ok(adapter) => adapter,
            Err(err) if init.allow_software => {
                log::warn!("no hardware adapter ({err}); trying a software adapter");
                request_adapter(&instance, &surface, &init, true)
                    .await
                    .context("failed to find any GPU adapter, software included")?
            }
            Err(err) => return Err(err).context("failed to find a suitable GPU adapter"),
        };

        let info = adapter.get_info();
        log::info!("gpu adapter: {} ({:?}, {:?})", info.name, info.backend, info.device_type);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("flipit device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device")?;

        let caps = surface.get_capabilities(&adapter);
        let format = choose_format(&caps.formats, init.prefer_srgb)
            .context("surface reports no texture formats")?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: init.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::debug!("surface {format:?} {}x{}", config.width, config.height);

        Ok(Gpu {
            surface,
            device,
            queue,
            config,
            size,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Follows a window resize. Zero sizes are recorded but not configured.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.size = new_size;
        if !has_area(new_size) {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    pub fn begin_frame(&self) -> std::result::Result<GpuFrame, SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("flipit frame encoder"),
            });

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    /// Submits the frame's commands and presents it.
    pub fn submit(&self, frame: GpuFrame) {
        let GpuFrame { surface_texture, view, encoder } = frame;
        self.queue.submit(std::iter::once(encoder.finish()));
        drop(view);
        surface_texture.present();
    }

    pub fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        surface_error_action(&err, || {
            if has_area(self.size) {
                self.surface.configure(&self.device, &self.config);
            }
        })
    }
}

async fn request_adapter(
    instance: &wgpu::Instance,
    surface: &wgpu::Surface<'_>,
    init: &GpuInit,
    software: bool,
) -> Result<wgpu::Adapter> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: init.power_preference,
            compatible_surface: Some(surface),
            force_fallback_adapter: software,
        })
        .await?;
    Ok(adapter)
}

fn has_area(size: PhysicalSize<u32>) -> bool {
    size.width > 0 && size.height > 0
}

/// Maps `err` to an action, calling `reconfigure` for lost/outdated surfaces.
fn surface_error_action(err: &SurfaceError, reconfigure: impl FnOnce()) -> SurfaceErrorAction {
    match err {
        SurfaceError::Lost | SurfaceError::Outdated => {
            reconfigure();
            SurfaceErrorAction::Reconfigured
        }
        SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        SurfaceError::Timeout | SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}

fn choose_format(formats: &[wgpu::TextureFormat], prefer_srgb: bool) -> Option<wgpu::TextureFormat> {
    let srgb = formats.iter().copied().find(|f| f.is_srgb());
    match srgb {
        Some(f) if prefer_srgb => Some(f),
        _ => formats.first().copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat;

    #[test]
    fn srgb_format_preferred_when_offered() {
        let formats = [TextureFormat::Bgra8Unorm, TextureFormat::Bgra8UnormSrgb];
        assert_eq!(choose_format(&formats, true), Some(TextureFormat::Bgra8UnormSrgb));
        assert_eq!(choose_format(&formats, false), Some(TextureFormat::Bgra8Unorm));
    }

    #[test]
    fn first_format_used_without_srgb() {
        assert_eq!(
            choose_format(&[TextureFormat::Rgba8Unorm], true),
            Some(TextureFormat::Rgba8Unorm)
        );
        assert_eq!(choose_format(&[], true), None);
    }

    #[test]
    fn lost_surfaces_reconfigure() {
        let mut reconfigured = false;
        let action = surface_error_action(&SurfaceError::Lost, || reconfigured = true);
        assert_eq!(action, SurfaceErrorAction::Reconfigured);
        assert!(reconfigured);
    }

    #[test]
    fn timeouts_skip_and_oom_is_fatal() {
        let mut reconfigured = false;
        assert_eq!(
            surface_error_action(&SurfaceError::Timeout, || reconfigured = true),
            SurfaceErrorAction::SkipFrame
        );
        assert_eq!(
            surface_error_action(&SurfaceError::OutOfMemory, || reconfigured = true),
            SurfaceErrorAction::Fatal
        );
        assert!(!reconfigured);
    }

    #[test]
    fn zero_sizes_have_no_area() {
        assert!(!has_area(PhysicalSize::new(0, 600)));
        assert!(has_area(PhysicalSize::new(1, 1)));
    }
}
