use anyhow::{Context, Result};
use ouroboros::self_referencing;
use std::time::{Duration, Instant};

use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use crate::core::{App as CoreApp, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::input::platform::translate_window_event;
use crate::input::InputState;
use crate::time::Ticker;

/// How the single runtime window is placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowMode {
    /// Borderless fullscreen on the current monitor.
    Fullscreen,
    /// Undecorated window at an explicit position and size, in physical pixels.
    Bounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    /// Child window of the native window `parent`. On Win32 it is created
    /// with the child style; the application sizes it to the host in
    /// `on_load`.
    Embedded { parent: isize },
}

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub mode: WindowMode,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "flipit".to_string(),
            mode: WindowMode::Fullscreen,
        }
    }
}

impl RuntimeConfig {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_mode(mut self, mode: WindowMode) -> Self {
        self.mode = mode;
        self
    }

    fn window_attributes(&self) -> WindowAttributes {
        let attrs = Window::default_attributes().with_title(self.title.clone());
        match self.mode {
            WindowMode::Fullscreen => attrs
                .with_decorations(false)
                .with_fullscreen(Some(Fullscreen::Borderless(None))),
            WindowMode::Bounds { x, y, width, height } => attrs
                .with_decorations(false)
                .with_position(PhysicalPosition::new(x, y))
                .with_inner_size(PhysicalSize::new(width.max(1), height.max(1))),
            WindowMode::Embedded { parent } => with_parent(
                attrs
                    .with_decorations(false)
                    .with_inner_size(PhysicalSize::new(1u32, 1u32)),
                parent,
            ),
        }
    }
}

#[cfg(windows)]
fn with_parent(attrs: WindowAttributes, parent: isize) -> WindowAttributes {
    use raw_window_handle::{RawWindowHandle, Win32WindowHandle};
    use std::num::NonZeroIsize;

    let Some(hwnd) = NonZeroIsize::new(parent) else {
        return attrs;
    };
    let handle = RawWindowHandle::Win32(Win32WindowHandle::new(hwnd));
    // SAFETY: the host passes a live window it owns and keeps it open for
    // as long as the preview runs.
    unsafe { attrs.with_parent_window(Some(handle)) }
}

// Other backends reject Win32 parents; embedding fails later in `on_load`.
#[cfg(not(windows))]
fn with_parent(attrs: WindowAttributes, _parent: isize) -> WindowAttributes {
    attrs
}

/// Runtime context passed to the application.
///
/// Commands are buffered and applied after the current callback returns.
#[derive(Default)]
pub struct RuntimeCtx {
    commands: Vec<Command>,
}

impl RuntimeCtx {
    /// Asks for one `on_frame` call. Multiple requests before the next
    /// frame collapse into one.
    pub fn request_redraw(&mut self) {
        self.commands.push(Command::RequestRedraw);
    }

    /// (Re)starts the ticker; `on_timer` fires every `interval` from now.
    pub fn start_timer(&mut self, interval: Duration) {
        self.commands.push(Command::StartTimer(interval));
    }

    pub fn stop_timer(&mut self) {
        self.commands.push(Command::StopTimer);
    }

    pub fn exit(&mut self) {
        self.commands.push(Command::Exit);
    }

    /// Whether a redraw was requested during this callback.
    pub fn redraw_requested(&self) -> bool {
        self.commands.contains(&Command::RequestRedraw)
    }

    /// Interval of the timer as left by this callback's start/stop requests;
    /// `None` if the last one stopped it or none was made.
    pub fn timer_interval(&self) -> Option<Duration> {
        self.commands.iter().rev().find_map(|c| match c {
            Command::StartTimer(interval) => Some(Some(*interval)),
            Command::StopTimer => Some(None),
            _ => None,
        })
        .flatten()
    }

    /// Whether exit was requested during this callback.
    pub fn exit_requested(&self) -> bool {
        self.commands.contains(&Command::Exit)
    }
}

#[derive(Debug, PartialEq)]
enum Command {
    RequestRedraw,
    StartTimer(Duration),
    StopTimer,
    Exit,
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window described by `config` and drives `app` until it exits.
    ///
    /// Errors from window/GPU creation and from `App::on_load` end the loop
    /// and are returned here.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    input_state: InputState,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    window: Option<WindowEntry>,
    ticker: Ticker,
    exit_requested: bool,
    error: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            window: None,
            ticker: Ticker::default(),
            exit_requested: false,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error = Some(err);
        self.exit_requested = true;
        event_loop.exit();
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = event_loop
            .create_window(self.config.window_attributes())
            .context("failed to create window")?;

        log::info!("window created ({:?})", self.config.mode);

        let gpu_init = self.gpu_init.clone();

        let entry = WindowEntryTryBuilder {
            input_state: InputState::default(),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed for window")?;

        self.window = Some(entry);
        Ok(())
    }

    fn load_app(&mut self) -> Result<RuntimeCtx> {
        let mut runtime = RuntimeCtx::default();

        // Split borrows to avoid `self` capture inside `ouroboros` closures.
        let (app, mode, window) = (&mut self.app, &self.config.mode, &self.window);
        if let Some(entry) = window {
            entry.with_window(|w| {
                let ctx = WindowCtx { id: w.id(), window: w, mode };
                app.on_load(&ctx, &mut runtime)
            })?;
        }

        Ok(runtime)
    }

    fn apply_commands(&mut self, event_loop: &ActiveEventLoop, mut ctx: RuntimeCtx) {
        for cmd in ctx.commands.drain(..) {
            match cmd {
                Command::RequestRedraw => {
                    if let Some(entry) = self.window.as_ref() {
                        entry.with_window(|w| w.request_redraw());
                    }
                }
                Command::StartTimer(interval) => {
                    self.ticker.set_interval(interval);
                    self.ticker.start(Instant::now());
                    log::debug!("timer started: every {:?}", self.ticker.interval());
                }
                Command::StopTimer => self.ticker.stop(),
                Command::Exit => self.exit_requested = true,
            }
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let mut runtime_ctx = RuntimeCtx::default();
        let mut app_control = AppControl::Continue;

        let (app, mode, window) = (&mut self.app, &self.config.mode, &mut self.window);
        if let Some(entry) = window {
            entry.with_mut(|fields| {
                let mut ctx = FrameCtx {
                    window: WindowCtx {
                        id: fields.window.id(),
                        window: fields.window,
                        mode,
                    },
                    gpu: fields.gpu,
                    runtime: &mut runtime_ctx,
                };

                app_control = app.on_frame(&mut ctx);
            });
        }

        if app_control == AppControl::Exit {
            runtime_ctx.exit();
        }

        self.apply_commands(event_loop, runtime_ctx);
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.exit_requested {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            self.fail(event_loop, e);
            return;
        }

        match self.load_app() {
            Ok(runtime) => self.apply_commands(event_loop, runtime),
            Err(e) => self.fail(event_loop, e.context("application failed to load")),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if self.ticker.poll(Instant::now()) {
            let mut runtime = RuntimeCtx::default();
            self.app.on_timer(&mut runtime);
            self.apply_commands(event_loop, runtime);
        }

        // Invalidation-based redraw: sleep until the next tick unless an
        // event or a redraw request arrives first.
        match self.ticker.deadline() {
            Some(deadline) => event_loop.set_control_flow(ControlFlow::WaitUntil(deadline)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let Some(entry) = self.window.as_mut() else {
            return;
        };

        let input = entry.with_mut(|fields| {
            let ev = translate_window_event(fields.window, fields.input_state, &event)?;
            fields.input_state.apply_event(&ev);
            Some(ev)
        });

        if let Some(ev) = input {
            let mut runtime = RuntimeCtx::default();
            self.app.on_input(&ev, &mut runtime);
            self.apply_commands(event_loop, runtime);
            if self.exit_requested {
                return;
            }
        }

        match &event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                log::info!("window closed");
                self.exit_requested = true;
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if let Some(entry) = self.window.as_mut() {
                    entry.with_gpu_mut(|gpu| gpu.resize(*new_size));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.window.as_mut() {
                    let new_size = entry.with_window(|w| w.inner_size());
                    entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_fullscreen() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.mode, WindowMode::Fullscreen);
        assert_eq!(cfg.title, "flipit");
    }

    #[test]
    fn builders_replace_fields() {
        let cfg = RuntimeConfig::default()
            .with_title("clock")
            .with_mode(WindowMode::Embedded { parent: 42 });
        assert_eq!(cfg.title, "clock");
        assert_eq!(cfg.mode, WindowMode::Embedded { parent: 42 });
    }

    #[test]
    fn every_mode_is_undecorated() {
        let modes = [
            WindowMode::Fullscreen,
            WindowMode::Bounds { x: 10, y: 20, width: 640, height: 480 },
            WindowMode::Embedded { parent: 1 },
        ];
        for mode in modes {
            let attrs = RuntimeConfig::default().with_mode(mode).window_attributes();
            assert!(!attrs.decorations);
            assert_eq!(attrs.title, "flipit");
        }
    }

    #[cfg(windows)]
    #[test]
    fn embedded_window_is_created_as_child_of_host() {
        let attrs = RuntimeConfig::default()
            .with_mode(WindowMode::Embedded { parent: 0x1234 })
            .window_attributes();
        assert!(matches!(
            attrs.parent_window(),
            Some(raw_window_handle::RawWindowHandle::Win32(h)) if h.hwnd.get() == 0x1234
        ));
    }

    #[test]
    fn timer_interval_follows_last_request() {
        let mut ctx = RuntimeCtx::default();
        assert_eq!(ctx.timer_interval(), None);
        ctx.start_timer(Duration::from_millis(1000));
        assert_eq!(ctx.timer_interval(), Some(Duration::from_secs(1)));
        ctx.request_redraw();
        assert_eq!(ctx.timer_interval(), Some(Duration::from_secs(1)));
        ctx.stop_timer();
        assert_eq!(ctx.timer_interval(), None);
    }

    #[test]
    fn runtime_ctx_buffers_commands_in_order() {
        let mut ctx = RuntimeCtx::default();
        ctx.request_redraw();
        ctx.start_timer(Duration::from_secs(1));
        ctx.stop_timer();
        ctx.exit();
        assert_eq!(
            ctx.commands,
            vec![
                Command::RequestRedraw,
                Command::StartTimer(Duration::from_secs(1)),
                Command::StopTimer,
                Command::Exit,
            ]
        );
        assert!(ctx.redraw_requested());
        assert!(ctx.exit_requested());
        assert!(!RuntimeCtx::default().redraw_requested());
    }
}
