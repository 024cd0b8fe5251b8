use std::time::Duration;

use anyhow::{Context, Result};

use flipit_engine::coords::Viewport;
use flipit_engine::core::{App, AppControl, FrameCtx, WindowCtx};
use flipit_engine::device::GpuInit;
use flipit_engine::input::InputEvent;
use flipit_engine::paint::Color;
use flipit_engine::render::SceneRenderer;
use flipit_engine::scene::DrawList;
use flipit_engine::text::{FontId, FontSystem};
use flipit_engine::window::{Runtime, RuntimeConfig, RuntimeCtx};

use crate::clock::{SystemClock, WallClock};
use crate::config::ClockConfig;
use crate::embed::{self, EmbedError};
use crate::exit::ExitPolicy;
use crate::face::ClockFace;
use crate::mode::ClockMode;

/// Interval between clock ticks.
pub const TICK_INTERVAL: Duration = Duration::from_millis(1000);

const WINDOW_TITLE: &str = "FlipIt";

/// Loads the configured font and runs the clock in `mode` until the user
/// ends it (or, in preview, until the host closes the window).
pub fn run(mode: ClockMode, config: ClockConfig) -> Result<()> {
    let mut fonts = FontSystem::new();
    let bytes = config.load_font_bytes()?;
    let font = fonts.load_font(&bytes).context("failed to parse clock font")?;

    log::info!("starting in {mode:?} mode (seconds: {})", config.show_seconds);

    let runtime = RuntimeConfig::default()
        .with_title(WINDOW_TITLE)
        .with_mode(mode.window_mode());
    Runtime::run(runtime, GpuInit::default(), FlipItApp::new(mode, config, fonts, font))
}

/// The screensaver application driven by the engine runtime.
pub struct FlipItApp<C: WallClock = SystemClock> {
    mode: ClockMode,
    config: ClockConfig,
    clock: C,

    fonts: FontSystem,
    font: FontId,

    /// `None` for bounds and preview modes until the window is loaded.
    face: Option<ClockFace>,
    exit: ExitPolicy,

    draw_list: DrawList,
    renderer: SceneRenderer,
}

impl FlipItApp<SystemClock> {
    pub fn new(mode: ClockMode, config: ClockConfig, fonts: FontSystem, font: FontId) -> Self {
        Self::with_clock(mode, config, fonts, font, SystemClock)
    }
}

impl<C: WallClock> FlipItApp<C> {
    pub fn with_clock(
        mode: ClockMode,
        config: ClockConfig,
        fonts: FontSystem,
        font: FontId,
        clock: C,
    ) -> Self {
        // Sized faces wait for the window's scale factor in `on_load`.
        let face = match mode {
            ClockMode::Fullscreen => Some(ClockFace::fullscreen(config.show_seconds)),
            ClockMode::Bounds { .. } | ClockMode::Preview { .. } => None,
        };

        Self {
            mode,
            config,
            clock,
            fonts,
            font,
            face,
            exit: ExitPolicy::new(mode.is_preview()),
            draw_list: DrawList::new(),
            renderer: SceneRenderer::new(),
        }
    }

    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    #[inline]
    pub fn face(&self) -> Option<&ClockFace> {
        self.face.as_ref()
    }

    /// Ticks the face and asks for a frame when it changed.
    fn tick(&mut self, runtime: &mut RuntimeCtx) {
        let Some(face) = self.face.as_mut() else { return };
        if face.tick(self.clock.now()) {
            runtime.request_redraw();
        }
    }

    /// Builds the face for a window `physical_height` pixels tall on a
    /// display with `scale_factor`. The face lays out in logical pixels, so
    /// the height is converted first. Fullscreen faces keep their fixed size.
    pub fn place_face(&mut self, physical_height: i32, scale_factor: f64) {
        let height = logical_height(physical_height, scale_factor);
        let show_seconds = self.config.show_seconds;
        match self.mode {
            ClockMode::Fullscreen => {}
            ClockMode::Bounds { .. } => {
                self.face = Some(ClockFace::for_bounds(height, show_seconds));
            }
            ClockMode::Preview { .. } => {
                self.face = Some(ClockFace::for_preview(height, show_seconds));
            }
        }
    }

    /// Paints once right away and starts the tick timer.
    pub fn start(&mut self, runtime: &mut RuntimeCtx) {
        self.tick(runtime);
        runtime.start_timer(TICK_INTERVAL);
    }

    fn embed(&self, window: &WindowCtx<'_>, parent: isize) -> Result<i32> {
        let child = window.win32_hwnd().ok_or(EmbedError::Unsupported)?;
        let area = embed::attach_to_host(child, parent)
            .with_context(|| format!("failed to embed into host window {parent:#x}"))?;
        Ok(area.height)
    }
}

/// Converts a physical pixel height to logical pixels.
fn logical_height(physical: i32, scale_factor: f64) -> i32 {
    if scale_factor > 0.0 && scale_factor.is_finite() {
        (f64::from(physical) / scale_factor).round() as i32
    } else {
        physical
    }
}

impl<C: WallClock + 'static> App for FlipItApp<C> {
    fn on_load(&mut self, window: &WindowCtx<'_>, runtime: &mut RuntimeCtx) -> Result<()> {
        let scale = window.scale_factor();
        match self.mode {
            ClockMode::Fullscreen => {}
            ClockMode::Bounds { height, .. } => {
                self.place_face(i32::try_from(height).unwrap_or(i32::MAX), scale);
            }
            ClockMode::Preview { parent } => {
                let host_height = self.embed(window, parent)?;
                self.place_face(host_height, scale);
            }
        }

        window.set_cursor_visible(false);
        // A child window cannot be topmost.
        if !self.mode.is_preview() {
            window.set_always_on_top(true);
        }

        self.start(runtime);
        Ok(())
    }

    fn on_input(&mut self, event: &InputEvent, runtime: &mut RuntimeCtx) {
        if let Some(reason) = self.exit.observe(event) {
            log::info!("exiting: {reason:?}");
            runtime.exit();
        }
    }

    fn on_timer(&mut self, runtime: &mut RuntimeCtx) {
        self.tick(runtime);
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(face) = self.face.as_mut() else {
            return AppControl::Continue;
        };

        let (w, h) = ctx.window.logical_size();
        let window = Viewport::new(w, h).size_px();

        self.draw_list.clear();
        face.paint(&mut self.draw_list, window, self.clock.now(), &self.fonts, self.font);

        let dl = &mut self.draw_list;
        let fonts = &self.fonts;
        let renderer = &mut self.renderer;

        ctx.render(Color::BLACK, |rctx, target| {
            renderer.render(rctx, target, dl, fonts);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::face::{face_width, FaceFonts, FontMetrics};
    use flipit_engine::input::{Key, KeyState, Modifiers, PointerMoveEvent};

    fn app(mode: ClockMode, show_seconds: bool) -> FlipItApp<FixedClock> {
        FlipItApp::with_clock(
            mode,
            ClockConfig::default().with_show_seconds(show_seconds),
            FontSystem::new(),
            FontId::default(),
            FixedClock::at(14, 7, 33),
        )
    }

    fn moved(x: f32, y: f32) -> InputEvent {
        InputEvent::PointerMoved(PointerMoveEvent { x, y })
    }

    /// Line height of 1.2 × px.
    struct Metrics;

    impl FontMetrics for Metrics {
        fn line_height(&self, _font: FontId, px: f32) -> f32 {
            px * 1.2
        }
    }

    const BOUNDS_1080P: ClockMode = ClockMode::Bounds { x: 0, y: 0, width: 1920, height: 1080 };

    /// Cell size relative to window height, and whether the face fits, for
    /// a 1920×1080 physical window at `scale`.
    fn fit_at_scale(scale: f64) -> (f64, bool) {
        let mut app = app(BOUNDS_1080P, false);
        app.place_face(1080, scale);
        let face = app.face().cloned().unwrap();

        let window = ((1920.0 / scale) as i32, (1080.0 / scale) as i32);
        let fonts = FaceFonts::resolve(&Metrics, FontId::default(), face.font_size());
        let cells = face.layout(&fonts, window, hms(14, 7, 33));

        let size = cells[0].size;
        let fits = face_width(size, false) <= window.0 && cells[0].y >= 0;
        (f64::from(size) / f64::from(window.1), fits)
    }

    fn hms(h: u32, m: u32, s: u32) -> chrono::NaiveTime {
        chrono::NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn face_follows_mode() {
        assert_eq!(app(ClockMode::Fullscreen, false).face().map(|f| f.font_size()), Some(350));

        let mut bounds = app(ClockMode::Bounds { x: 0, y: 0, width: 1200, height: 900 }, false);
        assert!(bounds.face().is_none());
        bounds.place_face(900, 1.0);
        assert_eq!(bounds.face().map(|f| f.font_size()), Some(300));

        let mut preview = app(ClockMode::Preview { parent: 1 }, false);
        assert!(preview.face().is_none());
        preview.place_face(150, 1.0);
        assert_eq!(preview.face().map(|f| (f.font_size(), f.is_preview())), Some((50, true)));
    }

    #[test]
    fn fullscreen_face_ignores_placement() {
        let mut app = app(ClockMode::Fullscreen, false);
        app.place_face(2160, 2.0);
        assert_eq!(app.face().map(|f| f.font_size()), Some(350));
    }

    #[test]
    fn sized_faces_use_logical_height() {
        let mut app = app(BOUNDS_1080P, false);
        app.place_face(1080, 2.0);
        assert_eq!(app.face().map(|f| f.font_size()), Some(180));
        app.place_face(1080, 1.5);
        assert_eq!(app.face().map(|f| f.font_size()), Some(240));
    }

    #[test]
    fn face_keeps_its_proportions_across_scale_factors() {
        let (base, fits) = fit_at_scale(1.0);
        assert!(fits);
        for scale in [1.25, 1.5, 2.0] {
            let (ratio, fits) = fit_at_scale(scale);
            assert!((ratio - base).abs() < 0.01, "scale {scale}: {ratio} vs {base}");
            assert!(fits, "scale {scale} overflows the window");
        }
    }

    #[test]
    fn start_paints_immediately_and_runs_a_one_second_timer() {
        let mut app = app(ClockMode::Fullscreen, false);
        let mut rt = RuntimeCtx::default();
        app.start(&mut rt);
        assert!(rt.redraw_requested());
        assert_eq!(app.face().and_then(|f| f.last_minute()), Some(7));
        assert_eq!(rt.timer_interval(), Some(Duration::from_millis(1000)));
    }

    #[test]
    fn placed_bounds_face_ticks_on_start() {
        let mut app = app(BOUNDS_1080P, true);
        app.place_face(1080, 1.0);
        let mut rt = RuntimeCtx::default();
        app.start(&mut rt);
        assert!(rt.redraw_requested());
        assert_eq!(rt.timer_interval(), Some(TICK_INTERVAL));
    }

    #[test]
    fn timer_requests_frames_once_per_minute() {
        let mut app = app(ClockMode::Fullscreen, false);

        let mut rt = RuntimeCtx::default();
        app.on_timer(&mut rt);
        assert!(rt.redraw_requested());
        assert_eq!(app.face().and_then(|f| f.last_minute()), Some(7));

        app.clock().set_hms(14, 7, 40);
        let mut rt = RuntimeCtx::default();
        app.on_timer(&mut rt);
        assert!(!rt.redraw_requested());

        app.clock().set_hms(14, 8, 1);
        let mut rt = RuntimeCtx::default();
        app.on_timer(&mut rt);
        assert!(rt.redraw_requested());
        assert_eq!(app.face().and_then(|f| f.last_minute()), Some(8));
    }

    #[test]
    fn timer_with_seconds_requests_every_tick() {
        let mut app = app(ClockMode::Fullscreen, true);
        for s in 33..40 {
            app.clock().set_hms(14, 7, s);
            let mut rt = RuntimeCtx::default();
            app.on_timer(&mut rt);
            assert!(rt.redraw_requested(), "tick at :{s} should repaint");
        }
    }

    #[test]
    fn large_pointer_move_exits() {
        let mut app = app(ClockMode::Fullscreen, false);

        let mut rt = RuntimeCtx::default();
        app.on_input(&moved(10.0, 10.0), &mut rt);
        app.on_input(&moved(15.0, 15.0), &mut rt);
        assert!(!rt.exit_requested());

        app.on_input(&moved(21.0, 15.0), &mut rt);
        assert!(rt.exit_requested());
    }

    #[test]
    fn preview_ignores_input() {
        let mut app = app(ClockMode::Preview { parent: 1 }, false);
        let mut rt = RuntimeCtx::default();
        app.on_input(&moved(0.0, 0.0), &mut rt);
        app.on_input(&moved(500.0, 500.0), &mut rt);
        app.on_input(
            &InputEvent::Key {
                key: Key::Escape,
                state: KeyState::Pressed,
                modifiers: Modifiers::default(),
                repeat: false,
            },
            &mut rt,
        );
        assert!(!rt.exit_requested());
    }

    #[test]
    fn preview_without_face_does_not_tick() {
        let mut app = app(ClockMode::Preview { parent: 1 }, false);
        let mut rt = RuntimeCtx::default();
        app.on_timer(&mut rt);
        assert!(!rt.redraw_requested());
    }
}
