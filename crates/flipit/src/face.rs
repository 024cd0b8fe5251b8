//! The clock face: tick gating, layout and cell painting.
//!
//! Everything here records into a [`DrawList`]; no GPU is involved, so the
//! geometry can be checked directly in tests.

use chrono::{NaiveTime, Timelike};

use flipit_engine::coords::{Rect, Vec2};
use flipit_engine::paint::{Color, LinearGradient};
use flipit_engine::scene::{DrawList, TextAnchor, ZIndex};
use flipit_engine::text::{FontId, FontSystem};

/// Divider thickness outside preview mode, in pixels.
pub const SPLIT_WIDTH: i32 = 4;
/// Bounds and preview font size is the window height over this.
pub const FONT_SCALE_DIVISOR: i32 = 3;
/// Font size in points when covering the whole display.
pub const DEFAULT_FONT_SIZE: i32 = 350;
/// Cell gap and corner radius are the cell size over this.
pub const GUTTER_DIVISOR: i32 = 20;

const SMALL_FONT_DIVISOR: i32 = 9;
// Cells are slightly shorter than the font's line height.
const TIGHTEN_NUM: i32 = 10;
const TIGHTEN_DEN: i32 = 11;

const Z_CAPS: ZIndex = ZIndex(0);
const Z_FILL: ZIndex = ZIndex(1);
const Z_TEXT: ZIndex = ZIndex(2);
const Z_DIVIDER: ZIndex = ZIndex(3);

/// Converts a font size in points to pixels at 96 DPI.
#[inline]
pub fn points_to_px(points: i32) -> f32 {
    points as f32 * 96.0 / 72.0
}

/// Line-height lookup the face lays itself out with.
pub trait FontMetrics {
    /// Baseline-to-baseline distance of `font` at `px`, in pixels.
    fn line_height(&self, font: FontId, px: f32) -> f32;
}

impl FontMetrics for FontSystem {
    fn line_height(&self, font: FontId, px: f32) -> f32 {
        FontSystem::line_height(self, font, px)
    }
}

/// Font sizes and whole-pixel heights, resolved once per face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceFonts {
    pub font: FontId,
    /// Digit size in pixels.
    pub large_px: f32,
    /// AM/PM label size in pixels.
    pub small_px: f32,
    /// Digit line height, rounded up to whole pixels.
    pub large_height: i32,
    /// Label line height, rounded up to whole pixels.
    pub small_height: i32,
}

impl FaceFonts {
    pub fn resolve(metrics: &impl FontMetrics, font: FontId, font_size: i32) -> Self {
        let large_px = points_to_px(font_size);
        let small_px = points_to_px(font_size / SMALL_FONT_DIVISOR);
        Self {
            font,
            large_px,
            small_px,
            large_height: metrics.line_height(font, large_px).ceil() as i32,
            small_height: metrics.line_height(font, small_px).ceil() as i32,
        }
    }
}

/// Colors of the face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub top: Color,
    pub bottom: Color,
    pub digits: Color,
    pub divider: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            top: Color::gray(15),
            bottom: Color::gray(10),
            digits: Color::gray(183),
            divider: Color::BLACK,
        }
    }
}

/// One rounded cell of the face, in whole pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
    pub size: i32,
    pub text: String,
    pub top: Option<&'static str>,
    pub bottom: Option<&'static str>,
}

/// Hour in 12-hour form without a leading zero; midnight and noon are "12".
pub fn hour_label(hour: u32) -> String {
    match hour % 12 {
        0 => "12".to_string(),
        h => h.to_string(),
    }
}

/// `(top, bottom)` label for `hour`: "AM" on top before noon, "PM" at the
/// bottom from noon on. Never both.
pub fn meridiem(hour: u32) -> (Option<&'static str>, Option<&'static str>) {
    if hour < 12 {
        (Some("AM"), None)
    } else {
        (None, Some("PM"))
    }
}

/// Total face width for cells of `height`, rounded half-to-even.
pub fn face_width(height: i32, show_seconds: bool) -> i32 {
    let factor = if show_seconds { 3.1 } else { 2.05 };
    (factor * height as f64).round_ties_even() as i32
}

/// Timer-driven clock face.
#[derive(Debug, Clone)]
pub struct ClockFace {
    preview: bool,
    show_seconds: bool,
    last_minute: Option<u32>,
    font_size: i32,
    palette: Palette,
    fonts: Option<FaceFonts>,
}

impl ClockFace {
    /// Face covering the whole display.
    pub fn fullscreen(show_seconds: bool) -> Self {
        Self::new(false, DEFAULT_FONT_SIZE, show_seconds)
    }

    /// Face for a window of `height` pixels.
    pub fn for_bounds(height: i32, show_seconds: bool) -> Self {
        Self::new(false, height / FONT_SCALE_DIVISOR, show_seconds)
    }

    /// Face embedded in a preview pane `parent_height` pixels tall.
    pub fn for_preview(parent_height: i32, show_seconds: bool) -> Self {
        Self::new(true, parent_height / FONT_SCALE_DIVISOR, show_seconds)
    }

    fn new(preview: bool, font_size: i32, show_seconds: bool) -> Self {
        Self {
            preview,
            show_seconds,
            last_minute: None,
            font_size,
            palette: Palette::default(),
            fonts: None,
        }
    }

    #[inline]
    pub fn is_preview(&self) -> bool {
        self.preview
    }

    #[inline]
    pub fn shows_seconds(&self) -> bool {
        self.show_seconds
    }

    /// Minute of the hour last seen by [`tick`](Self::tick).
    #[inline]
    pub fn last_minute(&self) -> Option<u32> {
        self.last_minute
    }

    /// Digit font size in points.
    #[inline]
    pub fn font_size(&self) -> i32 {
        self.font_size
    }

    #[inline]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Advances the face to `now`; returns `true` when it needs a repaint.
    ///
    /// Without seconds that is once per distinct minute; with seconds, every
    /// call.
    pub fn tick(&mut self, now: NaiveTime) -> bool {
        let minute = now.minute();
        let mut repaint = false;
        if self.last_minute != Some(minute) {
            self.last_minute = Some(minute);
            repaint = true;
        }
        if self.show_seconds {
            repaint = true;
        }
        repaint
    }

    /// Font metrics for this face, resolved on first use and then cached.
    pub fn ensure_fonts(&mut self, metrics: &impl FontMetrics, font: FontId) -> FaceFonts {
        *self
            .fonts
            .get_or_insert_with(|| FaceFonts::resolve(metrics, font, self.font_size))
    }

    /// Cells for `now`, centered in a `window` of `(width, height)` pixels.
    pub fn layout(&self, fonts: &FaceFonts, window: (i32, i32), now: NaiveTime) -> Vec<Cell> {
        let (window_w, window_h) = window;
        let height = fonts.large_height * TIGHTEN_NUM / TIGHTEN_DEN;
        let width = face_width(height, self.show_seconds);
        let step = height + height / GUTTER_DIVISOR;

        let mut x = (window_w - width) / 2;
        let y = (window_h - height) / 2;

        let (top, bottom) = meridiem(now.hour());
        let mut cells = vec![Cell {
            x,
            y,
            size: height,
            text: hour_label(now.hour()),
            top,
            bottom,
        }];

        x += step;
        cells.push(Cell {
            x,
            y,
            size: height,
            text: format!("{:02}", now.minute()),
            top: None,
            bottom: None,
        });

        if self.show_seconds {
            x += step;
            cells.push(Cell {
                x,
                y,
                size: height,
                text: format!("{:02}", now.second()),
                top: None,
                bottom: None,
            });
        }

        cells
    }

    /// Records the whole face for `now` into `list`.
    pub fn paint(
        &mut self,
        list: &mut DrawList,
        window: (i32, i32),
        now: NaiveTime,
        metrics: &impl FontMetrics,
        font: FontId,
    ) {
        let fonts = self.ensure_fonts(metrics, font);
        for cell in self.layout(&fonts, window, now) {
            self.paint_cell(list, &fonts, &cell);
        }
    }

    /// Records one rounded cell with its digits, label and divider.
    pub fn paint_cell(&self, list: &mut DrawList, fonts: &FaceFonts, cell: &Cell) {
        let Cell { x, y, size, .. } = *cell;
        let p = &self.palette;

        let radius = size / GUTTER_DIVISOR;
        let diameter = radius * 2;
        let (xf, yf, d) = (x as f32, y as f32, diameter as f32);
        let far = (x + size - diameter) as f32;
        let low = (y + size - diameter) as f32;

        list.push_solid_disc(Z_CAPS, xf, yf, d, p.top);
        list.push_solid_disc(Z_CAPS, far, yf, d, p.top);
        list.push_solid_disc(Z_CAPS, xf, low, d, p.bottom);
        list.push_solid_disc(Z_CAPS, far, low, d, p.bottom);

        list.push_solid_rect(Z_FILL, Rect::from_px(x + radius, y, size - diameter, diameter), p.top);
        list.push_solid_rect(
            Z_FILL,
            Rect::from_px(x + radius, y + size - diameter, size - diameter, diameter),
            p.bottom,
        );
        list.push_gradient_rect(
            Z_FILL,
            Rect::from_px(x, y + radius, size, size - diameter),
            LinearGradient::vertical((y + radius) as f32, (y + size - radius) as f32, p.top, p.bottom),
        );

        let spill = size / 10;
        let text_box = Rect::from_px(x - spill, y + spill / 2, size + spill * 2, size);
        list.push_text(
            Z_TEXT,
            cell.text.as_str(),
            fonts.font,
            fonts.large_px,
            p.digits,
            TextAnchor::Centered(text_box),
        );

        if let Some(label) = cell.top {
            let at = Vec2::new((x + diameter) as f32, (y + diameter) as f32);
            list.push_text(Z_TEXT, label, fonts.font, fonts.small_px, p.digits, TextAnchor::TopLeft(at));
        }
        if let Some(label) = cell.bottom {
            let at = Vec2::new(
                (x + diameter) as f32,
                (y + size - diameter - fonts.small_height) as f32,
            );
            list.push_text(Z_TEXT, label, fonts.font, fonts.small_px, p.digits, TextAnchor::TopLeft(at));
        }

        let (x0, x1) = (xf, (x + size) as f32);
        if self.preview {
            // 1 px line covering the pixel row at the cell's middle.
            let row = (y + size / 2) as f32 + 0.5;
            list.push_hline(Z_DIVIDER, x0, x1, row, 1.0, p.divider);
        } else {
            let center = (y + size / 2 - SPLIT_WIDTH / 2) as f32;
            list.push_hline(Z_DIVIDER, x0, x1, center, SPLIT_WIDTH as f32, p.divider);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flipit_engine::paint::Paint;
    use flipit_engine::scene::DrawCmd;
    use flipit_engine::scene::shapes::rect::RectCmd;
    use flipit_engine::scene::shapes::text::TextCmd;

    /// Line height of 1.5 × px, whole pixels.
    struct FixedMetrics;

    impl FontMetrics for FixedMetrics {
        fn line_height(&self, _font: FontId, px: f32) -> f32 {
            (px * 1.5).round()
        }
    }

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn fonts_with_height(large_height: i32) -> FaceFonts {
        FaceFonts {
            font: FontId::default(),
            large_px: 100.0,
            small_px: 10.0,
            large_height,
            small_height: 12,
        }
    }

    fn texts(list: &DrawList) -> Vec<&TextCmd> {
        list.items()
            .iter()
            .filter_map(|i| match &i.cmd {
                DrawCmd::Text(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    fn divider(list: &DrawList) -> (ZIndex, RectCmd) {
        list.items()
            .iter()
            .rev()
            .find_map(|i| match &i.cmd {
                DrawCmd::Rect(r) => Some((i.key.z, r.clone())),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn construction_variants_pick_font_size() {
        assert_eq!(ClockFace::fullscreen(false).font_size(), 350);
        assert_eq!(ClockFace::for_bounds(900, false).font_size(), 300);
        let preview = ClockFace::for_preview(100, false);
        assert_eq!(preview.font_size(), 33);
        assert!(preview.is_preview());
        assert!(!ClockFace::for_bounds(900, false).is_preview());
    }

    #[test]
    fn points_convert_at_96_dpi() {
        assert_eq!(points_to_px(72), 96.0);
        assert_eq!(points_to_px(300), 400.0);
    }

    #[test]
    fn repaints_once_per_minute_without_seconds() {
        let mut face = ClockFace::fullscreen(false);
        assert_eq!(face.last_minute(), None);
        assert!(face.tick(hms(10, 0, 0)));
        let repaints = (1..60).filter(|s| face.tick(hms(10, 0, *s))).count();
        assert_eq!(repaints, 0);
        assert!(face.tick(hms(10, 1, 0)));
        assert_eq!(face.last_minute(), Some(1));
    }

    #[test]
    fn repaints_every_tick_with_seconds() {
        let mut face = ClockFace::fullscreen(true);
        assert!((0..10).all(|s| face.tick(hms(10, 0, s))));
        assert_eq!(face.last_minute(), Some(0));
    }

    #[test]
    fn minute_wraps_at_the_hour() {
        let mut face = ClockFace::fullscreen(false);
        face.tick(hms(10, 59, 59));
        assert!(face.tick(hms(11, 0, 0)));
        assert_eq!(face.last_minute(), Some(0));
    }

    #[test]
    fn hour_labels_drop_leading_zero() {
        assert_eq!(hour_label(0), "12");
        assert_eq!(hour_label(9), "9");
        assert_eq!(hour_label(12), "12");
        assert_eq!(hour_label(13), "1");
        assert_eq!(hour_label(23), "11");
    }

    #[test]
    fn meridiem_is_either_top_or_bottom() {
        assert_eq!(meridiem(0), (Some("AM"), None));
        assert_eq!(meridiem(11), (Some("AM"), None));
        assert_eq!(meridiem(12), (None, Some("PM")));
        assert_eq!(meridiem(23), (None, Some("PM")));
    }

    #[test]
    fn width_rounds_half_to_even() {
        assert_eq!(face_width(100, false), 205);
        assert_eq!(face_width(200, false), 410);
        assert_eq!(face_width(100, true), 310);
        // 3.1 × 15 = 46.5 exactly in f64.
        assert_eq!(face_width(15, true), 46);
    }

    #[test]
    fn layout_centers_and_spaces_cells() {
        let face = ClockFace::fullscreen(true);
        // 110 * 10 / 11 = 100
        let cells = face.layout(&fonts_with_height(110), (1000, 500), hms(9, 5, 7));
        assert_eq!(cells.len(), 3);

        let width = face_width(100, true);
        assert_eq!(cells[0].x, (1000 - width) / 2);
        assert_eq!(cells[0].y, 200);
        assert_eq!(cells[1].x - cells[0].x, 105);
        assert_eq!(cells[2].x - cells[1].x, 105);
        assert!(cells.iter().all(|c| c.size == 100));

        let text: Vec<&str> = cells.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(text, ["9", "05", "07"]);
        assert_eq!((cells[0].top, cells[0].bottom), (Some("AM"), None));
        assert_eq!((cells[1].top, cells[1].bottom), (None, None));
    }

    #[test]
    fn cell_geometry() {
        let face = ClockFace::fullscreen(false);
        let fonts = fonts_with_height(110);
        let cell = Cell {
            x: 100,
            y: 50,
            size: 200,
            text: "07".to_string(),
            top: Some("AM"),
            bottom: None,
        };
        let mut list = DrawList::new();
        face.paint_cell(&mut list, &fonts, &cell);

        let circles: Vec<_> = list
            .items()
            .iter()
            .filter_map(|i| match &i.cmd {
                DrawCmd::Circle(c) => Some((c.center, c.radius)),
                _ => None,
            })
            .collect();
        // radius 10, diameter 20; caps inscribed in the corner squares.
        assert_eq!(
            circles,
            vec![
                (Vec2::new(110.0, 60.0), 10.0),
                (Vec2::new(290.0, 60.0), 10.0),
                (Vec2::new(110.0, 240.0), 10.0),
                (Vec2::new(290.0, 240.0), 10.0),
            ]
        );

        let rects: Vec<&RectCmd> = list
            .items()
            .iter()
            .filter_map(|i| match &i.cmd {
                DrawCmd::Rect(r) => Some(r),
                _ => None,
            })
            .collect();
        assert_eq!(rects[0].rect, Rect::from_px(110, 50, 180, 20));
        assert_eq!(rects[1].rect, Rect::from_px(110, 230, 180, 20));
        assert_eq!(rects[2].rect, Rect::from_px(100, 60, 200, 180));
        match &rects[2].paint {
            Paint::LinearGradient(g) => {
                assert_eq!(g.start, Vec2::new(0.0, 60.0));
                assert_eq!(g.end, Vec2::new(0.0, 240.0));
                assert_eq!(g.from, face.palette().top);
                assert_eq!(g.to, face.palette().bottom);
            }
            other => panic!("expected gradient, got {other:?}"),
        }

        let texts = texts(&list);
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0].text, "07");
        assert_eq!(texts[0].anchor, TextAnchor::Centered(Rect::from_px(80, 60, 240, 200)));
        assert_eq!(texts[1].text, "AM");
        assert_eq!(texts[1].anchor, TextAnchor::TopLeft(Vec2::new(120.0, 70.0)));
        assert_eq!(texts[1].size, fonts.small_px);
    }

    #[test]
    fn bottom_label_sits_above_the_lower_band() {
        let face = ClockFace::fullscreen(false);
        let fonts = fonts_with_height(110);
        let cell = Cell {
            x: 0,
            y: 0,
            size: 200,
            text: "2".to_string(),
            top: None,
            bottom: Some("PM"),
        };
        let mut list = DrawList::new();
        face.paint_cell(&mut list, &fonts, &cell);

        let label = texts(&list).into_iter().find(|t| t.text == "PM").unwrap().clone();
        // 200 - 20 - 12
        assert_eq!(label.anchor, TextAnchor::TopLeft(Vec2::new(20.0, 168.0)));
    }

    #[test]
    fn divider_is_four_pixels_and_on_top() {
        let face = ClockFace::fullscreen(false);
        let cell = Cell { x: 10, y: 0, size: 100, text: "1".into(), top: None, bottom: None };
        let mut list = DrawList::new();
        face.paint_cell(&mut list, &fonts_with_height(110), &cell);

        let (z, line) = divider(&list);
        assert_eq!(line.rect, Rect::new(10.0, 46.0, 100.0, 4.0));
        assert_eq!(line.paint, Paint::Solid(Color::BLACK));
        assert_eq!(list.layers().last(), Some(&z));
    }

    #[test]
    fn preview_divider_is_one_pixel() {
        let face = ClockFace::for_preview(300, false);
        let cell = Cell { x: 0, y: 0, size: 100, text: "1".into(), top: None, bottom: None };
        let mut list = DrawList::new();
        face.paint_cell(&mut list, &fonts_with_height(110), &cell);

        let (_, line) = divider(&list);
        assert_eq!(line.rect, Rect::new(0.0, 50.0, 100.0, 1.0));
    }

    #[test]
    fn fonts_resolve_once() {
        let mut face = ClockFace::for_bounds(900, false);
        let first = face.ensure_fonts(&FixedMetrics, FontId::default());
        // 300pt = 400px, 33pt = 44px
        assert_eq!(first.large_px, 400.0);
        assert_eq!(first.large_height, 600);
        assert_eq!(first.small_height, 66);

        struct Tall;
        impl FontMetrics for Tall {
            fn line_height(&self, _: FontId, _: f32) -> f32 {
                10_000.0
            }
        }
        assert_eq!(face.ensure_fonts(&Tall, FontId::default()), first);
    }

    #[test]
    fn afternoon_scenario_at_1200_by_900() {
        let clock_face = &mut ClockFace::fullscreen(false);
        assert!(clock_face.tick(hms(14, 7, 33)));
        assert_eq!(clock_face.last_minute(), Some(7));

        let mut list = DrawList::new();
        clock_face.paint(&mut list, (1200, 900), hms(14, 7, 33), &FixedMetrics, FontId::default());

        let digits: Vec<String> = texts(&list)
            .into_iter()
            .filter(|t| matches!(t.anchor, TextAnchor::Centered(_)))
            .map(|t| t.text.clone())
            .collect();
        assert_eq!(digits, ["2", "07"]);

        let labels: Vec<String> = texts(&list)
            .into_iter()
            .filter(|t| matches!(t.anchor, TextAnchor::TopLeft(_)))
            .map(|t| t.text.clone())
            .collect();
        assert_eq!(labels, ["PM"]);

        assert!(!clock_face.tick(hms(14, 7, 40)));
        assert_eq!(clock_face.last_minute(), Some(7));
        assert!(clock_face.tick(hms(14, 8, 1)));
        assert_eq!(clock_face.last_minute(), Some(8));
    }
}
