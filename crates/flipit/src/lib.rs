//! FlipIt: a flip-clock screensaver.
//!
//! The clock shows the local time as large rounded cells (hours, minutes and
//! optionally seconds) centered on a black background. It runs fullscreen,
//! inside an explicit rectangle, or embedded in the host's preview pane, and
//! exits on the first key press, button press or noticeable pointer move.

pub mod app;
pub mod clock;
pub mod config;
pub mod embed;
pub mod exit;
pub mod face;
pub mod mode;

pub use app::{run, FlipItApp};
pub use clock::{SystemClock, WallClock};
pub use config::ClockConfig;
pub use face::ClockFace;
pub use mode::ClockMode;
