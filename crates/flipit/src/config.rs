use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Environment variable that turns the seconds cell on (`1`, `true`, `yes`, `on`).
pub const ENV_SHOW_SECONDS: &str = "FLIPIT_SHOW_SECONDS";

/// Environment variable naming a TTF/OTF file to draw the digits with.
pub const ENV_FONT: &str = "FLIPIT_FONT";

/// Bold faces tried, in order, when no font is configured.
const FALLBACK_FONTS: &[&str] = &[
    r"C:\Windows\Fonts\bahnschrift.ttf",
    r"C:\Windows\Fonts\segoeuib.ttf",
    r"C:\Windows\Fonts\arialbd.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Bold.ttf",
    "/usr/share/fonts/noto/NotoSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
];

/// Clock configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClockConfig {
    /// Draw a third cell with the seconds and repaint on every tick.
    pub show_seconds: bool,
    /// Font file for digits and labels; `None` searches [`FALLBACK_FONTS`].
    pub font_path: Option<PathBuf>,
    /// `env_logger` filter; `None` defers to `RUST_LOG`.
    pub log_filter: Option<String>,
}

impl ClockConfig {
    pub fn with_show_seconds(mut self, show: bool) -> Self {
        self.show_seconds = show;
        self
    }

    pub fn with_font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = Some(path.into());
        self
    }

    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup` (an environment-like key/value source).
    ///
    /// Unparseable flag values leave the current setting untouched.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(flag) = lookup(ENV_SHOW_SECONDS).as_deref().and_then(parse_flag) {
            self.show_seconds = flag;
        }
        if let Some(path) = lookup(ENV_FONT).filter(|p| !p.trim().is_empty()) {
            self.font_path = Some(PathBuf::from(path));
        }
        self
    }

    /// Reads the configured font, or the first fallback font that exists.
    pub fn load_font_bytes(&self) -> Result<Vec<u8>> {
        if let Some(path) = &self.font_path {
            return std::fs::read(path)
                .with_context(|| format!("failed to read font {}", path.display()));
        }

        FALLBACK_FONTS
            .iter()
            .map(Path::new)
            .find_map(|p| {
                let bytes = std::fs::read(p).ok()?;
                log::debug!("using font {}", p.display());
                Some(bytes)
            })
            .with_context(|| {
                format!("no usable font found; set {ENV_FONT} to a TTF/OTF file")
            })
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn defaults_hide_seconds() {
        let cfg = ClockConfig::default();
        assert!(!cfg.show_seconds);
        assert_eq!(cfg.font_path, None);
        assert_eq!(cfg.log_filter, None);
    }

    #[test]
    fn flag_values_are_case_insensitive() {
        for v in ["1", "true", "YES", " On "] {
            let cfg = ClockConfig::default().with_overrides(env(&[(ENV_SHOW_SECONDS, v)]));
            assert!(cfg.show_seconds, "{v:?} should enable seconds");
        }
        let cfg = ClockConfig::default()
            .with_show_seconds(true)
            .with_overrides(env(&[(ENV_SHOW_SECONDS, "off")]));
        assert!(!cfg.show_seconds);
    }

    #[test]
    fn garbage_flag_keeps_current_value() {
        let cfg = ClockConfig::default()
            .with_show_seconds(true)
            .with_overrides(env(&[(ENV_SHOW_SECONDS, "maybe")]));
        assert!(cfg.show_seconds);
    }

    #[test]
    fn font_override_ignores_blank_values() {
        let cfg = ClockConfig::default().with_overrides(env(&[(ENV_FONT, "  ")]));
        assert_eq!(cfg.font_path, None);

        let cfg = ClockConfig::default().with_overrides(env(&[(ENV_FONT, "/tmp/clock.ttf")]));
        assert_eq!(cfg.font_path, Some(PathBuf::from("/tmp/clock.ttf")));
    }

    #[test]
    fn missing_configured_font_is_an_error() {
        let cfg = ClockConfig::default().with_font_path("/definitely/not/here.ttf");
        let err = cfg.load_font_bytes().unwrap_err();
        assert!(format!("{err:#}").contains("not/here.ttf"));
    }
}
