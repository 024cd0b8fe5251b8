use std::fmt;

/// Error returned by [`FontSystem::load_font`].
#[derive(Debug, Clone)]
pub struct FontLoadError(pub String);

impl fmt::Display for FontLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "font load error: {}", self.0)
    }
}

impl std::error::Error for FontLoadError {}

/// Opaque handle to a font loaded into a [`FontSystem`].
///
/// The default handle names the first font loaded.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct FontId(pub(crate) usize);

/// Owns a collection of loaded fonts.
///
/// Fonts are immutable after loading. The system is owned by the application
/// and passed to the scene renderer each frame so new glyphs can be
/// rasterized on demand.
#[derive(Default)]
pub struct FontSystem {
    fonts: Vec<fontdue::Font>,
}

impl FontSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and stores a TrueType or OpenType font from raw bytes.
    ///
    /// Returns the `FontId` that identifies the font in draw commands.
    pub fn load_font(&mut self, bytes: &[u8]) -> Result<FontId, FontLoadError> {
        if bytes.is_empty() {
            return Err(FontLoadError("empty font data".to_string()));
        }
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontLoadError(e.to_string()))?;
        let id = FontId(self.fonts.len());
        self.fonts.push(font);
        Ok(id)
    }

    /// Returns a reference to the underlying `fontdue::Font`, if `id` is valid.
    pub(crate) fn get(&self, id: FontId) -> Option<&fontdue::Font> {
        self.fonts.get(id.0)
    }

    /// Distance between consecutive baselines at `px`, in logical pixels.
    ///
    /// This is ascent + descent + line gap, the figure platform text APIs
    /// report as a font's height. Falls back to `1.2 × px` for unknown ids or
    /// fonts without horizontal metrics.
    #[must_use]
    pub fn line_height(&self, id: FontId, px: f32) -> f32 {
        self.get(id)
            .and_then(|font| font.horizontal_line_metrics(px))
            .map(|m| m.new_line_size)
            .unwrap_or(px * 1.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_garbage_bytes() {
        let mut fonts = FontSystem::new();
        assert!(fonts.load_font(&[]).is_err());
        assert!(fonts.load_font(b"definitely not a font").is_err());
    }

    #[test]
    fn unknown_font_uses_fallback_line_height() {
        let fonts = FontSystem::new();
        assert_eq!(fonts.line_height(FontId(3), 100.0), 120.0);
    }
}
