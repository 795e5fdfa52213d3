//! Text measurer — lays text out with `cosmic-text` and reports its extent.
//!
//! The measurer owns a `FontSystem` (font discovery + shaping). Unlike a
//! renderer it never rasterizes: only line count and line widths matter
//! for fitting.

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping};

/// Bounding extent of a laid-out text block.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextExtent {
    /// Widest line, in pixels.
    pub width: f32,
    /// `lines * line_height`, in pixels.
    pub height: f32,
    /// Number of visual lines after wrapping.
    pub lines: usize,
}

/// Resolve the first entry of a CSS family chain to a cosmic-text family.
///
/// cosmic-text falls back across the font database on its own, so only
/// the head of `"Inter, Helvetica, sans-serif"` is passed through.
pub fn css_family(chain: &str) -> Family<'_> {
    let first = chain
        .split(',')
        .map(|s| s.trim().trim_matches('"').trim_matches('\''))
        .find(|s| !s.is_empty())
        .unwrap_or("sans-serif");
    match first {
        "sans-serif" => Family::SansSerif,
        "serif" => Family::Serif,
        "monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        concrete => Family::Name(concrete),
    }
}

pub struct TextMeasurer {
    font_system: FontSystem,
    /// Bumped whenever the font set may have changed.
    font_generation: u64,
}

impl TextMeasurer {
    /// Create a measurer with system font discovery.
    pub fn new() -> Self {
        let start = std::time::Instant::now();
        let font_system = FontSystem::new();
        log::info!(
            "TextMeasurer: {} font faces available ({:.1}ms)",
            font_system.db().faces().count(),
            start.elapsed().as_secs_f64() * 1000.0,
        );
        Self::with_font_system(font_system)
    }

    /// Wrap an existing font system (e.g. one preloaded with app fonts).
    pub fn with_font_system(font_system: FontSystem) -> Self {
        Self {
            font_system,
            font_generation: 0,
        }
    }

    pub fn font_system(&self) -> &FontSystem {
        &self.font_system
    }

    /// Mutable access may add or remove faces, so it starts a new font
    /// generation.
    pub fn font_system_mut(&mut self) -> &mut FontSystem {
        self.font_generation += 1;
        &mut self.font_system
    }

    /// Metrics measured under an older generation are stale.
    pub fn font_generation(&self) -> u64 {
        self.font_generation
    }

    /// Number of loaded font faces. Zero means nothing can be measured.
    pub fn face_count(&self) -> usize {
        self.font_system.db().faces().count()
    }

    /// Lay `text` out and return its extent.
    ///
    /// `max_width` enables word wrapping; `None` lays the text out on
    /// unwrapped lines (explicit newlines still break).
    pub fn measure(
        &mut self,
        text: &str,
        font_size: f32,
        line_height_px: f32,
        family: &str,
        max_width: Option<f32>,
    ) -> TextExtent {
        if text.is_empty() {
            return TextExtent::default();
        }

        let metrics = Metrics::new(font_size, line_height_px);
        let attrs = Attrs::new().family(css_family(family));

        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        buffer.set_size(&mut self.font_system, max_width.map(|w| w.max(0.0)), None);
        buffer.set_text(&mut self.font_system, text, attrs, Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);

        let mut extent = TextExtent::default();
        for run in buffer.layout_runs() {
            extent.lines += 1;
            extent.width = extent.width.max(run.line_w);
        }
        extent.height = extent.lines as f32 * line_height_px;
        extent
    }

    /// Advance width of `text` on one unwrapped line.
    pub fn advance(&mut self, text: &str, font_size: f32, family: &str) -> f32 {
        let single_line = text.replace(['\n', '\r'], " ");
        self.measure(&single_line, font_size, font_size, family, None).width
    }
}

impl Default for TextMeasurer {
    fn default() -> Self {
        Self::new()
    }
}
