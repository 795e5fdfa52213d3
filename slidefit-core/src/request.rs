//! Fit requests and the content/style cache key derived from them.

use serde::{Deserialize, Serialize};

use crate::error::FitError;

/// Immutable description of what text, in what font and box, needs a size.
///
/// All sizes are in pixels. `line_height` is a multiplier of the font size
/// (CSS unitless line-height), so a line at size `s` is `s * line_height`
/// pixels tall.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FitRequest {
    pub text: String,
    pub max_font_size: f32,
    pub min_font_size: f32,
    pub line_height: f32,
    pub max_lines: u32,
    /// CSS-style family string (`"Inter, sans-serif"`).
    pub font_family: String,
    /// Width of the containing box at the time the request was made.
    pub container_width: f32,
}

impl FitRequest {
    /// Create a request with sensible defaults (`1.2` line-height, one line).
    pub fn new(text: impl Into<String>, min_font_size: f32, max_font_size: f32) -> Self {
        Self {
            text: text.into(),
            max_font_size,
            min_font_size,
            line_height: 1.2,
            max_lines: 1,
            font_family: String::from("sans-serif"),
            container_width: 0.0,
        }
    }

    pub fn with_line_height(mut self, line_height: f32) -> Self {
        self.line_height = line_height;
        self
    }

    pub fn with_max_lines(mut self, max_lines: u32) -> Self {
        self.max_lines = max_lines;
        self
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    pub fn with_container_width(mut self, width: f32) -> Self {
        self.container_width = width;
        self
    }

    /// Check the request's internal constraints.
    pub fn validate(&self) -> Result<(), FitError> {
        if !self.min_font_size.is_finite() || !self.max_font_size.is_finite() {
            return Err(FitError::InvalidRequest("font size bounds must be finite".into()));
        }
        if self.min_font_size <= 0.0 {
            return Err(FitError::InvalidRequest(format!(
                "min_font_size must be positive, got {}",
                self.min_font_size
            )));
        }
        if self.min_font_size > self.max_font_size {
            return Err(FitError::InvalidRequest(format!(
                "min_font_size {} exceeds max_font_size {}",
                self.min_font_size, self.max_font_size
            )));
        }
        if !self.line_height.is_finite() || self.line_height <= 0.0 {
            return Err(FitError::InvalidRequest(format!(
                "line_height must be a positive number, got {}",
                self.line_height
            )));
        }
        if self.max_lines == 0 {
            return Err(FitError::InvalidRequest("max_lines must be at least 1".into()));
        }
        Ok(())
    }

    /// Key used by the result cache. Excludes geometry.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey {
            text: self.text.clone(),
            max_font_size: self.max_font_size.to_bits(),
            font_family: self.font_family.clone(),
            max_lines: self.max_lines,
            min_font_size: self.min_font_size.to_bits(),
        }
    }

    /// Whether `other` describes the same fit problem, ignoring container
    /// width. A width change alone does not restart a session.
    pub fn same_identity(&self, other: &FitRequest) -> bool {
        self.text == other.text
            && self.max_font_size == other.max_font_size
            && self.min_font_size == other.min_font_size
            && self.line_height == other.line_height
            && self.max_lines == other.max_lines
            && self.font_family == other.font_family
    }

    /// Whether this request renders with the given (already loaded) family.
    ///
    /// Matches any entry of the CSS fallback chain, case-insensitively.
    pub fn uses_family(&self, family: &str) -> bool {
        let family = family.trim().to_lowercase();
        self.font_family
            .split(',')
            .map(|s| s.trim().trim_matches('"').trim_matches('\'').to_lowercase())
            .any(|f| f == family)
    }
}

/// Content/style key of a request: `text`, size bounds, family and line
/// count. Font sizes are stored as raw bits so the key is `Eq + Hash`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    text: String,
    max_font_size: u32,
    font_family: String,
    max_lines: u32,
    min_font_size: u32,
}

impl CacheKey {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }
}
