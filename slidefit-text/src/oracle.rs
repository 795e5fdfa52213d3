//! Measurement oracle backed by real text layout.

use std::sync::{Arc, Mutex, MutexGuard};

use slidefit_core::{MeasureQuery, MeasurementOracle};

use crate::measure::TextMeasurer;

/// Answers overflow questions by laying the text out with cosmic-text at
/// the queried size and box width.
///
/// The measurer is shared (e.g. with an [`AdvanceEstimator`] or a
/// [`FontLoader`]) so fonts loaded at runtime are visible to every user.
///
/// [`AdvanceEstimator`]: crate::AdvanceEstimator
/// [`FontLoader`]: crate::FontLoader
#[derive(Clone)]
pub struct ShapingOracle {
    measurer: Arc<Mutex<TextMeasurer>>,
}

impl ShapingOracle {
    pub fn new(measurer: Arc<Mutex<TextMeasurer>>) -> Self {
        Self { measurer }
    }

    pub fn measurer(&self) -> &Arc<Mutex<TextMeasurer>> {
        &self.measurer
    }

    fn lock(&self) -> MutexGuard<'_, TextMeasurer> {
        self.measurer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MeasurementOracle for ShapingOracle {
    fn overflows(&mut self, query: &MeasureQuery<'_>) -> bool {
        let line_height_px = query.font_size * query.line_height;
        let extent = self.lock().measure(
            query.text,
            query.font_size,
            line_height_px,
            query.font_family,
            Some(query.box_width),
        );
        log::trace!(
            "ShapingOracle: {}px -> {} lines, {:.1}px tall (max {})",
            query.font_size,
            extent.lines,
            extent.height,
            query.max_height,
        );
        extent.height > query.max_height
    }

    /// Without any font faces there is nothing to lay out with.
    fn surface_ready(&self) -> bool {
        self.lock().face_count() > 0
    }
}
