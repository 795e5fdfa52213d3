//! # slidefit-text
//!
//! Text measurement backend for slidefit. Implements the core's
//! measurement oracle and estimator contracts on top of `cosmic-text`.
//!
//! ## Architecture
//!
//! ```text
//!            Arc<Mutex<TextMeasurer>>  (cosmic-text FontSystem)
//!              │          │           │
//!              ▼          ▼           ▼
//!   ShapingOracle   AdvanceEstimator   FontLoader ──► FontsReady (broadcast)
//!   (wrap + height)  (one-line advance)  (db_mut + face diff)
//! ```
//!
//! - **`measure`** — layout and extent measurement, CSS family parsing.
//! - **`oracle`** — overflow answers from real layout.
//! - **`estimator`** — linear advance-based size estimate.
//! - **`fonts`** — runtime font loading and font-ready events.

pub mod estimator;
pub mod fonts;
pub mod measure;
pub mod oracle;

// Re-exports for ergonomic use.
pub use estimator::{AdvanceEstimator, REFERENCE_SIZE};
pub use fonts::{FontLoadError, FontLoader};
pub use measure::{css_family, TextExtent, TextMeasurer};
pub use oracle::ShapingOracle;

use std::sync::{Arc, Mutex};

/// Oracle, estimator and loader sharing one measurer.
pub fn backend() -> (ShapingOracle, AdvanceEstimator, FontLoader) {
    backend_with(TextMeasurer::new())
}

pub fn backend_with(measurer: TextMeasurer) -> (ShapingOracle, AdvanceEstimator, FontLoader) {
    let shared = Arc::new(Mutex::new(measurer));
    (
        ShapingOracle::new(Arc::clone(&shared)),
        AdvanceEstimator::new(Arc::clone(&shared)),
        FontLoader::new(shared),
    )
}
