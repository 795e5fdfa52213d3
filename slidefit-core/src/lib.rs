//! # slidefit-core
//!
//! Auto-fit text sizing for the slidefit deck editor: finds the largest
//! font size at which a text fits its box, without depending on any
//! particular layout engine or async runtime.
//!
//! ## Architecture
//!
//! ```text
//! FitRequest ──► ResultCache ── hit ──────────────────────────► Settled(size)
//!                    │ miss
//!                    ▼
//!               FitController ◄── apply_estimate(ticket) ── Estimator (async, optional)
//!                    │  step()
//!                    ▼
//!             MeasurementOracle (host layout, sync)
//!                    │
//!                    ▼
//!          Settled(size) ──► ResultCache::set
//! ```
//!
//! - **`request`** — `FitRequest` and its geometry-free `CacheKey`.
//! - **`session`** — search range, candidate and retry budget.
//! - **`cache`** — shared LRU-bounded result cache.
//! - **`controller`** — the convergence state machine.
//! - **`oracle`** / **`estimator`** — host capability contracts.
//! - **`fonts`** — the font-ready event consumed by shells.
//! - **`config`** / **`error`** — tunables and error types.

pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod estimator;
pub mod fonts;
pub mod oracle;
pub mod request;
pub mod session;

// Re-exports for ergonomic use.
pub use cache::{CacheStats, ResultCache, DEFAULT_CACHE_CAPACITY};
pub use config::{FitConfig, FloorPolicy};
pub use controller::{Begin, FitController, StepOutcome};
pub use error::{ConfigError, EstimateError, FitError};
pub use estimator::{EstimateTicket, Estimator, FixedEstimator};
pub use fonts::FontsReady;
pub use oracle::{MeasureQuery, MeasurementOracle, NoSurface, ThresholdOracle};
pub use request::{CacheKey, FitRequest};
pub use session::{FitSession, FitStatus, SearchRange};
