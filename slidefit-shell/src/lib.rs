//! # slidefit-shell — Presentation shell for auto-fit text
//!
//! Runs fit sessions on a tokio runtime: one oracle call per frame, an
//! optional background estimate, and refits when fonts load.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  begin/step   ┌───────────────┐
//! │  FitShell    │ ─────────────► │ FitController │ ◄──► ResultCache (shared)
//! │  (per box)   │                └───────────────┘
//! └──┬────┬───┬──┘
//!    │    │   └── watch::Sender<ShellState> ──► host renderer
//!    │    └────── mpsc ◄── estimate task (aborted on restart/unmount)
//!    └─────────── broadcast::Receiver<FontsReady>
//! ```
//!
//! ## Modules
//!
//! - [`shell`] — `FitShell` and its published `ShellState`
//! - [`clock`] — frame pacing (`IntervalClock`, `YieldClock`)
//! - [`container`] — container width sources

pub mod clock;
pub mod container;
pub mod shell;

// Re-exports for convenience
pub use clock::{frame_clock, FrameClock, IntervalClock, YieldClock};
pub use container::{ContainerSource, FixedWidth, Unmeasured};
pub use shell::{FitShell, ShellState};
