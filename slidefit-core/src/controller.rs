//! Fit controller — binary search for the largest non-overflowing size.
//!
//! ## State machine
//!
//! ```text
//!            begin (cache miss)          step: range exhausted / ceiling
//!   (none) ───────────────────► Converging ─────────────────────────► Settled
//!     │                           ▲    │ ▲                               │
//!     │ begin (cache hit)         │    │ └─ apply_estimate (reseed)      │
//!     └───────────────────────────┼────┼─────────────────────────────► Settled
//!                                 └────┴──────── fonts_ready ◄───────────┘
//! ```
//!
//! Each [`FitController::step`] makes exactly one oracle call. Every step
//! that does not settle strictly shrinks the search range, so the loop
//! terminates on its own; the retry ceiling only bounds the damage a
//! non-monotonic oracle can do.

use crate::cache::ResultCache;
use crate::config::{FitConfig, FloorPolicy};
use crate::error::{EstimateError, FitError};
use crate::estimator::EstimateTicket;
use crate::oracle::{MeasureQuery, MeasurementOracle};
use crate::request::FitRequest;
use crate::session::{FitSession, FitStatus, SearchRange};

/// Result of starting (or restarting) a session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Begin {
    /// Cache hit; the session is settled and no oracle call is needed.
    Cached(f32),
    /// Fresh session. The ticket authorises one estimate for it.
    Converging(EstimateTicket),
    /// Same request identity as the live session; nothing restarted.
    Unchanged,
}

/// Result of one convergence step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepOutcome {
    /// Still converging; render at `candidate_size` next frame.
    Continue { candidate_size: f32 },
    /// Reached a final size this step.
    Settled { font_size: f32 },
    /// No session, or the session was already settled.
    Idle,
}

/// Decision derived from one measurement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Next {
    Probe { candidate: f32, range: SearchRange },
    Settle(f32),
}

/// Decide the next candidate given whether the current one overflowed.
///
/// `floor` is the request's `min_font_size`. Under
/// [`FloorPolicy::ProbeFloor`] a range whose lower bound sits above the
/// floor was raised there by a fitting probe, so `range.min - 1` is known
/// to fit.
pub(crate) fn next_step(
    session: &FitSession,
    overflowing: bool,
    policy: FloorPolicy,
    floor: f32,
) -> Next {
    let candidate = session.candidate_size;
    let range = session.range;

    if overflowing {
        let new_max = candidate - 1.0;
        if new_max <= range.min {
            return match policy {
                FloorPolicy::KeepLastCandidate => Next::Settle(candidate),
                FloorPolicy::ProbeFloor if candidate > range.min => Next::Probe {
                    candidate: range.min,
                    range: SearchRange::new(range.min, range.min),
                },
                FloorPolicy::ProbeFloor if range.min > floor => Next::Settle(range.min - 1.0),
                FloorPolicy::ProbeFloor => Next::Settle(range.min),
            };
        }
        let next = ((range.min + new_max) / 2.0).floor().clamp(range.min, new_max);
        Next::Probe {
            candidate: next,
            range: SearchRange::new(range.min, new_max),
        }
    } else {
        let new_min = candidate + 1.0;
        if new_min > range.max {
            return Next::Settle(candidate);
        }
        let next = ((new_min + range.max) / 2.0).ceil().clamp(new_min, range.max);
        if next == candidate {
            return Next::Settle(candidate);
        }
        Next::Probe {
            candidate: next,
            range: SearchRange::new(new_min, range.max),
        }
    }
}

/// Owns one shell's request, session and estimate generation.
pub struct FitController {
    config: FitConfig,
    cache: ResultCache,
    request: Option<FitRequest>,
    session: Option<FitSession>,
    /// Bumped whenever the live session is replaced or invalidated.
    generation: u64,
    /// Whether the current generation still accepts an estimate.
    estimate_open: bool,
    oracle_calls: u64,
}

impl FitController {
    pub fn new(config: FitConfig, cache: ResultCache) -> Self {
        Self {
            config,
            cache,
            request: None,
            session: None,
            generation: 0,
            estimate_open: false,
            oracle_calls: 0,
        }
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn request(&self) -> Option<&FitRequest> {
        self.request.as_ref()
    }

    pub fn session(&self) -> Option<&FitSession> {
        self.session.as_ref()
    }

    pub fn candidate_size(&self) -> Option<f32> {
        self.session.as_ref().map(|s| s.candidate_size)
    }

    pub fn status(&self) -> Option<FitStatus> {
        self.session.as_ref().map(|s| s.status)
    }

    pub fn is_converging(&self) -> bool {
        self.session.as_ref().is_some_and(FitSession::is_converging)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Total oracle calls made by this controller.
    pub fn oracle_calls(&self) -> u64 {
        self.oracle_calls
    }

    fn ticket(&self) -> EstimateTicket {
        EstimateTicket {
            generation: self.generation,
        }
    }

    /// Start a session for `request`, or keep the live one if the request
    /// identity is unchanged.
    ///
    /// Fails fast if the request is invalid or the oracle has no surface;
    /// no oracle call is made in either case.
    pub fn begin(
        &mut self,
        request: FitRequest,
        oracle: &dyn MeasurementOracle,
    ) -> Result<Begin, FitError> {
        request.validate()?;
        if !oracle.surface_ready() {
            return Err(FitError::NoMeasurementSurface);
        }

        if let Some(current) = self.request.as_mut() {
            if current.same_identity(&request) && self.session.is_some() {
                current.container_width = request.container_width;
                return Ok(Begin::Unchanged);
            }
        }

        self.generation += 1;
        let key = request.cache_key();
        let (min, max) = (request.min_font_size, request.max_font_size);

        let begin = match self.cache.get(&key) {
            Some(size) => {
                let size = size.clamp(min, max);
                log::debug!("FitController: cache hit {:?} -> {size}px", request.text);
                self.session = Some(FitSession::settled_at(min, max, size));
                self.estimate_open = false;
                Begin::Cached(size)
            }
            None => {
                log::debug!(
                    "FitController: converging {:?} in [{min}, {max}] (gen {})",
                    request.text,
                    self.generation,
                );
                self.session = Some(FitSession::full_range(min, max));
                self.estimate_open = true;
                Begin::Converging(self.ticket())
            }
        };
        self.request = Some(request);
        Ok(begin)
    }

    /// Update the width measurements wrap at without restarting.
    pub fn set_container_width(&mut self, width: f32) {
        if let Some(request) = self.request.as_mut() {
            request.container_width = width;
        }
    }

    /// Run one convergence step: one oracle call, one range update.
    pub fn step(&mut self, oracle: &mut dyn MeasurementOracle) -> StepOutcome {
        let (Some(request), Some(session)) = (self.request.as_ref(), self.session.as_mut()) else {
            return StepOutcome::Idle;
        };
        if !session.is_converging() {
            return StepOutcome::Idle;
        }

        if session.retries > self.config.retry_ceiling {
            log::debug!(
                "FitController: retry ceiling hit for {:?}, accepting {}px",
                request.text,
                session.candidate_size,
            );
            let size = session.candidate_size;
            settle(&self.cache, request, session, size);
            return StepOutcome::Settled { font_size: size };
        }

        let candidate = session.candidate_size;
        let max_height = (candidate * request.line_height * request.max_lines as f32).floor()
            + self.config.height_slack;
        let query = MeasureQuery {
            text: &request.text,
            font_size: candidate,
            font_family: &request.font_family,
            line_height: request.line_height,
            box_width: request.container_width,
            max_height,
        };
        let overflowing = oracle.overflows(&query);
        self.oracle_calls += 1;
        log::trace!("FitController: {candidate}px overflow={overflowing} range={:?}", session.range);

        match next_step(session, overflowing, self.config.floor_policy, request.min_font_size) {
            Next::Probe { candidate, range } => {
                session.candidate_size = candidate;
                session.range = range;
                session.retries += 1;
                StepOutcome::Continue {
                    candidate_size: candidate,
                }
            }
            Next::Settle(size) => {
                settle(&self.cache, request, session, size);
                StepOutcome::Settled { font_size: size }
            }
        }
    }

    /// Step until settled. Bounded by the retry ceiling.
    pub fn run_to_settle(&mut self, oracle: &mut dyn MeasurementOracle) -> Result<f32, FitError> {
        loop {
            match self.step(oracle) {
                StepOutcome::Continue { .. } => continue,
                StepOutcome::Settled { font_size } => return Ok(font_size),
                StepOutcome::Idle => return self.candidate_size().ok_or(FitError::NoSession),
            }
        }
    }

    /// Apply an estimate if `ticket` still names the live, converging
    /// session. Returns whether it was applied.
    ///
    /// Narrows the range to `[min_font_size, estimate + margin]` and
    /// reseeds the candidate. Retries are not reset.
    pub fn apply_estimate(&mut self, ticket: EstimateTicket, estimate: f32) -> bool {
        if ticket.generation != self.generation || !self.estimate_open {
            log::debug!(
                "FitController: dropping stale estimate (gen {} != {})",
                ticket.generation,
                self.generation,
            );
            return false;
        }
        self.estimate_open = false;

        let (Some(request), Some(session)) = (self.request.as_ref(), self.session.as_mut()) else {
            return false;
        };
        if !session.is_converging() {
            log::debug!("FitController: session already settled, estimate discarded");
            return false;
        }
        if !estimate.is_finite() {
            log::debug!("FitController: non-finite estimate {estimate} ignored");
            return false;
        }

        let min = request.min_font_size;
        let max = (estimate + self.config.estimate_margin)
            .min(request.max_font_size)
            .max(min);
        session.range = SearchRange::new(min, max);
        session.candidate_size = session.range.clamp(estimate);
        session.status = FitStatus::Converging;
        log::debug!(
            "FitController: estimate {estimate}px narrowed {:?} to {:?}",
            request.text,
            session.range,
        );
        true
    }

    /// Record that the estimate for `ticket` failed. The session carries
    /// on over its current range.
    pub fn estimate_failed(&mut self, ticket: EstimateTicket, error: &EstimateError) {
        if ticket.generation == self.generation {
            self.estimate_open = false;
        }
        log::debug!("FitController: estimate unavailable ({error}), using full range");
    }

    /// Invalidate the session if it renders with `family`, which has just
    /// finished loading. Returns a ticket for a fresh estimate when the
    /// session was restarted.
    ///
    /// The stale cache entry is dropped so the re-converged size is
    /// recorded on settle.
    pub fn fonts_ready(&mut self, family: &str) -> Option<EstimateTicket> {
        let request = self.request.as_ref()?;
        if self.session.is_none() || !request.uses_family(family) {
            return None;
        }
        self.cache.remove(&request.cache_key());
        self.session = Some(FitSession::full_range(
            request.min_font_size,
            request.max_font_size,
        ));
        self.generation += 1;
        self.estimate_open = true;
        log::info!(
            "FitController: font {family:?} loaded, refitting {:?} from {}px",
            request.text,
            request.max_font_size,
        );
        Some(self.ticket())
    }

    /// Drop the session (unmount). Outstanding tickets become stale.
    pub fn reset(&mut self) {
        self.request = None;
        self.session = None;
        self.generation += 1;
        self.estimate_open = false;
    }
}

fn settle(cache: &ResultCache, request: &FitRequest, session: &mut FitSession, size: f32) {
    session.candidate_size = size;
    session.status = FitStatus::Settled;
    let key = request.cache_key();
    if !cache.contains(&key) {
        cache.set(key, size);
    }
    log::debug!(
        "FitController: settled {:?} at {size}px after {} retries",
        request.text,
        session.retries,
    );
}
