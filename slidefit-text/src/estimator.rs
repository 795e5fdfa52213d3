//! Advance-based estimator — one unwrapped shaping pass instead of a
//! search.
//!
//! Advance width scales linearly with font size, so shaping the text once
//! at a reference size gives the size at which the whole text would fill
//! `container_width * max_lines`:
//!
//! ```text
//! s = floor(reference * container_width * max_lines / advance(reference))
//! ```
//!
//! Word-break positions and line height are ignored, which makes the
//! result an upper-leaning hint for the controller rather than an answer.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::future::BoxFuture;
use lru::LruCache;
use slidefit_core::{EstimateError, Estimator, FitRequest};

use crate::measure::TextMeasurer;

/// Size the reference advance is shaped at.
pub const REFERENCE_SIZE: f32 = 100.0;

const ADVANCE_MEMO_CAPACITY: usize = 512;

type AdvanceKey = (String, String);

/// Reference advances for one font generation of the shared measurer.
struct AdvanceMemo {
    generation: u64,
    advances: LruCache<AdvanceKey, f32>,
}

impl AdvanceMemo {
    /// Align the memo with the measurer's `generation`. Returns `false`
    /// when `generation` is older than what the memo already holds.
    fn sync(&mut self, generation: u64) -> bool {
        if generation > self.generation {
            if !self.advances.is_empty() {
                log::debug!(
                    "AdvanceEstimator: fonts changed, dropping {} advances",
                    self.advances.len()
                );
            }
            self.advances.clear();
            self.generation = generation;
        }
        generation == self.generation
    }
}

#[derive(Clone)]
pub struct AdvanceEstimator {
    measurer: Arc<Mutex<TextMeasurer>>,
    /// (text, family) → advance at [`REFERENCE_SIZE`], valid for the
    /// measurer's current font generation only.
    advances: Arc<Mutex<AdvanceMemo>>,
}

impl AdvanceEstimator {
    pub fn new(measurer: Arc<Mutex<TextMeasurer>>) -> Self {
        let capacity = NonZeroUsize::new(ADVANCE_MEMO_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            measurer,
            advances: Arc::new(Mutex::new(AdvanceMemo {
                generation: 0,
                advances: LruCache::new(capacity),
            })),
        }
    }

    /// Compute the estimate on the calling thread.
    pub fn estimate_blocking(
        &self,
        request: &FitRequest,
        container_width: f32,
    ) -> Result<f32, EstimateError> {
        if !container_width.is_finite() || container_width <= 0.0 {
            return Err(EstimateError::Unavailable(format!(
                "container width {container_width} is not measurable"
            )));
        }

        let advance = self.reference_advance(&request.text, &request.font_family)?;
        if advance <= 0.0 {
            return Err(EstimateError::Unavailable(format!(
                "no advance for {:?}",
                request.text
            )));
        }

        let budget = container_width * request.max_lines as f32;
        let size = (REFERENCE_SIZE * budget / advance).floor();
        let size = size.clamp(request.min_font_size, request.max_font_size);
        log::debug!(
            "AdvanceEstimator: {:?} advance {advance:.1}px @{REFERENCE_SIZE} -> {size}px",
            request.text,
        );
        Ok(size)
    }

    fn reference_advance(&self, text: &str, family: &str) -> Result<f32, EstimateError> {
        let key = (text.to_owned(), family.to_owned());
        let generation = self.lock_measurer()?.font_generation();
        {
            let mut memo = self.memo()?;
            if memo.sync(generation) {
                if let Some(advance) = memo.advances.get(&key) {
                    return Ok(*advance);
                }
            }
        }

        let (generation, advance) = {
            let mut measurer = self.lock_measurer()?;
            let advance = measurer.advance(text, REFERENCE_SIZE, family);
            (measurer.font_generation(), advance)
        };
        let mut memo = self.memo()?;
        if memo.sync(generation) {
            memo.advances.put(key, advance);
        }
        Ok(advance)
    }

    fn lock_measurer(&self) -> Result<MutexGuard<'_, TextMeasurer>, EstimateError> {
        self.measurer
            .lock()
            .map_err(|_| EstimateError::Failed("text measurer lock poisoned".into()))
    }

    fn memo(&self) -> Result<MutexGuard<'_, AdvanceMemo>, EstimateError> {
        self.advances
            .lock()
            .map_err(|_| EstimateError::Failed("advance memo lock poisoned".into()))
    }

    /// Number of memoized reference advances.
    pub fn memoized(&self) -> usize {
        self.memo().map(|m| m.advances.len()).unwrap_or(0)
    }

    /// Drop memoized advances. Loading fonts through the shared measurer
    /// already does this on the next estimate.
    pub fn forget(&self) {
        if let Ok(mut memo) = self.memo() {
            memo.advances.clear();
        }
    }
}

impl Estimator for AdvanceEstimator {
    fn estimate(
        &self,
        request: &FitRequest,
        container_width: f32,
    ) -> BoxFuture<'static, Result<f32, EstimateError>> {
        let this = self.clone();
        let request = request.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || this.estimate_blocking(&request, container_width))
                .await
                .map_err(|e| EstimateError::Failed(format!("estimator task: {e}")))?
        })
    }
}
