//! Per-shell search state: the candidate, its range and retry budget.

/// Closed interval of font sizes still worth trying. Always `min <= max`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchRange {
    pub min: f32,
    pub max: f32,
}

impl SearchRange {
    pub fn new(min: f32, max: f32) -> Self {
        debug_assert!(min <= max, "SearchRange min {min} > max {max}");
        Self { min, max }
    }

    pub fn width(&self) -> f32 {
        self.max - self.min
    }

    pub fn contains(&self, size: f32) -> bool {
        size >= self.min && size <= self.max
    }

    pub fn clamp(&self, size: f32) -> f32 {
        size.clamp(self.min, self.max)
    }
}

/// Session status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FitStatus {
    Converging,
    /// Terminal until the request identity changes or fonts reload.
    Settled,
}

/// Mutable search state owned by the controller, one per shell.
#[derive(Clone, Debug, PartialEq)]
pub struct FitSession {
    pub candidate_size: f32,
    pub range: SearchRange,
    pub retries: u32,
    pub status: FitStatus,
}

impl FitSession {
    /// Full-range session starting from `max`.
    pub fn full_range(min: f32, max: f32) -> Self {
        Self {
            candidate_size: max,
            range: SearchRange::new(min, max),
            retries: 0,
            status: FitStatus::Converging,
        }
    }

    /// Session that is already settled at `size` (cache hit).
    pub fn settled_at(min: f32, max: f32, size: f32) -> Self {
        Self {
            candidate_size: size,
            range: SearchRange::new(min, max),
            retries: 0,
            status: FitStatus::Settled,
        }
    }

    pub fn is_converging(&self) -> bool {
        self.status == FitStatus::Converging
    }
}
