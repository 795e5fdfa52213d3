//! Presentation shell — drives one fit session per mounted text box.
//!
//! The shell owns the controller, the host's oracle and container, and
//! the estimator task. Hosts call [`FitShell::tick`] once per frame (or
//! [`FitShell::settle`] with a [`FrameClock`]) and render the published
//! [`ShellState`].
//!
//! ```text
//!  start(request) ──► FitController::begin ──► spawn estimate task ─┐
//!                                                                   │ mpsc (ticket, result)
//!  tick() ── drain font events ── drain estimates ◄─────────────────┘
//!     │
//!     └── FitController::step(oracle) ──► watch::Sender<ShellState>
//! ```

use std::sync::Arc;

use slidefit_core::{
    Begin, EstimateError, EstimateTicket, Estimator, FitConfig, FitController, FitError,
    FitRequest, FontsReady, MeasurementOracle, ResultCache, StepOutcome,
};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::clock::FrameClock;
use crate::container::{usable_width, ContainerSource, Unmeasured};

type EstimateResult = (EstimateTicket, Result<f32, EstimateError>);

/// What the host renders.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShellState {
    /// Current candidate (converging) or final size. `None` before the
    /// first session and after unmount.
    pub font_size: Option<f32>,
    pub is_converging: bool,
    /// Near zero while converging so intermediate sizes never flash.
    pub opacity: f32,
}

impl ShellState {
    const IDLE: Self = Self {
        font_size: None,
        is_converging: false,
        opacity: 1.0,
    };
}

pub struct FitShell {
    id: Uuid,
    controller: FitController,
    oracle: Option<Box<dyn MeasurementOracle + Send>>,
    estimator: Option<Arc<dyn Estimator>>,
    container: Box<dyn ContainerSource>,
    /// Usable width carried by the last started request.
    request_width: Option<f32>,
    state_tx: watch::Sender<ShellState>,
    estimate_tx: mpsc::Sender<EstimateResult>,
    estimate_rx: mpsc::Receiver<EstimateResult>,
    estimate_task: Option<JoinHandle<()>>,
    fonts_rx: Option<broadcast::Receiver<FontsReady>>,
}

impl FitShell {
    pub fn new(config: FitConfig, cache: ResultCache) -> Self {
        let (state_tx, _) = watch::channel(ShellState::IDLE);
        let (estimate_tx, estimate_rx) = mpsc::channel(16);
        Self {
            id: Uuid::new_v4(),
            controller: FitController::new(config, cache),
            oracle: None,
            estimator: None,
            container: Box::new(Unmeasured),
            request_width: None,
            state_tx,
            estimate_tx,
            estimate_rx,
            estimate_task: None,
            fonts_rx: None,
        }
    }

    pub fn with_oracle(mut self, oracle: impl MeasurementOracle + Send + 'static) -> Self {
        self.oracle = Some(Box::new(oracle));
        self
    }

    pub fn with_estimator(mut self, estimator: Arc<dyn Estimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    pub fn with_container(mut self, container: impl ContainerSource + 'static) -> Self {
        self.container = Box::new(container);
        self
    }

    /// Refit whenever a family this shell renders with finishes loading.
    pub fn with_font_events(mut self, fonts: broadcast::Receiver<FontsReady>) -> Self {
        self.fonts_rx = Some(fonts);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn controller(&self) -> &FitController {
        &self.controller
    }

    /// Observe every published [`ShellState`].
    pub fn subscribe(&self) -> watch::Receiver<ShellState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> ShellState {
        *self.state_tx.borrow()
    }

    pub fn font_size(&self) -> Option<f32> {
        self.controller.candidate_size()
    }

    pub fn is_converging(&self) -> bool {
        self.controller.is_converging()
    }

    pub fn opacity(&self) -> f32 {
        if self.is_converging() {
            self.controller.config().converging_opacity
        } else {
            1.0
        }
    }

    /// Measured container, then the request's own width, then the
    /// configured fallback.
    fn container_width(&self) -> f32 {
        usable_width(self.container.as_ref())
            .or(self.request_width)
            .unwrap_or(self.controller.config().default_container_width)
    }

    /// Start fitting `request`. A request with the same identity as the
    /// live one keeps its session.
    ///
    /// A measured container overrides the request's container width; an
    /// unmeasured one keeps it when usable. Must be called inside a tokio runtime for the
    /// estimator to run.
    pub fn start(&mut self, mut request: FitRequest) -> Result<Begin, FitError> {
        let Some(oracle) = self.oracle.as_deref() else {
            log::warn!("[{}] FitShell: no measurement surface", self.id);
            return Err(FitError::NoMeasurementSurface);
        };
        self.request_width = Some(request.container_width).filter(|w| w.is_finite() && *w > 0.0);
        request.container_width = self.container_width();

        let begin = self.controller.begin(request, oracle)?;
        match begin {
            Begin::Converging(ticket) => {
                self.abort_estimate();
                self.spawn_estimate(ticket);
            }
            Begin::Cached(size) => {
                self.abort_estimate();
                log::debug!("[{}] FitShell: cached {size}px", self.id);
            }
            Begin::Unchanged => {}
        }
        self.publish();
        Ok(begin)
    }

    /// One frame: apply pending font and estimate events, then make at
    /// most one oracle call.
    pub fn tick(&mut self) -> StepOutcome {
        self.drain_font_events();
        self.drain_estimates();
        let width = self.container_width();
        self.controller.set_container_width(width);

        let outcome = match self.oracle.as_mut() {
            Some(oracle) => self.controller.step(oracle.as_mut()),
            None => StepOutcome::Idle,
        };
        if let StepOutcome::Settled { font_size } = outcome {
            self.abort_estimate();
            log::debug!("[{}] FitShell: settled at {font_size}px", self.id);
        }
        if !matches!(outcome, StepOutcome::Idle) {
            self.publish();
        }
        outcome
    }

    /// Tick once per frame of `clock` until the session settles.
    pub async fn settle<C: FrameClock + ?Sized>(&mut self, clock: &mut C) -> Result<f32, FitError> {
        loop {
            match self.tick() {
                StepOutcome::Continue { .. } => clock.next_frame().await,
                StepOutcome::Settled { font_size } => return Ok(font_size),
                StepOutcome::Idle => {
                    return self.controller.candidate_size().ok_or(FitError::NoSession)
                }
            }
        }
    }

    /// Stop fitting: abort the estimator and drop the session. Late
    /// estimates are never applied.
    pub fn unmount(&mut self) {
        self.abort_estimate();
        self.controller.reset();
        self.request_width = None;
        while self.estimate_rx.try_recv().is_ok() {}
        self.publish();
        log::debug!("[{}] FitShell: unmounted", self.id);
    }

    fn publish(&self) {
        let state = ShellState {
            font_size: self.font_size(),
            is_converging: self.is_converging(),
            opacity: self.opacity(),
        };
        self.state_tx.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });
    }

    fn spawn_estimate(&mut self, ticket: EstimateTicket) {
        let (Some(estimator), Some(request)) = (self.estimator.as_ref(), self.controller.request())
        else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            let error = EstimateError::Unavailable("no async runtime".into());
            self.controller.estimate_failed(ticket, &error);
            return;
        };

        let estimate = estimator.estimate(request, request.container_width);
        let tx = self.estimate_tx.clone();
        self.estimate_task = Some(runtime.spawn(async move {
            let result = estimate.await;
            // The shell may be gone; nothing to report to.
            let _ = tx.send((ticket, result)).await;
        }));
    }

    fn abort_estimate(&mut self) {
        if let Some(task) = self.estimate_task.take() {
            task.abort();
        }
    }

    fn drain_estimates(&mut self) {
        while let Ok((ticket, result)) = self.estimate_rx.try_recv() {
            match result {
                Ok(size) => {
                    if self.controller.apply_estimate(ticket, size) {
                        log::debug!("[{}] FitShell: estimate {size}px applied", self.id);
                    }
                }
                Err(e) => self.controller.estimate_failed(ticket, &e),
            }
        }
    }

    fn drain_font_events(&mut self) {
        let Some(fonts_rx) = self.fonts_rx.as_mut() else {
            return;
        };
        let mut families = Vec::new();
        loop {
            match fonts_rx.try_recv() {
                Ok(event) => families.extend(event.families),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Lagged(missed)) => {
                    log::warn!("[{}] FitShell: missed {missed} font events", self.id);
                }
                Err(TryRecvError::Closed) => {
                    self.fonts_rx = None;
                    break;
                }
            }
        }

        for family in families {
            if let Some(ticket) = self.controller.fonts_ready(&family) {
                self.abort_estimate();
                self.spawn_estimate(ticket);
                self.publish();
                break;
            }
        }
    }
}

impl Drop for FitShell {
    fn drop(&mut self) {
        self.abort_estimate();
    }
}
