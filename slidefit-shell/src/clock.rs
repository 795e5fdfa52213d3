//! Frame clocks — what a shell waits on between convergence steps.

use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Paces convergence steps, one step per frame.
pub trait FrameClock: Send {
    fn next_frame(&mut self) -> BoxFuture<'_, ()>;
}

/// Fixed-rate frames (display refresh stand-in).
///
/// Late frames are skipped rather than bunched up.
pub struct IntervalClock {
    interval: Interval,
}

impl IntervalClock {
    /// Must be called inside a tokio runtime. Zero periods are raised to
    /// 1ms.
    pub fn new(period: Duration) -> Self {
        let mut interval = interval(period.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

impl FrameClock for IntervalClock {
    fn next_frame(&mut self) -> BoxFuture<'_, ()> {
        self.interval.tick().map(|_| ()).boxed()
    }
}

/// Yields to the scheduler between frames without waiting. For headless
/// hosts and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct YieldClock;

impl FrameClock for YieldClock {
    fn next_frame(&mut self) -> BoxFuture<'_, ()> {
        tokio::task::yield_now().boxed()
    }
}

/// Clock for a configured frame interval: [`YieldClock`] for 0ms,
/// [`IntervalClock`] otherwise.
pub fn frame_clock(frame_interval_ms: u64) -> Box<dyn FrameClock> {
    if frame_interval_ms == 0 {
        Box::new(YieldClock)
    } else {
        Box::new(IntervalClock::from_millis(frame_interval_ms))
    }
}

impl<C: FrameClock + ?Sized> FrameClock for Box<C> {
    fn next_frame(&mut self) -> BoxFuture<'_, ()> {
        (**self).next_frame()
    }
}
