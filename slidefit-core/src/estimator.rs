//! Background estimator contract and the ticket that guards its results.
//!
//! An estimate is only ever a hint. The controller hands out an
//! [`EstimateTicket`] when a session starts; the result is applied only if
//! the ticket still matches the live session's generation.

use futures_util::future::BoxFuture;

use crate::error::EstimateError;
use crate::request::FitRequest;

/// Produces a fast, approximate fitting size for a request.
///
/// The returned future may fail or never resolve. Callers spawn it and
/// never block on it.
pub trait Estimator: Send + Sync {
    fn estimate(
        &self,
        request: &FitRequest,
        container_width: f32,
    ) -> BoxFuture<'static, Result<f32, EstimateError>>;
}

/// Session token carried by an in-flight estimate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EstimateTicket {
    pub(crate) generation: u64,
}

impl EstimateTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Estimator that always returns the same size. Useful as a host stub
/// where a precomputed size is known.
#[derive(Clone, Copy, Debug)]
pub struct FixedEstimator(pub f32);

impl Estimator for FixedEstimator {
    fn estimate(
        &self,
        _request: &FitRequest,
        _container_width: f32,
    ) -> BoxFuture<'static, Result<f32, EstimateError>> {
        let size = self.0;
        Box::pin(async move { Ok(size) })
    }
}
