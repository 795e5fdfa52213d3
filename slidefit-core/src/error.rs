//! Error types for the fit engine.
//!
//! Only conditions the caller must act on are errors. Estimator failures,
//! stale estimates and oracle non-monotonicity are absorbed by the
//! controller and never surface here.

use std::path::PathBuf;
use thiserror::Error;

/// Hard failures surfaced to the caller of a fit session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    /// The host has no layout/measurement environment.
    #[error("no measurement surface available")]
    NoMeasurementSurface,
    /// The request violates its own constraints (e.g. min > max).
    #[error("invalid fit request: {0}")]
    InvalidRequest(String),
    /// `step`/`settle` was called with no session started.
    #[error("no active fit session")]
    NoSession,
}

/// Failure reported by a background estimator.
///
/// Never fatal: the controller falls back to full-range convergence.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimateError {
    #[error("estimator unavailable: {0}")]
    Unavailable(String),
    #[error("estimator task failed: {0}")]
    Failed(String),
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
