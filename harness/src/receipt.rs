//! The Canary Receipt: the auditable summary a canary run hands back.

use serde::{Deserialize, Serialize};

/// Summary statistics and provenance for one canary execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanaryReceipt {
    /// Behavior-sketch digest of the raw output series.
    pub hid_behav: String,
    /// Number of elements actually evaluated (`min(input length, 512)`).
    pub n: usize,
    /// Mean of the finite-valued subset of the output (`0.0` if none).
    pub mean: f64,
    /// Population standard deviation of the finite-valued subset (`0.0` if
    /// none).
    pub std: f64,
    /// Fraction of output elements that are `NaN`.
    pub nan_rate: f64,
    /// Fraction of output elements that are `+Inf`/`-Inf`.
    pub inf_rate: f64,
    /// Wall-clock execution time of the evaluation loop, in milliseconds.
    pub runtime_ms: f64,
    /// Identifier of the engine that produced this run (e.g.
    /// `"wasmtime-24.0.0"`, `"reference-interpreter"`).
    pub engine: String,
    /// Free-form notes surfaced in place of a logging side channel (engine
    /// fallback reasons, profile caveats).
    pub notes: Vec<String>,
}
