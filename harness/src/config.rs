//! Canary run configuration: override points for the runner's fixed
//! defaults.
//!
//! Mirrors the override-with-`Option<T>`-over-constants shape the rest of
//! this codebase uses for runtime policy: a caller only supplies what it
//! wants to change, and everything else falls back to a named default.

/// Canaries never evaluate more than this many elements per run, regardless
/// of how much input data is supplied.
pub const DEFAULT_MAX_CANARY_LEN: usize = 512;

/// Whether a run attempts the `wasmtime` execution path before falling back
/// to the reference interpreter.
pub const DEFAULT_USE_WASMTIME: bool = true;

/// Runtime configuration for a single canary execution.
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// Maximum number of elements to evaluate. `None` uses
    /// [`DEFAULT_MAX_CANARY_LEN`].
    pub max_canary_len: Option<usize>,
    /// Whether to attempt `wasmtime` first. `None` uses
    /// [`DEFAULT_USE_WASMTIME`]. Ignored entirely when the `wasmtime`
    /// feature is not compiled in.
    pub use_wasmtime: Option<bool>,
}

impl RunnerConfig {
    #[must_use]
    pub fn max_canary_len(&self) -> usize {
        self.max_canary_len.unwrap_or(DEFAULT_MAX_CANARY_LEN)
    }

    #[must_use]
    pub fn use_wasmtime(&self) -> bool {
        self.use_wasmtime.unwrap_or(DEFAULT_USE_WASMTIME)
    }
}
