//! HIR Harness: the Canary Runner that executes emitted WASM on synthetic
//! data and produces an auditable receipt.
//!
//! The harness does not implement kernel or codegen logic -- it orchestrates
//! `hir-kernel` (admissibility) and `hir-codegen` (WAT emission) outputs
//! through an execution engine and summarizes the result. Workspace
//! orchestration, bundling, and remote execution are the concern of callers
//! outside this crate.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod receipt;
pub mod reference_interp;
pub mod runner;
pub mod sketch;

pub use config::RunnerConfig;
pub use receipt::CanaryReceipt;
pub use runner::run_canary;
