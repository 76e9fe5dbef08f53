//! WebAssembly code generation for the Hypothesis IR compiler.
//!
//! [`emitter`] lowers an admissible HIR graph to a pure WAT module with no
//! imports. It takes the hypothesis and its admissibility on faith: callers
//! run [`hir_kernel::checker::check`] first and only emit from a hypothesis
//! whose report is `ok`.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod emitter;

pub use emitter::{emit, WatModule};
