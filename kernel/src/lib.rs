//! Hypothesis IR kernel: the deterministic core of the HIR compiler.
//!
//! # API Surface
//!
//! The kernel exposes four things a caller needs to accept or reject a
//! hypothesis and derive its identity:
//!
//! - [`pds`] -- the Physical Dimension Signature algebra
//! - [`canon`] -- canonical serialization and content hashing (`hid_struct`)
//! - [`hir`] -- the HIR data model (inputs, nodes, declared output)
//! - [`checker`] -- the Admissibility Checker (structural + dimensional)
//!
//! [`graph`] holds the topological-order helper shared by the checker and
//! by `hir-codegen`'s emitter; [`error`] holds the closed error taxonomy.
//!
//! # Module Dependency Direction
//!
//! `pds` and `canon` depend on nothing internal. `hir` depends on `canon`
//! (to derive `hid_struct`). `graph` and `checker` depend on `hir` and `pds`.
//! One-way only; no cycles.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod canon;
pub mod checker;
pub mod error;
pub mod graph;
pub mod hir;
pub mod pds;
