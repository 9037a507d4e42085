// src/dag/mod.rs

//! The dependency graph: incremental construction, cycle detection, and
//! ready-set computation. See [`graph::Dag`] for the full contract.

pub mod graph;

pub use graph::Dag;
