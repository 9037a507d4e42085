// src/errors.rs

//! Crate-wide error types.
//!
//! Registration errors are the only failures that cross the public API
//! synchronously (task failures, cancellations and skips are recorded in the
//! run summary instead, never returned as `Err`). Internal plumbing that
//! can't fail in a way callers need typed access to uses `anyhow`.

use thiserror::Error;

/// Errors returned synchronously from [`crate::scheduler::Scheduler::register`].
///
/// The DAG is left unchanged when any of these is returned; cycle rollback is
/// atomic (see [`crate::dag::Dag::add`]).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    #[error("task '{0}' has already been added")]
    AlreadyAdded(String),

    #[error("task '{name}' depends on unknown task(s): {unknown:?}")]
    UnknownDependency { name: String, unknown: Vec<String> },

    #[error("adding '{0}' would create a cycle")]
    WouldCreateCycle(String),
}

pub type Result<T> = std::result::Result<T, RegisterError>;
