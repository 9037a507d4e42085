// src/scheduler/mod.rs

//! The task scheduler: worker pool, event queue, and the `Scheduler` itself.

mod core;
mod events;
mod pool;
mod state;
mod summary;
mod task;

pub use core::{Interrupter, Scheduler};
pub use state::State;
pub use summary::{Failure, RunSummary};
pub use task::{TaskDescriptor, TaskFn, TaskOutput, TaskValue};
