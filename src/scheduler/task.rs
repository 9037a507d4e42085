// src/scheduler/task.rs

//! Task descriptors and the callable shapes a registered task may take.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::scheduler::state::State;

/// Type-erased task output, stashed into `state.results[name]` when
/// `store_results` is enabled.
pub type TaskValue = Box<dyn Any + Send>;

/// What a task body returns: either a (possibly unit) value, or an error
/// message captured as a task failure rather than propagated.
pub type TaskOutput = Result<TaskValue, String>;

/// A registered task body, chosen once at registration time rather than
/// branched on by introspection at call time.
///
/// Bodies are `Arc`-wrapped rather than `Box`-wrapped so a single submission
/// can cheaply clone out an owned, `'static` handle to hand to a worker
/// thread without needing unique ownership of the whole task table for the
/// duration of the run.
#[derive(Clone)]
pub enum TaskFn {
    /// Takes no arguments.
    Nullary(Arc<dyn Fn() -> TaskOutput + Send + Sync>),
    /// Takes a reference to the run's shared [`State`].
    Stateful(Arc<dyn Fn(&State) -> TaskOutput + Send + Sync>),
}

impl fmt::Debug for TaskFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskFn::Nullary(_) => f.write_str("TaskFn::Nullary(..)"),
            TaskFn::Stateful(_) => f.write_str("TaskFn::Stateful(..)"),
        }
    }
}

impl TaskFn {
    pub fn pass_state(&self) -> bool {
        matches!(self, TaskFn::Stateful(_))
    }

    pub fn call(&self, state: &State) -> TaskOutput {
        match self {
            TaskFn::Nullary(f) => f(),
            TaskFn::Stateful(f) => f(state),
        }
    }
}

/// A registered task: its name, callable, and optional metadata tag.
///
/// `tag` is inert to the core's own scheduling logic; it exists purely so a
/// collaborator (e.g. a CLI filtering by `--tags`) can select a subset of
/// registered tasks before calling `start`.
#[derive(Clone)]
pub struct TaskDescriptor {
    pub name: String,
    pub after: Vec<String>,
    pub tag: Option<String>,
    pub body: TaskFn,
}

impl fmt::Debug for TaskDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDescriptor")
            .field("name", &self.name)
            .field("after", &self.after)
            .field("tag", &self.tag)
            .field("body", &self.body)
            .finish()
    }
}
