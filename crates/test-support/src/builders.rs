//! Small constructors for the task shapes integration tests need repeatedly:
//! an always-succeeding task, an always-failing one, one that panics, one
//! that records its own name into a shared log, and a stateful task that
//! hands back a typed value for `store_results` assertions.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use dagrunner::scheduler::{State, TaskFn, TaskOutput};

/// Succeeds immediately, returning `()`.
pub fn ok_task() -> TaskFn {
    TaskFn::Nullary(Arc::new(|| Ok(Box::new(()))))
}

/// Fails immediately with `message`.
pub fn failing_task(message: impl Into<String>) -> TaskFn {
    let message = message.into();
    TaskFn::Nullary(Arc::new(move || Err(message.clone())))
}

/// Panics immediately with `message`, exercising the worker's
/// `catch_unwind` path.
pub fn panicking_task(message: impl Into<String>) -> TaskFn {
    let message = message.into();
    TaskFn::Nullary(Arc::new(move || panic!("{message}")))
}

/// Sleeps for `duration`, then succeeds. Useful for asserting on active-set
/// bounds or burst/refill timing.
pub fn sleepy_task(duration: Duration) -> TaskFn {
    TaskFn::Nullary(Arc::new(move || {
        std::thread::sleep(duration);
        Ok(Box::new(()))
    }))
}

/// Appends `name` to `log` (under its mutex) and succeeds. The log's final
/// contents are the completion order actually observed by worker threads,
/// independent of the scheduler's own `ran` bookkeeping — useful for
/// cross-checking the two never disagree.
pub fn recording_task(log: Arc<Mutex<Vec<String>>>, name: impl Into<String>) -> TaskFn {
    let name = name.into();
    TaskFn::Nullary(Arc::new(move || {
        log.lock().expect("recording log poisoned").push(name.clone());
        Ok(Box::new(()))
    }))
}

/// A stateful task that ignores `state` and returns a fixed, clonable value
/// — the common case for asserting `state.results[name]` after a run with
/// `store_results` enabled.
pub fn stateful_value_task<T>(value: T) -> TaskFn
where
    T: Clone + Send + 'static,
{
    TaskFn::Stateful(Arc::new(move |_state: &State| -> TaskOutput {
        Ok(Box::new(value.clone()))
    }))
}

/// A stateful task whose body is supplied as a closure over `&State`,
/// returning whatever `compute` produces — for scenarios like E6 where a
/// later task's output depends on reading an earlier task's recorded
/// result via [`State::result`].
pub fn stateful_task_reading<F, T>(compute: F) -> TaskFn
where
    F: Fn(&State) -> T + Send + Sync + 'static,
    T: Send + 'static,
{
    TaskFn::Stateful(Arc::new(move |state: &State| -> TaskOutput {
        Ok(Box::new(compute(state)))
    }))
}
