// src/scheduler/state.rs

//! The shared, thread-safe mapping handed to `pass_state` tasks.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::scheduler::task::TaskValue;

/// The run-scoped mapping passed by reference to every `pass_state` task.
///
/// Values are type-erased (`Box<dyn Any + Send>`), mirroring the source's
/// untyped dict; callers `set`/`get` with the type they know they stored.
/// `results` is a separate sub-mapping populated by the scheduler itself
/// (never directly by tasks) when `store_results` is enabled.
///
/// `state_lock` stands in for the reserved `_state_lock` entry described in
/// the spec: a mutex the scheduler places before `start()` so that tasks
/// coordinating multi-step updates across `values` have a single place to
/// synchronize, beyond the per-access locking `values`/`results` already do
/// on their own.
#[derive(Default)]
pub struct State {
    values: Mutex<HashMap<String, TaskValue>>,
    results: Mutex<HashMap<String, TaskValue>>,
    state_lock: Mutex<()>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// The reserved coordination mutex (`_state_lock` in the source).
    pub fn state_lock(&self) -> &Mutex<()> {
        &self.state_lock
    }

    pub fn set<T: Any + Send>(&self, key: &str, value: T) {
        self.values
            .lock()
            .expect("state mutex poisoned")
            .insert(key.to_string(), Box::new(value));
    }

    pub fn get<T: Any + Send + Clone>(&self, key: &str) -> Option<T> {
        self.values
            .lock()
            .expect("state mutex poisoned")
            .get(key)
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.lock().expect("state mutex poisoned").contains_key(key)
    }

    pub(crate) fn set_result(&self, name: &str, value: TaskValue) {
        self.results
            .lock()
            .expect("state mutex poisoned")
            .insert(name.to_string(), value);
    }

    pub fn result<T: Any + Send + Clone>(&self, name: &str) -> Option<T> {
        self.results
            .lock()
            .expect("state mutex poisoned")
            .get(name)
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    pub(crate) fn clear_results(&self) {
        self.results.lock().expect("state mutex poisoned").clear();
    }
}
