//! A callback recorder: installs all five lifecycle hooks on a [`Scheduler`]
//! and records every event into a shared, lock-protected log, so a test can
//! assert on ordering (`start` before `run` before `done`, `on_scheduler_done`
//! last) without writing its own bookkeeping each time.

use std::sync::{Arc, Mutex};

use dagrunner::scheduler::{RunSummary, Scheduler};

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedEvent {
    SchedulerStart { total_tasks: usize, workers: usize },
    TaskStart { name: String },
    TaskRun { name: String, worker_id: usize },
    TaskDone { name: String, ok: bool, error_type: Option<String> },
    SchedulerDone { text: String },
}

/// A handle to the shared log; clone it before calling [`Recorder::install`]
/// so the test retains access after the scheduler takes ownership of the
/// closures.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install all five callbacks on `scheduler`. Each appends one
    /// [`RecordedEvent`] to this recorder's shared log.
    pub fn install(&self, scheduler: &mut Scheduler) {
        let events = Arc::clone(&self.events);
        scheduler.on_scheduler_start(move |total_tasks, workers, _start_time| {
            events
                .lock()
                .expect("recorder poisoned")
                .push(RecordedEvent::SchedulerStart { total_tasks, workers });
        });

        let events = Arc::clone(&self.events);
        scheduler.on_task_start(move |name| {
            events
                .lock()
                .expect("recorder poisoned")
                .push(RecordedEvent::TaskStart { name: name.to_string() });
        });

        let events = Arc::clone(&self.events);
        scheduler.on_task_run(move |name, worker_id| {
            events.lock().expect("recorder poisoned").push(RecordedEvent::TaskRun {
                name: name.to_string(),
                worker_id,
            });
        });

        let events = Arc::clone(&self.events);
        scheduler.on_task_done(move |name, ok, error_type, _error| {
            events.lock().expect("recorder poisoned").push(RecordedEvent::TaskDone {
                name: name.to_string(),
                ok,
                error_type: error_type.map(str::to_string),
            });
        });

        let events = Arc::clone(&self.events);
        scheduler.on_scheduler_done(move |summary: &RunSummary| {
            events
                .lock()
                .expect("recorder poisoned")
                .push(RecordedEvent::SchedulerDone { text: summary.text() });
        });
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().expect("recorder poisoned").clone()
    }

    /// The subsequence of events belonging to a single task name, in
    /// recorded order — useful for asserting the per-task
    /// `start` -> `run` -> `done` ordering in isolation from interleavings
    /// with other tasks.
    pub fn events_for(&self, name: &str) -> Vec<RecordedEvent> {
        self.events()
            .into_iter()
            .filter(|e| match e {
                RecordedEvent::TaskStart { name: n } => n == name,
                RecordedEvent::TaskRun { name: n, .. } => n == name,
                RecordedEvent::TaskDone { name: n, .. } => n == name,
                _ => false,
            })
            .collect()
    }
}
