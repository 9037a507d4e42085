// src/scheduler/core.rs

//! The scheduler: owns the DAG, task table, worker pool, event queue,
//! result bookkeeping, and callback registrations. Drives the control loop.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::callbacks::Callbacks;
use crate::config::SchedulerConfig;
use crate::dag::Dag;
use crate::errors::Result;
use crate::scheduler::events::{DoneEvent, Event, EventQueue, EventSender};
use crate::scheduler::pool::WorkerPool;
use crate::scheduler::state::State;
use crate::scheduler::summary::{Failure, RunSummary};
use crate::scheduler::task::{TaskDescriptor, TaskFn, TaskValue};
use crate::timer::Timer;

/// How often the scheduler thread wakes up to check for completion between
/// event-queue drains, when nothing is immediately pending.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

struct ResultEntry {
    error_type: Option<String>,
    error: Option<String>,
}

/// A thread-safe handle for requesting cancellation of a scheduler's current
/// or next run, obtained via [`Scheduler::interrupter`].
#[derive(Clone)]
pub struct Interrupter(Arc<AtomicBool>);

impl Interrupter {
    pub fn interrupt(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Owns the DAG, task table, and per-run bookkeeping for one scheduler.
///
/// `start()` runs the control loop on the calling thread (it is itself "the
/// scheduler thread" in the spec's terms); worker OS threads run task bodies
/// concurrently and report back over an event queue.
pub struct Scheduler {
    dag: Dag,
    tasks: HashMap<String, TaskDescriptor>,
    config: SchedulerConfig,
    callbacks: Callbacks,
    state: Arc<State>,
    interrupted: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            dag: Dag::new(),
            tasks: HashMap::new(),
            config,
            callbacks: Callbacks::default(),
            state: Arc::new(State::new()),
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Register a task. Fails with a [`RegisterError`] if the name is
    /// already taken, an `after` dependency is unknown, or the insertion
    /// would create a cycle; the DAG is left unchanged in every failure
    /// case.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        after: &[&str],
        body: TaskFn,
    ) -> Result<()> {
        self.register_tagged(name, after, body, None)
    }

    /// As [`Scheduler::register`], additionally attaching a metadata tag a
    /// collaborator may filter on. Inert to the scheduling algorithm itself.
    pub fn register_tagged(
        &mut self,
        name: impl Into<String>,
        after: &[&str],
        body: TaskFn,
        tag: Option<String>,
    ) -> Result<()> {
        let name = name.into();
        let after: Vec<String> = after.iter().map(|s| s.to_string()).collect();
        self.dag.add(&name, &after)?;
        self.tasks.insert(
            name.clone(),
            TaskDescriptor {
                name,
                after,
                tag,
                body,
            },
        );
        Ok(())
    }

    pub fn on_task_start(&mut self, cb: impl FnMut(&str) + 'static) {
        self.callbacks.on_task_start = Some(Box::new(cb));
    }

    pub fn on_task_run(&mut self, cb: impl FnMut(&str, usize) + 'static) {
        self.callbacks.on_task_run = Some(Box::new(cb));
    }

    pub fn on_task_done(
        &mut self,
        cb: impl FnMut(&str, bool, Option<&str>, Option<&str>) + 'static,
    ) {
        self.callbacks.on_task_done = Some(Box::new(cb));
    }

    pub fn on_scheduler_start(&mut self, cb: impl FnMut(usize, usize, f64) + 'static) {
        self.callbacks.on_scheduler_start = Some(Box::new(cb));
    }

    pub fn on_scheduler_done(&mut self, cb: impl FnMut(&RunSummary) + 'static) {
        self.callbacks.on_scheduler_done = Some(Box::new(cb));
    }

    /// A cloneable, `Send + Sync` handle that can request cancellation of
    /// this scheduler's run from any thread, including while `start()` is
    /// blocking on another thread.
    pub fn interrupter(&self) -> Interrupter {
        Interrupter(Arc::clone(&self.interrupted))
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn graph(&self) -> &Dag {
        &self.dag
    }

    /// Run every registered task to completion, or until interrupted.
    /// Returns the run summary. Blocks the calling thread for the duration
    /// of the run: this call *is* the scheduler thread.
    pub fn start(&mut self) -> RunSummary {
        self.interrupted.store(false, Ordering::SeqCst);
        if self.config.clear_results_on_start {
            self.state.clear_results();
        }

        let total_tasks = self.tasks.len();
        let workers = self.config.workers;

        let mut timer = Timer::new();
        timer.start();
        self.callbacks
            .scheduler_start(total_tasks, workers, timer.started_at());
        info!(total_tasks, workers, "scheduler: starting run");

        let events = EventQueue::new();
        let pool = WorkerPool::new(workers);

        let mut active: HashSet<String> = HashSet::new();
        let mut ran: Vec<String> = Vec::new();
        let mut results: HashMap<String, ResultEntry> = HashMap::new();
        let mut failed: Vec<String> = Vec::new();
        let mut skipped: Vec<String> = Vec::new();

        self.seed_or_refill(
            &events, &pool, &mut active, &mut results, &mut failed, &mut skipped, workers,
        );

        loop {
            let batch = events.drain();
            if batch.is_empty() {
                if self.dag.is_empty() && active.is_empty() {
                    break;
                }
                if self.interrupted.load(Ordering::SeqCst) {
                    break;
                }
                thread::sleep(POLL_INTERVAL);
                continue;
            }

            for event in batch {
                self.dispatch_event(event, &mut active, &mut ran, &mut results, &mut failed);
            }

            if self.dag.is_empty() && active.is_empty() {
                break;
            }
            if self.interrupted.load(Ordering::SeqCst) {
                break;
            }

            if active.len() < workers {
                self.seed_or_refill(
                    &events, &pool, &mut active, &mut results, &mut failed, &mut skipped, workers,
                );
            }
        }

        if self.interrupted.load(Ordering::SeqCst) {
            self.handle_interrupt(&events, &mut active, &mut ran, &mut results, &mut failed);
            pool.shutdown_detached();
        } else {
            pool.shutdown();
        }

        timer.stop();
        let summary = self.build_summary(ran, results, failed, skipped, &timer);
        self.callbacks.scheduler_done(&summary);
        info!(text = %summary.text(), "scheduler: run finished");
        summary
    }

    /// Fill up to `capacity` free worker slots with ready candidates,
    /// applying the skip-on-failed-dependency policy first. Skips cascade:
    /// removing a skipped node from the DAG can make further descendants
    /// ready (or themselves skippable), so this loops until neither
    /// submitting nor skipping makes further progress.
    #[allow(clippy::too_many_arguments)]
    fn seed_or_refill(
        &mut self,
        events: &EventQueue,
        pool: &WorkerPool,
        active: &mut HashSet<String>,
        results: &mut HashMap<String, ResultEntry>,
        failed: &mut Vec<String>,
        skipped: &mut Vec<String>,
        capacity: usize,
    ) {
        loop {
            let free = capacity.saturating_sub(active.len());
            if free == 0 {
                return;
            }

            let candidates = self.dag.get_candidates(active, free, true);
            if candidates.is_empty() {
                return;
            }

            // A candidate is skipped if any original parent didn't complete
            // with ok=true — whether it actually failed or was itself
            // skipped. Checking only `failed` would stop the cascade dead at
            // the first skipped ancestor instead of propagating it through
            // the rest of that ancestor's descendants.
            let not_ok: HashSet<String> = failed.iter().chain(skipped.iter()).cloned().collect();
            let mut made_progress = false;

            for name in candidates {
                let skip = self.config.skip_dependents
                    && self
                        .dag
                        .original_parents_of(&name)
                        .iter()
                        .any(|p| not_ok.contains(p.as_str()));

                if skip {
                    self.record_skip(&name, skipped, results);
                    made_progress = true;
                } else {
                    active.insert(name.clone());
                    self.submit(name, events.sender(), pool);
                    made_progress = true;
                }
            }

            if !made_progress {
                return;
            }
            // Loop again: a skip may have freed up descendants that are now
            // ready, or a just-submitted slot may have left more capacity
            // than candidates returned this pass.
        }
    }

    fn submit(&self, name: String, events: EventSender, pool: &WorkerPool) {
        events.send(Event::Start { name: name.clone() });

        let descriptor = self
            .tasks
            .get(&name)
            .expect("a candidate name is always a registered task");
        let body = descriptor.body.clone();
        let state = Arc::clone(&self.state);
        let task_name = name;

        pool.submit(move |worker_id| {
            events.send(Event::Run {
                name: task_name.clone(),
                worker_id,
            });

            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                body.call(&state)
            }));

            let (ok, error_type, error, value) = match outcome {
                Ok(Ok(value)) => (true, None, None, Some(value)),
                Ok(Err(message)) => (false, Some("TaskError".to_string()), Some(message), None),
                Err(payload) => {
                    let message = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "task panicked".to_string());
                    (false, Some("PanicError".to_string()), Some(message), None)
                }
            };

            events.send(Event::Done(DoneEvent {
                name: task_name,
                ok,
                error_type,
                error,
                value,
            }));
        });
    }

    fn dispatch_event(
        &mut self,
        event: Event,
        active: &mut HashSet<String>,
        ran: &mut Vec<String>,
        results: &mut HashMap<String, ResultEntry>,
        failed: &mut Vec<String>,
    ) {
        match event {
            Event::Start { name } => self.callbacks.task_start(&name),
            Event::Run { name, worker_id } => self.callbacks.task_run(&name, worker_id),
            Event::Done(done) => self.record_completion(done, active, ran, results, failed),
        }
    }

    /// The event-dispatcher's `done` handling (§4.3): remove from `active`,
    /// remove from the DAG, append to `ran`, record the result, append to
    /// `failed` if it failed, store the return value if applicable, and
    /// invoke `on_task_done`.
    fn record_completion(
        &mut self,
        done: DoneEvent,
        active: &mut HashSet<String>,
        ran: &mut Vec<String>,
        results: &mut HashMap<String, ResultEntry>,
        failed: &mut Vec<String>,
    ) {
        let DoneEvent {
            name,
            ok,
            error_type,
            error,
            value,
        } = done;

        active.remove(&name);
        self.dag.remove(&name);
        ran.push(name.clone());
        if !ok {
            failed.push(name.clone());
        }

        self.maybe_store_result(&name, ok, value);

        self.callbacks
            .task_done(&name, ok, error_type.as_deref(), error.as_deref());
        results.insert(name, ResultEntry { error_type, error });
    }

    /// Skip-on-failed-dependency: the candidate never runs. It is removed
    /// from the DAG immediately (so its own descendants can be evaluated in
    /// the same pass) and recorded with a synthetic `SkippedDependency`
    /// result. Deliberately kept out of `ran`/`failed` — those track tasks
    /// that were actually submitted, per the end-to-end scenarios in §8.
    fn record_skip(
        &mut self,
        name: &str,
        skipped: &mut Vec<String>,
        results: &mut HashMap<String, ResultEntry>,
    ) {
        self.dag.remove(name);
        skipped.push(name.to_string());

        let error = format!("one or more dependencies of '{name}' failed");
        self.callbacks
            .task_done(name, false, Some("SkippedDependency"), Some(error.as_str()));
        results.insert(
            name.to_string(),
            ResultEntry {
                error_type: Some("SkippedDependency".to_string()),
                error: Some(error),
            },
        );
    }

    fn maybe_store_result(&self, name: &str, ok: bool, value: Option<TaskValue>) {
        if !ok || !self.config.store_results {
            return;
        }
        let Some(value) = value else { return };
        let Some(descriptor) = self.tasks.get(name) else {
            return;
        };
        if descriptor.body.pass_state() {
            self.state.set_result(name, value);
        }
    }

    /// Cancellation (§4.4). Drains whatever is already queued (so a real
    /// `done` that fired just before shutdown is processed normally) before
    /// synthesizing `CancelledError` entries for anything left `active`.
    /// Anything that arrives after this point has nowhere left to land: the
    /// event queue's receiver is dropped along with this `start()` call, so
    /// the synthetic entry is never retroactively overwritten.
    fn handle_interrupt(
        &mut self,
        events: &EventQueue,
        active: &mut HashSet<String>,
        ran: &mut Vec<String>,
        results: &mut HashMap<String, ResultEntry>,
        failed: &mut Vec<String>,
    ) {
        warn!(pending = active.len(), "scheduler: run interrupted");

        for event in events.drain() {
            self.dispatch_event(event, active, ran, results, failed);
        }

        let still_active: Vec<String> = active.iter().cloned().collect();
        for name in still_active {
            debug!(task = %name, "synthesizing cancellation result");
            self.record_completion(
                DoneEvent {
                    name: name.clone(),
                    ok: false,
                    error_type: Some("CancelledError".to_string()),
                    error: Some("cancelled".to_string()),
                    value: None,
                },
                active,
                ran,
                results,
                failed,
            );
        }
    }

    fn build_summary(
        &self,
        ran: Vec<String>,
        results: HashMap<String, ResultEntry>,
        failed: Vec<String>,
        skipped: Vec<String>,
        timer: &Timer,
    ) -> RunSummary {
        let passed: Vec<String> = ran.iter().filter(|n| !failed.contains(n)).cloned().collect();

        let mut failures: HashMap<String, Failure> = HashMap::new();
        let mut failure_counts: HashMap<String, usize> = HashMap::new();
        for name in failed.iter().chain(skipped.iter()) {
            if let Some(entry) = results.get(name) {
                *failure_counts
                    .entry(entry.error_type.clone().unwrap_or_default())
                    .or_insert(0) += 1;
            }
        }
        for name in &failed {
            if let Some(entry) = results.get(name) {
                failures.insert(name.clone(), entry.clone_failure());
            }
        }

        RunSummary {
            ran,
            passed,
            failed,
            failures,
            failure_counts,
            skipped,
            started_at: timer.started_at(),
            finished_at: timer.finished_at(),
            duration: timer.duration(),
        }
    }
}

impl ResultEntry {
    fn clone_failure(&self) -> Failure {
        Failure {
            error_type: self.error_type.clone().unwrap_or_default(),
            error: self.error.clone().unwrap_or_default(),
        }
    }
}
