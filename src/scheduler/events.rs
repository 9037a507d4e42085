// src/scheduler/events.rs

//! The lifecycle event queue draining on the scheduler thread.

use std::sync::mpsc;

use crate::scheduler::task::TaskValue;

/// Outcome of a finished task, carried by a `Done` event.
pub struct DoneEvent {
    pub name: String,
    pub ok: bool,
    pub error_type: Option<String>,
    pub error: Option<String>,
    /// The task's return value, present only when it succeeded and the
    /// caller asked for `pass_state` + `store_results`.
    pub value: Option<TaskValue>,
}

/// A single lifecycle event, emitted in `start` -> `run` -> `done` order for
/// any one task.
pub enum Event {
    Start { name: String },
    Run { name: String, worker_id: usize },
    Done(DoneEvent),
}

/// Multi-producer/single-consumer queue of lifecycle events.
///
/// Workers hold a [`EventSender`] clone each; the scheduler thread owns the
/// single [`EventQueue`] receiver and drains it to empty on every tick.
pub struct EventQueue {
    tx: mpsc::Sender<Event>,
    rx: mpsc::Receiver<Event>,
}

#[derive(Clone)]
pub struct EventSender(mpsc::Sender<Event>);

impl EventQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> EventSender {
        EventSender(self.tx.clone())
    }

    /// Drain every event currently queued, without blocking for more.
    pub fn drain(&self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSender {
    pub fn send(&self, event: Event) {
        // The receiver only disappears once the scheduler itself has torn
        // down; a worker racing that teardown has nothing useful left to do
        // with a send failure, so drop it.
        let _ = self.0.send(event);
    }
}
