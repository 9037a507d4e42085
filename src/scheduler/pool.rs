// src/scheduler/pool.rs

//! A bounded pool of worker OS threads.
//!
//! Task bodies are arbitrary blocking closures, not futures — there is no
//! async runtime here, only a classic job-channel thread pool, each worker
//! looping on a shared receiver until the sender side is dropped.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::debug;

type Job = Box<dyn FnOnce(usize) + Send + 'static>;

pub struct WorkerPool {
    sender: Option<mpsc::Sender<Job>>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let handles = (0..workers.max(1))
            .map(|worker_id| {
                let receiver = Arc::clone(&receiver);
                thread::Builder::new()
                    .name(format!("dagrunner-worker-{worker_id}"))
                    .spawn(move || loop {
                        let job = {
                            let rx = receiver.lock().expect("worker pool receiver poisoned");
                            rx.recv()
                        };
                        match job {
                            Ok(job) => job(worker_id),
                            Err(_) => {
                                debug!(worker_id, "worker pool channel closed; exiting");
                                break;
                            }
                        }
                    })
                    .expect("failed to spawn worker thread")
            })
            .collect();

        Self {
            sender: Some(sender),
            handles,
        }
    }

    /// Submit a job. The worker that picks it up is passed its own 0-based
    /// index, for the `run(name, worker_id)` event payload.
    pub fn submit(&self, job: impl FnOnce(usize) + Send + 'static) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(Box::new(job));
        }
    }

    /// Graceful shutdown: close the job channel and join every worker. Only
    /// safe to call once every submitted job has actually completed (the
    /// normal end-of-run path), since workers run jobs to completion before
    /// noticing the channel closed.
    pub fn shutdown(mut self) {
        self.sender.take();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }

    /// Best-effort shutdown for the interrupt path: close the job channel so
    /// no *new* jobs are accepted, but don't wait for in-flight jobs — the
    /// core never preempts a running task, so a worker mid-job keeps running
    /// until it finishes on its own. Its `JoinHandle` is dropped rather than
    /// joined, which simply detaches it; the thread's resources are reclaimed
    /// whenever it naturally exits.
    pub fn shutdown_detached(mut self) {
        self.sender.take();
        self.handles.clear();
    }
}
