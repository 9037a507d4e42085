// src/scheduler/summary.rs

//! The run summary returned by `start()` and handed to `on_scheduler_done`.

use std::collections::HashMap;

/// The recorded outcome of a single task.
#[derive(Debug, Clone)]
pub struct Failure {
    pub error_type: String,
    pub error: String,
}

/// Returned by [`crate::scheduler::Scheduler::start`] and passed to the
/// `on_scheduler_done` callback.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub ran: Vec<String>,
    pub passed: Vec<String>,
    pub failed: Vec<String>,
    pub failures: HashMap<String, Failure>,
    pub failure_counts: HashMap<String, usize>,
    pub skipped: Vec<String>,
    pub started_at: f64,
    pub finished_at: f64,
    pub duration: f64,
}

impl RunSummary {
    /// `"Passed:P Failed:F Skipped:S in Ts"`.
    pub fn text(&self) -> String {
        format!(
            "Passed:{} Failed:{} Skipped:{} in {:.3}s",
            self.passed.len(),
            self.failed.len(),
            self.skipped.len(),
            self.duration
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_matches_expected_format() {
        let summary = RunSummary {
            ran: vec!["a".into()],
            passed: vec!["a".into()],
            failed: vec![],
            failures: HashMap::new(),
            failure_counts: HashMap::new(),
            skipped: vec![],
            started_at: 0.0,
            finished_at: 1.5,
            duration: 1.5,
        };
        assert_eq!(summary.text(), "Passed:1 Failed:0 Skipped:0 in 1.500s");
    }
}
