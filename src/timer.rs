// src/timer.rs

//! Wall-clock + monotonic timing for a single scheduler run.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Records when a run started and finished.
///
/// `started_at`/`finished_at` are wall-clock seconds since the Unix epoch,
/// suitable for display in the run summary. `duration` is derived from a
/// monotonic [`Instant`] pair so it isn't affected by clock adjustments.
#[derive(Debug, Default)]
pub struct Timer {
    wall_start: Option<SystemTime>,
    wall_finish: Option<SystemTime>,
    mono_start: Option<Instant>,
    mono_finish: Option<Instant>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.wall_start = Some(SystemTime::now());
        self.mono_start = Some(Instant::now());
        self.wall_finish = None;
        self.mono_finish = None;
    }

    pub fn stop(&mut self) {
        self.wall_finish = Some(SystemTime::now());
        self.mono_finish = Some(Instant::now());
    }

    pub fn started_at(&self) -> f64 {
        self.wall_start.map(epoch_seconds).unwrap_or(0.0)
    }

    pub fn finished_at(&self) -> f64 {
        self.wall_finish.map(epoch_seconds).unwrap_or(0.0)
    }

    /// Zero until both `start` and `stop` have been called.
    pub fn duration(&self) -> f64 {
        match (self.mono_start, self.mono_finish) {
            (Some(start), Some(finish)) => finish.saturating_duration_since(start).as_secs_f64(),
            _ => 0.0,
        }
    }
}

fn epoch_seconds(t: SystemTime) -> f64 {
    t.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_is_zero_before_stop() {
        let mut timer = Timer::new();
        timer.start();
        assert_eq!(timer.duration(), 0.0);
    }

    #[test]
    fn duration_is_nonnegative_after_stop() {
        let mut timer = Timer::new();
        timer.start();
        timer.stop();
        assert!(timer.duration() >= 0.0);
        assert!(timer.started_at() > 0.0);
        assert!(timer.finished_at() >= timer.started_at());
    }
}
