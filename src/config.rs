// src/config.rs

//! Programmatic scheduler configuration.
//!
//! The teacher this crate is built from loads a `ConfigFile` from TOML; a
//! scheduler built against a closure-based registration API has no file to
//! parse, so this plays the same role as a plain builder over in-memory
//! values.

/// Options governing a single [`crate::scheduler::Scheduler`] run.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub workers: usize,
    pub store_results: bool,
    pub skip_dependents: bool,
    pub clear_results_on_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: default_worker_count(),
            store_results: false,
            skip_dependents: false,
            clear_results_on_start: true,
        }
    }
}

/// `min(8, available-cores)`, falling back to `1` if parallelism can't be
/// queried.
fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8))
        .unwrap_or(1)
}

impl SchedulerConfig {
    pub fn builder() -> SchedulerConfigBuilder {
        SchedulerConfigBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct SchedulerConfigBuilder {
    config: SchedulerConfigOverrides,
}

#[derive(Debug, Default)]
struct SchedulerConfigOverrides {
    workers: Option<usize>,
    store_results: Option<bool>,
    skip_dependents: Option<bool>,
    clear_results_on_start: Option<bool>,
}

impl SchedulerConfigBuilder {
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = Some(workers.max(1));
        self
    }

    pub fn store_results(mut self, store_results: bool) -> Self {
        self.config.store_results = Some(store_results);
        self
    }

    pub fn skip_dependents(mut self, skip_dependents: bool) -> Self {
        self.config.skip_dependents = Some(skip_dependents);
        self
    }

    pub fn clear_results_on_start(mut self, clear: bool) -> Self {
        self.config.clear_results_on_start = Some(clear);
        self
    }

    pub fn build(self) -> SchedulerConfig {
        let defaults = SchedulerConfig::default();
        SchedulerConfig {
            workers: self.config.workers.unwrap_or(defaults.workers),
            store_results: self.config.store_results.unwrap_or(defaults.store_results),
            skip_dependents: self
                .config
                .skip_dependents
                .unwrap_or(defaults.skip_dependents),
            clear_results_on_start: self
                .config
                .clear_results_on_start
                .unwrap_or(defaults.clear_results_on_start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let cfg = SchedulerConfig::builder()
            .workers(4)
            .skip_dependents(true)
            .build();
        assert_eq!(cfg.workers, 4);
        assert!(cfg.skip_dependents);
        assert!(!cfg.store_results);
    }

    #[test]
    fn workers_is_clamped_to_at_least_one() {
        let cfg = SchedulerConfig::builder().workers(0).build();
        assert_eq!(cfg.workers, 1);
    }
}
