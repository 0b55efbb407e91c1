//! Engine configuration: the read-only record the CLI façade builds once
//! and passes to the Scheduler at `INIT`.

use crate::error::{EngineError, Result};

/// One per run invocation. Built once by the CLI façade; read-only
/// thereafter (see the Scheduler's `INIT`/`PREPARE` states).
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub url: String,
    pub table: String,
    pub input_col: String,
    pub output_col: String,
    pub provider_id: String,
    pub batch_size: u32,
    pub num_batches: u32,
    pub follow: bool,
    pub max_idle_seconds: f64,
    pub min_idle_seconds: f64,
    pub workers: usize,
    pub progress: bool,
    pub verbose: bool,
    pub dry_run: bool,
}

/// Floor applied to `min_idle_seconds` so a zero or negative flag value
/// can't collapse the idle loop into a busy spin.
pub const MIN_IDLE_FLOOR_SECONDS: f64 = 0.001;

impl EngineConfig {
    /// Validate and normalize a configuration record: `min_idle` is floored,
    /// `workers` is clamped to host parallelism, and `dry_run` forces
    /// single-worker verbose mode with progress disabled.
    pub fn normalize(mut self) -> Result<Self> {
        if self.progress && self.verbose {
            return Err(EngineError::configuration(
                "-v/--verbose and -p/--progress are mutually exclusive",
            ));
        }
        if self.table.trim().is_empty() {
            return Err(EngineError::configuration("table name must not be empty"));
        }
        if self.input_col.trim().is_empty() || self.output_col.trim().is_empty() {
            return Err(EngineError::configuration(
                "input and output column names must not be empty",
            ));
        }
        if self.batch_size == 0 {
            return Err(EngineError::configuration("batch_size must be greater than 0"));
        }
        if self.num_batches == 0 {
            return Err(EngineError::configuration(
                "num_batches must be greater than 0",
            ));
        }

        self.min_idle_seconds = self.min_idle_seconds.max(MIN_IDLE_FLOOR_SECONDS);
        self.max_idle_seconds = self.max_idle_seconds.max(0.0);

        let host_parallelism = num_cpus::get();
        self.workers = self.workers.clamp(1, host_parallelism);

        if self.dry_run {
            self.workers = 1;
            self.verbose = true;
            self.progress = false;
        }

        Ok(self)
    }

    /// Idle budget in seconds, accounting for the minutes-based CLI flag.
    /// `0.0` means unbounded.
    pub fn idle_budget_seconds(&self) -> f64 {
        self.max_idle_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> EngineConfig {
        EngineConfig {
            url: "postgresql://root@localhost:26257/defaultdb".to_string(),
            table: "docs".to_string(),
            input_col: "body".to_string(),
            output_col: "emb".to_string(),
            provider_id: "local".to_string(),
            batch_size: 1000,
            num_batches: 1,
            follow: false,
            max_idle_seconds: 60.0,
            min_idle_seconds: 15.0,
            workers: 1,
            progress: false,
            verbose: false,
            dry_run: false,
        }
    }

    #[test]
    fn test_progress_and_verbose_is_configuration_error() {
        let mut config = base_config();
        config.progress = true;
        config.verbose = true;
        let err = config.normalize().unwrap_err();
        assert!(matches!(err, EngineError::Configuration { .. }));
    }

    #[test]
    fn test_dry_run_forces_single_worker_verbose_no_progress() {
        let mut config = base_config();
        config.dry_run = true;
        config.workers = 8;
        config.progress = true;
        config.verbose = false;
        let normalized = config.normalize().unwrap();
        assert_eq!(normalized.workers, 1);
        assert!(normalized.verbose);
        assert!(!normalized.progress);
    }

    #[test]
    fn test_min_idle_is_floored() {
        let mut config = base_config();
        config.min_idle_seconds = 0.0;
        let normalized = config.normalize().unwrap();
        assert_eq!(normalized.min_idle_seconds, MIN_IDLE_FLOOR_SECONDS);
    }

    #[test]
    fn test_workers_clamped_to_at_least_one() {
        let mut config = base_config();
        config.workers = 0;
        let normalized = config.normalize().unwrap();
        assert!(normalized.workers >= 1);
    }

    #[test]
    fn test_empty_table_is_configuration_error() {
        let mut config = base_config();
        config.table = "  ".to_string();
        assert!(config.normalize().is_err());
    }
}
