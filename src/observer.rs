//! Observer: progress bar, verbose logging, and post-run warning/error log
//! files. Progress and verbose are mutually exclusive — enforced by
//! [`crate::config::EngineConfig::normalize`], not here.

use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{Result as IoResult, Write};

pub struct Observer {
    progress: bool,
    verbose: bool,
    bar: Option<ProgressBar>,
}

impl Observer {
    pub fn new(progress: bool, verbose: bool) -> Self {
        Self {
            progress,
            verbose,
            bar: None,
        }
    }

    /// Open a progress bar for a new run, if progress mode is on.
    pub fn start_run(&mut self, total: u64) {
        if !self.progress {
            return;
        }
        let bar = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::with_template(
            "{msg} [{bar:40.cyan/blue}] {pos}/{len} rows ({eta})",
        ) {
            bar.set_style(style.progress_chars("##-"));
        }
        bar.set_message("Vectorizing");
        self.bar = Some(bar);
    }

    /// Advance the progress bar by the number of embeddings a shard
    /// returned.
    pub fn advance(&self, count: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(count);
        }
    }

    /// Close the current run's progress bar.
    pub fn finish_run(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    /// Per-batch "Run R, Batch B starting (N rows)" verbose line.
    pub fn log_batch_start(&self, run: u64, batch: u64, rows: usize) {
        if self.verbose {
            println!("[INFO] Run {run}, Batch {batch} starting ({rows} rows)");
        }
    }

    /// "Run R complete" verbose line, on finalizing a run in follow mode.
    pub fn log_run_complete(&self, run: u64, num_batches: u32) {
        if self.verbose {
            println!("[INFO] Run {run} complete ({num_batches} batches).");
        }
    }

    pub fn log_max_idle_reached(&self, max_idle_minutes: f64) {
        if self.verbose {
            println!("[INFO] Max idle reached ({max_idle_minutes} min). Exiting.");
        }
    }

    pub fn log_done(&self, elapsed_seconds: f64) {
        if self.verbose {
            println!("Done in {elapsed_seconds} seconds");
            println!("[INFO] Vectorization complete.");
        }
    }

    /// Write accumulated warnings/errors to timestamped log files and print
    /// summary counts, as the final Observer action of a run.
    pub fn report(&self, warnings: &[String], errors: &[String]) -> IoResult<()> {
        self.report_in(std::path::Path::new("."), warnings, errors)
    }

    /// Same as [`Self::report`] but rooted at `dir` — split out so tests
    /// don't need to mutate the process's current directory.
    fn report_in(&self, dir: &std::path::Path, warnings: &[String], errors: &[String]) -> IoResult<()> {
        if !(self.progress || self.verbose) || (warnings.is_empty() && errors.is_empty()) {
            return Ok(());
        }

        println!("\n[WARNINGS SUMMARY]");
        let warnings_path = dir.join(format!("warnings_{}.log", Local::now().format("%Y%m%d_%H%M%S")));
        let mut warnings_file = File::create(&warnings_path)?;
        for w in warnings {
            println!("{w}");
            writeln!(warnings_file, "{w}")?;
        }
        println!("Total warnings: {}", warnings.len());

        println!("\n[ERROR SUMMARY]");
        let errors_path = dir.join(format!("errors_{}.log", Local::now().format("%Y%m%d_%H%M%S")));
        let mut errors_file = File::create(&errors_path)?;
        for e in errors {
            println!("{e}");
            writeln!(errors_file, "{e}")?;
        }
        println!("Total errors: {}", errors.len());

        Ok(())
    }
}
