//! Periodic archive trigger
//!
//! The [`Scheduler`] runs one archive immediately, then one per tick of a
//! fixed-period timer measured from its first run. Jobs never overlap: each
//! job is awaited before the next tick is considered. A tick that elapses
//! while a job is still running fires as soon as the job finishes; the ticks
//! after it stay aligned to the original period.
//!
//! ```rust,no_run
//! use cron_backup::{BackupConfig, Scheduler};
//!
//! # async fn example() -> cron_backup::Result<()> {
//! let config = BackupConfig::new("/srv/data", "/backups", 3600);
//! config.prepare_destination()?;
//! // Only returns on the first failed run
//! let never = Scheduler::new(config).run().await;
//! # never.map(|_| ())
//! # }
//! ```

use crate::archiver::{ArchiveRunner, Archiver};
use crate::config::BackupConfig;
use crate::error::{BackupError, Result};
use crate::types::{ArchiveJob, ArchiveSummary};
use chrono::Local;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{debug, info};

/// Drives an [`ArchiveRunner`] on a fixed interval
pub struct Scheduler<R: ArchiveRunner = Archiver> {
    config: BackupConfig,
    runner: Arc<R>,
    ticker: Option<Interval>,
    runs: u64,
}

impl Scheduler<Archiver> {
    /// Create a scheduler using the zip [`Archiver`]
    pub fn new(config: BackupConfig) -> Self {
        Self::with_runner(config, Archiver::new())
    }
}

impl<R: ArchiveRunner> Scheduler<R> {
    /// Create a scheduler around a custom runner
    pub fn with_runner(config: BackupConfig, runner: R) -> Self {
        Self {
            config,
            runner: Arc::new(runner),
            ticker: None,
            runs: 0,
        }
    }

    /// Runner used for each job
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Number of jobs started so far
    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// Run forever, returning only the error of the first failed job
    pub async fn run(mut self) -> Result<Infallible> {
        info!(
            "Backing up {:?} into {:?} every {}",
            self.config.source_dir,
            self.config.destination_dir,
            humantime::format_duration(self.config.interval)
        );
        loop {
            self.run_next().await?;
        }
    }

    /// Run `runs` jobs with the same timing as [`run`](Self::run), then stop
    ///
    /// Calling it again continues on the same timeline.
    pub async fn run_bounded(&mut self, runs: usize) -> Result<Vec<ArchiveSummary>> {
        let mut summaries = Vec::with_capacity(runs);
        for _ in 0..runs {
            summaries.push(self.run_next().await?);
        }
        Ok(summaries)
    }

    async fn run_next(&mut self) -> Result<ArchiveSummary> {
        let period = self.config.interval;
        let ticker = self.ticker.get_or_insert_with(|| {
            // The first tick of a tokio interval completes immediately
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });
        ticker.tick().await;

        let job = ArchiveJob::new(
            &self.config.source_dir,
            &self.config.destination_dir,
            Local::now(),
        );
        self.runs += 1;
        info!("Starting archive run {} into {:?}", self.runs, job.destination);

        let runner = Arc::clone(&self.runner);
        let summary = tokio::task::spawn_blocking(move || runner.run(&job))
            .await
            .map_err(|e| BackupError::internal(format!("archive task failed: {}", e)))??;

        debug!("Archive run {} finished in {:?}", self.runs, summary.duration);
        Ok(summary)
    }
}
