//! Blocking job monitor.
//!
//! Inspects a fresh runtime snapshot on every call. Running jobs are
//! checked first in executor order, then (whole queue mode only) queued
//! items oldest first. The first job whose display name matches any
//! pattern is returned.

use blocker_config::PatternSet;
use blocker_core::{CheckMode, Error, JobRef, JobRuntime, Population, QueueItemId, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Where a blocking job was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockLocation {
    Executor { executor: String },
    Queue { item: QueueItemId, position: usize },
}

/// A job that blocks the candidate build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockingJob {
    pub job: JobRef,
    pub location: BlockLocation,
    /// Source text of the pattern that matched.
    pub pattern: String,
}

impl BlockingJob {
    pub fn display_name(&self) -> &str {
        self.job.display_name()
    }

    pub fn is_queued(&self) -> bool {
        matches!(self.location, BlockLocation::Queue { .. })
    }
}

/// Finds blocking jobs in the runtime. Holds no state besides the runtime
/// handle, so one monitor can serve concurrent checks.
#[derive(Debug, Clone)]
pub struct BlockingJobsMonitor<R> {
    runtime: R,
}

impl<R: JobRuntime> BlockingJobsMonitor<R> {
    pub fn new(runtime: R) -> Self {
        Self { runtime }
    }

    /// Return the first job blocking the candidate build, if any.
    ///
    /// `None` or empty `patterns` short-circuit to `Ok(None)` without
    /// querying the runtime. `candidate` is the queue item being admitted;
    /// only that entry is skipped, so running or queued builds of the same
    /// job still block it. Runtime failures are returned as
    /// [`Error::RuntimeQueryFailed`], never as "not blocked".
    pub fn find_blocking_job(
        &self,
        patterns: Option<&PatternSet>,
        mode: CheckMode,
        candidate: Option<QueueItemId>,
    ) -> Result<Option<BlockingJob>> {
        let Some(patterns) = patterns.filter(|p| !p.is_empty()) else {
            return Ok(None);
        };

        let running = self
            .runtime
            .running_jobs()
            .map_err(|e| query_failed(Population::Executors, e))?;

        for running_job in running {
            if let Some(pattern) = patterns.matching(running_job.job.display_name()) {
                debug!(
                    job = %running_job.job.display_name(),
                    executor = %running_job.executor,
                    pattern = %pattern,
                    "Found blocking job on executor"
                );
                return Ok(Some(BlockingJob {
                    pattern: pattern.to_string(),
                    location: BlockLocation::Executor {
                        executor: running_job.executor,
                    },
                    job: running_job.job,
                }));
            }
        }

        if !mode.includes_queue() {
            return Ok(None);
        }

        let queued = self
            .runtime
            .queued_items()
            .map_err(|e| query_failed(Population::Queue, e))?;

        for (position, item) in queued.into_iter().enumerate() {
            if candidate == Some(item.id) {
                continue;
            }
            if let Some(pattern) = patterns.matching(item.job.display_name()) {
                debug!(
                    job = %item.job.display_name(),
                    position,
                    pattern = %pattern,
                    "Found blocking job in queue"
                );
                return Ok(Some(BlockingJob {
                    pattern: pattern.to_string(),
                    location: BlockLocation::Queue {
                        item: item.id,
                        position,
                    },
                    job: item.job,
                }));
            }
        }

        Ok(None)
    }
}

fn query_failed(population: Population, err: Error) -> Error {
    warn!(%population, error = %err, "Runtime query failed");
    match err {
        Error::RuntimeQueryFailed { .. } => err,
        other => Error::runtime_query(population, other.to_string()),
    }
}
