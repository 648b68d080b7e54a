//! Runtime query trait.
//!
//! The job runtime (executor pool and build queue) is owned elsewhere; the
//! blocker only reads point-in-time snapshots of it through [`JobRuntime`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{QueuedItem, Result, RunningJob};

/// Read-only access to the job runtime.
///
/// Implementations may block (e.g. waiting on a queue lock) and may fail;
/// failures should be reported as [`crate::Error::RuntimeQueryFailed`].
pub trait JobRuntime: Send + Sync {
    /// Jobs currently occupying an executor, in executor enumeration order.
    fn running_jobs(&self) -> Result<Vec<RunningJob>>;

    /// Items waiting in the build queue, oldest first.
    fn queued_items(&self) -> Result<Vec<QueuedItem>>;
}

impl<R: JobRuntime + ?Sized> JobRuntime for &R {
    fn running_jobs(&self) -> Result<Vec<RunningJob>> {
        (**self).running_jobs()
    }

    fn queued_items(&self) -> Result<Vec<QueuedItem>> {
        (**self).queued_items()
    }
}

impl<R: JobRuntime + ?Sized> JobRuntime for Arc<R> {
    fn running_jobs(&self) -> Result<Vec<RunningJob>> {
        (**self).running_jobs()
    }

    fn queued_items(&self) -> Result<Vec<QueuedItem>> {
        (**self).queued_items()
    }
}

/// An immutable, in-memory capture of the runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub executors: Vec<RunningJob>,
    #[serde(default)]
    pub queue: Vec<QueuedItem>,
}

impl Snapshot {
    pub fn new(executors: Vec<RunningJob>, queue: Vec<QueuedItem>) -> Self {
        Self { executors, queue }
    }

    /// Parse a snapshot from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl JobRuntime for Snapshot {
    fn running_jobs(&self) -> Result<Vec<RunningJob>> {
        Ok(self.executors.clone())
    }

    fn queued_items(&self) -> Result<Vec<QueuedItem>> {
        Ok(self.queue.clone())
    }
}
