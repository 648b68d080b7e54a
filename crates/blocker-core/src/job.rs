//! Job references and the job populations a blocking check inspects.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::QueueItemId;

/// Reference to a job owned by the runtime.
///
/// `name` identifies the job, `display_name` is what block patterns are
/// matched against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobRef {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

impl JobRef {
    /// A job whose display name equals its name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
        }
    }

    pub fn with_display_name(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
        }
    }

    /// The name patterns are matched against. Falls back to `name` when no
    /// display name was supplied.
    pub fn display_name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }
}

/// A job currently occupying an executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningJob {
    /// Executor slot name (e.g., "agent-1#0").
    pub executor: String,
    pub job: JobRef,
}

impl RunningJob {
    pub fn new(executor: impl Into<String>, job: JobRef) -> Self {
        Self {
            executor: executor.into(),
            job,
        }
    }
}

/// A build waiting in the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedItem {
    pub id: QueueItemId,
    pub job: JobRef,
}

impl QueuedItem {
    /// Queue a new build of `job` under a fresh id.
    pub fn new(job: JobRef) -> Self {
        Self {
            id: QueueItemId::generate(),
            job,
        }
    }
}

/// Which job population a blocking check inspects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
pub enum CheckMode {
    /// Only jobs currently running on an executor.
    #[display("executors")]
    ExecutorsOnly,
    /// Running jobs and every item waiting in the queue.
    #[default]
    #[display("whole-queue")]
    WholeQueue,
}

impl CheckMode {
    pub fn includes_queue(&self) -> bool {
        matches!(self, CheckMode::WholeQueue)
    }
}

impl FromStr for CheckMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "executors" | "executors-only" | "useBuildBlockerForExecutors" => {
                Ok(CheckMode::ExecutorsOnly)
            }
            "whole-queue" | "queue" | "useBuildBlockerForWholeQueue" => Ok(CheckMode::WholeQueue),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown check type: {}",
                other
            ))),
        }
    }
}
