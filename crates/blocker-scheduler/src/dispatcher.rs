//! Admission gate consulted by the scheduler.
//!
//! The scheduler calls [`BuildBlockerDispatcher::can_take`] before a build
//! is handed to an executor and [`BuildBlockerDispatcher::can_run`] before
//! it leaves the queue. Both re-evaluate the candidate's blocker settings
//! against a fresh runtime snapshot.

use blocker_config::BlockerSettings;
use blocker_core::{JobRuntime, QueuedItem};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::monitor::{BlockLocation, BlockingJob, BlockingJobsMonitor};

/// What to do when the runtime cannot be queried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryFailurePolicy {
    /// Let the candidate proceed as if nothing were blocking it.
    FailOpen,
    /// Defer the candidate so the scheduler checks again on its next poll.
    #[default]
    FailClosed,
}

/// Why a candidate build may not start yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CauseOfBlockage {
    pub blocking: BlockingJob,
    pub message: String,
}

impl CauseOfBlockage {
    fn new(blocking: BlockingJob) -> Self {
        let message = match &blocking.location {
            BlockLocation::Executor { .. } => format!("Blocked by {}", blocking.display_name()),
            BlockLocation::Queue { position, .. } => format!(
                "Blocked by {} (queued at position {})",
                blocking.display_name(),
                position + 1
            ),
        };
        Self { blocking, message }
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Admission {
    Proceed,
    Blocked(CauseOfBlockage),
    /// The runtime could not be inspected; ask again later.
    Deferred { reason: String },
}

impl Admission {
    pub fn is_proceed(&self) -> bool {
        matches!(self, Admission::Proceed)
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Admission::Blocked(_))
    }
}

/// Build blocker hook for the scheduler's admission path.
#[derive(Debug, Clone)]
pub struct BuildBlockerDispatcher<R> {
    monitor: BlockingJobsMonitor<R>,
    failure_policy: QueryFailurePolicy,
}

impl<R: JobRuntime> BuildBlockerDispatcher<R> {
    pub fn new(runtime: R) -> Self {
        Self {
            monitor: BlockingJobsMonitor::new(runtime),
            failure_policy: QueryFailurePolicy::default(),
        }
    }

    pub fn with_failure_policy(mut self, policy: QueryFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn failure_policy(&self) -> QueryFailurePolicy {
        self.failure_policy
    }

    /// Whether `candidate` may be handed to an executor.
    pub fn can_take(&self, candidate: &QueuedItem, settings: &BlockerSettings) -> Admission {
        self.check("executor", candidate, settings)
    }

    /// Whether `candidate` may leave the queue.
    pub fn can_run(&self, candidate: &QueuedItem, settings: &BlockerSettings) -> Admission {
        self.check("queue", candidate, settings)
    }

    fn check(
        &self,
        stage: &'static str,
        candidate: &QueuedItem,
        settings: &BlockerSettings,
    ) -> Admission {
        let Some(patterns) = settings.patterns() else {
            return Admission::Proceed;
        };

        match self
            .monitor
            .find_blocking_job(Some(&patterns), settings.check_type, Some(candidate.id))
        {
            Ok(None) => {
                debug!(job = %candidate.job.name, stage, "No blocking job found");
                Admission::Proceed
            }
            Ok(Some(blocking)) => {
                let cause = CauseOfBlockage::new(blocking);
                debug!(
                    job = %candidate.job.name,
                    stage,
                    reason = %cause.message,
                    "Build blocked"
                );
                Admission::Blocked(cause)
            }
            Err(e) => match self.failure_policy {
                QueryFailurePolicy::FailOpen => {
                    warn!(
                        job = %candidate.job.name,
                        stage,
                        error = %e,
                        "Runtime query failed, admitting build"
                    );
                    Admission::Proceed
                }
                QueryFailurePolicy::FailClosed => {
                    warn!(
                        job = %candidate.job.name,
                        stage,
                        error = %e,
                        "Runtime query failed, deferring build"
                    );
                    Admission::Deferred {
                        reason: e.to_string(),
                    }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocker_core::{CheckMode, Error, JobRef, Population, Result, RunningJob, Snapshot};

    /// The candidate's own queue entry sits ahead of a queued "queueBlockingJob"
    /// while "blockingJob" runs.
    fn runtime() -> (QueuedItem, Snapshot) {
        let candidate = QueuedItem::new(JobRef::new("candidate"));
        let snapshot = Snapshot::new(
            vec![RunningJob::new("agent#0", JobRef::new("blockingJob"))],
            vec![
                candidate.clone(),
                QueuedItem::new(JobRef::new("queueBlockingJob")),
            ],
        );
        (candidate, snapshot)
    }

    struct UnavailableRuntime;

    impl JobRuntime for UnavailableRuntime {
        fn running_jobs(&self) -> Result<Vec<RunningJob>> {
            Err(Error::runtime_query(Population::Executors, "controller restarting"))
        }

        fn queued_items(&self) -> Result<Vec<QueuedItem>> {
            Err(Error::runtime_query(Population::Queue, "controller restarting"))
        }
    }

    #[test]
    fn test_disabled_settings_proceed() {
        let dispatcher = BuildBlockerDispatcher::new(UnavailableRuntime);
        let candidate = QueuedItem::new(JobRef::new("candidate"));

        assert!(
            dispatcher
                .can_run(&candidate, &BlockerSettings::disabled())
                .is_proceed()
        );

        let mut settings = BlockerSettings::new("block.*", CheckMode::WholeQueue);
        settings.enabled = false;
        assert!(dispatcher.can_take(&candidate, &settings).is_proceed());
    }

    #[test]
    fn test_blocked_by_running_job() {
        let (candidate, snapshot) = runtime();
        let dispatcher = BuildBlockerDispatcher::new(snapshot);
        let settings = BlockerSettings::new("xxx\nblock.*\nyyy", CheckMode::ExecutorsOnly);

        match dispatcher.can_take(&candidate, &settings) {
            Admission::Blocked(cause) => {
                assert_eq!(cause.message, "Blocked by blockingJob");
                assert_eq!(cause.blocking.pattern, "block.*");
            }
            other => panic!("expected blocked, got {other:?}"),
        }
    }

    #[test]
    fn test_blocked_by_queued_job_in_whole_queue_mode() {
        let (candidate, snapshot) = runtime();
        let dispatcher = BuildBlockerDispatcher::new(snapshot);

        let executors_only = BlockerSettings::new("queue.*", CheckMode::ExecutorsOnly);
        assert!(dispatcher.can_run(&candidate, &executors_only).is_proceed());

        let whole_queue = BlockerSettings::new("queue.*", CheckMode::WholeQueue);
        match dispatcher.can_run(&candidate, &whole_queue) {
            Admission::Blocked(cause) => {
                assert_eq!(
                    cause.message,
                    "Blocked by queueBlockingJob (queued at position 2)"
                );
                assert!(cause.blocking.is_queued());
            }
            other => panic!("expected blocked, got {other:?}"),
        }
    }

    #[test]
    fn test_candidate_in_queue_does_not_block_itself() {
        let (candidate, snapshot) = runtime();
        let dispatcher = BuildBlockerDispatcher::new(snapshot);
        let settings = BlockerSettings::new("cand.*", CheckMode::WholeQueue);

        assert!(dispatcher.can_run(&candidate, &settings).is_proceed());
    }

    #[test]
    fn test_running_build_of_candidate_job_blocks_it() {
        let candidate = QueuedItem::new(JobRef::new("deploy"));
        let snapshot = Snapshot::new(
            vec![RunningJob::new("agent#0", JobRef::new("deploy"))],
            vec![candidate.clone()],
        );
        let dispatcher = BuildBlockerDispatcher::new(snapshot);
        let settings = BlockerSettings::new("deploy", CheckMode::WholeQueue);

        match dispatcher.can_take(&candidate, &settings) {
            Admission::Blocked(cause) => assert_eq!(cause.message, "Blocked by deploy"),
            other => panic!("expected blocked, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_pattern_lines_do_not_break_admission() {
        let (candidate, snapshot) = runtime();
        let dispatcher = BuildBlockerDispatcher::new(snapshot);
        let settings = BlockerSettings::new("(broken\nblock.*", CheckMode::ExecutorsOnly);

        assert!(dispatcher.can_take(&candidate, &settings).is_blocked());
    }

    #[test]
    fn test_query_failure_defers_by_default() {
        let dispatcher = BuildBlockerDispatcher::new(UnavailableRuntime);
        assert_eq!(dispatcher.failure_policy(), QueryFailurePolicy::FailClosed);

        let candidate = QueuedItem::new(JobRef::new("candidate"));
        let settings = BlockerSettings::new("block.*", CheckMode::WholeQueue);
        match dispatcher.can_take(&candidate, &settings) {
            Admission::Deferred { reason } => assert!(reason.contains("controller restarting")),
            other => panic!("expected deferred, got {other:?}"),
        }
    }

    #[test]
    fn test_query_failure_fail_open_proceeds() {
        let dispatcher = BuildBlockerDispatcher::new(UnavailableRuntime)
            .with_failure_policy(QueryFailurePolicy::FailOpen);
        let candidate = QueuedItem::new(JobRef::new("candidate"));
        let settings = BlockerSettings::new("block.*", CheckMode::WholeQueue);

        assert!(dispatcher.can_run(&candidate, &settings).is_proceed());
    }

    #[test]
    fn test_admission_serializes_with_decision_tag() {
        let json = serde_json::to_string(&Admission::Deferred {
            reason: "down".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"decision":"deferred","reason":"down"}"#);

        let json = serde_json::to_string(&Admission::Proceed).unwrap();
        assert_eq!(json, r#"{"decision":"proceed"}"#);
    }
}
