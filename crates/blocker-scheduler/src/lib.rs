//! Blocking job detection for the build blocker.
//!
//! Before a build enters an executor or leaves the queue, the scheduler
//! asks whether a job matching the candidate's block patterns is running
//! (or queued) and defers the candidate if so.

pub mod dispatcher;
pub mod monitor;

pub use dispatcher::{Admission, BuildBlockerDispatcher, CauseOfBlockage, QueryFailurePolicy};
pub use monitor::{BlockLocation, BlockingJob, BlockingJobsMonitor};
