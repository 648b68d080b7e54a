//! Core domain types and traits for the build blocker.
//!
//! This crate contains:
//! - Queue item identifiers
//! - Job references, running jobs and queue items
//! - The check mode selecting which job population is inspected
//! - The runtime query trait and an in-memory snapshot runtime

pub mod error;
pub mod id;
pub mod job;
pub mod runtime;

pub use error::{Error, Population, Result};
pub use id::QueueItemId;
pub use job::{CheckMode, JobRef, QueuedItem, RunningJob};
pub use runtime::{JobRuntime, Snapshot};
