//! Error types for the build blocker.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The job population a runtime query was reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Population {
    #[display("executors")]
    Executors,
    #[display("queue")]
    Queue,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("runtime query failed while listing {population}: {message}")]
    RuntimeQueryFailed {
        population: Population,
        message: String,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl Error {
    pub fn runtime_query(population: Population, message: impl Into<String>) -> Self {
        Error::RuntimeQueryFailed {
            population,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
