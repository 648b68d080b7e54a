//! Per-job blocker settings.
//!
//! Settings are read from a KDL document:
//!
//! ```kdl
//! build-blocker {
//!     enabled #true
//!     check-type "executors"
//!     blocking-jobs "deploy-.*" "release"
//! }
//! ```
//!
//! A missing `build-blocker` node means the blocker is disabled.

use blocker_core::CheckMode;
use kdl::{KdlDocument, KdlNode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::{ConfigError, ConfigResult, PatternParse, PatternSet};

const BLOCKER_NODE: &str = "build-blocker";

/// The `(enabled, blocking jobs, check type)` triple attached to a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockerSettings {
    pub enabled: bool,
    /// Line-feed separated block patterns.
    pub blocking_jobs: Option<String>,
    #[serde(default)]
    pub check_type: CheckMode,
}

impl BlockerSettings {
    /// Enabled settings with the given patterns.
    pub fn new(blocking_jobs: impl Into<String>, check_type: CheckMode) -> Self {
        Self {
            enabled: true,
            blocking_jobs: Some(blocking_jobs.into()),
            check_type,
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    /// The blocking jobs text, if the blocker is enabled and has one.
    pub fn active_text(&self) -> Option<&str> {
        if self.enabled {
            self.blocking_jobs.as_deref()
        } else {
            None
        }
    }

    /// Compile the patterns, skipping invalid lines. `None` when disabled.
    pub fn patterns(&self) -> Option<PatternSet> {
        self.active_text().map(PatternSet::parse)
    }

    /// Compile the patterns and report rejected lines. `None` when disabled.
    pub fn pattern_report(&self) -> Option<PatternParse> {
        self.active_text().map(PatternSet::parse_report)
    }
}

/// Parse blocker settings from KDL text.
pub fn parse_blocker_settings(kdl: &str) -> ConfigResult<BlockerSettings> {
    let doc: KdlDocument = kdl.parse()?;

    let Some(node) = doc.nodes().iter().find(|n| n.name().value() == BLOCKER_NODE) else {
        return Ok(BlockerSettings::disabled());
    };

    parse_blocker_node(node)
}

/// Read and parse blocker settings from a file.
pub fn load_blocker_settings(path: impl AsRef<Path>) -> ConfigResult<BlockerSettings> {
    let content = std::fs::read_to_string(path)?;
    parse_blocker_settings(&content)
}

fn parse_blocker_node(node: &KdlNode) -> ConfigResult<BlockerSettings> {
    let mut enabled = true;
    let mut blocking_jobs = None;
    let mut check_type = CheckMode::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "enabled" => {
                    enabled = get_first_bool_arg(child).ok_or_else(|| {
                        ConfigError::InvalidValue {
                            field: "enabled".to_string(),
                            message: "expected #true or #false".to_string(),
                        }
                    })?;
                }
                "blocking-jobs" | "blocking_jobs" => {
                    let lines = get_all_string_args(child);
                    if !lines.is_empty() {
                        blocking_jobs = Some(lines.join("\n"));
                    }
                }
                "check-type" | "check_type" => {
                    let value = get_first_string_arg(child).unwrap_or_default();
                    check_type = value.parse().unwrap_or_else(|_| {
                        warn!(value = %value, "Unknown check type, using whole queue");
                        CheckMode::WholeQueue
                    });
                }
                _ => {}
            }
        }
    }

    if enabled && blocking_jobs.is_none() {
        warn!("Build blocker enabled without blocking jobs, disabling it");
        enabled = false;
    }

    Ok(BlockerSettings {
        enabled,
        blocking_jobs,
        check_type,
    })
}

// Helper functions for extracting values from KDL nodes

fn get_first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn get_first_bool_arg(node: &KdlNode) -> Option<bool> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_bool())
}

fn get_all_string_args(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}
