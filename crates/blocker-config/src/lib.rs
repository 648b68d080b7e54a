//! Configuration parsing for the build blocker.
//!
//! This crate handles parsing of:
//! - Block patterns (one regular expression per line)
//! - Per-job blocker settings (KDL)

pub mod error;
pub mod pattern;
pub mod settings;

pub use error::{ConfigError, ConfigResult};
pub use pattern::{BlockPattern, PatternParse, PatternSet, RejectedPattern};
pub use settings::{BlockerSettings, load_blocker_settings, parse_blocker_settings};
