//! CLI command implementations.

use anyhow::{Context, Result};
use blocker_config::{BlockerSettings, PatternSet, parse_blocker_settings};
use blocker_core::{JobRef, QueueItemId, QueuedItem, Snapshot};
use blocker_scheduler::{Admission, BuildBlockerDispatcher, QueryFailurePolicy};

pub fn check(
    config_path: &str,
    snapshot_path: &str,
    job: &str,
    display_name: Option<String>,
    item: Option<QueueItemId>,
    policy: QueryFailurePolicy,
) -> Result<Admission> {
    let config = std::fs::read_to_string(config_path)
        .with_context(|| format!("reading configuration {}", config_path))?;
    let snapshot = std::fs::read_to_string(snapshot_path)
        .with_context(|| format!("reading snapshot {}", snapshot_path))?;

    let job = match display_name {
        Some(display) => JobRef::with_display_name(job, display),
        None => JobRef::new(job),
    };
    // Without a queue item id the candidate is not in the snapshot's queue yet.
    let candidate = match item {
        Some(id) => QueuedItem { id, job },
        None => QueuedItem::new(job),
    };

    evaluate(&config, &snapshot, &candidate, policy)
}

/// Evaluate a configuration against a snapshot for one candidate.
pub fn evaluate(
    config: &str,
    snapshot: &str,
    candidate: &QueuedItem,
    policy: QueryFailurePolicy,
) -> Result<Admission> {
    let settings = parse_blocker_settings(config)?;
    let snapshot = Snapshot::from_json(snapshot)?;

    let dispatcher = BuildBlockerDispatcher::new(snapshot).with_failure_policy(policy);
    Ok(dispatcher.can_take(candidate, &settings))
}

pub fn print_admission(admission: &Admission, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(admission)?);
        return Ok(());
    }

    match admission {
        Admission::Proceed => println!("proceed"),
        Admission::Blocked(cause) => println!("blocked: {}", cause.message),
        Admission::Deferred { reason } => println!("deferred: {}", reason),
    }
    Ok(())
}

pub fn validate(path: &str) -> Result<()> {
    let content = std::fs::read_to_string(path)?;
    match validate_settings(&content) {
        Ok(settings) => {
            match settings.active_text() {
                Some(text) => println!(
                    "Configuration is valid: {} pattern(s), check type {}",
                    PatternSet::parse(text).len(),
                    settings.check_type
                ),
                None => println!("Configuration is valid: build blocker disabled"),
            }
            Ok(())
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}

fn validate_settings(content: &str) -> Result<BlockerSettings> {
    let settings = parse_blocker_settings(content)?;
    if let Some(text) = settings.active_text() {
        PatternSet::parse_strict(text)?;
    }
    Ok(settings)
}
