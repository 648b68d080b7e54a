//! Queue item identity.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one entry in the build queue.
///
/// Two queued builds of the same job have different ids, which is how a
/// candidate recognises its own queue entry without hiding other builds of
/// its job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(transparent)]
#[display("{_0}")]
pub struct QueueItemId(Uuid);

impl QueueItemId {
    /// Allocate an id for a newly queued build.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::str::FromStr for QueueItemId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_queued_builds_get_distinct_ids() {
        assert_ne!(QueueItemId::generate(), QueueItemId::generate());
    }

    #[test]
    fn test_parses_snapshot_ids() {
        let id: QueueItemId = "01890a5d-ac96-774b-bcce-b302099a8057".parse().unwrap();
        assert_eq!(id.to_string(), "01890a5d-ac96-774b-bcce-b302099a8057");
        assert!("item-7".parse::<QueueItemId>().is_err());
    }
}
