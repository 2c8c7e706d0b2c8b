//! Coalescing and retention policy for captures.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{HistoryError, Result};

/// Automatic versions come from mutations; manual ones from explicit backups.
/// Each kind has its own quota and never evicts the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionKind {
    Auto,
    Manual,
}

impl VersionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionKind::Auto => "auto",
            VersionKind::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(VersionKind::Auto),
            "manual" => Ok(VersionKind::Manual),
            other => Err(HistoryError::InvalidInput {
                reason: format!("unknown version kind '{}'", other),
            }),
        }
    }
}

/// What a capture should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureDecision {
    /// Write a new version row
    Create,
    /// Overwrite the given automatic version in place
    Coalesce { version_id: String },
}

/// Decide between a new version and coalescing into the newest automatic one.
///
/// `latest_auto` is the id and creation time of the newest automatic version.
/// Manual captures always create. A `latest_auto` stamped in the future
/// (clock skew) counts as within the window.
pub fn decide_capture(
    kind: VersionKind,
    latest_auto: Option<(&str, DateTime<Utc>)>,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> CaptureDecision {
    match (kind, latest_auto) {
        (VersionKind::Auto, Some((id, created_at))) if now - created_at < cooldown => {
            CaptureDecision::Coalesce {
                version_id: id.to_string(),
            }
        }
        _ => CaptureDecision::Create,
    }
}

/// How many of the oldest versions to evict so `count` fits `quota`.
pub fn excess(count: usize, quota: usize) -> usize {
    count.saturating_sub(quota)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_auto_within_cooldown_coalesces() {
        let decision = decide_capture(
            VersionKind::Auto,
            Some(("v1", t(0))),
            t(299),
            Duration::seconds(300),
        );
        assert_eq!(
            decision,
            CaptureDecision::Coalesce {
                version_id: "v1".into()
            }
        );
    }

    #[test]
    fn test_auto_after_cooldown_creates() {
        let decision = decide_capture(
            VersionKind::Auto,
            Some(("v1", t(0))),
            t(300),
            Duration::seconds(300),
        );
        assert_eq!(decision, CaptureDecision::Create);
    }

    #[test]
    fn test_manual_never_coalesces() {
        let decision = decide_capture(
            VersionKind::Manual,
            Some(("v1", t(0))),
            t(1),
            Duration::seconds(300),
        );
        assert_eq!(decision, CaptureDecision::Create);
    }

    #[test]
    fn test_first_auto_creates() {
        assert_eq!(
            decide_capture(VersionKind::Auto, None, t(0), Duration::seconds(300)),
            CaptureDecision::Create
        );
    }

    #[test]
    fn test_excess() {
        assert_eq!(excess(11, 10), 1);
        assert_eq!(excess(3, 10), 0);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(VersionKind::parse("auto").unwrap(), VersionKind::Auto);
        assert!(VersionKind::parse("weekly").is_err());
    }
}
