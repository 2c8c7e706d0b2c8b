//! History configuration.
//!
//! Loaded from TOML; every field has a default so an empty document is valid.
//!
//! ```toml
//! cooldown_secs = 300
//! summary_field_limit = 3
//!
//! [retention.free]
//! auto_versions = 10
//! manual_backups = 3
//!
//! [retention.privileged]
//! auto_versions = 50
//! manual_backups = 20
//! ```

use chrono::Duration;
use pagetrail_core_types::AccountTier;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{HistoryError, Result};
use crate::snapshot::VersionKind;

/// Per-tier version quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierQuota {
    pub auto_versions: usize,
    pub manual_backups: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub free: TierQuota,
    pub privileged: TierQuota,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            free: TierQuota {
                auto_versions: 10,
                manual_backups: 3,
            },
            privileged: TierQuota {
                auto_versions: 50,
                manual_backups: 20,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Window within which automatic captures update the newest automatic
    /// version instead of creating a new one
    pub cooldown_secs: u64,
    pub retention: RetentionConfig,
    /// Changed field names spelled out in a summary before "and N more"
    pub summary_field_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 300,
            retention: RetentionConfig::default(),
            summary_field_limit: 3,
        }
    }
}

impl HistoryConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::InvalidConfig` if the document does not parse
    /// or a quota is zero.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: HistoryConfig =
            toml::from_str(text).map_err(|e| HistoryError::InvalidConfig {
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::InvalidConfig` if the file cannot be read or
    /// fails [`HistoryConfig::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| HistoryError::InvalidConfig {
            reason: format!("{}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&text)
    }

    /// Check quotas are at least one.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::InvalidConfig` naming the first zero quota.
    pub fn validate(&self) -> Result<()> {
        let quotas = [
            ("retention.free.auto_versions", self.retention.free.auto_versions),
            ("retention.free.manual_backups", self.retention.free.manual_backups),
            (
                "retention.privileged.auto_versions",
                self.retention.privileged.auto_versions,
            ),
            (
                "retention.privileged.manual_backups",
                self.retention.privileged.manual_backups,
            ),
        ];
        for (name, value) in quotas {
            if value == 0 {
                return Err(HistoryError::InvalidConfig {
                    reason: format!("{} must be at least 1", name),
                });
            }
        }
        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::seconds(i64::try_from(self.cooldown_secs).unwrap_or(i64::MAX / 1000))
    }

    /// Number of versions of `kind` retained for an account of `tier`.
    pub fn quota(&self, tier: AccountTier, kind: VersionKind) -> usize {
        let quota = match tier {
            AccountTier::Free => self.retention.free,
            AccountTier::Privileged => self.retention.privileged,
        };
        match kind {
            VersionKind::Auto => quota.auto_versions,
            VersionKind::Manual => quota.manual_backups,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HistoryConfig::default();
        assert_eq!(config.cooldown_secs, 300);
        assert_eq!(config.quota(AccountTier::Free, VersionKind::Auto), 10);
        assert_eq!(config.quota(AccountTier::Free, VersionKind::Manual), 3);
        assert_eq!(config.quota(AccountTier::Privileged, VersionKind::Auto), 50);
        assert_eq!(config.quota(AccountTier::Privileged, VersionKind::Manual), 20);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(
            HistoryConfig::from_toml_str("").unwrap(),
            HistoryConfig::default()
        );
    }

    #[test]
    fn test_partial_document_overrides() {
        let config = HistoryConfig::from_toml_str(
            "cooldown_secs = 60\n[retention.free]\nauto_versions = 2\nmanual_backups = 1\n",
        )
        .unwrap();
        assert_eq!(config.cooldown(), Duration::seconds(60));
        assert_eq!(config.quota(AccountTier::Free, VersionKind::Auto), 2);
        assert_eq!(config.quota(AccountTier::Privileged, VersionKind::Auto), 50);
    }

    #[test]
    fn test_zero_quota_rejected() {
        let err = HistoryConfig::from_toml_str(
            "[retention.privileged]\nauto_versions = 0\nmanual_backups = 1\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            HistoryError::InvalidConfig { ref reason } if reason.contains("privileged")
        ));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        assert!(HistoryConfig::from_toml_str("cooldown_secs = \"soon\"").is_err());
    }
}
