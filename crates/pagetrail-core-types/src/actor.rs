//! Who is acting, and on which account tier

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Per-request id, attached to errors so a failure can be matched to its
/// log lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Account tier, resolved outside this engine and used for retention quotas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountTier {
    #[default]
    Free,
    Privileged,
}

impl AccountTier {
    /// Parse a tier name; anything unrecognised is treated as the free tier
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "privileged" | "pro" | "premium" => AccountTier::Privileged,
            _ => AccountTier::Free,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountTier::Free => "free",
            AccountTier::Privileged => "privileged",
        }
    }
}

/// The acting user for one request
#[derive(Debug, Clone)]
pub struct ActorContext {
    pub actor_id: String,
    pub tier: AccountTier,
    pub request_id: RequestId,
}

impl ActorContext {
    pub fn new(actor_id: impl Into<String>, tier: AccountTier) -> Self {
        Self {
            actor_id: actor_id.into(),
            tier,
            request_id: RequestId::new(),
        }
    }

    /// Reuse a request id assigned upstream
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }
}
