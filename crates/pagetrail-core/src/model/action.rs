//! Action kinds recorded in the audit log.
//!
//! An action is a subject plus a verb, stored as the tag `"<subject>.<verb>"`.
//! Tags that do not parse into a known pair are kept verbatim as
//! [`ActionKind::Custom`] so older or foreign entries still load.

use serde::{Deserialize, Serialize};

use super::collection::CollectionKind;

/// What an action touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    Page,
    Settings,
    Status,
    Collection(CollectionKind),
    Version,
    History,
    Account,
    Security,
    Billing,
}

/// What an action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Create,
    Update,
    Delete,
    Reorder,
    Replace,
    Backup,
    Restore,
}

/// Coarse grouping used by history views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    Security,
    Billing,
    Profile,
    Content,
    Appearance,
    History,
    General,
}

/// A recorded action. Serialized as its tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ActionKind {
    Standard { subject: Subject, verb: Verb },
    Custom(String),
}

impl ActionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionCategory::Security => "security",
            ActionCategory::Billing => "billing",
            ActionCategory::Profile => "profile",
            ActionCategory::Content => "content",
            ActionCategory::Appearance => "appearance",
            ActionCategory::History => "history",
            ActionCategory::General => "general",
        }
    }

    /// Unknown names fall back to `General`.
    pub fn parse(s: &str) -> Self {
        match s {
            "security" => ActionCategory::Security,
            "billing" => ActionCategory::Billing,
            "profile" => ActionCategory::Profile,
            "content" => ActionCategory::Content,
            "appearance" => ActionCategory::Appearance,
            "history" => ActionCategory::History,
            _ => ActionCategory::General,
        }
    }
}

impl Subject {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Page => "page",
            Subject::Settings => "settings",
            Subject::Status => "status",
            Subject::Collection(kind) => kind.as_str(),
            Subject::Version => "version",
            Subject::History => "history",
            Subject::Account => "account",
            Subject::Security => "security",
            Subject::Billing => "billing",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        let subject = match s {
            "page" => Subject::Page,
            "settings" => Subject::Settings,
            "status" => Subject::Status,
            "version" => Subject::Version,
            "history" => Subject::History,
            "account" => Subject::Account,
            "security" => Subject::Security,
            "billing" => Subject::Billing,
            other => Subject::Collection(CollectionKind::parse(other).ok()?),
        };
        Some(subject)
    }

    fn singular(&self) -> &'static str {
        match self {
            Subject::Page => "page",
            Subject::Settings => "settings",
            Subject::Status => "status bar",
            Subject::Collection(kind) => kind.singular(),
            Subject::Version => "version",
            Subject::History => "history",
            Subject::Account => "account",
            Subject::Security => "security settings",
            Subject::Billing => "billing",
        }
    }

    fn plural(&self) -> &'static str {
        match self {
            Subject::Collection(kind) => kind.plural(),
            other => other.singular(),
        }
    }
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Create => "create",
            Verb::Update => "update",
            Verb::Delete => "delete",
            Verb::Reorder => "reorder",
            Verb::Replace => "replace",
            Verb::Backup => "backup",
            Verb::Restore => "restore",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(Verb::Create),
            "update" => Some(Verb::Update),
            "delete" => Some(Verb::Delete),
            "reorder" => Some(Verb::Reorder),
            "replace" => Some(Verb::Replace),
            "backup" => Some(Verb::Backup),
            "restore" => Some(Verb::Restore),
            _ => None,
        }
    }
}

impl ActionKind {
    pub fn new(subject: Subject, verb: Verb) -> Self {
        ActionKind::Standard { subject, verb }
    }

    pub fn collection(kind: CollectionKind, verb: Verb) -> Self {
        ActionKind::Standard {
            subject: Subject::Collection(kind),
            verb,
        }
    }

    /// Parse a stored tag. Never fails: unknown tags become `Custom`.
    pub fn parse(tag: &str) -> Self {
        tag.rsplit_once('.')
            .and_then(|(subject, verb)| {
                Some(ActionKind::Standard {
                    subject: Subject::parse(subject)?,
                    verb: Verb::parse(verb)?,
                })
            })
            .unwrap_or_else(|| ActionKind::Custom(tag.to_string()))
    }

    pub fn tag(&self) -> String {
        match self {
            ActionKind::Standard { subject, verb } => {
                format!("{}.{}", subject.as_str(), verb.as_str())
            }
            ActionKind::Custom(tag) => tag.clone(),
        }
    }

    pub fn category(&self) -> ActionCategory {
        let subject = match self {
            ActionKind::Standard { subject, .. } => subject,
            ActionKind::Custom(_) => return ActionCategory::General,
        };
        match subject {
            Subject::Security => ActionCategory::Security,
            Subject::Billing => ActionCategory::Billing,
            Subject::Settings | Subject::Account => ActionCategory::Profile,
            Subject::Collection(CollectionKind::BackgroundColors)
            | Subject::Collection(CollectionKind::AccentColors)
            | Subject::Status => ActionCategory::Appearance,
            Subject::Collection(_) | Subject::Page => ActionCategory::Content,
            Subject::Version | Subject::History => ActionCategory::History,
        }
    }

    /// Short human phrase, e.g. "Created link" or "Updated settings".
    pub fn phrase(&self) -> String {
        let (subject, verb) = match self {
            ActionKind::Standard { subject, verb } => (subject, verb),
            ActionKind::Custom(tag) => return format!("Performed {}", tag),
        };
        match verb {
            Verb::Create => format!("Created {}", subject.singular()),
            Verb::Update => format!("Updated {}", subject.plural()),
            Verb::Delete => format!("Deleted {}", subject.singular()),
            Verb::Reorder => format!("Reordered {}", subject.plural()),
            Verb::Replace => format!("Replaced {}", subject.plural()),
            Verb::Backup => "Saved a backup".to_string(),
            Verb::Restore => match subject {
                Subject::Version => "Restored page from a saved version".to_string(),
                Subject::History => "Undid later changes".to_string(),
                other => format!("Restored {}", other.plural()),
            },
        }
    }
}

impl From<String> for ActionKind {
    fn from(tag: String) -> Self {
        ActionKind::parse(&tag)
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        kind.tag()
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.tag())
    }
}
