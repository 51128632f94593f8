use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    /// Grants free-scope voting outside of a shared activity.
    pub elevated: bool,
    pub created_at: DateTime<Utc>,
}

// -- Activities --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Open,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub status: ActivityStatus,
    pub created_at: DateTime<Utc>,
}

impl Activity {
    pub fn is_completed(&self) -> bool {
        self.status == ActivityStatus::Completed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Pending,
    Confirmed,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub activity_id: Uuid,
    pub user_id: Uuid,
    pub status: ParticipantStatus,
}

// -- Roles --

/// A named role with how many participants should receive it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSlot {
    pub name: String,
    pub quota: u32,
    pub color_tag: String,
}

impl RoleSlot {
    pub fn new(name: impl Into<String>, quota: u32, color_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quota,
            color_tag: color_tag.into(),
        }
    }
}

/// One unassigned unit of role inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleToken {
    pub role_name: String,
    pub color_tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub activity_id: Uuid,
    pub participant_id: Uuid,
    pub role_name: String,
    pub color_tag: String,
}

// -- Votes --

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown vote kind: {0}")]
pub struct UnknownVoteKind(pub String);

/// Descriptive tags a rater can attach to someone they rated positively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Keyword {
    Kind,
    Punctual,
    Friendly,
    Funny,
    Reliable,
    Considerate,
    Active,
    GoodListener,
}

impl Keyword {
    pub const ALL: [Keyword; 8] = [
        Keyword::Kind,
        Keyword::Punctual,
        Keyword::Friendly,
        Keyword::Funny,
        Keyword::Reliable,
        Keyword::Considerate,
        Keyword::Active,
        Keyword::GoodListener,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Kind => "kind",
            Keyword::Punctual => "punctual",
            Keyword::Friendly => "friendly",
            Keyword::Funny => "funny",
            Keyword::Reliable => "reliable",
            Keyword::Considerate => "considerate",
            Keyword::Active => "active",
            Keyword::GoodListener => "good_listener",
        }
    }
}

impl FromStr for Keyword {
    type Err = UnknownVoteKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Keyword::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownVoteKind(s.to_string()))
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a vote says about its recipient. Serialized as a flat string so that
/// `"positive"`, `"negative"` and every keyword share one column/field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum VoteKind {
    Positive,
    Negative,
    Keyword(Keyword),
}

impl FromStr for VoteKind {
    type Err = UnknownVoteKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(VoteKind::Positive),
            "negative" => Ok(VoteKind::Negative),
            other => other.parse().map(VoteKind::Keyword),
        }
    }
}

impl fmt::Display for VoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteKind::Positive => f.write_str("positive"),
            VoteKind::Negative => f.write_str("negative"),
            VoteKind::Keyword(k) => k.fmt(f),
        }
    }
}

impl From<VoteKind> for String {
    fn from(kind: VoteKind) -> Self {
        kind.to_string()
    }
}

impl TryFrom<String> for VoteKind {
    type Error = UnknownVoteKind;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Where a vote was cast: inside a shared activity, or freely between users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum VoteScope {
    Activity { activity_id: Uuid },
    Free,
}

impl VoteScope {
    pub fn activity_id(&self) -> Option<Uuid> {
        match self {
            VoteScope::Activity { activity_id } => Some(*activity_id),
            VoteScope::Free => None,
        }
    }
}

impl From<Option<Uuid>> for VoteScope {
    fn from(activity_id: Option<Uuid>) -> Self {
        match activity_id {
            Some(activity_id) => VoteScope::Activity { activity_id },
            None => VoteScope::Free,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: Uuid,
    pub rater_id: Uuid,
    pub recipient_id: Uuid,
    pub kind: VoteKind,
    pub activity_id: Option<Uuid>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(rater_id: Uuid, recipient_id: Uuid, kind: VoteKind, scope: VoteScope) -> Self {
        Self {
            id: Uuid::new_v4(),
            rater_id,
            recipient_id,
            kind,
            activity_id: scope.activity_id(),
            active: true,
            created_at: Utc::now(),
        }
    }

    pub fn scope(&self) -> VoteScope {
        self.activity_id.into()
    }
}

/// Derived tally of every active vote about one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationScore {
    pub subject_id: Uuid,
    pub total_score: i64,
    pub keyword_counts: BTreeMap<Keyword, u32>,
}

impl ReputationScore {
    pub fn empty(subject_id: Uuid) -> Self {
        Self {
            subject_id,
            total_score: 0,
            keyword_counts: BTreeMap::new(),
        }
    }

    pub fn keyword_count(&self, keyword: Keyword) -> u32 {
        self.keyword_counts.get(&keyword).copied().unwrap_or(0)
    }
}
