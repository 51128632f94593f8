//! Database row types. These map directly to SQLite rows.
//! Distinct from gathering-types models to keep the DB layer independent.
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use gathering_types::api::NotificationResponse;
use gathering_types::models::{
    Activity, ActivityStatus, Participant, ParticipantStatus, RoleAssignment, User, Vote,
};

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub password: String,
    pub elevated: bool,
    pub created_at: String,
}

pub struct ActivityRow {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub status: String,
    pub created_at: String,
}

pub struct ParticipantRow {
    pub activity_id: String,
    pub user_id: String,
    pub status: String,
}

pub struct AssignmentRow {
    pub activity_id: String,
    pub participant_id: String,
    pub role_name: String,
    pub color_tag: String,
}

pub struct VoteRow {
    pub id: String,
    pub rater_id: String,
    pub recipient_id: String,
    pub kind: String,
    pub activity_id: Option<String>,
    pub active: bool,
    pub created_at: String,
}

pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub payload: String,
    pub created_at: String,
}

pub(crate) fn parse_id(raw: &str, column: &str) -> Result<Uuid> {
    raw.parse()
        .with_context(|| format!("corrupt {} '{}'", column, raw))
}

/// Accepts RFC 3339 as well as SQLite's `datetime('now')` format.
pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

pub(crate) fn activity_status_str(status: ActivityStatus) -> &'static str {
    match status {
        ActivityStatus::Open => "open",
        ActivityStatus::Completed => "completed",
        ActivityStatus::Cancelled => "cancelled",
    }
}

pub(crate) fn participant_status_str(status: ParticipantStatus) -> &'static str {
    match status {
        ParticipantStatus::Pending => "pending",
        ParticipantStatus::Confirmed => "confirmed",
        ParticipantStatus::Rejected => "rejected",
    }
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: parse_id(&row.id, "user id")?,
            username: row.username,
            display_name: row.display_name,
            elevated: row.elevated,
            created_at: parse_timestamp(&row.created_at),
        })
    }
}

impl TryFrom<ActivityRow> for Activity {
    type Error = anyhow::Error;

    fn try_from(row: ActivityRow) -> Result<Self> {
        let status = match row.status.as_str() {
            "open" => ActivityStatus::Open,
            "completed" => ActivityStatus::Completed,
            "cancelled" => ActivityStatus::Cancelled,
            other => return Err(anyhow!("corrupt status '{}' on activity '{}'", other, row.id)),
        };
        Ok(Activity {
            id: parse_id(&row.id, "activity id")?,
            owner_id: parse_id(&row.owner_id, "owner_id")?,
            title: row.title,
            status,
            created_at: parse_timestamp(&row.created_at),
        })
    }
}

impl TryFrom<ParticipantRow> for Participant {
    type Error = anyhow::Error;

    fn try_from(row: ParticipantRow) -> Result<Self> {
        let status = match row.status.as_str() {
            "pending" => ParticipantStatus::Pending,
            "confirmed" => ParticipantStatus::Confirmed,
            "rejected" => ParticipantStatus::Rejected,
            other => return Err(anyhow!("corrupt participant status '{}'", other)),
        };
        Ok(Participant {
            activity_id: parse_id(&row.activity_id, "activity_id")?,
            user_id: parse_id(&row.user_id, "user_id")?,
            status,
        })
    }
}

impl TryFrom<AssignmentRow> for RoleAssignment {
    type Error = anyhow::Error;

    fn try_from(row: AssignmentRow) -> Result<Self> {
        Ok(RoleAssignment {
            activity_id: parse_id(&row.activity_id, "activity_id")?,
            participant_id: parse_id(&row.participant_id, "participant_id")?,
            role_name: row.role_name,
            color_tag: row.color_tag,
        })
    }
}

impl TryFrom<VoteRow> for Vote {
    type Error = anyhow::Error;

    fn try_from(row: VoteRow) -> Result<Self> {
        Ok(Vote {
            id: parse_id(&row.id, "vote id")?,
            rater_id: parse_id(&row.rater_id, "rater_id")?,
            recipient_id: parse_id(&row.recipient_id, "recipient_id")?,
            kind: row.kind.parse()?,
            activity_id: row
                .activity_id
                .as_deref()
                .map(|id| parse_id(id, "activity_id"))
                .transpose()?,
            active: row.active,
            created_at: parse_timestamp(&row.created_at),
        })
    }
}

impl TryFrom<NotificationRow> for NotificationResponse {
    type Error = anyhow::Error;

    fn try_from(row: NotificationRow) -> Result<Self> {
        let payload = serde_json::from_str(&row.payload).unwrap_or_else(|e| {
            warn!("Corrupt payload on notification '{}': {}", row.id, e);
            serde_json::Value::Null
        });
        Ok(NotificationResponse {
            id: parse_id(&row.id, "notification id")?,
            kind: row.kind,
            payload,
            created_at: parse_timestamp(&row.created_at),
        })
    }
}
