use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use gathering_types::models::VoteKind;

/// Malformed input or a precondition on the activity's state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("role quotas add up to {actual} but there are {expected} participants")]
    QuotaMismatch { expected: usize, actual: usize },

    #[error("at least one role slot is required")]
    NoSlots,

    #[error("{count} role slots exceed the limit of {max}")]
    TooManySlots { count: usize, max: usize },

    #[error("role slot #{index} has a blank name")]
    BlankRoleName { index: usize },

    #[error("role '{name}' must have a quota of at least 1")]
    ZeroQuota { name: String },

    #[error("unknown role preset '{0}'")]
    UnknownPreset(String),

    #[error("activity {0} is not completed yet")]
    ActivityNotCompleted(Uuid),

    #[error("users cannot vote for themselves")]
    SelfVote,

    #[error("an evaluation needs at least one vote")]
    EmptyBatch,
}

/// The caller is not allowed to perform the action.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("only the owner of activity {activity_id} can do this")]
    NotOwner { activity_id: Uuid },

    #[error("rater {user_id} is not a confirmed member of activity {activity_id}")]
    RaterNotMember { user_id: Uuid, activity_id: Uuid },

    #[error("recipient {user_id} is not a confirmed member of activity {activity_id}")]
    RecipientNotMember { user_id: Uuid, activity_id: Uuid },

    #[error("free voting requires elevated privilege")]
    PrivilegeRequired,
}

/// The action collides with an existing record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConflictError {
    #[error("'{kind}' vote for {recipient_id} was already cast in activity {activity_id}")]
    DuplicateVote {
        recipient_id: Uuid,
        kind: VoteKind,
        activity_id: Uuid,
    },

    #[error("activity {activity_id} was already evaluated by this rater")]
    AlreadyEvaluated { activity_id: Uuid },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error("daily vote limit reached for {recipient_id} on {day}")]
    RateLimited { recipient_id: Uuid, day: NaiveDate },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl EngineError {
    pub fn activity_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity: "activity",
            id,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
