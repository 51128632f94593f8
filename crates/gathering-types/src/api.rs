use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Activity, Participant, RoleAssignment, RoleSlot, VoteKind};

// -- JWT Claims --

/// JWT claims issued by `/auth/*` and checked by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Activities --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateActivityRequest {
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub activity: Activity,
    pub participants: Vec<Participant>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetParticipantStatusRequest {
    pub status: crate::models::ParticipantStatus,
}

// -- Roles --

/// Either an explicit slot list or the name of a built-in preset.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DrawRolesRequest {
    pub slots: Option<Vec<RoleSlot>>,
    pub preset: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssignmentsResponse {
    pub activity_id: Uuid,
    pub assignments: Vec<RoleAssignment>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetRolesResponse {
    pub removed: usize,
}

#[derive(Debug, Deserialize)]
pub struct PresetQuery {
    pub total: u32,
}

// -- Votes --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CastVoteRequest {
    pub recipient_id: Uuid,
    pub kind: VoteKind,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluationRequest {
    pub votes: Vec<CastVoteRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FreeVoteRequest {
    pub kind: VoteKind,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetFreeVoteRequest {
    pub kind: VoteKind,
    pub active: bool,
}

// -- Notifications --

#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
