use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use gathering_engine::ActivityDirectory;
use gathering_types::api::{
    ActivityResponse, Claims, CreateActivityRequest, SetParticipantStatusRequest,
};
use gathering_types::models::{Activity, ActivityStatus, Participant};

use crate::auth::{AppState, AppStateInner, blocking};
use crate::error::ApiError;

const MAX_TITLE_LEN: usize = 100;

pub(crate) fn load_activity(s: &AppStateInner, activity_id: Uuid) -> Result<Activity, ApiError> {
    s.db.activity(activity_id)?
        .ok_or(ApiError::NotFound("activity"))
}

fn owned_activity(s: &AppStateInner, activity_id: Uuid, user_id: Uuid) -> Result<Activity, ApiError> {
    let activity = load_activity(s, activity_id)?;
    if activity.owner_id != user_id {
        return Err(ApiError::Forbidden("only the owner can do this".into()));
    }
    Ok(activity)
}

fn activity_response(s: &AppStateInner, activity: Activity) -> Result<ActivityResponse, ApiError> {
    let participants = s
        .db
        .get_participants(&activity.id.to_string())?
        .into_iter()
        .map(Participant::try_from)
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(ActivityResponse {
        activity,
        participants,
    })
}

pub async fn create_activity(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateActivityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = req.title.trim().to_string();
    if title.is_empty() || title.len() > MAX_TITLE_LEN {
        return Err(ApiError::BadRequest(format!(
            "title must be 1-{MAX_TITLE_LEN} characters"
        )));
    }

    let activity_id = Uuid::new_v4();
    let response = blocking(&state, move |s| {
        s.db
            .create_activity(&activity_id.to_string(), &claims.sub.to_string(), &title)?;
        let activity = load_activity(s, activity_id)?;
        activity_response(s, activity)
    })
    .await?;

    info!("Activity {} created by {}", activity_id, response.activity.owner_id);
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_activity(
    State(state): State<AppState>,
    Path(activity_id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let response = blocking(&state, move |s| {
        let activity = load_activity(s, activity_id)?;
        activity_response(s, activity)
    })
    .await?;
    Ok(Json(response))
}

/// Requests a seat. The owner confirms or rejects it later.
pub async fn join_activity(
    State(state): State<AppState>,
    Path(activity_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |s| {
        let activity = load_activity(s, activity_id)?;
        if activity.status != ActivityStatus::Open {
            return Err(ApiError::Conflict("activity is no longer open".into()));
        }
        s.db
            .join_activity(&activity_id.to_string(), &claims.sub.to_string())?;
        Ok(())
    })
    .await?;

    Ok(StatusCode::ACCEPTED)
}

pub async fn set_participant_status(
    State(state): State<AppState>,
    Path((activity_id, user_id)): Path<(Uuid, Uuid)>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SetParticipantStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let status = req.status;
    let response = blocking(&state, move |s| {
        let activity = owned_activity(s, activity_id, claims.sub)?;
        let updated =
            s.db
                .set_participant_status(&activity_id.to_string(), &user_id.to_string(), status)?;
        if !updated {
            return Err(ApiError::NotFound("participant"));
        }
        activity_response(s, activity)
    })
    .await?;

    info!(
        "Participant {} of activity {} set to {:?}",
        user_id, activity_id, status
    );
    Ok(Json(response))
}

/// Closes the activity so members can evaluate each other.
pub async fn complete_activity(
    State(state): State<AppState>,
    Path(activity_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let response = blocking(&state, move |s| {
        owned_activity(s, activity_id, claims.sub)?;
        s.db
            .set_activity_status(&activity_id.to_string(), ActivityStatus::Completed)?;
        let activity = load_activity(s, activity_id)?;
        activity_response(s, activity)
    })
    .await?;

    info!("Activity {} completed", activity_id);
    Ok(Json(response))
}
