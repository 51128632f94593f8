use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use gathering_engine::{Ballot, ReputationAggregator, SystemClock};
use gathering_types::api::{
    CastVoteRequest, Claims, EvaluationRequest, FreeVoteRequest, SetFreeVoteRequest,
};
use gathering_types::models::VoteScope;

use crate::auth::{AppState, AppStateInner, blocking};
use crate::error::ApiError;

fn aggregator(
    s: &AppStateInner,
) -> ReputationAggregator<'_, gathering_db::Database, gathering_db::Database, gathering_db::Database, SystemClock>
{
    ReputationAggregator::new(&s.db, &s.db, &s.db, &SystemClock)
}

fn require_user(s: &AppStateInner, user_id: Uuid) -> Result<(), ApiError> {
    s.db
        .get_user_by_id(&user_id.to_string())?
        .map(|_| ())
        .ok_or(ApiError::NotFound("user"))
}

/// POST /activities/{id}/votes: one vote about one fellow member.
pub async fn cast_activity_vote(
    State(state): State<AppState>,
    Path(activity_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CastVoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = blocking(&state, move |s| {
        Ok(aggregator(s).cast_vote(
            claims.sub,
            req.recipient_id,
            req.kind,
            VoteScope::Activity { activity_id },
        )?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

/// POST /activities/{id}/evaluations: the rater's whole evaluation at once.
pub async fn submit_evaluation(
    State(state): State<AppState>,
    Path(activity_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<EvaluationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ballots: Vec<Ballot> = req
        .votes
        .into_iter()
        .map(|v| Ballot {
            recipient_id: v.recipient_id,
            kind: v.kind,
        })
        .collect();

    let outcome = blocking(&state, move |s| {
        Ok(aggregator(s).batch_cast_and_recompute(claims.sub, activity_id, &ballots)?)
    })
    .await?;

    Ok(Json(outcome))
}

/// POST /users/{id}/votes: toggles a free-scope vote.
pub async fn toggle_free_vote(
    State(state): State<AppState>,
    Path(recipient_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<FreeVoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = blocking(&state, move |s| {
        require_user(s, recipient_id)?;
        Ok(aggregator(s).cast_vote(claims.sub, recipient_id, req.kind, VoteScope::Free)?)
    })
    .await?;

    Ok(Json(outcome))
}

/// PUT /users/{id}/votes: moves a free-scope vote to an explicit state.
pub async fn set_free_vote(
    State(state): State<AppState>,
    Path(recipient_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SetFreeVoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = blocking(&state, move |s| {
        require_user(s, recipient_id)?;
        Ok(aggregator(s).set_free_vote(claims.sub, recipient_id, req.kind, req.active)?)
    })
    .await?;

    Ok(Json(outcome))
}

pub async fn get_reputation(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let score = blocking(&state, move |s| {
        require_user(s, user_id)?;
        Ok(aggregator(s).score(user_id)?)
    })
    .await?;

    Ok(Json(score))
}
