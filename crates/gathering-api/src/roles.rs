use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use gathering_engine::{ActivityDirectory, Preset, RoleDrawService};
use gathering_types::api::{
    AssignmentsResponse, Claims, DrawRolesRequest, PresetQuery, ResetRolesResponse,
};
use gathering_types::models::RoleSlot;

use crate::activities::load_activity;
use crate::auth::{AppState, AppStateInner, blocking};
use crate::error::ApiError;

/// Explicit slots win; a preset is sized to the activity's current roster.
fn resolve_slots(
    s: &AppStateInner,
    activity_id: Uuid,
    req: DrawRolesRequest,
) -> Result<Vec<RoleSlot>, ApiError> {
    match (req.slots, req.preset) {
        (Some(slots), None) => Ok(slots),
        (None, Some(name)) => {
            let preset: Preset = name.parse().map_err(gathering_engine::EngineError::from)?;
            let activity = load_activity(s, activity_id)?;
            let total = s.db.roster(&activity)?.len() as u32;
            Ok(preset.slots(total))
        }
        _ => Err(ApiError::BadRequest(
            "provide exactly one of `slots` or `preset`".into(),
        )),
    }
}

pub async fn get_assignments(
    State(state): State<AppState>,
    Path(activity_id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let assignments = blocking(&state, move |s| {
        load_activity(s, activity_id)?;
        let service = RoleDrawService::new(&s.db, &s.db, s.engine);
        Ok(service.assignments(activity_id)?)
    })
    .await?;

    Ok(Json(AssignmentsResponse {
        activity_id,
        assignments,
    }))
}

pub async fn draw_roles(
    State(state): State<AppState>,
    Path(activity_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<DrawRolesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let assignments = blocking(&state, move |s| {
        let slots = resolve_slots(s, activity_id, req)?;
        let service = RoleDrawService::new(&s.db, &s.db, s.engine);
        Ok(service.draw(claims.sub, activity_id, &slots)?)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(AssignmentsResponse {
            activity_id,
            assignments,
        }),
    ))
}

pub async fn reset_roles(
    State(state): State<AppState>,
    Path(activity_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = blocking(&state, move |s| {
        let service = RoleDrawService::new(&s.db, &s.db, s.engine);
        Ok(service.reset(claims.sub, activity_id)?)
    })
    .await?;

    Ok(Json(ResetRolesResponse { removed }))
}

/// GET /presets/{name}?total=n: the slots a preset would use, without drawing.
pub async fn preview_preset(
    Path(name): Path<String>,
    Query(query): Query<PresetQuery>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let preset: Preset = name.parse().map_err(gathering_engine::EngineError::from)?;
    Ok(Json(preset.slots(query.total)))
}
