use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use gathering_types::api::{Claims, NotificationResponse};

use crate::auth::{AppState, blocking};
use crate::error::ApiError;

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 200;

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    pub limit: Option<u32>,
}

/// Newest first.
pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let notifications = blocking(&state, move |s| {
        let rows = s.db.get_notifications(&claims.sub.to_string(), limit)?;
        let notifications = rows
            .into_iter()
            .map(NotificationResponse::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(notifications)
    })
    .await?;

    Ok(Json(notifications))
}
