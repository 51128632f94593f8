pub mod activities;
pub mod auth;
pub mod error;
pub mod middleware;
pub mod notifications;
pub mod roles;
pub mod votes;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use auth::AppState;
use middleware::require_auth;

/// Every HTTP route. Everything except `/auth/*` needs a bearer token.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/activities", post(activities::create_activity))
        .route("/activities/{id}", get(activities::get_activity))
        .route("/activities/{id}/join", post(activities::join_activity))
        .route(
            "/activities/{id}/participants/{user_id}",
            post(activities::set_participant_status),
        )
        .route("/activities/{id}/complete", post(activities::complete_activity))
        .route(
            "/activities/{id}/roles",
            get(roles::get_assignments)
                .post(roles::draw_roles)
                .delete(roles::reset_roles),
        )
        .route("/presets/{name}", get(roles::preview_preset))
        .route("/activities/{id}/votes", post(votes::cast_activity_vote))
        .route("/activities/{id}/evaluations", post(votes::submit_evaluation))
        .route(
            "/users/{id}/votes",
            post(votes::toggle_free_vote).put(votes::set_free_vote),
        )
        .route("/users/{id}/reputation", get(votes::get_reputation))
        .route("/notifications", get(notifications::list_notifications))
        .layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
