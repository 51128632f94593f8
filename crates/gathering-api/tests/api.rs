use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use gathering_api::auth::{AppState, AppStateInner};
use gathering_db::Database;
use gathering_engine::EngineConfig;

const SECRET: &str = "test-secret-for-router";

struct TestApp {
    state: AppState,
    router: Router,
}

struct TestUser {
    id: Uuid,
    token: String,
}

impl TestApp {
    fn new() -> Self {
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: SECRET.into(),
            engine: EngineConfig::default(),
        });
        let router = gathering_api::router(state.clone());
        Self { state, router }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn register(&self, username: &str) -> TestUser {
        let (status, body) = self
            .send(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({ "username": username, "password": "correct horse" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        TestUser {
            id: body["user_id"].as_str().unwrap().parse().unwrap(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    async fn create_activity(&self, owner: &TestUser) -> Uuid {
        let (status, body) = self
            .send(
                Method::POST,
                "/activities",
                Some(&owner.token),
                Some(json!({ "title": "friday game night" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["activity"]["id"].as_str().unwrap().parse().unwrap()
    }

    async fn seat(&self, activity_id: Uuid, owner: &TestUser, user: &TestUser) {
        let (status, _) = self
            .send(
                Method::POST,
                &format!("/activities/{activity_id}/join"),
                Some(&user.token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let (status, body) = self
            .send(
                Method::POST,
                &format!("/activities/{activity_id}/participants/{}", user.id),
                Some(&owner.token),
                Some(json!({ "status": "confirmed" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    async fn complete(&self, activity_id: Uuid, owner: &TestUser) {
        let (status, body) = self
            .send(
                Method::POST,
                &format!("/activities/{activity_id}/complete"),
                Some(&owner.token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }
}

#[tokio::test]
async fn test_register_then_login() {
    let app = TestApp::new();
    let alice = app.register("alice").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "correct horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], alice.id.to_string());

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "wrong password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid credentials");
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let app = TestApp::new();
    app.register("alice").await;

    let (status, _) = app
        .send(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "username": "alice", "password": "another one" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_protected_routes_need_token() {
    let app = TestApp::new();

    let (status, _) = app.send(Method::GET, "/notifications", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(Method::GET, "/notifications", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_draw_roles_with_preset_covers_roster() {
    let app = TestApp::new();
    let owner = app.register("owner").await;
    let activity_id = app.create_activity(&owner).await;

    let mut players = Vec::new();
    for i in 0..7 {
        let user = app.register(&format!("player{i}")).await;
        app.seat(activity_id, &owner, &user).await;
        players.push(user);
    }

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/activities/{activity_id}/roles"),
            Some(&owner.token),
            Some(json!({ "preset": "mafia" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let assignments = body["assignments"].as_array().unwrap();
    assert_eq!(assignments.len(), 8);
    let mafia = assignments
        .iter()
        .filter(|a| a["role_name"] == "mafia")
        .count();
    assert_eq!(mafia, 2);

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/activities/{activity_id}/roles"),
            Some(&players[0].token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assignments"].as_array().unwrap().len(), 8);

    let (status, body) = app
        .send(Method::GET, "/notifications", Some(&players[3].token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let notifications = body.as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["kind"], "roles_drawn");
}

#[tokio::test]
async fn test_draw_roles_rejects_mismatch_and_non_owner() {
    let app = TestApp::new();
    let owner = app.register("owner").await;
    let guest = app.register("guest").await;
    let activity_id = app.create_activity(&owner).await;
    app.seat(activity_id, &owner, &guest).await;

    let slots = json!({ "slots": [
        { "name": "spy", "quota": 1, "color_tag": "#000000" },
        { "name": "agent", "quota": 2, "color_tag": "#ffffff" }
    ]});

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/activities/{activity_id}/roles"),
            Some(&owner.token),
            Some(slots.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("quota"), "{body}");

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/activities/{activity_id}/roles"),
            Some(&guest.token),
            Some(json!({ "preset": "two_teams" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/activities/{activity_id}/roles"),
            Some(&owner.token),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reset_roles_reports_removed_rows() {
    let app = TestApp::new();
    let owner = app.register("owner").await;
    let guest = app.register("guest").await;
    let activity_id = app.create_activity(&owner).await;
    app.seat(activity_id, &owner, &guest).await;

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/activities/{activity_id}/roles"),
            Some(&owner.token),
            Some(json!({ "preset": "two_teams" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .send(
            Method::DELETE,
            &format!("/activities/{activity_id}/roles"),
            Some(&owner.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], 2);
}

#[tokio::test]
async fn test_preview_preset() {
    let app = TestApp::new();
    let user = app.register("viewer").await;

    let (status, body) = app
        .send(Method::GET, "/presets/odd_one_out?total=5", Some(&user.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let total: u64 = body
        .as_array()
        .unwrap()
        .iter()
        .map(|slot| slot["quota"].as_u64().unwrap())
        .sum();
    assert_eq!(total, 5);

    let (status, _) = app
        .send(Method::GET, "/presets/werewolf?total=5", Some(&user.token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_activity_vote_flow() {
    let app = TestApp::new();
    let owner = app.register("owner").await;
    let guest = app.register("guest").await;
    let activity_id = app.create_activity(&owner).await;
    app.seat(activity_id, &owner, &guest).await;

    let vote = json!({ "recipient_id": guest.id, "kind": "positive" });

    // Still open.
    let (status, _) = app
        .send(
            Method::POST,
            &format!("/activities/{activity_id}/votes"),
            Some(&owner.token),
            Some(vote.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.complete(activity_id, &owner).await;

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/activities/{activity_id}/votes"),
            Some(&owner.token),
            Some(vote.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["transition"], "inserted");
    assert_eq!(body["score"]["total_score"], 1);

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/activities/{activity_id}/votes"),
            Some(&owner.token),
            Some(vote),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/users/{}/reputation", guest.id),
            Some(&guest.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_score"], 1);
}

#[tokio::test]
async fn test_activity_vote_by_outsider_is_forbidden() {
    let app = TestApp::new();
    let owner = app.register("owner").await;
    let guest = app.register("guest").await;
    let outsider = app.register("outsider").await;
    let activity_id = app.create_activity(&owner).await;
    app.seat(activity_id, &owner, &guest).await;
    app.complete(activity_id, &owner).await;

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/activities/{activity_id}/votes"),
            Some(&outsider.token),
            Some(json!({ "recipient_id": guest.id, "kind": "friendly" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_evaluation_keeps_good_rows() {
    let app = TestApp::new();
    let owner = app.register("owner").await;
    let guest = app.register("guest").await;
    let outsider = app.register("outsider").await;
    let activity_id = app.create_activity(&owner).await;
    app.seat(activity_id, &owner, &guest).await;
    app.complete(activity_id, &owner).await;

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/activities/{activity_id}/evaluations"),
            Some(&owner.token),
            Some(json!({ "votes": [
                { "recipient_id": guest.id, "kind": "positive" },
                { "recipient_id": guest.id, "kind": "funny" },
                { "recipient_id": outsider.id, "kind": "positive" }
            ]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["inserted"], 2);
    assert_eq!(body["row_errors"].as_array().unwrap().len(), 1);
    assert_eq!(body["row_errors"][0]["index"], 2);

    // A second evaluation by the same rater is refused outright.
    let (status, _) = app
        .send(
            Method::POST,
            &format!("/activities/{activity_id}/evaluations"),
            Some(&owner.token),
            Some(json!({ "votes": [{ "recipient_id": guest.id, "kind": "kind" }] })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/activities/{activity_id}/evaluations"),
            Some(&guest.token),
            Some(json!({ "votes": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_free_vote_requires_privilege_and_toggles() {
    let app = TestApp::new();
    let rater = app.register("rater").await;
    let target = app.register("target").await;
    let uri = format!("/users/{}/votes", target.id);
    let vote = json!({ "kind": "reliable" });

    let (status, _) = app
        .send(Method::POST, &uri, Some(&rater.token), Some(vote.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    app.state
        .db
        .set_user_elevated(&rater.id.to_string(), true)
        .unwrap();

    let (status, body) = app
        .send(Method::POST, &uri, Some(&rater.token), Some(vote.clone()))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["transition"], "inserted");
    assert_eq!(body["score"]["keyword_counts"]["reliable"], 1);

    let (status, body) = app
        .send(Method::POST, &uri, Some(&rater.token), Some(vote.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transition"], "deactivated");

    let (status, body) = app
        .send(
            Method::PUT,
            &uri,
            Some(&rater.token),
            Some(json!({ "kind": "reliable", "active": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transition"], "activated");

    let (status, body) = app
        .send(Method::GET, "/notifications", Some(&target.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, ["vote_received", "vote_received"]);
}

#[tokio::test]
async fn test_free_vote_daily_limit() {
    let app = TestApp::new();
    let rater = app.register("rater").await;
    let target = app.register("target").await;
    app.state
        .db
        .set_user_elevated(&rater.id.to_string(), true)
        .unwrap();
    let uri = format!("/users/{}/votes", target.id);

    let (status, _) = app
        .send(
            Method::POST,
            &uri,
            Some(&rater.token),
            Some(json!({ "kind": "positive" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // One new free vote per rater and recipient per day, whatever the kind.
    let (status, body) = app
        .send(
            Method::POST,
            &uri,
            Some(&rater.token),
            Some(json!({ "kind": "considerate" })),
        )
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS, "{body}");
    assert!(body["error"].as_str().unwrap().contains("daily vote limit"));
}

#[tokio::test]
async fn test_votes_about_unknown_user_are_not_found() {
    let app = TestApp::new();
    let rater = app.register("rater").await;
    let ghost = Uuid::new_v4();

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/users/{ghost}/votes"),
            Some(&rater.token),
            Some(json!({ "kind": "positive" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            Method::GET,
            &format!("/users/{ghost}/reputation"),
            Some(&rater.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
