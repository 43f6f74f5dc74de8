//! Integration tests for the HTTP API against the in-memory store.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use matchplay::TournamentController;
use matchplay::db::MemoryBracketStore;
use matchplay::services::{LogNotifier, LogPrizeService};
use mp_server::api::{AppState, create_router};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot` method

const ADMIN: i64 = 1000;

fn create_test_server() -> Router {
    let controller = TournamentController::new(
        Arc::new(MemoryBracketStore::new()),
        Arc::new(LogNotifier),
        Arc::new(LogPrizeService::new()),
    );
    create_router(AppState { controller })
}

/// Caller identity as set by the gateway
#[derive(Clone, Copy)]
enum As {
    Anonymous,
    Player(i64),
    Admin,
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    caller: As,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    match caller {
        As::Anonymous => {}
        As::Player(id) => builder = builder.header("x-user-id", id.to_string()),
        As::Admin => {
            builder = builder
                .header("x-user-id", ADMIN.to_string())
                .header("x-user-role", "admin")
        }
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Two players in an eight-slot bracket. Byes carry both of them into the final.
async fn final_between_one_and_two(app: &Router) -> (i64, i64) {
    let (status, tournament) = send(
        app,
        "POST",
        "/api/v1/tournaments",
        As::Admin,
        Some(json!({"name": "HTTP Cup", "max_participants": 8, "entry_fee": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = tournament["id"].as_i64().unwrap();

    for user in [1, 2] {
        let (status, _) = send(
            app,
            "POST",
            &format!("/api/v1/tournaments/{id}/participants"),
            As::Player(user),
            Some(json!({"entrant": format!("team-{user}")})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = send(
        app,
        "POST",
        &format!("/api/v1/tournaments/{id}/check-in/open"),
        As::Admin,
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for user in [1, 2] {
        let (status, participant) = send(
            app,
            "POST",
            &format!("/api/v1/tournaments/{id}/check-in"),
            As::Player(user),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(participant["is_checked_in"], true);
    }

    let (status, outcome) = send(
        app,
        "POST",
        &format!("/api/v1/tournaments/{id}/bracket"),
        As::Admin,
        Some(json!({"seeds": [1, 2]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["outcome"], "started");
    assert_eq!(outcome["matches"], 7);

    let (_, bracket) = send(
        app,
        "GET",
        &format!("/api/v1/tournaments/{id}/bracket"),
        As::Player(1),
        None,
    )
    .await;
    let final_match = &bracket["rounds"][2][0];
    assert_eq!(final_match["player1"], 1);
    assert_eq!(final_match["player2"], 2);
    assert_eq!(final_match["status"], "scheduled");

    (id, final_match["id"].as_i64().unwrap())
}

// ============================================================================
// Health and Middleware Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_endpoint() {
    let app = create_test_server();

    let (status, body) = send(&app, "GET", "/health", As::Anonymous, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let app = create_test_server();

    let (status, _) = send(&app, "GET", "/api/v1/tournaments/1", As::Anonymous, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_request_id_echoed() {
    let app = create_test_server();

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-me")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.headers()["x-request-id"], "trace-me");
}

// ============================================================================
// Tournament Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_create_requires_admin() {
    let app = create_test_server();

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/tournaments",
        As::Player(5),
        Some(json!({"name": "Cup", "max_participants": 8})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("Admin"));
}

#[tokio::test]
async fn test_create_rejects_unsupported_size() {
    let app = create_test_server();

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/tournaments",
        As::Admin,
        Some(json!({"name": "Cup", "max_participants": 12})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_tournament() {
    let app = create_test_server();

    let (status, body) = send(&app, "GET", "/api/v1/tournaments/77", As::Player(1), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Tournament not found: 77");
}

#[tokio::test]
async fn test_double_registration_conflicts() {
    let app = create_test_server();
    let (_, tournament) = send(
        &app,
        "POST",
        "/api/v1/tournaments",
        As::Admin,
        Some(json!({"name": "Cup", "max_participants": 8})),
    )
    .await;
    let uri = format!("/api/v1/tournaments/{}/participants", tournament["id"]);

    let (status, _) = send(&app, "POST", &uri, As::Player(3), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, "POST", &uri, As::Player(3), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, "DELETE", &uri, As::Player(3), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "DELETE", &uri, As::Player(3), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_open_tournament() {
    let app = create_test_server();
    let (_, tournament) = send(
        &app,
        "POST",
        "/api/v1/tournaments",
        As::Admin,
        Some(json!({"name": "Cup", "max_participants": 16})),
    )
    .await;
    let uri = format!("/api/v1/tournaments/{}/cancel", tournament["id"]);

    let (status, _) = send(
        &app,
        "POST",
        &uri,
        As::Player(3),
        Some(json!({"reason": "rain"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "POST", &uri, As::Admin, Some(json!({"reason": "rain"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let (status, _) = send(&app, "POST", &uri, As::Admin, Some(json!({"reason": "again"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// ============================================================================
// Match Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_report_and_confirm_crowns_champion() {
    let app = create_test_server();
    let (id, match_id) = final_between_one_and_two(&app).await;

    let (status, update) = send(
        &app,
        "POST",
        &format!("/api/v1/matches/{match_id}/result"),
        As::Player(1),
        Some(json!({"score": {"player1": 2, "player2": 1}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(update["transition"]["kind"], "awaiting_confirmation");

    // Reporter cannot confirm their own score
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/matches/{match_id}/confirm"),
        As::Player(1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, update) = send(
        &app,
        "POST",
        &format!("/api/v1/matches/{match_id}/confirm"),
        As::Player(2),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(update["transition"]["kind"], "completed");
    assert_eq!(update["transition"]["winner"], 1);
    assert_eq!(update["advance"]["champion"], 1);

    let (_, tournament) = send(
        &app,
        "GET",
        &format!("/api/v1/tournaments/{id}"),
        As::Player(2),
        None,
    )
    .await;
    assert_eq!(tournament["status"], "completed");
    assert_eq!(tournament["champion_user"], 1);
}

#[tokio::test]
async fn test_tie_and_outsider_rejected() {
    let app = create_test_server();
    let (_, match_id) = final_between_one_and_two(&app).await;
    let uri = format!("/api/v1/matches/{match_id}/result");

    let (status, _) = send(
        &app,
        "POST",
        &uri,
        As::Player(1),
        Some(json!({"score": {"player1": 1, "player2": 1}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        &uri,
        As::Player(9),
        Some(json!({"score": {"player1": 2, "player2": 0}})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_dispute_resolved_by_admin() {
    let app = create_test_server();
    let (_, match_id) = final_between_one_and_two(&app).await;

    let (status, game) = send(
        &app,
        "POST",
        &format!("/api/v1/matches/{match_id}/start"),
        As::Player(1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(game["status"], "ongoing");

    let (status, game) = send(
        &app,
        "POST",
        &format!("/api/v1/matches/{match_id}/dispute"),
        As::Player(2),
        Some(json!({"reason": "opponent used a banned deck", "proof": "https://clips/1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(game["status"], "dispute");

    let resolve = format!("/api/v1/matches/{match_id}/resolve");
    let (status, _) = send(
        &app,
        "POST",
        &resolve,
        As::Player(2),
        Some(json!({"winner": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, update) = send(
        &app,
        "POST",
        &resolve,
        As::Admin,
        Some(json!({"winner": 2, "note": "deck list checked"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(update["game"]["winner"], 2);
    assert_eq!(update["game"]["dispute"]["decision"]["resolved_by"], ADMIN);
    assert_eq!(update["advance"]["champion"], 2);
}

#[tokio::test]
async fn test_advance_replay_is_admin_only_and_idempotent() {
    let app = create_test_server();
    let (_, match_id) = final_between_one_and_two(&app).await;
    send(
        &app,
        "POST",
        &format!("/api/v1/matches/{match_id}/result"),
        As::Player(2),
        Some(json!({"score": {"player1": 0, "player2": 3}})),
    )
    .await;
    send(
        &app,
        "POST",
        &format!("/api/v1/matches/{match_id}/confirm"),
        As::Player(1),
        None,
    )
    .await;

    let uri = format!("/api/v1/matches/{match_id}/advance");
    let (status, _) = send(&app, "POST", &uri, As::Player(1), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, report) = send(&app, "POST", &uri, As::Admin, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["events"], json!([]));
}

#[tokio::test]
async fn test_repair_needs_admin_and_a_halted_bracket() {
    let app = create_test_server();
    let (id, _) = final_between_one_and_two(&app).await;
    let uri = format!("/api/v1/tournaments/{id}/repair");

    let (status, _) = send(&app, "POST", &uri, As::Player(1), Some(json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "POST", &uri, As::Admin, Some(json!({"slots": []}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("not halted"));
}

#[tokio::test]
async fn test_unknown_match() {
    let app = create_test_server();

    let (status, _) = send(&app, "GET", "/api/v1/matches/404", As::Player(1), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
