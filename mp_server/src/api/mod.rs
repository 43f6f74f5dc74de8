//! HTTP API for the tournament server.
//!
//! # Modules
//!
//! - [`tournaments`]: tournament lifecycle, registration, check-in and brackets
//! - [`matches`]: match results, disputes and advancement
//! - [`identity`]: caller identity from gateway headers
//! - [`request_id`]: request correlation and HTTP metrics
//! - [`error`]: engine error to status code mapping
//!
//! # Endpoints
//!
//! ```text
//! GET    /health                                    - Health check (public)
//! POST   /api/v1/tournaments                        - Create tournament (admin)
//! GET    /api/v1/tournaments/{id}                   - Tournament details
//! POST   /api/v1/tournaments/{id}/participants      - Register caller
//! DELETE /api/v1/tournaments/{id}/participants      - Unregister caller
//! POST   /api/v1/tournaments/{id}/check-in/open     - Open check-in (admin)
//! POST   /api/v1/tournaments/{id}/check-in          - Check caller in
//! POST   /api/v1/tournaments/{id}/bracket           - Close check-in, build bracket (admin)
//! GET    /api/v1/tournaments/{id}/bracket           - Bracket by round
//! POST   /api/v1/tournaments/{id}/cancel            - Cancel tournament (admin)
//! POST   /api/v1/tournaments/{id}/repair            - Repair halted bracket (admin)
//! GET    /api/v1/matches/{id}                       - Match details
//! POST   /api/v1/matches/{id}/start                 - Open match room
//! POST   /api/v1/matches/{id}/result                - Report score
//! POST   /api/v1/matches/{id}/confirm               - Confirm opponent's score
//! POST   /api/v1/matches/{id}/dispute               - Contest match
//! POST   /api/v1/matches/{id}/resolve               - Settle dispute (admin)
//! POST   /api/v1/matches/{id}/advance               - Replay advancement (admin)
//! ```
//!
//! Every `/api/v1` route requires the `x-user-id` header.

pub mod error;
pub mod identity;
pub mod matches;
pub mod request_id;
pub mod tournaments;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use matchplay::TournamentController;
use serde_json::json;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub controller: TournamentController,
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Example
///
/// ```rust,no_run
/// # use mp_server::api::{create_router, AppState};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let state: AppState = unimplemented!();
/// let app = create_router(state);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", create_v1_router())
        .route_layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/tournaments", post(tournaments::create_tournament))
        .route("/tournaments/{id}", get(tournaments::get_tournament))
        .route(
            "/tournaments/{id}/participants",
            post(tournaments::register).delete(tournaments::unregister),
        )
        .route(
            "/tournaments/{id}/check-in/open",
            post(tournaments::open_check_in),
        )
        .route("/tournaments/{id}/check-in", post(tournaments::check_in))
        .route(
            "/tournaments/{id}/bracket",
            get(tournaments::get_bracket).post(tournaments::build_bracket),
        )
        .route("/tournaments/{id}/cancel", post(tournaments::cancel))
        .route("/tournaments/{id}/repair", post(tournaments::repair))
        .route("/matches/{id}", get(matches::get_match))
        .route("/matches/{id}/start", post(matches::start))
        .route("/matches/{id}/result", post(matches::submit_result))
        .route("/matches/{id}/confirm", post(matches::confirm))
        .route("/matches/{id}/dispute", post(matches::open_dispute))
        .route("/matches/{id}/resolve", post(matches::resolve_dispute))
        .route("/matches/{id}/advance", post(matches::advance))
        .route_layer(axum::middleware::from_fn(identity::identity_middleware))
}

/// Health check endpoint for monitoring and load balancers.
///
/// Probes the store by looking up a tournament id that never exists; a miss
/// means the store answered.
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","store":true,"timestamp":"2026-10-18T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_healthy = state.controller.store().get_tournament(0).await.is_ok();

    let status_code = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if store_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "store": store_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
