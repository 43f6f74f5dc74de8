//! Match API handlers.
//!
//! Report a score, oriented by match slots:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/matches/12/result \
//!   -H "x-user-id: 42" -H "Content-Type: application/json" \
//!   -d '{"score": {"player1": 2, "player2": 1}}'
//! ```

use axum::{
    Json,
    extract::{Extension, Path, State},
};
use matchplay::bracket::AdvanceReport;
use matchplay::matches::{DisputeDecision, Match, MatchId, Score};
use matchplay::tournament::{MatchUpdate, UserId};
use serde::Deserialize;

use super::AppState;
use super::error::ApiError;
use super::identity::Identity;

#[derive(Debug, Deserialize)]
pub struct ResultPayload {
    pub score: Score,
}

#[derive(Debug, Deserialize)]
pub struct DisputePayload {
    pub reason: String,
    /// Link to a screenshot or recording
    #[serde(default)]
    pub proof: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolvePayload {
    pub winner: UserId,
    /// Final score, kept empty when the ruling is not based on one
    #[serde(default)]
    pub score: Option<Score>,
    #[serde(default)]
    pub note: Option<String>,
}

pub async fn get_match(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
) -> Result<Json<Match>, ApiError> {
    Ok(Json(state.controller.get_match(match_id).await?))
}

/// Open the match room. Only the two players may start a match.
pub async fn start(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(match_id): Path<MatchId>,
) -> Result<Json<Match>, ApiError> {
    let game = state
        .controller
        .start_match(match_id, identity.user_id)
        .await?;
    Ok(Json(game))
}

/// Report a score.
///
/// The first report waits for the opponent's confirmation. A second report
/// that disagrees with the first opens a dispute.
///
/// # Errors
///
/// - `400 Bad Request`: tied score
/// - `403 Forbidden`: caller is not playing this match
/// - `409 Conflict`: players not known yet, or match already decided
pub async fn submit_result(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(match_id): Path<MatchId>,
    Json(payload): Json<ResultPayload>,
) -> Result<Json<MatchUpdate>, ApiError> {
    let update = state
        .controller
        .submit_match_result(match_id, identity.user_id, payload.score)
        .await?;
    Ok(Json(update))
}

/// Confirm the opponent's report, completing the match and advancing the winner.
pub async fn confirm(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(match_id): Path<MatchId>,
) -> Result<Json<MatchUpdate>, ApiError> {
    let update = state
        .controller
        .confirm_match_result(match_id, identity.user_id)
        .await?;
    Ok(Json(update))
}

pub async fn open_dispute(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(match_id): Path<MatchId>,
    Json(payload): Json<DisputePayload>,
) -> Result<Json<Match>, ApiError> {
    let game = state
        .controller
        .open_dispute(match_id, identity.user_id, payload.reason, payload.proof)
        .await?;
    Ok(Json(game))
}

/// Settle a dispute (admin). The ruling is final and overrides any report.
pub async fn resolve_dispute(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(match_id): Path<MatchId>,
    Json(payload): Json<ResolvePayload>,
) -> Result<Json<MatchUpdate>, ApiError> {
    identity.require_admin()?;
    let decision = DisputeDecision {
        winner: payload.winner,
        score: payload.score,
        resolved_by: identity.user_id,
        note: payload.note,
    };
    let update = state.controller.resolve_dispute(match_id, decision).await?;
    Ok(Json(update))
}

/// Re-run advancement of a completed match (admin). Safe to repeat.
pub async fn advance(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(match_id): Path<MatchId>,
) -> Result<Json<AdvanceReport>, ApiError> {
    identity.require_admin()?;
    let report = state.controller.advance_from_match(match_id).await?;
    tracing::info!(
        match_id = match_id,
        admin = identity.user_id,
        events = report.events.len(),
        "Advancement replayed"
    );
    Ok(Json(report))
}
