//! Tournament API handlers.
//!
//! Create a tournament (admin):
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/tournaments \
//!   -H "x-user-id: 1" -H "x-user-role: admin" \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Friday Cup", "max_participants": 16, "entry_fee": 100}'
//! ```
//!
//! Register the caller:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/tournaments/1/participants \
//!   -H "x-user-id: 42" -H "Content-Type: application/json" \
//!   -d '{"entrant": "Team Rocket"}'
//! ```

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use matchplay::tournament::{
    IncompleteAction, Participant, PrizeDistribution, SlotRepair, Tournament, TournamentConfig,
    TournamentError, TournamentFormat, TournamentId, UserId,
};
use matchplay::{Bracket, BuildOutcome};
use serde::Deserialize;

use super::AppState;
use super::error::ApiError;
use super::identity::Identity;

#[derive(Debug, Deserialize)]
pub struct CreateTournamentPayload {
    pub name: String,
    pub max_participants: u32,
    #[serde(default)]
    pub format: Option<TournamentFormat>,
    #[serde(default)]
    pub incomplete_action: Option<IncompleteAction>,
    #[serde(default)]
    pub entry_fee: i64,
    /// Share of the prize pool per place, first place first
    #[serde(default)]
    pub prizes: Option<Vec<f64>>,
    #[serde(default)]
    pub check_in_deadline: Option<DateTime<Utc>>,
}

impl CreateTournamentPayload {
    fn into_config(self) -> Result<TournamentConfig, TournamentError> {
        let mut config = TournamentConfig::knockout(self.name, self.max_participants)
            .with_entry_fee(self.entry_fee);
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(action) = self.incomplete_action {
            config = config.with_incomplete_action(action);
        }
        if let Some(shares) = self.prizes {
            let distribution =
                PrizeDistribution::custom(shares).ok_or(TournamentError::InvalidPrizes)?;
            config = config.with_prizes(distribution);
        }
        config.check_in_deadline = self.check_in_deadline;
        Ok(config)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterPayload {
    #[serde(default)]
    pub entrant: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OpenCheckInPayload {
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BuildBracketPayload {
    /// Manual seeding, every checked-in participant exactly once
    #[serde(default)]
    pub seeds: Option<Vec<UserId>>,
}

#[derive(Debug, Deserialize)]
pub struct CancelPayload {
    pub reason: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RepairPayload {
    /// Slot overwrites applied before advancement resumes
    #[serde(default)]
    pub slots: Vec<SlotRepair>,
}

/// Create a tournament in `open` status.
///
/// # Errors
///
/// - `400 Bad Request`: unsupported size or format, empty name, negative fee, bad prize shares
/// - `403 Forbidden`: caller is not an admin
pub async fn create_tournament(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateTournamentPayload>,
) -> Result<(StatusCode, Json<Tournament>), ApiError> {
    identity.require_admin()?;
    let config = payload.into_config()?;
    let tournament = state.controller.create_tournament(config).await?;
    Ok((StatusCode::CREATED, Json(tournament)))
}

pub async fn get_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> Result<Json<Tournament>, ApiError> {
    Ok(Json(state.controller.get_tournament(tournament_id).await?))
}

/// Register the caller.
///
/// # Errors
///
/// - `404 Not Found`: tournament doesn't exist
/// - `409 Conflict`: registration closed, tournament full or already registered
pub async fn register(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(tournament_id): Path<TournamentId>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<Participant>), ApiError> {
    let participant = state
        .controller
        .register_participant(tournament_id, identity.user_id, payload.entrant)
        .await?;
    Ok((StatusCode::CREATED, Json(participant)))
}

/// Withdraw the caller before the bracket is built. A paid entry is refunded.
pub async fn unregister(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(tournament_id): Path<TournamentId>,
) -> Result<StatusCode, ApiError> {
    state
        .controller
        .unregister_participant(tournament_id, identity.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn open_check_in(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(tournament_id): Path<TournamentId>,
    Json(payload): Json<OpenCheckInPayload>,
) -> Result<Json<Tournament>, ApiError> {
    identity.require_admin()?;
    let tournament = state
        .controller
        .open_check_in(tournament_id, payload.deadline)
        .await?;
    Ok(Json(tournament))
}

/// Confirm the caller's attendance. Checking in twice is accepted.
pub async fn check_in(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(tournament_id): Path<TournamentId>,
) -> Result<Json<Participant>, ApiError> {
    let participant = state
        .controller
        .check_in(tournament_id, identity.user_id)
        .await?;
    Ok(Json(participant))
}

/// Close check-in and build the bracket.
///
/// Responds with the outcome, which is `cancelled` when too few participants
/// checked in for the tournament's incomplete-bracket policy.
///
/// # Errors
///
/// - `400 Bad Request`: manual seeds don't match the checked-in participants
/// - `403 Forbidden`: caller is not an admin
/// - `409 Conflict`: tournament is not in check-in
pub async fn build_bracket(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(tournament_id): Path<TournamentId>,
    Json(payload): Json<BuildBracketPayload>,
) -> Result<Json<BuildOutcome>, ApiError> {
    identity.require_admin()?;
    let outcome = match payload.seeds {
        Some(seeds) => {
            state
                .controller
                .build_bracket_with_seeds(tournament_id, seeds)
                .await?
        }
        None => state.controller.build_bracket(tournament_id).await?,
    };
    tracing::info!(
        tournament_id = tournament_id,
        admin = identity.user_id,
        ?outcome,
        "Bracket requested"
    );
    Ok(Json(outcome))
}

pub async fn get_bracket(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> Result<Json<Bracket>, ApiError> {
    Ok(Json(state.controller.get_bracket(tournament_id).await?))
}

pub async fn cancel(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(tournament_id): Path<TournamentId>,
    Json(payload): Json<CancelPayload>,
) -> Result<Json<Tournament>, ApiError> {
    identity.require_admin()?;
    let tournament = state
        .controller
        .cancel_tournament(tournament_id, payload.reason)
        .await?;
    Ok(Json(tournament))
}

/// Repair a halted bracket and resume advancement.
///
/// # Errors
///
/// - `403 Forbidden`: caller is not an admin
/// - `404 Not Found`: a repaired match is not part of the tournament
/// - `409 Conflict`: tournament is not halted
pub async fn repair(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(tournament_id): Path<TournamentId>,
    Json(payload): Json<RepairPayload>,
) -> Result<Json<Tournament>, ApiError> {
    identity.require_admin()?;
    let tournament = state
        .controller
        .repair_bracket(tournament_id, payload.slots, identity.user_id)
        .await?;
    Ok(Json(tournament))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_defaults() {
        let payload: CreateTournamentPayload =
            serde_json::from_str(r#"{"name": "Cup", "max_participants": 8}"#).unwrap();
        let config = payload.into_config().unwrap();

        assert_eq!(config, TournamentConfig::knockout("Cup".to_string(), 8));
    }

    #[test]
    fn test_repair_payload() {
        let payload: RepairPayload = serde_json::from_str(
            r#"{"slots": [{"match_id": 12, "slot": "one", "user_id": null}]}"#,
        )
        .unwrap();
        assert_eq!(
            payload.slots,
            vec![SlotRepair {
                match_id: 12,
                slot: matchplay::matches::Slot::One,
                user_id: None,
            }]
        );

        let empty: RepairPayload = serde_json::from_str("{}").unwrap();
        assert!(empty.slots.is_empty());
    }

    #[test]
    fn test_payload_options() {
        let payload: CreateTournamentPayload = serde_json::from_str(
            r#"{
                "name": "Cup",
                "max_participants": 16,
                "incomplete_action": "cancel",
                "entry_fee": 25,
                "prizes": [0.7, 0.3]
            }"#,
        )
        .unwrap();
        let config = payload.into_config().unwrap();

        assert_eq!(config.incomplete_action, IncompleteAction::Cancel);
        assert_eq!(config.entry_fee, 25);
        assert_eq!(config.prizes_distribution.payout_for_place(2, 100), Some(30));
    }

    #[test]
    fn test_payload_rejects_bad_prizes() {
        let payload: CreateTournamentPayload = serde_json::from_str(
            r#"{"name": "Cup", "max_participants": 8, "prizes": [0.8, 0.8]}"#,
        )
        .unwrap();

        assert!(matches!(
            payload.into_config(),
            Err(TournamentError::InvalidPrizes)
        ));
    }
}
