//! Tournament module for knockout tournaments.
//!
//! This module provides the tournament lifecycle:
//! - Tournament creation and configuration
//! - Participant registration and check-in
//! - Bracket construction when check-in closes
//! - Match results, disputes and round advancement
//! - Prize payout and entry fee refunds through [`crate::services`]
//!
//! ## Example
//!
//! ```no_run
//! use matchplay::db::MemoryBracketStore;
//! use matchplay::services::{LogNotifier, LogPrizeService};
//! use matchplay::tournament::{TournamentConfig, TournamentController};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let controller = TournamentController::new(
//!         Arc::new(MemoryBracketStore::new()),
//!         Arc::new(LogNotifier),
//!         Arc::new(LogPrizeService::new()),
//!     );
//!
//!     let config = TournamentConfig::knockout("Friday Cup".to_string(), 8);
//!     let tournament = controller.create_tournament(config).await?;
//!     for user_id in 1..=5 {
//!         controller.register_participant(tournament.id, user_id, None).await?;
//!     }
//!     controller.open_check_in(tournament.id, None).await?;
//!     for user_id in 1..=5 {
//!         controller.check_in(tournament.id, user_id).await?;
//!     }
//!     let outcome = controller.build_bracket(tournament.id).await?;
//!     println!("{outcome:?}");
//!
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod events;
pub mod manager;
pub mod models;

pub use errors::{TournamentError, TournamentResult};
pub use events::TournamentEvent;
pub use manager::{BuildOutcome, MatchUpdate, SlotRepair, TournamentController};
pub use models::{
    IncompleteAction, Participant, PrizeDistribution, SUPPORTED_BRACKET_SIZES, Tournament,
    TournamentConfig, TournamentFormat, TournamentId, TournamentStatus, UserId,
};
