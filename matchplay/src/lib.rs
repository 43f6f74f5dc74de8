//! # Matchplay
//!
//! A single-elimination (knockout) tournament bracket engine.
//!
//! The engine seeds participants into a fixed-size bracket, settles byes and
//! dead branches when the bracket is built, and moves winners round by round
//! until a champion is decided. Every mutation of a tournament happens inside
//! a per-tournament session, so concurrent match completions never overwrite
//! each other.
//!
//! ## Lifecycle
//!
//! - **Open**: participants register
//! - **CheckIn**: registered participants confirm attendance
//! - **Active**: bracket built, matches are played and advanced
//! - **Completed**: the final has a winner, prizes are paid out
//! - **Cancelled**: not enough entrants or cancelled by an admin, fees refunded
//!
//! ## Core Modules
//!
//! - [`bracket`]: seeding order, bracket construction and round advancement
//! - [`matches`]: match model and lifecycle state machine
//! - [`tournament`]: tournament model and the [`TournamentController`]
//! - [`db`]: transactional bracket storage (PostgreSQL and in-memory)
//! - [`services`]: notification and prize collaborators
//!
//! ## Example
//!
//! ```
//! use matchplay::bracket::seeding_order;
//!
//! assert_eq!(seeding_order(4).unwrap(), vec![0, 3, 1, 2]);
//! ```

/// Seeding, bracket construction and round advancement.
pub mod bracket;

/// Bracket storage.
pub mod db;

/// Match model and lifecycle.
pub mod matches;

/// Notification and prize collaborators.
pub mod services;

/// Tournament lifecycle.
pub mod tournament;

pub use bracket::{Bracket, BracketBuilder, BracketError, RoundAdvancer, seeding_order};
pub use matches::{Match, MatchError, MatchStateMachine, MatchStatus, Score};
pub use tournament::{
    BuildOutcome, Tournament, TournamentConfig, TournamentController, TournamentError,
    TournamentEvent,
};
