//! Matches: the data model of a single bracket match and its lifecycle.
//!
//! A match is identified by its `(round, match_index)` position inside a
//! tournament. Its contest outcome (scores, winner, disputes) is driven by
//! [`MatchStateMachine`]; its player slots are filled by the round advancer.

pub mod errors;
pub mod models;
pub mod state_machine;

pub use errors::{MatchError, MatchResult};
pub use models::{
    BracketPosition, Dispute, DisputeDecision, Match, MatchId, MatchStatus, NewMatch, Score, Slot,
};
pub use state_machine::{MatchStateMachine, Transition};
