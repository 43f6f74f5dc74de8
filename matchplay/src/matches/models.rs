//! Match data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tournament::models::{TournamentId, UserId};

/// Match ID type
pub type MatchId = i64;

/// Lifecycle status of a single match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Waiting for players, or both players known and not yet started
    Scheduled,
    /// Match room opened by a participant
    Ongoing,
    /// One participant reported a score, waiting for the opponent
    Review,
    /// Final result recorded
    Completed,
    /// Conflicting reports or foul play flagged, waiting for an admin
    Dispute,
    /// Dead bracket branch, nobody can ever reach this match
    Cancelled,
}

impl MatchStatus {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Ongoing => "ongoing",
            MatchStatus::Review => "review",
            MatchStatus::Completed => "completed",
            MatchStatus::Dispute => "dispute",
            MatchStatus::Cancelled => "cancelled",
        }
    }

    /// Parse the storage representation
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "scheduled" => Some(MatchStatus::Scheduled),
            "ongoing" => Some(MatchStatus::Ongoing),
            "review" => Some(MatchStatus::Review),
            "completed" => Some(MatchStatus::Completed),
            "dispute" => Some(MatchStatus::Dispute),
            "cancelled" => Some(MatchStatus::Cancelled),
            _ => None,
        }
    }

    /// Completed and cancelled matches never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Cancelled)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One of the two participant positions of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    One,
    Two,
}

impl Slot {
    /// Storage column holding this slot
    pub fn column(&self) -> &'static str {
        match self {
            Slot::One => "player1_id",
            Slot::Two => "player2_id",
        }
    }
}

/// Position of a match inside the bracket tree.
///
/// Rounds are 1-based, indices are 0-based within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BracketPosition {
    pub round: u32,
    pub index: u32,
}

impl BracketPosition {
    pub const fn new(round: u32, index: u32) -> Self {
        Self { round, index }
    }

    /// The two feeder matches of this position, `None` for round one
    pub fn feeders(&self) -> Option<[BracketPosition; 2]> {
        if self.round <= 1 {
            return None;
        }
        Some([
            BracketPosition::new(self.round - 1, self.index * 2),
            BracketPosition::new(self.round - 1, self.index * 2 + 1),
        ])
    }

    /// Match in the next round that this match feeds into
    pub fn next(&self) -> BracketPosition {
        BracketPosition::new(self.round + 1, self.index / 2)
    }

    /// Slot of [`Self::next`] that this match's winner occupies.
    ///
    /// Even indices feed slot one, odd indices slot two.
    pub fn slot_in_next(&self) -> Slot {
        if self.index % 2 == 0 { Slot::One } else { Slot::Two }
    }

    /// The other feeder of [`Self::next`]
    pub fn sibling(&self) -> BracketPosition {
        BracketPosition::new(self.round, self.index ^ 1)
    }
}

impl fmt::Display for BracketPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}M{}", self.round, self.index)
    }
}

/// Reported or final score, oriented by match slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub player1: u32,
    pub player2: u32,
}

impl Score {
    pub const fn new(player1: u32, player2: u32) -> Self {
        Self { player1, player2 }
    }

    /// Knockout matches need a winner, so ties are never decisive
    pub fn is_decisive(&self) -> bool {
        self.player1 != self.player2
    }

    /// Slot holding the higher score
    pub fn winning_slot(&self) -> Option<Slot> {
        match self.player1.cmp(&self.player2) {
            std::cmp::Ordering::Greater => Some(Slot::One),
            std::cmp::Ordering::Less => Some(Slot::Two),
            std::cmp::Ordering::Equal => None,
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.player1, self.player2)
    }
}

/// Admin ruling that settles a dispute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeDecision {
    /// Authoritative winner, must be one of the two players
    pub winner: UserId,
    /// Authoritative score, if the admin sets one
    pub score: Option<Score>,
    /// Admin who ruled
    pub resolved_by: UserId,
    pub note: Option<String>,
}

/// Dispute sub-record of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    pub opened_by: UserId,
    pub reason: String,
    /// Link or reference to uploaded evidence
    pub proof: Option<String>,
    /// Score that was under review when the dispute opened
    pub reported_score: Option<Score>,
    /// Score the disputing participant claims instead
    pub counter_score: Option<Score>,
    pub decision: Option<DisputeDecision>,
    pub opened_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// A match as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub round: u32,
    pub match_index: u32,
    pub player1: Option<UserId>,
    pub player2: Option<UserId>,
    pub status: MatchStatus,
    pub is_bye: bool,
    pub winner: Option<UserId>,
    pub loser: Option<UserId>,
    /// Final score
    pub score: Option<Score>,
    /// Participant whose report is waiting for confirmation
    pub reported_by: Option<UserId>,
    pub reported_score: Option<Score>,
    pub dispute: Option<Dispute>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn position(&self) -> BracketPosition {
        BracketPosition::new(self.round, self.match_index)
    }

    pub fn slot(&self, slot: Slot) -> Option<UserId> {
        match slot {
            Slot::One => self.player1,
            Slot::Two => self.player2,
        }
    }

    /// Slot occupied by `user_id`, if any
    pub fn slot_of(&self, user_id: UserId) -> Option<Slot> {
        if self.player1 == Some(user_id) {
            Some(Slot::One)
        } else if self.player2 == Some(user_id) {
            Some(Slot::Two)
        } else {
            None
        }
    }

    pub fn has_both_players(&self) -> bool {
        self.player1.is_some() && self.player2.is_some()
    }

    /// Turn this match into an automatic bye won by `user_id`
    pub fn complete_as_bye(&mut self, user_id: UserId, now: DateTime<Utc>) {
        self.is_bye = true;
        self.status = MatchStatus::Completed;
        self.winner = Some(user_id);
        self.loser = None;
        self.completed_at = Some(now);
    }

    /// Withdraw an unfinished match of a cancelled tournament
    pub fn cancel(&mut self) {
        if !self.status.is_terminal() {
            self.status = MatchStatus::Cancelled;
            self.reported_by = None;
            self.reported_score = None;
        }
    }
}

/// A match about to be inserted by bracket construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMatch {
    pub round: u32,
    pub match_index: u32,
    pub player1: Option<UserId>,
    pub player2: Option<UserId>,
    pub status: MatchStatus,
    pub is_bye: bool,
    pub winner: Option<UserId>,
}

impl NewMatch {
    pub fn position(&self) -> BracketPosition {
        BracketPosition::new(self.round, self.match_index)
    }
}
