//! Tournament data models for knockout tournaments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tournament ID type
pub type TournamentId = i64;

/// User ID type
pub type UserId = i64;

/// Bracket sizes a tournament may be created with
pub const SUPPORTED_BRACKET_SIZES: [u32; 3] = [8, 16, 32];

/// Tournament status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Accepting registrations
    Open,
    /// Registered participants confirm attendance
    CheckIn,
    /// Bracket built, matches in progress
    Active,
    /// Champion decided
    Completed,
    /// Tournament cancelled
    Cancelled,
}

impl TournamentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentStatus::Open => "open",
            TournamentStatus::CheckIn => "check_in",
            TournamentStatus::Active => "active",
            TournamentStatus::Completed => "completed",
            TournamentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(TournamentStatus::Open),
            "check_in" => Some(TournamentStatus::CheckIn),
            "active" => Some(TournamentStatus::Active),
            "completed" => Some(TournamentStatus::Completed),
            "cancelled" => Some(TournamentStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            TournamentStatus::Completed | TournamentStatus::Cancelled
        )
    }
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tournament format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    /// Single elimination bracket
    Knockout,
    /// Round robin table
    League,
    /// Group stage followed by knockout
    Hybrid,
}

impl TournamentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentFormat::Knockout => "knockout",
            TournamentFormat::League => "league",
            TournamentFormat::Hybrid => "hybrid",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "knockout" => Some(TournamentFormat::Knockout),
            "league" => Some(TournamentFormat::League),
            "hybrid" => Some(TournamentFormat::Hybrid),
            _ => None,
        }
    }
}

/// What to do when check-in closes with fewer entrants than bracket slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncompleteAction {
    /// Cancel the tournament and refund entry fees
    Cancel,
    /// Build the bracket anyway, empty slots become byes
    PlayWithByes,
}

impl IncompleteAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncompleteAction::Cancel => "cancel",
            IncompleteAction::PlayWithByes => "play_with_byes",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cancel" => Some(IncompleteAction::Cancel),
            "play_with_byes" => Some(IncompleteAction::PlayWithByes),
            _ => None,
        }
    }
}

/// Prize split by finishing place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrizeDistribution {
    /// Share of the pool for 1st, 2nd, ... place
    pub percentages: Vec<f64>,
}

impl PrizeDistribution {
    /// Champion takes the whole pool
    pub fn winner_takes_all() -> Self {
        Self {
            percentages: vec![1.0],
        }
    }

    /// Custom split. Shares must be in `0.0..=1.0` and sum to at most 1.0.
    pub fn custom(percentages: Vec<f64>) -> Option<Self> {
        let distribution = Self { percentages };
        distribution.is_valid().then_some(distribution)
    }

    pub fn is_valid(&self) -> bool {
        !self.percentages.is_empty()
            && self.percentages.iter().all(|p| (0.0..=1.0).contains(p))
            && self.percentages.iter().sum::<f64>() <= 1.0 + f64::EPSILON
    }

    /// Payout for a place (1-indexed)
    pub fn payout_for_place(&self, place: usize, prize_pool: i64) -> Option<i64> {
        if place == 0 {
            return None;
        }
        self.percentages
            .get(place - 1)
            .map(|pct| (prize_pool as f64 * pct) as i64)
    }
}

impl Default for PrizeDistribution {
    fn default() -> Self {
        Self::winner_takes_all()
    }
}

/// Tournament configuration supplied at creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentConfig {
    pub name: String,
    /// Bracket size, one of [`SUPPORTED_BRACKET_SIZES`]
    pub max_participants: u32,
    pub format: TournamentFormat,
    pub incomplete_action: IncompleteAction,
    /// Entry fee charged by the wallet service at registration
    pub entry_fee: i64,
    pub prizes_distribution: PrizeDistribution,
    /// Check-in closes automatically at this time
    pub check_in_deadline: Option<DateTime<Utc>>,
}

impl TournamentConfig {
    /// Create a free knockout tournament that plays with byes
    pub fn knockout(name: String, max_participants: u32) -> Self {
        Self {
            name,
            max_participants,
            format: TournamentFormat::Knockout,
            incomplete_action: IncompleteAction::PlayWithByes,
            entry_fee: 0,
            prizes_distribution: PrizeDistribution::default(),
            check_in_deadline: None,
        }
    }

    pub fn with_entry_fee(mut self, entry_fee: i64) -> Self {
        self.entry_fee = entry_fee;
        self
    }

    pub fn with_incomplete_action(mut self, action: IncompleteAction) -> Self {
        self.incomplete_action = action;
        self
    }

    pub fn with_prizes(mut self, distribution: PrizeDistribution) -> Self {
        self.prizes_distribution = distribution;
        self
    }

    /// Whether `max_participants` is a supported bracket size
    pub fn has_supported_size(&self) -> bool {
        SUPPORTED_BRACKET_SIZES.contains(&self.max_participants)
    }
}

/// Registered participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: UserId,
    /// Entrant chosen for the tournament (team, character, deck...)
    pub entrant: Option<String>,
    pub is_checked_in: bool,
    pub registered_at: DateTime<Utc>,
}

/// Tournament information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub max_participants: u32,
    pub format: TournamentFormat,
    pub incomplete_action: IncompleteAction,
    pub status: TournamentStatus,
    /// Participants in registration order
    pub participants: Vec<Participant>,
    pub entry_fee: i64,
    pub prizes_distribution: PrizeDistribution,
    pub check_in_deadline: Option<DateTime<Utc>>,
    pub champion_user: Option<UserId>,
    /// Set when advancement hit an inconsistent bracket. Match operations are
    /// refused until an admin repairs the bracket.
    pub halted_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Tournament {
    /// Number of rounds of the bracket (log2 of the bracket size)
    pub fn rounds(&self) -> u32 {
        self.max_participants.trailing_zeros()
    }

    pub fn participant(&self, user_id: UserId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }

    /// Checked-in participants in registration order
    pub fn checked_in(&self) -> Vec<UserId> {
        self.participants
            .iter()
            .filter(|p| p.is_checked_in)
            .map(|p| p.user_id)
            .collect()
    }

    /// Registered participants who never checked in
    pub fn no_shows(&self) -> Vec<UserId> {
        self.participants
            .iter()
            .filter(|p| !p.is_checked_in)
            .map(|p| p.user_id)
            .collect()
    }

    pub fn is_halted(&self) -> bool {
        self.halted_reason.is_some()
    }

    /// Entry fees of everyone who made it into the bracket. No-shows are
    /// refunded when the bracket is built.
    pub fn prize_pool(&self) -> i64 {
        self.entry_fee * self.checked_in().len() as i64
    }
}
