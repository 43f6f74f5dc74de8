//! Single-elimination brackets.
//!
//! - [`seeding_order`]: seed-spacing order of round-one matches
//! - [`BracketBuilder`]: builds the complete match tree, settling byes and dead paths
//! - [`RoundAdvancer`]: moves winners into the next round and cascades auto-byes
//!
//! ## Example
//!
//! ```
//! use matchplay::bracket::BracketBuilder;
//!
//! let plan = BracketBuilder::new(8)?.build_seeded(&[1, 2, 3, 4, 5])?;
//! assert_eq!(plan.rounds, 3);
//! assert_eq!(plan.bye_count(), 3);
//! # Ok::<(), matchplay::bracket::BracketError>(())
//! ```

pub mod advancer;
pub mod builder;
pub mod errors;
pub mod seeding;

pub use advancer::{AdvanceReport, RoundAdvancer};
pub use builder::{BracketBuilder, BracketPlan};
pub use errors::{BracketError, BracketResult};
pub use seeding::seeding_order;

use serde::{Deserialize, Serialize};

use crate::matches::{BracketPosition, Match};
use crate::tournament::models::Tournament;

/// Read view of a tournament and its matches grouped by round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub tournament: Tournament,
    /// `rounds[0]` is round one, each round ordered by match index
    pub rounds: Vec<Vec<Match>>,
}

impl Bracket {
    pub fn new(tournament: Tournament, matches: Vec<Match>) -> Self {
        let mut rounds: Vec<Vec<Match>> = vec![Vec::new(); tournament.rounds() as usize];
        for game in matches {
            if let Some(round) = (game.round as usize)
                .checked_sub(1)
                .and_then(|r| rounds.get_mut(r))
            {
                round.push(game);
            }
        }
        for round in &mut rounds {
            round.sort_by_key(|m| m.match_index);
        }

        Self { tournament, rounds }
    }

    /// Whether matches have been built
    pub fn is_built(&self) -> bool {
        self.rounds.iter().any(|round| !round.is_empty())
    }

    pub fn match_at(&self, position: BracketPosition) -> Option<&Match> {
        self.rounds
            .get((position.round as usize).checked_sub(1)?)?
            .iter()
            .find(|m| m.match_index == position.index)
    }

    pub fn final_match(&self) -> Option<&Match> {
        self.rounds.last()?.first()
    }

    pub fn matches(&self) -> impl Iterator<Item = &Match> {
        self.rounds.iter().flatten()
    }
}
