//! Bracket construction.
//!
//! Builds the complete match tree of a single-elimination bracket in memory.
//! Round one is filled from the seeding order, byes and dead paths are settled
//! here, and later rounds start empty unless both of their feeders are dead.

use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashMap;

use super::errors::{BracketError, BracketResult};
use super::seeding::seeding_order;
use crate::matches::{BracketPosition, MatchStatus, NewMatch};
use crate::tournament::models::UserId;

/// Every match of a bracket, ready to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketPlan {
    pub max_participants: u32,
    pub rounds: u32,
    /// Ordered by round, then match index
    pub matches: Vec<NewMatch>,
    /// Round-one byes whose winners still have to be advanced
    pub pending_byes: Vec<BracketPosition>,
}

impl BracketPlan {
    pub fn match_at(&self, position: BracketPosition) -> Option<&NewMatch> {
        self.matches.iter().find(|m| m.position() == position)
    }

    pub fn round(&self, round: u32) -> impl Iterator<Item = &NewMatch> {
        self.matches.iter().filter(move |m| m.round == round)
    }

    pub fn bye_count(&self) -> usize {
        self.matches.iter().filter(|m| m.is_bye).count()
    }
}

/// Builds single-elimination brackets of a fixed size
#[derive(Debug, Clone, Copy)]
pub struct BracketBuilder {
    max_participants: u32,
}

impl BracketBuilder {
    /// `max_participants` must be a power of two of at least 2
    pub fn new(max_participants: u32) -> BracketResult<Self> {
        if max_participants < 2 || !max_participants.is_power_of_two() {
            return Err(BracketError::UnsupportedSize(max_participants));
        }
        Ok(Self { max_participants })
    }

    pub fn rounds(&self) -> u32 {
        self.max_participants.trailing_zeros()
    }

    /// Shuffle the participants and build the bracket
    pub fn build<R>(&self, participants: &[UserId], rng: &mut R) -> BracketResult<BracketPlan>
    where
        R: Rng + ?Sized,
    {
        let mut shuffled = participants.to_vec();
        shuffled.shuffle(rng);
        self.build_seeded(&shuffled)
    }

    /// Build the bracket placing participants in the given order
    pub fn build_seeded(&self, participants: &[UserId]) -> BracketResult<BracketPlan> {
        let slots = self.max_participants as usize;
        if participants.is_empty() {
            return Err(BracketError::NoEntrants);
        }
        if participants.len() > slots {
            return Err(BracketError::TooManyEntrants {
                entrants: participants.len(),
                slots,
            });
        }

        let first_round = slots / 2;
        let order = seeding_order(first_round)?;
        let mut slot_one: Vec<Option<UserId>> = vec![None; first_round];
        let mut slot_two: Vec<Option<UserId>> = vec![None; first_round];

        let mut entrants = participants.iter().copied();
        for &index in &order {
            slot_one[index] = entrants.next();
        }
        for &index in order.iter().rev() {
            slot_two[index] = entrants.next();
        }

        let mut statuses: HashMap<(u32, u32), MatchStatus> = HashMap::new();
        let mut matches = Vec::with_capacity(slots - 1);
        let mut pending_byes = Vec::new();

        for index in 0..first_round {
            let (player1, player2) = (slot_one[index], slot_two[index]);
            let position = BracketPosition::new(1, index as u32);
            let mut game = NewMatch {
                round: 1,
                match_index: position.index,
                player1,
                player2,
                status: MatchStatus::Scheduled,
                is_bye: false,
                winner: None,
            };

            match (player1, player2) {
                (Some(_), Some(_)) => {}
                (Some(lone), None) | (None, Some(lone)) => {
                    game.status = MatchStatus::Completed;
                    game.is_bye = true;
                    game.winner = Some(lone);
                    pending_byes.push(position);
                }
                (None, None) => game.status = MatchStatus::Cancelled,
            }

            statuses.insert((1, position.index), game.status);
            matches.push(game);
        }

        for round in 2..=self.rounds() {
            let round_size = self.max_participants >> round;
            for index in 0..round_size {
                let feeders_dead = [index * 2, index * 2 + 1].iter().all(|&feeder| {
                    statuses.get(&(round - 1, feeder)) == Some(&MatchStatus::Cancelled)
                });
                let status = if feeders_dead {
                    MatchStatus::Cancelled
                } else {
                    MatchStatus::Scheduled
                };

                statuses.insert((round, index), status);
                matches.push(NewMatch {
                    round,
                    match_index: index,
                    player1: None,
                    player2: None,
                    status,
                    is_bye: false,
                    winner: None,
                });
            }
        }

        let dead = statuses
            .iter()
            .filter(|&(&(round, _), &status)| round == 1 && status == MatchStatus::Cancelled)
            .count();
        log::debug!(
            "Built {}-slot bracket: {} entrants, {} byes, {} dead first-round matches",
            self.max_participants,
            participants.len(),
            pending_byes.len(),
            dead
        );

        Ok(BracketPlan {
            max_participants: self.max_participants,
            rounds: self.rounds(),
            matches,
            pending_byes,
        })
    }
}
