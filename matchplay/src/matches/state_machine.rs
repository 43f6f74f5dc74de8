//! Match lifecycle state machine.
//!
//! ```text
//! scheduled ──start──▶ ongoing ──submit──▶ review ──confirm──▶ completed
//!     │                   │                  │                     ▲
//!     └──────submit───────┼─────────────────▶│                     │
//!                         └──dispute──▶ dispute ◀──conflict────────┘
//!                                          └──────admin ruling─────┘
//! ```
//!
//! `cancelled` is produced by bracket construction for dead paths and by
//! cancelling the tournament, never by a transition here. Every path into
//! `completed` sets `winner` and `loser` in the same step, which is the commit
//! point the round advancer reacts to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{MatchError, MatchResult};
use super::models::{Dispute, DisputeDecision, Match, MatchStatus, Score, Slot};
use crate::tournament::models::UserId;

/// What a transition did to the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    /// Match room opened
    Started,
    /// A score is waiting for the opponent
    AwaitingConfirmation,
    /// Final result recorded
    Completed { winner: UserId, loser: UserId },
    /// Match parked for admin review
    Disputed,
}

/// Drives one match through its lifecycle.
///
/// The machine only touches the match's own contest outcome. Player slots are
/// written by the round advancer.
pub struct MatchStateMachine<'a> {
    game: &'a mut Match,
    now: DateTime<Utc>,
}

impl<'a> MatchStateMachine<'a> {
    pub fn new(game: &'a mut Match, now: DateTime<Utc>) -> Self {
        Self { game, now }
    }

    /// A participant opens the match room.
    pub fn start(&mut self, actor: UserId) -> MatchResult<Transition> {
        self.require_player(actor)?;
        match self.game.status {
            MatchStatus::Scheduled => {
                self.game.status = MatchStatus::Ongoing;
                Ok(Transition::Started)
            }
            // Second participant joining an already open room
            MatchStatus::Ongoing => Ok(Transition::Started),
            status => Err(MatchError::InvalidTransition {
                status,
                action: "start",
            }),
        }
    }

    /// A participant reports a score.
    ///
    /// The first report moves the match to review. A report from the opponent
    /// while in review either agrees (completes the match) or conflicts (opens a
    /// dispute). A repeated report from the original reporter replaces it.
    pub fn submit_result(&mut self, actor: UserId, score: Score) -> MatchResult<Transition> {
        self.require_player(actor)?;
        if !score.is_decisive() {
            return Err(MatchError::IndecisiveScore(score));
        }

        match self.game.status {
            MatchStatus::Scheduled | MatchStatus::Ongoing => {
                self.record_report(actor, score);
                Ok(Transition::AwaitingConfirmation)
            }
            MatchStatus::Review if self.game.reported_by == Some(actor) => {
                self.record_report(actor, score);
                Ok(Transition::AwaitingConfirmation)
            }
            MatchStatus::Review => {
                if self.game.reported_score == Some(score) {
                    self.complete(score)
                } else {
                    self.game.dispute = Some(Dispute {
                        opened_by: actor,
                        reason: "conflicting score reported".to_string(),
                        proof: None,
                        reported_score: self.game.reported_score,
                        counter_score: Some(score),
                        decision: None,
                        opened_at: self.now,
                        resolved_at: None,
                    });
                    self.game.status = MatchStatus::Dispute;
                    Ok(Transition::Disputed)
                }
            }
            status => Err(MatchError::InvalidTransition {
                status,
                action: "submit a result for",
            }),
        }
    }

    /// The opponent of the reporter confirms the pending score.
    pub fn confirm(&mut self, actor: UserId) -> MatchResult<Transition> {
        self.require_player(actor)?;
        if self.game.status != MatchStatus::Review {
            return Err(MatchError::InvalidTransition {
                status: self.game.status,
                action: "confirm",
            });
        }
        if self.game.reported_by == Some(actor) {
            return Err(MatchError::SelfConfirmation);
        }
        let score = self
            .game
            .reported_score
            .ok_or(MatchError::InvalidTransition {
                status: self.game.status,
                action: "confirm",
            })?;
        self.complete(score)
    }

    /// A participant flags foul play or contests the pending score.
    pub fn open_dispute(
        &mut self,
        actor: UserId,
        reason: String,
        proof: Option<String>,
    ) -> MatchResult<Transition> {
        self.require_player(actor)?;
        match self.game.status {
            MatchStatus::Ongoing | MatchStatus::Review => {
                self.game.dispute = Some(Dispute {
                    opened_by: actor,
                    reason,
                    proof,
                    reported_score: self.game.reported_score,
                    counter_score: None,
                    decision: None,
                    opened_at: self.now,
                    resolved_at: None,
                });
                self.game.status = MatchStatus::Dispute;
                Ok(Transition::Disputed)
            }
            status => Err(MatchError::InvalidTransition {
                status,
                action: "dispute",
            }),
        }
    }

    /// An admin settles a dispute. The ruling always wins over any report.
    pub fn resolve_dispute(&mut self, decision: DisputeDecision) -> MatchResult<Transition> {
        if self.game.status != MatchStatus::Dispute {
            return Err(MatchError::InvalidTransition {
                status: self.game.status,
                action: "resolve",
            });
        }
        let winner_slot = self.game.slot_of(decision.winner).ok_or_else(|| {
            MatchError::InvalidDecision(format!("user {} is not in this match", decision.winner))
        })?;

        if let Some(score) = decision.score {
            if score.winning_slot() != Some(winner_slot) {
                return Err(MatchError::InvalidDecision(format!(
                    "score {score} does not make user {} the winner",
                    decision.winner
                )));
            }
        }

        let reported = self.game.reported_score;
        let overridden = reported.is_some_and(|r| r.winning_slot() != Some(winner_slot));
        if overridden {
            log::warn!(
                "Match {}: admin {} overrides reported score {:?} in favour of user {}",
                self.game.id,
                decision.resolved_by,
                reported,
                decision.winner
            );
        }

        let score = decision.score.or(reported.filter(|_| !overridden));
        if let Some(dispute) = self.game.dispute.as_mut() {
            dispute.decision = Some(decision.clone());
            dispute.resolved_at = Some(self.now);
        }
        self.finish(winner_slot, score)
    }

    fn record_report(&mut self, actor: UserId, score: Score) {
        self.game.reported_by = Some(actor);
        self.game.reported_score = Some(score);
        self.game.status = MatchStatus::Review;
    }

    fn complete(&mut self, score: Score) -> MatchResult<Transition> {
        let winner_slot = score
            .winning_slot()
            .ok_or(MatchError::IndecisiveScore(score))?;
        self.finish(winner_slot, Some(score))
    }

    fn finish(&mut self, winner_slot: Slot, score: Option<Score>) -> MatchResult<Transition> {
        let (winner, loser) = match winner_slot {
            Slot::One => (self.game.player1, self.game.player2),
            Slot::Two => (self.game.player2, self.game.player1),
        };
        let (Some(winner), Some(loser)) = (winner, loser) else {
            return Err(MatchError::PlayersNotAssigned(self.game.id));
        };

        self.game.winner = Some(winner);
        self.game.loser = Some(loser);
        self.game.score = score;
        self.game.status = MatchStatus::Completed;
        self.game.completed_at = Some(self.now);
        Ok(Transition::Completed { winner, loser })
    }

    fn require_player(&self, actor: UserId) -> MatchResult<()> {
        if !self.game.has_both_players() {
            return Err(MatchError::PlayersNotAssigned(self.game.id));
        }
        if self.game.slot_of(actor).is_none() {
            return Err(MatchError::NotAParticipant(actor));
        }
        Ok(())
    }
}
