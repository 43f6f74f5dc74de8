//! Round advancement.
//!
//! Moves the winner of a completed match into its slot of the next round and
//! re-evaluates the target inside the same session. Auto-byes cascade through
//! a worklist until a match waits for a real opponent or the final is decided.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::errors::{BracketError, BracketResult};
use crate::db::{BracketSession, SlotWrite};
use crate::matches::{Match, MatchStatus};
use crate::tournament::events::TournamentEvent;
use crate::tournament::models::{TournamentStatus, UserId};

/// Outcome of one advancement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceReport {
    /// Transitions caused by the advancement, in order
    pub events: Vec<TournamentEvent>,
    /// Set when this advancement decided the tournament
    pub champion: Option<UserId>,
    pub runner_up: Option<UserId>,
}

impl AdvanceReport {
    pub fn merge(&mut self, other: AdvanceReport) {
        self.events.extend(other.events);
        if other.champion.is_some() {
            self.champion = other.champion;
            self.runner_up = other.runner_up;
        }
    }
}

/// Propagates winners through a bracket of a fixed number of rounds
#[derive(Debug, Clone, Copy)]
pub struct RoundAdvancer {
    rounds: u32,
}

impl RoundAdvancer {
    pub fn new(rounds: u32) -> Self {
        Self { rounds }
    }

    /// Advance the winner of `completed`.
    ///
    /// Replaying an advancement that already happened changes nothing and
    /// emits no events. A slot holding a different winner is never overwritten.
    pub async fn advance(
        &self,
        session: &mut dyn BracketSession,
        completed: &Match,
    ) -> BracketResult<AdvanceReport> {
        let mut report = AdvanceReport::default();
        let mut queue = VecDeque::from([completed.clone()]);

        while let Some(game) = queue.pop_front() {
            if game.status != MatchStatus::Completed {
                return Err(BracketError::NotCompleted(game.id));
            }
            let winner = game.winner.ok_or(BracketError::MissingWinner(game.id))?;
            let position = game.position();

            if position.round >= self.rounds {
                self.finish_tournament(session, &game, winner, &mut report)
                    .await?;
                continue;
            }

            let target_position = position.next();
            let target = session
                .match_at(target_position)
                .await?
                .ok_or(BracketError::MissingMatch(target_position))?;

            if target.status == MatchStatus::Cancelled {
                log::error!(
                    "Tournament {}: winner {} of {} routed into dead match {}",
                    game.tournament_id,
                    winner,
                    position,
                    target_position
                );
                return Err(BracketError::DeadPathReached(target_position));
            }

            let replay = match session
                .fill_slot_if_empty(target.id, position.slot_in_next(), winner)
                .await?
            {
                SlotWrite::Written => false,
                SlotWrite::AlreadyHeld => {
                    log::debug!(
                        "Tournament {}: user {} already holds its slot in {}",
                        game.tournament_id,
                        winner,
                        target_position
                    );
                    true
                }
                SlotWrite::Conflict { existing } => {
                    log::error!(
                        "Tournament {}: slot of {} in {} holds user {}, refusing user {}",
                        game.tournament_id,
                        position,
                        target_position,
                        existing,
                        winner
                    );
                    return Err(BracketError::SlotConflict {
                        position: target_position,
                        existing,
                        incoming: winner,
                    });
                }
            };

            // Re-read after the conditional write, the other slot may have moved too
            let mut target = session
                .match_by_id(target.id)
                .await?
                .ok_or(BracketError::MissingMatch(target_position))?;

            if let (Some(player1), Some(player2)) = (target.player1, target.player2) {
                if !replay {
                    log::info!(
                        "Tournament {}: match {} ({}) ready, {} vs {}",
                        target.tournament_id,
                        target.id,
                        target_position,
                        player1,
                        player2
                    );
                    report.events.push(TournamentEvent::MatchScheduled {
                        tournament_id: target.tournament_id,
                        match_id: target.id,
                        round: target.round,
                        player1,
                        player2,
                    });
                }
                continue;
            }

            if target.status == MatchStatus::Completed {
                // Bye promoted by an earlier run, walk its cascade again
                if replay && target.is_bye {
                    queue.push_back(target);
                }
                continue;
            }

            let sibling_position = position.sibling();
            let sibling = session
                .match_at(sibling_position)
                .await?
                .ok_or(BracketError::MissingFeeder(sibling_position))?;

            if sibling.status == MatchStatus::Cancelled {
                target.complete_as_bye(winner, Utc::now());
                session.save_match(&target).await?;

                log::info!(
                    "Tournament {}: user {} advances by bye through {}",
                    target.tournament_id,
                    winner,
                    target_position
                );
                report.events.push(TournamentEvent::ByeAdvanced {
                    tournament_id: target.tournament_id,
                    match_id: target.id,
                    round: target.round,
                    user_id: winner,
                });
                queue.push_back(target);
            }
        }

        Ok(report)
    }

    async fn finish_tournament(
        &self,
        session: &mut dyn BracketSession,
        final_match: &Match,
        champion: UserId,
        report: &mut AdvanceReport,
    ) -> BracketResult<()> {
        let mut tournament = session.tournament().clone();

        if tournament.status == TournamentStatus::Completed {
            return match tournament.champion_user {
                Some(existing) if existing == champion => Ok(()),
                Some(existing) => Err(BracketError::SlotConflict {
                    position: final_match.position(),
                    existing,
                    incoming: champion,
                }),
                None => Err(BracketError::MissingWinner(final_match.id)),
            };
        }

        tournament.status = TournamentStatus::Completed;
        tournament.champion_user = Some(champion);
        tournament.finished_at = Some(Utc::now());
        session.save_tournament(&tournament).await?;

        log::info!(
            "Tournament {} completed, champion: user {}",
            tournament.id,
            champion
        );
        report.champion = Some(champion);
        report.runner_up = final_match.loser;
        report.events.push(TournamentEvent::TournamentCompleted {
            tournament_id: tournament.id,
            champion,
            runner_up: final_match.loser,
        });

        Ok(())
    }
}
