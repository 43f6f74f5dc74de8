//! Tournament controller for knockout tournaments.
//!
//! Every mutating operation runs inside one [`BracketSession`], so it is
//! serialized against all other operations on the same tournament. Events are
//! collected while the session is open and dispatched after it committed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use super::errors::{TournamentError, TournamentResult};
use super::events::TournamentEvent;
use super::models::{
    IncompleteAction, Participant, Tournament, TournamentConfig, TournamentFormat, TournamentId,
    TournamentStatus, UserId,
};
use crate::bracket::{
    AdvanceReport, Bracket, BracketBuilder, BracketError, BracketPlan, RoundAdvancer,
};
use crate::db::{BracketSession, BracketStore, StoreError};
use crate::matches::{
    BracketPosition, DisputeDecision, Match, MatchId, MatchResult, MatchStateMachine,
    MatchStatus, Score, Slot, Transition,
};
use crate::services::{EntryRefund, Notifier, PrizePayout, PrizeService, ServiceError};

/// Result of closing check-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BuildOutcome {
    /// Bracket persisted and tournament active
    Started {
        matches: usize,
        byes: usize,
        /// Set when byes alone decided the tournament
        champion: Option<UserId>,
    },
    /// Not enough entrants, tournament cancelled and fees refunded
    Cancelled { reason: String },
}

/// Outcome of a match operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchUpdate {
    pub game: Match,
    pub transition: Transition,
    /// Advancement triggered by a completion
    pub advance: AdvanceReport,
}

/// Slot overwrite applied while repairing a halted bracket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRepair {
    pub match_id: MatchId,
    pub slot: Slot,
    /// New occupant, `None` empties the slot
    pub user_id: Option<UserId>,
}

/// Orchestrates the tournament lifecycle
#[derive(Clone)]
pub struct TournamentController {
    store: Arc<dyn BracketStore>,
    notifier: Arc<dyn Notifier>,
    prizes: Arc<dyn PrizeService>,
}

impl TournamentController {
    /// Create a new tournament controller
    pub fn new(
        store: Arc<dyn BracketStore>,
        notifier: Arc<dyn Notifier>,
        prizes: Arc<dyn PrizeService>,
    ) -> Self {
        Self {
            store,
            notifier,
            prizes,
        }
    }

    pub fn store(&self) -> &Arc<dyn BracketStore> {
        &self.store
    }

    /// Create a new tournament in `open` status
    pub async fn create_tournament(&self, config: TournamentConfig) -> TournamentResult<Tournament> {
        if config.name.trim().is_empty() {
            return Err(TournamentError::InvalidName);
        }
        if !config.has_supported_size() {
            return Err(TournamentError::UnsupportedParticipantCount(
                config.max_participants,
            ));
        }
        if config.format != TournamentFormat::Knockout {
            return Err(TournamentError::UnsupportedFormat(config.format));
        }
        if config.entry_fee < 0 {
            return Err(TournamentError::InvalidEntryFee(config.entry_fee));
        }
        if !config.prizes_distribution.is_valid() {
            return Err(TournamentError::InvalidPrizes);
        }

        let tournament = self.store.create_tournament(&config).await?;
        log::info!(
            "Created tournament {} '{}' ({} slots)",
            tournament.id,
            tournament.name,
            tournament.max_participants
        );
        Ok(tournament)
    }

    /// Register a participant while the tournament is open
    pub async fn register_participant(
        &self,
        tournament_id: TournamentId,
        user_id: UserId,
        entrant: Option<String>,
    ) -> TournamentResult<Participant> {
        let mut session = self.begin(tournament_id).await?;
        let mut tournament = session.tournament().clone();
        require_status(&tournament, TournamentStatus::Open)?;

        if tournament.participant(user_id).is_some() {
            return Err(TournamentError::AlreadyRegistered(user_id));
        }
        if tournament.participants.len() >= tournament.max_participants as usize {
            return Err(TournamentError::TournamentFull);
        }

        let participant = Participant {
            user_id,
            entrant,
            is_checked_in: false,
            registered_at: Utc::now(),
        };
        tournament.participants.push(participant.clone());
        session.save_tournament(&tournament).await?;
        session.commit().await?;

        log::info!("User {} registered for tournament {}", user_id, tournament_id);
        Ok(participant)
    }

    /// Withdraw a participant before the bracket is built
    pub async fn unregister_participant(
        &self,
        tournament_id: TournamentId,
        user_id: UserId,
    ) -> TournamentResult<()> {
        let mut session = self.begin(tournament_id).await?;
        let mut tournament = session.tournament().clone();
        if !matches!(
            tournament.status,
            TournamentStatus::Open | TournamentStatus::CheckIn
        ) {
            return Err(TournamentError::InvalidState {
                expected: TournamentStatus::Open,
                actual: tournament.status,
            });
        }

        let before = tournament.participants.len();
        tournament.participants.retain(|p| p.user_id != user_id);
        if tournament.participants.len() == before {
            return Err(TournamentError::NotRegistered(user_id));
        }
        session.save_tournament(&tournament).await?;
        session.commit().await?;

        log::info!("User {} left tournament {}", user_id, tournament_id);
        if tournament.entry_fee > 0 {
            let refund = EntryRefund {
                tournament_id,
                user_ids: vec![user_id],
                amount_each: tournament.entry_fee,
                idempotency_key: format!("tournament-{tournament_id}-refund-{user_id}"),
            };
            self.send_refund(&refund).await;
        }
        Ok(())
    }

    /// Move an open tournament into check-in
    pub async fn open_check_in(
        &self,
        tournament_id: TournamentId,
        deadline: Option<DateTime<Utc>>,
    ) -> TournamentResult<Tournament> {
        let mut session = self.begin(tournament_id).await?;
        let mut tournament = session.tournament().clone();
        require_status(&tournament, TournamentStatus::Open)?;

        tournament.status = TournamentStatus::CheckIn;
        if deadline.is_some() {
            tournament.check_in_deadline = deadline;
        }
        session.save_tournament(&tournament).await?;
        session.commit().await?;

        log::info!("Tournament {} opened check-in", tournament_id);
        self.dispatch(&[TournamentEvent::CheckInOpened { tournament_id }])
            .await;
        Ok(tournament)
    }

    /// Confirm attendance of a registered participant. Checking in twice is a no-op.
    pub async fn check_in(
        &self,
        tournament_id: TournamentId,
        user_id: UserId,
    ) -> TournamentResult<Participant> {
        let mut session = self.begin(tournament_id).await?;
        let mut tournament = session.tournament().clone();
        require_status(&tournament, TournamentStatus::CheckIn)?;

        let participant = tournament
            .participants
            .iter_mut()
            .find(|p| p.user_id == user_id)
            .ok_or(TournamentError::NotRegistered(user_id))?;
        if participant.is_checked_in {
            return Ok(participant.clone());
        }
        participant.is_checked_in = true;
        let participant = participant.clone();

        session.save_tournament(&tournament).await?;
        session.commit().await?;

        log::debug!("User {} checked in to tournament {}", user_id, tournament_id);
        Ok(participant)
    }

    /// Close check-in and build the bracket from a random draw
    pub async fn build_bracket(&self, tournament_id: TournamentId) -> TournamentResult<BuildOutcome> {
        self.close_check_in(tournament_id, None).await
    }

    /// Close check-in and build the bracket placing participants in `seeds` order
    pub async fn build_bracket_with_seeds(
        &self,
        tournament_id: TournamentId,
        seeds: Vec<UserId>,
    ) -> TournamentResult<BuildOutcome> {
        self.close_check_in(tournament_id, Some(seeds)).await
    }

    /// Cancel a tournament that has not finished and refund entry fees
    pub async fn cancel_tournament(
        &self,
        tournament_id: TournamentId,
        reason: String,
    ) -> TournamentResult<Tournament> {
        let mut session = self.begin(tournament_id).await?;
        let tournament = session.tournament().clone();
        if tournament.status.is_finished() {
            return Err(TournamentError::InvalidState {
                expected: TournamentStatus::Active,
                actual: tournament.status,
            });
        }

        self.cancel_in_session(session, tournament, reason).await
    }

    /// A participant opens the match room
    pub async fn start_match(&self, match_id: MatchId, actor: UserId) -> TournamentResult<Match> {
        let update = self
            .apply_to_match(match_id, |machine| machine.start(actor))
            .await?;
        Ok(update.game)
    }

    /// A participant reports a score
    pub async fn submit_match_result(
        &self,
        match_id: MatchId,
        actor: UserId,
        score: Score,
    ) -> TournamentResult<MatchUpdate> {
        self.apply_to_match(match_id, |machine| machine.submit_result(actor, score))
            .await
    }

    /// The opponent confirms the reported score
    pub async fn confirm_match_result(
        &self,
        match_id: MatchId,
        actor: UserId,
    ) -> TournamentResult<MatchUpdate> {
        self.apply_to_match(match_id, |machine| machine.confirm(actor))
            .await
    }

    /// A participant contests the match
    pub async fn open_dispute(
        &self,
        match_id: MatchId,
        actor: UserId,
        reason: String,
        proof: Option<String>,
    ) -> TournamentResult<Match> {
        let update = self
            .apply_to_match(match_id, |machine| {
                machine.open_dispute(actor, reason, proof)
            })
            .await?;
        Ok(update.game)
    }

    /// An admin settles a dispute
    pub async fn resolve_dispute(
        &self,
        match_id: MatchId,
        decision: DisputeDecision,
    ) -> TournamentResult<MatchUpdate> {
        self.apply_to_match(match_id, |machine| machine.resolve_dispute(decision))
            .await
    }

    /// Re-run advancement of a completed match.
    ///
    /// Safe to call any number of times: slots already holding the winner are
    /// left alone and no transition is reported twice.
    pub async fn advance_from_match(&self, match_id: MatchId) -> TournamentResult<AdvanceReport> {
        let tournament_id = self.tournament_of(match_id).await?;
        let mut session = self.begin(tournament_id).await?;
        let tournament = session.tournament().clone();
        if !matches!(
            tournament.status,
            TournamentStatus::Active | TournamentStatus::Completed
        ) {
            return Err(TournamentError::InvalidState {
                expected: TournamentStatus::Active,
                actual: tournament.status,
            });
        }
        require_running(&tournament)?;

        let game = session
            .match_by_id(match_id)
            .await?
            .ok_or(TournamentError::MatchNotFound(match_id))?;
        let advanced = RoundAdvancer::new(tournament.rounds())
            .advance(session.as_mut(), &game)
            .await;
        let report = match advanced {
            Ok(report) => report,
            Err(e) => return Err(self.halt_on_violation(session, match_id, e).await),
        };
        session.commit().await?;

        self.after_advance(tournament_id, &report.events, &report)
            .await;
        Ok(report)
    }

    /// Apply slot repairs to a halted bracket and let advancement resume.
    ///
    /// Matches left waiting by the halt can be pushed on with
    /// [`Self::advance_from_match`] or by confirming them again.
    pub async fn repair_bracket(
        &self,
        tournament_id: TournamentId,
        repairs: Vec<SlotRepair>,
        repaired_by: UserId,
    ) -> TournamentResult<Tournament> {
        let mut session = self.begin(tournament_id).await?;
        let mut tournament = session.tournament().clone();
        require_status(&tournament, TournamentStatus::Active)?;
        let Some(reason) = tournament.halted_reason.take() else {
            return Err(TournamentError::NotHalted(tournament_id));
        };

        for repair in &repairs {
            session
                .set_slot(repair.match_id, repair.slot, repair.user_id)
                .await
                .map_err(|e| match e {
                    StoreError::MatchNotFound(id) => TournamentError::MatchNotFound(id),
                    e => TournamentError::Store(e),
                })?;
        }
        session.save_tournament(&tournament).await?;
        session.commit().await?;

        log::warn!(
            "Admin {} repaired tournament {} ({} slots) after: {}",
            repaired_by,
            tournament_id,
            repairs.len(),
            reason
        );
        self.dispatch(&[TournamentEvent::BracketRepaired {
            tournament_id,
            repaired_by,
        }])
        .await;
        Ok(tournament)
    }

    /// Get tournament by ID
    pub async fn get_tournament(&self, tournament_id: TournamentId) -> TournamentResult<Tournament> {
        self.store
            .get_tournament(tournament_id)
            .await?
            .ok_or(TournamentError::NotFound(tournament_id))
    }

    /// Get match by ID
    pub async fn get_match(&self, match_id: MatchId) -> TournamentResult<Match> {
        self.store
            .find_match(match_id)
            .await?
            .ok_or(TournamentError::MatchNotFound(match_id))
    }

    /// Tournament with all of its matches grouped by round
    pub async fn get_bracket(&self, tournament_id: TournamentId) -> TournamentResult<Bracket> {
        let tournament = self.get_tournament(tournament_id).await?;
        let matches = self.store.list_matches(tournament_id).await?;
        Ok(Bracket::new(tournament, matches))
    }

    /// Build brackets of every tournament whose check-in deadline passed.
    ///
    /// A failing tournament is logged and skipped.
    pub async fn close_expired_check_ins(
        &self,
        now: DateTime<Utc>,
    ) -> TournamentResult<Vec<(TournamentId, BuildOutcome)>> {
        let due = self.store.check_ins_due(now).await?;
        let mut closed = Vec::with_capacity(due.len());

        for tournament_id in due {
            match self.build_bracket(tournament_id).await {
                Ok(outcome) => closed.push((tournament_id, outcome)),
                // Closed by hand since the sweep looked
                Err(TournamentError::InvalidState { .. }) => {
                    log::debug!("Tournament {} no longer in check-in", tournament_id);
                }
                Err(e) => {
                    log::error!(
                        "Failed to close check-in of tournament {}: {}",
                        tournament_id,
                        e
                    );
                }
            }
        }

        Ok(closed)
    }

    async fn begin(&self, tournament_id: TournamentId) -> TournamentResult<Box<dyn BracketSession>> {
        self.store.begin(tournament_id).await.map_err(|e| match e {
            StoreError::TournamentNotFound(id) => TournamentError::NotFound(id),
            e => TournamentError::Store(e),
        })
    }

    async fn tournament_of(&self, match_id: MatchId) -> TournamentResult<TournamentId> {
        Ok(self.get_match(match_id).await?.tournament_id)
    }

    async fn close_check_in(
        &self,
        tournament_id: TournamentId,
        seeds: Option<Vec<UserId>>,
    ) -> TournamentResult<BuildOutcome> {
        let mut session = self.begin(tournament_id).await?;
        let mut tournament = session.tournament().clone();
        require_status(&tournament, TournamentStatus::CheckIn)?;
        if tournament.format != TournamentFormat::Knockout {
            return Err(TournamentError::UnsupportedFormat(tournament.format));
        }

        let entrants = tournament.checked_in();
        let slots = tournament.max_participants as usize;
        let shortfall = if entrants.is_empty() {
            Some("no participant checked in".to_string())
        } else if entrants.len() < slots
            && tournament.incomplete_action == IncompleteAction::Cancel
        {
            Some(format!(
                "only {} of {} participants checked in",
                entrants.len(),
                slots
            ))
        } else {
            None
        };
        if let Some(reason) = shortfall {
            self.cancel_in_session(session, tournament, reason.clone())
                .await?;
            return Ok(BuildOutcome::Cancelled { reason });
        }

        let builder = BracketBuilder::new(tournament.max_participants)?;
        let plan: BracketPlan = match seeds {
            Some(seeds) => {
                let expected: HashSet<UserId> = entrants.iter().copied().collect();
                let given: HashSet<UserId> = seeds.iter().copied().collect();
                if seeds.len() != entrants.len() || given != expected {
                    return Err(TournamentError::SeedsMismatch);
                }
                builder.build_seeded(&seeds)?
            }
            None => {
                let mut rng = rand::rng();
                builder.build(&entrants, &mut rng)?
            }
        };

        let inserted = session.insert_matches(&plan.matches).await?;
        tournament.status = TournamentStatus::Active;
        tournament.started_at = Some(Utc::now());
        session.save_tournament(&tournament).await?;

        let byes = plan.bye_count();
        let mut events = vec![TournamentEvent::BracketBuilt {
            tournament_id,
            matches: inserted.len(),
            byes,
        }];
        events.extend(
            inserted
                .iter()
                .filter(|m| m.round == 1 && m.status == MatchStatus::Scheduled)
                .filter_map(|m| {
                    Some(TournamentEvent::MatchScheduled {
                        tournament_id,
                        match_id: m.id,
                        round: m.round,
                        player1: m.player1?,
                        player2: m.player2?,
                    })
                }),
        );

        // Byes have winners nobody will report, advance them right away
        let advancer = RoundAdvancer::new(plan.rounds);
        let mut report = AdvanceReport::default();
        for position in &plan.pending_byes {
            let bye = inserted
                .iter()
                .find(|m| m.position() == *position)
                .ok_or(BracketError::MissingMatch(*position))?;
            if let Some(user_id) = bye.winner {
                events.push(TournamentEvent::ByeAdvanced {
                    tournament_id,
                    match_id: bye.id,
                    round: bye.round,
                    user_id,
                });
            }
            report.merge(advancer.advance(session.as_mut(), bye).await?);
        }
        session.commit().await?;

        log::info!(
            "Tournament {} started: {} entrants, {} matches, {} byes",
            tournament_id,
            entrants.len(),
            inserted.len(),
            byes
        );
        events.extend(report.events.iter().cloned());
        self.after_advance(tournament_id, &events, &report).await;
        if let Some(refund) = EntryRefund::for_no_shows(&tournament) {
            self.send_refund(&refund).await;
        }

        Ok(BuildOutcome::Started {
            matches: inserted.len(),
            byes,
            champion: report.champion,
        })
    }

    async fn cancel_in_session(
        &self,
        mut session: Box<dyn BracketSession>,
        mut tournament: Tournament,
        reason: String,
    ) -> TournamentResult<Tournament> {
        let withdrawn = if tournament.status == TournamentStatus::Active {
            cancel_open_matches(session.as_mut(), &tournament).await?
        } else {
            0
        };
        tournament.status = TournamentStatus::Cancelled;
        tournament.finished_at = Some(Utc::now());
        session.save_tournament(&tournament).await?;
        session.commit().await?;

        log::warn!(
            "Tournament {} cancelled ({} open matches withdrawn): {}",
            tournament.id,
            withdrawn,
            reason
        );
        self.dispatch(&[TournamentEvent::TournamentCancelled {
            tournament_id: tournament.id,
            reason,
        }])
        .await;
        let refund = EntryRefund::for_tournament(&tournament);
        if tournament.entry_fee > 0 && !refund.user_ids.is_empty() {
            self.send_refund(&refund).await;
        }
        Ok(tournament)
    }

    async fn apply_to_match<F>(&self, match_id: MatchId, action: F) -> TournamentResult<MatchUpdate>
    where
        F: FnOnce(&mut MatchStateMachine<'_>) -> MatchResult<Transition> + Send,
    {
        let tournament_id = self.tournament_of(match_id).await?;
        let mut session = self.begin(tournament_id).await?;
        let tournament = session.tournament().clone();
        require_status(&tournament, TournamentStatus::Active)?;
        require_running(&tournament)?;

        let mut game = session
            .match_by_id(match_id)
            .await?
            .ok_or(TournamentError::MatchNotFound(match_id))?;
        let previous = game.status;
        let transition = {
            let mut machine = MatchStateMachine::new(&mut game, Utc::now());
            action(&mut machine)?
        };
        session.save_match(&game).await?;

        let mut events = Vec::new();
        let mut advance = AdvanceReport::default();
        match transition {
            Transition::Started => {}
            Transition::AwaitingConfirmation => {
                if let (Some(reported_by), Some(score)) = (game.reported_by, game.reported_score) {
                    events.push(TournamentEvent::ResultSubmitted {
                        tournament_id,
                        match_id,
                        reported_by,
                        score,
                    });
                }
            }
            Transition::Disputed => {
                if let Some(dispute) = &game.dispute {
                    events.push(TournamentEvent::DisputeOpened {
                        tournament_id,
                        match_id,
                        opened_by: dispute.opened_by,
                    });
                }
            }
            Transition::Completed { winner, loser } => {
                let ruling = game
                    .dispute
                    .as_ref()
                    .and_then(|d| d.decision.as_ref())
                    .filter(|_| previous == MatchStatus::Dispute);
                events.push(match ruling {
                    Some(decision) => TournamentEvent::DisputeResolved {
                        tournament_id,
                        match_id,
                        winner,
                        resolved_by: decision.resolved_by,
                    },
                    None => TournamentEvent::MatchCompleted {
                        tournament_id,
                        match_id,
                        winner,
                        loser,
                    },
                });

                let advanced = RoundAdvancer::new(tournament.rounds())
                    .advance(session.as_mut(), &game)
                    .await;
                advance = match advanced {
                    Ok(report) => report,
                    Err(e) => return Err(self.halt_on_violation(session, match_id, e).await),
                };
                events.extend(advance.events.iter().cloned());
            }
        }
        session.commit().await?;

        self.after_advance(tournament_id, &events, &advance).await;
        Ok(MatchUpdate {
            game,
            transition,
            advance,
        })
    }

    /// Roll back a failed advancement. An inconsistent bracket additionally
    /// halts the tournament so no other match advances into it.
    async fn halt_on_violation(
        &self,
        session: Box<dyn BracketSession>,
        match_id: MatchId,
        error: BracketError,
    ) -> TournamentError {
        let tournament_id = session.tournament().id;
        drop(session);
        if !error.is_invariant_violation() {
            return error.into();
        }

        let reason = error.to_string();
        match self.mark_halted(tournament_id, &reason).await {
            Ok(true) => {
                log::error!(
                    "Tournament {} halted at match {}: {}",
                    tournament_id,
                    match_id,
                    reason
                );
                self.dispatch(&[TournamentEvent::BracketHalted {
                    tournament_id,
                    match_id,
                    reason,
                }])
                .await;
            }
            Ok(false) => {}
            Err(e) => log::error!(
                "Could not halt tournament {} after '{}': {}",
                tournament_id,
                reason,
                e
            ),
        }
        error.into()
    }

    /// Persist the halt marker in a fresh session. `false` when already halted.
    async fn mark_halted(&self, tournament_id: TournamentId, reason: &str) -> TournamentResult<bool> {
        let mut session = self.begin(tournament_id).await?;
        let mut tournament = session.tournament().clone();
        if tournament.status != TournamentStatus::Active || tournament.is_halted() {
            return Ok(false);
        }
        tournament.halted_reason = Some(reason.to_string());
        session.save_tournament(&tournament).await?;
        session.commit().await?;
        Ok(true)
    }

    /// Deliver committed events and pay out a freshly decided tournament
    async fn after_advance(
        &self,
        tournament_id: TournamentId,
        events: &[TournamentEvent],
        report: &AdvanceReport,
    ) {
        self.dispatch(events).await;

        let Some(champion) = report.champion else {
            return;
        };
        match self.get_tournament(tournament_id).await {
            Ok(tournament) => {
                let payout = PrizePayout::for_tournament(&tournament, champion, report.runner_up);
                match self.prizes.distribute(&payout).await {
                    Ok(()) => log::info!("Paid out tournament {}", tournament_id),
                    Err(ServiceError::Duplicate(key)) => {
                        log::warn!("Payout {} already requested", key)
                    }
                    Err(e) => log::error!("Payout of tournament {} failed: {}", tournament_id, e),
                }
            }
            Err(e) => log::error!(
                "Could not load tournament {} for payout: {}",
                tournament_id,
                e
            ),
        }
    }

    async fn send_refund(&self, refund: &EntryRefund) {
        match self.prizes.refund(refund).await {
            Ok(()) => log::info!(
                "Refunded {} participants of tournament {}",
                refund.user_ids.len(),
                refund.tournament_id
            ),
            Err(ServiceError::Duplicate(key)) => log::warn!("Refund {} already requested", key),
            Err(e) => log::error!(
                "Refund for tournament {} failed: {}",
                refund.tournament_id,
                e
            ),
        }
    }

    async fn dispatch(&self, events: &[TournamentEvent]) {
        for event in events {
            if let Err(e) = self.notifier.notify(event).await {
                log::warn!("Notification failed for '{}': {}", event, e);
            }
        }
    }
}

/// Withdraw every unfinished match of `tournament`
async fn cancel_open_matches(
    session: &mut dyn BracketSession,
    tournament: &Tournament,
) -> TournamentResult<usize> {
    let mut withdrawn = 0;
    for round in 1..=tournament.rounds() {
        for index in 0..(tournament.max_participants >> round) {
            let position = BracketPosition::new(round, index);
            let Some(mut game) = session.match_at(position).await? else {
                continue;
            };
            if game.status.is_terminal() {
                continue;
            }
            game.cancel();
            session.save_match(&game).await?;
            withdrawn += 1;
        }
    }
    Ok(withdrawn)
}

fn require_running(tournament: &Tournament) -> TournamentResult<()> {
    if tournament.is_halted() {
        return Err(TournamentError::Halted(tournament.id));
    }
    Ok(())
}

fn require_status(tournament: &Tournament, expected: TournamentStatus) -> TournamentResult<()> {
    if tournament.status != expected {
        return Err(TournamentError::InvalidState {
            expected,
            actual: tournament.status,
        });
    }
    Ok(())
}
