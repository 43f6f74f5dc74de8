//! Integration tests for match results and disputes through the controller

mod common;

use common::{Harness, harness};
use matchplay::matches::{DisputeDecision, Match, MatchError, MatchStatus, Score, Transition};
use matchplay::tournament::{
    IncompleteAction, TournamentError, TournamentEvent, TournamentStatus,
};

/// Four players in an eight-slot bracket, every round-one match is a bye
async fn four_players(h: &Harness) -> i64 {
    let t = h
        .checked_in(8, &[1, 2, 3, 4], IncompleteAction::PlayWithByes, 0)
        .await;
    h.controller
        .build_bracket_with_seeds(t.id, vec![1, 2, 3, 4])
        .await
        .unwrap();
    t.id
}

/// Eight players, seeded in order, every round-one match is played
async fn eight_players(h: &Harness) -> (i64, Match) {
    let users: Vec<i64> = (1..=8).collect();
    let t = h
        .checked_in(8, &users, IncompleteAction::PlayWithByes, 0)
        .await;
    h.controller
        .build_bracket_with_seeds(t.id, users)
        .await
        .unwrap();
    // R1M0 = 1 vs 8
    let game = h.match_at(t.id, 1, 0).await;
    assert_eq!((game.player1, game.player2), (Some(1), Some(8)));
    (t.id, game)
}

#[tokio::test]
async fn test_four_of_eight_is_all_byes() {
    let h = harness();
    let id = four_players(&h).await;

    let bracket = h.controller.get_bracket(id).await.unwrap();
    assert!(bracket.rounds[0].iter().all(|m| m.is_bye));
    assert!(
        bracket.rounds[1]
            .iter()
            .all(|m| m.has_both_players() && m.status == MatchStatus::Scheduled)
    );
}

#[tokio::test]
async fn test_start_then_report_then_confirm() {
    let h = harness();
    let (id, game) = eight_players(&h).await;

    let started = h.controller.start_match(game.id, 8).await.unwrap();
    assert_eq!(started.status, MatchStatus::Ongoing);

    let update = h
        .controller
        .submit_match_result(game.id, 1, Score::new(3, 1))
        .await
        .unwrap();
    assert_eq!(update.transition, Transition::AwaitingConfirmation);
    assert_eq!(update.game.status, MatchStatus::Review);

    let update = h.controller.confirm_match_result(game.id, 8).await.unwrap();
    assert_eq!(
        update.transition,
        Transition::Completed {
            winner: 1,
            loser: 8
        }
    );
    assert_eq!(update.game.score, Some(Score::new(3, 1)));
    assert!(update.game.completed_at.is_some());

    let next = h.match_at(id, 2, 0).await;
    assert_eq!(next.player1, Some(1));
    assert_eq!(
        h.notifier
            .count(|e| matches!(e, TournamentEvent::MatchCompleted { winner: 1, .. })),
        1
    );
}

#[tokio::test]
async fn test_reporter_cannot_confirm() {
    let h = harness();
    let (_, game) = eight_players(&h).await;

    h.controller
        .submit_match_result(game.id, 1, Score::new(3, 1))
        .await
        .unwrap();
    assert!(matches!(
        h.controller.confirm_match_result(game.id, 1).await,
        Err(TournamentError::Match(MatchError::SelfConfirmation))
    ));
}

#[tokio::test]
async fn test_outsider_cannot_report() {
    let h = harness();
    let (_, game) = eight_players(&h).await;

    assert!(matches!(
        h.controller
            .submit_match_result(game.id, 5, Score::new(3, 1))
            .await,
        Err(TournamentError::Match(MatchError::NotAParticipant(5)))
    ));
}

#[tokio::test]
async fn test_tie_rejected() {
    let h = harness();
    let (_, game) = eight_players(&h).await;

    assert!(matches!(
        h.controller
            .submit_match_result(game.id, 1, Score::new(2, 2))
            .await,
        Err(TournamentError::Match(MatchError::IndecisiveScore(_)))
    ));
}

#[tokio::test]
async fn test_match_waiting_for_players_cannot_start() {
    let h = harness();
    let (id, _) = eight_players(&h).await;
    let semi = h.match_at(id, 2, 0).await;

    assert!(matches!(
        h.controller.start_match(semi.id, 1).await,
        Err(TournamentError::Match(MatchError::PlayersNotAssigned(_)))
    ));
}

#[tokio::test]
async fn test_conflicting_report_opens_dispute_and_admin_overrides() {
    let h = harness();
    let (id, game) = eight_players(&h).await;

    h.controller
        .submit_match_result(game.id, 1, Score::new(3, 1))
        .await
        .unwrap();
    let update = h
        .controller
        .submit_match_result(game.id, 8, Score::new(1, 3))
        .await
        .unwrap();
    assert_eq!(update.transition, Transition::Disputed);
    let dispute = update.game.dispute.clone().unwrap();
    assert_eq!(dispute.reported_score, Some(Score::new(3, 1)));
    assert_eq!(dispute.counter_score, Some(Score::new(1, 3)));

    // Further reports are refused until an admin rules
    assert!(h.controller.confirm_match_result(game.id, 1).await.is_err());

    let update = h
        .controller
        .resolve_dispute(
            game.id,
            DisputeDecision {
                winner: 8,
                score: None,
                resolved_by: 1000,
                note: Some("video evidence".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(
        update.transition,
        Transition::Completed {
            winner: 8,
            loser: 1
        }
    );
    // Overridden report is not carried over as the final score
    assert_eq!(update.game.score, None);
    let dispute = update.game.dispute.unwrap();
    assert_eq!(dispute.decision.unwrap().resolved_by, 1000);
    assert!(dispute.resolved_at.is_some());

    assert_eq!(h.match_at(id, 2, 0).await.player1, Some(8));
    assert_eq!(
        h.notifier.count(|e| matches!(
            e,
            TournamentEvent::DisputeResolved {
                winner: 8,
                resolved_by: 1000,
                ..
            }
        )),
        1
    );
}

#[tokio::test]
async fn test_foul_play_dispute_with_proof() {
    let h = harness();
    let (_, game) = eight_players(&h).await;

    h.controller.start_match(game.id, 1).await.unwrap();
    let disputed = h
        .controller
        .open_dispute(
            game.id,
            8,
            "opponent disconnected on purpose".to_string(),
            Some("https://proof.example/clip".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(disputed.status, MatchStatus::Dispute);
    assert_eq!(
        disputed.dispute.unwrap().proof.as_deref(),
        Some("https://proof.example/clip")
    );

    let result = h
        .controller
        .resolve_dispute(
            game.id,
            DisputeDecision {
                winner: 8,
                score: Some(Score::new(3, 0)),
                resolved_by: 1000,
                note: None,
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(TournamentError::Match(MatchError::InvalidDecision(_)))
    ));

    let update = h
        .controller
        .resolve_dispute(
            game.id,
            DisputeDecision {
                winner: 8,
                score: Some(Score::new(0, 3)),
                resolved_by: 1000,
                note: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(update.game.winner, Some(8));
    assert_eq!(update.game.score, Some(Score::new(0, 3)));
}

#[tokio::test]
async fn test_match_operations_need_active_tournament() {
    let h = harness();
    let (id, game) = eight_players(&h).await;

    h.controller
        .cancel_tournament(id, "venue closed".to_string())
        .await
        .unwrap();

    assert!(matches!(
        h.controller.start_match(game.id, 1).await,
        Err(TournamentError::InvalidState {
            expected: TournamentStatus::Active,
            actual: TournamentStatus::Cancelled
        })
    ));
}

#[tokio::test]
async fn test_unknown_match() {
    let h = harness();
    assert!(matches!(
        h.controller.start_match(404, 1).await,
        Err(TournamentError::MatchNotFound(404))
    ));
}
