//! Integration tests for the GARRISON rules engine
//!
//! Tests the full stack: deployment, combat, game over, snapshots, AI play
//! and replay of recorded games.

use garrison_core::{
    random_deployment, standard_deployment, AiKind, CombatOutcome, EndReason, Game, GameError,
    GameRecord, Heuristics, IllegalMoveReason, Move, Phase, Placement, Player, Position, Rank,
    Role, RowRange, RuleSet, Side, Strategy, Viewer,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn rules(rows: u8, cols: u8, split: u8, quotas: &[(Rank, u8)]) -> RuleSet {
    RuleSet {
        name: "scenario".to_string(),
        rows,
        cols,
        lakes: vec![],
        quotas: quotas.iter().copied().collect::<BTreeMap<_, _>>(),
        top_territory: RowRange::new(0, split - 1),
        bottom_territory: RowRange::new(split, rows - 1),
        first_to_move: Side::Bottom,
    }
}

fn p(row: u8, col: u8) -> Position {
    Position::new(row, col)
}

fn new_game(rules: RuleSet) -> Game {
    Game::new(
        rules,
        Player::new(Side::Bottom, "South", Role::Human),
        Player::new(Side::Top, "North", Role::Human),
    )
    .unwrap()
}

fn started(rules: RuleSet, bottom: &[Placement], top: &[Placement]) -> Game {
    let mut game = new_game(rules);
    game.submit_deployment(Side::Bottom, bottom).unwrap();
    game.submit_deployment(Side::Top, top).unwrap();
    game.start().unwrap();
    game
}

/// Two armies face to face across the middle line of a 4x4 board
fn skirmish() -> Game {
    let rules = rules(
        4,
        4,
        2,
        &[
            (Rank::Flag, 1),
            (Rank::Spy, 1),
            (Rank::Miner, 1),
            (Rank::Lieutenant, 1),
            (Rank::Captain, 1),
            (Rank::Marshal, 1),
            (Rank::Bomb, 1),
        ],
    );
    let bottom = [
        (p(2, 0), Rank::Miner),
        (p(2, 1), Rank::Spy),
        (p(2, 2), Rank::Captain),
        (p(2, 3), Rank::Lieutenant),
        (p(3, 0), Rank::Flag),
        (p(3, 1), Rank::Bomb),
        (p(3, 2), Rank::Marshal),
    ];
    let top = [
        (p(0, 0), Rank::Spy),
        (p(0, 1), Rank::Miner),
        (p(0, 2), Rank::Captain),
        (p(1, 0), Rank::Lieutenant),
        (p(1, 1), Rank::Marshal),
        (p(1, 2), Rank::Bomb),
        (p(1, 3), Rank::Flag),
    ];
    started(rules, &bottom, &top)
}

// ============================================================================
// COMBAT SCENARIOS
// ============================================================================

#[test]
fn test_miner_attacking_lieutenant_dies() {
    let mut game = skirmish();
    let report = game
        .submit_move(Side::Bottom, Move::new(p(2, 0), p(1, 0)))
        .unwrap();

    let combat = report.combat.unwrap();
    assert_eq!(combat.outcome, CombatOutcome::DefenderWins);
    assert_eq!(game.casualties().of(Side::Bottom), &[Rank::Miner]);
    assert!(game.casualties().of(Side::Top).is_empty());

    let view = game.snapshot(Viewer::Side(Side::Bottom));
    let defender = view.occupant(p(1, 0)).unwrap();
    assert_eq!(defender.owner, Side::Top);
    assert_eq!(defender.rank, Some(Rank::Lieutenant));
    assert!(view.occupant(p(2, 0)).is_none());
    assert_eq!(game.to_move(), Some(Side::Top));
}

#[test]
fn test_spy_attacking_marshal_wins() {
    let mut game = skirmish();
    let report = game
        .submit_move(Side::Bottom, Move::new(p(2, 1), p(1, 1)))
        .unwrap();

    assert_eq!(report.combat.unwrap().outcome, CombatOutcome::AttackerWins);
    assert_eq!(game.casualties().of(Side::Top), &[Rank::Marshal]);
    let unit = game.board().unit_at(p(1, 1)).unwrap();
    assert_eq!((unit.owner, unit.rank), (Side::Bottom, Rank::Spy));
    assert!(unit.revealed);
}

#[test]
fn test_captain_attacking_bomb_dies() {
    let mut game = skirmish();
    let report = game
        .submit_move(Side::Bottom, Move::new(p(2, 2), p(1, 2)))
        .unwrap();

    assert_eq!(report.combat.unwrap().outcome, CombatOutcome::DefenderWins);
    assert_eq!(game.casualties().of(Side::Bottom), &[Rank::Captain]);
    assert_eq!(game.board().unit_at(p(1, 2)).map(|u| u.rank), Some(Rank::Bomb));
    assert!(game.board().unit_at(p(2, 2)).is_none());
}

#[test]
fn test_flag_capture_ends_game_and_reveals_everything() {
    let mut game = skirmish();
    let report = game
        .submit_move(Side::Bottom, Move::new(p(2, 3), p(1, 3)))
        .unwrap();

    let outcome = report.outcome.unwrap();
    assert_eq!(outcome.winner, Side::Bottom);
    assert_eq!(outcome.reason, EndReason::FlagCaptured);
    assert_eq!(game.phase(), Phase::GameOver(outcome));
    assert_eq!(game.status_text(), "South wins: flag captured");

    for viewer in [Viewer::Side(Side::Top), Viewer::Side(Side::Bottom), Viewer::Spectator] {
        let view = game.snapshot(viewer);
        assert!(view.is_game_over);
        assert!(view.occupants().all(|(_, o)| o.rank.is_some()));
    }

    assert_eq!(
        game.submit_move(Side::Top, Move::new(p(1, 0), p(2, 0))),
        Err(GameError::GameAlreadyOver)
    );
}

#[test]
fn test_boxed_in_side_loses_on_its_turn() {
    let rules = rules(4, 4, 2, &[(Rank::Flag, 1), (Rank::Scout, 1), (Rank::Bomb, 1)]);
    let bottom = [(p(3, 0), Rank::Flag), (p(3, 1), Rank::Bomb), (p(3, 3), Rank::Scout)];
    // Scout wedged between its own flag, bomb and the corner
    let top = [(p(0, 0), Rank::Scout), (p(0, 1), Rank::Flag), (p(1, 0), Rank::Bomb)];
    let mut game = started(rules, &bottom, &top);

    let mv = game.legal_moves()[0];
    let report = game.submit_move(Side::Bottom, mv).unwrap();

    let outcome = report.outcome.unwrap();
    assert_eq!(outcome.winner, Side::Bottom);
    assert_eq!(outcome.reason, EndReason::NoLegalMoves);
    assert_eq!(game.history(), &[mv]);
    assert_eq!(game.status_text(), "South wins: North cannot move");
}

// ============================================================================
// LEGALITY
// ============================================================================

#[test]
fn test_rejected_moves_change_nothing() {
    let mut game = skirmish();
    let before = game.snapshot(Viewer::Omniscient);

    assert_eq!(
        game.submit_move(Side::Top, Move::new(p(1, 0), p(2, 0))),
        Err(GameError::NotYourTurn {
            expected: Side::Bottom,
            got: Side::Top
        })
    );
    assert_eq!(game.snapshot(Viewer::Omniscient), before);

    let attempts = [
        (Move::new(p(3, 1), p(3, 3)), IllegalMoveReason::Immobile),
        (Move::new(p(1, 0), p(2, 0)), IllegalMoveReason::NotOwner),
        (Move::new(p(3, 3), p(2, 3)), IllegalMoveReason::EmptySquare),
        (Move::new(p(2, 3), p(0, 3)), IllegalMoveReason::Unreachable),
        (Move::new(p(3, 2), p(3, 1)), IllegalMoveReason::Unreachable),
    ];

    for (mv, reason) in attempts {
        assert_eq!(
            game.submit_move(Side::Bottom, mv),
            Err(GameError::IllegalMove {
                from: mv.from,
                to: mv.to,
                reason
            })
        );
        assert_eq!(game.snapshot(Viewer::Omniscient), before);
    }
    assert_eq!(game.to_move(), Some(Side::Bottom));
}

#[test]
fn test_every_generated_move_is_accepted() {
    let game = {
        let rules = RuleSet::classic();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let bottom = random_deployment(&rules, Side::Bottom, &mut rng);
        let top = random_deployment(&rules, Side::Top, &mut rng);
        started(rules, &bottom, &top)
    };

    for mv in game.legal_moves() {
        let mut branch = game.clone();
        assert!(branch.submit_move(Side::Bottom, mv).is_ok(), "{mv:?} rejected");
    }
}

// ============================================================================
// DEPLOYMENT
// ============================================================================

#[test]
fn test_presets_accept_standard_and_random_layouts() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    for name in ["classic", "duel"] {
        let rules = RuleSet::preset(name).unwrap();
        for side in [Side::Bottom, Side::Top] {
            let mut game = new_game(rules.clone());
            game.submit_deployment(side, &standard_deployment(&rules, side))
                .unwrap();

            let mut game = new_game(rules.clone());
            game.submit_deployment(side, &random_deployment(&rules, side, &mut rng))
                .unwrap();
        }
    }
}

#[test]
fn test_single_violation_commits_nothing() {
    let rules = RuleSet::duel();
    let good = standard_deployment(&rules, Side::Bottom);

    let mut outside = good.clone();
    outside[0].0 = p(0, 0);

    let mut extra = good.clone();
    extra.push((p(5, 7), Rank::Scout));

    let mut duplicate = good.clone();
    duplicate[1].0 = duplicate[0].0;

    for bad in [outside, extra, duplicate] {
        let mut game = new_game(rules.clone());
        assert!(game.submit_deployment(Side::Bottom, &bad).is_err());
        assert!(game.army(Side::Bottom).is_none());
        assert_eq!(game.board().units().count(), 0);
        assert_eq!(
            game.phase(),
            Phase::Deploying {
                bottom_ready: false,
                top_ready: false
            }
        );
    }
}

// ============================================================================
// AI PLAY AND REPLAY
// ============================================================================

fn play_out(rules: RuleSet, kinds: [AiKind; 2], seed: u64, max_plies: usize) -> Game {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let bottom = random_deployment(&rules, Side::Bottom, &mut rng);
    let top = random_deployment(&rules, Side::Top, &mut rng);
    let mut game = started(rules, &bottom, &top);

    let mut players: Vec<Box<dyn Strategy>> = [Side::Bottom, Side::Top]
        .into_iter()
        .map(|side| kinds[side as usize].build(side, Heuristics::default(), seed))
        .collect();

    for _ in 0..max_plies {
        let Some(side) = game.to_move() else { break };
        let mv = players[side as usize]
            .choose_move(&game)
            .expect("side to move always has a legal move");
        assert!(game.legal_moves().contains(&mv), "{side} chose illegal {mv:?}");
        let report = game.submit_move(side, mv).unwrap();
        for player in players.iter_mut() {
            player.observe(&report);
        }
    }
    game
}

#[test]
fn test_ai_games_only_play_legal_moves() {
    let game = play_out(
        RuleSet::duel(),
        [AiKind::Search { depth: 2 }, AiKind::Fair],
        5,
        300,
    );
    if let Some(outcome) = game.outcome() {
        assert_ne!(outcome.reason, EndReason::Surrender);
    }
    assert!(!game.history().is_empty());
}

#[test]
fn test_recorded_ai_game_replays_identically() {
    let game = play_out(
        RuleSet::duel(),
        [AiKind::Fair, AiKind::Search { depth: 1 }],
        9,
        120,
    );
    let record = GameRecord::from_game(&game).unwrap();
    let replayed = record.replay().unwrap();

    assert_eq!(replayed.history(), game.history());
    assert_eq!(replayed.outcome(), game.outcome());
    assert_eq!(
        replayed.snapshot(Viewer::Omniscient),
        game.snapshot(Viewer::Omniscient)
    );
}
