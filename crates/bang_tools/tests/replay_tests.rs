//! Replay tests for bang_tools.
//!
//! These run the bundled scenarios end to end through the scheduler.

use bang_core::prelude::*;
use bang_tools::replay::{replay, Replay};
use bang_test_utils::fixtures::from_ron;
use bang_tools::scenario::{Scenario, ScenarioError, ScriptStep};

const DUEL: &str = include_str!("../scenarios/duel.ron");

fn duel() -> Scenario {
    Scenario::from_ron_str(DUEL).expect("bundled scenario parses")
}

// =============================================================================
// Full Replays
// =============================================================================

mod duel {
    use super::*;

    #[test]
    fn test_duel_completes_every_action() {
        let report = replay(&duel(), SchedulerConfig::default()).unwrap();

        assert_eq!(report.steps, duel().script.len());
        assert_eq!(report.stats.submitted, 13);
        assert_eq!(report.stats.completed, 13);
        assert_eq!(report.stats.failed, 0);
        assert_eq!(report.illegal_moves, 1);
        assert_eq!(report.missed_shots, 1);
    }

    #[test]
    fn test_stampede_trips_the_watchdog_once() {
        let report = replay(&duel(), SchedulerConfig::default()).unwrap();
        let stampede = report
            .timeline
            .iter()
            .find(|e| e.kind == "stampede")
            .unwrap();

        assert_eq!(report.stuck, vec![stampede.action]);
        assert_eq!(report.stats.stuck, 1);
        assert!(report.elapsed_ms >= stampede.at_ms + 7_000);
    }

    #[test]
    fn test_effects_on_one_piece_play_in_order() {
        let report = replay(&duel(), SchedulerConfig::default()).unwrap();
        let find = |kind: &str| {
            report
                .timeline
                .iter()
                .find(|e| e.kind == kind)
                .unwrap_or_else(|| panic!("no {kind} in timeline"))
        };
        let shot = find("shot");
        let dynamite = find("dynamite");
        let removed = find("removed");

        assert!(dynamite.at_ms >= shot.at_ms + shot.duration_ms);
        assert!(removed.at_ms >= dynamite.at_ms + dynamite.duration_ms);
        assert_eq!(dynamite.duration_ms, 900);
    }

    #[test]
    fn test_watchdog_threshold_is_configurable() {
        let config = SchedulerConfig::default().with_watchdog(std::time::Duration::from_secs(10));
        let report = replay(&duel(), config).unwrap();
        assert!(report.stuck.is_empty());
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = replay(&duel(), SchedulerConfig::default()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["stats"]["completed"], 13);
        assert!(json["timeline"].as_array().is_some_and(|t| !t.is_empty()));
    }
}

// =============================================================================
// Stepping
// =============================================================================

mod stepping {
    use super::*;

    #[test]
    fn test_board_tracks_moves_and_removals() {
        let scenario = duel();
        let mut round = Replay::new(&scenario, SchedulerConfig::default()).unwrap();

        round
            .step(
                0,
                &ScriptStep::Move {
                    piece: 3,
                    x: 9,
                    y: 7,
                },
            )
            .unwrap();
        assert_eq!(round.board().tile_state(9, 9), Some(TileState::Flat));
        assert_eq!(round.board().tile_state(9, 7), Some(TileState::Owned(1)));

        round.step(1, &ScriptStep::Remove(3)).unwrap();
        assert_eq!(round.board().tile_state(9, 7), Some(TileState::Flat));
        assert!(round.piece(3).is_none());
    }

    #[test]
    fn test_added_piece_is_shadowed() {
        let mut round = Replay::new(&duel(), SchedulerConfig::default()).unwrap();
        let rider: Piece = from_ron(
            "(piece_id: 7, kind: Unit, x: 0, y: 11, owner: Some(1), move_distance: 4, \
             min_fire_distance: 1, max_fire_distance: 1, movement: AllTerrain)",
        );
        round.step(0, &ScriptStep::Add(rider)).unwrap();

        assert_eq!(round.board().tile_state(0, 11), Some(TileState::Owned(1)));
        let report = round.finish();
        assert_eq!(report.timeline.last().map(|e| e.pieces.clone()), Some(vec![7]));
    }

    #[test]
    fn test_unknown_piece_is_an_error() {
        let mut round = Replay::new(&duel(), SchedulerConfig::default()).unwrap();
        let err = round.step(4, &ScriptStep::Remove(42)).unwrap_err();
        assert!(matches!(err, ScenarioError::UnknownPiece { step: 4, piece: 42 }));
    }

    #[test]
    fn test_move_through_boulder_is_illegal() {
        let mut round = Replay::new(&duel(), SchedulerConfig::default()).unwrap();
        round
            .step(
                0,
                &ScriptStep::Move {
                    piece: 1,
                    x: 2,
                    y: 5,
                },
            )
            .unwrap();
        round
            .step(
                1,
                &ScriptStep::Move {
                    piece: 1,
                    x: 5,
                    y: 5,
                },
            )
            .unwrap();

        assert_eq!(round.piece(1).map(Piece::tile), Some(Tile::new(2, 5)));
        assert_eq!(round.finish().illegal_moves, 1);
    }
}
