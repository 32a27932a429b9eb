//! Property-based tests for occupancy, move sets and the action scheduler.

use std::collections::BTreeSet;

use bang_core::prelude::*;
use bang_test_utils::determinism::{move_set_hash, strategies::*};
use bang_test_utils::fixtures::{board_with, manual_scheduler};
use proptest::prelude::*;

const SIZE: i32 = 10;

// =============================================================================
// Occupancy
// =============================================================================

proptest! {
    #[test]
    fn prop_occupancy_reflects_pieces(pieces in arb_pieces(10, SIZE, SIZE)) {
        let board = board_with(SIZE, SIZE, &pieces);

        for tile in Rect::new(0, 0, SIZE, SIZE).tiles() {
            let covering: Vec<&Piece> = pieces
                .iter()
                .filter(|p| p.footprint().contains(tile.x, tile.y))
                .collect();
            let state = board.tile_state(tile.x, tile.y);
            let terrain = board.terrain_state(tile.x, tile.y);

            if covering.is_empty() {
                prop_assert_eq!(state, Some(terrain));
                prop_assert_eq!(board.base_tile_state(tile.x, tile.y), Some(terrain));
            } else if covering.iter().any(|p| matches!(p.kind, PieceKind::Prop { .. })) {
                prop_assert_eq!(board.base_tile_state(tile.x, tile.y), Some(TileState::Prop));
            } else if let [unit] = covering.as_slice() {
                prop_assert_eq!(state, unit.owner.map(TileState::Owned));
            }
        }
    }
}

// =============================================================================
// Attack Rings
// =============================================================================

proptest! {
    #[test]
    fn prop_attack_ring_is_exact_band(
        center in arb_tile(SIZE, SIZE),
        min in 0i32..4,
        extra in 0i32..4,
    ) {
        let board = board_with(SIZE, SIZE, &[]);
        let max = min + extra;
        let attacks = compute_attacks(&board, min, max, center.x, center.y);

        for tile in Rect::new(0, 0, SIZE, SIZE).tiles() {
            let d = tile.distance(center);
            let in_band = (min as u32..=max as u32).contains(&d);
            prop_assert_eq!(attacks.contains_tile(tile), in_band, "{:?} at {}", tile, d);
        }
    }
}

// =============================================================================
// Move Sets
// =============================================================================

proptest! {
    #[test]
    fn prop_moves_are_idempotent_and_never_land_on_pieces(
        pieces in arb_pieces(12, SIZE, SIZE),
        mover in arb_unit(99, SIZE, SIZE),
    ) {
        let mut all = pieces;
        all.push(mover.clone());
        let board = board_with(SIZE, SIZE, &all);

        let first = compute_moves(&board, &mover, true);
        let mut calculator = MoveSetCalculator::new();
        let second = calculator.compute_moves(&board, &mover, true);
        let third = calculator.compute_moves(&board, &mover, true);
        prop_assert_eq!(move_set_hash(&first), move_set_hash(&second));
        prop_assert_eq!(&second.moves, &third.moves);

        for tile in first.moves.iter() {
            let state = board.tile_state(tile.x, tile.y);
            prop_assert!(!state.is_some_and(|s| s.is_owned()), "landed on {:?}", tile);
            prop_assert!(board.can_occupy(&mover, tile.x, tile.y));
        }
    }

    #[test]
    fn prop_budgets_are_a_fixpoint(
        pieces in arb_pieces(12, SIZE, SIZE),
        mover in arb_unit(99, SIZE, SIZE),
    ) {
        let mut all = pieces;
        all.push(mover.clone());
        let board = board_with(SIZE, SIZE, &all);
        let set = compute_moves(&board, &mover, false);
        let start = set.budget_at(mover.tile());

        for tile in set.moves.iter() {
            let budget = set.budget_at(tile);
            prop_assert!(budget > 0 && budget < start);
            let cost = mover.traversal_cost(board.predominant_terrain(tile.x, tile.y));
            for from in tile.neighbors() {
                let prior = set.budget_at(from);
                if prior > cost {
                    prop_assert!(
                        budget >= prior - cost,
                        "{:?} holds {} but {:?} offers {}", tile, budget, from, prior - cost
                    );
                }
            }
        }
    }

    #[test]
    fn prop_paths_exist_exactly_for_moves(mover in arb_unit(1, 8, 8)) {
        let board = board_with(8, 8, &[mover.clone()]);
        let set = compute_moves(&board, &mover, false);

        for tile in Rect::new(0, 0, 8, 8).tiles() {
            if tile == mover.tile() {
                continue;
            }
            let path = compute_path(&board, mover.tile(), &mover.clone().at(tile.x, tile.y));
            prop_assert_eq!(path.is_some(), set.can_move_to(tile), "{:?}", tile);
        }
    }
}

// =============================================================================
// Scheduler
// =============================================================================

/// What the scripted actions saw while running.
#[derive(Default)]
struct Stage {
    active: Vec<(ActionId, Vec<PieceId>, Option<Rect>)>,
    parked: Vec<CompletionToken>,
    violations: Vec<String>,
}

impl Stage {
    fn release_oldest(&mut self) {
        if self.parked.is_empty() {
            return;
        }
        let token = self.parked.remove(0);
        let id = token.action_id();
        self.active.retain(|(active, ..)| *active != id);
        token.complete();
    }
}

fn scripted(spec: &ActionSpec) -> BoardAction<Stage> {
    let pieces = spec.pieces.clone();
    let bounds = spec.bounds;
    let holds = spec.holds;
    let action = BoardAction::from_fn(move |stage: &mut Stage, token: CompletionToken| {
        let id = token.action_id();
        let mine: BTreeSet<PieceId> = pieces.iter().copied().filter(|&p| p > 0).collect();
        for (other, their_pieces, their_bounds) in &stage.active {
            if their_pieces.iter().any(|p| mine.contains(p)) {
                stage.violations.push(format!("{id} shares a piece with {other}"));
            }
            if let (Some(a), Some(b)) = (bounds, their_bounds) {
                if a.intersects(b) {
                    stage.violations.push(format!("{id} overlaps {other}"));
                }
            }
        }
        if holds {
            stage.active.push((id, mine.into_iter().collect(), bounds));
            stage.parked.push(token);
            Ok(Execution::Waiting)
        } else {
            Ok(Execution::Completed)
        }
    })
    .affecting(spec.pieces.iter().copied())
    .waiting_on(spec.waiters.iter().copied());
    match spec.bounds {
        Some(bounds) => action.with_bounds(bounds),
        None => action,
    }
}

proptest! {
    #[test]
    fn prop_scheduler_mutual_exclusion_and_drain(
        script in arb_action_script(24),
        releases in proptest::collection::vec(any::<bool>(), 24),
    ) {
        let (mut scheduler, _clock) = manual_scheduler::<Stage>();
        let mut stage = Stage::default();

        for (spec, release) in script.iter().zip(releases.iter().cycle()) {
            scheduler.execute_action(scripted(spec));
            scheduler.pump(&mut stage);
            if *release {
                stage.release_oldest();
                scheduler.pump(&mut stage);
            }
        }

        while !stage.parked.is_empty() {
            stage.release_oldest();
            scheduler.pump(&mut stage);
        }

        prop_assert!(stage.violations.is_empty(), "{:?}", stage.violations);
        prop_assert!(scheduler.is_idle());
        let stats = *scheduler.stats();
        prop_assert_eq!(stats.submitted, script.len() as u64);
        prop_assert_eq!(stats.completed, stats.submitted);
        prop_assert_eq!(stats.recompleted, 0);
    }

    #[test]
    fn prop_disjoint_actions_never_wait(count in 1usize..20) {
        let (mut scheduler, _clock) = manual_scheduler::<Stage>();
        let mut stage = Stage::default();

        let ids: Vec<ActionId> = (1..=count as u32)
            .map(|piece| {
                let spec = ActionSpec {
                    pieces: vec![piece],
                    waiters: Vec::new(),
                    bounds: None,
                    holds: true,
                };
                scheduler.execute_action(scripted(&spec))
            })
            .collect();
        scheduler.pump(&mut stage);

        prop_assert_eq!(scheduler.stats().queued, 0);
        prop_assert_eq!(scheduler.executing_len(), count);
        prop_assert!(ids.iter().all(|&id| scheduler.is_executing(id)));
        prop_assert_eq!(stage.parked.len(), count);
    }

    #[test]
    fn prop_completion_releases_dependents_first(blockers in 1u32..6) {
        let (mut scheduler, _clock) = manual_scheduler::<Stage>();
        let mut stage = Stage::default();
        let hold = |piece: PieceId| ActionSpec {
            pieces: vec![piece],
            waiters: Vec::new(),
            bounds: None,
            holds: true,
        };

        // One running action per piece, then a follower queued behind each.
        let running: Vec<ActionId> = (1..=blockers)
            .map(|p| scheduler.execute_action(scripted(&hold(p))))
            .collect();
        let followers: Vec<ActionId> = (1..=blockers)
            .map(|p| scheduler.execute_action(scripted(&hold(p))))
            .collect();
        scheduler.pump(&mut stage);

        scheduler.action_completed(running[0]).unwrap();
        prop_assert!(scheduler.is_executing(followers[0]));
        for &other in &followers[1..] {
            prop_assert!(scheduler.is_queued(other));
        }
    }
}

#[test]
fn test_panicking_payload_releases_its_piece() {
    let (mut scheduler, _clock) = manual_scheduler::<Vec<&'static str>>();
    let mut log = Vec::new();

    scheduler.execute_action(
        BoardAction::from_fn(|_: &mut Vec<&'static str>, _| panic!("bad frame")).affecting([7]),
    );
    scheduler.execute_action(
        BoardAction::from_fn(|log: &mut Vec<&'static str>, _| {
            log.push("after");
            Ok(Execution::Completed)
        })
        .affecting([7]),
    );
    scheduler.pump(&mut log);

    assert_eq!(log, vec!["after"]);
    assert!(scheduler.is_idle());
}
