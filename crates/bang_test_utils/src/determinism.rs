//! Determinism testing utilities.
//!
//! Boards are generated from seeds on every client and move sets are
//! recomputed locally, so both must come out identical given identical
//! inputs. Sources of non-determinism to watch for:
//!
//! - **Floating-point math**: environment parameters use
//!   [`bang_core::math::Fixed`] throughout.
//! - **Hash iteration order**: tile sets and scheduler state use ordered
//!   collections.
//! - **System randomness**: all "random" behaviour goes through a seeded
//!   [`bang_core::rng::BoardRng`].

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use bang_core::board::Board;
use bang_core::movement::MoveSet;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic run).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Board is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a setup-then-step process multiple times and compare final hashes.
///
/// # Example
///
/// ```ignore
/// use bang_test_utils::determinism::{board_hash, verify_determinism};
///
/// let result = verify_determinism(
///     3,
///     10,
///     || generate_board(&config).unwrap(),
///     |board| board.shadow_pieces(&pieces),
///     board_hash,
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Compute a hash for any hashable value.
#[must_use]
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Hash everything observable about a board: heights, terrain, water and
/// occupancy.
#[must_use]
pub fn board_hash(board: &Board) -> u64 {
    let mut hasher = DefaultHasher::new();
    board.width().hash(&mut hasher);
    board.height().hash(&mut hasher);
    board.heightfield().hash(&mut hasher);
    for y in 0..board.heightfield_height() {
        for x in 0..board.heightfield_width() {
            board.terrain_at(x, y).hash(&mut hasher);
        }
    }
    board.water_level().hash(&mut hasher);
    board.render_occupancy(None).hash(&mut hasher);
    hasher.finish()
}

/// Hash a move set: reachable tiles with their budgets, and attacks.
#[must_use]
pub fn move_set_hash(set: &MoveSet) -> u64 {
    let mut hasher = DefaultHasher::new();
    for tile in set.moves.iter() {
        tile.hash(&mut hasher);
        set.budget_at(tile).hash(&mut hasher);
    }
    if let Some(attacks) = &set.attacks {
        for tile in attacks.iter() {
            tile.hash(&mut hasher);
        }
    }
    hasher.finish()
}

/// Proptest strategies for boards, pieces and scheduler scripts.
pub mod strategies {
    use bang_core::geom::{Rect, Tile};
    use bang_core::piece::{Piece, PieceId, PlayerIndex};
    use bang_core::terrain::MovementClass;
    use proptest::prelude::*;

    /// A tile on a `width` x `height` board.
    pub fn arb_tile(width: i32, height: i32) -> impl Strategy<Value = Tile> {
        (0..width, 0..height).prop_map(|(x, y)| Tile::new(x, y))
    }

    /// A movement class.
    pub fn arb_movement() -> impl Strategy<Value = MovementClass> {
        prop_oneof![
            4 => Just(MovementClass::Ground),
            1 => Just(MovementClass::AllTerrain),
            1 => Just(MovementClass::Flyer),
        ]
    }

    /// A unit owned by one of two players somewhere on the board.
    pub fn arb_unit(
        piece_id: PieceId,
        width: i32,
        height: i32,
    ) -> impl Strategy<Value = Piece> {
        (
            arb_tile(width, height),
            0..2 as PlayerIndex,
            0u8..6,
            0u8..3,
            0u8..4,
            arb_movement(),
        )
            .prop_map(move |(tile, owner, moves, min_fire, extra_fire, movement)| {
                Piece::unit(piece_id, owner, tile.x, tile.y)
                    .with_move_distance(moves)
                    .with_fire_distance(min_fire, min_fire + extra_fire)
                    .with_movement(movement)
            })
    }

    /// Up to `max` units and small props with ids starting at 1.
    pub fn arb_pieces(max: usize, width: i32, height: i32) -> impl Strategy<Value = Vec<Piece>> {
        proptest::collection::vec(
            prop_oneof![
                4 => arb_tile(width, height).prop_map(|t| (t, None)),
                1 => (arb_tile(width, height), 1i32..3, 1i32..3)
                    .prop_map(|(t, w, h)| (t, Some((w, h)))),
            ],
            0..max,
        )
        .prop_flat_map(move |shapes| {
            let count = shapes.len();
            (Just(shapes), proptest::collection::vec(0..2 as PlayerIndex, count))
        })
        .prop_map(|(shapes, owners)| {
            shapes
                .into_iter()
                .zip(owners)
                .zip(1..)
                .map(|(((tile, prop), owner), id)| match prop {
                    Some((w, h)) => Piece::prop(id, tile.x, tile.y, w, h),
                    None => Piece::unit(id, owner, tile.x, tile.y),
                })
                .collect()
        })
    }

    /// A small rectangle inside a `size` x `size` area.
    pub fn arb_rect(size: i32) -> impl Strategy<Value = Rect> {
        (0..size, 0..size, 1i32..4, 1i32..4).prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
    }

    /// Resources one scripted action reserves.
    #[derive(Debug, Clone)]
    pub struct ActionSpec {
        /// Affected piece ids.
        pub pieces: Vec<PieceId>,
        /// Piece ids waited on.
        pub waiters: Vec<PieceId>,
        /// Reserved tiles.
        pub bounds: Option<Rect>,
        /// Whether the action keeps running after `execute`.
        pub holds: bool,
    }

    /// An action over a small id space, so conflicts are common.
    pub fn arb_action_spec() -> impl Strategy<Value = ActionSpec> {
        (
            proptest::collection::vec(0u32..6, 0..3),
            proptest::collection::vec(0u32..6, 0..2),
            proptest::option::weighted(0.4, arb_rect(8)),
            proptest::bool::weighted(0.6),
        )
            .prop_map(|(pieces, waiters, bounds, holds)| ActionSpec {
                pieces,
                waiters,
                bounds,
                holds,
            })
    }

    /// A script of actions to submit in order.
    pub fn arb_action_script(max_len: usize) -> impl Strategy<Value = Vec<ActionSpec>> {
        proptest::collection::vec(arb_action_spec(), 1..max_len)
    }
}
