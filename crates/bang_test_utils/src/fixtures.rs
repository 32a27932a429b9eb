//! Test fixtures and helpers.
//!
//! Pre-built boards, pieces and schedulers for consistent testing.

use bang_core::board::{Board, HEIGHTFIELD_SUBDIVISIONS};
use bang_core::clock::ManualClock;
use bang_core::config::SchedulerConfig;
use bang_core::piece::Piece;
use bang_core::terrain::Terrain;
use serde::de::DeserializeOwned;

/// Id of the moving piece in the field fixtures.
pub const HERO: u32 = 1;

/// Id of the enemy piece in [`blocked_field`].
pub const BANDIT: u32 = 2;

/// A flat dirt board with no border and nothing on it.
///
/// # Panics
///
/// Panics if the dimensions are not positive.
#[must_use]
pub fn flat_board(width: i32, height: i32) -> Board {
    Board::with_size(width, height).expect("fixture board dimensions")
}

/// A flat board with `pieces` shadowed onto it.
#[must_use]
pub fn board_with(width: i32, height: i32, pieces: &[Piece]) -> Board {
    let mut board = flat_board(width, height);
    board.shadow_pieces(pieces);
    board
}

/// A flat board with tile column `x` painted with `terrain`.
///
/// # Panics
///
/// Panics if `x` is not a column of the board.
#[must_use]
pub fn striped_board(width: i32, height: i32, x: i32, terrain: Terrain) -> Board {
    let mut board = flat_board(width, height);
    let left = x * HEIGHTFIELD_SUBDIVISIONS;
    for vy in 0..board.heightfield_height() {
        for vx in left..=left + HEIGHTFIELD_SUBDIVISIONS {
            board
                .set_terrain(vx, vy, terrain)
                .expect("stripe column inside the board");
        }
    }
    board.update_predominant_terrain();
    board
}

/// Player 0's piece at (5,5) with a move distance of two on an empty
/// 10x10 board.
#[must_use]
pub fn open_field() -> (Board, Piece) {
    let hero = Piece::unit(HERO, 0, 5, 5).with_move_distance(2);
    let board = board_with(10, 10, &[hero.clone()]);
    (board, hero)
}

/// [`open_field`] with a player 1 piece standing east of the hero.
#[must_use]
pub fn blocked_field() -> (Board, Piece, Piece) {
    let hero = Piece::unit(HERO, 0, 5, 5).with_move_distance(2);
    let bandit = Piece::unit(BANDIT, 1, 6, 5);
    let board = board_with(10, 10, &[hero.clone(), bandit.clone()]);
    (board, hero, bandit)
}

/// A scheduler on a manual clock, with the clock handle.
#[must_use]
pub fn manual_scheduler<C>() -> (bang_core::actions::ActionScheduler<C>, ManualClock) {
    let clock = ManualClock::new();
    let scheduler = bang_core::actions::ActionScheduler::with_clock(
        SchedulerConfig::default(),
        clock.clone(),
    );
    (scheduler, clock)
}

/// Parse a RON fixture.
///
/// # Panics
///
/// Panics with the parse error if the fixture is malformed.
#[must_use]
pub fn from_ron<T: DeserializeOwned>(source: &str) -> T {
    match ron::from_str(source) {
        Ok(value) => value,
        Err(e) => panic!("bad RON fixture: {e}"),
    }
}
