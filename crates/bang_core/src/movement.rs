//! Move and attack set computation.
//!
//! Move sets are a budgeted flood fill: a piece starts with
//! `10 · move_distance + 1` tenths of a move point on its own tile and each
//! step into a neighbor spends that neighbor's traversal cost. A tile is
//! (re)expanded only when it is reached with strictly more budget than any
//! earlier visit, so equal-cost loops terminate.
//!
//! The fill runs over an explicit frontier queue. Because a tile is pushed
//! again whenever its budget improves, the fixpoint is the same as the
//! depth-first recursive formulation: every tile ends up holding the best
//! budget over all admissible routes.

use std::collections::VecDeque;

use crate::board::Board;
use crate::geom::{Rect, Tile, TileSet};
use crate::piece::Piece;
use crate::terrain::BASE_TRAVERSAL;

/// Result of [`MoveSetCalculator::compute_moves`].
#[derive(Debug, Clone, Default)]
pub struct MoveSet {
    /// Tiles the piece may end its move on.
    pub moves: TileSet,
    /// Tiles the piece could fire on from its tile or any move tile, if
    /// requested. Minimum fire distance is not applied.
    pub attacks: Option<TileSet>,
    budgets: Vec<u16>,
    width: i32,
}

impl MoveSet {
    /// Remaining budget recorded at `tile`, in tenths of a move point.
    ///
    /// The piece's own tile holds the starting budget; tiles that were
    /// unreachable, or pruned because a piece stands there, hold zero.
    #[must_use]
    pub fn budget_at(&self, tile: Tile) -> u16 {
        if tile.x < 0 || tile.y < 0 || tile.x >= self.width {
            return 0;
        }
        let idx = (tile.y as usize) * (self.width as usize) + (tile.x as usize);
        self.budgets.get(idx).copied().unwrap_or(0)
    }

    /// Whether `tile` is a legal destination.
    #[must_use]
    pub fn can_move_to(&self, tile: Tile) -> bool {
        self.moves.contains_tile(tile)
    }

    /// Whether `tile` is in the attack set.
    #[must_use]
    pub fn can_attack(&self, tile: Tile) -> bool {
        self.attacks.as_ref().is_some_and(|a| a.contains_tile(tile))
    }
}

/// Computes move and attack sets, reusing its scratch buffers between
/// calls.
#[derive(Debug, Default)]
pub struct MoveSetCalculator {
    frontier: VecDeque<Tile>,
    fire: Vec<i16>,
}

impl MoveSetCalculator {
    /// Create a calculator with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute where `piece` may move this turn and, if `want_attacks`,
    /// which tiles it could fire upon after moving.
    ///
    /// A piece may pass through tiles held by its own side but never end
    /// its move on an occupied tile: after the fill, every move tile that
    /// holds a piece is pruned and its budget reset to zero.
    pub fn compute_moves(&mut self, board: &Board, piece: &Piece, want_attacks: bool) -> MoveSet {
        let width = board.width();
        let mut set = MoveSet {
            moves: TileSet::new(),
            attacks: None,
            budgets: vec![0; (width as usize) * (board.height() as usize)],
            width,
        };

        let origin = piece.tile();
        if !board.in_bounds(origin.x, origin.y) {
            tracing::warn!(
                piece = piece.piece_id,
                x = origin.x,
                y = origin.y,
                "Piece is off the board"
            );
            if want_attacks {
                set.attacks = Some(TileSet::new());
            }
            return set;
        }

        let start = u16::from(piece.move_distance) * BASE_TRAVERSAL + 1;
        set.budgets[board.tile_index(origin.x, origin.y)] = start;

        self.frontier.clear();
        self.frontier.push_back(origin);
        while let Some(tile) = self.frontier.pop_front() {
            let remain = set.budgets[board.tile_index(tile.x, tile.y)];
            for next in tile.neighbors() {
                if !board.can_occupy(piece, next.x, next.y) {
                    continue;
                }
                let cost = piece.traversal_cost(board.predominant_terrain(next.x, next.y));
                let Some(premain) = remain.checked_sub(cost) else {
                    continue;
                };
                let idx = board.tile_index(next.x, next.y);
                if premain <= set.budgets[idx] {
                    continue;
                }
                set.budgets[idx] = premain;
                set.moves.insert(next);
                self.frontier.push_back(next);
            }
        }

        set.moves.retain(|tile| {
            let owned = board
                .tile_state(tile.x, tile.y)
                .is_some_and(|state| state.is_owned());
            if owned {
                set.budgets[board.tile_index(tile.x, tile.y)] = 0;
            }
            !owned
        });

        if want_attacks {
            set.attacks = Some(self.fire_from_moves(board, piece, &set));
        }

        tracing::trace!(
            piece = piece.piece_id,
            moves = set.moves.len(),
            attacks = set.attacks.as_ref().map_or(0, TileSet::len),
            "Computed move set"
        );
        set
    }

    /// Multi-source expansion of the fire range from the piece tile and
    /// every move tile.
    ///
    /// Each step spends one unit of fire distance and a tile is stamped by
    /// the first wave to reach it. Sources never become targets.
    fn fire_from_moves(&mut self, board: &Board, piece: &Piece, set: &MoveSet) -> TileSet {
        let mut attacks = TileSet::new();
        let range = i16::from(piece.max_fire_distance);
        if range == 0 {
            return attacks;
        }

        let playable = board.playable_area();
        self.fire.clear();
        self.fire.resize(set.budgets.len(), 0);
        self.frontier.clear();

        let sources = std::iter::once(piece.tile()).chain(set.moves.iter());
        for source in sources {
            self.fire[board.tile_index(source.x, source.y)] = range;
            self.frontier.push_back(source);
        }

        while let Some(tile) = self.frontier.pop_front() {
            let remain = self.fire[board.tile_index(tile.x, tile.y)];
            if remain <= 0 {
                continue;
            }
            for next in tile.neighbors() {
                if !playable.contains(next.x, next.y) {
                    continue;
                }
                let idx = board.tile_index(next.x, next.y);
                if self.fire[idx] != 0 || set.budgets[idx] != 0 {
                    continue;
                }
                // Stamp with at least -1 so exhausted tiles still count as
                // visited.
                self.fire[idx] = if remain > 1 { remain - 1 } else { -1 };
                attacks.insert(next);
                self.frontier.push_back(next);
            }
        }
        attacks
    }
}

/// Shorthand for a one-off [`MoveSetCalculator::compute_moves`].
#[must_use]
pub fn compute_moves(board: &Board, piece: &Piece, want_attacks: bool) -> MoveSet {
    MoveSetCalculator::new().compute_moves(board, piece, want_attacks)
}

/// Every tile whose Manhattan distance from `(x, y)` lies in
/// `min_distance..=max_distance`, clipped to the playable area.
///
/// Distance zero is the center tile itself.
#[must_use]
pub fn compute_attacks(
    board: &Board,
    min_distance: i32,
    max_distance: i32,
    x: i32,
    y: i32,
) -> TileSet {
    let mut attacks = TileSet::new();
    let playable: &Rect = board.playable_area();
    let near = i64::from(min_distance.max(0));
    let far = i64::from(max_distance);
    if playable.is_empty() || far < near {
        return attacks;
    }

    // Sweep the columns the diamond shares with the playable area; each
    // column holds up to two runs of tiles inside the band. Coordinates are
    // widened so centers far off the board cannot overflow.
    let (cx, cy) = (i64::from(x), i64::from(y));
    let (left, top) = (i64::from(playable.x), i64::from(playable.y));
    let (right, bottom) = (i64::from(playable.right()) - 1, i64::from(playable.bottom()) - 1);
    for tx in (cx - far).max(left)..=(cx + far).min(right) {
        let dx = (tx - cx).abs();
        let outer = far - dx;
        let inner = (near - dx).max(0);
        let above = (cy - outer).max(top)..=(cy - inner).min(bottom);
        let below = (cy + inner.max(1)).max(top)..=(cy + outer).min(bottom);
        for ty in above.chain(below) {
            attacks.insert(Tile::new(tx as i32, ty as i32));
        }
    }
    attacks
}
