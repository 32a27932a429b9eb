//! Grid pathfinding using the A* algorithm.
//!
//! Paths follow the same rules as move sets: 4-neighbor steps, each
//! costing the mover's traversal cost for the entered tile, with
//! [`Board::can_occupy`] deciding which tiles may be entered. A route is
//! only admissible while its total cost stays within the piece's move
//! budget, so a path exists exactly when the move is legal.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::board::Board;
use crate::geom::Tile;
use crate::piece::Piece;
use crate::terrain::BASE_TRAVERSAL;

/// A node in the A* open set priority queue.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct AStarNode {
    tile: Tile,
    /// g + h, in tenths of a move point.
    f_score: u32,
    g_score: u32,
    /// Tie-breaker for determinism: lower coordinates first.
    tie_breaker: u64,
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse for lowest f first.
        match other.f_score.cmp(&self.f_score) {
            Ordering::Equal => other.tie_breaker.cmp(&self.tie_breaker),
            ord => ord,
        }
    }
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[inline]
fn tie_breaker(tile: Tile) -> u64 {
    (u64::from(tile.y as u32) << 32) | u64::from(tile.x as u32)
}

#[inline]
fn heuristic(from: Tile, to: Tile) -> u32 {
    from.distance(to) * u32::from(BASE_TRAVERSAL)
}

/// Find the cheapest route from `origin` to the tile `piece` stands on.
///
/// The path includes both ends; `origin == piece.tile()` yields a one-tile
/// path. The origin itself is not checked against occupancy. Returns
/// `None` when no route fits within `10 · move_distance`, which callers
/// treat as "cannot move there".
#[must_use]
pub fn compute_path(board: &Board, origin: Tile, piece: &Piece) -> Option<Vec<Tile>> {
    let goal = piece.tile();
    if !board.in_bounds(origin.x, origin.y) || !board.in_bounds(goal.x, goal.y) {
        return None;
    }
    if origin == goal {
        return Some(vec![origin]);
    }

    let max_cost = u32::from(piece.move_distance) * u32::from(BASE_TRAVERSAL);
    if heuristic(origin, goal) > max_cost {
        return None;
    }

    let tiles = (board.width() as usize) * (board.height() as usize);
    let mut g_score = vec![u32::MAX; tiles];
    let mut came_from: Vec<Option<Tile>> = vec![None; tiles];
    let mut open_set = BinaryHeap::new();

    g_score[board.tile_index(origin.x, origin.y)] = 0;
    open_set.push(AStarNode {
        tile: origin,
        f_score: heuristic(origin, goal),
        g_score: 0,
        tie_breaker: tie_breaker(origin),
    });

    while let Some(current) = open_set.pop() {
        if current.tile == goal {
            return Some(reconstruct_path(board, &came_from, goal));
        }
        // Stale entry superseded by a cheaper route.
        if current.g_score > g_score[board.tile_index(current.tile.x, current.tile.y)] {
            continue;
        }

        for next in current.tile.neighbors() {
            if !board.can_occupy(piece, next.x, next.y) {
                continue;
            }
            let step = u32::from(piece.traversal_cost(board.predominant_terrain(next.x, next.y)));
            let tentative_g = current.g_score + step;
            let f_score = tentative_g + heuristic(next, goal);
            if f_score > max_cost {
                continue;
            }

            let idx = board.tile_index(next.x, next.y);
            if tentative_g < g_score[idx] {
                g_score[idx] = tentative_g;
                came_from[idx] = Some(current.tile);
                open_set.push(AStarNode {
                    tile: next,
                    f_score,
                    g_score: tentative_g,
                    tie_breaker: tie_breaker(next),
                });
            }
        }
    }

    tracing::trace!(
        piece = piece.piece_id,
        from = ?origin,
        to = ?goal,
        "No path within move budget"
    );
    None
}

/// Total traversal cost of a path, excluding the starting tile.
#[must_use]
pub fn path_cost(board: &Board, piece: &Piece, path: &[Tile]) -> u32 {
    path.iter()
        .skip(1)
        .map(|t| u32::from(piece.traversal_cost(board.predominant_terrain(t.x, t.y))))
        .sum()
}

fn reconstruct_path(board: &Board, came_from: &[Option<Tile>], goal: Tile) -> Vec<Tile> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(prev) = came_from[board.tile_index(current.x, current.y)] {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}
