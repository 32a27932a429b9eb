//! Per-tile occupancy ("shadow") state.
//!
//! Three grids are kept per tile:
//!
//! - the current state, terrain class or the owner of the piece on it;
//! - the base state, terrain class with props and blocking track baked in,
//!   restored when a piece leaves the tile;
//! - the piece elevation, in tiles, contributed by props and track.
//!
//! [`Board::shadow_pieces`] rebuilds all of it once at round start; every
//! later change is incremental through [`Board::shadow_piece`] and
//! [`Board::clear_shadow`] so a move costs O(1), not O(tiles).

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::geom::{Tile, TileSet};
use crate::piece::{Piece, PieceKind, PlayerIndex};
use crate::rng::BoardRng;

/// Elevation, in tiles, of props and ground-blocking track.
const PROP_ELEVATION: u8 = 2;

/// What currently occupies a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileState {
    /// Flat and traversable.
    #[default]
    Flat,
    /// Too steep for ordinary ground units.
    Rough,
    /// Under deep water; only flyers may enter.
    Impassable,
    /// Under a prop, a train or a neutral piece.
    Prop,
    /// Holding a piece owned by this player.
    Owned(PlayerIndex),
}

impl TileState {
    /// Whether a player's piece sits on the tile.
    #[must_use]
    pub const fn is_owned(self) -> bool {
        matches!(self, Self::Owned(_))
    }

    /// Glyph used by [`Board::render_occupancy`].
    #[must_use]
    pub fn glyph(self) -> char {
        match self {
            Self::Flat => '.',
            Self::Rough => '%',
            Self::Impassable => '~',
            Self::Prop => '#',
            Self::Owned(player) => char::from_digit(u32::from(player % 10), 10).unwrap_or('?'),
        }
    }
}

/// Occupancy grids, row-major, one entry per tile.
#[derive(Debug, Clone)]
pub(crate) struct Occupancy {
    pub(crate) tstate: Vec<TileState>,
    pub(crate) btstate: Vec<TileState>,
    pub(crate) estate: Vec<u8>,
}

impl Occupancy {
    pub(crate) fn new(tiles: usize) -> Self {
        Self {
            tstate: vec![TileState::Flat; tiles],
            btstate: vec![TileState::Flat; tiles],
            estate: vec![0; tiles],
        }
    }
}

impl Board {
    /// Terrain-derived class of a tile, ignoring pieces.
    #[must_use]
    pub fn terrain_state(&self, x: i32, y: i32) -> TileState {
        if self.is_under_deep_water(x, y) {
            TileState::Impassable
        } else if self.exceeds_max_height_delta(x, y) {
            TileState::Rough
        } else {
            TileState::Flat
        }
    }

    /// Reset occupancy to the terrain-derived base state, then shadow
    /// every supplied piece. Called once at round start.
    pub fn shadow_pieces<'a>(&mut self, pieces: impl IntoIterator<Item = &'a Piece>) {
        for y in 0..self.height() {
            for x in 0..self.width() {
                let state = self.terrain_state(x, y);
                let idx = self.tile_index(x, y);
                self.occupancy.tstate[idx] = state;
                self.occupancy.btstate[idx] = state;
                self.occupancy.estate[idx] = 0;
            }
        }

        let mut count = 0usize;
        for piece in pieces {
            self.shadow_piece(piece);
            count += 1;
        }
        tracing::debug!(board = %self, pieces = count, "Shadowed pieces");
    }

    /// Mark the tiles covered by `piece` as occupied.
    pub fn shadow_piece(&mut self, piece: &Piece) {
        if let PieceKind::Prop { .. } = piece.kind {
            let covered = piece.footprint().intersection(self.playable_area());
            for tile in covered.tiles() {
                let idx = self.tile_index(tile.x, tile.y);
                self.occupancy.tstate[idx] = TileState::Prop;
                self.occupancy.btstate[idx] = TileState::Prop;
                self.occupancy.estate[idx] = PROP_ELEVATION;
            }
            return;
        }

        if !self.playable_area().contains(piece.x, piece.y) {
            return;
        }

        let idx = self.tile_index(piece.x, piece.y);
        match (piece.kind, piece.owner) {
            (PieceKind::Track { blocks_ground }, _) => {
                if blocks_ground {
                    self.occupancy.tstate[idx] = TileState::Prop;
                    self.occupancy.btstate[idx] = TileState::Prop;
                    self.occupancy.estate[idx] = PROP_ELEVATION;
                }
            }
            (PieceKind::Bonus, _) => self.occupancy.tstate[idx] = TileState::Flat,
            (PieceKind::Train, _) | (_, None) => self.occupancy.tstate[idx] = TileState::Prop,
            (_, Some(owner)) => self.occupancy.tstate[idx] = TileState::Owned(owner),
        }
    }

    /// Restore the piece's tile to its base state.
    pub fn clear_shadow(&mut self, piece: &Piece) {
        if self.in_bounds(piece.x, piece.y) {
            let idx = self.tile_index(piece.x, piece.y);
            self.occupancy.tstate[idx] = self.occupancy.btstate[idx];
        }
    }

    /// Current state of a tile, `None` off the board.
    #[must_use]
    pub fn tile_state(&self, x: i32, y: i32) -> Option<TileState> {
        self.in_bounds(x, y)
            .then(|| self.occupancy.tstate[self.tile_index(x, y)])
    }

    /// Base state of a tile (terrain plus props), `None` off the board.
    #[must_use]
    pub fn base_tile_state(&self, x: i32, y: i32) -> Option<TileState> {
        self.in_bounds(x, y)
            .then(|| self.occupancy.btstate[self.tile_index(x, y)])
    }

    /// Whether `piece` may enter the tile.
    ///
    /// Flyers and trains go anywhere in the playable area. Ground pieces
    /// need a flat tile, or a tile held by their own side that is flat
    /// underneath, which lets them pass through friendly units mid-move.
    /// All-terrain pieces may also cross rough tiles.
    #[must_use]
    pub fn can_occupy(&self, piece: &Piece, x: i32, y: i32) -> bool {
        if !self.playable_area().contains(x, y) {
            return false;
        }
        if piece.ignores_occupancy() {
            return true;
        }
        let idx = self.tile_index(x, y);
        let tstate = self.occupancy.tstate[idx];
        let btstate = self.occupancy.btstate[idx];
        let rough_ok = piece.movement.allows_rough();
        let passable = |state: TileState| {
            state == TileState::Flat || (rough_ok && state == TileState::Rough)
        };
        match tstate {
            TileState::Owned(owner) => piece.owner == Some(owner) && passable(btstate),
            state => passable(state),
        }
    }

    /// Whether the tile is traversable and holds no piece at all.
    #[must_use]
    pub fn is_occupiable(&self, x: i32, y: i32) -> bool {
        self.playable_area().contains(x, y)
            && self.occupancy.tstate[self.tile_index(x, y)] == TileState::Flat
    }

    /// Whether ground units could stand on the tile if it were empty.
    #[must_use]
    pub fn is_ground_occupiable(&self, x: i32, y: i32, allow_rough: bool) -> bool {
        if !self.playable_area().contains(x, y) {
            return false;
        }
        match self.occupancy.btstate[self.tile_index(x, y)] {
            TileState::Flat => true,
            TileState::Rough => allow_rough,
            _ => false,
        }
    }

    /// Whether the tile lies under a prop.
    #[must_use]
    pub fn is_under_prop(&self, x: i32, y: i32) -> bool {
        self.playable_area().contains(x, y)
            && self.occupancy.tstate[self.tile_index(x, y)] == TileState::Prop
    }

    /// Up to `count` occupiable tiles near `center` for spawning pieces.
    ///
    /// Square frames at distance 1, 2, ... `max_dist` are searched in turn;
    /// within a frame the order is shuffled by `rng`. May return fewer
    /// than `count` tiles.
    pub fn occupiable_spots(
        &self,
        count: usize,
        center: Tile,
        max_dist: i32,
        rng: &mut BoardRng,
    ) -> Vec<Tile> {
        let mut spots = Vec::with_capacity(count);
        if count == 0 {
            return spots;
        }
        let playable = *self.playable_area();
        // Only frames between the nearest and farthest playable tile can
        // hold anything.
        let span = |c: i32, lo: i32, hi: i32| {
            let (c, lo, hi) = (i64::from(c), i64::from(lo), i64::from(hi));
            ((lo - c).max(c - hi).max(0), (c - lo).abs().max((c - hi).abs()))
        };
        let (near_x, far_x) = span(center.x, playable.x, playable.right() - 1);
        let (near_y, far_y) = span(center.y, playable.y, playable.bottom() - 1);
        let first = near_x.max(near_y).max(1);
        let last = far_x.max(far_y).min(i64::from(max_dist));

        let mut frame = TileSet::new();
        for dist in first..=last {
            frame.clear();
            // dist <= max_dist, so it fits.
            frame.add_frame(center, dist as i32, &playable);
            let mut candidates: Vec<Tile> = frame.iter().collect();
            rng.shuffle(&mut candidates);
            for tile in candidates {
                if self.is_occupiable(tile.x, tile.y) {
                    spots.push(tile);
                    if spots.len() == count {
                        return spots;
                    }
                }
            }
        }
        spots
    }

    /// A single occupiable tile near `center`, if any.
    pub fn occupiable_spot(&self, center: Tile, max_dist: i32, rng: &mut BoardRng) -> Option<Tile> {
        self.occupiable_spots(1, center, max_dist, rng).pop()
    }

    /// Render the occupancy grid as text, top row first, marking `moves`.
    #[must_use]
    pub fn render_occupancy(&self, moves: Option<&TileSet>) -> String {
        let mut out = String::new();
        for y in (0..self.height()).rev() {
            let _ = write!(out, "{y:>2}:");
            for x in 0..self.width() {
                let glyph = if moves.is_some_and(|m| m.contains(x, y)) {
                    '+'
                } else {
                    self.occupancy.tstate[self.tile_index(x, y)].glyph()
                };
                out.push(' ');
                out.push(glyph);
            }
            out.push('\n');
        }
        let footer: [fn(i32) -> char; 3] = [
            |_| '-',
            |x| digit(x / 10),
            digit,
        ];
        for row in footer {
            out.push_str("   ");
            for x in 0..self.width() {
                out.push(' ');
                out.push(row(x));
            }
            out.push('\n');
        }
        out
    }
}

fn digit(value: i32) -> char {
    char::from_digit(value.unsigned_abs() % 10, 10).unwrap_or('?')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoardConfig;
    use crate::terrain::MovementClass;

    fn board(width: i32, height: i32) -> Board {
        let mut board = Board::with_size(width, height).unwrap();
        board.shadow_pieces(std::iter::empty());
        board
    }

    #[test]
    fn test_terrain_states() {
        let mut board = Board::with_size(4, 4).unwrap();
        board.set_water_level(0);
        board.set_height(0, 0, -5).unwrap(); // deep water under tile (0, 0)
        board.set_height(10, 10, 40).unwrap(); // steep spike under tile (2, 2)
        board.shadow_pieces(std::iter::empty());

        assert_eq!(board.tile_state(0, 0), Some(TileState::Impassable));
        assert_eq!(board.tile_state(2, 2), Some(TileState::Rough));
        assert_eq!(board.tile_state(3, 0), Some(TileState::Flat));
        assert_eq!(board.tile_state(4, 0), None);
    }

    #[test]
    fn test_shadow_and_clear_unit() {
        let mut board = board(5, 5);
        let unit = Piece::unit(1, 2, 3, 3);
        board.shadow_piece(&unit);
        assert_eq!(board.tile_state(3, 3), Some(TileState::Owned(2)));
        assert!(!board.is_occupiable(3, 3));

        board.clear_shadow(&unit);
        assert_eq!(board.tile_state(3, 3), Some(TileState::Flat));
        assert!(board.is_occupiable(3, 3));
    }

    #[test]
    fn test_prop_footprint_is_permanent() {
        let mut board = board(6, 6);
        let prop = Piece::prop(5, 1, 1, 2, 2);
        board.shadow_piece(&prop);
        for tile in prop.footprint().tiles() {
            assert!(board.is_under_prop(tile.x, tile.y));
            assert_eq!(board.piece_elevation(tile.x, tile.y), 128);
        }
        board.clear_shadow(&prop);
        assert!(board.is_under_prop(1, 1));
        assert!(!board.is_ground_occupiable(1, 1, true));
    }

    #[test]
    fn test_special_pieces() {
        let mut board = board(6, 6);
        board.shadow_pieces(&[
            Piece::neutral(1, PieceKind::Track { blocks_ground: true }, 0, 0),
            Piece::neutral(2, PieceKind::Track { blocks_ground: false }, 1, 0),
            Piece::neutral(3, PieceKind::Bonus, 2, 0),
            Piece::neutral(4, PieceKind::Train, 3, 0),
            Piece::neutral(5, PieceKind::Unit, 4, 0),
        ]);
        assert_eq!(board.tile_state(0, 0), Some(TileState::Prop));
        assert_eq!(board.piece_elevation(0, 0), 128);
        assert_eq!(board.tile_state(1, 0), Some(TileState::Flat));
        assert_eq!(board.tile_state(2, 0), Some(TileState::Flat));
        assert_eq!(board.tile_state(3, 0), Some(TileState::Prop));
        assert_eq!(board.tile_state(4, 0), Some(TileState::Prop));
        // Train passes leave the base state untouched.
        assert_eq!(board.base_tile_state(3, 0), Some(TileState::Flat));
    }

    #[test]
    fn test_pieces_outside_playable_area_are_ignored() {
        let mut board = Board::new(BoardConfig::new(10, 10).with_border(2)).unwrap();
        board.shadow_pieces(&[Piece::unit(1, 0, 1, 1), Piece::unit(2, 0, 2, 2)]);
        assert_eq!(board.tile_state(1, 1), Some(TileState::Flat));
        assert_eq!(board.tile_state(2, 2), Some(TileState::Owned(0)));
        assert!(!board.is_occupiable(1, 1));
        assert!(board.is_occupiable(3, 3));
    }

    #[test]
    fn test_can_occupy_policy() {
        let mut board = Board::with_size(6, 6).unwrap();
        board.set_height(21, 1, 60).unwrap(); // rough tile (5, 0)
        board.shadow_pieces(&[
            Piece::unit(1, 0, 1, 1),
            Piece::unit(2, 1, 2, 2),
            Piece::prop(3, 4, 4, 1, 1),
        ]);

        let walker = Piece::unit(10, 0, 0, 0);
        let rider = Piece::unit(11, 0, 0, 0).with_movement(MovementClass::AllTerrain);
        let bird = Piece::unit(12, 1, 0, 0).with_movement(MovementClass::Flyer);

        assert!(board.can_occupy(&walker, 0, 1));
        // Friendly tile: pass-through allowed.
        assert!(board.can_occupy(&walker, 1, 1));
        // Enemy tile: blocked.
        assert!(!board.can_occupy(&walker, 2, 2));
        assert!(!board.can_occupy(&walker, 4, 4));
        assert!(!board.can_occupy(&walker, 5, 0));
        assert!(board.can_occupy(&rider, 5, 0));
        assert!(!board.can_occupy(&rider, 4, 4));
        assert!(board.can_occupy(&bird, 4, 4));
        assert!(board.can_occupy(&bird, 1, 1));
        assert!(!board.can_occupy(&bird, 6, 0));
    }

    #[test]
    fn test_is_ground_occupiable() {
        let mut board = Board::with_size(6, 6).unwrap();
        board.set_height(21, 1, 60).unwrap();
        board.shadow_pieces(&[Piece::unit(1, 0, 1, 1)]);
        assert!(board.is_ground_occupiable(1, 1, false));
        assert!(!board.is_ground_occupiable(5, 0, false));
        assert!(board.is_ground_occupiable(5, 0, true));
    }

    #[test]
    fn test_occupiable_spots() {
        let mut board = board(9, 9);
        board.shadow_piece(&Piece::unit(1, 0, 5, 4));
        let mut rng = BoardRng::new(9);
        let center = Tile::new(4, 4);

        let spots = board.occupiable_spots(3, center, 2, &mut rng);
        assert_eq!(spots.len(), 3);
        for spot in &spots {
            assert_ne!(*spot, Tile::new(5, 4));
            assert!(board.is_occupiable(spot.x, spot.y));
            assert!((spot.x - 4).abs() <= 1 && (spot.y - 4).abs() <= 1);
        }

        // Only 7 free tiles in the first frame plus 16 in the second.
        let all = board.occupiable_spots(100, center, 2, &mut rng);
        assert_eq!(all.len(), 23);
        assert!(board.occupiable_spot(center, 0, &mut rng).is_none());
    }

    #[test]
    fn test_occupiable_spots_are_deterministic() {
        let board = board(12, 12);
        let a = board.occupiable_spots(5, Tile::new(6, 6), 3, &mut BoardRng::new(1));
        let b = board.occupiable_spots(5, Tile::new(6, 6), 3, &mut BoardRng::new(1));
        assert_eq!(a, b);
    }

    #[test]
    fn test_queries_at_extreme_coordinates() {
        let mut board = board(6, 6);
        let wagon = Piece::prop(7, i32::MAX - 1, i32::MIN, 4, 4);
        board.shadow_piece(&wagon);
        board.shadow_piece(&Piece::prop(8, -2, -2, i32::MAX, 3));
        assert!(board.is_under_prop(0, 0));
        assert!(board.is_under_prop(5, 0));
        assert!(!board.is_under_prop(0, 1));

        let hero = Piece::unit(1, 0, i32::MAX, i32::MIN);
        for (x, y) in [(i32::MAX, 0), (i32::MIN, i32::MIN), (0, i32::MAX)] {
            assert_eq!(board.tile_state(x, y), None);
            assert_eq!(board.terrain_state(x, y), TileState::Flat);
            assert!(!board.can_occupy(&hero, x, y));
            assert!(!board.is_occupiable(x, y));
            assert!(!board.is_ground_occupiable(x, y, true));
        }
        board.clear_shadow(&hero);

        let mut rng = BoardRng::new(3);
        let far = Tile::new(i32::MIN, i32::MAX);
        assert!(board.occupiable_spots(4, far, i32::MAX, &mut rng).is_empty());
        let near = Tile::new(-3, 2);
        let spots = board.occupiable_spots(40, near, i32::MAX, &mut rng);
        assert_eq!(spots.len(), 36 - 6);
    }

    #[test]
    fn test_render_occupancy() {
        let mut board = board(3, 2);
        board.shadow_piece(&Piece::unit(1, 4, 0, 1));
        let moves: TileSet = [Tile::new(1, 1)].into_iter().collect();
        let text = board.render_occupancy(Some(&moves));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], " 1: 4 + .");
        assert_eq!(lines[1], " 0: . . .");
        assert_eq!(lines[4], "    0 1 2");
    }
}
