//! Pieces as seen by the board.
//!
//! The board never owns pieces. It reads their position, owner and
//! footprint to maintain occupancy, and their movement stats to compute
//! move sets.

use serde::{Deserialize, Serialize};

use crate::geom::{Rect, Tile};
use crate::terrain::{MovementClass, Terrain};

/// Unique identifier for a piece within a round.
///
/// Id 0 means "not yet assigned" and never reserves scheduler resources.
pub type PieceId = u32;

/// Index of the player owning a piece.
pub type PlayerIndex = u8;

/// What sort of piece this is, as far as occupancy is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PieceKind {
    /// A player or neutral unit occupying a single tile.
    #[default]
    Unit,
    /// A multi-tile prop (building, rock, cactus) anchored at the piece tile.
    Prop {
        /// Footprint width in tiles.
        width: i32,
        /// Footprint height in tiles.
        height: i32,
    },
    /// A section of train track.
    Track {
        /// Terminal and singleton sections block ground units.
        blocks_ground: bool,
    },
    /// A collectible bonus; standing on it is allowed.
    Bonus,
    /// A train car running along the track.
    Train,
}

/// A piece on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    /// Round-unique identifier.
    pub piece_id: PieceId,
    /// Occupancy behaviour.
    pub kind: PieceKind,
    /// Tile column.
    pub x: i32,
    /// Tile row.
    pub y: i32,
    /// Owning player, `None` for neutral pieces.
    pub owner: Option<PlayerIndex>,
    /// Tiles this piece may move per turn.
    pub move_distance: u8,
    /// Closest tile this piece may fire on.
    pub min_fire_distance: u8,
    /// Farthest tile this piece may fire on.
    pub max_fire_distance: u8,
    /// How the piece traverses terrain.
    pub movement: MovementClass,
}

impl Piece {
    /// A single-tile unit owned by `owner`.
    #[must_use]
    pub fn unit(piece_id: PieceId, owner: PlayerIndex, x: i32, y: i32) -> Self {
        Self {
            piece_id,
            kind: PieceKind::Unit,
            x,
            y,
            owner: Some(owner),
            move_distance: 1,
            min_fire_distance: 1,
            max_fire_distance: 1,
            movement: MovementClass::Ground,
        }
    }

    /// A neutral multi-tile prop anchored at `(x, y)`.
    #[must_use]
    pub fn prop(piece_id: PieceId, x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            piece_id,
            kind: PieceKind::Prop { width, height },
            x,
            y,
            owner: None,
            move_distance: 0,
            min_fire_distance: 0,
            max_fire_distance: 0,
            movement: MovementClass::Ground,
        }
    }

    /// A neutral piece of the given kind at `(x, y)`.
    #[must_use]
    pub fn neutral(piece_id: PieceId, kind: PieceKind, x: i32, y: i32) -> Self {
        Self {
            kind,
            owner: None,
            move_distance: 0,
            min_fire_distance: 0,
            max_fire_distance: 0,
            ..Self::unit(piece_id, 0, x, y)
        }
    }

    /// Set the move distance.
    #[must_use]
    pub const fn with_move_distance(mut self, distance: u8) -> Self {
        self.move_distance = distance;
        self
    }

    /// Set the fire distance band.
    #[must_use]
    pub const fn with_fire_distance(mut self, min: u8, max: u8) -> Self {
        self.min_fire_distance = min;
        self.max_fire_distance = max;
        self
    }

    /// Set the movement class.
    #[must_use]
    pub const fn with_movement(mut self, movement: MovementClass) -> Self {
        self.movement = movement;
        self
    }

    /// Move the piece to a new tile.
    #[must_use]
    pub const fn at(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// The tile this piece stands on.
    #[must_use]
    pub const fn tile(&self) -> Tile {
        Tile::new(self.x, self.y)
    }

    /// The tiles covered by this piece.
    #[must_use]
    pub const fn footprint(&self) -> Rect {
        match self.kind {
            PieceKind::Prop { width, height } => Rect::new(self.x, self.y, width, height),
            _ => Rect::new(self.x, self.y, 1, 1),
        }
    }

    /// Whether the piece ignores other pieces when moving.
    ///
    /// Trains count as flyers so they can pass "over" props along the track.
    #[must_use]
    pub const fn ignores_occupancy(&self) -> bool {
        matches!(self.movement, MovementClass::Flyer) || matches!(self.kind, PieceKind::Train)
    }

    /// Cost in tenths of a move point to enter a tile of `terrain`.
    #[must_use]
    pub const fn traversal_cost(&self, terrain: Terrain) -> u16 {
        self.movement.traversal_cost(terrain)
    }
}
