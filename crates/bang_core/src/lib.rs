//! # Bang Core
//!
//! Board model and action sequencing for a turn-based tactical western.
//!
//! This crate holds the parts of the game client that need real care:
//! - Terrain, elevation and per-tile occupancy of the battlefield
//! - Move, attack and path computation for pieces
//! - A scheduler that serializes overlapping board animations while
//!   letting independent ones run concurrently
//!
//! Everything here is deterministic. There is no rendering, no IO and no
//! system randomness; procedural boards take an explicit seed and
//! non-integer parameters use fixed-point math.
//!
//! ## Crate Structure
//!
//! - [`board`] - Heightfield, terrain and environment
//! - [`occupancy`] - Per-tile shadow state and occupancy queries
//! - [`movement`] - Move and attack sets
//! - [`pathfinding`] - A* routes within a piece's move budget
//! - [`actions`] - The board action scheduler
//! - [`feed`] - Piece events as board actions
//! - [`generation`] - Seeded procedural boards

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod actions;
pub mod board;
pub mod clock;
pub mod config;
pub mod environment;
pub mod error;
pub mod feed;
pub mod generation;
pub mod geom;
pub mod math;
pub mod movement;
pub mod occupancy;
pub mod pathfinding;
pub mod piece;
pub mod rng;
pub mod terrain;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::actions::{
        ActionId, ActionScheduler, Animatable, BoardAction, CompletionToken, Execution,
        SchedulerStats,
    };
    pub use crate::board::Board;
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::config::{BoardConfig, SchedulerConfig};
    pub use crate::error::{ActionError, BoardError, Result, SchedulerError};
    pub use crate::feed::{EffectAction, PieceEvent, PieceFeed, PieceView, Tick};
    pub use crate::generation::{generate_board, GeneratorConfig, SymmetryMode};
    pub use crate::geom::{Rect, Tile, TileSet};
    pub use crate::math::Fixed;
    pub use crate::movement::{compute_attacks, compute_moves, MoveSet, MoveSetCalculator};
    pub use crate::occupancy::TileState;
    pub use crate::pathfinding::compute_path;
    pub use crate::piece::{Piece, PieceId, PieceKind, PlayerIndex};
    pub use crate::rng::BoardRng;
    pub use crate::terrain::{MovementClass, Terrain};
}
