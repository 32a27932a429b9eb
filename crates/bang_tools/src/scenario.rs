//! Scripted rounds loaded from RON.
//!
//! A scenario names a board (as a generator config), the pieces on it at
//! round start, and a script of piece changes and effects with the
//! simulated time between them. Animation lengths come from
//! [`ReplayTiming`].

use std::collections::BTreeSet;
use std::path::Path;

use bang_core::error::BoardError;
use bang_core::generation::GeneratorConfig;
use bang_core::geom::Rect;
use bang_core::piece::{Piece, PieceId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading or replaying a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Could not read the file.
    #[error("Failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a valid scenario.
    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// The board could not be built.
    #[error(transparent)]
    Board(#[from] BoardError),

    /// Two pieces share an id.
    #[error("Duplicate piece id {0}")]
    DuplicatePiece(PieceId),

    /// Id 0 is reserved for unassigned pieces.
    #[error("Piece id 0 is reserved")]
    ReservedPieceId,

    /// A script step refers to a piece that is not on the board.
    #[error("Step {step}: no piece with id {piece}")]
    UnknownPiece {
        /// Index of the offending step.
        step: usize,
        /// The missing piece.
        piece: PieceId,
    },
}

/// Animation lengths used when replaying, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayTiming {
    /// A piece fading in.
    pub create_ms: u64,
    /// Walking one tile along the path.
    pub move_ms_per_tile: u64,
    /// A piece fading out.
    pub remove_ms: u64,
    /// Any effect without an explicit duration.
    pub effect_ms: u64,
}

impl Default for ReplayTiming {
    fn default() -> Self {
        Self {
            create_ms: 250,
            move_ms_per_tile: 150,
            remove_ms: 400,
            effect_ms: 500,
        }
    }
}

/// One entry of a scenario script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptStep {
    /// Advance the game tick reported with later events.
    Tick(u16),
    /// Let simulated time pass, finishing animations as they end.
    Wait(u64),
    /// Bring a new piece onto the board.
    Add(Piece),
    /// Move a piece. Illegal moves are counted and skipped.
    Move {
        /// Moving piece.
        piece: PieceId,
        /// Destination column.
        x: i32,
        /// Destination row.
        y: i32,
    },
    /// Fire on another piece. Shots out of range are counted and skipped.
    Shoot {
        /// Firing piece.
        shooter: PieceId,
        /// Target piece.
        target: PieceId,
    },
    /// Take a piece off the board.
    Remove(PieceId),
    /// Play a named effect.
    Effect {
        /// Effect name.
        name: String,
        /// Pieces the effect changes.
        #[serde(default)]
        pieces: Vec<PieceId>,
        /// Pieces whose animations must finish first.
        #[serde(default)]
        waiters: Vec<PieceId>,
        /// Tiles the effect covers.
        #[serde(default)]
        bounds: Option<Rect>,
        /// Overrides [`ReplayTiming::effect_ms`].
        #[serde(default)]
        duration_ms: Option<u64>,
    },
}

/// A scripted round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Board to play on.
    pub generator: GeneratorConfig,
    /// Pieces present at round start.
    #[serde(default)]
    pub pieces: Vec<Piece>,
    /// What happens during the round.
    #[serde(default)]
    pub script: Vec<ScriptStep>,
    /// Animation lengths.
    #[serde(default)]
    pub timing: ReplayTiming,
}

impl Scenario {
    /// Parse and validate a scenario.
    pub fn from_ron_str(source: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = ron::from_str(source)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Read, parse and validate a scenario file.
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let source = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "Loaded scenario");
        Self::from_ron_str(&source)
    }

    /// Check that piece ids are unique and non-zero across the initial
    /// pieces and every `Add` step.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let mut seen = BTreeSet::new();
        let added = self.script.iter().filter_map(|step| match step {
            ScriptStep::Add(piece) => Some(piece),
            _ => None,
        });
        for piece in self.pieces.iter().chain(added) {
            if piece.piece_id == 0 {
                return Err(ScenarioError::ReservedPieceId);
            }
            if !seen.insert(piece.piece_id) {
                return Err(ScenarioError::DuplicatePiece(piece.piece_id));
            }
        }
        Ok(())
    }

    /// The initial piece with the given id.
    #[must_use]
    pub fn piece(&self, piece_id: PieceId) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.piece_id == piece_id)
    }
}
