//! Turning piece changes into board actions.
//!
//! Game state arrives as a stream of [`PieceEvent`]s. [`PieceFeed`] wraps
//! each in a [`BoardAction`] with the reservations that keep a piece's
//! animations in order:
//!
//! - creation and removal reserve the piece and its tile;
//! - updates reserve the piece only, since the piece may be moving.
//!
//! The actions call back into a [`PieceView`], the renderer-side hook,
//! when the scheduler runs them.

use serde::{Deserialize, Serialize};

use crate::actions::{
    ActionId, ActionScheduler, Animatable, BoardAction, CompletionToken, Execution,
};
use crate::board::Board;
use crate::error::ActionError;
use crate::geom::Rect;
use crate::piece::{Piece, PieceId};

/// Game tick at which an event happened.
pub type Tick = u16;

/// A change to the set of pieces on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PieceEvent {
    /// A piece entered the board.
    Added {
        /// The new piece.
        piece: Piece,
        /// When it happened.
        tick: Tick,
    },
    /// A piece changed, e.g. moved or took damage.
    Updated {
        /// The piece before the change.
        old: Piece,
        /// The piece after the change.
        new: Piece,
        /// When it happened.
        tick: Tick,
    },
    /// A piece left the board.
    Removed {
        /// The departing piece.
        piece: Piece,
        /// When it happened.
        tick: Tick,
    },
}

impl PieceEvent {
    /// The piece the event is about.
    #[must_use]
    pub fn piece_id(&self) -> PieceId {
        match self {
            Self::Added { piece, .. } | Self::Removed { piece, .. } => piece.piece_id,
            Self::Updated { old, .. } => old.piece_id,
        }
    }

    /// When the event happened.
    #[must_use]
    pub const fn tick(&self) -> Tick {
        match self {
            Self::Added { tick, .. } | Self::Updated { tick, .. } | Self::Removed { tick, .. } => {
                *tick
            }
        }
    }

    /// Bring the board's occupancy in line with the event.
    pub fn apply(&self, board: &mut Board) {
        match self {
            Self::Added { piece, .. } => board.shadow_piece(piece),
            Self::Updated { old, new, .. } => {
                board.clear_shadow(old);
                board.shadow_piece(new);
            }
            Self::Removed { piece, .. } => board.clear_shadow(piece),
        }
    }
}

/// Renderer-side hooks invoked as piece actions run.
///
/// Each hook may finish at once or return [`Execution::Waiting`] and
/// complete `token` when its animation ends. The defaults do nothing.
pub trait PieceView {
    /// A piece appeared.
    fn piece_created(
        &mut self,
        _piece: &Piece,
        _tick: Tick,
        _token: CompletionToken,
    ) -> Result<Execution, ActionError> {
        Ok(Execution::Completed)
    }

    /// A piece changed.
    fn piece_updated(
        &mut self,
        _old: &Piece,
        _new: &Piece,
        _tick: Tick,
        _token: CompletionToken,
    ) -> Result<Execution, ActionError> {
        Ok(Execution::Completed)
    }

    /// A piece disappeared.
    fn piece_removed(
        &mut self,
        _piece: &Piece,
        _tick: Tick,
        _token: CompletionToken,
    ) -> Result<Execution, ActionError> {
        Ok(Execution::Completed)
    }

    /// A named effect involving the given pieces.
    fn effect(
        &mut self,
        _effect: &str,
        _pieces: &[PieceId],
        _token: CompletionToken,
    ) -> Result<Execution, ActionError> {
        Ok(Execution::Completed)
    }
}

/// Payload of the actions built by this module.
#[derive(Debug, Clone)]
enum PieceAction {
    Created(Piece, Tick),
    Updated(Piece, Piece, Tick),
    Removed(Piece, Tick),
    Effect(String, Vec<PieceId>),
}

impl<C: PieceView> Animatable<C> for PieceAction {
    fn execute(&mut self, view: &mut C, token: CompletionToken) -> Result<Execution, ActionError> {
        match self {
            Self::Created(piece, tick) => view.piece_created(piece, *tick, token),
            Self::Updated(old, new, tick) => view.piece_updated(old, new, *tick, token),
            Self::Removed(piece, tick) => view.piece_removed(piece, *tick, token),
            Self::Effect(name, pieces) => view.effect(name, pieces, token),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Created(..) => "PieceCreated",
            Self::Updated(..) => "PieceUpdated",
            Self::Removed(..) => "PieceRemoved",
            Self::Effect(..) => "Effect",
        }
    }
}

/// Builds the board action for a piece event.
#[must_use]
pub fn piece_action<C: PieceView>(event: PieceEvent) -> BoardAction<C> {
    match event {
        PieceEvent::Added { piece, tick } => {
            let (id, bounds) = (piece.piece_id, Rect::tile(piece.tile()));
            BoardAction::new(PieceAction::Created(piece, tick))
                .affecting([id])
                .with_bounds(bounds)
        }
        PieceEvent::Updated { old, new, tick } => {
            let id = old.piece_id;
            BoardAction::new(PieceAction::Updated(old, new, tick)).affecting([id])
        }
        PieceEvent::Removed { piece, tick } => {
            let (id, bounds) = (piece.piece_id, Rect::tile(piece.tile()));
            BoardAction::new(PieceAction::Removed(piece, tick))
                .affecting([id])
                .with_bounds(bounds)
        }
    }
}

/// Submits piece events to a scheduler.
///
/// Tracks the current game tick for callers that report updates without
/// one.
#[derive(Debug, Clone, Copy, Default)]
pub struct PieceFeed {
    tick: Tick,
    submitted: u64,
}

impl PieceFeed {
    /// A feed starting at tick zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current game tick.
    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    /// Advance to a new game tick.
    pub fn set_tick(&mut self, tick: Tick) {
        self.tick = tick;
    }

    /// Number of events submitted so far.
    #[must_use]
    pub const fn submitted(&self) -> u64 {
        self.submitted
    }

    /// Queue the action for `event`.
    pub fn submit<C: PieceView>(
        &mut self,
        scheduler: &mut ActionScheduler<C>,
        event: PieceEvent,
    ) -> ActionId {
        self.submitted += 1;
        tracing::trace!(piece = event.piece_id(), tick = event.tick(), "Piece event");
        scheduler.execute_action(piece_action(event))
    }

    /// A piece was created at `tick`.
    pub fn piece_created<C: PieceView>(
        &mut self,
        scheduler: &mut ActionScheduler<C>,
        piece: Piece,
        tick: Tick,
    ) -> ActionId {
        self.submit(scheduler, PieceEvent::Added { piece, tick })
    }

    /// A piece changed during the current tick.
    pub fn piece_updated<C: PieceView>(
        &mut self,
        scheduler: &mut ActionScheduler<C>,
        old: Piece,
        new: Piece,
    ) -> ActionId {
        let tick = self.tick;
        self.submit(scheduler, PieceEvent::Updated { old, new, tick })
    }

    /// A piece was removed during the current tick.
    pub fn piece_removed<C: PieceView>(
        &mut self,
        scheduler: &mut ActionScheduler<C>,
        piece: Piece,
    ) -> ActionId {
        let tick = self.tick;
        self.submit(scheduler, PieceEvent::Removed { piece, tick })
    }
}

/// A named game effect (a shot, an explosion, a card being played).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectAction {
    name: String,
    pieces: Vec<PieceId>,
    waiters: Vec<PieceId>,
    bounds: Option<Rect>,
}

impl EffectAction {
    /// An effect touching nothing yet.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pieces: Vec::new(),
            waiters: Vec::new(),
            bounds: None,
        }
    }

    /// Pieces the effect changes.
    #[must_use]
    pub fn affecting(mut self, ids: impl IntoIterator<Item = PieceId>) -> Self {
        self.pieces.extend(ids);
        self
    }

    /// Pieces whose pending actions must finish first.
    #[must_use]
    pub fn waiting_on(mut self, ids: impl IntoIterator<Item = PieceId>) -> Self {
        self.waiters.extend(ids);
        self
    }

    /// Tiles the effect covers.
    #[must_use]
    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Effect name passed to [`PieceView::effect`].
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build the board action.
    #[must_use]
    pub fn into_action<C: PieceView>(self) -> BoardAction<C> {
        let action = BoardAction::new(PieceAction::Effect(self.name, self.pieces.clone()))
            .affecting(self.pieces)
            .waiting_on(self.waiters);
        match self.bounds {
            Some(bounds) => action.with_bounds(bounds),
            None => action,
        }
    }

    /// Build and submit the board action.
    pub fn submit<C: PieceView>(self, scheduler: &mut ActionScheduler<C>) -> ActionId {
        scheduler.execute_action(self.into_action())
    }
}
