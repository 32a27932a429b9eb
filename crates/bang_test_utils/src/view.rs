//! A [`PieceView`] that records what the scheduler asks it to animate.
//!
//! Calls complete immediately unless the piece is marked as held, in which
//! case the completion token is parked until the test releases it. This
//! lets tests observe exactly which actions overlap in time.

use std::collections::BTreeSet;

use bang_core::actions::{ActionId, CompletionToken, Execution};
use bang_core::error::ActionError;
use bang_core::feed::{PieceView, Tick};
use bang_core::piece::{Piece, PieceId};

/// One call made on the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCall {
    /// `piece_created`.
    Created(PieceId, Tick),
    /// `piece_updated`.
    Updated(PieceId, Tick),
    /// `piece_removed`.
    Removed(PieceId, Tick),
    /// `effect`.
    Effect(String, Vec<PieceId>),
}

/// Records calls and optionally holds them open.
#[derive(Debug, Default)]
pub struct RecordingView {
    /// Every call, in the order the scheduler made them.
    pub calls: Vec<ViewCall>,
    held: BTreeSet<PieceId>,
    hold_effects: bool,
    parked: Vec<CompletionToken>,
    /// Effects that fail instead of playing.
    pub failing_effects: BTreeSet<String>,
}

impl RecordingView {
    /// A view that completes everything immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep actions on `piece` running until released.
    #[must_use]
    pub fn holding(mut self, piece: PieceId) -> Self {
        self.held.insert(piece);
        self
    }

    /// Keep every effect running until released.
    #[must_use]
    pub fn holding_effects(mut self) -> Self {
        self.hold_effects = true;
        self
    }

    /// Make the named effect return an error.
    #[must_use]
    pub fn failing(mut self, effect: &str) -> Self {
        self.failing_effects.insert(effect.to_owned());
        self
    }

    /// Ids of actions currently parked.
    #[must_use]
    pub fn parked(&self) -> Vec<ActionId> {
        self.parked.iter().map(CompletionToken::action_id).collect()
    }

    /// Complete the oldest parked action. Takes effect on the next pump.
    pub fn release_one(&mut self) -> Option<ActionId> {
        if self.parked.is_empty() {
            return None;
        }
        let token = self.parked.remove(0);
        let id = token.action_id();
        token.complete();
        Some(id)
    }

    /// Complete every parked action.
    pub fn release_all(&mut self) -> usize {
        let count = self.parked.len();
        for token in self.parked.drain(..) {
            token.complete();
        }
        count
    }

    /// Stop holding anything new.
    pub fn stop_holding(&mut self) {
        self.held.clear();
        self.hold_effects = false;
    }

    fn finish(&mut self, hold: bool, token: CompletionToken) -> Execution {
        if hold {
            self.parked.push(token);
            Execution::Waiting
        } else {
            Execution::Completed
        }
    }
}

impl PieceView for RecordingView {
    fn piece_created(
        &mut self,
        piece: &Piece,
        tick: Tick,
        token: CompletionToken,
    ) -> Result<Execution, ActionError> {
        self.calls.push(ViewCall::Created(piece.piece_id, tick));
        let hold = self.held.contains(&piece.piece_id);
        Ok(self.finish(hold, token))
    }

    fn piece_updated(
        &mut self,
        old: &Piece,
        _new: &Piece,
        tick: Tick,
        token: CompletionToken,
    ) -> Result<Execution, ActionError> {
        self.calls.push(ViewCall::Updated(old.piece_id, tick));
        let hold = self.held.contains(&old.piece_id);
        Ok(self.finish(hold, token))
    }

    fn piece_removed(
        &mut self,
        piece: &Piece,
        tick: Tick,
        token: CompletionToken,
    ) -> Result<Execution, ActionError> {
        self.calls.push(ViewCall::Removed(piece.piece_id, tick));
        let hold = self.held.contains(&piece.piece_id);
        Ok(self.finish(hold, token))
    }

    fn effect(
        &mut self,
        effect: &str,
        pieces: &[PieceId],
        token: CompletionToken,
    ) -> Result<Execution, ActionError> {
        self.calls
            .push(ViewCall::Effect(effect.to_owned(), pieces.to_vec()));
        if self.failing_effects.contains(effect) {
            tracing::debug!(effect, "Failing effect on request");
            return Err(ActionError::new(format!("{effect} misfired")));
        }
        let hold = self.hold_effects;
        Ok(self.finish(hold, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::manual_scheduler;
    use bang_core::feed::{EffectAction, PieceFeed};

    #[test]
    fn test_held_piece_parks_until_released() {
        let (mut scheduler, _clock) = manual_scheduler();
        let mut view = RecordingView::new().holding(1);
        let mut feed = PieceFeed::new();

        let first = feed.piece_created(&mut scheduler, Piece::unit(1, 0, 2, 2), 4);
        let second = feed.piece_removed(&mut scheduler, Piece::unit(1, 0, 2, 2));
        scheduler.pump(&mut view);

        assert_eq!(view.parked(), vec![first]);
        assert!(scheduler.is_queued(second));

        view.stop_holding();
        assert_eq!(view.release_one(), Some(first));
        scheduler.pump(&mut view);

        assert!(scheduler.is_idle());
        assert_eq!(
            view.calls,
            vec![ViewCall::Created(1, 4), ViewCall::Removed(1, 0)]
        );
    }

    #[test]
    fn test_failing_effect_is_recorded() {
        let (mut scheduler, _clock) = manual_scheduler();
        let mut view = RecordingView::new().failing("dynamite");
        EffectAction::new("dynamite").affecting([3]).submit(&mut scheduler);
        scheduler.pump(&mut view);

        assert!(scheduler.is_idle());
        assert_eq!(scheduler.stats().failed, 1);
        assert_eq!(
            view.calls,
            vec![ViewCall::Effect("dynamite".to_owned(), vec![3])]
        );
    }
}
