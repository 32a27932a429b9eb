//! Dependency-aware scheduling of board actions.
//!
//! Every visible change to the board (a piece appearing, moving, dying, an
//! effect playing) is a [`BoardAction`]. Actions declare the pieces they
//! affect, the pieces they must wait for and optionally a rectangle of
//! tiles they touch. The [`ActionScheduler`] runs an action as soon as none
//! of those resources is reserved by an earlier action and queues it
//! otherwise, so overlapping animations serialize while independent ones
//! run side by side.
//!
//! # Control flow
//!
//! The scheduler is driven from a single control thread. Dispatching an
//! action only posts it to a work queue; [`ActionScheduler::pump`] runs
//! posted actions against a caller-supplied context. An action either
//! finishes inside `execute` or reports [`Execution::Waiting`] and later
//! signals completion through [`ActionScheduler::action_completed`] or the
//! [`CompletionToken`] it was handed. Tokens may travel to other threads;
//! their completions are picked up by the next `pump`.
//!
//! # Reservations
//!
//! Submitting an action reserves its affected piece ids and bounds whether
//! or not it can run yet, which keeps later actions behind earlier ones.
//! Whenever an action completes the reservations are rebuilt from the
//! actions still executing and the whole waiting queue is rescanned in
//! submission order.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::clock::{Clock, SystemClock};
use crate::config::SchedulerConfig;
use crate::error::{ActionError, SchedulerError};
use crate::geom::Rect;
use crate::piece::PieceId;

/// Identifier assigned to an action when it is submitted.
pub type ActionId = u64;

/// Outcome of [`Animatable::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// The action finished synchronously.
    Completed,
    /// The action keeps running; completion will be signalled later.
    Waiting,
}

/// The payload of a board action: whatever actually animates the change.
pub trait Animatable<C> {
    /// Start the action.
    ///
    /// Return [`Execution::Waiting`] to keep the action's reservations until
    /// `token` (or [`ActionScheduler::action_completed`]) reports completion.
    ///
    /// # Errors
    ///
    /// A failed action is logged and treated as completed.
    fn execute(&mut self, ctx: &mut C, token: CompletionToken) -> Result<Execution, ActionError>;

    /// Called once the action has completed, before queued actions are
    /// reconsidered.
    fn on_complete(&mut self) {}

    /// Short name used in log output.
    fn name(&self) -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

/// An [`Animatable`] built from a closure.
pub struct FnAction<F>(F);

impl<C, F> Animatable<C> for FnAction<F>
where
    F: FnMut(&mut C, CompletionToken) -> Result<Execution, ActionError>,
{
    fn execute(&mut self, ctx: &mut C, token: CompletionToken) -> Result<Execution, ActionError> {
        (self.0)(ctx, token)
    }

    fn name(&self) -> &'static str {
        "fn"
    }
}

/// Reports completion of a waiting action, possibly from another thread.
#[derive(Debug, Clone)]
pub struct CompletionToken {
    id: ActionId,
    tx: UnboundedSender<ActionId>,
}

impl CompletionToken {
    /// The action this token completes.
    #[must_use]
    pub const fn action_id(&self) -> ActionId {
        self.id
    }

    /// Signal completion. Takes effect on the scheduler's next
    /// [`ActionScheduler::pump`]; ignored if the scheduler is gone.
    pub fn complete(self) {
        let _ = self.tx.send(self.id);
    }
}

/// A unit of board work together with the resources it needs.
pub struct BoardAction<C> {
    id: ActionId,
    piece_ids: Vec<PieceId>,
    waiter_ids: Vec<PieceId>,
    bounds: Option<Rect>,
    started: Option<Duration>,
    flagged: bool,
    payload: Box<dyn Animatable<C>>,
}

impl<C> BoardAction<C> {
    /// Wrap a payload that needs no resources.
    #[must_use]
    pub fn new(payload: impl Animatable<C> + 'static) -> Self {
        Self {
            id: 0,
            piece_ids: Vec::new(),
            waiter_ids: Vec::new(),
            bounds: None,
            started: None,
            flagged: false,
            payload: Box::new(payload),
        }
    }

    /// Wrap a closure.
    #[must_use]
    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnMut(&mut C, CompletionToken) -> Result<Execution, ActionError> + 'static,
    {
        Self::new(FnAction(f))
    }

    /// Pieces changed by this action. At most one action touching a piece
    /// runs at a time.
    #[must_use]
    pub fn affecting(mut self, ids: impl IntoIterator<Item = PieceId>) -> Self {
        self.piece_ids.extend(ids);
        self
    }

    /// Pieces this action must wait for without reserving them.
    #[must_use]
    pub fn waiting_on(mut self, ids: impl IntoIterator<Item = PieceId>) -> Self {
        self.waiter_ids.extend(ids);
        self
    }

    /// Tiles this action touches.
    #[must_use]
    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Assigned id, zero until submitted.
    #[must_use]
    pub const fn id(&self) -> ActionId {
        self.id
    }

    /// Affected piece ids.
    #[must_use]
    pub fn piece_ids(&self) -> &[PieceId] {
        &self.piece_ids
    }

    /// Waited-on piece ids.
    #[must_use]
    pub fn waiter_ids(&self) -> &[PieceId] {
        &self.waiter_ids
    }

    /// Affected tiles, if any.
    #[must_use]
    pub const fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Whether none of this action's resources is reserved.
    #[must_use]
    pub fn can_execute(&self, pending: &BTreeSet<PieceId>, pending_bounds: &[Rect]) -> bool {
        let ids_free = self
            .piece_ids
            .iter()
            .chain(&self.waiter_ids)
            .all(|id| !pending.contains(id));
        let bounds_free = self
            .bounds
            .map_or(true, |b| pending_bounds.iter().all(|p| !p.intersects(&b)));
        ids_free && bounds_free
    }

    /// Ids that take part in reservations. Id 0 is an unassigned piece.
    fn reserved_ids(&self) -> impl Iterator<Item = PieceId> + '_ {
        self.piece_ids.iter().copied().filter(|&id| id > 0)
    }
}

impl<C> std::fmt::Debug for BoardAction<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardAction")
            .field("id", &self.id)
            .field("name", &self.payload.name())
            .field("piece_ids", &self.piece_ids)
            .field("waiter_ids", &self.waiter_ids)
            .field("bounds", &self.bounds)
            .finish_non_exhaustive()
    }
}

/// Counters describing scheduler activity since creation or the last
/// [`ActionScheduler::clear`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Actions submitted.
    pub submitted: u64,
    /// Actions that had to wait in the queue on submission.
    pub queued: u64,
    /// Actions dispatched, immediately or from the queue.
    pub dispatched: u64,
    /// Actions completed.
    pub completed: u64,
    /// Actions whose payload returned an error or panicked.
    pub failed: u64,
    /// Completions reported for actions that were not executing.
    pub recompleted: u64,
    /// Actions flagged by the watchdog.
    pub stuck: u64,
}

/// Serializes board actions that share pieces or tiles.
pub struct ActionScheduler<C> {
    config: SchedulerConfig,
    clock: Box<dyn Clock>,
    next_id: ActionId,
    /// Actions waiting for their resources, in submission order.
    queued: VecDeque<BoardAction<C>>,
    /// Dispatched actions, running or posted to run.
    running: BTreeMap<ActionId, BoardAction<C>>,
    /// Posted actions not yet started by `pump`.
    ready: VecDeque<ActionId>,
    /// Number of executing actions per affected piece.
    executing_units: BTreeMap<PieceId, u32>,
    executing_bounds: Vec<Rect>,
    pending_units: BTreeSet<PieceId>,
    pending_bounds: Vec<Rect>,
    completion_tx: UnboundedSender<ActionId>,
    completion_rx: UnboundedReceiver<ActionId>,
    stats: SchedulerStats,
}

impl<C> ActionScheduler<C> {
    /// Create a scheduler timed by the system clock.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_clock(config, SystemClock::new())
    }

    /// Create a scheduler with an explicit clock.
    #[must_use]
    pub fn with_clock(config: SchedulerConfig, clock: impl Clock + 'static) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            config,
            clock: Box::new(clock),
            next_id: 1,
            queued: VecDeque::new(),
            running: BTreeMap::new(),
            ready: VecDeque::new(),
            executing_units: BTreeMap::new(),
            executing_bounds: Vec::new(),
            pending_units: BTreeSet::new(),
            pending_bounds: Vec::new(),
            completion_tx,
            completion_rx,
            stats: SchedulerStats::default(),
        }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Activity counters.
    #[must_use]
    pub const fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    /// Submit an action.
    ///
    /// It is dispatched at once if its resources are free and queued
    /// otherwise; either way its resources are reserved against later
    /// submissions.
    pub fn execute_action(&mut self, mut action: BoardAction<C>) -> ActionId {
        let id = self.next_id;
        self.next_id += 1;
        action.id = id;
        self.stats.submitted += 1;

        let runnable = action.can_execute(&self.pending_units, &self.pending_bounds);
        self.note_pending(&action);
        if runnable {
            self.dispatch(action);
        } else {
            self.trace("Queueing", &action);
            self.stats.queued += 1;
            self.queued.push_back(action);
        }

        self.check_watchdog();
        id
    }

    /// Run posted actions and apply completions reported through tokens.
    ///
    /// Keeps going until no posted action is left, so actions released by
    /// a completion during this call also run. Returns the number of
    /// actions started.
    pub fn pump(&mut self, ctx: &mut C) -> usize {
        let mut started = 0;
        loop {
            self.drain_completions();
            let Some(id) = self.ready.pop_front() else {
                break;
            };
            if self.run(ctx, id) {
                started += 1;
            }
        }
        started
    }

    /// Mark an executing action as completed and dispatch whatever it was
    /// holding up.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NotExecuting`] if the action is not
    /// executing, e.g. because it was already completed. State is left
    /// untouched in that case.
    pub fn action_completed(&mut self, id: ActionId) -> Result<(), SchedulerError> {
        let Some(mut action) = self.running.remove(&id) else {
            tracing::warn!(action = id, "Action re-completed");
            self.stats.recompleted += 1;
            return Err(SchedulerError::NotExecuting(id));
        };

        self.trace("Completed", &action);
        self.note_executing(&action, false);
        self.stats.completed += 1;
        action.payload.on_complete();
        self.process_actions();
        Ok(())
    }

    /// Flag every action that has been executing longer than the watchdog
    /// threshold. Each action is reported once. Observational only: nothing
    /// is cancelled.
    pub fn check_watchdog(&mut self) -> Vec<ActionId> {
        let now = self.clock.now();
        let limit = self.config.watchdog();
        let mut stuck = Vec::new();
        for action in self.running.values_mut() {
            let Some(started) = action.started else {
                continue;
            };
            let since = now.saturating_sub(started);
            if !action.flagged && since > limit {
                tracing::warn!(
                    action = action.id,
                    name = action.payload.name(),
                    pieces = ?action.piece_ids,
                    since_ms = since.as_millis(),
                    "Board action stuck on the queue?"
                );
                action.flagged = true;
                stuck.push(action.id);
            }
        }
        self.stats.stuck += stuck.len() as u64;
        stuck
    }

    /// Discard every queued and executing action, e.g. at round end.
    ///
    /// Outstanding tokens become no-ops.
    pub fn clear(&mut self) {
        let dropped = self.queued.len() + self.running.len();
        self.queued.clear();
        self.running.clear();
        self.ready.clear();
        self.executing_units.clear();
        self.executing_bounds.clear();
        self.pending_units.clear();
        self.pending_bounds.clear();
        while self.completion_rx.try_recv().is_ok() {}
        self.stats = SchedulerStats::default();
        tracing::debug!(dropped, "Cleared board actions");
    }

    /// Whether nothing is queued, posted or executing.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.queued.is_empty() && self.running.is_empty()
    }

    /// Number of actions waiting for their resources.
    #[must_use]
    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    /// Number of dispatched actions not yet completed.
    #[must_use]
    pub fn executing_len(&self) -> usize {
        self.running.len()
    }

    /// Whether the action has been dispatched and not yet completed.
    #[must_use]
    pub fn is_executing(&self, id: ActionId) -> bool {
        self.running.contains_key(&id)
    }

    /// Whether the action is waiting in the queue.
    #[must_use]
    pub fn is_queued(&self, id: ActionId) -> bool {
        self.queued.iter().any(|a| a.id == id)
    }

    /// Whether the piece is reserved by a queued or executing action.
    #[must_use]
    pub fn is_pending(&self, piece_id: PieceId) -> bool {
        self.pending_units.contains(&piece_id)
    }

    fn dispatch(&mut self, action: BoardAction<C>) {
        self.trace("Posting", &action);
        self.note_executing(&action, true);
        self.stats.dispatched += 1;
        self.ready.push_back(action.id);
        self.running.insert(action.id, action);
    }

    /// Start a posted action. Returns false if it was completed or
    /// discarded before it got to run.
    fn run(&mut self, ctx: &mut C, id: ActionId) -> bool {
        let now = self.clock.now();
        let token = CompletionToken {
            id,
            tx: self.completion_tx.clone(),
        };
        let Some(action) = self.running.get_mut(&id) else {
            return false;
        };
        action.started = Some(now);
        let name = action.payload.name();
        if self.config.trace_actions {
            tracing::info!(action = id, name, "Running");
        }

        let payload = &mut action.payload;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| payload.execute(ctx, token)));
        match outcome {
            Ok(Ok(Execution::Waiting)) => {
                tracing::debug!(action = id, name, "Waiting");
                return true;
            }
            Ok(Ok(Execution::Completed)) => {}
            Ok(Err(err)) => {
                tracing::warn!(action = id, name, error = %err, "Board action choked");
                self.stats.failed += 1;
            }
            Err(cause) => {
                tracing::warn!(
                    action = id,
                    name,
                    panic = panic_message(cause.as_ref()),
                    "Board action choked"
                );
                self.stats.failed += 1;
            }
        }

        if let Err(err) = self.action_completed(id) {
            tracing::debug!(action = id, error = %err, "Completion raced a token");
        }
        true
    }

    fn drain_completions(&mut self) {
        while let Ok(id) = self.completion_rx.try_recv() {
            // Failures are logged and counted by action_completed.
            let _ = self.action_completed(id);
        }
    }

    /// Rebuild reservations from executing actions, then walk the queue in
    /// order dispatching everything whose resources are free. Every queued
    /// action re-reserves its resources, dispatched or not.
    fn process_actions(&mut self) {
        self.pending_units.clear();
        self.pending_units.extend(
            self.executing_units
                .iter()
                .filter(|(_, &count)| count > 0)
                .map(|(&id, _)| id),
        );
        self.pending_bounds.clear();
        self.pending_bounds.extend_from_slice(&self.executing_bounds);

        let queued = std::mem::take(&mut self.queued);
        for action in queued {
            let runnable = action.can_execute(&self.pending_units, &self.pending_bounds);
            self.note_pending(&action);
            if runnable {
                self.dispatch(action);
            } else {
                self.queued.push_back(action);
            }
        }
    }

    fn note_pending(&mut self, action: &BoardAction<C>) {
        self.pending_units.extend(action.reserved_ids());
        if let Some(bounds) = action.bounds {
            self.pending_bounds.push(bounds);
        }
    }

    fn note_executing(&mut self, action: &BoardAction<C>, starting: bool) {
        for id in action.reserved_ids() {
            if starting {
                *self.executing_units.entry(id).or_insert(0) += 1;
            } else if let Some(count) = self.executing_units.get_mut(&id) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.executing_units.remove(&id);
                }
            }
        }
        if let Some(bounds) = action.bounds {
            if starting {
                self.executing_bounds.push(bounds);
            } else if let Some(pos) = self.executing_bounds.iter().position(|b| *b == bounds) {
                self.executing_bounds.swap_remove(pos);
            }
        }
    }

    fn trace(&self, what: &'static str, action: &BoardAction<C>) {
        if self.config.trace_actions {
            tracing::info!(
                action = action.id,
                name = action.payload.name(),
                pieces = ?action.piece_ids,
                waiters = ?action.waiter_ids,
                pending = ?self.pending_units,
                "{what}"
            );
        } else {
            tracing::debug!(action = action.id, name = action.payload.name(), "{what}");
        }
    }
}

impl<C> std::fmt::Debug for ActionScheduler<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionScheduler")
            .field("queued", &self.queued.len())
            .field("running", &self.running.len())
            .field("pending_units", &self.pending_units)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

fn panic_message(cause: &(dyn std::any::Any + Send)) -> &str {
    cause
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| cause.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic>")
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::clock::ManualClock;

    #[derive(Debug, Clone, Copy)]
    enum Script {
        Done,
        Wait,
        Fail,
        Panic,
    }

    #[derive(Default)]
    struct Log {
        ran: Vec<&'static str>,
        tokens: Vec<CompletionToken>,
    }

    struct Step(&'static str, Script);

    impl Animatable<Log> for Step {
        fn execute(
            &mut self,
            log: &mut Log,
            token: CompletionToken,
        ) -> Result<Execution, ActionError> {
            log.ran.push(self.0);
            match self.1 {
                Script::Done => Ok(Execution::Completed),
                Script::Wait => {
                    log.tokens.push(token);
                    Ok(Execution::Waiting)
                }
                Script::Fail => Err(ActionError::new("sprite missing")),
                Script::Panic => panic!("boom"),
            }
        }
    }

    fn step(name: &'static str, script: Script) -> BoardAction<Log> {
        BoardAction::new(Step(name, script))
    }

    fn scheduler() -> ActionScheduler<Log> {
        ActionScheduler::with_clock(SchedulerConfig::default(), ManualClock::new())
    }

    #[test]
    fn test_same_piece_serializes() {
        let mut sched = scheduler();
        let mut log = Log::default();

        let a1 = sched.execute_action(step("a1", Script::Wait).affecting([1]));
        let a2 = sched.execute_action(step("a2", Script::Done).affecting([1]));
        assert!(sched.is_executing(a1));
        assert!(sched.is_queued(a2));

        sched.pump(&mut log);
        assert_eq!(log.ran, ["a1"]);
        assert!(sched.is_queued(a2));

        sched.action_completed(a1).unwrap();
        assert!(sched.is_executing(a2));
        sched.pump(&mut log);
        assert_eq!(log.ran, ["a1", "a2"]);
        assert!(sched.is_idle());
    }

    #[test]
    fn test_disjoint_bounds_run_together() {
        let mut sched = scheduler();
        let mut log = Log::default();
        let a1 = sched.execute_action(step("a1", Script::Wait).with_bounds(Rect::new(0, 0, 2, 2)));
        let a2 = sched.execute_action(step("a2", Script::Wait).with_bounds(Rect::new(5, 5, 2, 2)));
        assert!(sched.is_executing(a1));
        assert!(sched.is_executing(a2));
        sched.pump(&mut log);
        assert_eq!(log.ran, ["a1", "a2"]);
    }

    #[test]
    fn test_overlapping_bounds_serialize() {
        let mut sched = scheduler();
        let mut log = Log::default();
        let a1 = sched.execute_action(step("a1", Script::Wait).with_bounds(Rect::new(0, 0, 3, 3)));
        let a2 = sched.execute_action(step("a2", Script::Done).with_bounds(Rect::new(2, 2, 3, 3)));
        // Touching edges only: not a conflict.
        let a3 = sched.execute_action(step("a3", Script::Done).with_bounds(Rect::new(3, 0, 1, 1)));
        assert!(sched.is_queued(a2));
        assert!(sched.is_executing(a3));

        sched.pump(&mut log);
        sched.action_completed(a1).unwrap();
        sched.pump(&mut log);
        assert_eq!(log.ran, ["a1", "a3", "a2"]);
    }

    #[test]
    fn test_failure_does_not_stall_queue() {
        let mut sched = scheduler();
        let mut log = Log::default();
        sched.execute_action(step("bad", Script::Fail).affecting([4]));
        sched.execute_action(step("boom", Script::Panic).affecting([4]));
        sched.execute_action(step("next", Script::Done).affecting([4]));

        sched.pump(&mut log);
        assert_eq!(log.ran, ["bad", "boom", "next"]);
        assert!(sched.is_idle());
        assert_eq!(sched.stats().failed, 2);
        assert_eq!(sched.stats().completed, 3);
    }

    #[test]
    fn test_waiters_block_without_reserving() {
        let mut sched = scheduler();
        let mut log = Log::default();
        let mover = sched.execute_action(step("move", Script::Wait).affecting([2]));
        let shot = sched.execute_action(step("shot", Script::Done).affecting([3]).waiting_on([2]));
        assert!(sched.is_queued(shot));

        // The queued shot still reserves the piece it affects.
        assert!(sched.is_pending(3));
        sched.pump(&mut log);
        sched.action_completed(mover).unwrap();
        assert!(!sched.is_queued(shot));
        assert!(!sched.is_pending(2));
        sched.pump(&mut log);
        assert_eq!(log.ran, ["move", "shot"]);
    }

    #[test]
    fn test_queued_actions_reserve_for_later_ones() {
        let mut sched = scheduler();
        let mut log = Log::default();
        let a = sched.execute_action(step("a", Script::Wait).affecting([1]));
        let b = sched.execute_action(step("b", Script::Wait).affecting([1, 2]));
        // Piece 2 is free, but b is queued ahead holding it.
        let c = sched.execute_action(step("c", Script::Done).affecting([2]));
        assert!(sched.is_queued(b));
        assert!(sched.is_queued(c));

        sched.pump(&mut log);
        sched.action_completed(a).unwrap();
        assert!(sched.is_executing(b));
        assert!(sched.is_queued(c));
        sched.pump(&mut log);
        sched.action_completed(b).unwrap();
        sched.pump(&mut log);
        assert_eq!(log.ran, ["a", "b", "c"]);
    }

    #[test]
    fn test_release_order_is_submission_order() {
        let mut sched = scheduler();
        let mut log = Log::default();
        let first = sched.execute_action(step("first", Script::Wait).affecting([9]));
        for name in ["q1", "q2", "q3"] {
            sched.execute_action(step(name, Script::Done).affecting([9]));
        }
        sched.pump(&mut log);
        sched.action_completed(first).unwrap();
        sched.pump(&mut log);
        assert_eq!(log.ran, ["first", "q1", "q2", "q3"]);
    }

    #[test]
    fn test_unassigned_piece_never_reserves() {
        let mut sched = scheduler();
        let a = sched.execute_action(step("a", Script::Wait).affecting([0]));
        let b = sched.execute_action(step("b", Script::Wait).affecting([0]));
        assert!(sched.is_executing(a));
        assert!(sched.is_executing(b));
        assert!(!sched.is_pending(0));
    }

    #[test]
    fn test_double_completion() {
        let mut sched = scheduler();
        let mut log = Log::default();
        let a = sched.execute_action(step("a", Script::Wait).affecting([1]));
        let b = sched.execute_action(step("b", Script::Wait).affecting([1]));
        sched.pump(&mut log);
        sched.action_completed(a).unwrap();
        assert_eq!(sched.action_completed(a), Err(SchedulerError::NotExecuting(a)));
        assert_eq!(sched.stats().recompleted, 1);
        // b keeps its reservation.
        assert!(sched.is_executing(b));
        assert!(sched.is_pending(1));
    }

    #[test]
    fn test_token_completes_from_another_thread() {
        let mut sched = scheduler();
        let mut log = Log::default();
        let a = sched.execute_action(step("a", Script::Wait).affecting([1]));
        sched.execute_action(step("b", Script::Done).affecting([1]));
        sched.pump(&mut log);
        let token = log.tokens.pop().unwrap();
        assert_eq!(token.action_id(), a);

        std::thread::spawn(move || token.complete()).join().unwrap();
        assert!(sched.is_executing(a));
        sched.pump(&mut log);
        assert_eq!(log.ran, ["a", "b"]);
        assert!(sched.is_idle());
    }

    #[test]
    fn test_watchdog_flags_once() {
        let clock = ManualClock::new();
        let config = SchedulerConfig::default().with_watchdog(Duration::from_millis(100));
        let mut sched = ActionScheduler::with_clock(config, clock.clone());
        let mut log = Log::default();

        let slow = sched.execute_action(step("slow", Script::Wait).affecting([1]));
        sched.pump(&mut log);
        clock.advance(Duration::from_millis(100));
        assert!(sched.check_watchdog().is_empty());

        clock.advance(Duration::from_millis(1));
        assert_eq!(sched.check_watchdog(), vec![slow]);
        assert!(sched.check_watchdog().is_empty());
        assert_eq!(sched.stats().stuck, 1);

        // Still running; the watchdog never completes anything.
        assert!(sched.is_executing(slow));
    }

    #[test]
    fn test_posted_but_not_started_is_not_stuck() {
        let clock = ManualClock::new();
        let mut sched: ActionScheduler<Log> =
            ActionScheduler::with_clock(SchedulerConfig::default(), clock.clone());
        sched.execute_action(step("idle", Script::Wait));
        clock.advance(Duration::from_secs(60));
        assert!(sched.check_watchdog().is_empty());
    }

    #[test]
    fn test_on_complete_runs_before_release() {
        struct Counted(Rc<Cell<u32>>);
        impl Animatable<Log> for Counted {
            fn execute(
                &mut self,
                _: &mut Log,
                _: CompletionToken,
            ) -> Result<Execution, ActionError> {
                Ok(Execution::Completed)
            }
            fn on_complete(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let count = Rc::new(Cell::new(0));
        let mut sched = scheduler();
        sched.execute_action(BoardAction::new(Counted(Rc::clone(&count))));
        sched.execute_action(BoardAction::new(Counted(Rc::clone(&count))));
        sched.pump(&mut Log::default());
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_closure_actions() {
        let mut sched: ActionScheduler<Vec<u32>> = scheduler_for();
        let mut seen = Vec::new();
        sched.execute_action(BoardAction::from_fn(|seen: &mut Vec<u32>, _| {
            seen.push(7);
            Ok(Execution::Completed)
        }));
        assert_eq!(sched.pump(&mut seen), 1);
        assert_eq!(seen, [7]);
    }

    fn scheduler_for<C>() -> ActionScheduler<C> {
        ActionScheduler::with_clock(SchedulerConfig::default(), ManualClock::new())
    }

    #[test]
    fn test_clear_discards_everything() {
        let mut sched = scheduler();
        let mut log = Log::default();
        sched.execute_action(step("a", Script::Wait).affecting([1]));
        sched.execute_action(step("b", Script::Wait).affecting([1]));
        sched.pump(&mut log);
        let stale = log.tokens.pop().unwrap();

        sched.clear();
        assert!(sched.is_idle());
        assert!(!sched.is_pending(1));

        stale.complete();
        let fresh = sched.execute_action(step("c", Script::Done).affecting([1]));
        assert!(sched.is_executing(fresh));
        sched.pump(&mut log);
        assert_eq!(log.ran, ["a", "c"]);
    }
}
