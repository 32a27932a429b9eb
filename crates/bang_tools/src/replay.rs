//! Headless replay of a scenario through the action scheduler.
//!
//! Time is simulated with a [`ManualClock`]: every animation the view
//! starts gets an end time, and waiting moves the clock from one end time
//! to the next, completing animations as it goes. The board model is
//! updated eagerly as events are submitted, the way the game client does
//! it, while their animations trail behind in the scheduler.

use std::collections::BTreeMap;
use std::time::Duration;

use bang_core::actions::{ActionId, ActionScheduler, CompletionToken, Execution, SchedulerStats};
use bang_core::board::Board;
use bang_core::clock::{Clock, ManualClock};
use bang_core::config::SchedulerConfig;
use bang_core::error::ActionError;
use bang_core::feed::{EffectAction, PieceEvent, PieceFeed, PieceView, Tick};
use bang_core::generation::generate_board;
use bang_core::geom::{Rect, Tile};
use bang_core::movement::{compute_attacks, MoveSetCalculator};
use bang_core::pathfinding::compute_path;
use bang_core::piece::{Piece, PieceId};
use serde::Serialize;

use crate::scenario::{ReplayTiming, Scenario, ScenarioError, ScriptStep};

/// One animation started by the replay view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    /// Simulated start time.
    pub at_ms: u64,
    /// Scheduler action id.
    pub action: ActionId,
    /// What was animated.
    pub kind: String,
    /// Pieces involved.
    pub pieces: Vec<PieceId>,
    /// Animation length.
    pub duration_ms: u64,
}

/// Outcome of a replay.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplayReport {
    /// Script steps run.
    pub steps: usize,
    /// Simulated time until the last animation ended.
    pub elapsed_ms: u64,
    /// Moves rejected because the destination was not in the move set.
    pub illegal_moves: u32,
    /// Shots rejected because the target was out of range.
    pub missed_shots: u32,
    /// Most actions executing at once.
    pub max_executing: usize,
    /// Actions the watchdog flagged.
    pub stuck: Vec<ActionId>,
    /// Scheduler counters at the end of the round.
    pub stats: SchedulerStats,
    /// Every animation in start order.
    pub timeline: Vec<TimelineEntry>,
    /// Occupancy after the last step.
    pub final_board: String,
}

struct InFlight {
    ends: Duration,
    token: CompletionToken,
}

/// A [`PieceView`] that plays animations against simulated time.
struct SimView {
    clock: ManualClock,
    timing: ReplayTiming,
    /// Explicit lengths for actions, keyed by action id.
    durations: BTreeMap<ActionId, u64>,
    in_flight: Vec<InFlight>,
    timeline: Vec<TimelineEntry>,
}

impl SimView {
    fn new(clock: ManualClock, timing: ReplayTiming) -> Self {
        Self {
            clock,
            timing,
            durations: BTreeMap::new(),
            in_flight: Vec::new(),
            timeline: Vec::new(),
        }
    }

    fn start(
        &mut self,
        kind: &str,
        pieces: Vec<PieceId>,
        default_ms: u64,
        token: CompletionToken,
    ) -> Execution {
        let action = token.action_id();
        let duration_ms = self.durations.remove(&action).unwrap_or(default_ms);
        let now = self.clock.now();
        self.timeline.push(TimelineEntry {
            at_ms: millis(now),
            action,
            kind: kind.to_owned(),
            pieces,
            duration_ms,
        });
        if duration_ms == 0 {
            return Execution::Completed;
        }
        self.in_flight.push(InFlight {
            ends: now + Duration::from_millis(duration_ms),
            token,
        });
        Execution::Waiting
    }

    fn next_end(&self) -> Option<Duration> {
        self.in_flight.iter().map(|f| f.ends).min()
    }

    /// Complete every animation that has ended by `now`.
    fn finish_until(&mut self, now: Duration) -> usize {
        let (done, running): (Vec<_>, Vec<_>) =
            self.in_flight.drain(..).partition(|f| f.ends <= now);
        self.in_flight = running;
        let count = done.len();
        for flight in done {
            flight.token.complete();
        }
        count
    }
}

impl PieceView for SimView {
    fn piece_created(
        &mut self,
        piece: &Piece,
        _tick: Tick,
        token: CompletionToken,
    ) -> Result<Execution, ActionError> {
        let ms = self.timing.create_ms;
        Ok(self.start("created", vec![piece.piece_id], ms, token))
    }

    fn piece_updated(
        &mut self,
        old: &Piece,
        new: &Piece,
        _tick: Tick,
        token: CompletionToken,
    ) -> Result<Execution, ActionError> {
        let tiles = u64::from(old.tile().distance(new.tile()));
        let ms = tiles * self.timing.move_ms_per_tile;
        Ok(self.start("moved", vec![old.piece_id], ms, token))
    }

    fn piece_removed(
        &mut self,
        piece: &Piece,
        _tick: Tick,
        token: CompletionToken,
    ) -> Result<Execution, ActionError> {
        let ms = self.timing.remove_ms;
        Ok(self.start("removed", vec![piece.piece_id], ms, token))
    }

    fn effect(
        &mut self,
        effect: &str,
        pieces: &[PieceId],
        token: CompletionToken,
    ) -> Result<Execution, ActionError> {
        let ms = self.timing.effect_ms;
        Ok(self.start(effect, pieces.to_vec(), ms, token))
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// A round in progress.
pub struct Replay {
    board: Board,
    pieces: BTreeMap<PieceId, Piece>,
    clock: ManualClock,
    scheduler: ActionScheduler<SimView>,
    view: SimView,
    feed: PieceFeed,
    calculator: MoveSetCalculator,
    report: ReplayReport,
}

impl Replay {
    /// Build the board, shadow the starting pieces and queue their
    /// entrance animations.
    pub fn new(scenario: &Scenario, config: SchedulerConfig) -> Result<Self, ScenarioError> {
        scenario.validate()?;
        let mut board = generate_board(&scenario.generator)?;
        board.shadow_pieces(&scenario.pieces);

        let clock = ManualClock::new();
        let mut replay = Self {
            board,
            pieces: BTreeMap::new(),
            clock: clock.clone(),
            scheduler: ActionScheduler::with_clock(config, clock.clone()),
            view: SimView::new(clock, scenario.timing),
            feed: PieceFeed::new(),
            calculator: MoveSetCalculator::new(),
            report: ReplayReport::default(),
        };
        for piece in &scenario.pieces {
            replay.pieces.insert(piece.piece_id, piece.clone());
            replay
                .feed
                .piece_created(&mut replay.scheduler, piece.clone(), 0);
        }
        replay.pump();
        Ok(replay)
    }

    /// The board as currently shadowed.
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The piece with the given id, if still on the board.
    #[must_use]
    pub fn piece(&self, piece_id: PieceId) -> Option<&Piece> {
        self.pieces.get(&piece_id)
    }

    /// Run one script step. `index` is only used in error messages.
    pub fn step(&mut self, index: usize, step: &ScriptStep) -> Result<(), ScenarioError> {
        self.report.steps += 1;
        match step {
            ScriptStep::Tick(tick) => self.feed.set_tick(*tick),
            ScriptStep::Wait(ms) => {
                let until = self.clock.now() + Duration::from_millis(*ms);
                self.advance_to(until);
            }
            ScriptStep::Add(piece) => {
                let event = PieceEvent::Added {
                    piece: piece.clone(),
                    tick: self.feed.tick(),
                };
                event.apply(&mut self.board);
                self.pieces.insert(piece.piece_id, piece.clone());
                self.feed.submit(&mut self.scheduler, event);
            }
            ScriptStep::Move { piece, x, y } => self.move_piece(index, *piece, Tile::new(*x, *y))?,
            ScriptStep::Shoot { shooter, target } => self.shoot(index, *shooter, *target)?,
            ScriptStep::Remove(piece) => {
                let gone = self
                    .pieces
                    .remove(piece)
                    .ok_or(ScenarioError::UnknownPiece {
                        step: index,
                        piece: *piece,
                    })?;
                let event = PieceEvent::Removed {
                    piece: gone,
                    tick: self.feed.tick(),
                };
                event.apply(&mut self.board);
                self.feed.submit(&mut self.scheduler, event);
            }
            ScriptStep::Effect {
                name,
                pieces,
                waiters,
                bounds,
                duration_ms,
            } => {
                let mut effect = EffectAction::new(name.clone())
                    .affecting(pieces.iter().copied())
                    .waiting_on(waiters.iter().copied());
                if let Some(bounds) = bounds {
                    effect = effect.with_bounds(*bounds);
                }
                let id = effect.submit(&mut self.scheduler);
                if let Some(ms) = duration_ms {
                    self.view.durations.insert(id, *ms);
                }
            }
        }
        self.pump();
        Ok(())
    }

    fn known(&self, index: usize, piece: PieceId) -> Result<&Piece, ScenarioError> {
        self.pieces
            .get(&piece)
            .ok_or(ScenarioError::UnknownPiece { step: index, piece })
    }

    fn move_piece(&mut self, index: usize, piece: PieceId, to: Tile) -> Result<(), ScenarioError> {
        let old = self.known(index, piece)?.clone();
        let set = self.calculator.compute_moves(&self.board, &old, false);
        if !set.can_move_to(to) {
            tracing::warn!(piece, x = to.x, y = to.y, "Illegal move skipped");
            self.report.illegal_moves += 1;
            return Ok(());
        }

        let new = old.clone().at(to.x, to.y);
        let steps = compute_path(&self.board, old.tile(), &new)
            .map_or(0, |path| path.len().saturating_sub(1));
        let event = PieceEvent::Updated {
            old,
            new: new.clone(),
            tick: self.feed.tick(),
        };
        event.apply(&mut self.board);
        self.pieces.insert(piece, new);
        let id = self.feed.submit(&mut self.scheduler, event);
        let per_tile = self.view.timing.move_ms_per_tile;
        self.view.durations.insert(id, steps as u64 * per_tile);
        Ok(())
    }

    fn shoot(
        &mut self,
        index: usize,
        shooter: PieceId,
        target: PieceId,
    ) -> Result<(), ScenarioError> {
        let from = self.known(index, shooter)?.clone();
        let at = self.known(index, target)?.tile();
        let reach = compute_attacks(
            &self.board,
            i32::from(from.min_fire_distance),
            i32::from(from.max_fire_distance),
            from.x,
            from.y,
        );
        if !reach.contains_tile(at) {
            tracing::warn!(shooter, target, "Target out of range");
            self.report.missed_shots += 1;
            return Ok(());
        }
        EffectAction::new("shot")
            .affecting([target])
            .waiting_on([shooter])
            .with_bounds(Rect::tile(at))
            .submit(&mut self.scheduler);
        Ok(())
    }

    fn pump(&mut self) {
        self.scheduler.pump(&mut self.view);
        self.report.max_executing = self.report.max_executing.max(self.scheduler.executing_len());
    }

    /// Move simulated time forward to `until`, ending animations in order.
    pub fn advance_to(&mut self, until: Duration) {
        while let Some(end) = self.view.next_end().filter(|&end| end <= until) {
            self.clock.set(end);
            let stuck = self.scheduler.check_watchdog();
            self.report.stuck.extend(stuck);
            self.view.finish_until(end);
            self.pump();
        }
        self.clock.set(until.max(self.clock.now()));
        let stuck = self.scheduler.check_watchdog();
        self.report.stuck.extend(stuck);
    }

    /// Let every remaining animation finish and produce the report.
    #[must_use]
    pub fn finish(mut self) -> ReplayReport {
        while let Some(end) = self.view.next_end() {
            self.advance_to(end);
        }
        if !self.scheduler.is_idle() {
            tracing::warn!(scheduler = ?self.scheduler, "Replay ended with actions outstanding");
        }
        self.report.elapsed_ms = millis(self.clock.now());
        self.report.stats = *self.scheduler.stats();
        self.report.timeline = std::mem::take(&mut self.view.timeline);
        self.report.final_board = self.board.render_occupancy(None);
        tracing::info!(
            steps = self.report.steps,
            elapsed_ms = self.report.elapsed_ms,
            completed = self.report.stats.completed,
            "Replay finished"
        );
        self.report
    }
}

/// Replay a whole scenario.
pub fn replay(scenario: &Scenario, config: SchedulerConfig) -> Result<ReplayReport, ScenarioError> {
    let mut round = Replay::new(scenario, config)?;
    for (index, step) in scenario.script.iter().enumerate() {
        round.step(index, step)?;
    }
    Ok(round.finish())
}
