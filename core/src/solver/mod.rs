//! Deduction driver: one decision cycle per call, local deductions first, a single guess when
//! nothing certain is left.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use core::mem;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;
pub use guess::*;
pub use queue::*;

mod guess;
mod queue;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Seed of the guess source.
    pub seed: u64,
    pub guess_policy: GuessPolicy,
    /// Open the neighbors of a satisfied tile with one chord when more than one is unknown.
    pub prefer_chord: bool,
    pub opening: Opening,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            guess_policy: GuessPolicy::default(),
            prefer_chord: true,
            opening: Opening::default(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Reveal,
    Flag,
    Chord,
    /// Reveal chosen without certainty.
    Guess,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub position: Position,
}

impl Action {
    pub const fn new(kind: ActionKind, position: Position) -> Self {
        Self { kind, position }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    Inconsistent(InconsistentConstraint),
    Underdetermined,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skipped {
    pub position: Position,
    pub reason: SkipReason,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleOutcome {
    /// At least one certain deduction was applied.
    #[default]
    Progress,
    /// Deduction stalled and one tile was revealed at random.
    Guessed(Position),
    /// Corner opening played on a board with nothing revealed.
    Opened,
    Won,
    Cancelled,
    /// The action on this tile hit a mine.
    Lost(Position),
}

/// What a single decision cycle did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    pub actions: Vec<Action>,
    /// Tiles still waiting at the end of the cycle, in row-major order.
    pub skipped: Vec<Skipped>,
    pub outcome: CycleOutcome,
}

impl CycleReport {
    pub fn count(&self, kind: ActionKind) -> usize {
        self.actions
            .iter()
            .filter(|action| action.kind == kind)
            .count()
    }
}

/// Bookkeeping of the cycle in flight.
#[derive(Default)]
struct Cycle {
    actions: Vec<Action>,
    skipped: BTreeMap<Position, SkipReason>,
}

impl Cycle {
    fn act(&mut self, kind: ActionKind, position: Position) {
        log::debug!("{kind:?} {position:?}");
        self.actions.push(Action::new(kind, position));
    }

    fn skip(&mut self, position: Position, reason: SkipReason) {
        self.skipped.insert(position, reason);
    }

    fn inconsistent(&mut self, inconsistent: InconsistentConstraint) {
        log::warn!("{inconsistent}, waiting for a neighbor to change");
        self.skip(inconsistent.clue, SkipReason::Inconsistent(inconsistent));
    }

    fn finish(self, outcome: CycleOutcome) -> CycleReport {
        CycleReport {
            actions: self.actions,
            skipped: self
                .skipped
                .into_iter()
                .map(|(position, reason)| Skipped { position, reason })
                .collect(),
            outcome,
        }
    }
}

/// Plays a board one cycle at a time through [`BoardActions`].
///
/// The board is borrowed per call only. Everything derived from it is rebuilt at the start of
/// each cycle, so the board may change freely between calls.
#[derive(Clone, Debug)]
pub struct Solver {
    config: SolverConfig,
    rng: SmallRng,
    queue: WorkQueue,
    known_revealed: BTreeSet<Position>,
    halted: bool,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(config.seed),
            queue: WorkQueue::new(),
            known_revealed: BTreeSet::new(),
            halted: false,
        }
    }

    pub fn config(&self) -> SolverConfig {
        self.config
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Prepares for a new game. The guess source keeps running.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.known_revealed.clear();
        self.halted = false;
    }

    /// Runs one decision cycle.
    pub fn think<B: BoardActions>(&mut self, board: &mut B) -> SolverResult<CycleReport> {
        self.think_until(board, || false)
    }

    /// Runs one decision cycle, checking `should_stop` before each queued tile.
    pub fn think_until<B: BoardActions>(
        &mut self,
        board: &mut B,
        mut should_stop: impl FnMut() -> bool,
    ) -> SolverResult<CycleReport> {
        if self.halted {
            return Err(SolverError::Halted);
        }
        match board.status() {
            GameStatus::Won => return Ok(Cycle::default().finish(CycleOutcome::Won)),
            GameStatus::Lost => {
                self.halted = true;
                return Err(SolverError::Halted);
            }
            GameStatus::Ready | GameStatus::Playing => {}
        }

        let mut cycle = Cycle::default();
        self.scan(board, &mut cycle);

        if self.config.opening == Opening::Corners && self.known_revealed.is_empty() {
            if should_stop() {
                return Ok(cycle.finish(CycleOutcome::Cancelled));
            }
            return self.open_corners(board, cycle);
        }

        let mut progressed = false;
        while let Some((pos, hint)) = self.queue.pop_best() {
            if should_stop() {
                log::debug!("cycle cancelled");
                return Ok(cycle.finish(CycleOutcome::Cancelled));
            }

            let Some(constraint) = extract(board, pos) else {
                self.queue.mark_resolved(pos);
                continue;
            };
            let class = match classify(&constraint) {
                Ok(class) => class,
                Err(inconsistent) => {
                    cycle.inconsistent(inconsistent);
                    continue;
                }
            };
            log::trace!("{pos:?} {class:?} (queued as {hint:?})");

            if !class.is_actionable() {
                cycle.skip(pos, SkipReason::Underdetermined);
                continue;
            }
            if class == PriorityClass::Satisfied {
                self.open_safe(board, &constraint, &mut cycle)?;
            } else {
                self.flag_mines(board, &constraint, &mut cycle)?;
            }
            cycle.skipped.remove(&pos);
            progressed = true;

            if board.status().is_finished() {
                break;
            }
        }

        if board.status() == GameStatus::Won {
            return Ok(cycle.finish(CycleOutcome::Won));
        }
        if progressed {
            return Ok(cycle.finish(CycleOutcome::Progress));
        }

        if should_stop() {
            return Ok(cycle.finish(CycleOutcome::Cancelled));
        }
        let guess = pick_guess(board, self.config.guess_policy, &mut self.rng)
            .ok_or(SolverError::Exhausted)?;
        self.reveal(board, ActionKind::Guess, guess, &mut cycle)?;

        let outcome = if board.status() == GameStatus::Won {
            CycleOutcome::Won
        } else {
            CycleOutcome::Guessed(guess)
        };
        Ok(cycle.finish(outcome))
    }

    /// Reveals a few corners, then random tiles until enough of the board is open.
    fn open_corners<B: BoardActions>(
        &mut self,
        board: &mut B,
        mut cycle: Cycle,
    ) -> SolverResult<CycleReport> {
        for pos in opening_corners(board.size(), &mut self.rng) {
            if board.state_of(pos).is_hidden() && board.status().accepts_moves() {
                self.reveal(board, ActionKind::Guess, pos, &mut cycle)?;
            }
        }

        while board.status().accepts_moves() && revealed_tiles(board) < Opening::MIN_REVEALED {
            let Some(pos) = pick_guess(board, GuessPolicy::Uniform, &mut self.rng) else {
                break;
            };
            self.reveal(board, ActionKind::Guess, pos, &mut cycle)?;
        }
        if cycle.actions.is_empty() {
            return Err(SolverError::Exhausted);
        }

        let outcome = if board.status() == GameStatus::Won {
            CycleOutcome::Won
        } else {
            CycleOutcome::Opened
        };
        Ok(cycle.finish(outcome))
    }

    /// Rebuilds the queue from the numbered tiles currently on the board.
    fn scan(&mut self, board: &impl BoardView, cycle: &mut Cycle) {
        self.queue.clear();
        self.known_revealed = iter_positions(board.size())
            .filter(|&pos| board.state_of(pos).count().is_some())
            .collect();

        for pos in board.all_revealed_numbered_tiles() {
            if let Some(Err(inconsistent)) = self.queue.requeue(board, pos) {
                cycle.inconsistent(inconsistent);
            }
        }
    }

    fn open_safe<B: BoardActions>(
        &mut self,
        board: &mut B,
        constraint: &Constraint,
        cycle: &mut Cycle,
    ) -> SolverResult<()> {
        if self.config.prefer_chord && constraint.unknown_neighbors.len() > 1 {
            let outcome = board
                .chord(constraint.clue)
                .map_err(SolverError::ContractViolation)?;
            cycle.act(ActionKind::Chord, constraint.clue);
            if outcome.is_mine() {
                return Err(self.halt(constraint.clue, cycle));
            }
        } else {
            for &pos in &constraint.unknown_neighbors {
                // an earlier reveal may have cascaded over it
                if board.state_of(pos).is_hidden() {
                    self.reveal(board, ActionKind::Reveal, pos, cycle)?;
                }
            }
        }

        self.absorb_reveals(board, cycle);
        Ok(())
    }

    fn flag_mines<B: BoardActions>(
        &mut self,
        board: &mut B,
        constraint: &Constraint,
        cycle: &mut Cycle,
    ) -> SolverResult<()> {
        for &pos in &constraint.unknown_neighbors {
            match board.flag(pos).map_err(SolverError::ContractViolation)? {
                FlagOutcome::Placed => cycle.act(ActionKind::Flag, pos),
                FlagOutcome::AlreadyFlagged => {}
                FlagOutcome::NotHidden => log::warn!("{pos:?} was revealed before it was flagged"),
            }
        }

        for &pos in &constraint.unknown_neighbors {
            for inconsistent in self.queue.requeue_neighbors_of(board, pos) {
                cycle.inconsistent(inconsistent);
            }
        }
        Ok(())
    }

    fn reveal<B: BoardActions>(
        &mut self,
        board: &mut B,
        kind: ActionKind,
        pos: Position,
        cycle: &mut Cycle,
    ) -> SolverResult<()> {
        let outcome = board
            .reveal(pos)
            .map_err(SolverError::ContractViolation)?;
        cycle.act(kind, pos);
        if outcome.is_mine() {
            return Err(self.halt(pos, cycle));
        }
        Ok(())
    }

    /// Finds tiles opened since the last look, cascades included, and requeues around them.
    fn absorb_reveals(&mut self, board: &impl BoardView, cycle: &mut Cycle) {
        let opened: Vec<Position> = iter_positions(board.size())
            .filter(|&pos| board.state_of(pos).count().is_some())
            .filter(|&pos| self.known_revealed.insert(pos))
            .collect();
        log::trace!("{} tiles opened", opened.len());

        for &pos in &opened {
            if let Some(Err(inconsistent)) = self.queue.requeue(board, pos) {
                cycle.inconsistent(inconsistent);
            }
            for inconsistent in self.queue.requeue_neighbors_of(board, pos) {
                cycle.inconsistent(inconsistent);
            }
        }
    }

    fn halt(&mut self, position: Position, cycle: &mut Cycle) -> SolverError {
        log::debug!("mine hit at {position:?}, halting");
        self.halted = true;
        SolverError::MineHit {
            position,
            report: mem::take(cycle).finish(CycleOutcome::Lost(position)),
        }
    }
}

fn revealed_tiles(board: &impl BoardView) -> usize {
    iter_positions(board.size())
        .filter(|&pos| board.state_of(pos).count().is_some())
        .count()
}
