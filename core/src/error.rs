use thiserror::Error;

use crate::{CycleReport, Position};

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Too many mines")]
    TooManyMines,
    #[error("Game already ended, no new moves are accepted")]
    AlreadyEnded,
    #[error("Chord requires a revealed tile whose flagged neighbors match its number")]
    ChordPrecondition,
}

pub type Result<T> = core::result::Result<T, GameError>;

/// Failures surfaced by the deduction driver to its caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    /// `report` holds the actions of the losing cycle, the fatal one last.
    #[error("Revealed a mine at {position:?}")]
    MineHit {
        position: Position,
        report: CycleReport,
    },
    #[error("No hidden tile left to reveal but the game is not won")]
    Exhausted,
    #[error("Solver stopped after a lost game, reset it before the next game")]
    Halted,
    #[error("Board rejected an action the solver considered valid: {0}")]
    ContractViolation(GameError),
}

pub type SolverResult<T> = core::result::Result<T, SolverError>;
