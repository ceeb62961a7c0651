use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::*;

/// What a revealed tile still demands of its unknown neighbors, derived fresh from the board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub clue: Position,
    /// Tile number minus flagged neighbors; negative when over-flagged.
    pub required_mines: i16,
    /// Hidden, unflagged neighbors.
    pub unknown_neighbors: Neighbors,
}

/// Processing order of a revealed tile, lower first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriorityClass {
    /// No mines left to find: every unknown neighbor is safe.
    Satisfied,
    /// As many mines left as unknown neighbors: every unknown neighbor is a mine.
    Satisfiable,
    Underdetermined,
}

impl PriorityClass {
    pub const fn is_actionable(self) -> bool {
        matches!(self, Self::Satisfied | Self::Satisfiable)
    }
}

/// A clue that no assignment of its unknown neighbors can satisfy, usually after a wrong flag.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("Clue at {clue:?} needs {required_mines} mines among {available} unknown neighbors")]
pub struct InconsistentConstraint {
    pub clue: Position,
    pub required_mines: i16,
    pub available: usize,
}

/// Constraint of the tile at `pos`, or `None` when it is not revealed or has nothing left to decide.
pub fn extract(board: &impl BoardView, pos: Position) -> Option<Constraint> {
    let count = board.state_of(pos).count()?;

    let mut flagged = 0i16;
    let mut unknown_neighbors = Neighbors::new();
    for &neighbor in board.neighbors_of(pos) {
        match board.state_of(neighbor) {
            TileState::Flagged => flagged += 1,
            TileState::Hidden => unknown_neighbors.push(neighbor),
            TileState::Revealed(_) => {}
        }
    }

    if unknown_neighbors.is_empty() {
        return None;
    }

    Some(Constraint {
        clue: pos,
        required_mines: i16::from(count) - flagged,
        unknown_neighbors,
    })
}

pub fn classify(
    constraint: &Constraint,
) -> core::result::Result<PriorityClass, InconsistentConstraint> {
    let required = constraint.required_mines;
    let available = constraint.unknown_neighbors.len();

    if required < 0 || required as usize > available {
        return Err(InconsistentConstraint {
            clue: constraint.clue,
            required_mines: required,
            available,
        });
    }

    Ok(if required == 0 {
        PriorityClass::Satisfied
    } else if required as usize == available {
        PriorityClass::Satisfiable
    } else {
        PriorityClass::Underdetermined
    })
}
