//! The contract between the solver and whatever owns the board.
//!
//! The solver reads the board through [`BoardView`] and mutates it only through [`BoardActions`].
//! It borrows the board for a single decision cycle and never keeps a handle across cycles.

use alloc::vec::Vec;

use crate::*;

/// Read-only queries on the observed board.
pub trait BoardView {
    /// Board size as `(rows, cols)`.
    fn size(&self) -> Coord2;

    fn status(&self) -> GameStatus;

    fn state_of(&self, pos: Position) -> TileState;

    /// Static adjacency, computed once when the board is built.
    fn neighbors_of(&self, pos: Position) -> &[Position];

    /// Revealed tiles showing a number from 1 to 8, in row-major order.
    fn all_revealed_numbered_tiles(&self) -> Vec<Position> {
        iter_positions(self.size())
            .filter(|&pos| self.state_of(pos).is_numbered())
            .collect()
    }

    fn count_neighbors(&self, pos: Position, predicate: impl Fn(TileState) -> bool) -> usize
    where
        Self: Sized,
    {
        self.neighbors_of(pos)
            .iter()
            .filter(|&&neighbor| predicate(self.state_of(neighbor)))
            .count()
    }
}

/// The only way the solver changes the board.
pub trait BoardActions: BoardView {
    /// Reveals a hidden tile. Zero tiles cascade; the extra tiles are visible only through later
    /// queries.
    fn reveal(&mut self, pos: Position) -> Result<RevealOutcome>;

    /// Flags a hidden tile. Flagging twice is a no-op reported as [`FlagOutcome::AlreadyFlagged`].
    fn flag(&mut self, pos: Position) -> Result<FlagOutcome>;

    /// Reveals every unflagged hidden neighbor of a revealed tile at once.
    ///
    /// Only defined when the flagged-neighbor count equals the tile's number, callers must check
    /// first. Anything else is [`GameError::ChordPrecondition`].
    fn chord(&mut self, pos: Position) -> Result<RevealOutcome>;
}
