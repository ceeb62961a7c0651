#![no_std]

extern crate alloc;

use core::fmt;
use core::ops::{Index, IndexMut};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use analysis::*;
pub use board::*;
pub use error::*;
pub use generator::*;
pub use interface::*;
pub use solver::*;
pub use tile::*;
pub use types::*;

mod analysis;
mod board;
mod error;
mod generator;
mod interface;
mod solver;
mod tile;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Coord2,
    pub mines: CellCount,
}

impl GameConfig {
    pub const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self { size, mines }
    }

    pub fn new((rows, cols): Coord2, mines: CellCount) -> Self {
        let rows = rows.clamp(1, Coord::MAX);
        let cols = cols.clamp(1, Coord::MAX);
        let mines = mines.clamp(1, mult(rows, cols));
        Self::new_unchecked((rows, cols), mines)
    }

    /// Exact configuration, rejecting what [`GameConfig::new`] would clamp.
    pub fn try_new((rows, cols): Coord2, mines: CellCount) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(GameError::InvalidCoords);
        }
        if mines > mult(rows, cols) {
            return Err(GameError::TooManyMines);
        }
        Ok(Self::new_unchecked((rows, cols), mines))
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Difficulty::default().config()
    }
}

/// Board presets, sizes given as `(rows, cols)`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Expert,
    Desktop,
    Mobile,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Self::Beginner,
        Self::Intermediate,
        Self::Expert,
        Self::Desktop,
        Self::Mobile,
    ];

    pub const fn config(self) -> GameConfig {
        match self {
            Self::Beginner => GameConfig::new_unchecked((9, 9), 10),
            Self::Intermediate => GameConfig::new_unchecked((16, 16), 40),
            Self::Expert => GameConfig::new_unchecked((16, 30), 99),
            Self::Desktop => GameConfig::new_unchecked((16, 25), 80),
            Self::Mobile => GameConfig::new_unchecked((15, 10), 30),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MineLayout {
    mine_mask: Array2<bool>,
    mine_count: CellCount,
}

impl MineLayout {
    pub fn from_mine_mask(mine_mask: Array2<bool>) -> Self {
        let mine_count = mine_mask.iter().filter(|&&is_mine| is_mine).count();
        Self {
            mine_mask,
            mine_count: mine_count.try_into().unwrap_or(CellCount::MAX),
        }
    }

    pub fn from_mine_coords(size: Coord2, mine_coords: &[Position]) -> Result<Self> {
        let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());

        for &coords in mine_coords {
            if coords.0 >= size.0 || coords.1 >= size.1 {
                return Err(GameError::InvalidCoords);
            }
            mine_mask[coords.to_nd_index()] = true;
        }

        Ok(Self::from_mine_mask(mine_mask))
    }

    pub fn game_config(&self) -> GameConfig {
        GameConfig::new_unchecked(self.size(), self.mine_count)
    }

    pub fn size(&self) -> Coord2 {
        let (rows, cols) = self.mine_mask.dim();
        (
            rows.try_into().unwrap_or(Coord::MAX),
            cols.try_into().unwrap_or(Coord::MAX),
        )
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    pub fn total_cells(&self) -> CellCount {
        self.mine_mask.len().try_into().unwrap_or(CellCount::MAX)
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn contains_mine(&self, coords: Position) -> bool {
        self[coords]
    }

    pub fn adjacent_mine_count(&self, coords: Position) -> u8 {
        // at most eight neighbors, always fits
        self.mine_mask
            .iter_neighbors(coords)
            .filter(|&pos| self[pos])
            .count() as u8
    }
}

impl Index<Position> for MineLayout {
    type Output = bool;

    fn index(&self, pos: Position) -> &Self::Output {
        &self.mine_mask[pos.to_nd_index()]
    }
}

impl IndexMut<Position> for MineLayout {
    fn index_mut(&mut self, pos: Position) -> &mut Self::Output {
        &mut self.mine_mask[pos.to_nd_index()]
    }
}

/// Lifecycle of a single game.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// No tile revealed yet, mines may not be placed.
    #[default]
    Ready,
    Playing,
    Won,
    Lost,
}

impl GameStatus {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }

    pub const fn accepts_moves(self) -> bool {
        matches!(self, Self::Ready | Self::Playing)
    }
}

/// Result of revealing a tile, or of a chord.
///
/// For a single reveal `Safe` carries the adjacent-mine count of the tile. For a chord it carries
/// the number of neighbors opened directly, cascades excluded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevealOutcome {
    Safe(u8),
    Mine,
    AlreadyRevealed,
}

impl RevealOutcome {
    pub const fn is_mine(self) -> bool {
        matches!(self, Self::Mine)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagOutcome {
    Placed,
    AlreadyFlagged,
    NotHidden,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_clamps_mines_to_board() {
        let config = GameConfig::new((0, 3), 100);
        assert_eq!(config.size, (1, 3));
        assert_eq!(config.mines, 3);
    }

    #[test]
    fn exact_config_rejects_what_new_clamps() {
        assert_eq!(GameConfig::try_new((3, 3), 9), Ok(GameConfig::new_unchecked((3, 3), 9)));
        assert_eq!(GameConfig::try_new((3, 3), 10), Err(GameError::TooManyMines));
        assert_eq!(GameConfig::try_new((0, 3), 1), Err(GameError::InvalidCoords));
    }

    #[test]
    fn layout_counts_adjacent_mines() {
        let layout = MineLayout::from_mine_coords((3, 3), &[(0, 0), (2, 2)]).unwrap();
        assert_eq!(layout.mine_count(), 2);
        assert_eq!(layout.safe_cell_count(), 7);
        assert_eq!(layout.adjacent_mine_count((1, 1)), 2);
        assert_eq!(layout.adjacent_mine_count((0, 2)), 0);
    }

    #[test]
    fn layout_rejects_out_of_range_mines() {
        let layout = MineLayout::from_mine_coords((2, 2), &[(2, 0)]);
        assert_eq!(layout, Err(GameError::InvalidCoords));
    }

    #[test]
    fn presets_fit_their_boards() {
        for difficulty in Difficulty::ALL {
            let config = difficulty.config();
            assert!(config.mines < config.total_cells(), "{difficulty}");
        }
    }
}
