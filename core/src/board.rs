use alloc::collections::{BTreeSet, VecDeque};
use core::num::Saturating;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Where the mines of a board come from.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
enum LayoutSource {
    /// Placed on the first reveal so the opening tile is protected.
    Generated { seed: u64, start_tile: StartTile },
    /// Supplied up front, kept across restarts.
    Fixed,
}

/// Playable board: owns the mines, the visible tile states, and the static neighbor table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    config: GameConfig,
    source: LayoutSource,
    mine_layout: Option<MineLayout>,
    tiles: Array2<TileState>,
    neighbors: Array2<Neighbors>,
    revealed_count: Saturating<CellCount>,
    flagged_count: Saturating<CellCount>,
    status: GameStatus,
    triggered_mine: Option<Position>,
}

impl Board {
    /// Board whose mines are placed on the first reveal, protecting the opening per `start_tile`.
    pub fn new(config: GameConfig, seed: u64, start_tile: StartTile) -> Self {
        Self::build(config, LayoutSource::Generated { seed, start_tile }, None)
    }

    pub fn with_layout(mine_layout: MineLayout) -> Self {
        Self::build(mine_layout.game_config(), LayoutSource::Fixed, Some(mine_layout))
    }

    fn build(config: GameConfig, source: LayoutSource, mine_layout: Option<MineLayout>) -> Self {
        Self {
            config,
            source,
            mine_layout,
            tiles: Array2::default(config.size.to_nd_index()),
            neighbors: neighbor_table(config.size),
            revealed_count: Saturating(0),
            flagged_count: Saturating(0),
            status: GameStatus::Ready,
            triggered_mine: None,
        }
    }

    /// Starts a fresh game on the same board size. A fixed layout is reused; a generated one is
    /// re-rolled with `seed`.
    pub fn restart(&mut self, seed: u64) {
        if let LayoutSource::Generated { start_tile, .. } = self.source {
            self.source = LayoutSource::Generated { seed, start_tile };
            self.mine_layout = None;
        }
        self.tiles.fill(TileState::Hidden);
        self.revealed_count = Saturating(0);
        self.flagged_count = Saturating(0);
        self.status = GameStatus::Ready;
        self.triggered_mine = None;
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    /// Seed of the generated layout, `None` for fixed layouts.
    pub fn seed(&self) -> Option<u64> {
        match self.source {
            LayoutSource::Generated { seed, .. } => Some(seed),
            LayoutSource::Fixed => None,
        }
    }

    pub fn total_mines(&self) -> CellCount {
        self.config.mines
    }

    pub fn mines_left(&self) -> isize {
        (self.config.mines as isize) - (self.flagged_count.0 as isize)
    }

    pub fn revealed_count(&self) -> CellCount {
        self.revealed_count.0
    }

    pub fn flagged_count(&self) -> CellCount {
        self.flagged_count.0
    }

    pub fn triggered_mine(&self) -> Option<Position> {
        self.triggered_mine
    }

    /// Ground truth, `false` everywhere until mines are placed.
    pub fn has_mine_at(&self, pos: Position) -> bool {
        self.mine_layout
            .as_ref()
            .is_some_and(|layout| layout.contains_mine(pos))
    }

    pub fn unflag(&mut self, pos: Position) -> Result<MarkOutcome> {
        let pos = self.validate_coords(pos)?;
        self.check_accepts_moves()?;

        Ok(match self.tiles[pos.to_nd_index()] {
            TileState::Flagged => {
                self.tiles[pos.to_nd_index()] = TileState::Hidden;
                self.flagged_count -= 1;
                MarkOutcome::Changed
            }
            _ => MarkOutcome::NoChange,
        })
    }

    pub fn toggle_flag(&mut self, pos: Position) -> Result<MarkOutcome> {
        match self.flag(pos)? {
            FlagOutcome::Placed => Ok(MarkOutcome::Changed),
            FlagOutcome::AlreadyFlagged => self.unflag(pos),
            FlagOutcome::NotHidden => Ok(MarkOutcome::NoChange),
        }
    }

    fn validate_coords(&self, pos: Position) -> Result<Position> {
        let (rows, cols) = self.config.size;
        if pos.0 < rows && pos.1 < cols {
            Ok(pos)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    fn check_accepts_moves(&self) -> Result<()> {
        if self.status.accepts_moves() {
            Ok(())
        } else {
            Err(GameError::AlreadyEnded)
        }
    }

    /// Takes the layout out of the board, placing mines around `start` if none exist yet. Callers
    /// must put it back.
    fn take_layout(&mut self, start: Position) -> MineLayout {
        let config = self.config;
        self.mine_layout.take().unwrap_or_else(|| match self.source {
            LayoutSource::Generated { seed, start_tile } => {
                log::debug!(
                    "placing {} mines, protecting {:?} ({:?})",
                    config.mines,
                    start,
                    start_tile
                );
                RandomLayoutGenerator::new(seed, start, start_tile).generate(config)
            }
            LayoutSource::Fixed => {
                MineLayout::from_mine_mask(Array2::default(config.size.to_nd_index()))
            }
        })
    }

    fn reveal_single_cell(&mut self, pos: Position) -> RevealOutcome {
        if !self.tiles[pos.to_nd_index()].is_hidden() {
            return RevealOutcome::AlreadyRevealed;
        }

        let layout = self.take_layout(pos);
        let outcome = self.open_tile(pos, &layout);
        self.mine_layout = Some(layout);
        outcome
    }

    fn open_tile(&mut self, pos: Position, layout: &MineLayout) -> RevealOutcome {
        if layout.contains_mine(pos) {
            self.triggered_mine = Some(pos);
            self.status = GameStatus::Lost;
            return RevealOutcome::Mine;
        }

        let adjacent_mines = layout.adjacent_mine_count(pos);
        self.tiles[pos.to_nd_index()] = TileState::Revealed(adjacent_mines);
        self.revealed_count += 1;

        if adjacent_mines == 0 {
            self.cascade_from(pos, layout);
        }

        if self.revealed_count.0 >= layout.safe_cell_count() {
            self.finish_won(layout);
        } else {
            self.status = GameStatus::Playing;
        }

        RevealOutcome::Safe(adjacent_mines)
    }

    /// Breadth-first opening of the zero region around `origin`; flagged tiles are left alone.
    fn cascade_from(&mut self, origin: Position, layout: &MineLayout) {
        let mut visited = BTreeSet::from([origin]);
        let mut to_visit: VecDeque<Position> = self.neighbors[origin.to_nd_index()]
            .iter()
            .copied()
            .filter(|&pos| self.tiles[pos.to_nd_index()].is_hidden())
            .collect();

        while let Some(visit) = to_visit.pop_front() {
            if !visited.insert(visit) || !self.tiles[visit.to_nd_index()].is_hidden() {
                continue;
            }

            let visit_adjacent_mines = layout.adjacent_mine_count(visit);
            self.tiles[visit.to_nd_index()] = TileState::Revealed(visit_adjacent_mines);
            self.revealed_count += 1;

            if visit_adjacent_mines == 0 {
                to_visit.extend(
                    self.neighbors[visit.to_nd_index()]
                        .iter()
                        .copied()
                        .filter(|&pos| self.tiles[pos.to_nd_index()].is_hidden())
                        .filter(|pos| !visited.contains(pos)),
                );
            }
        }
    }

    /// Marks the game won and flags every mine still hidden.
    fn finish_won(&mut self, layout: &MineLayout) {
        self.status = GameStatus::Won;
        for pos in iter_positions(self.config.size) {
            if layout.contains_mine(pos) && self.tiles[pos.to_nd_index()].is_hidden() {
                self.tiles[pos.to_nd_index()] = TileState::Flagged;
                self.flagged_count += 1;
            }
        }
    }

    fn count_flagged_neighbors(&self, pos: Position) -> usize {
        self.count_neighbors(pos, TileState::is_flagged)
    }
}

impl BoardView for Board {
    fn size(&self) -> Coord2 {
        self.config.size
    }

    fn status(&self) -> GameStatus {
        self.status
    }

    fn state_of(&self, pos: Position) -> TileState {
        self.tiles[pos.to_nd_index()]
    }

    fn neighbors_of(&self, pos: Position) -> &[Position] {
        &self.neighbors[pos.to_nd_index()]
    }
}

impl BoardActions for Board {
    fn reveal(&mut self, pos: Position) -> Result<RevealOutcome> {
        let pos = self.validate_coords(pos)?;
        self.check_accepts_moves()?;
        Ok(self.reveal_single_cell(pos))
    }

    fn flag(&mut self, pos: Position) -> Result<FlagOutcome> {
        let pos = self.validate_coords(pos)?;
        self.check_accepts_moves()?;

        Ok(match self.tiles[pos.to_nd_index()] {
            TileState::Hidden => {
                self.tiles[pos.to_nd_index()] = TileState::Flagged;
                self.flagged_count += 1;
                FlagOutcome::Placed
            }
            TileState::Flagged => FlagOutcome::AlreadyFlagged,
            TileState::Revealed(_) => FlagOutcome::NotHidden,
        })
    }

    fn chord(&mut self, pos: Position) -> Result<RevealOutcome> {
        let pos = self.validate_coords(pos)?;
        self.check_accepts_moves()?;

        let TileState::Revealed(count) = self.tiles[pos.to_nd_index()] else {
            return Err(GameError::ChordPrecondition);
        };
        if usize::from(count) != self.count_flagged_neighbors(pos) {
            return Err(GameError::ChordPrecondition);
        }

        let mut opened = 0u8;
        for neighbor in self.neighbors[pos.to_nd_index()].clone() {
            match self.reveal_single_cell(neighbor) {
                RevealOutcome::Mine => return Ok(RevealOutcome::Mine),
                RevealOutcome::Safe(_) => opened += 1,
                RevealOutcome::AlreadyRevealed => {}
            }
            if self.status.is_finished() {
                break;
            }
        }

        Ok(if opened == 0 {
            RevealOutcome::AlreadyRevealed
        } else {
            RevealOutcome::Safe(opened)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(size: Coord2, mines: &[Position]) -> Board {
        Board::with_layout(MineLayout::from_mine_coords(size, mines).unwrap())
    }

    #[test]
    fn reveal_hits_mine_and_sets_triggered_cell() {
        let mut board = board((2, 2), &[(0, 0)]);

        let outcome = board.reveal((0, 0)).unwrap();

        assert_eq!(outcome, RevealOutcome::Mine);
        assert_eq!(board.status(), GameStatus::Lost);
        assert_eq!(board.triggered_mine(), Some((0, 0)));
        assert_eq!(board.reveal((1, 1)), Err(GameError::AlreadyEnded));
    }

    #[test]
    fn reveal_flood_fill_opens_zero_region() {
        let mut board = board((3, 3), &[(2, 2)]);

        let outcome = board.reveal((0, 0)).unwrap();

        assert_eq!(outcome, RevealOutcome::Safe(0));
        assert_eq!(board.status(), GameStatus::Won);
        assert_eq!(board.state_of((0, 0)), TileState::Revealed(0));
        assert_eq!(board.state_of((1, 1)), TileState::Revealed(1));
        assert_eq!(board.state_of((2, 2)), TileState::Flagged);
        assert_eq!(board.revealed_count(), 8);
    }

    #[test]
    fn cascade_stops_at_flags() {
        let mut board = board((1, 4), &[(0, 3)]);
        board.flag((0, 1)).unwrap();

        board.reveal((0, 0)).unwrap();

        assert_eq!(board.state_of((0, 0)), TileState::Revealed(0));
        assert_eq!(board.state_of((0, 1)), TileState::Flagged);
        assert_eq!(board.state_of((0, 2)), TileState::Hidden);
    }

    #[test]
    fn chord_reveal_uses_flagged_neighbors() {
        let mut board = board((3, 3), &[(1, 0), (1, 2)]);

        board.reveal((1, 1)).unwrap();
        board.flag((1, 0)).unwrap();
        board.flag((1, 2)).unwrap();

        let outcome = board.chord((1, 1)).unwrap();

        assert_eq!(outcome, RevealOutcome::Safe(6));
        assert_eq!(board.status(), GameStatus::Won);
        assert_eq!(board.state_of((0, 1)), TileState::Revealed(2));
        assert_eq!(board.state_of((2, 1)), TileState::Revealed(2));
    }

    #[test]
    fn chord_without_matching_flags_is_a_contract_violation() {
        let mut board = board((3, 3), &[(1, 0), (1, 2)]);
        board.reveal((1, 1)).unwrap();
        board.flag((1, 0)).unwrap();

        assert_eq!(board.chord((1, 1)), Err(GameError::ChordPrecondition));
        assert_eq!(board.chord((0, 0)), Err(GameError::ChordPrecondition));
    }

    #[test]
    fn flag_is_idempotent() {
        let mut board = board((2, 2), &[(0, 0)]);

        assert_eq!(board.flag((0, 0)), Ok(FlagOutcome::Placed));
        assert_eq!(board.flag((0, 0)), Ok(FlagOutcome::AlreadyFlagged));
        assert_eq!(board.flagged_count(), 1);
        assert_eq!(board.mines_left(), 0);

        board.reveal((1, 1)).unwrap();
        assert_eq!(board.flag((1, 1)), Ok(FlagOutcome::NotHidden));
    }

    #[test]
    fn toggle_flag_round_trips_to_hidden() {
        let mut board = board((2, 2), &[(0, 0)]);

        assert_eq!(board.toggle_flag((0, 1)), Ok(MarkOutcome::Changed));
        assert_eq!(board.toggle_flag((0, 1)), Ok(MarkOutcome::Changed));
        assert_eq!(board.state_of((0, 1)), TileState::Hidden);
        assert_eq!(board.unflag((0, 1)), Ok(MarkOutcome::NoChange));
    }

    #[test]
    fn revealing_a_flag_changes_nothing() {
        let mut board = board((2, 2), &[(0, 0)]);
        board.flag((0, 0)).unwrap();

        assert_eq!(board.reveal((0, 0)), Ok(RevealOutcome::AlreadyRevealed));
        assert_eq!(board.status(), GameStatus::Ready);
    }

    #[test]
    fn first_reveal_on_generated_board_is_zero() {
        let config = GameConfig::new((9, 9), 10);
        for seed in 0..10 {
            let mut board = Board::new(config, seed, StartTile::AlwaysZero);
            assert_eq!(board.reveal((4, 4)), Ok(RevealOutcome::Safe(0)));
            assert!(board.revealed_count() >= 9);
        }
    }

    #[test]
    fn restart_rerolls_generated_layout() {
        let mut board = Board::new(GameConfig::new((5, 5), 3), 1, StartTile::SimpleSafe);
        board.reveal((0, 0)).unwrap();

        board.restart(2);

        assert_eq!(board.status(), GameStatus::Ready);
        assert_eq!(board.seed(), Some(2));
        assert_eq!(board.revealed_count(), 0);
        assert!(iter_positions((5, 5)).all(|pos| board.state_of(pos) == TileState::Hidden));
    }

    #[test]
    fn invalid_coordinates_are_rejected() {
        let mut board = board((2, 2), &[(0, 0)]);
        assert_eq!(board.reveal((2, 0)), Err(GameError::InvalidCoords));
        assert_eq!(board.flag((0, 5)), Err(GameError::InvalidCoords));
    }

    #[test]
    fn numbered_tiles_are_listed_in_row_major_order() {
        let mut board = board((3, 3), &[(0, 0)]);
        board.reveal((2, 2)).unwrap();

        assert_eq!(board.all_revealed_numbered_tiles(), [(0, 1), (1, 0), (1, 1)]);
    }
}
