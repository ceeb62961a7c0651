use alloc::vec::Vec;

use super::*;

/// Generation strategy that can optionally try to make the starting tile zero or at least safe, but other than that is
/// purely random.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomLayoutGenerator {
    seed: u64,
    start: Position,
    start_tile: StartTile,
}

impl RandomLayoutGenerator {
    pub fn new(seed: u64, start: Position, start_tile: StartTile) -> Self {
        Self {
            seed,
            start,
            start_tile,
        }
    }

    /// Downgrades the requested start guarantee when the board is too full to honour it.
    fn effective_start_tile(&self, config: &GameConfig) -> StartTile {
        use StartTile::*;

        let total_cells = config.total_cells();
        let protected_zero = 1 + NeighborIter::new(self.start, config.size).count() as CellCount;

        match self.start_tile {
            Random => Random,
            SimpleSafe | AlwaysZero if config.mines + 1 > total_cells => {
                log::warn!("Cannot make start tile safe, fallback to random");
                Random
            }
            SimpleSafe => SimpleSafe,
            AlwaysZero if config.mines + protected_zero > total_cells => {
                log::warn!("Cannot make start tile zero, fallback to simple safe");
                SimpleSafe
            }
            AlwaysZero => AlwaysZero,
        }
    }
}

impl LayoutGenerator for RandomLayoutGenerator {
    fn generate(self, config: GameConfig) -> MineLayout {
        use rand::prelude::*;
        use StartTile::*;

        let total_cells = config.total_cells();

        // optimize for full boards
        if config.mines >= total_cells {
            if config.mines > total_cells {
                log::warn!(
                    "Board already full, generated anyway, requested {} but only fits {}",
                    config.mines,
                    total_cells
                );
            }
            return MineLayout::from_mine_mask(Array2::from_elem(config.size.to_nd_index(), true));
        }

        let mut protected: Array2<bool> = Array2::default(config.size.to_nd_index());
        if config.size.0 > self.start.0 && config.size.1 > self.start.1 {
            match self.effective_start_tile(&config) {
                Random => {}
                SimpleSafe => protected[self.start.to_nd_index()] = true,
                AlwaysZero => {
                    protected[self.start.to_nd_index()] = true;
                    for pos in protected.iter_neighbors(self.start) {
                        protected[pos.to_nd_index()] = true;
                    }
                }
            }
        }

        let candidates: Vec<Position> = iter_positions(config.size)
            .filter(|&pos| !protected[pos.to_nd_index()])
            .collect();
        let amount = usize::from(config.mines).min(candidates.len());

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut mine_mask: Array2<bool> = Array2::default(config.size.to_nd_index());
        for index in rand::seq::index::sample(&mut rng, candidates.len(), amount) {
            mine_mask[candidates[index].to_nd_index()] = true;
        }

        let layout = MineLayout::from_mine_mask(mine_mask);
        // double check mine count
        if layout.mine_count() != config.mines {
            log::warn!(
                "Generated layout count mismatch, actual: {}, requested: {}",
                layout.mine_count(),
                config.mines
            );
        }
        layout
    }
}
