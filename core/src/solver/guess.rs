use alloc::vec::Vec;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

/// How the fallback guess is picked once deduction has stalled.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GuessPolicy {
    /// Prefer tiles away from every numbered tile, they are least constrained.
    #[default]
    OpenAreaFirst,
    Uniform,
}

/// How the first cycle on a board with nothing revealed is played.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Opening {
    /// One guess picked by the [`GuessPolicy`].
    #[default]
    Single,
    /// Two to four corners in random order, then random tiles until
    /// [`Opening::MIN_REVEALED`] tiles are open.
    Corners,
}

impl Opening {
    pub const MIN_REVEALED: usize = 5;
}

/// Shuffled corners of a board of `size`, cut to two to four of them.
pub fn opening_corners(size: Coord2, rng: &mut impl Rng) -> Vec<Position> {
    let (last_row, last_col) = (size.0.saturating_sub(1), size.1.saturating_sub(1));
    let mut corners = alloc::vec![
        (0, 0),
        (0, last_col),
        (last_row, 0),
        (last_row, last_col),
    ];
    // thin boards share corners
    corners.sort_unstable();
    corners.dedup();

    corners.shuffle(rng);
    corners.truncate(rng.random_range(2..=4));
    corners
}

/// Picks a hidden, unflagged tile to reveal, or `None` when none is left.
pub fn pick_guess(
    board: &impl BoardView,
    policy: GuessPolicy,
    rng: &mut impl Rng,
) -> Option<Position> {
    let candidates: Vec<Position> = iter_positions(board.size())
        .filter(|&pos| board.state_of(pos).is_hidden())
        .collect();

    let open_area: Vec<Position> = match policy {
        GuessPolicy::OpenAreaFirst => candidates
            .iter()
            .copied()
            .filter(|&pos| board.count_neighbors(pos, TileState::is_numbered) == 0)
            .collect(),
        GuessPolicy::Uniform => Vec::new(),
    };

    let pool = if open_area.is_empty() {
        &candidates
    } else {
        &open_area
    };
    log::trace!(
        "guessing among {} of {} candidates ({:?})",
        pool.len(),
        candidates.len(),
        policy
    );
    pool.choose(rng).copied()
}
