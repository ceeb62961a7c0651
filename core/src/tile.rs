use serde::{Deserialize, Serialize};

/// Player-visible state of a single tile.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileState {
    #[default]
    Hidden,
    Revealed(u8),
    Flagged,
}

impl TileState {
    pub const fn is_hidden(self) -> bool {
        matches!(self, Self::Hidden)
    }

    pub const fn is_flagged(self) -> bool {
        matches!(self, Self::Flagged)
    }

    /// Adjacent-mine count, only defined once revealed.
    pub const fn count(self) -> Option<u8> {
        match self {
            Self::Revealed(count) => Some(count),
            _ => None,
        }
    }

    /// A revealed tile showing a number from 1 to 8.
    pub const fn is_numbered(self) -> bool {
        matches!(self, Self::Revealed(count) if count > 0)
    }
}
