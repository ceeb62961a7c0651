use crate::*;
pub use random::*;

mod random;

pub trait LayoutGenerator {
    fn generate(self, config: GameConfig) -> MineLayout;
}

/// How much of the first revealed tile's surroundings is kept free of mines.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StartTile {
    Random,
    SimpleSafe,
    #[default]
    AlwaysZero,
}
