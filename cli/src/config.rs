use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sweepbot_core::{CellCount, Coord, Difficulty, GameConfig, SolverConfig, StartTile};

use crate::Args;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Local deduction with a guess when stuck
    #[default]
    Ai,
    /// Reveal uniformly random hidden tiles
    Random,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Text,
    Json,
}

/// Board section of the config file. Either a preset or all three of `rows`, `cols`, `mines`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoardSection {
    pub difficulty: Option<Difficulty>,
    pub rows: Option<Coord>,
    pub cols: Option<Coord>,
    pub mines: Option<CellCount>,
    pub start_tile: StartTile,
}

/// Optional TOML settings file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub seed: Option<u64>,
    pub mode: Option<Mode>,
    pub format: Option<Format>,
    pub board: BoardSection,
    pub solver: SolverConfig,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Everything a run needs, flags merged over the config file.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub game: GameConfig,
    pub start_tile: StartTile,
    pub seed: u64,
    pub mode: Mode,
    pub format: Format,
    /// Per game the seed is offset by the game seed.
    pub solver: SolverConfig,
}

impl Settings {
    pub fn resolve(args: &Args, file: FileConfig) -> Result<Self> {
        let game = match (args.difficulty, args.rows, args.cols, args.mines) {
            (_, Some(rows), Some(cols), Some(mines)) => custom_config(rows, cols, mines)?,
            (Some(preset), ..) => Difficulty::from(preset).config(),
            _ => file_game_config(&file.board)?,
        };

        let mut solver = file.solver;
        if args.no_chord {
            solver.prefer_chord = false;
        }

        Ok(Self {
            game,
            start_tile: file.board.start_tile,
            seed: args.seed.or(file.seed).unwrap_or_else(time_seed),
            mode: args.mode.or(file.mode).unwrap_or_default(),
            format: args.format.or(file.format).unwrap_or_default(),
            solver,
        })
    }
}

fn file_game_config(board: &BoardSection) -> Result<GameConfig> {
    match (board.difficulty, board.rows, board.cols, board.mines) {
        (Some(_), Some(_), ..) | (Some(_), _, Some(_), _) | (Some(_), .., Some(_)) => {
            bail!("board: set either difficulty or rows/cols/mines, not both")
        }
        (Some(difficulty), None, None, None) => Ok(difficulty.config()),
        (None, Some(rows), Some(cols), Some(mines)) => custom_config(rows, cols, mines),
        (None, None, None, None) => Ok(GameConfig::default()),
        (None, ..) => bail!("board: rows, cols and mines must be given together"),
    }
}

fn custom_config(rows: Coord, cols: Coord, mines: CellCount) -> Result<GameConfig> {
    GameConfig::try_new((rows, cols), mines)
        .with_context(|| format!("board {rows}x{cols} with {mines} mines"))
}

fn time_seed() -> u64 {
    web_time::SystemTime::now()
        .duration_since(web_time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}
