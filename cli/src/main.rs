use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use sweepbot_core::{CellCount, Coord, Difficulty};

use crate::config::{FileConfig, Format, Mode, Settings};

mod config;
mod game;
mod report;

#[derive(Parser, Debug)]
#[command(version, about = "Plays Minesweeper by local deduction", long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,

    /// TOML file with default settings, flags take precedence
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// Board preset
    #[arg(short, long, value_enum, conflicts_with_all = ["rows", "cols", "mines"])]
    difficulty: Option<Preset>,

    #[arg(long, requires_all = ["cols", "mines"])]
    rows: Option<Coord>,

    #[arg(long, requires_all = ["rows", "mines"])]
    cols: Option<Coord>,

    #[arg(long, requires_all = ["rows", "cols"])]
    mines: Option<CellCount>,

    /// Who picks the moves
    #[arg(short, long, value_enum)]
    mode: Option<Mode>,

    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Reveal the neighbors of a satisfied tile one by one instead of chording
    #[arg(long)]
    no_chord: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Play a single game and print the final board
    Play,
    /// Play many games and print the win/loss record
    Simulate {
        #[arg(short = 'n', long, default_value_t = 100)]
        games: usize,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Preset {
    Beginner,
    Intermediate,
    Expert,
    Desktop,
    Mobile,
}

impl From<Preset> for Difficulty {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Beginner => Difficulty::Beginner,
            Preset::Intermediate => Difficulty::Intermediate,
            Preset::Expert => Difficulty::Expert,
            Preset::Desktop => Difficulty::Desktop,
            Preset::Mobile => Difficulty::Mobile,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(&args, file)?;
    log::debug!("settings: {settings:?}");

    let output = match args.command {
        Command::Play => game::play(&settings)?,
        Command::Simulate { games } => game::simulate(&settings, games)?,
    };
    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_preset_simulation() {
        let args =
            Args::try_parse_from(["sweepbot", "-d", "expert", "--seed", "7", "simulate", "-n", "5"])
                .unwrap();

        assert_eq!(args.difficulty, Some(Preset::Expert));
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.command, Command::Simulate { games: 5 });
    }

    #[test]
    fn parses_custom_board_and_mode() {
        let args = Args::try_parse_from([
            "sweepbot", "--rows", "5", "--cols", "6", "--mines", "4", "--mode", "random", "-f",
            "json", "play",
        ])
        .unwrap();

        assert_eq!((args.rows, args.cols, args.mines), (Some(5), Some(6), Some(4)));
        assert_eq!(args.mode, Some(Mode::Random));
        assert_eq!(args.format, Some(Format::Json));
        assert_eq!(args.command, Command::Play);
    }

    #[test]
    fn rejects_preset_mixed_with_custom_size() {
        let result = Args::try_parse_from([
            "sweepbot", "-d", "beginner", "--rows", "5", "--cols", "5", "--mines", "3", "play",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_partial_custom_size() {
        assert!(Args::try_parse_from(["sweepbot", "--rows", "5", "play"]).is_err());
    }

    #[test]
    fn simulate_defaults_to_a_hundred_games() {
        let args = Args::try_parse_from(["sweepbot", "simulate"]).unwrap();
        assert_eq!(args.command, Command::Simulate { games: 100 });
    }

    #[test]
    fn verbosity_flags_adjust_level() {
        let quiet = Args::try_parse_from(["sweepbot", "-q", "play"]).unwrap();
        let loud = Args::try_parse_from(["sweepbot", "-vv", "play"]).unwrap();

        assert_eq!(quiet.verbose.log_level_filter(), log::LevelFilter::Error);
        assert_eq!(loud.verbose.log_level_filter(), log::LevelFilter::Debug);
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
