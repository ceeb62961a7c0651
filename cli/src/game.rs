use anyhow::{Context, Result};
use rand::prelude::*;
use serde::Serialize;
use sweepbot_core::*;
use web_time::Instant;

use crate::config::{Format, Mode, Settings};
use crate::report::{GameResult, GameSummary, Moves, Record, render_board, render_text};

/// Plays a single game on a fresh board seeded with `seed`.
pub fn play_game(settings: &Settings, seed: u64) -> Result<(Board, GameSummary)> {
    let mut board = Board::new(settings.game, seed, settings.start_tile);
    let start = Instant::now();

    let (moves, stopped) = match settings.mode {
        Mode::Ai => run_solver(settings, seed, &mut board)?,
        Mode::Random => run_random(seed, &mut board)?,
    };

    let result = match board.status() {
        GameStatus::Won => GameResult::Won,
        GameStatus::Lost => GameResult::Lost,
        GameStatus::Ready | GameStatus::Playing => {
            log::warn!("game {seed} stopped early: {stopped:?}");
            GameResult::Dnf
        }
    };
    let summary = GameSummary {
        seed,
        result,
        moves,
        revealed: board.revealed_count(),
        safe_tiles: board.config().total_cells() - board.total_mines(),
        seconds: start.elapsed().as_secs_f64(),
    };
    log::info!("game finished: {summary}");
    Ok((board, summary))
}

fn run_solver(
    settings: &Settings,
    seed: u64,
    board: &mut Board,
) -> Result<(Moves, Option<SolverError>)> {
    let mut solver = Solver::new(SolverConfig {
        seed: seed.wrapping_add(settings.solver.seed),
        ..settings.solver
    });
    let mut moves = Moves::default();

    while board.status().accepts_moves() {
        match solver.think(board) {
            Ok(report) => moves.add(&report),
            Err(SolverError::MineHit { position, report }) => {
                log::debug!("lost on {position:?}");
                moves.add(&report);
                return Ok((moves, None));
            }
            Err(err @ SolverError::Exhausted) => return Ok((moves, Some(err))),
            Err(err) => return Err(err).context("solver failed"),
        }
    }
    Ok((moves, None))
}

/// Reveals uniformly random hidden tiles until the game ends.
fn run_random(seed: u64, board: &mut Board) -> Result<(Moves, Option<SolverError>)> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut moves = Moves::default();

    while board.status().accepts_moves() {
        let Some(pos) = pick_guess(board, GuessPolicy::Uniform, &mut rng) else {
            return Ok((moves, Some(SolverError::Exhausted)));
        };
        board.reveal(pos).context("random reveal")?;
        moves.cycles += 1;
        moves.guesses += 1;
    }
    Ok((moves, None))
}

#[derive(Serialize)]
struct PlayReport<'a> {
    summary: &'a GameSummary,
    board: Vec<String>,
}

pub fn play(settings: &Settings) -> Result<String> {
    let (board, summary) = play_game(settings, settings.seed)?;

    Ok(match settings.format {
        Format::Text => render_text(&board, &summary),
        Format::Json => serde_json::to_string_pretty(&PlayReport {
            summary: &summary,
            board: render_board(&board),
        })?,
    })
}

/// Plays `games` games, each on a seed drawn from the run seed.
pub fn simulate(settings: &Settings, games: usize) -> Result<String> {
    let mut seeds = SmallRng::seed_from_u64(settings.seed);
    let mut record = Record::new(settings.game);

    for i in 1..=games {
        let (_, summary) = play_game(settings, seeds.random())?;
        if settings.format == Format::Text {
            log::info!("game {i}/{games}: {summary}");
        }
        record.add(summary);
    }

    Ok(match settings.format {
        Format::Text => record.to_string(),
        Format::Json => serde_json::to_string_pretty(&record)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(mode: Mode, game: GameConfig) -> Settings {
        Settings {
            game,
            start_tile: StartTile::AlwaysZero,
            seed: 5,
            mode,
            format: Format::Text,
            solver: SolverConfig::default(),
        }
    }

    #[test]
    fn ai_games_run_to_the_end() {
        let settings = settings(Mode::Ai, Difficulty::Beginner.config());

        for seed in 0..10 {
            let (board, summary) = play_game(&settings, seed).unwrap();

            assert!(board.status().is_finished());
            assert_ne!(summary.result, GameResult::Dnf);
            assert!(summary.moves.guesses >= 1);
            if summary.result == GameResult::Won {
                assert_eq!(summary.revealed, summary.safe_tiles);
            }
        }
    }

    #[test]
    fn lost_ai_games_count_the_fatal_guess() {
        let mut settings = settings(Mode::Ai, GameConfig::new((1, 2), 1));
        settings.start_tile = StartTile::Random;
        let mut lost = 0;

        for seed in 0..20 {
            let (_, summary) = play_game(&settings, seed).unwrap();

            assert_eq!(summary.moves.guesses, 1, "seed {seed}");
            assert_eq!(summary.moves.cycles, 1);
            if summary.result == GameResult::Lost {
                lost += 1;
            }
        }
        assert!(lost > 0);
    }

    #[test]
    fn corner_opening_is_read_from_the_solver_settings() {
        let mut settings = settings(Mode::Ai, Difficulty::Beginner.config());
        settings.solver.opening = Opening::Corners;

        for seed in 0..5 {
            let (board, summary) = play_game(&settings, seed).unwrap();

            assert!(board.status().is_finished());
            assert_ne!(summary.result, GameResult::Dnf);
            assert!(summary.moves.guesses >= 1);
        }
    }

    #[test]
    fn random_games_run_to_the_end() {
        let settings = settings(Mode::Random, Difficulty::Beginner.config());

        let (board, summary) = play_game(&settings, 3).unwrap();

        assert!(board.status().is_finished());
        assert_eq!(summary.moves.guesses, summary.moves.cycles);
    }

    #[test]
    fn same_seed_replays_the_same_game() {
        let settings = settings(Mode::Ai, Difficulty::Intermediate.config());

        let (first, _) = play_game(&settings, 9).unwrap();
        let (second, _) = play_game(&settings, 9).unwrap();

        assert_eq!(render_board(&first), render_board(&second));
    }

    #[test]
    fn simulation_counts_every_game() {
        let mut settings = settings(Mode::Ai, Difficulty::Beginner.config());
        settings.format = Format::Json;

        let output = simulate(&settings, 4).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();

        let played = ["won", "lost", "dnf"]
            .iter()
            .map(|key| json[key].as_u64().unwrap())
            .sum::<u64>();
        assert_eq!(played, 4);
        assert_eq!(json["games"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn play_text_output_ends_with_summary() {
        let settings = settings(Mode::Ai, GameConfig::new((4, 4), 1));

        let output = play(&settings).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[..4].iter().all(|line| line.len() == 4));
        assert!(lines[4].contains("(seed: 5)"));
    }
}
