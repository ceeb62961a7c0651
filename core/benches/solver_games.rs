use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use sweepbot_core::*;

/// Plays one game to the end, returning whether it was won.
fn play(config: GameConfig, seed: u64) -> bool {
    let mut board = Board::new(config, seed, StartTile::AlwaysZero);
    let mut solver = Solver::new(SolverConfig {
        seed,
        ..SolverConfig::default()
    });

    while board.status().accepts_moves() {
        if solver.think(&mut board).is_err() {
            break;
        }
    }
    board.status() == GameStatus::Won
}

fn solver_games(c: &mut Criterion) {
    let mut group = c.benchmark_group("solver_games");
    for difficulty in [Difficulty::Beginner, Difficulty::Intermediate, Difficulty::Expert] {
        let config = difficulty.config();
        group.bench_with_input(
            BenchmarkId::from_parameter(difficulty),
            &config,
            |b, &config| {
                let mut seed = 0;
                b.iter(|| {
                    seed += 1;
                    black_box(play(config, seed))
                });
            },
        );
    }
    group.finish();
}

fn single_cycle(c: &mut Criterion) {
    let config = Difficulty::Expert.config();
    let mut opened = Board::new(config, 42, StartTile::AlwaysZero);
    let _ = opened.reveal((8, 15));

    c.bench_function("single_cycle/expert_opening", |b| {
        b.iter_batched(
            || (opened.clone(), Solver::default()),
            |(mut board, mut solver)| black_box(solver.think(&mut board)),
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, solver_games, single_cycle);
criterion_main!(benches);
