//! Move generation and digest benchmarks.
//!
//! Run with: `cargo bench --bench movegen`

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use plateau::{Board, EngineConfig, RandomRobot, Robot, RobotConfig, Variation};

/// A board `plies` moves into a seeded random game.
fn midgame(variation: Variation, plies: usize) -> Board {
    let mut board = Board::for_variation(variation);
    let mut robot = RandomRobot::new(&RobotConfig::new(42));
    for _ in 0..plies {
        if board.state().is_game_over() {
            break;
        }
        let Some(mv) = robot.choose_move(&board) else {
            break;
        };
        if board.execute(&mv, plateau::ReplayMode::Live).is_err() {
            break;
        }
    }
    board
}

fn benchmark_list_moves(c: &mut Criterion) {
    let mut group = c.benchmark_group("List Moves");

    for variation in [Variation::Plateau, Variation::Plateau5] {
        let opening = Board::for_variation(variation);
        group.bench_with_input(BenchmarkId::new("opening", variation), &opening, |b, board| {
            b.iter(|| black_box(board.list_moves()));
        });

        let board = midgame(variation, 30);
        group.bench_with_input(BenchmarkId::new("midgame", variation), &board, |b, board| {
            b.iter(|| black_box(board.list_moves()));
        });
    }
    group.finish();
}

fn benchmark_digest(c: &mut Criterion) {
    let board = midgame(Variation::Plateau, 30);
    c.bench_function("digest", |b| {
        b.iter(|| black_box(black_box(&board).digest()));
    });
}

fn benchmark_execute_undo(c: &mut Criterion) {
    let board = midgame(Variation::Plateau, 30);
    let moves = board.list_moves();
    c.bench_function("execute_undo_all", |b| {
        let mut scratch = board.clone();
        b.iter(|| {
            for mv in &moves {
                if scratch.execute(mv, plateau::ReplayMode::Replay).is_ok() {
                    let _ = scratch.un_execute(mv);
                }
            }
        });
    });
}

fn benchmark_clone(c: &mut Criterion) {
    let board = midgame(Variation::Plateau, 30);
    let config = EngineConfig::default();
    c.bench_function("clone_and_compare", |b| {
        b.iter(|| {
            let copy = black_box(&board).clone();
            black_box(copy.same_board(&board).is_ok() && *copy.config() == config)
        });
    });
}

criterion_group!(
    benches,
    benchmark_list_moves,
    benchmark_digest,
    benchmark_execute_undo,
    benchmark_clone
);
criterion_main!(benches);
