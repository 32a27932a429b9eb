//! Board benchmarks for bang_core.
//!
//! Run with: `cargo bench -p bang_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use bang_core::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn round_board() -> (Board, Vec<Piece>) {
    let config = GeneratorConfig::default()
        .with_board(BoardConfig::round(24, 24))
        .with_seed(0xB4A6);
    let mut board = generate_board(&config).expect("bench generator config");
    let pieces: Vec<Piece> = (0..24u32)
        .map(|i| {
            let x = 8 + (i as i32 * 7) % 24;
            let y = 8 + (i as i32 * 11) % 24;
            Piece::unit(i + 1, (i % 2) as PlayerIndex, x, y)
                .with_move_distance(4)
                .with_fire_distance(1, 3)
        })
        .collect();
    board.shadow_pieces(&pieces);
    (board, pieces)
}

/// Move and attack set computation at increasing move distances.
pub fn move_set_benchmark(c: &mut Criterion) {
    let (board, pieces) = round_board();
    let mut calculator = MoveSetCalculator::new();
    let mut group = c.benchmark_group("compute_moves");
    for distance in [2u8, 4, 8, 16] {
        let piece = pieces[0].clone().with_move_distance(distance);
        group.bench_with_input(BenchmarkId::from_parameter(distance), &piece, |b, piece| {
            b.iter(|| black_box(calculator.compute_moves(&board, piece, true)));
        });
    }
    group.finish();

    c.bench_function("shadow_pieces", |b| {
        let mut board = board.clone();
        b.iter(|| board.shadow_pieces(black_box(&pieces)));
    });
}

/// Submitting and draining a burst of overlapping actions.
pub fn scheduler_benchmark(c: &mut Criterion) {
    c.bench_function("scheduler_burst_256", |b| {
        b.iter(|| {
            let mut scheduler: ActionScheduler<u64> =
                ActionScheduler::with_clock(SchedulerConfig::default(), ManualClock::new());
            let mut ran = 0u64;
            for i in 0..256u32 {
                scheduler.execute_action(
                    BoardAction::from_fn(|ran: &mut u64, _| {
                        *ran += 1;
                        Ok(Execution::Completed)
                    })
                    .affecting([i % 16 + 1])
                    .with_bounds(Rect::new((i % 8) as i32, 0, 2, 2)),
                );
            }
            scheduler.pump(&mut ran);
            black_box(ran)
        });
    });
}

criterion_group!(benches, move_set_benchmark, scheduler_benchmark);
criterion_main!(benches);
