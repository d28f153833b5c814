//! Benchmarks for move generation, evaluation, and search.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chess_engine::eval;
use chess_engine::movegen;
use chess_engine::pawn_cache::PawnCache;
use chess_engine::position::Position;
use chess_engine::search::{SearchLimits, Searcher};
use chess_engine::sync::StopFlag;
use chess_engine::tt::TranspositionTable;

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
const MIDDLEGAME: &str = "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4";

fn perft(pos: &mut Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = movegen::generate_legal(pos);
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut nodes = 0;
    for mv in moves {
        pos.do_move(mv);
        nodes += perft(pos, depth - 1);
        pos.undo_move();
    }
    nodes
}

fn bench_perft(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");

    let mut startpos = Position::startpos();
    for depth in 1..=4 {
        group.bench_with_input(BenchmarkId::new("startpos", depth), &depth, |b, &depth| {
            b.iter(|| perft(&mut startpos, black_box(depth)));
        });
    }

    let mut kiwipete = Position::from_fen(KIWIPETE).unwrap();
    for depth in 1..=3 {
        group.bench_with_input(BenchmarkId::new("kiwipete", depth), &depth, |b, &depth| {
            b.iter(|| perft(&mut kiwipete, black_box(depth)));
        });
    }

    group.finish();
}

fn bench_movegen(c: &mut Criterion) {
    let mut group = c.benchmark_group("movegen");

    let startpos = Position::startpos();
    group.bench_function("startpos", |b| {
        let mut moves = Vec::new();
        b.iter(|| {
            moves.clear();
            movegen::generate_pseudo_legal(black_box(&startpos), &mut moves);
        });
    });

    let middlegame = Position::from_fen(MIDDLEGAME).unwrap();
    group.bench_function("middlegame", |b| {
        let mut moves = Vec::new();
        b.iter(|| {
            moves.clear();
            movegen::generate_pseudo_legal(black_box(&middlegame), &mut moves);
        });
    });

    let kiwipete = Position::from_fen(KIWIPETE).unwrap();
    group.bench_function("kiwipete", |b| {
        let mut moves = Vec::new();
        b.iter(|| {
            moves.clear();
            movegen::generate_pseudo_legal(black_box(&kiwipete), &mut moves);
        });
    });

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(10);

    for depth in [3, 4, 5] {
        group.bench_with_input(BenchmarkId::new("startpos", depth), &depth, |b, &depth| {
            b.iter(|| {
                let mut pos = Position::startpos();
                let mut tt = TranspositionTable::new(16);
                let pawn_cache = PawnCache::new(1024);
                let mut searcher = Searcher::new(&mut tt, &pawn_cache, StopFlag::new());
                searcher.search(
                    &mut pos,
                    SearchLimits { max_depth: Some(depth), ..SearchLimits::default() },
                    |_| {},
                )
            });
        });
    }

    group.finish();
}

fn bench_eval(c: &mut Criterion) {
    let mut group = c.benchmark_group("eval");

    let positions = [
        ("startpos", "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
        ("middlegame", MIDDLEGAME),
        ("endgame", "8/5k2/8/8/8/8/5K2/4R3 w - - 0 1"),
    ];

    for (name, fen) in positions {
        let pos = Position::from_fen(fen).unwrap();
        let pawn_cache = PawnCache::new(1024);
        group.bench_with_input(BenchmarkId::new("position", name), &pos, |b, pos| {
            b.iter(|| eval::evaluate(black_box(pos), &pawn_cache));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_perft, bench_movegen, bench_search, bench_eval);
criterion_main!(benches);
