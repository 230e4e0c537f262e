use criterion::{criterion_group, criterion_main, Criterion};
use moonbot::evaluation::{evaluate, material};
use moonbot::rules::Game;
use shakmaty::Color;

fn bench_evaluation(c: &mut Criterion) {
    let positions = vec![
        ("startpos", Game::default()),
        ("middlegame", Game::from_fen("r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4").unwrap()),
        ("endgame", Game::from_fen("8/5k2/8/8/8/8/4K3/4R3 w - - 0 1").unwrap()),
        ("complex", Game::from_fen("r1bq1rk1/pp2ppbp/2np2p1/2n5/P3PP2/N1P2N2/1PB3PP/R1B1QRK1 b - - 0 10").unwrap()),
    ];
    for (name, game) in &positions {
        c.bench_function(&format!("eval_{}", name), |b| {
            b.iter(|| evaluate(game, Color::White))
        });
        c.bench_function(&format!("material_{}", name), |b| b.iter(|| material(game)));
    }
}

criterion_group!(benches, bench_evaluation);
criterion_main!(benches);
