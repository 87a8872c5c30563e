use criterion::{black_box, criterion_group, criterion_main, Criterion};

use std::sync::Arc;

use entente::board::{variant, Order, PhaseKind, PowerId, Topology};
use entente::convoy::ConvoyRouter;
use entente::game::{possible_orders, Game, GameState};
use entente::judge::Resolver;
use entente::parse::parse_order;

/// A conventional Spring 1901 opening: every unit moves.
const SPRING_OPENING: &[(&str, &str)] = &[
    ("Austria", "A vie - gal"),
    ("Austria", "A bud - ser"),
    ("Austria", "F tri - alb"),
    ("England", "F lon - nth"),
    ("England", "F edi - nrg"),
    ("England", "A lvp - yor"),
    ("France", "F bre - mao"),
    ("France", "A par - bur"),
    ("France", "A mar - pie"),
    ("Germany", "F kie - den"),
    ("Germany", "A ber - kie"),
    ("Germany", "A mun - ruh"),
    ("Italy", "F nap - ion"),
    ("Italy", "A rom - apu"),
    ("Italy", "A ven - tri"),
    ("Russia", "F stp/sc - bot"),
    ("Russia", "A mos - ukr"),
    ("Russia", "A war - gal"),
    ("Russia", "F sev - bla"),
    ("Turkey", "F ank - bla"),
    ("Turkey", "A con - bul"),
    ("Turkey", "A smy - con"),
];

fn topo() -> Topology {
    Topology::load(&variant::standard()).expect("standard map loads")
}

fn opening_orders(t: &Topology) -> Vec<(PowerId, Order)> {
    SPRING_OPENING
        .iter()
        .map(|(who, text)| {
            (
                t.find_power(who).expect("known power"),
                parse_order(t, PhaseKind::Movement, text).expect("order parses"),
            )
        })
        .collect()
}

fn bench_resolve_holds(c: &mut Criterion) {
    let t = topo();
    let state = GameState::opening(&t);
    c.bench_function("resolve_22_holds", |b| {
        let mut resolver = Resolver::new();
        let mut router = ConvoyRouter::new();
        b.iter(|| resolver.resolve(black_box(&t), &mut router, black_box(&state.units), &[]))
    });
}

fn bench_resolve_spring_opening(c: &mut Criterion) {
    let t = topo();
    let state = GameState::opening(&t);
    let orders = opening_orders(&t);
    c.bench_function("resolve_22_spring_moves", |b| {
        let mut resolver = Resolver::new();
        let mut router = ConvoyRouter::new();
        b.iter(|| {
            resolver.resolve(
                black_box(&t),
                &mut router,
                black_box(&state.units),
                black_box(&orders),
            )
        })
    });
}

fn bench_parse_spring_orders(c: &mut Criterion) {
    let t = topo();
    c.bench_function("parse_22_spring_orders", |b| {
        b.iter(|| {
            for (_, text) in SPRING_OPENING {
                let _ = parse_order(black_box(&t), PhaseKind::Movement, black_box(text));
            }
        })
    });
}

fn bench_legal_menu_all_powers(c: &mut Criterion) {
    let t = topo();
    let state = GameState::opening(&t);
    c.bench_function("legal_menu_all_powers", |b| {
        let mut router = ConvoyRouter::new();
        b.iter(|| {
            for pw in t.power_ids() {
                let _ = possible_orders(black_box(&t), black_box(&state), &mut router, pw);
            }
        })
    });
}

fn bench_quiet_year(c: &mut Criterion) {
    let t = Arc::new(topo());
    c.bench_function("quiet_year_three_phases", |b| {
        b.iter(|| {
            let mut g = Game::new(t.clone());
            g.process_phase().expect("spring");
            g.process_phase().expect("fall");
            g.process_phase().expect("winter");
            g.is_over()
        })
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let g = Game::new(Arc::new(topo()));
    c.bench_function("game_snapshot", |b| b.iter(|| black_box(&g).snapshot()));
}

criterion_group!(
    benches,
    bench_resolve_holds,
    bench_resolve_spring_opening,
    bench_parse_spring_orders,
    bench_legal_menu_all_powers,
    bench_quiet_year,
    bench_snapshot,
);
criterion_main!(benches);
