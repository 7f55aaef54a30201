use criterion::{criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;

fn bench_ticks(c: &mut Criterion) {
    let mut state = academy_core::GameState::fresh(0);
    state.school_name = "Benchspire".into();
    state.students.total_students = 120;
    state.students.specialized_students.botany = 30;
    state.students.specialized_students.attack_magic = 20;
    state.departments.attack_magic = 25;
    state.departments.botany = 18;
    state.facilities.great_hall = 12;
    state.facilities.research_wing = 9;
    state.prestige_skills.mana_boost = 4;
    state.boost_remaining_seconds = 600;
    state.mana = Decimal::from(1_000_000u32);

    c.bench_function("session_tick", |b| {
        let mut now = 1;
        b.iter(|| {
            state = academy_runtime::actions::tick(&state, now);
            now += 1;
        })
    });

    c.bench_function("total_magical_power", |b| {
        b.iter(|| academy_formula::total_magical_power(&state))
    });
}

criterion_group!(benches, bench_ticks);
criterion_main!(benches);
