#![deny(warnings)]

//! Formula engine: pure derivations over a game-state snapshot.
//!
//! Every function here is a side-effect-free function of the snapshot it is
//! given; calling one twice on the same snapshot yields identical results.
//! Currency and power arithmetic stays in `Decimal` end to end. The only
//! floating-point crossover is the prestige-yield `log10`, whose result is
//! truncated to a plain integer and never persisted.
//!
//! Level and headcount terms all contribute identity at zero (+0 or x1), so
//! a freshly reset snapshot produces a power of exactly 1.00.

use academy_core::{DepartmentKind, FacilityKind, GameState, PrestigeSkillKind};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Global department level cap: 5 levels per research-wing level.
pub fn max_department_level(state: &GameState) -> u32 {
    state.facilities.research_wing.saturating_mul(5)
}

/// Enrollment cap: 10 students per great-hall level.
pub fn max_students(state: &GameState) -> u32 {
    state.facilities.great_hall.saturating_mul(10)
}

/// Mana produced per tick.
///
/// base = students x (1 + 0.1 x botany level), then x (1 + 0.05 x botany
/// specialists) x (1 + 0.3 x mana-boost skill), and x the reward
/// multiplier while a boost is running.
pub fn mana_per_second(state: &GameState) -> Decimal {
    let with_bonuses = sat_mul(
        sat_mul(base_mana_per_second(state), specialist_bonus(state)),
        production_skill_bonus(state.prestige_skills.level(PrestigeSkillKind::ManaBoost)),
    );
    apply_boost(state, with_bonuses)
}

/// Gold produced per tick: mana's base halved (rounded half-up, 2 dp)
/// before its own bonuses are applied.
pub fn gold_per_second(state: &GameState) -> Decimal {
    let halved = round2(base_mana_per_second(state) / Decimal::TWO);
    let with_bonuses = sat_mul(
        sat_mul(halved, specialist_bonus(state)),
        production_skill_bonus(state.prestige_skills.level(PrestigeSkillKind::GoldBoost)),
    );
    apply_boost(state, with_bonuses)
}

/// Production multiplier granted while a boost is running: a shared bonus
/// (creature specialists +0.5%/student, breeding hut +1%/level, reward
/// skill +5%/level) scaled by the base 4x.
pub fn reward_multiplier(state: &GameState) -> Decimal {
    let creatures = state
        .students
        .specialized_students
        .count(DepartmentKind::MagicCreatureStudies);
    let bonus = Decimal::ONE
        + Decimal::from(creatures) * Decimal::new(5, 3)
        + Decimal::from(state.facilities.breeding_hut) * Decimal::new(1, 2)
        + Decimal::from(state.prestige_skills.reward_boost) * Decimal::new(5, 2);
    sat_mul(Decimal::from(4u32), bonus)
}

/// Aggregate magical power, rounded half-up to 2 dp.
///
/// A product of independent terms; every absent contribution is identity.
pub fn total_magical_power(state: &GameState) -> Decimal {
    let d = &state.departments;
    let f = &state.facilities;
    let sp = &state.students.specialized_students;

    let base = Decimal::from(d.attack_magic) * Decimal::from(10u32)
        + Decimal::ONE
        + Decimal::from(sp.attack_magic) * Decimal::from(5u32);
    let student_bonus =
        Decimal::ONE + Decimal::from(state.students.total_students) * Decimal::new(1, 1);
    let facility_bonus = sat_mul(
        powu(Decimal::new(11, 1), f.great_hall),
        powu(Decimal::new(11, 1), f.research_wing),
    );
    let department_bonus = sat_mul(
        Decimal::ONE + Decimal::from(d.botany) * Decimal::new(5, 2),
        Decimal::ONE + Decimal::from(d.defense_magic) * Decimal::new(5, 2),
    );
    let defense_specialist_bonus =
        Decimal::ONE + Decimal::from(sp.defense_magic) * Decimal::new(1, 2);
    let ancient_bonus = Decimal::ONE + Decimal::from(d.ancient_magic) * Decimal::new(2, 2);
    let library_bonus = Decimal::ONE + Decimal::from(f.dimensional_library) * Decimal::new(1, 2);
    let attunement = powu(
        Decimal::new(105, 2),
        state.prestige_skills.magical_power_boost,
    );

    let power = [
        student_bonus,
        facility_bonus,
        department_bonus,
        defense_specialist_bonus,
        ancient_bonus,
        library_bonus,
        attunement,
    ]
    .iter()
    .fold(base, |acc, term| sat_mul(acc, *term));
    round2(power)
}

/// Mana cost of the next level of a department: 10 x 1.5^level, discounted
/// by the dimensional library (1%/level) and the research-discount skill
/// (1%/level), rounded up to whole mana.
pub fn department_upgrade_cost(state: &GameState, kind: DepartmentKind) -> Decimal {
    let level = state.departments.level(kind);
    let discount = Decimal::from(state.facilities.dimensional_library) * Decimal::new(1, 2)
        + Decimal::from(state.prestige_skills.research_discount) * Decimal::new(1, 2);
    sat_mul(
        sat_mul(powu(Decimal::new(15, 1), level), Decimal::from(10u32)),
        discount_multiplier(discount),
    )
    .ceil()
}

/// Gold cost of the next level of a facility: 100 x 2^level, discounted by
/// the facility-discount skill (1%/level), rounded up to whole gold.
pub fn facility_upgrade_cost(state: &GameState, kind: FacilityKind) -> Decimal {
    let level = state.facilities.level(kind);
    let discount = Decimal::from(state.prestige_skills.facility_discount) * Decimal::new(1, 2);
    sat_mul(
        sat_mul(powu(Decimal::TWO, level), Decimal::from(100u32)),
        discount_multiplier(discount),
    )
    .ceil()
}

/// Mana cost of recruiting the next student: 10 x 1.2^enrolled.
pub fn student_recruit_cost(state: &GameState) -> Decimal {
    sat_mul(
        powu(Decimal::new(12, 1), state.students.total_students),
        Decimal::from(10u32),
    )
    .ceil()
}

/// Stone cost of the next level of a prestige skill.
pub fn prestige_skill_cost(state: &GameState, kind: PrestigeSkillKind) -> u64 {
    u64::from(state.prestige_skills.level(kind)) + 1
}

/// Philosopher's stones a prestige would grant right now:
/// floor(log10(power) x ancient-department bonus x ancient-specialist
/// bonus x stone-boost bonus). Zero when power <= 1, in which case
/// prestige is a no-op.
pub fn prestige_yield(state: &GameState) -> u64 {
    if state.total_magical_power <= Decimal::ONE {
        return 0;
    }
    // log10 has no decimal form; the yield is integral and never persisted,
    // so the f64 crossover is acceptable here.
    let power = state.total_magical_power.to_f64().unwrap_or(f64::MAX);
    let ancient_dept = 1.0 + 0.1 * f64::from(state.departments.ancient_magic);
    let ancient_students = 1.0
        + 0.01
            * f64::from(
                state
                    .students
                    .specialized_students
                    .count(DepartmentKind::AncientMagic),
            );
    let stone_skill = 1.0 + 0.05 * f64::from(state.prestige_skills.stone_boost);
    let yield_f = power.log10() * ancient_dept * ancient_students * stone_skill;
    if yield_f <= 0.0 {
        0
    } else {
        yield_f.floor() as u64
    }
}

/// Offline accrual cap in minutes: 60 base, +10 per extension-skill level.
pub fn offline_cap_minutes(state: &GameState) -> i64 {
    60 + 10 * i64::from(state.prestige_skills.offline_extension)
}

/// students x (1 + 0.1 x botany level), shared by both currencies.
fn base_mana_per_second(state: &GameState) -> Decimal {
    let botany_bonus =
        Decimal::ONE + Decimal::from(state.departments.botany) * Decimal::new(1, 1);
    sat_mul(
        Decimal::from(state.students.total_students),
        botany_bonus,
    )
}

/// 1 + 0.05 per botany specialist.
fn specialist_bonus(state: &GameState) -> Decimal {
    Decimal::ONE
        + Decimal::from(
            state
                .students
                .specialized_students
                .count(DepartmentKind::Botany),
        ) * Decimal::new(5, 2)
}

/// 1 + 0.3 per skill level (mana-boost / gold-boost).
fn production_skill_bonus(level: u32) -> Decimal {
    Decimal::ONE + Decimal::from(level) * Decimal::new(3, 1)
}

fn apply_boost(state: &GameState, rate: Decimal) -> Decimal {
    if state.boost_remaining_seconds > 0 {
        sat_mul(rate, reward_multiplier(state))
    } else {
        rate
    }
}

/// Combined discounts are clamped at 90%: the cost multiplier never drops
/// below 0.1, so a cost can never reach zero or go negative.
fn discount_multiplier(discount: Decimal) -> Decimal {
    (Decimal::ONE - discount).max(Decimal::new(1, 1))
}

/// Integer power by repeated multiplication, saturating at `Decimal::MAX`.
/// Exponents here are levels, so they stay small.
fn powu(base: Decimal, exp: u32) -> Decimal {
    let mut acc = Decimal::ONE;
    for _ in 0..exp {
        acc = sat_mul(acc, base);
    }
    acc
}

/// Multiply, saturating at `Decimal::MAX` instead of panicking; long-lived
/// saves can push power and costs past the 96-bit mantissa.
fn sat_mul(a: Decimal, b: Decimal) -> Decimal {
    a.checked_mul(b).unwrap_or(Decimal::MAX)
}

/// Round half-up to two decimal places.
fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
