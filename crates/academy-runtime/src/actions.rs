//! Guarded copy-on-write transitions over the game snapshot.
//!
//! Every transition that commits returns a complete new [`GameState`] with
//! `total_magical_power` recomputed as its last step; a failed guard
//! returns `None` and the caller keeps the old snapshot untouched. There
//! is no error taxonomy here on purpose: the UI disables an action through
//! the same predicates that guard it.

use academy_core::{DepartmentKind, FacilityKind, GameState, PrestigeSkillKind};
use academy_formula as formula;
use rust_decimal::Decimal;

/// Seconds a production boost runs for.
pub const BOOST_DURATION_SECS: u32 = 600;

/// Bulk offline accrual, granted once on resume after an absence.
#[derive(Clone, Debug, PartialEq)]
pub struct OfflineReward {
    /// Whole capped minutes away.
    pub minutes: i64,
    pub mana: Decimal,
    pub gold: Decimal,
}

/// Set the school name once; later writes and blank names are rejected.
pub fn set_school_name(state: &GameState, name: &str) -> Option<GameState> {
    let name = name.trim();
    if !state.school_name.is_empty() || name.is_empty() {
        return None;
    }
    let mut next = state.clone();
    next.school_name = name.to_string();
    Some(finish(next))
}

/// Level a department up, paying mana. Rejected at the research-wing cap
/// or when mana is short.
pub fn upgrade_department(state: &GameState, kind: DepartmentKind) -> Option<GameState> {
    if state.departments.level(kind) >= formula::max_department_level(state) {
        return None;
    }
    let cost = formula::department_upgrade_cost(state, kind);
    if state.mana < cost {
        return None;
    }
    let mut next = state.clone();
    next.mana -= cost;
    *next.departments.level_mut(kind) += 1;
    Some(finish(next))
}

/// Level a facility up, paying gold.
pub fn upgrade_facility(state: &GameState, kind: FacilityKind) -> Option<GameState> {
    let cost = formula::facility_upgrade_cost(state, kind);
    if state.gold < cost {
        return None;
    }
    let mut next = state.clone();
    next.gold -= cost;
    *next.facilities.level_mut(kind) += 1;
    Some(finish(next))
}

/// Enroll one student, paying mana. Rejected at the great-hall cap.
pub fn recruit_student(state: &GameState) -> Option<GameState> {
    if state.students.total_students >= formula::max_students(state) {
        return None;
    }
    let cost = formula::student_recruit_cost(state);
    if state.mana < cost {
        return None;
    }
    let mut next = state.clone();
    next.mana -= cost;
    next.students.total_students += 1;
    Some(finish(next))
}

/// Move `count` unassigned students into a department.
pub fn assign_students(state: &GameState, kind: DepartmentKind, count: u32) -> Option<GameState> {
    if count == 0 || state.students.unassigned() < count {
        return None;
    }
    let mut next = state.clone();
    *next.students.specialized_students.count_mut(kind) += count;
    Some(finish(next))
}

/// Return `count` students from a department to the unassigned pool.
pub fn unassign_students(state: &GameState, kind: DepartmentKind, count: u32) -> Option<GameState> {
    if count == 0 || state.students.specialized_students.count(kind) < count {
        return None;
    }
    let mut next = state.clone();
    *next.students.specialized_students.count_mut(kind) -= count;
    Some(finish(next))
}

/// Level a prestige skill up, paying philosopher's stones.
pub fn upgrade_prestige_skill(state: &GameState, kind: PrestigeSkillKind) -> Option<GameState> {
    let cost = formula::prestige_skill_cost(state, kind);
    if state.philosophers_stones < cost {
        return None;
    }
    let mut next = state.clone();
    next.philosophers_stones -= cost;
    *next.prestige_skills.level_mut(kind) += 1;
    Some(finish(next))
}

/// Start the timed production boost. Rejected while one is running.
pub fn start_boost(state: &GameState) -> Option<GameState> {
    if state.boost_remaining_seconds > 0 {
        return None;
    }
    let mut next = state.clone();
    next.boost_remaining_seconds = BOOST_DURATION_SECS;
    Some(finish(next))
}

/// Double current mana and gold (the reward-ad windfall).
pub fn double_resources(state: &GameState) -> Option<GameState> {
    let mut next = state.clone();
    next.mana = sat_mul(next.mana, Decimal::TWO);
    next.gold = sat_mul(next.gold, Decimal::TWO);
    Some(finish(next))
}

/// Reset for philosopher's stones.
///
/// Builds a *fresh* default snapshot and carries over exactly three
/// things: the school name, the stone balance (plus the yield), and the
/// prestige skills. Everything not carried is reset by construction, so a
/// field added later can never leak through a reset. Yield 0 is a no-op.
pub fn prestige(state: &GameState, now: i64) -> Option<GameState> {
    let earned = formula::prestige_yield(state);
    if earned == 0 {
        return None;
    }
    let mut next = GameState::fresh(now);
    next.school_name = state.school_name.clone();
    next.philosophers_stones = state.philosophers_stones.saturating_add(earned);
    next.prestige_skills = state.prestige_skills;
    Some(finish(next))
}

/// One second of play: accrue production, run the boost timer down,
/// stamp the online timestamp.
pub fn tick(state: &GameState, now: i64) -> GameState {
    let mut next = state.clone();
    next.mana = sat_add(next.mana, formula::mana_per_second(state));
    next.gold = sat_add(next.gold, formula::gold_per_second(state));
    next.boost_remaining_seconds = next.boost_remaining_seconds.saturating_sub(1);
    next.last_online_timestamp = now;
    finish(next)
}

/// Accrual owed for the absence ending at `now`, or `None` when less than
/// a full capped minute passed. Rates are taken unboosted: a timed boost
/// must not multiply hours of catch-up.
pub fn pending_offline_reward(state: &GameState, now: i64) -> Option<OfflineReward> {
    let elapsed = now.saturating_sub(state.last_online_timestamp);
    let capped = elapsed.min(formula::offline_cap_minutes(state) * 60);
    let minutes = capped / 60;
    if minutes < 1 {
        return None;
    }
    let mut probe = state.clone();
    probe.boost_remaining_seconds = 0;
    let seconds = Decimal::from(capped);
    Some(OfflineReward {
        minutes,
        mana: sat_mul(formula::mana_per_second(&probe), seconds),
        gold: sat_mul(formula::gold_per_second(&probe), seconds),
    })
}

/// Bank an acknowledged offline reward (optionally doubled), drain the
/// boost timer by the wall time spent away, and come back online.
pub fn claim_offline_reward(
    state: &GameState,
    reward: &OfflineReward,
    doubled: bool,
    now: i64,
) -> GameState {
    let factor = if doubled { Decimal::TWO } else { Decimal::ONE };
    let mut next = state.clone();
    next.mana = sat_add(next.mana, sat_mul(reward.mana, factor));
    next.gold = sat_add(next.gold, sat_mul(reward.gold, factor));
    let away = u32::try_from(now.saturating_sub(state.last_online_timestamp).max(0))
        .unwrap_or(u32::MAX);
    next.boost_remaining_seconds = next.boost_remaining_seconds.saturating_sub(away);
    next.last_online_timestamp = now;
    finish(next)
}

/// Post-step shared by every committing transition: the stored power score
/// is always recomputed, never trusted.
fn finish(mut next: GameState) -> GameState {
    next.total_magical_power = formula::total_magical_power(&next);
    next
}

fn sat_add(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or(Decimal::MAX)
}

fn sat_mul(a: Decimal, b: Decimal) -> Decimal {
    a.checked_mul(b).unwrap_or(Decimal::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use academy_core::validate_state;
    use proptest::prelude::*;

    fn playable_state() -> GameState {
        let mut s = GameState::fresh(1_000);
        s.facilities.great_hall = 2; // room for 20 students
        s.facilities.research_wing = 2; // department cap 10
        s.mana = Decimal::from(1_000u32);
        s.gold = Decimal::from(1_000u32);
        s
    }

    #[test]
    fn upgrade_department_spends_and_levels() {
        let s = playable_state();
        let next = upgrade_department(&s, DepartmentKind::Botany).unwrap();
        assert_eq!(next.departments.botany, 1);
        assert_eq!(next.mana, Decimal::from(990u32));
        // Post-step ran: the stored power reflects the new botany level.
        assert_eq!(next.total_magical_power, Decimal::new(105, 2));
        assert_eq!(
            next.total_magical_power,
            academy_formula::total_magical_power(&next)
        );
    }

    #[test]
    fn upgrade_department_is_noop_when_short_on_mana() {
        let mut s = playable_state();
        s.mana = Decimal::from(5u32); // cost is 10
        assert_eq!(upgrade_department(&s, DepartmentKind::Botany), None);
    }

    #[test]
    fn upgrade_department_respects_research_cap() {
        let mut s = playable_state();
        s.departments.attack_magic = 10; // cap with research wing 2
        assert_eq!(upgrade_department(&s, DepartmentKind::AttackMagic), None);
        s.facilities.research_wing = 3;
        assert!(upgrade_department(&s, DepartmentKind::AttackMagic).is_some());
    }

    #[test]
    fn recruit_student_respects_hall_cap() {
        let mut s = playable_state();
        s.students.total_students = 20;
        assert_eq!(recruit_student(&s), None);
        s.facilities.great_hall = 3;
        let next = recruit_student(&s).unwrap();
        assert_eq!(next.students.total_students, 21);
    }

    #[test]
    fn assignment_moves_between_pools() {
        let mut s = playable_state();
        s.students.total_students = 5;
        let next = assign_students(&s, DepartmentKind::AncientMagic, 3).unwrap();
        assert_eq!(next.students.unassigned(), 2);
        assert_eq!(
            next.students
                .specialized_students
                .count(DepartmentKind::AncientMagic),
            3
        );
        // Can't assign more than remain unassigned.
        assert_eq!(assign_students(&next, DepartmentKind::Botany, 3), None);
        let back = unassign_students(&next, DepartmentKind::AncientMagic, 2).unwrap();
        assert_eq!(back.students.unassigned(), 4);
        assert_eq!(unassign_students(&back, DepartmentKind::Botany, 1), None);
    }

    #[test]
    fn prestige_skill_spends_stones() {
        let mut s = playable_state();
        s.philosophers_stones = 3;
        let next = upgrade_prestige_skill(&s, PrestigeSkillKind::ManaBoost).unwrap();
        assert_eq!(next.philosophers_stones, 2);
        assert_eq!(next.prestige_skills.mana_boost, 1);
        // Next level costs 2; only 2 left, works once more then rejects.
        let next = upgrade_prestige_skill(&next, PrestigeSkillKind::ManaBoost).unwrap();
        assert_eq!(next.philosophers_stones, 0);
        assert_eq!(upgrade_prestige_skill(&next, PrestigeSkillKind::ManaBoost), None);
    }

    #[test]
    fn boost_cannot_stack() {
        let s = playable_state();
        let next = start_boost(&s).unwrap();
        assert_eq!(next.boost_remaining_seconds, BOOST_DURATION_SECS);
        assert_eq!(start_boost(&next), None);
    }

    #[test]
    fn school_name_is_write_once() {
        let s = GameState::fresh(0);
        assert_eq!(set_school_name(&s, "   "), None);
        let named = set_school_name(&s, "  Nightspire  ").unwrap();
        assert_eq!(named.school_name, "Nightspire");
        assert_eq!(set_school_name(&named, "Other"), None);
    }

    #[test]
    fn double_resources_doubles_both() {
        let mut s = GameState::fresh(0);
        s.mana = Decimal::from(7u32);
        s.gold = Decimal::new(150, 2);
        let next = double_resources(&s).unwrap();
        assert_eq!(next.mana, Decimal::from(14u32));
        assert_eq!(next.gold, Decimal::from(3u32));
    }

    #[test]
    fn tick_accrues_and_counts_the_boost_down() {
        let mut s = GameState::fresh(0);
        s.students.total_students = 3;
        s.boost_remaining_seconds = 1;
        let after = tick(&s, 10);
        // Boosted second: 3 mana/s x4.
        assert_eq!(after.mana, Decimal::from(12u32));
        assert_eq!(after.boost_remaining_seconds, 0);
        assert_eq!(after.last_online_timestamp, 10);
        let again = tick(&after, 11);
        // Boost expired: plain rate, and the timer floors at zero.
        assert_eq!(again.mana, Decimal::from(15u32));
        assert_eq!(again.boost_remaining_seconds, 0);
    }

    #[test]
    fn prestige_below_threshold_is_a_noop() {
        let mut s = playable_state();
        s.total_magical_power = Decimal::ONE;
        assert_eq!(prestige(&s, 2_000), None);
    }

    #[test]
    fn prestige_carries_exactly_three_things() {
        let mut s = playable_state();
        s.school_name = "Nightspire".to_string();
        s.philosophers_stones = 4;
        s.prestige_skills.stone_boost = 2;
        s.departments.attack_magic = 9;
        s.students.total_students = 12;
        s.boost_remaining_seconds = 300;
        s.total_magical_power = Decimal::from(10_000u32); // log10 = 4, x1.1^0...
        let expected_yield = academy_formula::prestige_yield(&s);
        assert!(expected_yield > 0);

        let next = prestige(&s, 9_999).unwrap();
        assert_eq!(next.school_name, "Nightspire");
        assert_eq!(next.philosophers_stones, 4 + expected_yield);
        assert_eq!(next.prestige_skills, s.prestige_skills);
        // Everything else is the default slate.
        assert_eq!(next.mana, Decimal::ZERO);
        assert_eq!(next.gold, Decimal::ZERO);
        assert_eq!(next.departments, Default::default());
        assert_eq!(next.facilities, Default::default());
        assert_eq!(next.students, Default::default());
        assert_eq!(next.boost_remaining_seconds, 0);
        assert_eq!(next.last_online_timestamp, 9_999);
        assert_eq!(next.total_magical_power, Decimal::ONE);
    }

    #[test]
    fn offline_reward_caps_at_the_extension_limit() {
        let mut s = GameState::fresh(0);
        s.students.total_students = 3;
        s.last_online_timestamp = 1_000;
        // Two hours away, base cap is one hour.
        let reward = pending_offline_reward(&s, 1_000 + 7_200).unwrap();
        assert_eq!(reward.minutes, 60);
        assert_eq!(reward.mana, Decimal::from(3 * 3_600u32));
        assert_eq!(reward.gold, Decimal::new(150, 2) * Decimal::from(3_600u32));
        // The extension skill stretches the cap.
        s.prestige_skills.offline_extension = 6; // 120 minutes
        let reward = pending_offline_reward(&s, 1_000 + 7_200).unwrap();
        assert_eq!(reward.minutes, 120);
    }

    #[test]
    fn offline_reward_needs_a_full_minute() {
        let mut s = GameState::fresh(0);
        s.students.total_students = 3;
        s.last_online_timestamp = 1_000;
        assert_eq!(pending_offline_reward(&s, 1_059), None);
        assert!(pending_offline_reward(&s, 1_060).is_some());
    }

    #[test]
    fn offline_reward_ignores_a_running_boost() {
        let mut s = GameState::fresh(0);
        s.students.total_students = 2;
        s.boost_remaining_seconds = 600;
        s.last_online_timestamp = 0;
        let reward = pending_offline_reward(&s, 120).unwrap();
        assert_eq!(reward.mana, Decimal::from(2 * 120u32)); // no 4x
    }

    #[test]
    fn claiming_banks_and_optionally_doubles() {
        let mut s = GameState::fresh(0);
        s.students.total_students = 1;
        s.boost_remaining_seconds = 90;
        s.last_online_timestamp = 0;
        let reward = pending_offline_reward(&s, 120).unwrap();
        let plain = claim_offline_reward(&s, &reward, false, 120);
        assert_eq!(plain.mana, reward.mana);
        assert_eq!(plain.last_online_timestamp, 120);
        // The boost drained while away.
        assert_eq!(plain.boost_remaining_seconds, 0);
        let doubled = claim_offline_reward(&s, &reward, true, 120);
        assert_eq!(doubled.mana, reward.mana * Decimal::TWO);
        assert_eq!(doubled.gold, reward.gold * Decimal::TWO);
    }

    proptest! {
        #[test]
        fn random_walks_never_break_invariants(ops in proptest::collection::vec(0u8..8, 1..60)) {
            let mut state = playable_state();
            state.philosophers_stones = 10;
            for op in ops {
                let next = match op {
                    0 => upgrade_department(&state, DepartmentKind::Botany),
                    1 => upgrade_facility(&state, FacilityKind::GreatHall),
                    2 => recruit_student(&state),
                    3 => assign_students(&state, DepartmentKind::Botany, 1),
                    4 => unassign_students(&state, DepartmentKind::Botany, 1),
                    5 => upgrade_prestige_skill(&state, PrestigeSkillKind::GoldBoost),
                    6 => start_boost(&state),
                    7 => Some(tick(&state, state.last_online_timestamp + 1)),
                    _ => unreachable!(),
                };
                if let Some(next) = next {
                    state = next;
                }
                prop_assert!(validate_state(&state).is_ok());
                prop_assert!(state.students.unassigned() <= state.students.total_students);
            }
        }

        #[test]
        fn guarded_ops_leave_state_untouched_or_valid(mana in 0u32..40) {
            let mut s = GameState::fresh(0);
            s.facilities.research_wing = 1;
            s.mana = Decimal::from(mana);
            match upgrade_department(&s, DepartmentKind::AttackMagic) {
                // Cost at level 0 is 10 mana.
                Some(next) => {
                    prop_assert!(mana >= 10);
                    prop_assert_eq!(next.mana, Decimal::from(mana - 10));
                }
                None => prop_assert!(mana < 10),
            }
        }
    }
}
