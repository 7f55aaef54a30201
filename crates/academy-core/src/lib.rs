#![deny(warnings)]

//! Core domain model and invariants for Arcane Academy.
//!
//! This crate defines the serializable game-state snapshot shared across the
//! simulation, with validation helpers to guarantee basic invariants. Level
//! tables are fixed-size structs keyed by the kind enums, so a "missing map
//! entry" is structurally impossible; blobs written before a kind existed
//! backfill that slot to level 0 on deserialization.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Academic departments. Each affects production, power, or prestige yield.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DepartmentKind {
    AttackMagic,
    Botany,
    DefenseMagic,
    AncientMagic,
    MagicCreatureStudies,
}

impl DepartmentKind {
    /// All kinds, in display order.
    pub const ALL: [DepartmentKind; 5] = [
        DepartmentKind::AttackMagic,
        DepartmentKind::Botany,
        DepartmentKind::DefenseMagic,
        DepartmentKind::AncientMagic,
        DepartmentKind::MagicCreatureStudies,
    ];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            DepartmentKind::AttackMagic => "Attack Magic",
            DepartmentKind::Botany => "Botany",
            DepartmentKind::DefenseMagic => "Defense Magic",
            DepartmentKind::AncientMagic => "Ancient Magic",
            DepartmentKind::MagicCreatureStudies => "Magic Creature Studies",
        }
    }
}

/// School facilities. Each unlocks capacity or scales another subsystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FacilityKind {
    GreatHall,
    ResearchWing,
    DimensionalLibrary,
    BreedingHut,
}

impl FacilityKind {
    /// All kinds, in display order.
    pub const ALL: [FacilityKind; 4] = [
        FacilityKind::GreatHall,
        FacilityKind::ResearchWing,
        FacilityKind::DimensionalLibrary,
        FacilityKind::BreedingHut,
    ];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            FacilityKind::GreatHall => "Great Hall",
            FacilityKind::ResearchWing => "Research Wing",
            FacilityKind::DimensionalLibrary => "Dimensional Library",
            FacilityKind::BreedingHut => "Breeding Hut",
        }
    }
}

/// Permanent skills bought with philosopher's stones; they survive prestige.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrestigeSkillKind {
    ManaBoost,
    GoldBoost,
    ResearchDiscount,
    FacilityDiscount,
    StoneBoost,
    OfflineExtension,
    MagicalPowerBoost,
    RewardBoost,
}

impl PrestigeSkillKind {
    /// All kinds, in display order.
    pub const ALL: [PrestigeSkillKind; 8] = [
        PrestigeSkillKind::ManaBoost,
        PrestigeSkillKind::GoldBoost,
        PrestigeSkillKind::ResearchDiscount,
        PrestigeSkillKind::FacilityDiscount,
        PrestigeSkillKind::StoneBoost,
        PrestigeSkillKind::OfflineExtension,
        PrestigeSkillKind::MagicalPowerBoost,
        PrestigeSkillKind::RewardBoost,
    ];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            PrestigeSkillKind::ManaBoost => "Mana Production",
            PrestigeSkillKind::GoldBoost => "Gold Production",
            PrestigeSkillKind::ResearchDiscount => "Research Discount",
            PrestigeSkillKind::FacilityDiscount => "Construction Discount",
            PrestigeSkillKind::StoneBoost => "Stone Yield",
            PrestigeSkillKind::OfflineExtension => "Extended Absence",
            PrestigeSkillKind::MagicalPowerBoost => "Power Attunement",
            PrestigeSkillKind::RewardBoost => "Reward Attunement",
        }
    }
}

/// Department levels, one slot per [`DepartmentKind`].
///
/// Slots added in later releases deserialize to 0 from older blobs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DepartmentLevels {
    pub attack_magic: u32,
    pub botany: u32,
    pub defense_magic: u32,
    pub ancient_magic: u32,
    pub magic_creature_studies: u32,
}

impl DepartmentLevels {
    /// Level of one department.
    pub fn level(&self, kind: DepartmentKind) -> u32 {
        match kind {
            DepartmentKind::AttackMagic => self.attack_magic,
            DepartmentKind::Botany => self.botany,
            DepartmentKind::DefenseMagic => self.defense_magic,
            DepartmentKind::AncientMagic => self.ancient_magic,
            DepartmentKind::MagicCreatureStudies => self.magic_creature_studies,
        }
    }

    /// Mutable slot for one department.
    pub fn level_mut(&mut self, kind: DepartmentKind) -> &mut u32 {
        match kind {
            DepartmentKind::AttackMagic => &mut self.attack_magic,
            DepartmentKind::Botany => &mut self.botany,
            DepartmentKind::DefenseMagic => &mut self.defense_magic,
            DepartmentKind::AncientMagic => &mut self.ancient_magic,
            DepartmentKind::MagicCreatureStudies => &mut self.magic_creature_studies,
        }
    }
}

/// Facility levels, one slot per [`FacilityKind`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FacilityLevels {
    pub great_hall: u32,
    pub research_wing: u32,
    pub dimensional_library: u32,
    pub breeding_hut: u32,
}

impl FacilityLevels {
    /// Level of one facility.
    pub fn level(&self, kind: FacilityKind) -> u32 {
        match kind {
            FacilityKind::GreatHall => self.great_hall,
            FacilityKind::ResearchWing => self.research_wing,
            FacilityKind::DimensionalLibrary => self.dimensional_library,
            FacilityKind::BreedingHut => self.breeding_hut,
        }
    }

    /// Mutable slot for one facility.
    pub fn level_mut(&mut self, kind: FacilityKind) -> &mut u32 {
        match kind {
            FacilityKind::GreatHall => &mut self.great_hall,
            FacilityKind::ResearchWing => &mut self.research_wing,
            FacilityKind::DimensionalLibrary => &mut self.dimensional_library,
            FacilityKind::BreedingHut => &mut self.breeding_hut,
        }
    }
}

/// Prestige skill levels, one slot per [`PrestigeSkillKind`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrestigeSkillLevels {
    pub mana_boost: u32,
    pub gold_boost: u32,
    pub research_discount: u32,
    pub facility_discount: u32,
    pub stone_boost: u32,
    pub offline_extension: u32,
    pub magical_power_boost: u32,
    pub reward_boost: u32,
}

impl PrestigeSkillLevels {
    /// Level of one skill.
    pub fn level(&self, kind: PrestigeSkillKind) -> u32 {
        match kind {
            PrestigeSkillKind::ManaBoost => self.mana_boost,
            PrestigeSkillKind::GoldBoost => self.gold_boost,
            PrestigeSkillKind::ResearchDiscount => self.research_discount,
            PrestigeSkillKind::FacilityDiscount => self.facility_discount,
            PrestigeSkillKind::StoneBoost => self.stone_boost,
            PrestigeSkillKind::OfflineExtension => self.offline_extension,
            PrestigeSkillKind::MagicalPowerBoost => self.magical_power_boost,
            PrestigeSkillKind::RewardBoost => self.reward_boost,
        }
    }

    /// Mutable slot for one skill.
    pub fn level_mut(&mut self, kind: PrestigeSkillKind) -> &mut u32 {
        match kind {
            PrestigeSkillKind::ManaBoost => &mut self.mana_boost,
            PrestigeSkillKind::GoldBoost => &mut self.gold_boost,
            PrestigeSkillKind::ResearchDiscount => &mut self.research_discount,
            PrestigeSkillKind::FacilityDiscount => &mut self.facility_discount,
            PrestigeSkillKind::StoneBoost => &mut self.stone_boost,
            PrestigeSkillKind::OfflineExtension => &mut self.offline_extension,
            PrestigeSkillKind::MagicalPowerBoost => &mut self.magical_power_boost,
            PrestigeSkillKind::RewardBoost => &mut self.reward_boost,
        }
    }
}

/// Specialized-student counts, one slot per [`DepartmentKind`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpecializedStudents {
    pub attack_magic: u32,
    pub botany: u32,
    pub defense_magic: u32,
    pub ancient_magic: u32,
    pub magic_creature_studies: u32,
}

impl SpecializedStudents {
    /// Students assigned to one department.
    pub fn count(&self, kind: DepartmentKind) -> u32 {
        match kind {
            DepartmentKind::AttackMagic => self.attack_magic,
            DepartmentKind::Botany => self.botany,
            DepartmentKind::DefenseMagic => self.defense_magic,
            DepartmentKind::AncientMagic => self.ancient_magic,
            DepartmentKind::MagicCreatureStudies => self.magic_creature_studies,
        }
    }

    /// Mutable slot for one department.
    pub fn count_mut(&mut self, kind: DepartmentKind) -> &mut u32 {
        match kind {
            DepartmentKind::AttackMagic => &mut self.attack_magic,
            DepartmentKind::Botany => &mut self.botany,
            DepartmentKind::DefenseMagic => &mut self.defense_magic,
            DepartmentKind::AncientMagic => &mut self.ancient_magic,
            DepartmentKind::MagicCreatureStudies => &mut self.magic_creature_studies,
        }
    }

    /// Total assigned across all departments.
    pub fn assigned(&self) -> u32 {
        DepartmentKind::ALL.iter().map(|k| self.count(*k)).sum()
    }
}

/// Student roster: a headcount plus per-department assignments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentBody {
    /// Total enrolled students (>= assigned).
    pub total_students: u32,
    /// Per-department specialization assignments.
    pub specialized_students: SpecializedStudents,
}

impl StudentBody {
    /// Students not assigned to any department. Never negative for a valid
    /// state; saturates rather than underflows on a corrupt one.
    pub fn unassigned(&self) -> u32 {
        self.total_students
            .saturating_sub(self.specialized_students.assigned())
    }
}

/// Full snapshot of player progress. The single mutable instance is owned
/// by the running session; every transition replaces it wholesale.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameState {
    /// Set once at first run; immutable thereafter.
    pub school_name: String,
    /// Spendable currency accrued per tick; pays for departments/students.
    pub mana: Decimal,
    /// Spendable currency accrued per tick; pays for facilities.
    pub gold: Decimal,
    /// Derived score. Recomputed after every mutating operation, never
    /// written directly by an action handler.
    pub total_magical_power: Decimal,
    /// Permanent currency; survives prestige.
    pub philosophers_stones: u64,
    pub departments: DepartmentLevels,
    pub facilities: FacilityLevels,
    pub students: StudentBody,
    /// Permanent upgrades; survive prestige.
    pub prestige_skills: PrestigeSkillLevels,
    /// Seconds left on the temporary production boost; 0 means inactive.
    pub boost_remaining_seconds: u32,
    /// Epoch seconds, stamped every tick; drives offline catch-up.
    pub last_online_timestamp: i64,
}

impl GameState {
    /// A brand-new save, online as of `now`.
    pub fn fresh(now: i64) -> Self {
        GameState {
            last_online_timestamp: now,
            ..GameState::default()
        }
    }
}

/// Validation errors for snapshot invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Currencies and power must be non-negative.
    #[error("negative currency or power value")]
    NegativeValue,
    /// Assigned students may not exceed the enrolled total.
    #[error("assigned students ({assigned}) exceed total students ({total})")]
    OverAssigned { assigned: u32, total: u32 },
}

/// Validate a snapshot's cross-field invariants.
pub fn validate_state(state: &GameState) -> Result<(), ValidationError> {
    if state.mana < Decimal::ZERO
        || state.gold < Decimal::ZERO
        || state.total_magical_power < Decimal::ZERO
    {
        return Err(ValidationError::NegativeValue);
    }
    let assigned = state.students.specialized_students.assigned();
    if assigned > state.students.total_students {
        return Err(ValidationError::OverAssigned {
            assigned,
            total: state.students.total_students,
        });
    }
    Ok(())
}
