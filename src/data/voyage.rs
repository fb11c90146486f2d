use serde::{Deserialize, Serialize};

use crate::data::skill::Skill;

/// Number of seats on every voyage.
pub const SEAT_COUNT: usize = 12;
/// Antimatter granted for each crew member seated in a trait-matched seat.
pub const TRAIT_ANTIMATTER_BONUS: i32 = 25;

pub const SECONDS_PER_TICK: u32 = 20;
pub const TICKS_PER_HOUR: u32 = 3600 / SECONDS_PER_TICK;
/// A hazard is rolled every 4th tick (80 s).
pub const HAZARD_TICK_INTERVAL: u32 = 4;
/// Every 28th tick is a reward tick instead of a hazard.
pub const REWARD_TICK_INTERVAL: u32 = 28;
/// A dilemma every two hours.
pub const DILEMMA_TICK_INTERVAL: u32 = 2 * TICKS_PER_HOUR;
pub const HAZARD_PASS_ANTIMATTER: i32 = 5;
pub const HAZARD_FAIL_ANTIMATTER: i32 = 30;
pub const ACTIVITY_ANTIMATTER: i32 = 1;
/// Hazard difficulty grows by this much skill per elapsed tick.
pub const HAZARD_SKILL_PER_TICK: f64 = 7.0;
/// Dilithium needed per minute of elapsed voyage time to refill antimatter.
pub const REFILL_MINUTES_PER_DILITHIUM: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoyageSkills {
    #[serde(alias = "primary_skill")]
    pub primary: Skill,
    #[serde(alias = "secondary_skill")]
    pub secondary: Skill,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatConfig {
    #[serde(alias = "requiredSkill", alias = "skill")]
    pub required_skill: Skill,
    #[serde(alias = "bonusTrait", alias = "trait")]
    pub bonus_trait: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoyageConfig {
    pub skills: VoyageSkills,
    pub seats: Vec<SeatConfig>,
    #[serde(alias = "shipAntimatter", alias = "max_hp")]
    pub ship_antimatter: i32,
}

/// How a skill counts toward hazard selection on a given voyage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillRole {
    Primary,
    Secondary,
    Other,
}

impl SkillRole {
    /// Share of hazards that test a skill in this role.
    pub fn hazard_weight(self) -> f64 {
        match self {
            Self::Primary => 0.35,
            Self::Secondary => 0.25,
            Self::Other => 0.10,
        }
    }
}

impl VoyageConfig {
    pub fn primary(&self) -> Skill {
        self.skills.primary
    }

    pub fn secondary(&self) -> Skill {
        self.skills.secondary
    }

    pub fn role_of(&self, skill: Skill) -> SkillRole {
        if skill == self.skills.primary {
            SkillRole::Primary
        } else if skill == self.skills.secondary {
            SkillRole::Secondary
        } else {
            SkillRole::Other
        }
    }

    /// The four skills that are neither primary nor secondary, in canonical order.
    pub fn other_skills(&self) -> Vec<Skill> {
        Skill::ALL
            .into_iter()
            .filter(|skill| self.role_of(*skill) == SkillRole::Other)
            .collect()
    }

    /// Seat indices requiring `skill`.
    pub fn seats_for(&self, skill: Skill) -> Vec<usize> {
        self.seats
            .iter()
            .enumerate()
            .filter(|(_, seat)| seat.required_skill == skill)
            .map(|(index, _)| index)
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Standard seat layout: two seats per skill in canonical order, one trait each.
    pub fn standard_voyage(primary: Skill, secondary: Skill, ship_antimatter: i32) -> VoyageConfig {
        let traits = [
            "cultural_figure",
            "diplomat",
            "engineer",
            "doctor",
            "scientist",
            "marksman",
            "pilot",
            "hero",
            "telepath",
            "federation",
            "tactician",
            "civilian",
        ];
        let seats = Skill::ALL
            .iter()
            .flat_map(|skill| [*skill, *skill])
            .zip(traits)
            .map(|(skill, bonus_trait)| SeatConfig {
                required_skill: skill,
                bonus_trait: bonus_trait.to_string(),
            })
            .collect();
        VoyageConfig {
            skills: VoyageSkills { primary, secondary },
            seats,
            ship_antimatter,
        }
    }
}
