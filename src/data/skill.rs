use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of voyage skills. Every seat requires exactly one of them.
pub const SKILL_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Skill {
    #[serde(rename = "command_skill", alias = "command", alias = "cmd")]
    Command,
    #[serde(rename = "diplomacy_skill", alias = "diplomacy", alias = "dip")]
    Diplomacy,
    #[serde(rename = "engineering_skill", alias = "engineering", alias = "eng")]
    Engineering,
    #[serde(rename = "medicine_skill", alias = "medicine", alias = "med")]
    Medicine,
    #[serde(rename = "science_skill", alias = "science", alias = "sci")]
    Science,
    #[serde(rename = "security_skill", alias = "security", alias = "sec")]
    Security,
}

impl Skill {
    /// Canonical order used for lineup keys and per-skill arrays.
    pub const ALL: [Skill; SKILL_COUNT] = [
        Skill::Command,
        Skill::Diplomacy,
        Skill::Engineering,
        Skill::Medicine,
        Skill::Science,
        Skill::Security,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Command => 0,
            Self::Diplomacy => 1,
            Self::Engineering => 2,
            Self::Medicine => 3,
            Self::Science => 4,
            Self::Security => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Command => "command_skill",
            Self::Diplomacy => "diplomacy_skill",
            Self::Engineering => "engineering_skill",
            Self::Medicine => "medicine_skill",
            Self::Science => "science_skill",
            Self::Security => "security_skill",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Command => "CMD",
            Self::Diplomacy => "DIP",
            Self::Engineering => "ENG",
            Self::Medicine => "MED",
            Self::Science => "SCI",
            Self::Security => "SEC",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw skill values as supplied by the roster provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillValue {
    pub core: f64,
    #[serde(default)]
    pub range_min: f64,
    #[serde(default)]
    pub range_max: f64,
}

impl SkillValue {
    pub fn proficiency(&self) -> f64 {
        self.range_min + (self.range_max - self.range_min) / 2.0
    }

    /// Core plus average proficiency; the value a voyage actually sees.
    pub fn voyage_score(&self) -> f64 {
        self.core + self.proficiency()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skill_index_matches_canonical_order() {
        for (i, skill) in Skill::ALL.iter().enumerate() {
            assert_eq!(skill.index(), i);
        }
    }

    #[test]
    fn skill_deserializes_long_and_short_names() {
        let long: Skill = serde_json::from_str("\"science_skill\"").expect("long name");
        let short: Skill = serde_json::from_str("\"sci\"").expect("short name");
        assert_eq!(long, Skill::Science);
        assert_eq!(short, Skill::Science);
    }

    #[test]
    fn voyage_score_adds_core_and_average_proficiency() {
        let value = SkillValue {
            core: 1000.0,
            range_min: 100.0,
            range_max: 300.0,
        };
        assert_eq!(value.proficiency(), 200.0);
        assert_eq!(value.voyage_score(), 1200.0);
    }
}
