//! Roster priming: turn raw crew records into scored, slot-annotated candidates
//! for one voyage configuration.

use std::collections::BTreeMap;

use crate::data::{CrewRecord, Skill, SkillRole, SkillValue, VoyageConfig, SEAT_COUNT};

/// One roster member scored against one voyage. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimedCrew {
    pub id: String,
    pub name: String,
    pub skills: BTreeMap<Skill, SkillValue>,
    /// Seat `i` requires a skill this crew has.
    pub viable_slots: [bool; SEAT_COUNT],
    /// Seat `i` grants its bonus trait to this crew.
    pub trait_slots: [bool; SEAT_COUNT],
    pub primary_score: f64,
    pub secondary_score: f64,
    pub other_score: f64,
}

impl PrimedCrew {
    pub fn is_viable(&self) -> bool {
        self.viable_slots.iter().any(|v| *v)
    }

    pub fn is_ideal_for(&self, seat: usize) -> bool {
        self.viable_slots[seat] && self.trait_slots[seat]
    }

    pub fn has_ideal_seat(&self) -> bool {
        (0..SEAT_COUNT).any(|seat| self.is_ideal_for(seat))
    }

    pub fn skill_score(&self, skill: Skill) -> f64 {
        self.skills
            .get(&skill)
            .map(SkillValue::voyage_score)
            .unwrap_or(0.0)
    }

    pub fn has_skill(&self, skill: Skill) -> bool {
        self.skills.contains_key(&skill)
    }

    pub fn total_score(&self) -> f64 {
        self.primary_score + self.secondary_score + self.other_score
    }

    pub fn boosted_score(&self, boosts: Boosts) -> f64 {
        self.primary_score * boosts.primary
            + self.secondary_score * boosts.secondary
            + self.other_score * boosts.other
    }
}

/// Multipliers applied to primary/secondary/other scores before ranking.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Boosts {
    pub primary: f64,
    pub secondary: f64,
    pub other: f64,
}

impl Default for Boosts {
    fn default() -> Self {
        Self {
            primary: 1.0,
            secondary: 1.0,
            other: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimeMode {
    #[default]
    Standard,
    /// Only trait-matched seats count as viable.
    PeakAntimatter,
}

pub fn prime_crew(voyage: &VoyageConfig, crew: &CrewRecord, mode: PrimeMode) -> PrimedCrew {
    let mut primary_score = 0.0;
    let mut secondary_score = 0.0;
    let mut other_score = 0.0;

    for (skill, value) in &crew.skills {
        let score = value.voyage_score();
        match voyage.role_of(*skill) {
            SkillRole::Primary => primary_score = score,
            SkillRole::Secondary => secondary_score = score,
            SkillRole::Other => other_score += score,
        }
    }

    let mut viable_slots = [false; SEAT_COUNT];
    let mut trait_slots = [false; SEAT_COUNT];
    for (index, seat) in voyage.seats.iter().take(SEAT_COUNT).enumerate() {
        trait_slots[index] = crew.has_trait(&seat.bonus_trait);
        viable_slots[index] = crew.has_skill(seat.required_skill)
            && (mode == PrimeMode::Standard || trait_slots[index]);
    }

    PrimedCrew {
        id: crew.id.clone(),
        name: crew.name.clone(),
        skills: crew.skills.clone(),
        viable_slots,
        trait_slots,
        primary_score,
        secondary_score,
        other_score,
    }
}

pub fn prime_roster(voyage: &VoyageConfig, crew: &[CrewRecord], mode: PrimeMode) -> Vec<PrimedCrew> {
    crew.iter()
        .map(|member| prime_crew(voyage, member, mode))
        .collect()
}


#[cfg(test)]
mod tests {
    use super::fixtures::crew;
    use super::*;
    use crate::data::voyage::fixtures::standard_voyage;

    #[test]
    fn scores_are_routed_by_voyage_role() {
        let voyage = standard_voyage(Skill::Command, Skill::Science, 2500);
        let member = crew(
            "picard",
            &[
                (Skill::Command, 1000.0),
                (Skill::Science, 500.0),
                (Skill::Diplomacy, 300.0),
                (Skill::Medicine, 100.0),
            ],
            &[],
        );
        let primed = prime_crew(&voyage, &member, PrimeMode::Standard);
        assert_eq!(primed.primary_score, 1200.0);
        assert_eq!(primed.secondary_score, 700.0);
        assert_eq!(primed.other_score, 500.0 + 300.0);
    }

    #[test]
    fn both_seats_of_a_skill_pair_become_viable() {
        let voyage = standard_voyage(Skill::Command, Skill::Science, 2500);
        let member = crew("data", &[(Skill::Engineering, 900.0)], &["engineer"]);
        let primed = prime_crew(&voyage, &member, PrimeMode::Standard);
        let viable: Vec<usize> = (0..SEAT_COUNT).filter(|i| primed.viable_slots[*i]).collect();
        assert_eq!(viable, vec![4, 5]);
        assert!(primed.trait_slots[2]);
        assert!(!primed.is_ideal_for(2), "trait without the skill is not ideal");
    }

    #[test]
    fn crew_without_voyage_skills_is_unviable_everywhere() {
        let voyage = standard_voyage(Skill::Command, Skill::Science, 2500);
        let member = crew("tribble", &[], &["pilot"]);
        let primed = prime_crew(&voyage, &member, PrimeMode::Standard);
        assert!(!primed.is_viable());
        assert_eq!(primed.total_score(), 0.0);
    }

    #[test]
    fn peak_antimatter_keeps_only_trait_matched_seats() {
        let voyage = standard_voyage(Skill::Command, Skill::Science, 2500);
        let member = crew("sulu", &[(Skill::Command, 800.0)], &["CULTURAL_FIGURE"]);
        let primed = prime_crew(&voyage, &member, PrimeMode::PeakAntimatter);
        assert!(primed.viable_slots[0]);
        assert!(!primed.viable_slots[1]);
        let standard = prime_crew(&voyage, &member, PrimeMode::Standard);
        assert!(standard.viable_slots[1]);
    }
}
