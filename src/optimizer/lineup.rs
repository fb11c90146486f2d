//! Lineup aggregation: reduce a completed seat assignment into a canonical,
//! scored, deduplicable lineup.

use serde::Serialize;

use crate::data::voyage::TRAIT_ANTIMATTER_BONUS;
use crate::data::{Skill, SkillValue, VoyageConfig, SEAT_COUNT, SKILL_COUNT};
use crate::optimizer::primer::PrimedCrew;
use crate::optimizer::seater::SeatAssignment;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SkillAggregate {
    pub skill: Skill,
    pub core: f64,
    pub range_min: f64,
    pub range_max: f64,
    pub voyage_score: f64,
}

impl SkillAggregate {
    fn empty(skill: Skill) -> Self {
        Self {
            skill,
            core: 0.0,
            range_min: 0.0,
            range_max: 0.0,
            voyage_score: 0.0,
        }
    }

    fn add(&mut self, value: &SkillValue) {
        self.core += value.core;
        self.range_min += value.range_min;
        self.range_max += value.range_max;
        self.voyage_score += value.voyage_score();
    }

    /// Half the proficiency spread; hazard rolls land within `voyage_score ± half_range`.
    pub fn half_range(&self) -> f64 {
        (self.range_max - self.range_min).max(0.0) / 2.0
    }
}

pub type SkillAggregates = [SkillAggregate; SKILL_COUNT];

/// Sum every skill of every crew member. Seating does not change these totals.
pub fn aggregate_crew<'a>(crew: impl IntoIterator<Item = &'a PrimedCrew>) -> SkillAggregates {
    let mut aggregates = Skill::ALL.map(SkillAggregate::empty);
    for member in crew {
        for (skill, value) in &member.skills {
            aggregates[skill.index()].add(value);
        }
    }
    aggregates
}

/// Canonical dedup key: floored voyage score of each skill in canonical order.
pub fn lineup_key(aggregates: &SkillAggregates) -> String {
    aggregates
        .iter()
        .map(|agg| format!("{}", agg.voyage_score.floor() as i64))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineupSeat {
    pub seat: usize,
    pub skill: Skill,
    pub bonus_trait: String,
    pub crew_id: String,
    pub crew_name: String,
    pub ideal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lineup {
    pub key: String,
    pub seats: Vec<LineupSeat>,
    pub skills: SkillAggregates,
    pub total_score: f64,
    pub ideal_count: usize,
    pub antimatter_bonus: i32,
    /// Ship antimatter plus the trait bonus; what the voyage starts with.
    pub antimatter: i32,
}

impl Lineup {
    pub fn skill(&self, skill: Skill) -> &SkillAggregate {
        &self.skills[skill.index()]
    }

    pub fn crew_ids(&self) -> impl Iterator<Item = &str> {
        self.seats.iter().map(|seat| seat.crew_id.as_str())
    }

    pub fn score_of(&self, skill: Skill) -> f64 {
        self.skill(skill).voyage_score
    }
}

/// Build the lineup for a fully seated assignment.
///
/// # Panics
/// When a seat is empty or a crew member sits twice; both mean the seater is broken.
pub fn build_lineup(
    voyage: &VoyageConfig,
    roster: &[PrimedCrew],
    assignment: &SeatAssignment,
) -> Lineup {
    assignment.assert_consistent();

    let mut seats = Vec::with_capacity(SEAT_COUNT);
    let mut seated = Vec::with_capacity(SEAT_COUNT);
    for (index, slot) in assignment.slots().iter().enumerate() {
        let placement = match slot {
            Some(placement) => placement,
            None => panic!("seat {index} is empty in a completed assignment"),
        };
        let member = &roster[placement.crew];
        let seat = &voyage.seats[index];
        seats.push(LineupSeat {
            seat: index,
            skill: seat.required_skill,
            bonus_trait: seat.bonus_trait.clone(),
            crew_id: member.id.clone(),
            crew_name: member.name.clone(),
            ideal: placement.ideal,
        });
        seated.push(member);
    }

    let skills = aggregate_crew(seated);
    let ideal_count = seats.iter().filter(|seat| seat.ideal).count();
    let antimatter_bonus = TRAIT_ANTIMATTER_BONUS * ideal_count as i32;

    Lineup {
        key: lineup_key(&skills),
        total_score: skills.iter().map(|agg| agg.voyage_score).sum(),
        skills,
        seats,
        ideal_count,
        antimatter_bonus,
        antimatter: voyage.ship_antimatter + antimatter_bonus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::voyage::fixtures::standard_voyage;
    use crate::optimizer::primer::fixtures::crew;
    use crate::optimizer::primer::{prime_crew, PrimeMode};

    #[test]
    fn aggregates_sum_all_skills_of_all_crew() {
        let voyage = standard_voyage(Skill::Command, Skill::Science, 2500);
        let a = prime_crew(
            &voyage,
            &crew("a", &[(Skill::Command, 1000.0), (Skill::Science, 400.0)], &[]),
            PrimeMode::Standard,
        );
        let b = prime_crew(&voyage, &crew("b", &[(Skill::Command, 500.0)], &[]), PrimeMode::Standard);
        let aggregates = aggregate_crew([&a, &b]);
        let command = aggregates[Skill::Command.index()];
        assert_eq!(command.core, 1500.0);
        assert_eq!(command.range_min, 200.0);
        assert_eq!(command.range_max, 600.0);
        assert_eq!(command.voyage_score, 1500.0 + 400.0);
        assert_eq!(command.half_range(), 200.0);
        assert_eq!(aggregates[Skill::Science.index()].voyage_score, 600.0);
    }

    #[test]
    fn key_floors_scores_in_canonical_order() {
        let mut aggregates = Skill::ALL.map(SkillAggregate::empty);
        aggregates[0].voyage_score = 1234.9;
        aggregates[5].voyage_score = 10.2;
        assert_eq!(lineup_key(&aggregates), "1234,0,0,0,0,10");
    }
}
