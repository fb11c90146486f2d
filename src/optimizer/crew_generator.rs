//! Rank-prune-seat assembler: rank the roster, keep a skill-balanced pool,
//! enumerate every 12-crew combination of the pool, prune with the depletion
//! projector and seat the survivors.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::data::{Skill, SkillRole, VoyageConfig, SEAT_COUNT, SKILL_COUNT};
use crate::optimizer::analytical::{ideal_seat_bonus, project};
use crate::optimizer::config::{ProjectorConfig, SearchConfig, StrategyConfig, MAX_POOL_SIZE};
use crate::optimizer::lineup::{aggregate_crew, Lineup, SkillAggregates};
use crate::optimizer::primer::PrimedCrew;
use crate::optimizer::progress::ProgressSink;
use crate::optimizer::seater::{
    match_seats, seat, seat_by_matching, slot_mask, voyager_candidates,
};
use crate::optimizer::OptimizeError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedCrew {
    pub crew: usize,
    pub score: f64,
}

/// Bit `skill.index()` is set when the crew can fill some seat requiring that skill.
pub fn skill_mask(voyage: &VoyageConfig, member: &PrimedCrew) -> u8 {
    voyage
        .seats
        .iter()
        .enumerate()
        .take(SEAT_COUNT)
        .filter(|(index, _)| member.viable_slots[*index])
        .fold(0u8, |mask, (_, seat)| mask | 1 << seat.required_skill.index())
}

/// Substitution depth: for every skill pair touching the voyage primary or
/// secondary skill, the weaker of the two scores.
pub fn depth_score(voyage: &VoyageConfig, member: &PrimedCrew) -> f64 {
    let mut depth = 0.0;
    for (i, a) in Skill::ALL.iter().enumerate() {
        for b in &Skill::ALL[i + 1..] {
            let touches_voyage = [*a, *b]
                .iter()
                .any(|skill| voyage.role_of(*skill) != SkillRole::Other);
            if touches_voyage && member.has_skill(*a) && member.has_skill(*b) {
                depth += member.skill_score(*a).min(member.skill_score(*b));
            }
        }
    }
    depth
}

/// Every `k`-bit subset of `n` bits, ascending, via Gosper's hack.
pub struct Combinations {
    next: Option<u64>,
    limit: u64,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        let next = if k == 0 || k > n || n > 63 {
            None
        } else {
            Some((1u64 << k) - 1)
        };
        Self {
            next,
            limit: 1u64 << n.min(63),
        }
    }
}

impl Iterator for Combinations {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let mask = self.next?;
        let lowest = mask & mask.wrapping_neg();
        let ripple = mask + lowest;
        let following = (((ripple ^ mask) >> 2) / lowest) | ripple;
        self.next = (following < self.limit).then_some(following);
        Some(mask)
    }
}

#[derive(Debug, Clone)]
pub struct CrewGenerator {
    search: SearchConfig,
    projector: ProjectorConfig,
}

impl Default for CrewGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CrewGenerator {
    pub fn new() -> Self {
        Self {
            search: SearchConfig::default(),
            projector: ProjectorConfig::default(),
        }
    }

    pub fn with_config(config: &StrategyConfig) -> Self {
        Self {
            search: config.search.clone(),
            projector: config.projector.clone(),
        }
    }

    /// Viable crew ordered best first. Ties keep roster order.
    pub fn rank(
        &self,
        voyage: &VoyageConfig,
        roster: &[PrimedCrew],
        favor_specialists: bool,
    ) -> Vec<RankedCrew> {
        let specialist = if favor_specialists {
            self.search.specialist_weight
        } else {
            1.0
        };
        let mut ranked: Vec<RankedCrew> = roster
            .iter()
            .enumerate()
            .filter(|(_, member)| member.is_viable())
            .map(|(crew, member)| {
                let total = specialist * (member.primary_score + member.secondary_score)
                    + member.other_score;
                RankedCrew {
                    crew,
                    score: self.search.total_weight * total
                        + self.search.depth_weight * depth_score(voyage, member),
                }
            })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.crew.cmp(&b.crew)));
        ranked
    }

    /// Roster indices of the retained pool, in rank order. The pool never grows
    /// past `pool_size`: topping a skill up to its floor evicts the lowest-ranked
    /// member whose skills all stay above the floor without it.
    pub fn select_pool(
        &self,
        voyage: &VoyageConfig,
        roster: &[PrimedCrew],
        ranked: &[RankedCrew],
    ) -> Vec<usize> {
        let pool_size = self.search.pool_size.clamp(SEAT_COUNT, MAX_POOL_SIZE);
        let floor = self.search.skill_floor;
        let masks: Vec<u8> = ranked
            .iter()
            .map(|entry| skill_mask(voyage, &roster[entry.crew]))
            .collect();
        let mut counts = [0usize; SKILL_COUNT];
        // positions into `ranked`
        let mut chosen: Vec<usize> = Vec::with_capacity(pool_size);

        let tally = |mask: u8, counts: &mut [usize; SKILL_COUNT], add: bool| {
            for (index, count) in counts.iter_mut().enumerate() {
                if mask & 1 << index != 0 {
                    if add {
                        *count += 1;
                    } else {
                        *count -= 1;
                    }
                }
            }
        };

        for (position, &mask) in masks.iter().enumerate() {
            if chosen.len() >= pool_size {
                break;
            }
            let has = |index: usize| mask & 1 << index != 0;
            let over_ceiling = (0..SKILL_COUNT)
                .any(|index| has(index) && counts[index] >= self.search.skill_ceiling);
            let closes_floor = (0..SKILL_COUNT).any(|index| has(index) && counts[index] < floor);
            if over_ceiling && !closes_floor {
                continue;
            }
            tally(mask, &mut counts, true);
            chosen.push(position);
        }

        for skill in Skill::ALL {
            let index = skill.index();
            let bit = 1u8 << index;
            for (position, &mask) in masks.iter().enumerate() {
                if counts[index] >= floor {
                    break;
                }
                if mask & bit == 0 || chosen.contains(&position) {
                    continue;
                }
                if chosen.len() >= pool_size {
                    let evictable = |held: u8| {
                        held & bit == 0
                            && (0..SKILL_COUNT).all(|i| held & 1 << i == 0 || counts[i] > floor)
                    };
                    let victim = chosen
                        .iter()
                        .enumerate()
                        .filter(|(_, held)| evictable(masks[**held]))
                        .max_by_key(|(_, held)| **held)
                        .map(|(slot, _)| slot);
                    let Some(slot) = victim else { break };
                    let evicted = chosen.swap_remove(slot);
                    tally(masks[evicted], &mut counts, false);
                }
                tally(mask, &mut counts, true);
                chosen.push(position);
            }
        }

        chosen.sort_unstable();
        chosen.into_iter().map(|position| ranked[position].crew).collect()
    }

    pub fn generate_lineups(
        &self,
        voyage: &VoyageConfig,
        roster: &[PrimedCrew],
        favor_specialists: bool,
        sink: &mut dyn ProgressSink,
    ) -> Result<Vec<Lineup>, OptimizeError> {
        let ranked = self.rank(voyage, roster, favor_specialists);
        if ranked.len() < SEAT_COUNT {
            return Err(OptimizeError::NotEnoughCrew {
                viable: ranked.len(),
                required: SEAT_COUNT,
            });
        }
        sink.progress(&format!("Ranked {} viable crew", ranked.len()));

        let pool = self.select_pool(voyage, roster, &ranked);
        sink.progress(&format!("Considering a pool of {} crew", pool.len()));
        let rank_scores: HashMap<&str, f64> = ranked
            .iter()
            .map(|entry| (roster[entry.crew].id.as_str(), entry.score))
            .collect();

        let survivors = self.prune(voyage, roster, &pool, sink);
        sink.progress(&format!("Seating {} combinations", survivors.len()));

        let ideal_bonus = ideal_seat_bonus(&self.projector);
        let mut seen = HashSet::new();
        let mut lineups = Vec::new();
        for mask in survivors {
            let members: Vec<usize> = (0..pool.len())
                .filter(|bit| mask & 1 << bit != 0)
                .map(|bit| pool[bit])
                .collect();
            let score_of = |member: &PrimedCrew| {
                rank_scores.get(member.id.as_str()).copied().unwrap_or(0.0)
            };
            let candidates = voyager_candidates(roster, &members, score_of, ideal_bonus);
            let lineup = seat(voyage, roster, &candidates, sink)
                .or_else(|| seat_by_matching(voyage, roster, &members));
            if let Some(lineup) = lineup {
                if seen.insert(lineup.key.clone()) {
                    lineups.push(lineup);
                }
            }
        }

        if lineups.is_empty() {
            return Err(OptimizeError::NoViableLineup);
        }
        sink.progress(&format!("Assembled {} distinct lineups", lineups.len()));
        Ok(lineups)
    }

    /// Seatable combinations (as pool bitmasks) that cover every skill and
    /// project at or above the mean, best first, capped at the combination ceiling.
    fn prune(
        &self,
        voyage: &VoyageConfig,
        roster: &[PrimedCrew],
        pool: &[usize],
        sink: &mut dyn ProgressSink,
    ) -> Vec<u64> {
        let mut coverage = [0u64; SKILL_COUNT];
        let mut singles: Vec<SkillAggregates> = Vec::with_capacity(pool.len());
        let mut seats: Vec<u16> = Vec::with_capacity(pool.len());
        for (bit, crew) in pool.iter().enumerate() {
            let mask = skill_mask(voyage, &roster[*crew]);
            for (index, members) in coverage.iter_mut().enumerate() {
                if mask & 1 << index != 0 {
                    *members |= 1 << bit;
                }
            }
            singles.push(aggregate_crew([&roster[*crew]]));
            seats.push(slot_mask(&roster[*crew].viable_slots));
        }

        let ceiling = self.search.combination_ceiling.max(1);
        let mut best: BinaryHeap<Reverse<(u32, Reverse<u64>)>> =
            BinaryHeap::with_capacity(ceiling + 1);
        let mut enumerated = 0usize;
        let mut covered = 0usize;
        let mut seatable = 0usize;
        let mut tick_sum = 0.0;
        for mask in Combinations::new(pool.len(), SEAT_COUNT) {
            if enumerated >= self.search.enumeration_budget && seatable > 0 {
                sink.progress(&format!(
                    "Stopping after {enumerated} combinations with {seatable} seatable"
                ));
                break;
            }
            enumerated += 1;
            let enough = coverage.iter().all(|members| {
                (members & mask).count_ones() as usize >= self.search.min_crew_per_skill
            });
            if !enough {
                continue;
            }
            covered += 1;

            let mut member_seats = [0u16; SEAT_COUNT];
            let mut skills = aggregate_crew(std::iter::empty());
            let mut filled = 0;
            for (bit, single) in singles.iter().enumerate() {
                if mask & 1 << bit == 0 {
                    continue;
                }
                member_seats[filled] = seats[bit];
                filled += 1;
                for (agg, part) in skills.iter_mut().zip(single.iter()) {
                    agg.core += part.core;
                    agg.range_min += part.range_min;
                    agg.range_max += part.range_max;
                    agg.voyage_score += part.voyage_score;
                }
            }
            if match_seats(&member_seats, &[]).is_none() {
                continue;
            }
            seatable += 1;

            let ticks = project(voyage, voyage.ship_antimatter, &skills, &self.projector).ticks;
            tick_sum += f64::from(ticks);
            best.push(Reverse((ticks, Reverse(mask))));
            if best.len() > ceiling {
                best.pop();
            }
        }

        if seatable == 0 {
            sink.progress(&format!(
                "None of {enumerated} combinations ({covered} covering every skill) can be seated"
            ));
            return Vec::new();
        }

        let mean = tick_sum / seatable as f64;
        let mut kept: Vec<(u32, u64)> = best
            .into_iter()
            .map(|Reverse((ticks, Reverse(mask)))| (ticks, mask))
            .filter(|(ticks, _)| f64::from(*ticks) >= mean)
            .collect();
        kept.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        sink.progress(&format!(
            "Projected {seatable} seatable of {enumerated} combinations; keeping {}",
            kept.len()
        ));

        kept.into_iter().map(|(_, mask)| mask).collect()
    }
}
