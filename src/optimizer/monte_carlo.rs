use rayon::prelude::*;
use serde::Serialize;

use crate::data::voyage::{
    ACTIVITY_ANTIMATTER, DILEMMA_TICK_INTERVAL, HAZARD_FAIL_ANTIMATTER, HAZARD_PASS_ANTIMATTER,
    HAZARD_SKILL_PER_TICK, HAZARD_TICK_INTERVAL, REFILL_MINUTES_PER_DILITHIUM,
    REWARD_TICK_INTERVAL, TICKS_PER_HOUR,
};
use crate::data::{VoyageConfig, SKILL_COUNT};
use crate::optimizer::config::EstimatorConfig;
use crate::optimizer::lineup::{Lineup, SkillAggregates};
use crate::optimizer::rng::{stable_seed, Rng};

const PRIMARY_HAZARD_SHARE: f64 = 0.35;
const SECONDARY_HAZARD_SHARE: f64 = 0.25;
const TWENTY_HOURS: f64 = 20.0;

pub fn ticks_to_hours(ticks: u32) -> f64 {
    f64::from(ticks) / f64::from(TICKS_PER_HOUR)
}

/// Runtime knobs for one estimation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSettings {
    pub simulations: usize,
    pub extensions: usize,
    pub max_ticks: u32,
    pub max_20_hour_sims: usize,
    /// When off, hazard rolls ignore proficiency spread and compare the voyage score directly.
    pub luck_factor: bool,
}

impl SimulationSettings {
    pub fn from_config(config: &EstimatorConfig, luck_factor: bool) -> Self {
        Self {
            simulations: config.simulations,
            extensions: config.extensions,
            max_ticks: config.max_ticks,
            max_20_hour_sims: config.max_20_hour_sims,
            luck_factor,
        }
    }
}

/// Duration distribution after `extension` refills (0 = no refill).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefillEstimate {
    pub extension: usize,
    pub median_ticks: u32,
    /// 10th percentile.
    pub safe_ticks: u32,
    /// 1st percentile.
    pub safer_ticks: u32,
    pub safest_ticks: u32,
    /// 99th percentile.
    pub moonshot_ticks: u32,
    pub median_hours: f64,
    pub last_dilemma_hour: u32,
    /// Percent of runs that reach the last dilemma.
    pub dilemma_chance: u32,
    /// Average dilithium spent on refills to reach this level.
    pub refill_cost: u32,
}

impl RefillEstimate {
    fn empty(extension: usize) -> Self {
        Self {
            extension,
            median_ticks: 0,
            safe_ticks: 0,
            safer_ticks: 0,
            safest_ticks: 0,
            moonshot_ticks: 0,
            median_hours: 0.0,
            last_dilemma_hour: 0,
            dilemma_chance: 0,
            refill_cost: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimate {
    pub refills: Vec<RefillEstimate>,
    pub dilithium_20_hours: u32,
    pub refills_20_hours: u32,
    pub simulations: usize,
    pub starting_antimatter: i32,
    /// At least one run hit the tick ceiling before exhausting antimatter.
    pub truncated: bool,
}

impl Estimate {
    fn empty(extensions: usize, starting_antimatter: i32) -> Self {
        Self {
            refills: (0..=extensions).map(RefillEstimate::empty).collect(),
            dilithium_20_hours: 0,
            refills_20_hours: 0,
            simulations: 0,
            starting_antimatter,
            truncated: false,
        }
    }

    fn base(&self) -> Option<&RefillEstimate> {
        self.refills.first()
    }

    pub fn median_ticks(&self) -> u32 {
        self.base().map_or(0, |r| r.median_ticks)
    }

    pub fn minimum_ticks(&self) -> u32 {
        self.base().map_or(0, |r| r.safe_ticks)
    }

    pub fn moonshot_ticks(&self) -> u32 {
        self.base().map_or(0, |r| r.moonshot_ticks)
    }

    pub fn safest_ticks(&self) -> u32 {
        self.base().map_or(0, |r| r.safest_ticks)
    }
}

struct HazardTable {
    primary: usize,
    secondary: usize,
    others: Vec<usize>,
    scores: [f64; SKILL_COUNT],
    spreads: [f64; SKILL_COUNT],
}

impl HazardTable {
    fn new(voyage: &VoyageConfig, skills: &SkillAggregates, luck_factor: bool) -> Self {
        let mut scores = [0.0; SKILL_COUNT];
        let mut spreads = [0.0; SKILL_COUNT];
        for agg in skills {
            let index = agg.skill.index();
            scores[index] = agg.voyage_score;
            if luck_factor {
                spreads[index] = agg.half_range();
            }
        }
        Self {
            primary: voyage.primary().index(),
            secondary: voyage.secondary().index(),
            others: voyage.other_skills().iter().map(|skill| skill.index()).collect(),
            scores,
            spreads,
        }
    }

    fn pick_skill(&self, rng: &mut Rng) -> usize {
        let roll = rng.next_f64();
        if roll < PRIMARY_HAZARD_SHARE {
            self.primary
        } else if roll < PRIMARY_HAZARD_SHARE + SECONDARY_HAZARD_SHARE || self.others.is_empty() {
            self.secondary
        } else {
            self.others[rng.below(self.others.len())]
        }
    }

    fn passes(&self, rng: &mut Rng, tick: u32) -> bool {
        let skill = self.pick_skill(rng);
        let difficulty = f64::from(tick) * HAZARD_SKILL_PER_TICK;
        let low = self.scores[skill] - self.spreads[skill];
        let high = self.scores[skill] + self.spreads[skill];
        if difficulty < low {
            true
        } else if difficulty >= high {
            false
        } else {
            rng.range_f64(low, high) >= difficulty
        }
    }
}

fn refill_cost(ticks: u32) -> u32 {
    (ticks_to_hours(ticks) * 60.0 / REFILL_MINUTES_PER_DILITHIUM).ceil() as u32
}

fn is_quiet_tick(tick: u32) -> bool {
    tick % REWARD_TICK_INTERVAL == 0 || tick % DILEMMA_TICK_INTERVAL == 0
}

/// Simulate one lineup `settings.simulations` times, starting each voyage with
/// `starting_antimatter`.
pub fn estimate(
    voyage: &VoyageConfig,
    skills: &SkillAggregates,
    starting_antimatter: i32,
    settings: &SimulationSettings,
    seed: u64,
) -> Estimate {
    let levels = settings.extensions + 1;
    if starting_antimatter <= 0 || settings.simulations == 0 {
        return Estimate::empty(settings.extensions, starting_antimatter);
    }

    let table = HazardTable::new(voyage, skills, settings.luck_factor);
    let mut rng = Rng::new(seed);
    let mut samples = vec![vec![0u32; settings.simulations]; levels];
    let mut level_costs = vec![0u64; levels];
    let mut cost_20_hours = 0u64;
    let mut refills_20_hours = 0u64;
    let mut runs_20_hours = 0u64;
    let mut truncated = false;
    let start = f64::from(starting_antimatter);

    for sim in 0..settings.simulations {
        let mut am = start;
        let mut tick = 0u32;
        let mut extend = 0usize;
        let mut spent = 0u64;
        let mut past_20_hours = false;
        let tracks_20_hours = sim < settings.max_20_hour_sims;

        loop {
            if tick >= settings.max_ticks {
                truncated |= extend < levels;
                for level in extend..levels {
                    samples[level][sim] = settings.max_ticks;
                    level_costs[level] += spent;
                }
                break;
            }
            tick += 1;

            if is_quiet_tick(tick) {
                // rewards and dilemmas cost nothing
            } else if tick % HAZARD_TICK_INTERVAL == 0 {
                am += if table.passes(&mut rng, tick) {
                    f64::from(HAZARD_PASS_ANTIMATTER)
                } else {
                    -f64::from(HAZARD_FAIL_ANTIMATTER)
                };
            } else {
                am -= f64::from(ACTIVITY_ANTIMATTER);
            }

            if am > 0.0 {
                continue;
            }

            if extend < levels {
                samples[extend][sim] = tick;
                level_costs[extend] += spent;
            }
            spent += u64::from(refill_cost(tick));
            extend += 1;
            am = start;

            if tracks_20_hours && !past_20_hours && ticks_to_hours(tick) > TWENTY_HOURS {
                past_20_hours = true;
                cost_20_hours += spent;
                refills_20_hours += extend as u64;
                runs_20_hours += 1;
            }
            if extend >= levels && (past_20_hours || !tracks_20_hours) {
                break;
            }
        }
    }

    let n = settings.simulations;
    let refills = samples
        .iter_mut()
        .zip(&level_costs)
        .enumerate()
        .map(|(extension, (results, cost))| {
            results.sort_unstable();
            let (last_dilemma_hour, dilemma_chance) = dilemma_odds(results);
            RefillEstimate {
                extension,
                median_ticks: results[n / 2],
                safe_ticks: results[n / 10],
                safer_ticks: results[n / 100],
                safest_ticks: results[0],
                moonshot_ticks: results[n * 99 / 100],
                median_hours: ticks_to_hours(results[n / 2]),
                last_dilemma_hour,
                dilemma_chance,
                refill_cost: if extension == 0 {
                    0
                } else {
                    (*cost as f64 / n as f64).ceil() as u32
                },
            }
        })
        .collect();

    Estimate {
        refills,
        dilithium_20_hours: if runs_20_hours == 0 {
            0
        } else {
            (cost_20_hours as f64 / runs_20_hours as f64).ceil() as u32
        },
        refills_20_hours: if runs_20_hours == 0 {
            0
        } else {
            (refills_20_hours as f64 / runs_20_hours as f64).round() as u32
        },
        simulations: n,
        starting_antimatter,
        truncated,
    }
}

/// Last dilemma most runs reach and the percentage that reach it. `sorted` must be ascending.
fn dilemma_odds(sorted: &[u32]) -> (u32, u32) {
    if sorted.is_empty() {
        return (0, 0);
    }
    let mut last = 0u32;
    let mut fails_before = 0usize;
    for (index, ticks) in sorted.iter().enumerate() {
        let dilemma = ticks / DILEMMA_TICK_INTERVAL;
        if dilemma > last {
            last = dilemma;
            fails_before = index;
        }
    }
    let reaching = sorted.len() - fails_before;
    let mut chance = (100.0 * reaching as f64 / sorted.len() as f64).round() as u32;
    if chance == 0 {
        last = last.saturating_sub(1);
        chance = 100;
    }
    let hours_per_dilemma = DILEMMA_TICK_INTERVAL / TICKS_PER_HOUR;
    (last * hours_per_dilemma, chance)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineupEstimate {
    pub key: String,
    pub estimate: Estimate,
}

pub fn run_monte_carlo(
    voyage: &VoyageConfig,
    lineups: &[Lineup],
    settings: &SimulationSettings,
    seed: u64,
) -> Vec<LineupEstimate> {
    run_monte_carlo_with_parallelism(voyage, lineups, settings, seed, false)
}

/// Like [run_monte_carlo] but spreads lineups across cores via Rayon. Output order
/// matches input order, and each lineup keeps its own seed, so results are identical.
pub fn run_monte_carlo_parallel(
    voyage: &VoyageConfig,
    lineups: &[Lineup],
    settings: &SimulationSettings,
    seed: u64,
) -> Vec<LineupEstimate> {
    run_monte_carlo_with_parallelism(voyage, lineups, settings, seed, true)
}

pub fn run_monte_carlo_with_parallelism(
    voyage: &VoyageConfig,
    lineups: &[Lineup],
    settings: &SimulationSettings,
    seed: u64,
    parallel: bool,
) -> Vec<LineupEstimate> {
    let run_one = |lineup: &Lineup| LineupEstimate {
        key: lineup.key.clone(),
        estimate: estimate(
            voyage,
            &lineup.skills,
            lineup.antimatter,
            settings,
            stable_seed(seed, &lineup.key),
        ),
    };

    if parallel {
        lineups.par_iter().map(run_one).collect()
    } else {
        lineups.iter().map(run_one).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::voyage::fixtures::standard_voyage;
    use crate::data::Skill;
    use crate::optimizer::lineup::SkillAggregate;

    fn aggregates(score: f64, spread: f64) -> SkillAggregates {
        Skill::ALL.map(|skill| SkillAggregate {
            skill,
            core: score,
            range_min: 0.0,
            range_max: spread * 2.0,
            voyage_score: score,
        })
    }

    fn settings(simulations: usize) -> SimulationSettings {
        SimulationSettings {
            simulations,
            extensions: 2,
            max_ticks: 10_000,
            max_20_hour_sims: 20,
            luck_factor: true,
        }
    }

    #[test]
    fn hazards_draw_the_four_outside_skills_besides_the_voyage_pair() {
        let voyage = standard_voyage(Skill::Diplomacy, Skill::Medicine, 2500);
        let table = HazardTable::new(&voyage, &aggregates(5_000.0, 0.0), false);
        let outside = [Skill::Command, Skill::Engineering, Skill::Science, Skill::Security];
        let expected: Vec<usize> = outside.iter().map(|skill| skill.index()).collect();
        assert_eq!(table.others, expected);

        let mut rng = Rng::new(11);
        let mut drawn = [0usize; SKILL_COUNT];
        for _ in 0..2_000 {
            drawn[table.pick_skill(&mut rng)] += 1;
        }
        assert!(drawn.iter().all(|count| *count > 0));
        assert!(drawn[Skill::Diplomacy.index()] > drawn[Skill::Medicine.index()]);
        assert!(drawn[Skill::Medicine.index()] > drawn[Skill::Command.index()]);
    }

    #[test]
    fn percentiles_are_ordered() {
        let voyage = standard_voyage(Skill::Command, Skill::Science, 2500);
        let estimate = estimate(&voyage, &aggregates(8_000.0, 1_500.0), 2_600, &settings(400), 9);
        for level in &estimate.refills {
            assert!(level.safest_ticks <= level.safer_ticks);
            assert!(level.safer_ticks <= level.safe_ticks);
            assert!(level.safe_ticks <= level.median_ticks);
            assert!(level.median_ticks <= level.moonshot_ticks);
        }
        assert_eq!(estimate.refills.len(), 3);
        assert!(estimate.median_ticks() > 0);
        assert!(!estimate.truncated);
    }

    #[test]
    fn refills_extend_the_voyage() {
        let voyage = standard_voyage(Skill::Command, Skill::Science, 2500);
        let estimate = estimate(&voyage, &aggregates(6_000.0, 1_000.0), 2_500, &settings(300), 3);
        assert!(estimate.refills[1].median_ticks > estimate.refills[0].median_ticks);
        assert!(estimate.refills[1].refill_cost > 0);
        assert_eq!(estimate.refills[0].refill_cost, 0);
        assert!(estimate.dilithium_20_hours > 0);
    }

    #[test]
    fn zero_antimatter_yields_zero_estimate() {
        let voyage = standard_voyage(Skill::Command, Skill::Science, 0);
        let estimate = estimate(&voyage, &aggregates(8_000.0, 1_000.0), 0, &settings(100), 1);
        assert_eq!(estimate.median_ticks(), 0);
        assert_eq!(estimate.minimum_ticks(), 0);
        assert_eq!(estimate.moonshot_ticks(), 0);
        assert_eq!(estimate.simulations, 0);
    }

    #[test]
    fn same_seed_reproduces_estimate() {
        let voyage = standard_voyage(Skill::Diplomacy, Skill::Medicine, 2800);
        let skills = aggregates(7_000.0, 2_000.0);
        let a = estimate(&voyage, &skills, 2_800, &settings(200), 42);
        let b = estimate(&voyage, &skills, 2_800, &settings(200), 42);
        assert_eq!(a, b);
    }

    #[test]
    fn tick_ceiling_truncates_and_flags() {
        let voyage = standard_voyage(Skill::Command, Skill::Science, 2500);
        let capped = SimulationSettings {
            max_ticks: 200,
            ..settings(50)
        };
        let estimate = estimate(&voyage, &aggregates(50_000.0, 0.0), 1_000_000, &capped, 5);
        assert!(estimate.truncated);
        assert_eq!(estimate.median_ticks(), 200);
    }

    #[test]
    fn without_luck_hazards_are_deterministic() {
        let voyage = standard_voyage(Skill::Command, Skill::Science, 2500);
        let plain = SimulationSettings {
            luck_factor: false,
            ..settings(60)
        };
        let skills = aggregates(5_000.0, 3_000.0);
        let estimate = estimate(&voyage, &skills, 2_500, &plain, 11);
        let base = &estimate.refills[0];
        assert_eq!(base.safest_ticks, base.moonshot_ticks);
    }

    #[test]
    fn dilemma_odds_report_reachable_dilemma() {
        // 2 of 4 runs pass tick 720 (second dilemma, hour 4)
        let (hour, chance) = dilemma_odds(&[400, 500, 800, 900]);
        assert_eq!(hour, 4);
        assert_eq!(chance, 50);
    }

    #[test]
    fn parallel_matches_sequential() {
        use crate::optimizer::lineup::lineup_key;
        let voyage = standard_voyage(Skill::Command, Skill::Science, 2500);
        let lineups: Vec<Lineup> = [6_000.0, 7_000.0, 9_000.0]
            .iter()
            .map(|score| {
                let skills = aggregates(*score, 1_000.0);
                Lineup {
                    key: lineup_key(&skills),
                    seats: Vec::new(),
                    skills,
                    total_score: score * 6.0,
                    ideal_count: 0,
                    antimatter_bonus: 0,
                    antimatter: 2500,
                }
            })
            .collect();
        let sequential = run_monte_carlo(&voyage, &lineups, &settings(80), 17);
        let parallel = run_monte_carlo_parallel(&voyage, &lineups, &settings(80), 17);
        assert_eq!(sequential, parallel);
    }
}
