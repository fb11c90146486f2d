//! Boost-vector hill-climb: nudge primary/secondary boosts until the seated
//! lineup's primary and secondary shares land near a target ratio, starting one
//! search vector per prime-factor offset.

use std::collections::HashMap;

use crate::data::{VoyageConfig, SEAT_COUNT};
use crate::optimizer::analytical::ideal_seat_bonus;
use crate::optimizer::config::{BoostConfig, ProjectorConfig, StrategyConfig};
use crate::optimizer::lineup::Lineup;
use crate::optimizer::primer::{Boosts, PrimedCrew};
use crate::optimizer::progress::ProgressSink;
use crate::optimizer::seater::{seat, seat_by_matching, seat_greedy, voyager_candidates};
use crate::optimizer::OptimizeError;

pub const CONTROL_LABEL: &str = "control";

/// A lineup and the search vectors that reached it.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorLineup {
    pub lineup: Lineup,
    pub vectors: Vec<String>,
}

/// Seat the 12 best crew by boosted score, then reseat those 12 for ideal placements.
pub fn seat_with_boosts(
    voyage: &VoyageConfig,
    roster: &[PrimedCrew],
    boosts: Boosts,
    ideal_bonus: f64,
    debug: &mut dyn ProgressSink,
) -> Option<Lineup> {
    let mut order: Vec<usize> = (0..roster.len())
        .filter(|crew| roster[*crew].is_viable())
        .collect();
    order.sort_by(|a, b| {
        roster[*b]
            .boosted_score(boosts)
            .total_cmp(&roster[*a].boosted_score(boosts))
            .then_with(|| a.cmp(b))
    });

    let chosen = seat_greedy(roster, &order)?;
    let candidates = voyager_candidates(
        roster,
        &chosen,
        |member| member.boosted_score(boosts),
        ideal_bonus,
    );
    // the greedy pass already filled every seat, so a matching always exists
    seat(voyage, roster, &candidates, debug).or_else(|| seat_by_matching(voyage, roster, &chosen))
}

#[derive(Debug, Clone)]
pub struct BoostVectorSearch {
    config: BoostConfig,
    /// Score added to ideal seating candidates.
    ideal_bonus: f64,
}

impl Default for BoostVectorSearch {
    fn default() -> Self {
        Self {
            config: BoostConfig::default(),
            ideal_bonus: ideal_seat_bonus(&ProjectorConfig::default()),
        }
    }
}

impl BoostVectorSearch {
    pub fn with_config(config: &StrategyConfig) -> Self {
        Self {
            config: config.boost.clone(),
            ideal_bonus: ideal_seat_bonus(&config.projector),
        }
    }

    fn clamp(&self, boost: f64) -> f64 {
        boost.clamp(self.config.min_boost, self.config.max_boost)
    }

    pub fn generate_lineups(
        &self,
        voyage: &VoyageConfig,
        roster: &[PrimedCrew],
        custom_boosts: Option<Boosts>,
        sink: &mut dyn ProgressSink,
    ) -> Result<Vec<VectorLineup>, OptimizeError> {
        let viable = roster.iter().filter(|member| member.is_viable()).count();
        if viable < SEAT_COUNT {
            return Err(OptimizeError::NotEnoughCrew {
                viable,
                required: SEAT_COUNT,
            });
        }

        let start = custom_boosts.unwrap_or_default();
        let control = seat_with_boosts(voyage, roster, start, self.ideal_bonus, sink)
            .ok_or(OptimizeError::NoViableLineup)?;
        let prime_factor = self.config.prime_factor_for(control.total_score);
        sink.progress(&format!(
            "Control lineup scores {:.0}; targeting prime factor {prime_factor:.3}",
            control.total_score
        ));

        let mut found = LineupSet::default();
        found.record(control, CONTROL_LABEL);

        let attempts = self.config.attempts_for(roster.len());
        for delta in &self.config.vector_deltas {
            let label = format!("{delta:+.2}");
            let produced = self.run_vector(
                voyage,
                roster,
                start,
                prime_factor + delta,
                &label,
                &mut found,
                attempts,
                sink,
            );
            sink.progress(&format!("Vector {label}: {produced} new lineups"));
        }

        sink.progress(&format!("Assembled {} distinct lineups", found.lineups.len()));
        Ok(found.lineups)
    }

    #[allow(clippy::too_many_arguments)]
    fn run_vector(
        &self,
        voyage: &VoyageConfig,
        roster: &[PrimedCrew],
        start: Boosts,
        primary_target: f64,
        label: &str,
        found: &mut LineupSet,
        attempts: usize,
        sink: &mut dyn ProgressSink,
    ) -> usize {
        let secondary_target = primary_target - self.config.secondary_offset;
        let primary = voyage.primary();
        let secondary = voyage.secondary();
        let mut boosts = start;
        let mut produced = 0;

        for attempt in 1..=attempts {
            let seated = seat_with_boosts(voyage, roster, boosts, self.ideal_bonus, sink);
            let Some(lineup) = seated else {
                sink.debug(&format!("vector {label} attempt {attempt}: seating failed"));
                break;
            };
            let total = lineup.total_score;
            let primary_deviation = lineup.score_of(primary) / total - primary_target;
            let secondary_deviation = lineup.score_of(secondary) / total - secondary_target;

            if found.record(lineup, label) {
                produced += 1;
                if produced >= self.config.vector_lineup_quota {
                    break;
                }
            }
            if total <= 0.0 {
                break;
            }

            let step = (1.0 / attempt as f64).max(self.config.min_step);
            boosts.primary = self.clamp(boosts.primary - primary_deviation * step * self.config.gain);
            boosts.secondary =
                self.clamp(boosts.secondary - secondary_deviation * step * self.config.gain);
            sink.debug(&format!(
                "vector {label} attempt {attempt}: boosts {:.3}/{:.3}",
                boosts.primary, boosts.secondary
            ));
        }
        produced
    }
}

#[derive(Default)]
struct LineupSet {
    lineups: Vec<VectorLineup>,
    by_key: HashMap<String, usize>,
}

impl LineupSet {
    /// Returns true when the lineup was new.
    fn record(&mut self, lineup: Lineup, label: &str) -> bool {
        if let Some(&index) = self.by_key.get(&lineup.key) {
            let vectors = &mut self.lineups[index].vectors;
            if !vectors.iter().any(|v| v == label) {
                vectors.push(label.to_string());
            }
            return false;
        }
        self.by_key.insert(lineup.key.clone(), self.lineups.len());
        self.lineups.push(VectorLineup {
            lineup,
            vectors: vec![label.to_string()],
        });
        true
    }
}
