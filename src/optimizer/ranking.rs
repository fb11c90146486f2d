use serde::{Deserialize, Serialize};

use crate::optimizer::lineup::Lineup;
use crate::optimizer::monte_carlo::Estimate;

/// Objective a finalist can win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ranking {
    /// Longest median duration.
    Estimate,
    /// Longest 10th-percentile duration.
    Minimum,
    /// Longest 99th-percentile duration.
    Moonshot,
    /// Most starting antimatter.
    Antimatter,
}

impl Ranking {
    pub const ALL: [Ranking; 4] = [
        Ranking::Estimate,
        Ranking::Minimum,
        Ranking::Moonshot,
        Ranking::Antimatter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Estimate => "estimate",
            Self::Minimum => "minimum",
            Self::Moonshot => "moonshot",
            Self::Antimatter => "antimatter",
        }
    }

    pub fn value(&self, lineup: &Lineup, estimate: &Estimate) -> f64 {
        match self {
            Self::Estimate => f64::from(estimate.median_ticks()),
            Self::Minimum => f64::from(estimate.minimum_ticks()),
            Self::Moonshot => f64::from(estimate.moonshot_ticks()),
            Self::Antimatter => f64::from(lineup.antimatter),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestLineup {
    pub lineup: Lineup,
    pub estimate: Estimate,
    pub best_for: Vec<Ranking>,
}

/// Winners of every requested ranking, ties included, each lineup listed once.
pub fn rank_results(finalists: Vec<(Lineup, Estimate)>, rankings: &[Ranking]) -> Vec<BestLineup> {
    let rankings: &[Ranking] = if rankings.is_empty() {
        &[Ranking::Estimate]
    } else {
        rankings
    };

    let mut awards: Vec<Vec<Ranking>> = vec![Vec::new(); finalists.len()];
    let mut order: Vec<usize> = Vec::new();
    for ranking in rankings {
        let best = finalists
            .iter()
            .map(|(lineup, estimate)| ranking.value(lineup, estimate))
            .fold(f64::NEG_INFINITY, f64::max);
        for (index, (lineup, estimate)) in finalists.iter().enumerate() {
            if ranking.value(lineup, estimate) != best || awards[index].contains(ranking) {
                continue;
            }
            if awards[index].is_empty() {
                order.push(index);
            }
            awards[index].push(*ranking);
        }
    }

    let mut slots: Vec<Option<(Lineup, Estimate)>> = finalists.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|index| {
            let (lineup, estimate) = slots[index].take()?;
            Some(BestLineup {
                lineup,
                estimate,
                best_for: std::mem::take(&mut awards[index]),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Skill;
    use crate::optimizer::lineup::SkillAggregate;
    use crate::optimizer::monte_carlo::RefillEstimate;

    fn finalist(key: &str, antimatter: i32, median: u32, safe: u32, moonshot: u32) -> (Lineup, Estimate) {
        let lineup = Lineup {
            key: key.to_string(),
            seats: Vec::new(),
            skills: Skill::ALL.map(|skill| SkillAggregate {
                skill,
                core: 0.0,
                range_min: 0.0,
                range_max: 0.0,
                voyage_score: 0.0,
            }),
            total_score: 0.0,
            ideal_count: 0,
            antimatter_bonus: 0,
            antimatter,
        };
        let estimate = Estimate {
            refills: vec![RefillEstimate {
                extension: 0,
                median_ticks: median,
                safe_ticks: safe,
                safer_ticks: safe,
                safest_ticks: safe,
                moonshot_ticks: moonshot,
                median_hours: f64::from(median) / 180.0,
                last_dilemma_hour: 0,
                dilemma_chance: 0,
                refill_cost: 0,
            }],
            dilithium_20_hours: 0,
            refills_20_hours: 0,
            simulations: 1,
            starting_antimatter: antimatter,
            truncated: false,
        };
        (lineup, estimate)
    }

    #[test]
    fn each_objective_picks_its_winner_once() {
        let finalists = vec![
            finalist("a", 2500, 1800, 1500, 2000),
            finalist("b", 2600, 1700, 1600, 1900),
            finalist("c", 2525, 1750, 1400, 2100),
        ];
        let best = rank_results(finalists, &Ranking::ALL);
        let keys: Vec<&str> = best.iter().map(|b| b.lineup.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(best[0].best_for, vec![Ranking::Estimate]);
        assert_eq!(best[1].best_for, vec![Ranking::Minimum, Ranking::Antimatter]);
        assert_eq!(best[2].best_for, vec![Ranking::Moonshot]);
    }

    #[test]
    fn ties_are_all_winners() {
        let finalists = vec![
            finalist("a", 2500, 1800, 1500, 2000),
            finalist("b", 2500, 1800, 1400, 1900),
            finalist("c", 2500, 1700, 1400, 1900),
        ];
        let best = rank_results(finalists, &[Ranking::Estimate]);
        let keys: Vec<&str> = best.iter().map(|b| b.lineup.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn empty_rankings_fall_back_to_median() {
        let finalists = vec![finalist("a", 2500, 1000, 900, 1100), finalist("b", 2500, 1200, 800, 1300)];
        let best = rank_results(finalists, &[]);
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].lineup.key, "b");
    }
}
