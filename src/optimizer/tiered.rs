//! Tiered estimation: a cheap scouting pass (the depletion projector) picks which
//! lineups get the expensive Monte Carlo confirmation.

use serde::{Deserialize, Serialize};

use crate::data::VoyageConfig;
use crate::optimizer::analytical::project;
use crate::optimizer::config::{ProjectorConfig, SelectionConfig};
use crate::optimizer::lineup::Lineup;

const PRIMARY_WEIGHT: f64 = 0.35;
const SECONDARY_WEIGHT: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Extra finalists with the most even skills.
    Minimum,
    /// Extra finalists with the strongest primary and secondary skills.
    Moonshot,
    /// Both of the above.
    #[default]
    Versatile,
    /// Estimate every lineup.
    Thorough,
}

impl SelectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimum => "minimum",
            Self::Moonshot => "moonshot",
            Self::Versatile => "versatile",
            Self::Thorough => "thorough",
        }
    }
}

/// Population standard deviation of the six voyage scores.
pub fn skill_spread(lineup: &Lineup) -> f64 {
    let n = lineup.skills.len() as f64;
    let mean = lineup.skills.iter().map(|agg| agg.voyage_score).sum::<f64>() / n;
    let variance = lineup
        .skills
        .iter()
        .map(|agg| (agg.voyage_score - mean).powi(2))
        .sum::<f64>()
        / n;
    variance.sqrt()
}

pub fn weighted_mean(voyage: &VoyageConfig, lineup: &Lineup) -> f64 {
    PRIMARY_WEIGHT * lineup.score_of(voyage.primary())
        + SECONDARY_WEIGHT * lineup.score_of(voyage.secondary())
}

/// Indices of the lineups worth estimating, in selection order.
pub fn select_finalists(
    voyage: &VoyageConfig,
    lineups: &[Lineup],
    mode: SelectionMode,
    selection: &SelectionConfig,
    projector: &ProjectorConfig,
) -> Vec<usize> {
    if mode == SelectionMode::Thorough {
        return (0..lineups.len()).collect();
    }

    let ticks: Vec<u32> = lineups
        .iter()
        .map(|lineup| project(voyage, lineup.antimatter, &lineup.skills, projector).ticks)
        .collect();
    let mut by_ticks: Vec<usize> = (0..lineups.len()).collect();
    by_ticks.sort_by(|a, b| ticks[*b].cmp(&ticks[*a]).then_with(|| a.cmp(b)));

    let mut chosen: Vec<usize> = by_ticks
        .into_iter()
        .take(selection.always_estimate)
        .collect();

    if matches!(mode, SelectionMode::Minimum | SelectionMode::Versatile) {
        let spreads: Vec<f64> = lineups.iter().map(skill_spread).collect();
        let mut order: Vec<usize> = (0..lineups.len()).collect();
        order.sort_by(|a, b| spreads[*a].total_cmp(&spreads[*b]).then_with(|| a.cmp(b)));
        extend_unique(&mut chosen, order, selection.extra_per_objective);
    }
    if matches!(mode, SelectionMode::Moonshot | SelectionMode::Versatile) {
        let means: Vec<f64> = lineups
            .iter()
            .map(|lineup| weighted_mean(voyage, lineup))
            .collect();
        let mut order: Vec<usize> = (0..lineups.len()).collect();
        order.sort_by(|a, b| means[*b].total_cmp(&means[*a]).then_with(|| a.cmp(b)));
        extend_unique(&mut chosen, order, selection.extra_per_objective);
    }

    chosen
}

fn extend_unique(chosen: &mut Vec<usize>, order: Vec<usize>, extra: usize) {
    let mut added = 0;
    for index in order {
        if added >= extra {
            break;
        }
        if !chosen.contains(&index) {
            chosen.push(index);
            added += 1;
        }
    }
}
