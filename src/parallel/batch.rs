//! Batch distribution for parallel estimation.
//!
//! The Monte Carlo runner uses one lineup per parallel task; batches exist so the
//! caller hears about progress between chunks of finalists.

use crate::data::VoyageConfig;
use crate::optimizer::lineup::Lineup;
use crate::optimizer::monte_carlo::{
    run_monte_carlo_with_parallelism, LineupEstimate, SimulationSettings,
};
use crate::parallel::pool::WorkerPool;

/// Split `total` items into up to `num_batches` ranges `[start, end)`.
/// Batches are as equal in size as possible; later batches may be smaller.
///
/// # Example
/// ```
/// # use voyager::parallel::batch_ranges;
/// let ranges = batch_ranges(100, 4);
/// assert_eq!(ranges, vec![(0, 25), (25, 50), (50, 75), (75, 100)]);
/// ```
pub fn batch_ranges(total: usize, num_batches: usize) -> Vec<(usize, usize)> {
    if total == 0 || num_batches == 0 {
        return Vec::new();
    }
    let num_batches = num_batches.min(total);
    let base = total / num_batches;
    let remainder = total % num_batches;
    let mut ranges = Vec::with_capacity(num_batches);
    let mut start = 0;
    for i in 0..num_batches {
        let size = base + if i < remainder { 1 } else { 0 };
        let end = start + size;
        ranges.push((start, end));
        start = end;
    }
    ranges
}

/// Estimate `lineups` in `num_batches` chunks on `pool`, calling `on_batch(done, total)`
/// after each chunk. Results keep input order.
#[allow(clippy::too_many_arguments)]
pub fn run_estimation_batches<F>(
    voyage: &VoyageConfig,
    lineups: &[Lineup],
    settings: &SimulationSettings,
    seed: u64,
    parallel: bool,
    pool: &WorkerPool,
    num_batches: usize,
    mut on_batch: F,
) -> Vec<LineupEstimate>
where
    F: FnMut(usize, usize),
{
    let total = lineups.len();
    let mut estimates = Vec::with_capacity(total);
    for (start, end) in batch_ranges(total, num_batches) {
        let batch = &lineups[start..end];
        estimates.extend(pool.install(|| {
            run_monte_carlo_with_parallelism(voyage, batch, settings, seed, parallel)
        }));
        on_batch(end, total);
    }
    estimates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_ranges_even_split() {
        let r = batch_ranges(100, 4);
        assert_eq!(r, vec![(0, 25), (25, 50), (50, 75), (75, 100)]);
    }

    #[test]
    fn batch_ranges_with_remainder() {
        let r = batch_ranges(10, 3);
        assert_eq!(r, vec![(0, 4), (4, 7), (7, 10)]);
    }

    #[test]
    fn batch_ranges_more_batches_than_items() {
        let r = batch_ranges(3, 10);
        assert_eq!(r.len(), 3);
        assert_eq!(r, vec![(0, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn estimation_batches_report_progress_and_keep_order() {
        use crate::data::voyage::fixtures::standard_voyage;
        use crate::data::Skill;
        use crate::optimizer::lineup::{lineup_key, SkillAggregate};

        let voyage = standard_voyage(Skill::Command, Skill::Science, 2500);
        let lineups: Vec<Lineup> = (0..5)
            .map(|i| {
                let skills = Skill::ALL.map(|skill| SkillAggregate {
                    skill,
                    core: 5000.0 + 100.0 * i as f64,
                    range_min: 0.0,
                    range_max: 400.0,
                    voyage_score: 5200.0 + 100.0 * i as f64,
                });
                Lineup {
                    key: lineup_key(&skills),
                    seats: Vec::new(),
                    skills,
                    total_score: 0.0,
                    ideal_count: 0,
                    antimatter_bonus: 0,
                    antimatter: 2500,
                }
            })
            .collect();
        let settings = SimulationSettings {
            simulations: 20,
            extensions: 0,
            max_ticks: 10_000,
            max_20_hour_sims: 0,
            luck_factor: true,
        };
        let mut seen = Vec::new();
        let estimates = run_estimation_batches(
            &voyage,
            &lineups,
            &settings,
            3,
            true,
            &WorkerPool::with_workers(2),
            2,
            |done, total| seen.push((done, total)),
        );
        assert_eq!(seen, vec![(3, 5), (5, 5)]);
        let keys: Vec<&str> = estimates.iter().map(|e| e.key.as_str()).collect();
        let expected: Vec<&str> = lineups.iter().map(|l| l.key.as_str()).collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn batch_ranges_empty() {
        assert!(batch_ranges(0, 5).is_empty());
        assert!(batch_ranges(10, 0).is_empty());
    }
}
