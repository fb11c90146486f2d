//! Deterministic depletion projector used to prune combinations before any Monte
//! Carlo run. Each skill gets a failpoint from a linear model of its voyage score;
//! between failpoints hazards pass at the rate still covered by unfailed skills.
//!
//! Segments that cannot exhaust antimatter are crossed in closed form, the rest
//! are walked one tick at a time. Both give the same numbers as a pure per-tick
//! walk, which keeps projections monotonic in every skill score.

use serde::Serialize;

use crate::data::voyage::{
    ACTIVITY_ANTIMATTER, HAZARD_FAIL_ANTIMATTER, HAZARD_PASS_ANTIMATTER, HAZARD_TICK_INTERVAL,
    SECONDS_PER_TICK, TRAIT_ANTIMATTER_BONUS,
};
use crate::data::VoyageConfig;
use crate::optimizer::config::ProjectorConfig;
use crate::optimizer::lineup::SkillAggregates;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Projection {
    /// Ticks until antimatter runs out (capped at the projector ceiling).
    pub ticks: u32,
    /// Antimatter left when the final decline began.
    pub am_balance: f64,
}

/// Seconds into the voyage at which hazards start failing for a skill.
pub fn failpoint_seconds(config: &ProjectorConfig, voyage_score: f64) -> f64 {
    (config.failpoint_slope * voyage_score + config.failpoint_intercept) * 60.0
}

/// Skill points worth as much voyage time as one trait-matched seat: the trait's
/// antimatter bonus burned at one unit per tick, divided by the seconds of
/// failpoint each skill point buys.
pub fn ideal_seat_bonus(config: &ProjectorConfig) -> f64 {
    let seconds = f64::from(TRAIT_ANTIMATTER_BONUS) * f64::from(SECONDS_PER_TICK);
    if config.failpoint_slope <= 0.0 {
        return 0.0;
    }
    seconds / (config.failpoint_slope * 60.0)
}

fn failpoint_tick(config: &ProjectorConfig, voyage_score: f64) -> u32 {
    let ticks = failpoint_seconds(config, voyage_score) / f64::from(SECONDS_PER_TICK);
    ticks.max(0.0).floor().min(f64::from(config.max_ticks)) as u32
}

/// Expected antimatter change of one hazard when `pass_rate` of hazards succeed.
fn hazard_value(pass_rate: f64) -> f64 {
    pass_rate * f64::from(HAZARD_PASS_ANTIMATTER)
        - (1.0 - pass_rate) * f64::from(HAZARD_FAIL_ANTIMATTER)
}

pub fn project(
    voyage: &VoyageConfig,
    ship_antimatter: i32,
    skills: &SkillAggregates,
    config: &ProjectorConfig,
) -> Projection {
    let mut am = f64::from(ship_antimatter);
    if am <= 0.0 {
        return Projection {
            ticks: 0,
            am_balance: am,
        };
    }

    let mut failpoints: Vec<(u32, f64)> = skills
        .iter()
        .map(|agg| {
            (
                failpoint_tick(config, agg.voyage_score),
                voyage.role_of(agg.skill).hazard_weight(),
            )
        })
        .collect();
    failpoints.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.total_cmp(&a.1)));

    let activity = f64::from(ACTIVITY_ANTIMATTER);
    let mut pass_rate = 1.0_f64;
    let mut next = 0;
    let mut tick = 0u32;
    let mut walking = false;
    let mut balance = am;

    while tick < config.max_ticks {
        while next < failpoints.len() && failpoints[next].0 <= tick {
            pass_rate = (pass_rate - failpoints[next].1).max(0.0);
            next += 1;
        }
        let hazard = hazard_value(pass_rate);

        if !walking {
            let segment_end = failpoints
                .get(next)
                .map_or(config.max_ticks, |fp| fp.0.min(config.max_ticks));
            let hazards = segment_end / HAZARD_TICK_INTERVAL - tick / HAZARD_TICK_INTERVAL;
            let quiet = segment_end - tick - hazards;
            // every loss landing before every gain
            let worst = am - f64::from(quiet) * activity + (f64::from(hazards) * hazard).min(0.0);
            if worst > 0.0 {
                am += f64::from(hazards) * hazard - f64::from(quiet) * activity;
                tick = segment_end;
                continue;
            }
            walking = true;
            balance = am;
        }

        tick += 1;
        if tick % HAZARD_TICK_INTERVAL == 0 {
            am += hazard;
        } else {
            am -= activity;
        }
        if am <= 0.0 {
            return Projection {
                ticks: tick,
                am_balance: balance,
            };
        }
    }

    Projection {
        ticks: config.max_ticks,
        am_balance: if walking { balance } else { am },
    }
}
