pub mod analytical;
pub mod boost_vector;
pub mod config;
pub mod crew_generator;
pub mod lineup;
pub mod monte_carlo;
pub mod primer;
pub mod progress;
pub mod ranking;
pub mod rng;
pub mod seater;
pub mod tiered;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::validate::validate_voyage;
use crate::data::{CrewRecord, VoyageConfig, SEAT_COUNT};
use crate::optimizer::analytical::{ideal_seat_bonus, project, Projection};
use crate::optimizer::boost_vector::BoostVectorSearch;
use crate::optimizer::config::{EstimatorConfig, StrategyConfig};
use crate::optimizer::crew_generator::CrewGenerator;
use crate::optimizer::lineup::Lineup;
use crate::optimizer::monte_carlo::{estimate, Estimate, SimulationSettings};
use crate::optimizer::primer::{prime_roster, Boosts, PrimeMode, PrimedCrew};
use crate::optimizer::progress::ProgressSink;
use crate::optimizer::ranking::{rank_results, BestLineup, Ranking};
use crate::optimizer::rng::{entropy_seed, stable_seed};
use crate::optimizer::seater::{seat, seat_by_matching, voyager_candidates};
use crate::optimizer::tiered::{select_finalists, SelectionMode};
use crate::parallel::{run_estimation_batches, WorkerPool};

/// Number of progress-reporting batches while estimating finalists.
const ESTIMATE_PROGRESS_BATCH_COUNT: usize = 10;

/// Which candidate selector builds lineups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AssemblerKind {
    /// Rank, prune with the projector, seat every surviving combination.
    #[default]
    #[serde(rename = "idic", alias = "omega", alias = "rank_prune_seat")]
    RankPruneSeat,
    /// Rank-prune-seat restricted to trait-matched seats.
    #[serde(rename = "peak_antimatter", alias = "peak")]
    PeakAntimatter,
    /// Boost-vector hill-climb.
    #[serde(rename = "mvam", alias = "boost_vector")]
    BoostVector,
}

impl AssemblerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RankPruneSeat => "idic",
            Self::PeakAntimatter => "peak_antimatter",
            Self::BoostVector => "mvam",
        }
    }

    pub fn prime_mode(&self) -> PrimeMode {
        match self {
            Self::PeakAntimatter => PrimeMode::PeakAntimatter,
            Self::RankPruneSeat | Self::BoostVector => PrimeMode::Standard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeOptions {
    #[serde(alias = "customBoosts")]
    pub custom_boosts: Option<Boosts>,
    #[serde(alias = "luckFactor")]
    pub luck_factor: bool,
    #[serde(alias = "favorSpecialists")]
    pub favor_specialists: bool,
    pub selection: SelectionMode,
    pub rankings: Vec<Ranking>,
    /// Overrides `estimator.simulations`.
    pub simulations: Option<usize>,
    /// Overrides `estimator.extensions`.
    pub extensions: Option<usize>,
    /// Fixed seed for reproducible estimates; drawn from the OS when absent.
    pub seed: Option<u64>,
    /// Estimation threads; all cores when absent.
    pub workers: Option<usize>,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            custom_boosts: None,
            luck_factor: true,
            favor_specialists: false,
            selection: SelectionMode::default(),
            rankings: Ranking::ALL.to_vec(),
            simulations: None,
            extensions: None,
            seed: None,
            workers: None,
        }
    }
}

impl OptimizeOptions {
    pub fn simulation_settings(&self, config: &EstimatorConfig) -> SimulationSettings {
        let mut settings = SimulationSettings::from_config(config, self.luck_factor);
        if let Some(simulations) = self.simulations {
            settings.simulations = simulations.max(1);
        }
        if let Some(extensions) = self.extensions {
            settings.extensions = extensions;
        }
        settings
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    #[serde(default)]
    pub strategy: AssemblerKind,
    pub voyage: VoyageConfig,
    pub crew: Vec<CrewRecord>,
    #[serde(default)]
    pub options: OptimizeOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptimizeError {
    InvalidVoyage(String),
    InvalidRequest(String),
    NotEnoughCrew { viable: usize, required: usize },
    NoViableLineup,
    InvalidConfig(String),
}

impl fmt::Display for OptimizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidVoyage(reason) => write!(f, "invalid voyage: {reason}"),
            Self::InvalidRequest(reason) => write!(f, "invalid request: {reason}"),
            Self::NotEnoughCrew { viable, required } => write!(
                f,
                "only {viable} crew can fill a voyage seat; {required} are required"
            ),
            Self::NoViableLineup => write!(f, "no combination of crew fills all {SEAT_COUNT} seats"),
            Self::InvalidConfig(reason) => write!(f, "invalid strategy config: {reason}"),
        }
    }
}

impl std::error::Error for OptimizeError {}

fn check_request(request: &OptimizationRequest, config: &StrategyConfig) -> Result<(), OptimizeError> {
    config.validate().map_err(OptimizeError::InvalidConfig)?;
    let report = validate_voyage(&request.voyage);
    if report.has_errors() {
        let reasons: Vec<String> = report.errors().map(|diag| diag.message.clone()).collect();
        return Err(OptimizeError::InvalidVoyage(reasons.join("; ")));
    }
    let mut seen = HashSet::new();
    if let Some(duplicate) = request.crew.iter().find(|member| !seen.insert(member.id.as_str())) {
        return Err(OptimizeError::InvalidRequest(format!(
            "crew id '{}' appears more than once",
            duplicate.id
        )));
    }
    Ok(())
}

/// Build distinct lineups with the chosen assembler.
pub fn assemble(
    kind: AssemblerKind,
    voyage: &VoyageConfig,
    roster: &[PrimedCrew],
    options: &OptimizeOptions,
    config: &StrategyConfig,
    sink: &mut dyn ProgressSink,
) -> Result<Vec<Lineup>, OptimizeError> {
    match kind {
        AssemblerKind::RankPruneSeat | AssemblerKind::PeakAntimatter => {
            CrewGenerator::with_config(config).generate_lineups(
                voyage,
                roster,
                options.favor_specialists,
                sink,
            )
        }
        AssemblerKind::BoostVector => {
            let found = BoostVectorSearch::with_config(config).generate_lineups(
                voyage,
                roster,
                options.custom_boosts,
                sink,
            )?;
            for tagged in &found {
                sink.debug(&format!(
                    "lineup {} from vectors {}",
                    tagged.lineup.key,
                    tagged.vectors.join(", ")
                ));
            }
            Ok(found.into_iter().map(|tagged| tagged.lineup).collect())
        }
    }
}

/// Full pipeline: prime, assemble, narrow, estimate, pick winners.
pub fn optimize(
    request: &OptimizationRequest,
    config: &StrategyConfig,
    sink: &mut dyn ProgressSink,
) -> Result<Vec<BestLineup>, OptimizeError> {
    check_request(request, config)?;
    let voyage = &request.voyage;
    let options = &request.options;

    let roster = prime_roster(voyage, &request.crew, request.strategy.prime_mode());
    sink.progress(&format!(
        "Primed {} crew for a {}/{} voyage using {}",
        roster.len(),
        voyage.primary().short_name(),
        voyage.secondary().short_name(),
        request.strategy.as_str()
    ));

    let lineups = assemble(request.strategy, voyage, &roster, options, config, sink)?;

    let chosen = select_finalists(
        voyage,
        &lineups,
        options.selection,
        &config.selection,
        &config.projector,
    );
    let finalists: Vec<Lineup> = chosen.iter().map(|index| lineups[*index].clone()).collect();
    let settings = options.simulation_settings(&config.estimator);
    let pool = WorkerPool::for_request(options.workers);
    sink.progress(&format!(
        "Estimating {} of {} lineups ({} selection, {} simulations each, {} threads)",
        finalists.len(),
        lineups.len(),
        options.selection.as_str(),
        settings.simulations,
        pool.threads()
    ));

    let seed = options.seed.unwrap_or_else(entropy_seed);
    let estimates = run_estimation_batches(
        voyage,
        &finalists,
        &settings,
        seed,
        config.estimator.parallel,
        &pool,
        ESTIMATE_PROGRESS_BATCH_COUNT,
        |done, total| sink.progress(&format!("Estimated {done}/{total} lineups")),
    );

    let truncated = estimates.iter().filter(|e| e.estimate.truncated).count();
    if truncated > 0 {
        sink.progress(&format!(
            "{truncated} estimates hit the {} tick ceiling and were truncated",
            settings.max_ticks
        ));
    }

    let paired = finalists
        .into_iter()
        .zip(estimates.into_iter().map(|lineup| lineup.estimate))
        .collect();
    Ok(rank_results(paired, &options.rankings))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrewEstimate {
    pub lineup: Lineup,
    pub projection: Projection,
    pub estimate: Estimate,
}

/// Seat exactly the given 12 crew and estimate the result.
pub fn estimate_crew(
    request: &OptimizationRequest,
    crew_ids: &[String],
    config: &StrategyConfig,
    sink: &mut dyn ProgressSink,
) -> Result<CrewEstimate, OptimizeError> {
    check_request(request, config)?;
    if crew_ids.len() != SEAT_COUNT {
        return Err(OptimizeError::InvalidRequest(format!(
            "expected {SEAT_COUNT} crew ids, got {}",
            crew_ids.len()
        )));
    }
    let voyage = &request.voyage;
    let roster = prime_roster(voyage, &request.crew, request.strategy.prime_mode());

    let mut members = Vec::with_capacity(SEAT_COUNT);
    for id in crew_ids {
        let index = roster
            .iter()
            .position(|member| &member.id == id)
            .ok_or_else(|| OptimizeError::InvalidRequest(format!("unknown crew id '{id}'")))?;
        if members.contains(&index) {
            return Err(OptimizeError::InvalidRequest(format!("crew id '{id}' listed twice")));
        }
        members.push(index);
    }

    let ideal_bonus = ideal_seat_bonus(&config.projector);
    let candidates = voyager_candidates(&roster, &members, PrimedCrew::total_score, ideal_bonus);
    let lineup = seat(voyage, &roster, &candidates, sink)
        .or_else(|| seat_by_matching(voyage, &roster, &members))
        .ok_or(OptimizeError::NoViableLineup)?;
    let projection = project(voyage, lineup.antimatter, &lineup.skills, &config.projector);
    let settings = request.options.simulation_settings(&config.estimator);
    let seed = request.options.seed.unwrap_or_else(entropy_seed);
    sink.progress(&format!(
        "Seated {} ideal; running {} simulations",
        lineup.ideal_count, settings.simulations
    ));
    let estimate = estimate(
        voyage,
        &lineup.skills,
        lineup.antimatter,
        &settings,
        stable_seed(seed, &lineup.key),
    );

    Ok(CrewEstimate {
        lineup,
        projection,
        estimate,
    })
}
