use std::time::Duration;

use crate::data::loader::load_request;
use crate::data::validate::{validate_roster, ValidationSeverity};
use crate::job::{collect_with_budget, spawn_optimization, JobOutcome};
use crate::optimizer::config::{strategy_config_from_env, StrategyConfig, STRATEGY_CONFIG_ENV};
use crate::optimizer::estimate_crew;
use crate::optimizer::progress::StderrSink;
use crate::optimizer::OptimizationRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Optimize,
    Estimate,
    Validate,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("optimize") => Some(Command::Optimize),
        Some("estimate") => Some(Command::Estimate),
        Some("validate") => Some(Command::Validate),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Optimize) => handle_optimize(args),
        Some(Command::Estimate) => handle_estimate(args),
        Some(Command::Validate) => handle_validate(args),
        None => {
            eprintln!("usage: voyager <optimize|estimate|validate> <request.json> [options]");
            2
        }
    }
}

fn load_inputs(path: &str) -> Result<(OptimizationRequest, StrategyConfig), i32> {
    let config = strategy_config_from_env().map_err(|err| {
        eprintln!("failed to load strategy config from ${STRATEGY_CONFIG_ENV}: {err}");
        1
    })?;
    let request = load_request(path).map_err(|err| {
        eprintln!("{path}: {err}");
        1
    })?;
    Ok((request, config))
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|index| args.get(index + 1))
}

fn print_json<T: serde::Serialize>(value: &T, what: &str) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize {what}: {err}");
            1
        }
    }
}

fn handle_optimize(args: &[String]) -> i32 {
    let Some(path) = args.get(2) else {
        eprintln!("usage: voyager optimize <request.json> [--budget-secs N] [--quiet]");
        return 2;
    };
    let (request, config) = match load_inputs(path) {
        Ok(inputs) => inputs,
        Err(code) => return code,
    };
    let budget = flag_value(args, "--budget-secs")
        .map(|raw| parse_u64_arg(Some(raw), "budget-secs", 0))
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);
    let quiet = args.iter().any(|arg| arg == "--quiet");

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start async runtime: {err}");
            return 1;
        }
    };
    let outcome = runtime.block_on(async {
        let job = spawn_optimization(request, config);
        if !quiet {
            eprintln!("job {}", job.id);
        }
        collect_with_budget(job, budget, |line| {
            if !quiet {
                eprintln!("{line}");
            }
        })
        .await
    });
    // an abandoned job keeps its blocking thread; don't wait for it
    runtime.shutdown_background();

    match outcome {
        JobOutcome::Completed(lineups) => print_json(&lineups, "optimization result"),
        JobOutcome::Failed(message) => {
            eprintln!("optimization failed: {message}");
            1
        }
        JobOutcome::TimedOut => {
            eprintln!("optimization exceeded its time budget");
            1
        }
        JobOutcome::Disconnected => {
            eprintln!("optimization worker stopped without a result");
            1
        }
    }
}

fn handle_estimate(args: &[String]) -> i32 {
    let Some(path) = args.get(2) else {
        eprintln!("usage: voyager estimate <request.json> <crew-id> x12");
        return 2;
    };
    let crew_ids: Vec<String> = args[3..]
        .iter()
        .filter(|arg| !arg.starts_with("--"))
        .cloned()
        .collect();
    let (request, config) = match load_inputs(path) {
        Ok(inputs) => inputs,
        Err(code) => return code,
    };
    let debug = args.iter().any(|arg| arg == "--debug");

    match estimate_crew(&request, &crew_ids, &config, &mut StderrSink { debug }) {
        Ok(result) => print_json(&result, "estimate"),
        Err(err) => {
            eprintln!("estimate failed: {err}");
            1
        }
    }
}

fn handle_validate(args: &[String]) -> i32 {
    let Some(path) = args.get(2) else {
        eprintln!("usage: voyager validate <request.json>");
        return 2;
    };
    let request = match load_request(path) {
        Ok(request) => request,
        Err(err) => {
            eprintln!("{path}: {err}");
            return 1;
        }
    };

    let report = validate_roster(&request.voyage, &request.crew);
    for diagnostic in &report.diagnostics {
        if diagnostic.severity == ValidationSeverity::Error {
            eprintln!("- {diagnostic}");
        } else {
            println!("- {diagnostic}");
        }
    }
    if report.has_errors() {
        eprintln!("validation failed: {} error(s)", report.errors().count());
        1
    } else {
        println!("validation passed: {path}");
        0
    }
}

fn parse_u64_arg(raw: Option<&String>, name: &str, default: u64) -> u64 {
    raw.and_then(|value| value.parse::<u64>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                eprintln!("invalid {name} '{value}', defaulting to {default}");
            }
            default
        })
}
