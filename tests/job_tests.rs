mod common;

use std::time::Duration;

use futures_util::StreamExt;
use voyager::job::{collect_with_budget, spawn_optimization, JobMessage, JobOutcome};
use voyager::optimizer::config::StrategyConfig;
use voyager::optimizer::AssemblerKind;

#[tokio::test]
async fn job_streams_progress_then_one_result() {
    let job = spawn_optimization(
        common::request(AssemblerKind::RankPruneSeat, 14),
        StrategyConfig::default(),
    );
    let messages: Vec<JobMessage> = job.messages.collect().await;

    let terminal: Vec<&JobMessage> = messages.iter().filter(|m| m.is_terminal()).collect();
    assert_eq!(terminal.len(), 1);
    assert!(messages.last().is_some_and(JobMessage::is_terminal));
    assert!(matches!(terminal[0], JobMessage::Result { lineups } if !lineups.is_empty()));
    assert!(messages.len() > 1, "expected progress before the result");
}

#[tokio::test]
async fn failing_request_ends_with_a_single_error() {
    let mut request = common::request(AssemblerKind::RankPruneSeat, 14);
    request.voyage.seats.truncate(10);
    let job = spawn_optimization(request, StrategyConfig::default());
    let messages: Vec<JobMessage> = job.messages.collect().await;

    assert_eq!(messages.len(), 1);
    match &messages[0] {
        JobMessage::Error { message } => assert!(message.contains("invalid voyage")),
        other => panic!("expected an error, got {other:?}"),
    }
}

#[tokio::test]
async fn jobs_get_distinct_ids() {
    let config = StrategyConfig::default();
    let a = spawn_optimization(common::request(AssemblerKind::BoostVector, 13), config.clone());
    let b = spawn_optimization(common::request(AssemblerKind::BoostVector, 13), config);
    assert_ne!(a.id, b.id);
    let _ = a.messages.collect::<Vec<_>>().await;
    let _ = b.messages.collect::<Vec<_>>().await;
}

#[tokio::test]
async fn collect_with_budget_forwards_progress_and_completes() {
    let job = spawn_optimization(
        common::request(AssemblerKind::BoostVector, 14),
        StrategyConfig::default(),
    );
    let mut progress = Vec::new();
    let outcome = collect_with_budget(job, Some(Duration::from_secs(300)), |line| {
        progress.push(line.to_string())
    })
    .await;

    assert!(matches!(outcome, JobOutcome::Completed(ref lineups) if !lineups.is_empty()));
    assert!(progress.iter().any(|line| line.starts_with("Primed 14 crew")));
}

#[tokio::test]
async fn collect_reports_failures() {
    let mut request = common::request(AssemblerKind::RankPruneSeat, 14);
    request.crew.truncate(5);
    let outcome = collect_with_budget(
        spawn_optimization(request, StrategyConfig::default()),
        None,
        |_| {},
    )
    .await;

    match outcome {
        JobOutcome::Failed(message) => assert!(message.contains("only 5 crew")),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn job_messages_serialize_with_a_type_tag() {
    let progress = JobMessage::Progress {
        message: "Ranked 14 viable crew".to_string(),
    };
    let json = serde_json::to_value(&progress).expect("message should serialize");
    assert_eq!(json["type"], "progress");
    assert_eq!(json["message"], "Ranked 14 viable crew");

    let error = JobMessage::Error {
        message: "boom".to_string(),
    };
    assert!(error.is_terminal());
    assert!(!progress.is_terminal());
    assert_eq!(serde_json::to_value(&error).expect("serializes")["type"], "error");
}
