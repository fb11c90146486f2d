//! Host boundary: each optimization runs on a blocking worker and reports back
//! through a message stream that ends with exactly one terminal message.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use futures_util::StreamExt;
use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use crate::optimizer::config::StrategyConfig;
use crate::optimizer::progress::ProgressSink;
use crate::optimizer::ranking::BestLineup;
use crate::optimizer::{optimize, OptimizationRequest};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobMessage {
    Progress { message: String },
    Result { lineups: Vec<BestLineup> },
    Error { message: String },
}

impl JobMessage {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}

pub struct OptimizationJob {
    pub id: Uuid,
    pub messages: UnboundedReceiverStream<JobMessage>,
}

struct ChannelSink {
    tx: UnboundedSender<JobMessage>,
}

impl ProgressSink for ChannelSink {
    fn progress(&mut self, message: &str) {
        // receiver gone means the caller abandoned the job
        let _ = self.tx.send(JobMessage::Progress {
            message: message.to_string(),
        });
    }
}

/// Start one optimization on the tokio blocking pool. Must be called from within a
/// tokio runtime.
pub fn spawn_optimization(request: OptimizationRequest, config: StrategyConfig) -> OptimizationJob {
    let (tx, rx) = mpsc::unbounded_channel();
    let id = Uuid::new_v4();

    tokio::task::spawn_blocking(move || {
        let mut sink = ChannelSink { tx: tx.clone() };
        let outcome = catch_unwind(AssertUnwindSafe(|| optimize(&request, &config, &mut sink)));
        let terminal = match outcome {
            Ok(Ok(lineups)) => JobMessage::Result { lineups },
            Ok(Err(err)) => JobMessage::Error {
                message: err.to_string(),
            },
            Err(_) => JobMessage::Error {
                message: format!("optimization job {id} panicked"),
            },
        };
        let _ = tx.send(terminal);
    });

    OptimizationJob {
        id,
        messages: UnboundedReceiverStream::new(rx),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed(Vec<BestLineup>),
    Failed(String),
    /// The budget ran out; the job's channel was dropped.
    TimedOut,
    /// The worker went away without a terminal message.
    Disconnected,
}

/// Drain a job, forwarding progress lines, until its terminal message or until
/// `budget` elapses.
pub async fn collect_with_budget<F>(
    job: OptimizationJob,
    budget: Option<Duration>,
    mut on_progress: F,
) -> JobOutcome
where
    F: FnMut(&str),
{
    let mut messages = job.messages;
    let drain = async {
        while let Some(message) = messages.next().await {
            match message {
                JobMessage::Progress { message } => on_progress(&message),
                JobMessage::Result { lineups } => return JobOutcome::Completed(lineups),
                JobMessage::Error { message } => return JobOutcome::Failed(message),
            }
        }
        JobOutcome::Disconnected
    };

    match budget {
        Some(limit) => tokio::time::timeout(limit, drain)
            .await
            .unwrap_or(JobOutcome::TimedOut),
        None => drain.await,
    }
}
