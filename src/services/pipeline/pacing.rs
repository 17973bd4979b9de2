// Paced Runner
// Async driver that sleeps between transitions so a display can follow the trace,
// and abandons the run when the cancel channel flips to true

use crate::models::{HumanizeConfig, PipelineOutput};
use rand::RngCore;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

use super::orchestrator::{Pipeline, PipelineError};
use super::trace::TraceObserver;

/// Delay between transitions for interactive callers.
pub const DEFAULT_STEP_DELAY_MS: u64 = 300;

#[derive(Debug, Clone, Default)]
pub struct PacingOptions {
    pub delay: Duration,
    /// Send `true` on the paired sender to request cancellation.
    pub cancel: Option<watch::Receiver<bool>>,
}

impl PacingOptions {
    pub fn interactive(cancel: watch::Receiver<bool>) -> Self {
        Self {
            delay: Duration::from_millis(DEFAULT_STEP_DELAY_MS),
            cancel: Some(cancel),
        }
    }
}

enum Wake {
    Elapsed,
    Cancelled,
    SenderGone,
}

fn cancel_requested(cancel: &Option<watch::Receiver<bool>>) -> bool {
    cancel.as_ref().map_or(false, |rx| *rx.borrow())
}

async fn pause(delay: Duration, cancel: &mut Option<watch::Receiver<bool>>) -> Wake {
    let Some(rx) = cancel.as_mut() else {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        return Wake::Elapsed;
    };
    if delay.is_zero() {
        return Wake::Elapsed;
    }
    tokio::select! {
        _ = tokio::time::sleep(delay) => Wake::Elapsed,
        changed = rx.changed() => match changed {
            Ok(()) if *rx.borrow() => Wake::Cancelled,
            Ok(()) => Wake::Elapsed,
            Err(_) => Wake::SenderGone,
        },
    }
}

/// Same transitions as `Pipeline::run`, so a zero delay with no cancellation yields
/// identical output for the same seed.
pub async fn run_paced(
    pipeline: &Pipeline,
    input: &str,
    config: &HumanizeConfig,
    rng: &mut dyn RngCore,
    observer: &mut dyn TraceObserver,
    options: PacingOptions,
) -> Result<PipelineOutput, PipelineError> {
    let PacingOptions { delay, mut cancel } = options;
    let mut run = pipeline.start(input, config)?;

    while !run.is_finished() {
        if cancel_requested(&cancel) {
            run.cancel(observer);
            break;
        }
        run.advance(rng, observer);
        if run.is_finished() {
            break;
        }
        match pause(delay, &mut cancel).await {
            Wake::Elapsed => {}
            Wake::Cancelled => {
                info!("[PACING] cancellation requested after {} attempt(s)", run.attempts());
                run.cancel(observer);
            }
            Wake::SenderGone => cancel = None,
        }
    }

    run.into_result()
}
