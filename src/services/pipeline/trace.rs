// Processing Trace
// Ordered step records for one run, plus the observer interface that mirrors them

use crate::models::{ProcessingStep, StepKind, StepStatus};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Everything an observer can learn about a run, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    StepAdded { index: usize, step: ProcessingStep },
    StepChanged { index: usize, step: ProcessingStep },
    Finished { score: f64, accepted: bool, attempts: usize },
    Failed { message: String },
    Cancelled,
}

pub trait TraceObserver {
    fn on_event(&mut self, event: &TraceEvent);
}

impl<F: FnMut(&TraceEvent)> TraceObserver for F {
    fn on_event(&mut self, event: &TraceEvent) {
        self(event)
    }
}

/// Forwards trace events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl TraceObserver for LoggingObserver {
    fn on_event(&mut self, event: &TraceEvent) {
        match event {
            TraceEvent::StepAdded { index, step } => {
                debug!("[TRACE] #{} added: {} ({:?})", index, step.name, step.status);
            }
            TraceEvent::StepChanged { index, step } => match step.score {
                Some(score) => debug!(
                    "[TRACE] #{} {}: {:?} score={:.1}",
                    index, step.name, step.status, score
                ),
                None => debug!("[TRACE] #{} {}: {:?}", index, step.name, step.status),
            },
            TraceEvent::Finished { score, accepted, attempts } => {
                info!(
                    "[TRACE] run finished: score={:.1} accepted={} attempts={}",
                    score, accepted, attempts
                );
            }
            TraceEvent::Failed { message } => warn!("[TRACE] run failed: {}", message),
            TraceEvent::Cancelled => warn!("[TRACE] run cancelled"),
        }
    }
}

/// Step records owned by one run. Every mutation is echoed to the observer.
#[derive(Debug, Default, Clone)]
pub struct Trace {
    steps: Vec<ProcessingStep>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[ProcessingStep] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<ProcessingStep> {
        self.steps
    }

    pub fn push(
        &mut self,
        name: impl Into<String>,
        kind: StepKind,
        status: StepStatus,
        observer: &mut dyn TraceObserver,
    ) -> usize {
        let step = ProcessingStep {
            name: name.into(),
            kind,
            status,
            started_at: Utc::now(),
            finished_at: None,
            score: None,
        };
        let index = self.steps.len();
        self.steps.push(step.clone());
        observer.on_event(&TraceEvent::StepAdded { index, step });
        index
    }

    /// Moves a record to `status`. Running restarts the clock; closed states stamp
    /// `finished_at`. Unknown indices are ignored.
    pub fn set_status(&mut self, index: usize, status: StepStatus, observer: &mut dyn TraceObserver) {
        let Some(step) = self.steps.get_mut(index) else {
            return;
        };
        step.status = status;
        if status == StepStatus::Running {
            step.started_at = Utc::now();
        } else if !status.is_open() {
            step.finished_at = Some(Utc::now());
        }
        let step = step.clone();
        observer.on_event(&TraceEvent::StepChanged { index, step });
    }

    pub fn finish_with_score(&mut self, index: usize, score: f64, observer: &mut dyn TraceObserver) {
        if let Some(step) = self.steps.get_mut(index) {
            step.score = Some(score);
        }
        self.set_status(index, StepStatus::Done, observer);
    }

    /// Closes every pending or running record with `status`.
    pub fn close_open(&mut self, status: StepStatus, observer: &mut dyn TraceObserver) {
        let open: Vec<usize> = self
            .steps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.status.is_open())
            .map(|(i, _)| i)
            .collect();
        for index in open {
            self.set_status(index, status, observer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StageKind;

    #[test]
    fn test_push_and_close_emit_events() {
        let mut events = Vec::new();
        let mut observer = |e: &TraceEvent| events.push(e.clone());
        let mut trace = Trace::new();

        let a = trace.push("Normalize", StepKind::Stage(StageKind::Normalize), StepStatus::Pending, &mut observer);
        let b = trace.push("Reorder", StepKind::Stage(StageKind::Restructure), StepStatus::Pending, &mut observer);
        trace.set_status(a, StepStatus::Running, &mut observer);
        assert_eq!(trace.steps()[a].status, StepStatus::Running);

        trace.close_open(StepStatus::Cancelled, &mut observer);
        assert!(trace.steps().iter().all(|s| !s.status.is_open()));
        assert_eq!(trace.steps()[b].status, StepStatus::Cancelled);
        assert!(trace.steps()[a].finished_at.is_some());

        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], TraceEvent::StepAdded { index: 0, .. }));
    }

    #[test]
    fn test_finish_with_score_records_score() {
        let mut observer = |_: &TraceEvent| {};
        let mut trace = Trace::new();
        let idx = trace.push("Attempt", StepKind::OptimizationAttempt(1), StepStatus::Running, &mut observer);
        trace.finish_with_score(idx, 64.5, &mut observer);
        assert_eq!(trace.steps()[idx].score, Some(64.5));
        assert_eq!(trace.steps()[idx].status, StepStatus::Done);
        assert!(trace.steps()[idx].finished_at.is_some());
    }

    #[test]
    fn test_unknown_index_is_ignored() {
        let mut observer = |_: &TraceEvent| {};
        let mut trace = Trace::new();
        trace.set_status(3, StepStatus::Done, &mut observer);
        assert!(trace.steps().is_empty());
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_string(&TraceEvent::Cancelled).unwrap();
        assert_eq!(json, r#"{"event":"cancelled"}"#);
    }
}
