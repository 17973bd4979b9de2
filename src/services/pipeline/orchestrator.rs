// Pipeline Orchestrator
// Per-run state machine: Idle -> Running(stage) ... -> Scoring -> (Optimizing -> Running ...)* -> Done

use crate::models::{
    HumanizeConfig, PipelineOutput, ProcessingStep, ScoreBreakdown, StepKind, StepStatus,
};
use crate::services::detection::{is_accepted, score_text, NEUTRAL_SCORE};
use crate::services::transform::{standard_stages, TextStage};
use rand::RngCore;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::optimizer::{attempt_config, attempt_label, should_retry};
use super::trace::{LoggingObserver, Trace, TraceEvent, TraceObserver};

const SCORING_LABEL: &str = "Likeness scoring";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("input text is empty")]
    EmptyInput,
    #[error("run cancelled")]
    Cancelled,
    #[error("processing failed at {stage}: {message}")]
    ProcessingFailed { stage: String, message: String },
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RunState {
    Idle,
    /// Index into the current pass of enabled stages.
    Running(usize),
    Scoring,
    Optimizing { attempt: usize },
    Done,
    Failed,
    Cancelled,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }
}

/// Fixed, ordered stage list shared by every run.
pub struct Pipeline {
    stages: Vec<Box<dyn TextStage>>,
}

impl Pipeline {
    pub fn standard() -> Self {
        Self::with_stages(standard_stages())
    }

    pub fn with_stages(stages: Vec<Box<dyn TextStage>>) -> Self {
        Self { stages }
    }

    /// Validates the input and prepares a run without executing anything.
    pub fn start<'a>(
        &'a self,
        input: &str,
        config: &'a HumanizeConfig,
    ) -> Result<PipelineRun<'a>, PipelineError> {
        if input.trim().is_empty() {
            return Err(PipelineError::EmptyInput);
        }
        Ok(PipelineRun {
            pipeline: self,
            config,
            run_id: Uuid::new_v4(),
            state: RunState::Idle,
            text: input.to_string(),
            trace: Trace::new(),
            pass_config: config.clone(),
            pass: Vec::new(),
            attempts: 0,
            attempt_record: None,
            breakdown: None,
            failure: None,
        })
    }

    /// Drives a run to completion synchronously.
    pub fn run(
        &self,
        input: &str,
        config: &HumanizeConfig,
        rng: &mut dyn RngCore,
        observer: &mut dyn TraceObserver,
    ) -> Result<PipelineOutput, PipelineError> {
        let mut run = self.start(input, config)?;
        while !run.is_finished() {
            run.advance(rng, observer);
        }
        run.into_result()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

/// One enabled stage of the current pass and its trace record.
#[derive(Debug, Copy, Clone)]
struct PlannedStage {
    stage: usize,
    record: usize,
}

pub struct PipelineRun<'a> {
    pipeline: &'a Pipeline,
    config: &'a HumanizeConfig,
    run_id: Uuid,
    state: RunState,
    text: String,
    trace: Trace,
    /// Settings for the current pass: a copy of `config`, or its escalation.
    pass_config: HumanizeConfig,
    pass: Vec<PlannedStage>,
    attempts: usize,
    attempt_record: Option<usize>,
    breakdown: Option<ScoreBreakdown>,
    failure: Option<PipelineError>,
}

impl<'a> PipelineRun<'a> {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn trace(&self) -> &[ProcessingStep] {
        self.trace.steps()
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn failure(&self) -> Option<&PipelineError> {
        self.failure.as_ref()
    }

    /// Performs exactly one state transition and returns the new state.
    pub fn advance(&mut self, rng: &mut dyn RngCore, observer: &mut dyn TraceObserver) -> RunState {
        self.state = match self.state {
            RunState::Idle => {
                info!(
                    "[PIPELINE] run {} started: chars={} intensity={}",
                    self.run_id,
                    self.text.chars().count(),
                    self.config.intensity.as_str()
                );
                self.plan_pass(observer)
            }
            RunState::Running(i) => self.run_stage(i, rng, observer),
            RunState::Scoring => self.score(observer),
            RunState::Optimizing { attempt } => self.begin_attempt(attempt, observer),
            terminal => terminal,
        };
        self.state
    }

    /// Abandons the run between transitions. Open records are closed as cancelled.
    pub fn cancel(&mut self, observer: &mut dyn TraceObserver) {
        if self.state.is_terminal() {
            return;
        }
        warn!("[PIPELINE] run {} cancelled in state {:?}", self.run_id, self.state);
        self.trace.close_open(StepStatus::Cancelled, observer);
        self.failure = Some(PipelineError::Cancelled);
        self.state = RunState::Cancelled;
        observer.on_event(&TraceEvent::Cancelled);
    }

    /// Appends a pending record for every enabled stage of the next pass.
    fn plan_pass(&mut self, observer: &mut dyn TraceObserver) -> RunState {
        let pipeline = self.pipeline;
        self.pass.clear();
        for (stage, s) in pipeline.stages.iter().enumerate() {
            if !s.is_enabled(&self.pass_config) {
                continue;
            }
            let record = self.trace.push(
                s.kind().label(),
                StepKind::Stage(s.kind()),
                StepStatus::Pending,
                observer,
            );
            self.pass.push(PlannedStage { stage, record });
        }
        if self.pass.is_empty() {
            RunState::Scoring
        } else {
            RunState::Running(0)
        }
    }

    fn run_stage(
        &mut self,
        index: usize,
        rng: &mut dyn RngCore,
        observer: &mut dyn TraceObserver,
    ) -> RunState {
        let Some(planned) = self.pass.get(index).copied() else {
            return RunState::Scoring;
        };
        let pipeline = self.pipeline;
        let stage = &pipeline.stages[planned.stage];
        self.trace.set_status(planned.record, StepStatus::Running, observer);

        match stage.apply(&self.text, &self.pass_config, rng) {
            Ok(output) => {
                debug!(
                    "[PIPELINE] {}: {} -> {} chars",
                    stage.kind().label(),
                    self.text.chars().count(),
                    output.chars().count()
                );
                self.text = output;
                self.trace.set_status(planned.record, StepStatus::Done, observer);
                if index + 1 < self.pass.len() {
                    RunState::Running(index + 1)
                } else {
                    RunState::Scoring
                }
            }
            Err(err) => {
                self.trace.set_status(planned.record, StepStatus::Failed, observer);
                self.fail(stage.kind().label(), err.message, observer)
            }
        }
    }

    fn score(&mut self, observer: &mut dyn TraceObserver) -> RunState {
        // Escalated settings only drive the stages; the text is judged under the caller's.
        let breakdown = score_text(&self.text, self.config);
        let score = breakdown.score;

        match self.attempt_record.take() {
            Some(record) => {
                info!("[PIPELINE] attempt #{} scored {:.1}", self.attempts, score);
                self.trace.finish_with_score(record, score, observer);
            }
            None => {
                let record = self.trace.push(
                    SCORING_LABEL,
                    StepKind::Scoring,
                    StepStatus::Running,
                    observer,
                );
                self.trace.finish_with_score(record, score, observer);
            }
        }
        self.breakdown = Some(breakdown);

        if should_retry(self.config, score, self.attempts) {
            return RunState::Optimizing { attempt: self.attempts + 1 };
        }

        info!(
            "[PIPELINE] run {} done: score={:.1} attempts={}",
            self.run_id, score, self.attempts
        );
        observer.on_event(&TraceEvent::Finished {
            score,
            accepted: is_accepted(score),
            attempts: self.attempts,
        });
        RunState::Done
    }

    /// Derives the escalated settings and replans against the current candidate text.
    fn begin_attempt(&mut self, attempt: usize, observer: &mut dyn TraceObserver) -> RunState {
        self.attempts = attempt;
        self.pass_config = attempt_config(self.config, attempt);
        info!(
            "[PIPELINE] optimization attempt #{} at intensity {}",
            attempt,
            self.pass_config.intensity.as_str()
        );
        let record = self.trace.push(
            attempt_label(attempt),
            StepKind::OptimizationAttempt(attempt),
            StepStatus::Running,
            observer,
        );
        self.attempt_record = Some(record);
        self.plan_pass(observer)
    }

    /// Resets output to safe defaults and closes every open record.
    fn fail(&mut self, stage: &str, message: String, observer: &mut dyn TraceObserver) -> RunState {
        warn!("[PIPELINE] run {} failed at {}: {}", self.run_id, stage, message);
        if let Some(record) = self.attempt_record.take() {
            self.trace.set_status(record, StepStatus::Failed, observer);
        }
        self.trace.close_open(StepStatus::Cancelled, observer);
        self.text.clear();
        self.breakdown = None;
        let error = PipelineError::ProcessingFailed {
            stage: stage.to_string(),
            message,
        };
        observer.on_event(&TraceEvent::Failed {
            message: error.to_string(),
        });
        self.failure = Some(error);
        RunState::Failed
    }

    /// The run's result with safe defaults: anything but `Done` yields empty output
    /// and the neutral score.
    pub fn into_output(self) -> PipelineOutput {
        let done = self.state == RunState::Done;
        let breakdown = if done { self.breakdown } else { None };
        let score = breakdown.as_ref().map_or(NEUTRAL_SCORE, |b| b.score);
        PipelineOutput {
            run_id: self.run_id,
            output_text: if done { self.text } else { String::new() },
            score,
            accepted: done && is_accepted(score),
            breakdown,
            trace: self.trace.into_steps(),
            optimization_attempts: self.attempts,
        }
    }

    pub fn into_result(self) -> Result<PipelineOutput, PipelineError> {
        match self.state {
            RunState::Done => Ok(self.into_output()),
            RunState::Failed => Err(self.failure.unwrap_or(PipelineError::ProcessingFailed {
                stage: "pipeline".to_string(),
                message: "unknown failure".to_string(),
            })),
            _ => Err(PipelineError::Cancelled),
        }
    }
}

/// The pipeline entry point: standard stages, `tracing` observer.
pub fn run_pipeline(
    input: &str,
    config: &HumanizeConfig,
    rng: &mut dyn RngCore,
) -> Result<PipelineOutput, PipelineError> {
    Pipeline::standard().run(input, config, rng, &mut LoggingObserver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Intensity, StageKind};
    use crate::services::detection::{MAX_OPTIMIZATION_ATTEMPTS, SCORE_MAX, SCORE_MIN};
    use crate::services::transform::StageError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TEXT: &str = "El sistema procesa los datos. El sistema guarda los datos. El sistema envía los datos.\n\n\
        El equipo revisa el informe. El equipo corrige el informe. El equipo publica el informe.\n\n\
        La empresa mide el impacto. La empresa evalúa el impacto. La empresa reporta el impacto.\n\n\
        El proyecto termina en junio. El proyecto cierra en junio. El proyecto acaba en junio.";

    struct Failing;

    impl TextStage for Failing {
        fn kind(&self) -> StageKind {
            StageKind::StyleVariation
        }

        fn apply(
            &self,
            _text: &str,
            _config: &HumanizeConfig,
            _rng: &mut dyn RngCore,
        ) -> Result<String, StageError> {
            Err(StageError {
                stage: StageKind::StyleVariation,
                message: "boom".to_string(),
            })
        }
    }

    fn quiet() -> impl FnMut(&TraceEvent) {
        |_: &TraceEvent| {}
    }

    #[test]
    fn test_empty_input_rejected_before_run() {
        let pipeline = Pipeline::standard();
        let config = HumanizeConfig::default();
        assert_eq!(pipeline.start("  \n\t ", &config).err(), Some(PipelineError::EmptyInput));
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(run_pipeline("", &config, &mut rng).err(), Some(PipelineError::EmptyInput));
    }

    #[test]
    fn test_single_pass_state_sequence() {
        let pipeline = Pipeline::standard();
        let config = HumanizeConfig {
            enable_auto_optimize: false,
            ..HumanizeConfig::all_disabled(Intensity::Light)
        };
        let mut rng = StdRng::seed_from_u64(1);
        let mut observer = quiet();
        let mut run = pipeline.start("Hola mundo.", &config).unwrap();

        assert_eq!(run.state(), RunState::Idle);
        assert_eq!(run.advance(&mut rng, &mut observer), RunState::Running(0));
        assert_eq!(run.trace().len(), 2);
        assert!(run.trace().iter().all(|s| s.status == StepStatus::Pending));
        assert_eq!(run.advance(&mut rng, &mut observer), RunState::Running(1));
        assert_eq!(run.advance(&mut rng, &mut observer), RunState::Scoring);
        assert_eq!(run.advance(&mut rng, &mut observer), RunState::Done);
        assert_eq!(run.advance(&mut rng, &mut observer), RunState::Done);

        let output = run.into_output();
        assert_eq!(output.output_text, "Hola mundo.");
        assert_eq!(output.trace.len(), 3);
        assert_eq!(output.trace[2].kind, StepKind::Scoring);
        assert!(output.trace.iter().all(|s| s.status == StepStatus::Done));
    }

    #[test]
    fn test_optimization_is_bounded_and_recorded() {
        let config = HumanizeConfig::all_disabled(Intensity::Light);
        let config = HumanizeConfig {
            enable_auto_optimize: true,
            ..config
        };
        let snapshot = config.clone();
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let output = Pipeline::standard()
                .run(TEXT, &config, &mut rng, &mut quiet())
                .unwrap();
            let attempts: Vec<_> = output
                .trace
                .iter()
                .filter(|s| matches!(s.kind, StepKind::OptimizationAttempt(_)))
                .collect();
            assert!(attempts.len() <= MAX_OPTIMIZATION_ATTEMPTS);
            assert_eq!(attempts.len(), output.optimization_attempts);
            assert!(attempts.iter().all(|s| s.score.is_some()));
            assert!(output.trace.iter().all(|s| !s.status.is_open()));
            assert!((SCORE_MIN..=SCORE_MAX).contains(&output.score));
        }
        assert_eq!(config, snapshot);
    }

    #[test]
    fn test_low_first_score_triggers_optimization() {
        let config = HumanizeConfig {
            enable_auto_optimize: true,
            ..HumanizeConfig::all_disabled(Intensity::Light)
        };
        let mut rng = StdRng::seed_from_u64(7);
        let output = Pipeline::standard().run(TEXT, &config, &mut rng, &mut quiet()).unwrap();
        let first_score = output
            .trace
            .iter()
            .find(|s| s.kind == StepKind::Scoring)
            .and_then(|s| s.score)
            .unwrap();
        assert!(first_score < 60.0);
        assert!(output.optimization_attempts >= 1);
    }

    #[test]
    fn test_escalation_does_not_inflate_score() {
        let config = HumanizeConfig {
            enable_auto_optimize: true,
            ..HumanizeConfig::all_disabled(Intensity::Light)
        };
        let mut rng = StdRng::seed_from_u64(12);
        let output = Pipeline::standard().run(TEXT, &config, &mut rng, &mut quiet()).unwrap();

        assert_eq!(output.score, crate::services::detection::score(&output.output_text, &config));
        let breakdown = output.breakdown.as_ref().unwrap();
        assert_eq!(breakdown.settings_adjustment, 0.0);

        // Attempts 1 and 2 only reshuffle same-sized paragraphs, so they cannot pass.
        let attempt_scores: Vec<f64> = output
            .trace
            .iter()
            .filter(|s| matches!(s.kind, StepKind::OptimizationAttempt(_)))
            .filter_map(|s| s.score)
            .collect();
        assert_eq!(output.optimization_attempts, MAX_OPTIMIZATION_ATTEMPTS);
        assert!(attempt_scores[0] < 60.0);
        assert_eq!(attempt_scores[0], attempt_scores[1]);
    }

    #[test]
    fn test_failing_stage_resets_output_and_closes_trace() {
        let mut stages = standard_stages();
        stages.push(Box::new(Failing));
        let pipeline = Pipeline::with_stages(stages);
        let config = HumanizeConfig::default();
        let mut rng = StdRng::seed_from_u64(3);

        let mut failed = false;
        let mut observer = |e: &TraceEvent| {
            if matches!(e, TraceEvent::Failed { .. }) {
                failed = true;
            }
        };
        let mut run = pipeline.start(TEXT, &config).unwrap();
        while !run.is_finished() {
            run.advance(&mut rng, &mut observer);
        }
        assert_eq!(run.state(), RunState::Failed);
        assert!(run.trace().iter().all(|s| !s.status.is_open()));
        assert!(run.trace().iter().any(|s| s.status == StepStatus::Failed));
        assert!(matches!(run.failure(), Some(PipelineError::ProcessingFailed { .. })));

        let output = run.into_output();
        assert_eq!(output.output_text, "");
        assert_eq!(output.score, NEUTRAL_SCORE);
        assert!(output.breakdown.is_none());
        assert!(failed);

        let err = pipeline.run(TEXT, &config, &mut rng, &mut quiet()).unwrap_err();
        assert_eq!(
            err,
            PipelineError::ProcessingFailed {
                stage: StageKind::StyleVariation.label().to_string(),
                message: "boom".to_string(),
            }
        );
    }

    #[test]
    fn test_cancel_closes_open_records() {
        let pipeline = Pipeline::standard();
        let config = HumanizeConfig::default();
        let mut rng = StdRng::seed_from_u64(5);
        let mut observer = quiet();
        let mut run = pipeline.start(TEXT, &config).unwrap();
        run.advance(&mut rng, &mut observer);
        run.advance(&mut rng, &mut observer);
        run.cancel(&mut observer);

        assert_eq!(run.state(), RunState::Cancelled);
        assert!(run.trace().iter().all(|s| !s.status.is_open()));
        assert!(run.trace().iter().any(|s| s.status == StepStatus::Cancelled));
        assert_eq!(run.into_result().unwrap_err(), PipelineError::Cancelled);
    }

    #[test]
    fn test_same_seed_same_output() {
        let config = HumanizeConfig::default();
        let a = run_pipeline(TEXT, &config, &mut StdRng::seed_from_u64(99)).unwrap();
        let b = run_pipeline(TEXT, &config, &mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(a.output_text, b.output_text);
        assert_eq!(a.score, b.score);
        assert_ne!(a.run_id, b.run_id);
    }
}
