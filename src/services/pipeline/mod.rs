// Pipeline Module
// Runs the transform stages and the scorer as one traced, optionally self-optimizing run:
// - orchestrator: run state machine, failure handling and the synchronous driver
// - optimizer: retry policy and escalated settings for optimization attempts
// - trace: step records and the observer interface
// - pacing: async driver with inter-step delays and cancellation

pub mod orchestrator;
pub mod optimizer;
pub mod trace;
pub mod pacing;

pub use orchestrator::{run_pipeline, Pipeline, PipelineError, PipelineRun, RunState};
pub use pacing::{run_paced, PacingOptions, DEFAULT_STEP_DELAY_MS};
pub use trace::{LoggingObserver, Trace, TraceEvent, TraceObserver};
