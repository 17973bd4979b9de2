// Redacta Core Services
// Text utilities, rewrite stages, scoring, pipeline orchestration and persistence

pub mod text_processor;
pub mod lexicon;
pub mod transform;
pub mod detection;
pub mod pipeline;
pub mod config_store;
pub mod file_loader;

pub use text_processor::*;
pub use config_store::{ConfigStore, ConfigStoreError, StoredSettings};
pub use file_loader::{extract_text, load_file, LoaderError};

pub use detection::{
    band_for,
    clamp_score,
    is_accepted,
    score,
    score_text,
    settings_adjustment,
    ACCEPTANCE_THRESHOLD,
    MAX_OPTIMIZATION_ATTEMPTS,
    NEUTRAL_SCORE,
};
pub use pipeline::{
    run_paced,
    run_pipeline,
    LoggingObserver,
    PacingOptions,
    Pipeline,
    PipelineError,
    PipelineRun,
    RunState,
    Trace,
    TraceEvent,
    TraceObserver,
};
pub use transform::{standard_stages, StageError, TextStage};
