// Detection Module
// Heuristic human-likeness scoring organized into:
// - signals: per-signal AI-likelihood readings and style diagnostics
// - likeness: weighted combination, settings adjustments and clamping
// - thresholds: score polarity, bands and the acceptance threshold

pub mod signals;
pub mod likeness;
pub mod thresholds;

pub use likeness::{score, score_text, settings_adjustment};
pub use signals::TextProfile;
pub use thresholds::{
    band_for,
    clamp_score,
    is_accepted,
    ACCEPTANCE_THRESHOLD,
    MAX_OPTIMIZATION_ATTEMPTS,
    NEUTRAL_SCORE,
    SCORE_MAX,
    SCORE_MIN,
};
