// Score thresholds
// Polarity: the public score reads as human-likeness, so higher is better everywhere.

use crate::models::ScoreBand;

pub const SCORE_MIN: f64 = 5.0;
pub const SCORE_MAX: f64 = 95.0;

/// Returned when a run fails and as the fallback reading for unmeasurable signals.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Scores below this are "at risk" and start the optimization loop.
pub const ACCEPTANCE_THRESHOLD: f64 = 60.0;

/// Lower edge of the borderline band.
pub const BORDERLINE_FLOOR: f64 = 40.0;

/// Re-runs allowed after the first pass.
pub const MAX_OPTIMIZATION_ATTEMPTS: usize = 3;

pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return NEUTRAL_SCORE;
    }
    value.clamp(SCORE_MIN, SCORE_MAX)
}

pub fn is_accepted(score: f64) -> bool {
    score >= ACCEPTANCE_THRESHOLD
}

pub fn band_for(score: f64) -> ScoreBand {
    if score >= ACCEPTANCE_THRESHOLD {
        ScoreBand::LikelyHuman
    } else if score >= BORDERLINE_FLOOR {
        ScoreBand::Borderline
    } else {
        ScoreBand::LikelyAi
    }
}
