// Likeness Scorer
// Weighted heuristic signals plus flat settings adjustments, reported as human-likeness

use crate::models::{HumanizeConfig, Intensity, ScoreBreakdown, SignalScores};
use crate::services::lexicon::lexicon;

use super::signals::{
    diagnostics, human_markers, length_uniformity, paragraph_rhythm, perturbation_artifacts,
    vocabulary_diversity, TextProfile,
};
use super::thresholds::{band_for, clamp_score};

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

struct ScorerWeights {
    length_uniformity: f64,
    vocabulary_diversity: f64,
    paragraph_rhythm: f64,
    human_markers: f64,
    perturbation_artifacts: f64,
    aggressive_adjustment: f64,
    medium_adjustment: f64,
    colloquial_adjustment: f64,
    perturbation_adjustment: f64,
    source_mixing_adjustment: f64,
    style_adjustment: f64,
}

static WEIGHTS: ScorerWeights = ScorerWeights {
    length_uniformity: 0.25,
    vocabulary_diversity: 0.2,
    paragraph_rhythm: 0.2,
    human_markers: 0.2,
    perturbation_artifacts: 0.15,
    aggressive_adjustment: -30.0,
    medium_adjustment: -15.0,
    colloquial_adjustment: -10.0,
    perturbation_adjustment: -8.0,
    source_mixing_adjustment: -5.0,
    style_adjustment: -7.0,
};

/// Flat shift of the AI-likelihood for the active settings. Never positive.
pub fn settings_adjustment(config: &HumanizeConfig) -> f64 {
    let w = &WEIGHTS;
    let mut shift = match config.intensity {
        Intensity::Aggressive => w.aggressive_adjustment,
        Intensity::Medium => w.medium_adjustment,
        Intensity::Light => 0.0,
    };
    if config.enable_colloquialisms {
        shift += w.colloquial_adjustment;
    }
    if config.enable_syntax_perturbation {
        shift += w.perturbation_adjustment;
    }
    if config.enable_source_mixing {
        shift += w.source_mixing_adjustment;
    }
    if config.enable_style_variation {
        shift += w.style_adjustment;
    }
    shift
}

fn weighted_ai_likelihood(signals: &SignalScores) -> f64 {
    let w = &WEIGHTS;
    signals.length_uniformity * w.length_uniformity
        + signals.vocabulary_diversity * w.vocabulary_diversity
        + signals.paragraph_rhythm * w.paragraph_rhythm
        + signals.human_markers * w.human_markers
        + signals.perturbation_artifacts * w.perturbation_artifacts
}

/// Full breakdown behind one score. Safe on empty and single-sentence text.
pub fn score_text(text: &str, config: &HumanizeConfig) -> ScoreBreakdown {
    let lex = lexicon();
    let profile = TextProfile::new(text);
    let diagnostics = diagnostics(&profile, text, lex);

    let signals = SignalScores {
        length_uniformity: length_uniformity(&profile),
        vocabulary_diversity: vocabulary_diversity(&profile),
        paragraph_rhythm: paragraph_rhythm(&profile),
        human_markers: human_markers(diagnostics.human_marker_hits),
        perturbation_artifacts: perturbation_artifacts(diagnostics.artifact_hits),
    };

    let base_ai_likelihood = weighted_ai_likelihood(&signals);
    let adjustment = settings_adjustment(config);
    let ai_likelihood = clamp_score(base_ai_likelihood + adjustment);
    let score = 100.0 - ai_likelihood;

    ScoreBreakdown {
        score,
        band: band_for(score),
        base_ai_likelihood,
        settings_adjustment: adjustment,
        signals,
        diagnostics,
    }
}

/// Human-likeness in [5, 95]; higher reads more human.
pub fn score(text: &str, config: &HumanizeConfig) -> f64 {
    score_text(text, config).score
}
