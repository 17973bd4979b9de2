// Redacta Data Models
// Settings, trace records and pipeline results shared by every service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============ Intensity ============

/// Ordinal strength applied to every randomized stage effect.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    #[serde(alias = "standard", alias = "suave")]
    Light,
    #[default]
    #[serde(alias = "deep", alias = "normal", alias = "profundo")]
    Medium,
    #[serde(alias = "extreme", alias = "fuerte")]
    Aggressive,
}

impl Intensity {
    pub fn from_str(val: &str) -> Self {
        match val.trim().to_lowercase().as_str() {
            "light" | "standard" | "suave" => Self::Light,
            "aggressive" | "extreme" | "fuerte" => Self::Aggressive,
            _ => Self::Medium,
        }
    }

    /// One level up, saturating at `Aggressive`.
    pub fn escalate(self) -> Self {
        match self {
            Self::Light => Self::Medium,
            Self::Medium | Self::Aggressive => Self::Aggressive,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Medium => "medium",
            Self::Aggressive => "aggressive",
        }
    }

    /// Picks the value matching this level from a light/medium/aggressive triple.
    pub fn pick<T: Copy>(self, light: T, medium: T, aggressive: T) -> T {
        match self {
            Self::Light => light,
            Self::Medium => medium,
            Self::Aggressive => aggressive,
        }
    }
}

// ============ Configuration ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanizeConfig {
    #[serde(default)]
    pub intensity: Intensity,
    #[serde(default = "default_true")]
    pub enable_colloquialisms: bool,
    #[serde(default = "default_true")]
    pub enable_syntax_perturbation: bool,
    #[serde(default)]
    pub enable_source_mixing: bool,
    #[serde(default = "default_true")]
    pub enable_auto_optimize: bool,
    #[serde(default = "default_true")]
    pub enable_style_variation: bool,
    #[serde(default = "default_true")]
    pub lexical_richness: bool,
    #[serde(default = "default_true")]
    pub connector_variety: bool,
    #[serde(default = "default_true")]
    pub natural_flow: bool,
    #[serde(default = "default_true")]
    pub sentence_length_variation: bool,
    #[serde(default = "default_true")]
    pub tone_adjustment: bool,
    #[serde(default = "default_true")]
    pub readability_focus: bool,
    /// Re-sorts sentences inside each paragraph by length. Off unless asked for.
    #[serde(default)]
    pub sort_sentences_by_length: bool,
}

impl Default for HumanizeConfig {
    fn default() -> Self {
        Self {
            intensity: Intensity::Medium,
            enable_colloquialisms: true,
            enable_syntax_perturbation: true,
            enable_source_mixing: false,
            enable_auto_optimize: true,
            enable_style_variation: true,
            lexical_richness: true,
            connector_variety: true,
            natural_flow: true,
            sentence_length_variation: true,
            tone_adjustment: true,
            readability_focus: true,
            sort_sentences_by_length: false,
        }
    }
}

fn default_true() -> bool { true }

/// Optimization attempt from which the rewrite stages are forced on.
pub const FORCE_STAGES_FROM_ATTEMPT: usize = 3;

impl HumanizeConfig {
    /// Every stage and sub-behavior off; only normalization and reordering run.
    pub fn all_disabled(intensity: Intensity) -> Self {
        Self {
            intensity,
            enable_colloquialisms: false,
            enable_syntax_perturbation: false,
            enable_source_mixing: false,
            enable_auto_optimize: false,
            enable_style_variation: false,
            lexical_richness: false,
            connector_variety: false,
            natural_flow: false,
            sentence_length_variation: false,
            tone_adjustment: false,
            readability_focus: false,
            sort_sentences_by_length: false,
        }
    }

    /// Settings for optimization attempt `attempt` (1-based), derived from `self`.
    ///
    /// Intensity climbs one level per attempt. From `FORCE_STAGES_FROM_ATTEMPT` on, the
    /// colloquializer, perturbation and style stages are switched on regardless of `self`.
    pub fn escalated(&self, attempt: usize) -> Self {
        let mut derived = self.clone();
        for _ in 0..attempt {
            derived.intensity = derived.intensity.escalate();
        }
        if attempt >= FORCE_STAGES_FROM_ATTEMPT {
            derived.enable_colloquialisms = true;
            derived.enable_syntax_perturbation = true;
            derived.enable_style_variation = true;
        }
        derived
    }
}

// ============ Processing Trace ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Normalize,
    LexicalSubstitution,
    Restructure,
    SyntaxPerturbation,
    Colloquialize,
    SourceMixing,
    StyleVariation,
}

impl StageKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normalize => "Normalize format",
            Self::LexicalSubstitution => "Lexical substitution",
            Self::Restructure => "Structural reordering",
            Self::SyntaxPerturbation => "Translation simulation",
            Self::Colloquialize => "Human elements",
            Self::SourceMixing => "Source mixing",
            Self::StyleVariation => "Style variation",
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StepKind {
    Stage(StageKind),
    Scoring,
    OptimizationAttempt(usize),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Done,
    Failed,
    Cancelled,
}

impl StepStatus {
    pub fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStep {
    pub name: String,
    pub kind: StepKind,
    pub status: StepStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

// ============ Scoring ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    LikelyHuman,
    Borderline,
    LikelyAi,
}

/// Per-signal AI-likelihood readings (0-100, high = machine-like) behind one score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalScores {
    pub length_uniformity: f64,
    pub vocabulary_diversity: f64,
    pub paragraph_rhythm: f64,
    pub human_markers: f64,
    pub perturbation_artifacts: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleDiagnostics {
    pub sentence_count: usize,
    pub word_count: usize,
    pub mean_sentence_len: f64,
    pub sentence_len_std_dev: f64,
    pub lexical_diversity: f64,
    /// Denylisted connector words per 100 sentences.
    pub ai_connector_rate: f64,
    /// Share (0-100) of sentences opening with the most frequent first word.
    pub opener_repetition: f64,
    pub human_marker_hits: usize,
    pub artifact_hits: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    /// Human-likeness in [5, 95].
    pub score: f64,
    pub band: ScoreBand,
    /// Weighted AI-likelihood before settings adjustments.
    pub base_ai_likelihood: f64,
    pub settings_adjustment: f64,
    pub signals: SignalScores,
    pub diagnostics: StyleDiagnostics,
}

// ============ Pipeline Output ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutput {
    pub run_id: Uuid,
    pub output_text: String,
    pub score: f64,
    pub breakdown: Option<ScoreBreakdown>,
    pub trace: Vec<ProcessingStep>,
    pub optimization_attempts: usize,
    pub accepted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intensity_aliases() {
        let parsed: Intensity = serde_json::from_str("\"fuerte\"").unwrap();
        assert_eq!(parsed, Intensity::Aggressive);
        let parsed: Intensity = serde_json::from_str("\"deep\"").unwrap();
        assert_eq!(parsed, Intensity::Medium);
        assert_eq!(Intensity::from_str("suave"), Intensity::Light);
        assert_eq!(serde_json::to_string(&Intensity::Light).unwrap(), "\"light\"");
    }

    #[test]
    fn test_intensity_escalate_saturates() {
        assert_eq!(Intensity::Light.escalate(), Intensity::Medium);
        assert_eq!(Intensity::Medium.escalate(), Intensity::Aggressive);
        assert_eq!(Intensity::Aggressive.escalate(), Intensity::Aggressive);
        assert!(Intensity::Light < Intensity::Aggressive);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: HumanizeConfig = serde_json::from_str(r#"{"intensity":"light"}"#).unwrap();
        assert_eq!(config.intensity, Intensity::Light);
        assert!(config.enable_colloquialisms);
        assert!(!config.enable_source_mixing);
        assert!(!config.sort_sentences_by_length);
    }

    #[test]
    fn test_escalated_does_not_touch_original() {
        let original = HumanizeConfig {
            enable_colloquialisms: false,
            ..HumanizeConfig::all_disabled(Intensity::Light)
        };
        let snapshot = original.clone();

        let first = original.escalated(1);
        assert_eq!(first.intensity, Intensity::Medium);
        assert!(!first.enable_colloquialisms);

        let third = original.escalated(3);
        assert_eq!(third.intensity, Intensity::Aggressive);
        assert!(third.enable_colloquialisms);
        assert!(third.enable_syntax_perturbation);
        assert!(third.enable_style_variation);

        assert_eq!(original, snapshot);
    }

    #[test]
    fn test_step_kind_serialization() {
        let json = serde_json::to_string(&StepKind::OptimizationAttempt(2)).unwrap();
        assert_eq!(json, r#"{"type":"optimization_attempt","value":2}"#);
    }
}
