// Transform Module
// Stateless text-rewrite stages, run by the pipeline in this order:
// - normalize: invisible characters and whitespace (text_processor)
// - lexical: whole-word synonym substitution
// - restructure: paragraph and sentence reordering with pinned ends
// - perturbation: round-trip-translation style pattern rewrites
// - colloquial: connectors, idioms, anecdotes and disfluencies
// - source_mixer: citation-like openers on interior paragraphs
// - style: sentence length, fragments and fronted clauses

pub mod lexical;
pub mod restructure;
pub mod perturbation;
pub mod colloquial;
pub mod source_mixer;
pub mod style;

use crate::models::{HumanizeConfig, StageKind};
use crate::services::text_processor::normalize_text;
use rand::RngCore;
use thiserror::Error;

pub use colloquial::{colloquialize, Colloquializer};
pub use lexical::{substitute_synonyms, LexicalSubstitutor};
pub use perturbation::{perturb, PerturbationRule, SyntaxPerturbation};
pub use restructure::{reorder, StructuralReorderer};
pub use source_mixer::{mix_sources, SourceMixer};
pub use style::{vary_style, StyleVarier};

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{stage:?} stage failed: {message}")]
pub struct StageError {
    pub stage: StageKind,
    pub message: String,
}

/// One text-to-text step of the pipeline.
pub trait TextStage: Send + Sync {
    fn kind(&self) -> StageKind;

    /// Whether the governing toggle lets this stage run.
    fn is_enabled(&self, _config: &HumanizeConfig) -> bool {
        true
    }

    fn apply(
        &self,
        text: &str,
        config: &HumanizeConfig,
        rng: &mut dyn RngCore,
    ) -> Result<String, StageError>;
}

pub struct Normalizer;

impl TextStage for Normalizer {
    fn kind(&self) -> StageKind {
        StageKind::Normalize
    }

    fn apply(
        &self,
        text: &str,
        _config: &HumanizeConfig,
        _rng: &mut dyn RngCore,
    ) -> Result<String, StageError> {
        Ok(normalize_text(text))
    }
}

/// The fixed stage order used by every run and every optimization attempt.
pub fn standard_stages() -> Vec<Box<dyn TextStage>> {
    vec![
        Box::new(Normalizer),
        Box::new(LexicalSubstitutor),
        Box::new(StructuralReorderer),
        Box::new(SyntaxPerturbation),
        Box::new(Colloquializer),
        Box::new(SourceMixer),
        Box::new(StyleVarier),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Intensity;

    #[test]
    fn test_standard_stage_order() {
        let kinds: Vec<StageKind> = standard_stages().iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                StageKind::Normalize,
                StageKind::LexicalSubstitution,
                StageKind::Restructure,
                StageKind::SyntaxPerturbation,
                StageKind::Colloquialize,
                StageKind::SourceMixing,
                StageKind::StyleVariation,
            ]
        );
    }

    #[test]
    fn test_toggles_gate_stages() {
        let config = HumanizeConfig::all_disabled(Intensity::Medium);
        let enabled: Vec<StageKind> = standard_stages()
            .iter()
            .filter(|s| s.is_enabled(&config))
            .map(|s| s.kind())
            .collect();
        assert_eq!(enabled, vec![StageKind::Normalize, StageKind::Restructure]);

        let full = HumanizeConfig {
            enable_source_mixing: true,
            ..HumanizeConfig::default()
        };
        assert!(standard_stages().iter().all(|s| s.is_enabled(&full)));
    }
}
