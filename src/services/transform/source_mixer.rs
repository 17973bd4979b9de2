// Source Mixer
// Prefixes interior paragraphs with citation-like or experience-like openers

use super::{StageError, TextStage};
use crate::models::{HumanizeConfig, Intensity, StageKind};
use crate::services::lexicon::{lexicon, pick};
use crate::services::text_processor::{join_paragraphs, lowercase_first, split_paragraphs};
use rand::{Rng, RngCore};

const MIN_PARAGRAPHS: usize = 3;

fn paragraph_gate(intensity: Intensity) -> f64 {
    intensity.pick(0.4, 0.6, 0.8)
}

pub fn mix_sources<R: Rng + ?Sized>(text: &str, config: &HumanizeConfig, rng: &mut R) -> String {
    if !config.enable_source_mixing {
        return text.to_string();
    }

    let paragraphs = split_paragraphs(text);
    if paragraphs.len() < MIN_PARAGRAPHS {
        return text.to_string();
    }

    let lex = lexicon();
    let gate = paragraph_gate(config.intensity);
    let last = paragraphs.len() - 1;
    let mut changed = false;

    let mixed: Vec<String> = paragraphs
        .iter()
        .enumerate()
        .map(|(idx, para)| {
            if idx == 0 || idx == last || !rng.gen_bool(gate) {
                return para.to_string();
            }
            let pool = if rng.gen_bool(0.5) {
                &lex.academic_sources
            } else {
                &lex.practical_sources
            };
            let phrase = pick(&mut *rng, pool);
            if phrase.is_empty() {
                return para.to_string();
            }
            changed = true;
            format!("{}, {}", phrase, lowercase_first(para))
        })
        .collect();

    if !changed {
        return text.to_string();
    }
    join_paragraphs(&mixed)
}

pub struct SourceMixer;

impl TextStage for SourceMixer {
    fn kind(&self) -> StageKind {
        StageKind::SourceMixing
    }

    fn is_enabled(&self, config: &HumanizeConfig) -> bool {
        config.enable_source_mixing
    }

    fn apply(
        &self,
        text: &str,
        config: &HumanizeConfig,
        rng: &mut dyn RngCore,
    ) -> Result<String, StageError> {
        Ok(mix_sources(text, config, rng))
    }
}
