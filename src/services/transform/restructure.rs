// Structural Reordering
// Shuffles interior paragraphs and interior sentences; first and last stay pinned

use super::{StageError, TextStage};
use crate::models::{HumanizeConfig, Intensity, StageKind};
use crate::services::text_processor::{join_paragraphs, join_sentences, split_paragraphs, split_sentences};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

/// Units at or below this count are passed through untouched.
const MIN_UNITS_TO_REORDER: usize = 3;

/// Pairwise swaps applied to the interior sentences, as a multiple of their count.
fn swap_factor(intensity: Intensity) -> f64 {
    intensity.pick(0.5, 1.0, 2.0)
}

/// Uniform shuffle of the interior of `units`. Aggressive intensity also reverses the
/// shuffled interior, which keeps the permutation uniform.
fn shuffle_interior<T, R: Rng + ?Sized>(units: &mut [T], intensity: Intensity, rng: &mut R) {
    if units.len() <= MIN_UNITS_TO_REORDER {
        return;
    }
    let last = units.len() - 1;
    let interior = &mut units[1..last];
    interior.shuffle(rng);
    if intensity == Intensity::Aggressive {
        interior.reverse();
    }
}

/// Random pairwise swaps among the interior of `units`.
fn swap_interior<T, R: Rng + ?Sized>(units: &mut [T], intensity: Intensity, rng: &mut R) {
    if units.len() <= MIN_UNITS_TO_REORDER {
        return;
    }
    let last = units.len() - 1;
    let interior = &mut units[1..last];
    let swaps = ((interior.len() as f64) * swap_factor(intensity)).ceil() as usize;
    for _ in 0..swaps {
        let a = rng.gen_range(0..interior.len());
        let b = rng.gen_range(0..interior.len());
        interior.swap(a, b);
    }
}

pub fn reorder<R: Rng + ?Sized>(text: &str, intensity: Intensity, rng: &mut R) -> String {
    let mut paragraphs: Vec<String> = split_paragraphs(text).into_iter().map(str::to_string).collect();
    let mut changed = false;

    if paragraphs.len() > MIN_UNITS_TO_REORDER {
        shuffle_interior(&mut paragraphs, intensity, rng);
        changed = true;
    }

    for para in paragraphs.iter_mut() {
        let rebuilt = {
            let mut sentences = split_sentences(para.as_str());
            if sentences.len() <= MIN_UNITS_TO_REORDER {
                continue;
            }
            swap_interior(&mut sentences, intensity, rng);
            join_sentences(&sentences)
        };
        *para = rebuilt;
        changed = true;
    }

    if !changed {
        return text.to_string();
    }
    join_paragraphs(&paragraphs)
}

pub struct StructuralReorderer;

impl TextStage for StructuralReorderer {
    fn kind(&self) -> StageKind {
        StageKind::Restructure
    }

    fn apply(
        &self,
        text: &str,
        config: &HumanizeConfig,
        rng: &mut dyn RngCore,
    ) -> Result<String, StageError> {
        Ok(reorder(text, config.intensity, rng))
    }
}
