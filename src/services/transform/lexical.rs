// Lexical Substitution
// Replaces common words with a random richer synonym, whole words only

use super::{StageError, TextStage};
use crate::models::{HumanizeConfig, StageKind};
use crate::services::lexicon::{lexicon, pick};
use crate::services::text_processor::uppercase_first;
use rand::{Rng, RngCore};
use regex::Captures;

/// Carry the matched word's capitalization over to its replacement.
pub(crate) fn match_case(original: &str, replacement: &str) -> String {
    let mut letters = original.chars().filter(|c| c.is_alphabetic());
    let first_upper = letters.next().map_or(false, char::is_uppercase);
    let all_upper = first_upper && original.chars().count() > 1 && letters.all(char::is_uppercase);

    if all_upper {
        replacement.to_uppercase()
    } else if first_upper {
        uppercase_first(replacement)
    } else {
        replacement.to_string()
    }
}

pub fn substitute_synonyms<R: Rng + ?Sized>(text: &str, rng: &mut R) -> String {
    let mut result = text.to_string();

    for mapping in &lexicon().rich_synonyms {
        if !mapping.matcher.is_match(&result) {
            continue;
        }
        result = mapping
            .matcher
            .replace_all(&result, |caps: &Captures| {
                let chosen = pick(&mut *rng, &mapping.replacements);
                match_case(&caps[0], chosen)
            })
            .into_owned();
    }

    result
}

pub struct LexicalSubstitutor;

impl TextStage for LexicalSubstitutor {
    fn kind(&self) -> StageKind {
        StageKind::LexicalSubstitution
    }

    fn is_enabled(&self, config: &HumanizeConfig) -> bool {
        config.lexical_richness
    }

    fn apply(
        &self,
        text: &str,
        _config: &HumanizeConfig,
        rng: &mut dyn RngCore,
    ) -> Result<String, StageError> {
        Ok(substitute_synonyms(text, rng))
    }
}
