// Style Variation
// Evens out machine-regular sentence lengths: splits long sentences, extends short ones,
// adds impact fragments, fronted clauses and plainer vocabulary

use super::lexical::match_case;
use super::{StageError, TextStage};
use crate::models::{HumanizeConfig, Intensity, StageKind};
use crate::services::lexicon::{lexicon, pick, Lexicon};
use crate::services::text_processor::{
    ends_with_terminal, join_paragraphs, join_sentences, lowercase_first, mean_and_std,
    split_paragraphs, split_sentences, strip_terminal, uppercase_first, word_count,
};
use rand::{Rng, RngCore};
use regex::Captures;

/// Words above the mean before a sentence counts as long.
const SPLIT_MARGIN: f64 = 8.0;
/// Words below the mean before a sentence counts as short.
const LENGTHEN_MARGIN: f64 = 6.0;
/// Minimum standard deviation of sentence length for split/lengthen to apply.
const MIN_SPREAD: f64 = 4.0;
const SPLIT_PROB: f64 = 0.6;
const LENGTHEN_PROB: f64 = 0.4;
const SIMPLIFY_PROB: f64 = 0.15;
const FRAGMENT_MIN_WORDS: usize = 8;
const MIN_SPLIT_WORDS: usize = 4;

fn fragment_prob(intensity: Intensity) -> f64 {
    intensity.pick(0.05, 0.1, 0.2)
}

fn fronted_clause_prob(intensity: Intensity) -> f64 {
    intensity.pick(0.1, 0.2, 0.3)
}

/// Breaks `sentence` at `percent` of its words. Both halves end in terminal punctuation
/// and the second is capitalized.
fn break_at(sentence: &str, percent: usize) -> Option<String> {
    let words: Vec<&str> = sentence.split(' ').filter(|w| !w.is_empty()).collect();
    if words.len() < MIN_SPLIT_WORDS {
        return None;
    }
    let cut = words.len() * percent / 100;
    if cut == 0 || cut >= words.len() {
        return None;
    }

    let head_joined = words[..cut].join(" ");
    let head = strip_terminal(&head_joined);
    if head.is_empty() {
        return None;
    }
    let mut tail = uppercase_first(&words[cut..].join(" "));
    if !ends_with_terminal(&tail) {
        tail = format!("{}.", strip_terminal(&tail));
    }
    Some(format!("{}. {}", head, tail))
}

pub(crate) fn split_in_two(sentence: &str) -> Option<String> {
    break_at(sentence, 50)
}

/// Short "impact" sentence cut off near the 70% word mark.
pub(crate) fn fragment(sentence: &str) -> Option<String> {
    if word_count(sentence) < FRAGMENT_MIN_WORDS {
        return None;
    }
    break_at(sentence, 70)
}

/// Appends a trailing clause. Questions and exclamations keep their mark; plain
/// statements trail off with an ellipsis.
fn lengthen(sentence: &str, clause: &str) -> String {
    let clause = strip_terminal(clause);
    if clause.is_empty() {
        return sentence.to_string();
    }
    let close = match sentence.trim_end().chars().last() {
        Some('?') => "?",
        Some('!') => "!",
        _ => "...",
    };
    format!("{}, {}{}", strip_terminal(sentence), clause, close)
}

fn front_clause(clause: &str, sentence: &str) -> String {
    if clause.is_empty() {
        return sentence.to_string();
    }
    format!("{} {}", clause, lowercase_first(sentence))
}

/// Picks the first formal mapping present in `sentence` and replaces every occurrence
/// of it, drawing a plain counterpart per occurrence.
pub(crate) fn simplify<R: Rng + ?Sized>(sentence: &str, lex: &Lexicon, rng: &mut R) -> String {
    let Some(mapping) = lex
        .formal_to_informal
        .iter()
        .find(|m| m.matcher.is_match(sentence))
    else {
        return sentence.to_string();
    };

    mapping
        .matcher
        .replace_all(sentence, |caps: &Captures| {
            match_case(&caps[0], pick(&mut *rng, &mapping.replacements))
        })
        .into_owned()
}

pub fn vary_style<R: Rng + ?Sized>(text: &str, config: &HumanizeConfig, rng: &mut R) -> String {
    let lex = lexicon();
    let raw_paragraphs = split_paragraphs(text);
    let paragraphs: Vec<Vec<&str>> = raw_paragraphs.iter().map(|p| split_sentences(p)).collect();

    let lengths: Vec<f64> = paragraphs
        .iter()
        .flatten()
        .map(|s| word_count(s) as f64)
        .collect();
    let (mean, spread) = mean_and_std(&lengths);
    let vary_length = config.sentence_length_variation && spread > MIN_SPREAD;

    let mut changed = false;
    let mut out: Vec<String> = Vec::with_capacity(paragraphs.len());

    for (raw, sentences) in raw_paragraphs.iter().zip(&paragraphs) {
        let mut touched = false;
        let mut rewritten: Vec<String> = Vec::with_capacity(sentences.len());

        for (idx, sentence) in sentences.iter().enumerate() {
            let mut processed = sentence.to_string();
            let words = word_count(sentence) as f64;

            if vary_length {
                if words > mean + SPLIT_MARGIN && rng.gen_bool(SPLIT_PROB) {
                    if let Some(split) = split_in_two(&processed) {
                        processed = split;
                    }
                } else if words < mean - LENGTHEN_MARGIN && rng.gen_bool(LENGTHEN_PROB) {
                    processed = lengthen(&processed, pick(rng, &lex.linking_clauses));
                }
            }

            if config.readability_focus && rng.gen_bool(fragment_prob(config.intensity)) {
                if let Some(short) = fragment(&processed) {
                    processed = short;
                }
            }

            if config.tone_adjustment && idx > 0 && rng.gen_bool(fronted_clause_prob(config.intensity)) {
                processed = front_clause(pick(rng, &lex.dependent_clauses), &processed);
            }

            if config.readability_focus && rng.gen_bool(SIMPLIFY_PROB) {
                processed = simplify(&processed, lex, rng);
            }

            touched |= processed != *sentence;
            rewritten.push(processed);
        }

        if config.sort_sentences_by_length && rewritten.len() > 1 {
            // One direction per paragraph keeps the comparator consistent.
            let before = rewritten.clone();
            if rng.gen_bool(0.5) {
                rewritten.sort_by_key(|s| word_count(s));
            } else {
                rewritten.sort_by(|a, b| word_count(b).cmp(&word_count(a)));
            }
            touched |= rewritten != before;
        }

        if touched {
            changed = true;
            out.push(join_sentences(&rewritten));
        } else {
            out.push(raw.to_string());
        }
    }

    if !changed {
        return text.to_string();
    }
    join_paragraphs(&out)
}

pub struct StyleVarier;

impl TextStage for StyleVarier {
    fn kind(&self) -> StageKind {
        StageKind::StyleVariation
    }

    fn is_enabled(&self, config: &HumanizeConfig) -> bool {
        config.enable_style_variation
    }

    fn apply(
        &self,
        text: &str,
        config: &HumanizeConfig,
        rng: &mut dyn RngCore,
    ) -> Result<String, StageError> {
        Ok(vary_style(text, config, rng))
    }
}
