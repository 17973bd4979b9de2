// Syntax Perturbation
// Imitates round-trip translation artifacts with a small catalogue of pattern rewrites

use super::{StageError, TextStage};
use crate::models::{HumanizeConfig, Intensity, StageKind};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PerturbationRule {
    /// "a b c" -> "c a b"
    WordRotation,
    /// "A de B" -> "B A"
    GenitiveInversion,
    /// "A y B" -> "A e B"
    ConjunctionY,
    /// "A o B" -> "A u B"
    ConjunctionO,
    /// "A, B" -> "B, A"
    CommaInversion,
    /// "A que B" -> "B el cual A"
    RelativeClause,
    /// "un A B" -> "un B y A"
    ArticleSplit,
}

impl PerturbationRule {
    pub const ALL: [Self; 7] = [
        Self::WordRotation,
        Self::GenitiveInversion,
        Self::ConjunctionY,
        Self::ConjunctionO,
        Self::CommaInversion,
        Self::RelativeClause,
        Self::ArticleSplit,
    ];

    fn pattern(self) -> &'static str {
        match self {
            Self::WordRotation => r"\b(\w+) (\w+) (\w+)\b",
            Self::GenitiveInversion => r"\b(\w+) de (\w+)\b",
            Self::ConjunctionY => r"\b(\w+) y (\w+)\b",
            Self::ConjunctionO => r"\b(\w+) o (\w+)\b",
            Self::CommaInversion => r"\b(\w+), (\w+)\b",
            Self::RelativeClause => r"\b(\w+) que (\w+)\b",
            Self::ArticleSplit => r"\bun (\w+) (\w+)\b",
        }
    }

    fn template(self) -> &'static str {
        match self {
            Self::WordRotation => "${3} ${1} ${2}",
            Self::GenitiveInversion => "${2} ${1}",
            Self::ConjunctionY => "${1} e ${2}",
            Self::ConjunctionO => "${1} u ${2}",
            Self::CommaInversion => "${2}, ${1}",
            Self::RelativeClause => "${2} el cual ${1}",
            Self::ArticleSplit => "un ${2} y ${1}",
        }
    }

    fn regex(self) -> &'static Regex {
        static TABLE: OnceLock<Vec<Regex>> = OnceLock::new();
        let table = TABLE.get_or_init(|| {
            Self::ALL
                .iter()
                .map(|rule| Regex::new(rule.pattern()).expect("perturbation regex"))
                .collect()
        });
        &table[self as usize]
    }
}

/// Rewrites one randomly chosen occurrence of `rule`; no match means no change.
pub fn apply_rule<R: Rng + ?Sized>(text: &str, rule: PerturbationRule, rng: &mut R) -> String {
    let matches: Vec<_> = rule.regex().captures_iter(text).collect();
    if matches.is_empty() {
        return text.to_string();
    }

    let caps = &matches[rng.gen_range(0..matches.len())];
    let Some(whole) = caps.get(0) else {
        return text.to_string();
    };

    let mut replacement = String::new();
    caps.expand(rule.template(), &mut replacement);

    let mut out = String::with_capacity(text.len() + 8);
    out.push_str(&text[..whole.start()]);
    out.push_str(&replacement);
    out.push_str(&text[whole.end()..]);
    out
}

pub fn rewrite_count(intensity: Intensity) -> usize {
    intensity.pick(1, 3, 5)
}

pub fn perturb<R: Rng + ?Sized>(text: &str, intensity: Intensity, rng: &mut R) -> String {
    let mut result = text.to_string();
    for _ in 0..rewrite_count(intensity) {
        let Some(&rule) = PerturbationRule::ALL.choose(rng) else {
            break;
        };
        result = apply_rule(&result, rule, rng);
    }
    result
}

pub struct SyntaxPerturbation;

impl TextStage for SyntaxPerturbation {
    fn kind(&self) -> StageKind {
        StageKind::SyntaxPerturbation
    }

    fn is_enabled(&self, config: &HumanizeConfig) -> bool {
        config.enable_syntax_perturbation
    }

    fn apply(
        &self,
        text: &str,
        config: &HumanizeConfig,
        rng: &mut dyn RngCore,
    ) -> Result<String, StageError> {
        Ok(perturb(text, config.intensity, rng))
    }
}
