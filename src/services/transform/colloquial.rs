// Colloquializer
// Injects connectors, idioms, anecdotes and (at aggressive intensity) disfluencies

use super::{StageError, TextStage};
use crate::models::{HumanizeConfig, Intensity, StageKind};
use crate::services::lexicon::{lexicon, pick, Lexicon};
use crate::services::text_processor::{
    join_paragraphs, join_sentences, lowercase_first, split_paragraphs, split_sentences,
};
use rand::{Rng, RngCore};

const CONNECTOR_PROB: f64 = 0.6;
const CONNECTOR_REDRAW_PROB: f64 = 0.6;
const SPLICE_PROB: f64 = 0.5;
const STUTTER_PROB: f64 = 0.4;
const FILLER_PROB: f64 = 0.2;
const STUTTER_MIN_WORDS: usize = 6;

fn paragraph_gate(intensity: Intensity) -> f64 {
    intensity.pick(0.35, 0.7, 1.0)
}

/// A connector that is not on the denylist, or a single redraw, or nothing.
fn draw_connector<'a, R: Rng + ?Sized>(lex: &'a Lexicon, rng: &mut R) -> Option<&'a str> {
    let connector = pick(rng, &lex.connectors);
    if connector.is_empty() {
        return None;
    }
    if !lex.is_ai_connector(connector) {
        return Some(connector);
    }
    if rng.gen_bool(CONNECTOR_REDRAW_PROB) {
        Some(pick(rng, &lex.connectors)).filter(|c| !c.is_empty())
    } else {
        None
    }
}

/// One idiom, anecdote or short aside sentence.
fn human_aside<R: Rng + ?Sized>(lex: &Lexicon, rng: &mut R) -> String {
    let roll: f64 = rng.gen();
    if roll < 0.4 {
        format!("Es como dicen, {}.", pick(rng, &lex.idioms))
    } else if roll < 0.8 {
        let local = pick(rng, &lex.local_references);
        let anecdote = pick(rng, &lex.personal_anecdotes);
        format!("Por ejemplo, {}, {}.", local, anecdote)
    } else {
        format!("Por ejemplo, {}", pick(rng, &lex.asides))
    }
}

/// Repeats one interior word of a random sentence. Returns false when nothing qualified.
fn duplicate_word<R: Rng + ?Sized>(sentences: &mut [String], rng: &mut R) -> bool {
    if sentences.is_empty() {
        return false;
    }
    let idx = rng.gen_range(0..sentences.len());
    let mut words: Vec<&str> = sentences[idx].split(' ').collect();
    if words.len() < STUTTER_MIN_WORDS {
        return false;
    }
    let at = rng.gen_range(1..words.len() - 1);
    if words[at - 1] == words[at] {
        return false;
    }
    words.insert(at, words[at]);
    let rebuilt = words.join(" ");
    sentences[idx] = rebuilt;
    true
}

pub fn colloquialize<R: Rng + ?Sized>(text: &str, config: &HumanizeConfig, rng: &mut R) -> String {
    let lex = lexicon();
    let paragraphs = split_paragraphs(text);
    let gate = paragraph_gate(config.intensity);
    let mut changed = false;
    let mut out: Vec<String> = Vec::with_capacity(paragraphs.len());

    for para in &paragraphs {
        let mut sentences: Vec<String> = split_sentences(para).into_iter().map(str::to_string).collect();
        if sentences.is_empty() || !rng.gen_bool(gate) {
            out.push(para.to_string());
            continue;
        }

        let mut touched = false;

        if config.connector_variety && rng.gen_bool(CONNECTOR_PROB) {
            if let Some(connector) = draw_connector(lex, rng) {
                sentences[0] = format!("{} {}", connector, lowercase_first(&sentences[0]));
                touched = true;
            }
        }

        if config.natural_flow && sentences.len() > 2 && rng.gen_bool(SPLICE_PROB) {
            let insert_at = sentences.len() / 2;
            sentences.insert(insert_at, human_aside(lex, rng));
            touched = true;
        }

        if config.intensity == Intensity::Aggressive {
            if rng.gen_bool(STUTTER_PROB) && duplicate_word(&mut sentences, rng) {
                touched = true;
            }
            if rng.gen_bool(FILLER_PROB) {
                let at = rng.gen_range(0..sentences.len());
                sentences[at] = format!("{} {}", pick(rng, &lex.fillers), sentences[at]);
                touched = true;
            }
        }

        if touched {
            out.push(join_sentences(&sentences));
            changed = true;
        } else {
            out.push(para.to_string());
        }
    }

    if !changed {
        return text.to_string();
    }
    join_paragraphs(&out)
}

pub struct Colloquializer;

impl TextStage for Colloquializer {
    fn kind(&self) -> StageKind {
        StageKind::Colloquialize
    }

    fn is_enabled(&self, config: &HumanizeConfig) -> bool {
        config.enable_colloquialisms
    }

    fn apply(
        &self,
        text: &str,
        config: &HumanizeConfig,
        rng: &mut dyn RngCore,
    ) -> Result<String, StageError> {
        Ok(colloquialize(text, config, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TEXT: &str = "El proyecto comenzó en marzo. Los equipos trabajaron juntos. Se revisaron los resultados.\n\n\
        La segunda fase fue más corta. Hubo varios ajustes menores. Todo terminó a tiempo.\n\n\
        El informe final se publicó en junio. Nadie presentó objeciones. La junta aprobó el cierre.";

    #[test]
    fn test_single_sentence_never_panics() {
        let config = HumanizeConfig {
            intensity: Intensity::Aggressive,
            ..HumanizeConfig::default()
        };
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = colloquialize("Hola.", &config, &mut rng);
            assert!(out.contains("Hola") || out.contains("hola"));
            assert!(!colloquialize("", &config, &mut rng).contains('\n'));
        }
    }

    #[test]
    fn test_sub_toggles_off_is_noop() {
        let config = HumanizeConfig {
            intensity: Intensity::Medium,
            connector_variety: false,
            natural_flow: false,
            ..HumanizeConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(colloquialize(TEXT, &config, &mut rng), TEXT);
    }

    #[test]
    fn test_connectors_reach_every_paragraph() {
        let config = HumanizeConfig {
            intensity: Intensity::Aggressive,
            natural_flow: false,
            ..HumanizeConfig::default()
        };
        let lex = lexicon();
        let mut first_hits = 0;
        for seed in 0..40 {
            let out = colloquialize(TEXT, &config, &mut StdRng::seed_from_u64(seed));
            let first = split_paragraphs(&out)[0];
            if lex.connectors.iter().any(|c| first.starts_with(c.as_str())) {
                first_hits += 1;
            }
        }
        assert!(first_hits > 5, "connector on paragraph 0 in only {} of 40 runs", first_hits);
    }

    #[test]
    fn test_aggressive_adds_human_material() {
        let config = HumanizeConfig {
            intensity: Intensity::Aggressive,
            ..HumanizeConfig::default()
        };
        let lex = lexicon();
        let marked = (0..30)
            .map(|seed| colloquialize(TEXT, &config, &mut StdRng::seed_from_u64(seed)))
            .filter(|out| lex.human_marker_hits(out) > 0)
            .count();
        assert!(marked > 15, "only {} of 30 runs carried markers", marked);
    }

    #[test]
    fn test_paragraph_count_preserved() {
        let config = HumanizeConfig {
            intensity: Intensity::Aggressive,
            ..HumanizeConfig::default()
        };
        for seed in 0..30 {
            let out = colloquialize(TEXT, &config, &mut StdRng::seed_from_u64(seed));
            assert_eq!(split_paragraphs(&out).len(), 3);
        }
    }

    #[test]
    fn test_duplicate_word_guards_short_sentences() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut short = vec!["Muy corta.".to_string()];
        assert!(!duplicate_word(&mut short, &mut rng));
        assert_eq!(short[0], "Muy corta.");

        let mut long = vec!["Esta frase tiene bastantes palabras para repetir una.".to_string()];
        if duplicate_word(&mut long, &mut rng) {
            assert_eq!(long[0].split(' ').count(), 9);
        }
    }
}
