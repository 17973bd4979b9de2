// Likeness Signals
// Individual heuristic readings on a 0-100 AI-likelihood scale (high = machine-like)

use crate::models::StyleDiagnostics;
use crate::services::lexicon::Lexicon;
use crate::services::text_processor::{
    mean_and_std, split_paragraphs, split_sentences, word_count, word_tokens,
};
use std::collections::HashMap;

use super::thresholds::NEUTRAL_SCORE;

/// Relative sentences-per-paragraph progression of typical human prose.
const IDEAL_RHYTHM: [f64; 5] = [0.8, 1.0, 1.2, 1.1, 0.9];
/// Rhythm readings for deviation below 0.3, below 0.6, and above.
const RHYTHM_BANDS: [f64; 3] = [30.0, 40.0, 55.0];
/// Readings for zero, one, two and three or more marker groups.
const MARKER_BANDS: [f64; 4] = [90.0, 60.0, 40.0, 20.0];
/// Words this long or shorter are ignored for vocabulary diversity.
const SHORT_WORD_MAX_CHARS: usize = 3;

/// Segmentation of one text, computed once and shared by every signal.
#[derive(Debug, Clone)]
pub struct TextProfile<'a> {
    pub sentences: Vec<&'a str>,
    pub paragraph_sentence_counts: Vec<usize>,
    pub sentence_lengths: Vec<f64>,
    pub word_count: usize,
    /// Lowercase tokens longer than three characters.
    pub qualifying_words: Vec<String>,
}

impl<'a> TextProfile<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut sentences = Vec::new();
        let mut paragraph_sentence_counts = Vec::new();
        for para in split_paragraphs(text) {
            let para_sentences = split_sentences(para);
            paragraph_sentence_counts.push(para_sentences.len());
            sentences.extend(para_sentences);
        }

        let sentence_lengths = sentences.iter().map(|s| word_count(s) as f64).collect();
        let qualifying_words = word_tokens(text)
            .into_iter()
            .filter(|w| w.chars().count() > SHORT_WORD_MAX_CHARS)
            .collect();

        Self {
            sentences,
            paragraph_sentence_counts,
            sentence_lengths,
            word_count: word_count(text),
            qualifying_words,
        }
    }
}

/// Low variance of sentence word counts reads as machine-like. A lone sentence has
/// zero variance.
pub fn length_uniformity(profile: &TextProfile) -> f64 {
    if profile.sentence_lengths.is_empty() {
        return NEUTRAL_SCORE;
    }
    let (_, std_dev) = mean_and_std(&profile.sentence_lengths);
    let variance = std_dev * std_dev;
    if variance < 30.0 {
        80.0
    } else if variance < 60.0 {
        50.0
    } else {
        20.0
    }
}

pub fn lexical_diversity(profile: &TextProfile) -> Option<f64> {
    if profile.qualifying_words.is_empty() {
        return None;
    }
    let mut unique: Vec<&str> = profile.qualifying_words.iter().map(String::as_str).collect();
    unique.sort_unstable();
    unique.dedup();
    Some(unique.len() as f64 / profile.qualifying_words.len() as f64)
}

/// Few distinct long words reads as machine-like.
pub fn vocabulary_diversity(profile: &TextProfile) -> f64 {
    match lexical_diversity(profile) {
        None => NEUTRAL_SCORE,
        Some(ratio) if ratio < 0.3 => 85.0,
        Some(ratio) if ratio < 0.5 => 60.0,
        Some(_) => 30.0,
    }
}

/// Mean absolute gap between the normalized sentences-per-paragraph sequence and
/// `IDEAL_RHYTHM`. Positions past the curve compare against 1.0.
pub fn rhythm_deviation(counts: &[usize]) -> Option<f64> {
    let first = *counts.first()?;
    let base = if first == 0 { 1.0 } else { first as f64 };
    let total: f64 = counts
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            let ideal = IDEAL_RHYTHM.get(i).copied().unwrap_or(1.0);
            (ideal - count as f64 / base).abs()
        })
        .sum();
    Some(total / counts.len() as f64)
}

/// Paragraph structure far from the human rhythm reads as machine-like.
///
/// The band spread stays below the first human-marker step, so one spliced-in
/// marker sentence can never cost more through rhythm than it earns as a marker.
pub fn paragraph_rhythm(profile: &TextProfile) -> f64 {
    match rhythm_deviation(&profile.paragraph_sentence_counts) {
        None => NEUTRAL_SCORE,
        Some(diff) if diff < 0.3 => RHYTHM_BANDS[0],
        Some(diff) if diff < 0.6 => RHYTHM_BANDS[1],
        Some(_) => RHYTHM_BANDS[2],
    }
}

/// Each matched marker group pulls the reading toward human.
pub fn human_markers(hits: usize) -> f64 {
    MARKER_BANDS[hits.min(MARKER_BANDS.len() - 1)]
}

/// Perturbation fingerprints count as human irregularity.
pub fn perturbation_artifacts(hits: usize) -> f64 {
    if hits > 0 {
        30.0
    } else {
        70.0
    }
}

/// Denylisted connector occurrences per 100 sentences.
fn ai_connector_rate(profile: &TextProfile, lex: &Lexicon) -> f64 {
    if profile.sentences.is_empty() {
        return 0.0;
    }
    let hits: usize = profile
        .sentences
        .iter()
        .map(|sentence| {
            let padded = format!(" {} ", word_tokens(sentence).join(" "));
            lex.ai_connectors
                .iter()
                .map(|ac| padded.matches(&format!(" {} ", ac)).count())
                .sum::<usize>()
        })
        .sum();
    hits as f64 / profile.sentences.len() as f64 * 100.0
}

/// Share of sentences opening with the most common first word, 0-100.
fn opener_repetition(profile: &TextProfile) -> f64 {
    if profile.sentences.is_empty() {
        return 0.0;
    }
    let mut counts: HashMap<String, usize> = HashMap::new();
    for sentence in &profile.sentences {
        if let Some(first) = word_tokens(sentence).into_iter().next() {
            *counts.entry(first).or_insert(0) += 1;
        }
    }
    let top = counts.values().copied().max().unwrap_or(0);
    top as f64 / profile.sentences.len() as f64 * 100.0
}

pub fn diagnostics(profile: &TextProfile, text: &str, lex: &Lexicon) -> StyleDiagnostics {
    let (mean, std_dev) = mean_and_std(&profile.sentence_lengths);
    StyleDiagnostics {
        sentence_count: profile.sentences.len(),
        word_count: profile.word_count,
        mean_sentence_len: mean,
        sentence_len_std_dev: std_dev,
        lexical_diversity: lexical_diversity(profile).unwrap_or(0.0),
        ai_connector_rate: ai_connector_rate(profile, lex),
        opener_repetition: opener_repetition(profile),
        human_marker_hits: lex.human_marker_hits(text),
        artifact_hits: lex.artifact_hits(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::lexicon::lexicon;

    #[test]
    fn test_empty_text_reads_neutral() {
        let profile = TextProfile::new("");
        assert_eq!(length_uniformity(&profile), NEUTRAL_SCORE);
        assert_eq!(vocabulary_diversity(&profile), NEUTRAL_SCORE);
        assert_eq!(paragraph_rhythm(&profile), NEUTRAL_SCORE);
        let diag = diagnostics(&profile, "", lexicon());
        assert_eq!(diag.sentence_count, 0);
        assert_eq!(diag.ai_connector_rate, 0.0);
    }

    #[test]
    fn test_uniform_lengths_look_machine_like() {
        let uniform = TextProfile::new("Uno dos tres cuatro. Cinco seis siete ocho. Nueve diez once doce.");
        assert_eq!(length_uniformity(&uniform), 80.0);

        let varied = TextProfile::new(
            "Sí. Esta otra frase es bastante más larga que la anterior y sigue y sigue sin parar nunca jamás. No.",
        );
        assert_eq!(length_uniformity(&varied), 20.0);
    }

    #[test]
    fn test_vocabulary_diversity_bands() {
        let repetitive = TextProfile::new("casa casa casa casa casa casa casa perro");
        assert_eq!(vocabulary_diversity(&repetitive), 85.0);
        let rich = TextProfile::new("montaña río bosque ciudad");
        assert_eq!(vocabulary_diversity(&rich), 30.0);
        let short_words = TextProfile::new("el de la y");
        assert_eq!(vocabulary_diversity(&short_words), NEUTRAL_SCORE);
    }

    #[test]
    fn test_rhythm_deviation() {
        assert_eq!(rhythm_deviation(&[]), None);
        let diff = rhythm_deviation(&[5, 5]).unwrap();
        assert!((diff - 0.1).abs() < 1e-9);
        assert!(rhythm_deviation(&[1, 5, 9]).unwrap() > 0.6);
        assert!(rhythm_deviation(&[0, 1]).is_some());
    }

    #[test]
    fn test_single_sentence_has_zero_variance() {
        assert_eq!(length_uniformity(&TextProfile::new("Una sola frase aquí.")), 80.0);
    }

    #[test]
    fn test_rhythm_spread_is_below_first_marker_step() {
        let rhythm_spread = RHYTHM_BANDS[2] - RHYTHM_BANDS[0];
        let first_marker_step = MARKER_BANDS[0] - MARKER_BANDS[1];
        assert!(rhythm_spread < first_marker_step);

        let flat = TextProfile::new("Uno dos tres cuatro.\n\nCinco seis siete ocho.");
        let spliced = TextProfile::new("Uno dos tres cuatro.\n\nCinco seis siete ocho. Recuerdo que era así.");
        assert_eq!(paragraph_rhythm(&flat), RHYTHM_BANDS[0]);
        assert!(paragraph_rhythm(&spliced) > paragraph_rhythm(&flat));
    }

    #[test]
    fn test_marker_and_artifact_readings() {
        assert!(human_markers(0) > human_markers(1));
        assert!(human_markers(2) > human_markers(5));
        assert!(perturbation_artifacts(1) < perturbation_artifacts(0));
    }

    #[test]
    fn test_connector_rate_and_openers() {
        let text = "Además, todo salió bien. Además hubo sorpresas. Por lo tanto, seguimos.";
        let profile = TextProfile::new(text);
        let diag = diagnostics(&profile, text, lexicon());
        assert_eq!(diag.sentence_count, 3);
        assert!((diag.ai_connector_rate - 100.0).abs() < 1e-9);
        assert!((diag.opener_repetition - 200.0 / 3.0).abs() < 1e-9);
    }
}
