// Lexicon Tables
// Process-wide read-only phrase pools, synonym maps and marker patterns

use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LexiconFile {
    language: String,
    connectors: Vec<String>,
    ai_connectors: Vec<String>,
    idioms: Vec<String>,
    personal_anecdotes: Vec<String>,
    local_references: Vec<String>,
    asides: Vec<String>,
    fillers: Vec<String>,
    academic_sources: Vec<String>,
    practical_sources: Vec<String>,
    dependent_clauses: Vec<String>,
    linking_clauses: Vec<String>,
    formal_to_informal: Vec<WordMapping>,
    rich_synonyms: Vec<WordMapping>,
    human_markers: Vec<String>,
    artifact_patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WordMapping {
    pub word: String,
    pub replacements: Vec<String>,
}

/// A word mapping with its whole-word, case-insensitive matcher.
#[derive(Debug)]
pub struct CompiledMapping {
    pub word: String,
    pub replacements: Vec<String>,
    pub matcher: Regex,
}

#[derive(Debug)]
pub struct Lexicon {
    pub language: String,
    pub connectors: Vec<String>,
    pub ai_connectors: Vec<String>,
    pub idioms: Vec<String>,
    pub personal_anecdotes: Vec<String>,
    pub local_references: Vec<String>,
    pub asides: Vec<String>,
    pub fillers: Vec<String>,
    pub academic_sources: Vec<String>,
    pub practical_sources: Vec<String>,
    pub dependent_clauses: Vec<String>,
    pub linking_clauses: Vec<String>,
    pub formal_to_informal: Vec<CompiledMapping>,
    pub rich_synonyms: Vec<CompiledMapping>,
    pub human_markers: Vec<Regex>,
    pub artifact_patterns: Vec<Regex>,
}

static LEXICON: OnceLock<Lexicon> = OnceLock::new();

/// The embedded Spanish lexicon, parsed once.
pub fn lexicon() -> &'static Lexicon {
    LEXICON.get_or_init(|| {
        let raw = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/lexicon_es.json"));
        let parsed: LexiconFile =
            serde_json::from_str(raw).expect("lexicon_es.json parse failed");
        Lexicon::from_file(parsed)
    })
}

fn compile_mappings(mappings: Vec<WordMapping>) -> Vec<CompiledMapping> {
    mappings
        .into_iter()
        .filter(|m| !m.word.trim().is_empty() && !m.replacements.is_empty())
        .map(|m| {
            let matcher = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(m.word.trim())))
                .expect("word mapping regex");
            CompiledMapping {
                word: m.word,
                replacements: m.replacements,
                matcher,
            }
        })
        .collect()
}

fn compile_patterns(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("lexicon pattern regex"))
        .collect()
}

impl Lexicon {
    fn from_file(file: LexiconFile) -> Self {
        let human_markers = compile_patterns(&file.human_markers);
        let artifact_patterns = compile_patterns(&file.artifact_patterns);
        Self {
            language: file.language,
            connectors: file.connectors,
            ai_connectors: file.ai_connectors,
            idioms: file.idioms,
            personal_anecdotes: file.personal_anecdotes,
            local_references: file.local_references,
            asides: file.asides,
            fillers: file.fillers,
            academic_sources: file.academic_sources,
            practical_sources: file.practical_sources,
            dependent_clauses: file.dependent_clauses,
            linking_clauses: file.linking_clauses,
            formal_to_informal: compile_mappings(file.formal_to_informal),
            rich_synonyms: compile_mappings(file.rich_synonyms),
            human_markers,
            artifact_patterns,
        }
    }

    /// True when `phrase` contains a connector from the AI-flavored denylist.
    pub fn is_ai_connector(&self, phrase: &str) -> bool {
        let lower = phrase.to_lowercase();
        self.ai_connectors.iter().any(|ac| lower.contains(ac.as_str()))
    }

    /// Number of marker pattern groups present in `text`.
    pub fn human_marker_hits(&self, text: &str) -> usize {
        self.human_markers.iter().filter(|re| re.is_match(text)).count()
    }

    pub fn artifact_hits(&self, text: &str) -> usize {
        self.artifact_patterns.iter().filter(|re| re.is_match(text)).count()
    }
}

/// Uniform draw from a pool; empty pools yield an empty string.
pub fn pick<'a, R: Rng + ?Sized>(rng: &mut R, pool: &'a [String]) -> &'a str {
    pool.choose(rng).map(String::as_str).unwrap_or("")
}
