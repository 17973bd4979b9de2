// Text Processing Service
// Normalization and paragraph/sentence/word segmentation shared by all stages

use regex::Regex;
use std::sync::OnceLock;

fn invisible_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[\u{200B}-\u{200D}\u{2060}\u{FEFF}\u{00AD}]").expect("invisible regex")
    })
}

fn unicode_space_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[\u{00A0}\u{1680}\u{2000}-\u{200A}\u{202F}\u{205F}\u{3000}]")
            .expect("unicode space regex")
    })
}

fn horizontal_ws_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t\x0B\x0C]+").expect("horizontal whitespace regex"))
}

fn blank_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("blank run regex"))
}

fn space_before_punct_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" +([,.!?;:]+)").expect("space before punctuation regex"))
}

fn space_after_opening_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([¿¡]) +").expect("space after opening mark regex"))
}

fn paragraph_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").expect("paragraph regex"))
}

fn sentence_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"[.!?…]+["'»”)\]]*\s+"#).expect("sentence break regex")
    })
}

fn non_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\W+").expect("non-word regex"))
}

/// Strip invisible characters and collapse whitespace.
///
/// Idempotent: running it on its own output changes nothing.
pub fn normalize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let s = invisible_re().replace_all(text, "");
    let s = s
        .replace("\r\n", "\n")
        .replace(['\r', '\u{2028}', '\u{2029}'], "\n");
    let s = unicode_space_re().replace_all(&s, " ");
    let s = horizontal_ws_re().replace_all(&s, " ");
    let s = space_before_punct_re().replace_all(&s, "$1");
    let s = space_after_opening_re().replace_all(&s, "$1");

    // Strip each line so whitespace-only lines become empty
    let s = s.lines().map(str::trim).collect::<Vec<_>>().join("\n");
    let s = blank_run_re().replace_all(&s, "\n\n");

    s.trim().to_string()
}

/// Paragraphs separated by a blank line, trimmed, empties dropped.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    paragraph_break_re()
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Sentences end at terminal punctuation followed by whitespace.
/// Text with no such boundary comes back as a single sentence.
pub fn split_sentences(paragraph: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut cursor = 0;

    for m in sentence_break_re().find_iter(paragraph) {
        let end = m.start() + m.as_str().trim_end().len();
        let sentence = paragraph[cursor..end].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        cursor = m.end();
    }

    let rest = paragraph[cursor..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }

    sentences
}

pub fn join_sentences<S: AsRef<str>>(sentences: &[S]) -> String {
    sentences
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn join_paragraphs<S: AsRef<str>>(paragraphs: &[S]) -> String {
    paragraphs
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Whitespace-delimited word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Lowercase word tokens split on non-word characters.
pub fn word_tokens(text: &str) -> Vec<String> {
    non_word_re()
        .split(&text.to_lowercase())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn uppercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn ends_with_terminal(s: &str) -> bool {
    s.trim_end()
        .chars()
        .last()
        .map_or(false, |c| matches!(c, '.' | '!' | '?' | '…'))
}

/// Drops trailing sentence punctuation and dangling commas/semicolons.
pub fn strip_terminal(s: &str) -> &str {
    s.trim_end()
        .trim_end_matches(|c: char| matches!(c, '.' | '!' | '?' | '…' | ',' | ';' | ':'))
        .trim_end()
}

/// Mean and population standard deviation.
pub fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_invisible_and_spaces() {
        let input = "Hola\u{200B} mundo\u{00A0}\u{00A0}bonito\u{FEFF}.";
        assert_eq!(normalize_text(input), "Hola mundo bonito.");
    }

    #[test]
    fn test_normalize_collapses_blank_lines() {
        let input = "Uno.\r\n\r\n\r\n\r\nDos.\n   \n\t\nTres.";
        assert_eq!(normalize_text(input), "Uno.\n\nDos.\n\nTres.");
    }

    #[test]
    fn test_normalize_punctuation_spacing() {
        assert_eq!(normalize_text("¿ Qué tal ?  Bien , gracias ."), "¿Qué tal? Bien, gracias.");
    }

    #[test]
    fn test_normalize_empty_and_idempotent() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text(" \n\t "), "");
        let once = normalize_text("  a  ,b\u{2028}\u{2028}\u{2028}c ¡ d !  ");
        assert_eq!(normalize_text(&once), once);
    }

    #[test]
    fn test_split_paragraphs() {
        let text = "Primer párrafo.\n\nSegundo párrafo.\n \nTercero.";
        assert_eq!(split_paragraphs(text), vec!["Primer párrafo.", "Segundo párrafo.", "Tercero."]);
        assert!(split_paragraphs("").is_empty());
    }

    #[test]
    fn test_split_sentences() {
        let para = "Primera frase. ¿Segunda? ¡Tercera!  Cuarta sin punto";
        assert_eq!(
            split_sentences(para),
            vec!["Primera frase.", "¿Segunda?", "¡Tercera!", "Cuarta sin punto"]
        );
    }

    #[test]
    fn test_split_sentences_unsegmentable_text() {
        assert_eq!(split_sentences("这是第一句。这是第二句"), vec!["这是第一句。这是第二句"]);
        assert_eq!(split_sentences("3.14 es pi"), vec!["3.14 es pi"]);
    }

    #[test]
    fn test_case_helpers() {
        assert_eq!(lowercase_first("Él dijo"), "él dijo");
        assert_eq!(uppercase_first("ábaco"), "Ábaco");
        assert_eq!(lowercase_first(""), "");
        assert_eq!(strip_terminal("Fin..."), "Fin");
        assert!(ends_with_terminal("Hecho."));
        assert!(!ends_with_terminal("Hecho,"));
    }

    #[test]
    fn test_word_tokens() {
        assert_eq!(word_tokens("Hola, ¿Mundo?"), vec!["hola", "mundo"]);
        assert_eq!(word_count("  uno dos\ntres "), 3);
    }

    #[test]
    fn test_mean_and_std() {
        let (mean, std) = mean_and_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((mean - 5.0).abs() < 1e-9);
        assert!((std - 2.0).abs() < 1e-9);
        assert_eq!(mean_and_std(&[]), (0.0, 0.0));
    }
}
