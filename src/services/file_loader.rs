// File Loader
// Extracts plain UTF-8 text from .txt/.md, .docx and .pdf inputs

use regex::Regex;
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::info;

const DOCX_BODY: &str = "word/document.xml";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),
    #[error("docx parse failed: {0}")]
    Docx(String),
    #[error("pdf extraction failed: {0}")]
    Pdf(String),
    #[error("no text found in input")]
    Empty,
}

fn docx_paragraph_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<w:p[ >].*?</w:p>|<w:p/>").expect("docx paragraph regex"))
}

fn docx_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<w:t(?: [^>]*)?>(.*?)</w:t>|<w:tab/>|<w:br/>").expect("docx run regex")
    })
}

/// Plain text, BOM stripped, invalid sequences replaced.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Paragraph text of a Word document, one blank line between paragraphs.
pub fn extract_docx(bytes: &[u8]) -> Result<String, LoaderError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| LoaderError::Docx(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY)
        .map_err(|e| LoaderError::Docx(e.to_string()))?
        .read_to_string(&mut xml)?;

    let paragraphs: Vec<String> = docx_paragraph_re()
        .find_iter(&xml)
        .map(|p| {
            docx_run_re()
                .captures_iter(p.as_str())
                .map(|caps| match caps.get(1) {
                    Some(text) => unescape_xml(text.as_str()),
                    None if caps[0].starts_with("<w:tab") => "\t".to_string(),
                    None => "\n".to_string(),
                })
                .collect::<String>()
        })
        .filter(|p| !p.trim().is_empty())
        .collect();

    Ok(paragraphs.join("\n\n"))
}

pub fn extract_pdf(bytes: &[u8]) -> Result<String, LoaderError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| LoaderError::Pdf(e.to_string()))
}

/// Dispatches on the file extension of `file_name`.
pub fn extract_text(file_name: &str, bytes: &[u8]) -> Result<String, LoaderError> {
    let ext = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let text = match ext.as_str() {
        "txt" | "md" | "markdown" | "text" | "" => decode_text(bytes),
        "docx" => extract_docx(bytes)?,
        "pdf" => extract_pdf(bytes)?,
        other => return Err(LoaderError::UnsupportedFormat(other.to_string())),
    };

    if text.trim().is_empty() {
        return Err(LoaderError::Empty);
    }
    info!("[LOADER] {}: {} chars extracted", file_name, text.chars().count());
    Ok(text)
}

pub fn load_file(path: &Path) -> Result<String, LoaderError> {
    let bytes = fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    extract_text(&file_name, &bytes)
}
