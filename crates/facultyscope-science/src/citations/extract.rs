use once_cell::sync::Lazy;
use regex::Regex;

use super::parser::Citation;
use crate::identifiers::Doi;

static QUOTED_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""(.*?)""#).expect("valid quoted title regex"));

/// Four-digit year, a closing token like `).` or `, 2020a.`, then the title
/// up to the next comma or period.
static YEAR_TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4}),*\s*\w*[),.]+\s*(.*?)[,.]").expect("valid year title regex")
});

static DOI_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"doi:\s+(\S+)").expect("valid doi marker regex"));

const QUOTE_VARIANTS: [char; 3] = ['"', '\u{201C}', '\u{201D}'];

/// Candidate title of one citation, or `None` when neither rule applies.
///
/// A quoted span wins when present; otherwise the text after the year is
/// taken. Callers still gate on [`has_min_words`].
pub fn extract_title(citation: &str) -> Option<String> {
    if citation.contains(QUOTE_VARIANTS) {
        let normalized = citation.replace(['\u{201C}', '\u{201D}'], "\"");
        if let Some(caps) = QUOTED_TITLE_RE.captures(&normalized) {
            let title = caps[1]
                .trim()
                .trim_end_matches([',', '.', ';', ':'])
                .trim_end();
            return non_empty(title);
        }
    }

    let caps = YEAR_TITLE_RE.captures(citation)?;
    non_empty(caps[2].trim())
}

fn non_empty(title: &str) -> Option<String> {
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

/// First `doi: <token>` in the citation.
pub fn extract_doi(citation: &str) -> Option<Doi> {
    DOI_MARKER_RE
        .captures(citation)
        .map(|caps| Doi::new(&caps[1]))
}

pub fn has_min_words(text: &str, at_least: usize) -> bool {
    text.split_whitespace().count() >= at_least
}

/// DOIs of all citations, in citation order.
pub fn doi_list(citations: &[Citation]) -> Vec<Doi> {
    citations
        .iter()
        .filter_map(|c| extract_doi(c.as_str()))
        .collect()
}

/// Titles that survive the minimum word count, in citation order.
pub fn candidate_titles(citations: &[Citation], min_words: usize) -> Vec<String> {
    citations
        .iter()
        .filter_map(|c| extract_title(c.as_str()))
        .filter(|title| has_min_words(title, min_words))
        .collect()
}
