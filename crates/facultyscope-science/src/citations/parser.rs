use std::fmt;

use serde::{Deserialize, Serialize};

/// Substrings that mark a chunk as page furniture rather than a citation.
const BOILERPLATE_MARKERS: [&str; 5] = [
    "<br/>",
    "<br>",
    "Highly Cited:",
    "Click",
    "Recent Publication:",
];

/// Emphasis tags removed verbatim from citation text.
const EMPHASIS_TOKENS: [&str; 4] = ["<b>", "</b>", "<i>", "</i>"];

/// One node of a directory page's publication list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fragment {
    Text(String),
    Break,
    /// Any non-break element, kept as its serialized HTML.
    Markup(String),
}

impl Fragment {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn markup(s: impl Into<String>) -> Self {
        Self::Markup(s.into())
    }

    /// Whitespace-only text between breaks does not interrupt a break run.
    fn interrupts_break_run(&self) -> bool {
        match self {
            Self::Text(t) => !t.trim().is_empty(),
            Self::Markup(_) => true,
            Self::Break => false,
        }
    }
}

/// Ordered fragments of the "journal articles" section of a profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCitationBlock {
    fragments: Vec<Fragment>,
}

impl RawCitationBlock {
    pub fn new(fragments: Vec<Fragment>) -> Self {
        Self { fragments }
    }

    pub fn push(&mut self, fragment: Fragment) {
        self.fragments.push(fragment);
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

impl From<Vec<Fragment>> for RawCitationBlock {
    fn from(fragments: Vec<Fragment>) -> Self {
        Self::new(fragments)
    }
}

/// A single cleaned citation string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Citation(String);

impl Citation {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Splits a fragment block into citations.
///
/// Two consecutive breaks close a citation. A third break in the same run
/// restarts the count at one, so a run of four closes an extra, empty chunk
/// that the cleaning step then drops.
pub fn parse_citations(block: &RawCitationBlock) -> Vec<Citation> {
    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut breaks = 0u32;

    for fragment in block.fragments() {
        if fragment.interrupts_break_run() {
            breaks = 0;
        }

        match fragment {
            Fragment::Text(text) | Fragment::Markup(text) => buffer.push_str(text),
            Fragment::Break => {
                breaks += 1;
                if breaks == 2 {
                    chunks.push(std::mem::take(&mut buffer));
                } else if breaks > 2 {
                    breaks = 1;
                }
            }
        }
    }

    if !buffer.is_empty() {
        chunks.push(buffer);
    }

    chunks
        .into_iter()
        .filter(|chunk| !BOILERPLATE_MARKERS.iter().any(|m| chunk.contains(m)))
        .map(|chunk| strip_emphasis(&chunk))
        .filter(|chunk| !chunk.is_empty())
        .map(Citation)
        .collect()
}

fn strip_emphasis(chunk: &str) -> String {
    let mut cleaned = chunk.to_string();
    for token in EMPHASIS_TOKENS {
        cleaned = cleaned.replace(token, "");
    }
    cleaned.trim().to_string()
}
