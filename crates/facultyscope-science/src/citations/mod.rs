//! Directory citation blocks: splitting into citations, then pulling titles
//! and DOIs out of each one.

pub mod extract;
pub mod parser;

pub use extract::{candidate_titles, doi_list, extract_doi, extract_title, has_min_words};
pub use parser::{Citation, Fragment, RawCitationBlock, parse_citations};
