use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::{CoreError, Result};
use crate::models::FacultyRecord;

/// Raw CSV row as exported by the directory crawler.
#[derive(Debug, Deserialize)]
struct FacultyRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Email", default)]
    email: Option<String>,
    #[serde(default)]
    img_link: Option<String>,
    #[serde(default)]
    dr_ntu_link: Option<String>,
    #[serde(default)]
    orcid_link: Option<String>,
    #[serde(default)]
    dblp_link: Option<String>,
    #[serde(default)]
    google_scholar_link: Option<String>,
    #[serde(default)]
    website_link: Option<String>,
}

impl From<FacultyRow> for FacultyRecord {
    fn from(row: FacultyRow) -> Self {
        Self {
            name: row.name.trim().to_string(),
            email: non_blank(row.email),
            image_url: non_blank(row.img_link),
            orcid_url: non_blank(row.orcid_link),
            profile_url: non_blank(row.dr_ntu_link),
            bibliography_url: non_blank(row.dblp_link),
            scholar_url: non_blank(row.google_scholar_link),
            websites: row
                .website_link
                .as_deref()
                .map(parse_link_list)
                .unwrap_or_default(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("nan"))
}

/// Parses a list literal such as `['https://a.org', 'https://b.org']`.
fn parse_link_list(raw: &str) -> Vec<String> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|item| item.trim().trim_matches(|c| c == '\'' || c == '"').trim())
        .filter(|item| !item.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameOrder {
    #[default]
    Ascending,
    Descending,
}

/// Read-only tabular store of faculty records, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct FacultyStore {
    records: Vec<FacultyRecord>,
}

impl FacultyStore {
    pub fn new(records: Vec<FacultyRecord>) -> Self {
        Self { records }
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let mut records = Vec::new();
        for row in csv_reader.deserialize::<FacultyRow>() {
            let record = FacultyRecord::from(row?);
            if !record.name.is_empty() {
                records.push(record);
            }
        }
        Ok(Self { records })
    }

    pub fn all(&self) -> &[FacultyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exact name match first, then a case-insensitive one.
    pub fn find_by_name(&self, name: &str) -> Result<&FacultyRecord> {
        let wanted = name.trim();
        self.records
            .iter()
            .find(|r| r.name == wanted)
            .or_else(|| {
                self.records
                    .iter()
                    .find(|r| r.name.eq_ignore_ascii_case(wanted))
            })
            .ok_or_else(|| CoreError::FacultyNotFound(wanted.to_string()))
    }

    /// Case-insensitive substring filter on the name.
    pub fn search(&self, term: &str) -> Vec<&FacultyRecord> {
        let needle = term.trim().to_lowercase();
        self.records
            .iter()
            .filter(|r| r.name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn sort_by_name(records: &mut [&FacultyRecord], order: NameOrder) {
        records.sort_by(|a, b| match order {
            NameOrder::Ascending => a.name.cmp(&b.name),
            NameOrder::Descending => b.name.cmp(&a.name),
        });
    }

    pub fn page_count(total: usize, page_size: usize) -> usize {
        if page_size == 0 {
            return 0;
        }
        total.div_ceil(page_size)
    }

    /// Zero-based page; an out-of-range index is clamped to the last page.
    pub fn page<'a, T>(items: &'a [T], page_index: usize, page_size: usize) -> &'a [T] {
        let pages = Self::page_count(items.len(), page_size);
        if pages == 0 {
            return &[];
        }
        let current = page_index.min(pages - 1);
        let start = current * page_size;
        let end = (start + page_size).min(items.len());
        &items[start..end]
    }
}
