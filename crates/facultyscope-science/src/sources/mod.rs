use std::fmt;

use async_trait::async_trait;
use facultyscope_core::AuthorId;

use crate::error::Result;
use crate::identifiers::Doi;

pub mod openalex;

pub use openalex::{
    AuthorRecord, Authorship, Concept, InstitutionRef, OpenAlexClient, VenueLocation, WorkRecord,
    WorksPage, YearCount,
};

/// Author search by name, optionally narrowed by institution and concept.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorSearch {
    pub name: String,
    pub institution_id: Option<String>,
    pub concept_id: Option<String>,
}

impl AuthorSearch {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            institution_id: None,
            concept_id: None,
        }
    }

    pub fn at_institution(mut self, institution_id: impl Into<String>) -> Self {
        self.institution_id = Some(institution_id.into());
        self
    }

    pub fn in_concept(mut self, concept_id: impl Into<String>) -> Self {
        self.concept_id = Some(concept_id.into());
        self
    }

    /// Comma-joined filter expression, institution first.
    pub fn filter(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(inst) = &self.institution_id {
            parts.push(format!("last_known_institution.id:{inst}"));
        }
        if let Some(concept) = &self.concept_id {
            parts.push(format!("x_concepts.id:{concept}"));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(","))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("asc"),
            Self::Desc => f.write_str("desc"),
        }
    }
}

/// Server-side sort: keys in priority order, one direction for all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkSort {
    pub keys: Vec<String>,
    pub direction: SortDirection,
}

impl WorkSort {
    pub fn new<I, S>(keys: I, direction: SortDirection) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            direction,
        }
    }

    pub fn newest_first() -> Self {
        Self::new(["publication_date"], SortDirection::Desc)
    }

    pub fn to_param(&self) -> Option<String> {
        if self.keys.is_empty() {
            return None;
        }
        Some(
            self.keys
                .iter()
                .map(|key| format!("{key}:{}", self.direction))
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}

/// One page of an author's works.
#[derive(Debug, Clone, PartialEq)]
pub struct WorksQuery {
    pub author_id: AuthorId,
    pub sort: WorkSort,
    pub per_page: u32,
    pub page: u32,
}

/// The bibliographic API as consumed by the resolver and the aggregator.
///
/// Every failure comes back as an `Err`; a non-2xx answer is
/// [`ScienceError::Api`](crate::error::ScienceError::Api).
#[async_trait]
pub trait ScholarlyApi: Send + Sync {
    /// Author by external key or by a full ORCID URL.
    async fn author(&self, key: &str) -> Result<AuthorRecord>;

    /// Relevance-ranked author search.
    async fn search_authors(&self, query: &AuthorSearch) -> Result<Vec<AuthorRecord>>;

    async fn work_by_doi(&self, doi: &Doi) -> Result<WorkRecord>;

    /// Full-text work search.
    async fn search_works(&self, query: &str) -> Result<Vec<WorkRecord>>;

    async fn author_works(&self, query: &WorksQuery) -> Result<WorksPage>;
}
