use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use facultyscope_core::{AuthorId, OpenAlexConfig, WorkId};
use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, ScienceError};
use crate::http::RateLimitedClient;
use crate::identifiers::Doi;
use crate::sources::{AuthorSearch, ScholarlyApi, WorksQuery};

/// `null` and missing both decode to the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ─── Records ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SummaryStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub h_index: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub i10_index: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct YearCount {
    pub year: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub works_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cited_by_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Concept {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub level: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct InstitutionRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Author as returned by `/authors/{id}` and `/authors?search=`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AuthorRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(default)]
    pub orcid: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub works_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cited_by_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary_stats: SummaryStats,
    #[serde(default)]
    pub updated_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub counts_by_year: Vec<YearCount>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub x_concepts: Vec<Concept>,
    #[serde(default)]
    pub last_known_institution: Option<InstitutionRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_known_institutions: Vec<InstitutionRef>,
}

impl AuthorRecord {
    /// A malformed id is a decode failure, not a local error.
    pub fn author_id(&self) -> Result<AuthorId> {
        AuthorId::parse(&self.id).map_err(|e| ScienceError::Parse(e.to_string()))
    }

    /// Score of the first concept with this display name.
    pub fn concept_score(&self, concept_name: &str) -> Option<f64> {
        self.x_concepts
            .iter()
            .find(|c| c.display_name == concept_name)
            .map(|c| c.score)
    }

    pub fn institution_name(&self) -> Option<&str> {
        self.last_known_institution
            .iter()
            .chain(self.last_known_institutions.iter())
            .find_map(|inst| inst.display_name.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AuthorRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(default)]
    pub orcid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Authorship {
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: AuthorRef,
    #[serde(default, deserialize_with = "null_as_default")]
    pub institutions: Vec<InstitutionRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct VenueSource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct VenueLocation {
    #[serde(default)]
    pub source: Option<VenueSource>,
}

impl VenueLocation {
    /// Display name of the source when it is a journal.
    pub fn journal_name(&self) -> Option<&str> {
        let source = self.source.as_ref()?;
        if source.kind.as_deref() == Some("journal") {
            source.display_name.as_deref()
        } else {
            None
        }
    }
}

/// Work with only the fields the pipeline reads; abstracts, access detail,
/// SDG tags, grants and the rest of the payload are dropped on decode.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WorkRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub publication_year: Option<i32>,
    #[serde(default)]
    pub publication_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cited_by_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub locations: Vec<VenueLocation>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub authorships: Vec<Authorship>,
}

impl WorkRecord {
    pub fn work_id(&self) -> Option<WorkId> {
        WorkId::parse(&self.id).ok()
    }

    pub fn title_text(&self) -> &str {
        self.title
            .as_deref()
            .or(self.display_name.as_deref())
            .unwrap_or_default()
    }

    pub fn author_names(&self) -> Vec<&str> {
        self.authorships
            .iter()
            .map(|a| a.author.display_name.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PageMeta {
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u64,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WorksPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub meta: PageMeta,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<WorkRecord>,
}

#[derive(Debug, Deserialize, Default)]
struct AuthorsPage {
    #[serde(default, deserialize_with = "null_as_default")]
    results: Vec<AuthorRecord>,
}

// ─── Client ───────────────────────────────────────────────────────────────────

pub struct OpenAlexClient {
    client: RateLimitedClient,
    base_url: String,
    mailto: Option<String>,
}

impl OpenAlexClient {
    pub fn new(config: &OpenAlexConfig) -> Result<Self> {
        let client = RateLimitedClient::new(
            Duration::from_millis(config.min_interval_ms),
            Duration::from_secs(config.timeout_secs),
            &config.user_agent,
        )?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            mailto: config.mailto.clone(),
        })
    }

    /// Client pointed at an arbitrary base URL, without throttling.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let config = OpenAlexConfig {
            base_url: base_url.to_string(),
            min_interval_ms: 0,
            ..OpenAlexConfig::default()
        };
        Self::new(&config)
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let raw = format!("{}/{}", self.base_url, path);
        let mut url =
            Url::parse(&raw).map_err(|e| ScienceError::Parse(format!("invalid URL {raw}: {e}")))?;
        if !query.is_empty() || self.mailto.is_some() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
            if let Some(mailto) = &self.mailto {
                pairs.append_pair("mailto", mailto);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl ScholarlyApi for OpenAlexClient {
    async fn author(&self, key: &str) -> Result<AuthorRecord> {
        let url = self.url(&format!("authors/{}", key.trim()), &[])?;
        self.client.get_json(url.as_str()).await
    }

    async fn search_authors(&self, query: &AuthorSearch) -> Result<Vec<AuthorRecord>> {
        let filter = query.filter();
        let mut params = vec![("search", query.name.as_str())];
        if let Some(filter) = filter.as_deref() {
            params.push(("filter", filter));
        }
        params.push(("sort", "relevance_score:desc"));

        let url = self.url("authors", &params)?;
        let page: AuthorsPage = self.client.get_json(url.as_str()).await?;
        Ok(page.results)
    }

    async fn work_by_doi(&self, doi: &Doi) -> Result<WorkRecord> {
        let url = self.url(&format!("works/{}", doi.url()), &[])?;
        self.client.get_json(url.as_str()).await
    }

    async fn search_works(&self, query: &str) -> Result<Vec<WorkRecord>> {
        let url = self.url("works", &[("search", query)])?;
        let page: WorksPage = self.client.get_json(url.as_str()).await?;
        Ok(page.results)
    }

    async fn author_works(&self, query: &WorksQuery) -> Result<WorksPage> {
        let filter = format!("author.id:{}", query.author_id);
        let sort = query.sort.to_param();
        let per_page = query.per_page.to_string();
        let page = query.page.to_string();

        let mut params = vec![("filter", filter.as_str())];
        if let Some(sort) = sort.as_deref() {
            params.push(("sort", sort));
        }
        params.push(("per-page", per_page.as_str()));
        params.push(("page", page.as_str()));

        let url = self.url("works", &params)?;
        self.client.get_json(url.as_str()).await
    }
}
