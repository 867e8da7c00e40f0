//! Statistics over a resolved author: summary metrics, paged work lists,
//! collaborators and publication venues.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use facultyscope_core::{AggregatorConfig, AuthorId, WorkId};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::sources::{AuthorRecord, ScholarlyApi, WorkRecord, WorkSort, WorksQuery, YearCount};

/// Largest `per-page` the works endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Concept tag kept on an author summary.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Tag {
    pub name: String,
    pub level: u32,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuthorStats {
    pub author_id: AuthorId,
    pub display_name: String,
    pub orcid: Option<String>,
    pub h_index: u32,
    pub i10_index: u32,
    pub works_count: u32,
    pub cited_by_count: u32,
    pub last_updated: Option<NaiveDateTime>,
    /// Oldest year first.
    pub counts_by_year: Vec<YearCount>,
    pub tags: Vec<Tag>,
    pub institution: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CollaboratorAggregate {
    pub name: String,
    pub author_id: AuthorId,
    pub orcid: Option<String>,
    pub institution: Option<String>,
    pub work_ids: Vec<WorkId>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VenueCount {
    pub name: String,
    pub count: usize,
}

fn parse_updated(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl AuthorStats {
    fn from_record(record: AuthorRecord, config: &AggregatorConfig) -> Result<Self> {
        let author_id = record.author_id()?;
        let institution = record.institution_name().map(str::to_string);
        let last_updated = record.updated_date.as_deref().and_then(parse_updated);

        let mut counts_by_year = record.counts_by_year;
        counts_by_year.sort_by_key(|c| c.year);

        let tags = record
            .x_concepts
            .into_iter()
            .filter(|c| c.score > config.tag_min_score && c.level >= config.tag_min_level)
            .map(|c| Tag {
                name: c.display_name,
                level: c.level,
                score: c.score,
            })
            .collect();

        Ok(Self {
            author_id,
            display_name: record.display_name,
            orcid: record.orcid,
            h_index: record.summary_stats.h_index,
            i10_index: record.summary_stats.i10_index,
            works_count: record.works_count,
            cited_by_count: record.cited_by_count,
            last_updated,
            counts_by_year,
            tags,
            institution,
        })
    }
}

pub struct MetadataAggregator {
    api: Arc<dyn ScholarlyApi>,
    config: AggregatorConfig,
}

impl MetadataAggregator {
    pub fn new(api: Arc<dyn ScholarlyApi>, config: AggregatorConfig) -> Self {
        Self { api, config }
    }

    /// Summary metrics for one author. Lookup failures are returned as-is.
    pub async fn fetch_stats(&self, author_id: &AuthorId) -> Result<AuthorStats> {
        let record = self.api.author(author_id.as_str()).await?;
        AuthorStats::from_record(record, &self.config)
    }

    /// Up to `count` works, sorted server-side by `sort`.
    ///
    /// A failed page ends pagination; whatever was collected before it is
    /// returned.
    pub async fn fetch_works(
        &self,
        author_id: &AuthorId,
        count: usize,
        sort: &WorkSort,
    ) -> Vec<WorkRecord> {
        let mut works = Vec::new();
        if count == 0 {
            return works;
        }

        let ceiling = u32::try_from(count).unwrap_or(u32::MAX).min(MAX_PAGE_SIZE);
        let per_page = self.config.page_size.clamp(1, ceiling);
        let mut page = 1;

        while works.len() < count {
            let query = WorksQuery {
                author_id: author_id.clone(),
                sort: sort.clone(),
                per_page,
                page,
            };
            let batch = match self.api.author_works(&query).await {
                Ok(batch) => batch,
                Err(e) => {
                    warn!(
                        %author_id,
                        page,
                        collected = works.len(),
                        error = %e,
                        "works pagination stopped"
                    );
                    break;
                }
            };
            if batch.results.is_empty() {
                break;
            }

            let available = batch.meta.count;
            works.extend(batch.results);
            debug!(%author_id, page, collected = works.len(), available, "fetched works page");
            if works.len() as u64 >= available {
                break;
            }
            page += 1;
        }

        works.truncate(count);
        works
    }

    /// Co-authors over the most recent works window.
    pub async fn collaborators(&self, author_id: &AuthorId) -> Vec<CollaboratorAggregate> {
        let works = self
            .fetch_works(author_id, self.config.collaborator_window, &WorkSort::newest_first())
            .await;
        compute_collaborators(author_id, &works)
    }

    /// Journal counts over the `count` most recent works.
    pub async fn venues(&self, author_id: &AuthorId, count: usize) -> Vec<VenueCount> {
        let works = self
            .fetch_works(author_id, count, &WorkSort::newest_first())
            .await;
        compute_venue_frequency(&works)
    }
}

/// Aggregates the first authorship of each work, skipping the faculty
/// member's own entry. Sorted by count descending, then name.
pub fn compute_collaborators(
    faculty_id: &AuthorId,
    works: &[WorkRecord],
) -> Vec<CollaboratorAggregate> {
    let mut index: HashMap<AuthorId, usize> = HashMap::new();
    let mut aggregates: Vec<CollaboratorAggregate> = Vec::new();

    for work in works {
        let Some(first) = work.authorships.first() else {
            continue;
        };
        let Some(author_id) = first.author.id.as_deref().and_then(|id| AuthorId::parse(id).ok())
        else {
            continue;
        };
        if &author_id == faculty_id {
            continue;
        }
        let Some(work_id) = work.work_id() else {
            continue;
        };

        let slot = *index.entry(author_id.clone()).or_insert_with(|| {
            aggregates.push(CollaboratorAggregate {
                name: first.author.display_name.clone(),
                author_id,
                orcid: first.author.orcid.clone(),
                institution: first
                    .institutions
                    .iter()
                    .find_map(|inst| inst.display_name.clone()),
                work_ids: Vec::new(),
                count: 0,
            });
            aggregates.len() - 1
        });

        let entry = &mut aggregates[slot];
        entry.work_ids.push(work_id);
        entry.count = entry.work_ids.len();
    }

    aggregates.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    aggregates
}

/// Occurrences of journal-type locations across all works, sorted by count
/// descending, then name.
pub fn compute_venue_frequency(works: &[WorkRecord]) -> Vec<VenueCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for work in works {
        for journal in work.locations.iter().filter_map(|loc| loc.journal_name()) {
            *counts.entry(journal).or_default() += 1;
        }
    }

    let mut table = counts
        .into_iter()
        .map(|(name, count)| VenueCount {
            name: name.to_string(),
            count,
        })
        .collect::<Vec<_>>();
    table.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    table
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use mockito::Server;
    use serde_json::json;

    use super::*;
    use crate::error::ScienceError;
    use crate::identifiers::Doi;
    use crate::sources::openalex::{AuthorRef, PageMeta, VenueSource};
    use crate::sources::{
        AuthorSearch, Authorship, InstitutionRef, OpenAlexClient, VenueLocation, WorksPage,
    };

    fn id(key: &str) -> AuthorId {
        AuthorId::parse(key).unwrap()
    }

    fn journal_work(journals: &[&str]) -> WorkRecord {
        WorkRecord {
            locations: journals
                .iter()
                .map(|name| VenueLocation {
                    source: Some(VenueSource {
                        id: None,
                        display_name: Some(name.to_string()),
                        kind: Some("journal".to_string()),
                    }),
                })
                .collect(),
            ..Default::default()
        }
    }

    fn coauthored(work_id: &str, first: (&str, &str), rest: &[(&str, &str)]) -> WorkRecord {
        let authorship = |(aid, name): (&str, &str)| Authorship {
            author: AuthorRef {
                id: Some(format!("https://openalex.org/{aid}")),
                display_name: name.to_string(),
                orcid: None,
            },
            institutions: Vec::new(),
        };
        WorkRecord {
            id: format!("https://openalex.org/{work_id}"),
            authorships: std::iter::once(first)
                .chain(rest.iter().copied())
                .map(authorship)
                .collect(),
            ..Default::default()
        }
    }

    /// Serves `total` synthetic works; optionally fails from a given page on.
    struct PagedApi {
        total: usize,
        fail_from_page: Option<u32>,
        queries: Mutex<Vec<WorksQuery>>,
    }

    impl PagedApi {
        fn new(total: usize) -> Self {
            Self {
                total,
                fail_from_page: None,
                queries: Mutex::new(Vec::new()),
            }
        }

        fn pages_requested(&self) -> Vec<(u32, u32)> {
            self.queries
                .lock()
                .unwrap()
                .iter()
                .map(|q| (q.page, q.per_page))
                .collect()
        }
    }

    #[async_trait]
    impl ScholarlyApi for PagedApi {
        async fn author(&self, key: &str) -> Result<AuthorRecord> {
            Err(ScienceError::InvalidInput(key.to_string()))
        }

        async fn search_authors(&self, _query: &AuthorSearch) -> Result<Vec<AuthorRecord>> {
            Ok(Vec::new())
        }

        async fn work_by_doi(&self, doi: &Doi) -> Result<WorkRecord> {
            Err(ScienceError::InvalidInput(doi.to_string()))
        }

        async fn search_works(&self, _query: &str) -> Result<Vec<WorkRecord>> {
            Ok(Vec::new())
        }

        async fn author_works(&self, query: &WorksQuery) -> Result<WorksPage> {
            self.queries.lock().unwrap().push(query.clone());
            if self.fail_from_page.is_some_and(|p| query.page >= p) {
                return Err(ScienceError::Api {
                    url: "works".to_string(),
                    status: 503,
                    reason: "Service Unavailable".to_string(),
                });
            }

            let per_page = query.per_page as usize;
            let start = (query.page as usize - 1) * per_page;
            let end = (start + per_page).min(self.total);
            let results = (start..end)
                .map(|n| WorkRecord {
                    id: format!("https://openalex.org/W{n}"),
                    ..Default::default()
                })
                .collect();
            Ok(WorksPage {
                meta: PageMeta {
                    count: self.total as u64,
                    page: Some(query.page),
                    per_page: Some(query.per_page),
                },
                results,
            })
        }
    }

    fn aggregator(api: &Arc<PagedApi>) -> MetadataAggregator {
        MetadataAggregator::new(api.clone(), AggregatorConfig::default())
    }

    #[test]
    fn venue_frequency_counts_journals_only() {
        let mut conference = journal_work(&[]);
        conference.locations.push(VenueLocation {
            source: Some(VenueSource {
                id: None,
                display_name: Some("NeurIPS".to_string()),
                kind: Some("conference".to_string()),
            }),
        });
        conference.locations.push(VenueLocation { source: None });

        let works = vec![
            journal_work(&["A"]),
            journal_work(&["A"]),
            journal_work(&["B"]),
            conference,
        ];
        let table = compute_venue_frequency(&works);
        assert_eq!(
            table,
            vec![
                VenueCount {
                    name: "A".to_string(),
                    count: 2,
                },
                VenueCount {
                    name: "B".to_string(),
                    count: 1,
                },
            ]
        );
    }

    #[test]
    fn venue_ties_sort_by_name() {
        let works = vec![journal_work(&["Zeta"]), journal_work(&["Alpha"])];
        let names = compute_venue_frequency(&works)
            .into_iter()
            .map(|v| (v.name, v.count))
            .collect::<Vec<_>>();
        assert_eq!(names, vec![("Alpha".to_string(), 1), ("Zeta".to_string(), 1)]);
    }

    #[test]
    fn venue_listed_twice_on_one_work_counts_each_location() {
        let works = vec![journal_work(&["Zeta", "Zeta"]), journal_work(&["Alpha"])];
        let table = compute_venue_frequency(&works);
        assert_eq!(
            table,
            vec![
                VenueCount {
                    name: "Zeta".to_string(),
                    count: 2,
                },
                VenueCount {
                    name: "Alpha".to_string(),
                    count: 1,
                },
            ]
        );
    }

    #[test]
    fn collaborators_use_first_authorship_only() {
        let me = id("A1");
        let works = vec![
            coauthored("W1", ("A2", "Bo Li"), &[("A1", "Jane Tan")]),
            coauthored("W2", ("A3", "Ana Cruz"), &[("A2", "Bo Li")]),
            coauthored("W3", ("A2", "Bo Li"), &[]),
            coauthored("W4", ("A1", "Jane Tan"), &[("A4", "Kai Ng")]),
            coauthored("W5", ("A5", "Aaron Ho"), &[]),
        ];

        let collaborators = compute_collaborators(&me, &works);
        let summary = collaborators
            .iter()
            .map(|c| (c.name.as_str(), c.count))
            .collect::<Vec<_>>();
        assert_eq!(summary, vec![("Bo Li", 2), ("Aaron Ho", 1), ("Ana Cruz", 1)]);

        let bo = &collaborators[0];
        assert_eq!(bo.author_id, id("A2"));
        assert_eq!(
            bo.work_ids,
            vec![WorkId::parse("W1").unwrap(), WorkId::parse("W3").unwrap()]
        );
        assert!(collaborators.iter().all(|c| c.author_id != me));
        assert!(collaborators.iter().all(|c| c.name != "Kai Ng"));
    }

    #[test]
    fn collaborator_details_come_from_first_sighting() {
        let mut first = coauthored("W1", ("A2", "Bo Li"), &[]);
        first.authorships[0].author.orcid = Some("https://orcid.org/0000-0001".to_string());
        first.authorships[0].institutions = vec![InstitutionRef {
            id: None,
            display_name: Some("NTU".to_string()),
        }];
        let mut second = coauthored("W2", ("A2", "B. Li"), &[]);
        second.authorships[0].institutions = vec![InstitutionRef {
            id: None,
            display_name: Some("NUS".to_string()),
        }];

        let collaborators = compute_collaborators(&id("A1"), &[first, second]);
        assert_eq!(collaborators.len(), 1);
        assert_eq!(collaborators[0].name, "Bo Li");
        assert_eq!(collaborators[0].orcid.as_deref(), Some("https://orcid.org/0000-0001"));
        assert_eq!(collaborators[0].institution.as_deref(), Some("NTU"));
        assert_eq!(collaborators[0].count, 2);
    }

    #[tokio::test]
    async fn single_page_when_total_is_below_page_size() {
        let api = Arc::new(PagedApi::new(130));
        let works = aggregator(&api)
            .fetch_works(&id("A1"), 200, &WorkSort::newest_first())
            .await;

        assert_eq!(works.len(), 130);
        assert_eq!(api.pages_requested(), vec![(1, 200)]);
    }

    #[tokio::test]
    async fn paginates_until_count_is_reached() {
        let api = Arc::new(PagedApi::new(1000));
        let works = aggregator(&api)
            .fetch_works(&id("A1"), 450, &WorkSort::newest_first())
            .await;

        assert_eq!(works.len(), 450);
        assert_eq!(api.pages_requested(), vec![(1, 200), (2, 200), (3, 200)]);
        assert_eq!(works[449].id, "https://openalex.org/W449");
    }

    #[tokio::test]
    async fn small_counts_shrink_the_page() {
        let api = Arc::new(PagedApi::new(1000));
        let works = aggregator(&api)
            .fetch_works(&id("A1"), 50, &WorkSort::newest_first())
            .await;

        assert_eq!(works.len(), 50);
        assert_eq!(api.pages_requested(), vec![(1, 50)]);
    }

    #[tokio::test]
    async fn configured_page_size_is_capped_at_api_ceiling() {
        let api = Arc::new(PagedApi::new(1000));
        let config = AggregatorConfig {
            page_size: 500,
            ..AggregatorConfig::default()
        };
        let works = MetadataAggregator::new(api.clone(), config)
            .fetch_works(&id("A1"), 1000, &WorkSort::newest_first())
            .await;

        assert_eq!(works.len(), 1000);
        let pages = api.pages_requested();
        assert_eq!(pages.len(), 5);
        assert!(pages.iter().all(|&(_, per_page)| per_page == MAX_PAGE_SIZE));
    }

    #[tokio::test]
    async fn failed_page_returns_partial_results() {
        let api = Arc::new(PagedApi {
            fail_from_page: Some(2),
            ..PagedApi::new(1000)
        });
        let works = aggregator(&api)
            .fetch_works(&id("A1"), 500, &WorkSort::newest_first())
            .await;

        assert_eq!(works.len(), 200);
        assert_eq!(api.pages_requested().len(), 2);
    }

    #[tokio::test]
    async fn zero_count_makes_no_request() {
        let api = Arc::new(PagedApi::new(10));
        let works = aggregator(&api)
            .fetch_works(&id("A1"), 0, &WorkSort::newest_first())
            .await;

        assert!(works.is_empty());
        assert!(api.pages_requested().is_empty());
    }

    #[tokio::test]
    async fn stats_filter_tags_and_order_years() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/authors/A5023888391")
            .with_status(200)
            .with_body(
                json!({
                    "id": "https://openalex.org/A5023888391",
                    "display_name": "Jane Tan",
                    "works_count": 88,
                    "cited_by_count": 4200,
                    "summary_stats": {"h_index": 31, "i10_index": 60},
                    "updated_date": "2024-05-01T12:34:56.123456",
                    "counts_by_year": [
                        {"year": 2023, "works_count": 9, "cited_by_count": 700},
                        {"year": 2021, "works_count": 7, "cited_by_count": 500},
                        {"year": 2022, "works_count": 8, "cited_by_count": 600}
                    ],
                    "x_concepts": [
                        {"display_name": "Computer science", "level": 0, "score": 91.2},
                        {"display_name": "Machine learning", "level": 1, "score": 64.0},
                        {"display_name": "Graph theory", "level": 2, "score": 50.0},
                        {"display_name": "Parallel computing", "level": 1, "score": 50.1}
                    ],
                    "last_known_institution": {"id": "https://openalex.org/I172675005", "display_name": "Nanyang Technological University"}
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let client = OpenAlexClient::with_base_url(&server.url()).unwrap();
        let aggregator = MetadataAggregator::new(Arc::new(client), AggregatorConfig::default());
        let stats = aggregator.fetch_stats(&id("A5023888391")).await.unwrap();
        mock.assert_async().await;

        assert_eq!(stats.h_index, 31);
        assert_eq!(stats.i10_index, 60);
        assert_eq!(stats.works_count, 88);
        assert_eq!(
            stats.counts_by_year.iter().map(|c| c.year).collect::<Vec<_>>(),
            vec![2021, 2022, 2023]
        );
        assert_eq!(
            stats.tags.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            vec!["Machine learning", "Parallel computing"]
        );
        assert_eq!(
            stats.institution.as_deref(),
            Some("Nanyang Technological University")
        );
        assert_eq!(
            stats.last_updated.map(|t| t.date()),
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
    }

    #[tokio::test]
    async fn stats_lookup_failure_is_an_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/authors/A404")
            .with_status(404)
            .create_async()
            .await;

        let client = OpenAlexClient::with_base_url(&server.url()).unwrap();
        let aggregator = MetadataAggregator::new(Arc::new(client), AggregatorConfig::default());
        let err = aggregator.fetch_stats(&id("A404")).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn updated_date_accepts_date_only() {
        assert_eq!(
            parse_updated("2024-05-01").map(|t| t.date()),
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
        assert_eq!(parse_updated("yesterday"), None);
    }
}
