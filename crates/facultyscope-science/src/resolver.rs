//! Author-identity resolution.
//!
//! A faculty record is matched to an external author by walking
//! [`ResolutionMethod::LADDER`]: stated ORCID, DOIs from the directory
//! profile, publication titles from the profile, then name search anchored
//! to the home institution, then bare name search. The first step that
//! yields an author wins. Lookup failures only move the walk to the next
//! step; running out of steps is [`Resolution::Unresolved`], not an error.

use std::sync::Arc;

use facultyscope_core::{
    AuthorId, FacultyRecord, IdentityCache, Resolution, ResolutionMethod, ResolverConfig,
};
use tracing::{debug, info, warn};

use crate::citations::{Citation, candidate_titles, doi_list, parse_citations};
use crate::directory::DirectorySource;
use crate::error::Result;
use crate::matching::NameMatcher;
use crate::sources::{AuthorSearch, ScholarlyApi, WorkRecord};

pub struct AuthorResolver {
    api: Arc<dyn ScholarlyApi>,
    directory: Arc<dyn DirectorySource>,
    config: ResolverConfig,
    matcher: NameMatcher,
}

impl AuthorResolver {
    pub fn new(
        api: Arc<dyn ScholarlyApi>,
        directory: Arc<dyn DirectorySource>,
        config: ResolverConfig,
    ) -> Self {
        let matcher = NameMatcher::new(config.name_match_threshold);
        Self {
            api,
            directory,
            config,
            matcher,
        }
    }

    /// Runs the ladder for one faculty member.
    ///
    /// Only precondition violations and local failures are returned as
    /// errors; external lookups that fail just advance the ladder.
    pub async fn resolve(&self, record: &FacultyRecord) -> Result<Resolution> {
        // Fetched on first use and shared by the DOI and title steps.
        let mut citations: Option<Vec<Citation>> = None;

        for method in ResolutionMethod::LADDER {
            debug!(faculty = %record.name, %method, "trying resolution step");

            let outcome = match method {
                ResolutionMethod::Orcid => self.by_orcid(record).await,
                ResolutionMethod::Doi => {
                    let citations = self.load_citations(record, &mut citations).await?;
                    self.by_doi(record, citations).await
                }
                ResolutionMethod::Publication => {
                    let citations = self.load_citations(record, &mut citations).await?;
                    self.by_publication(record, citations).await
                }
                ResolutionMethod::Institution => self.by_name_search(record, true).await,
                ResolutionMethod::Name => self.by_name_search(record, false).await,
            };

            match outcome {
                Ok(Some(author_id)) => {
                    info!(faculty = %record.name, %method, %author_id, "resolved author identity");
                    return Ok(Resolution::resolved(author_id, method));
                }
                Ok(None) => {}
                Err(e) if e.is_lookup_failure() => {
                    warn!(faculty = %record.name, %method, error = %e, "resolution step failed");
                }
                Err(e) => return Err(e),
            }
        }

        info!(faculty = %record.name, "no author identity found");
        Ok(Resolution::Unresolved)
    }

    /// [`resolve`](Self::resolve) memoized in `cache` under the faculty key.
    pub async fn resolve_cached(
        &self,
        record: &FacultyRecord,
        cache: &dyn IdentityCache,
    ) -> Result<Resolution> {
        let key = record.cache_key();
        if let Some(hit) = cache.get(key)? {
            debug!(faculty = key, "identity cache hit");
            return Ok(hit);
        }

        let resolution = self.resolve(record).await?;
        cache.set(key, &resolution)?;
        Ok(resolution)
    }

    async fn load_citations<'c>(
        &self,
        record: &FacultyRecord,
        slot: &'c mut Option<Vec<Citation>>,
    ) -> Result<&'c [Citation]> {
        if slot.is_none() {
            let citations = match record.profile_url.as_deref() {
                None => Vec::new(),
                Some(url) => match self.directory.citation_block(url).await {
                    Ok(block) => parse_citations(&block),
                    Err(e) if e.is_lookup_failure() => {
                        warn!(faculty = %record.name, error = %e, "directory profile unavailable");
                        Vec::new()
                    }
                    Err(e) => return Err(e),
                },
            };
            debug!(faculty = %record.name, count = citations.len(), "parsed directory citations");
            *slot = Some(citations);
        }
        Ok(slot.as_deref().unwrap_or_default())
    }

    async fn by_orcid(&self, record: &FacultyRecord) -> Result<Option<AuthorId>> {
        let Some(orcid) = record.orcid_url.as_deref() else {
            return Ok(None);
        };
        let author = self.api.author(orcid).await?;
        Ok(Some(author.author_id()?))
    }

    async fn by_doi(
        &self,
        record: &FacultyRecord,
        citations: &[Citation],
    ) -> Result<Option<AuthorId>> {
        for doi in doi_list(citations) {
            let work = match self.api.work_by_doi(&doi).await {
                Ok(work) => work,
                Err(e) if e.is_lookup_failure() => {
                    debug!(%doi, error = %e, "DOI lookup failed");
                    continue;
                }
                Err(e) => return Err(e),
            };
            if let Some(id) = self.pick_authorship(&record.name, &work)? {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    async fn by_publication(
        &self,
        record: &FacultyRecord,
        citations: &[Citation],
    ) -> Result<Option<AuthorId>> {
        for title in candidate_titles(citations, self.config.min_title_words) {
            let works = match self.api.search_works(&title).await {
                Ok(works) => works,
                Err(e) if e.is_lookup_failure() => {
                    debug!(%title, error = %e, "title search failed");
                    continue;
                }
                Err(e) => return Err(e),
            };
            // Only the top-ranked hit is trusted.
            let Some(top) = works.first() else {
                continue;
            };
            if let Some(id) = self.pick_authorship(&record.name, top)? {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    async fn by_name_search(
        &self,
        record: &FacultyRecord,
        anchored: bool,
    ) -> Result<Option<AuthorId>> {
        let mut query =
            AuthorSearch::by_name(record.name.trim()).in_concept(&self.config.concept_id);
        if anchored {
            query = query.at_institution(&self.config.institution_id);
        }

        let candidates = self.api.search_authors(&query).await?;
        let accepted = candidates.iter().find(|candidate| {
            candidate
                .concept_score(&self.config.concept_name)
                .is_some_and(|score| score > self.config.concept_min_score)
        });

        match accepted {
            Some(author) => Ok(Some(author.author_id()?)),
            None => Ok(None),
        }
    }

    /// Author of `work` whose display name best matches the faculty name.
    fn pick_authorship(&self, name: &str, work: &WorkRecord) -> Result<Option<AuthorId>> {
        if work.authorships.is_empty() {
            return Ok(None);
        }
        let names = work.author_names();

        let Some(index) = self.matcher.best_index(name, &names)? else {
            return Ok(None);
        };
        Ok(work.authorships[index]
            .author
            .id
            .as_deref()
            .and_then(|id| AuthorId::parse(id).ok()))
    }
}
