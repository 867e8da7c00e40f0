//! University directory profile pages.
//!
//! Only two things are read from a profile: the raw node sequence of the
//! journal-articles list and the research-interest keywords.

use std::time::Duration;

use async_trait::async_trait;
use facultyscope_core::{DirectoryConfig, OpenAlexConfig};
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use crate::citations::{Fragment, RawCitationBlock};
use crate::error::{Result, ScienceError};
use crate::http::RateLimitedClient;

#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// Publication fragments of a profile; empty when the page has no
    /// journal-articles section.
    async fn citation_block(&self, profile_url: &str) -> Result<RawCitationBlock>;

    async fn research_interests(&self, profile_url: &str) -> Result<Vec<String>>;
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScienceError::Parse(format!("bad selector {css}: {e}")))
}

/// Converts the first element inside `div#{container_id}` into fragments.
pub fn citation_block_from_html(html: &str, container_id: &str) -> Result<RawCitationBlock> {
    let document = Html::parse_document(html);
    let container_sel = selector(&format!("div#{container_id}"))?;

    let Some(container) = document.select(&container_sel).next() else {
        return Ok(RawCitationBlock::default());
    };
    let Some(list) = container.children().find_map(ElementRef::wrap) else {
        return Ok(RawCitationBlock::default());
    };

    let mut block = RawCitationBlock::default();
    for node in list.children() {
        match node.value() {
            Node::Text(text) => {
                let text: &str = text;
                block.push(Fragment::Text(text.to_string()));
            }
            Node::Element(element) if element.name() == "br" => block.push(Fragment::Break),
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(node) {
                    block.push(Fragment::Markup(element.html()));
                }
            }
            _ => {}
        }
    }
    Ok(block)
}

/// Keyword spans of the taxonomy box, minus the faculty-wide umbrella term.
pub fn research_interests_from_html(html: &str, excluded: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let keyword_sel = selector("div#taxonomyDiv span.rkeyword")?;

    Ok(document
        .select(&keyword_sel)
        .map(|span| span.text().collect::<String>().trim().to_string())
        .filter(|tag| !tag.is_empty() && tag != excluded)
        .collect())
}

/// Fetches profile pages over HTTP.
pub struct DirectoryScraper {
    client: RateLimitedClient,
    config: DirectoryConfig,
}

impl DirectoryScraper {
    pub fn new(config: DirectoryConfig, http: &OpenAlexConfig) -> Result<Self> {
        let client = RateLimitedClient::new(
            Duration::from_millis(http.min_interval_ms),
            Duration::from_secs(http.timeout_secs),
            &http.user_agent,
        )?;
        Ok(Self { client, config })
    }

    fn publications_url(&self, profile_url: &str) -> String {
        format!(
            "{}/{}",
            profile_url.trim_end_matches('/'),
            self.config.publications_page
        )
    }
}

#[async_trait]
impl DirectorySource for DirectoryScraper {
    async fn citation_block(&self, profile_url: &str) -> Result<RawCitationBlock> {
        let url = self.publications_url(profile_url);
        let html = self.client.get(&url).await?;
        let block = citation_block_from_html(&html, &self.config.journal_container_id)?;
        debug!(url = %url, fragments = block.fragments().len(), "parsed publication list");
        Ok(block)
    }

    async fn research_interests(&self, profile_url: &str) -> Result<Vec<String>> {
        let html = self.client.get(profile_url).await?;
        research_interests_from_html(&html, &self.config.excluded_interest)
    }
}

#[cfg(test)]
mod tests {
    use mockito::Server;

    use super::*;
    use crate::citations::parse_citations;

    const PUBLICATIONS_PAGE: &str = r#"
<html><body>
<div id="facultyjournalDiv">
  <div class="publist">Tan, W. (2020). <i>Graph Partitioning at Scale</i>. Parallel Computing. doi: 10.1016/j.parco.2020.1<br/><br/>Lim, K., Tan, W. (2019). "Federated Graph Learning in Practice," ACM Computing Surveys.<br/><br/><b>Highly Cited:</b><br/><br/></div>
</div>
</body></html>
"#;

    #[test]
    fn converts_publication_list_into_fragments() {
        let block = citation_block_from_html(PUBLICATIONS_PAGE, "facultyjournalDiv").unwrap();

        let breaks = block
            .fragments()
            .iter()
            .filter(|f| matches!(f, Fragment::Break))
            .count();
        assert_eq!(breaks, 6);
        assert!(block
            .fragments()
            .contains(&Fragment::Markup("<i>Graph Partitioning at Scale</i>".to_string())));

        let citations = parse_citations(&block);
        assert_eq!(citations.len(), 2);
        assert_eq!(
            citations[0].as_str(),
            "Tan, W. (2020). Graph Partitioning at Scale. Parallel Computing. doi: 10.1016/j.parco.2020.1"
        );
    }

    #[test]
    fn missing_container_yields_empty_block() {
        let block = citation_block_from_html(
            "<html><body><p>No articles</p></body></html>",
            "facultyjournalDiv",
        )
        .unwrap();
        assert!(block.is_empty());
    }

    #[test]
    fn extracts_interests_without_umbrella_term() {
        let html = r#"
<div id="taxonomyDiv" class="dynaFieldValue">
  <span class="rkeyword"> Computer Science and Engineering </span>
  <span class="rkeyword">Machine Learning</span>
  <span class="rkeyword">Graph Algorithms</span>
</div>"#;
        let interests =
            research_interests_from_html(html, "Computer Science and Engineering").unwrap();
        assert_eq!(interests, vec!["Machine Learning", "Graph Algorithms"]);
    }

    #[tokio::test]
    async fn scraper_fetches_publication_subpage() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/cris/rp/rp00001/selectedPublications.html")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(PUBLICATIONS_PAGE)
            .expect(1)
            .create_async()
            .await;

        let http = OpenAlexConfig {
            min_interval_ms: 0,
            ..OpenAlexConfig::default()
        };
        let scraper = DirectoryScraper::new(DirectoryConfig::default(), &http).unwrap();
        let profile = format!("{}/cris/rp/rp00001/", server.url());
        let block = scraper.citation_block(&profile).await.unwrap();
        mock.assert_async().await;

        assert_eq!(parse_citations(&block).len(), 2);
    }
}
