//! Wikipedia Search Tool
//!
//! Two MediaWiki API calls: a title search, then intro extracts for the
//! top hits.

use async_trait::async_trait;
use serde::Deserialize;

use agent_core::{Result as CoreResult, Tool, ToolSchema};

use super::text::truncate_chars;
use crate::config::ResearchConfig;
use crate::error::{ResearchError, Result};

const NO_RESULT: &str = "No good Wikipedia Search Result was found";
const MAX_QUERY_LEN: usize = 300;

/// Tool for searching Wikipedia
pub struct WikipediaSearchTool {
    client: reqwest::Client,
    endpoint: String,
    top_k: usize,
    max_chars: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    query: Option<ExtractQuery>,
}

#[derive(Debug, Default, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    normalized: Vec<TitleMapping>,
    #[serde(default)]
    redirects: Vec<TitleMapping>,
    #[serde(default)]
    pages: Vec<Page>,
}

/// Title rewrite reported by the API (`normalized` or `redirects`)
#[derive(Debug, Deserialize)]
struct TitleMapping {
    from: String,
    to: String,
}

impl ExtractQuery {
    /// Title a requested title ends up under after normalization and redirects
    fn resolve<'a>(&'a self, title: &'a str) -> &'a str {
        let title = rewrite(&self.normalized, title);
        rewrite(&self.redirects, title)
    }
}

fn rewrite<'a>(mappings: &'a [TitleMapping], title: &'a str) -> &'a str {
    mappings
        .iter()
        .find(|m| m.from == title)
        .map_or(title, |m| m.to.as_str())
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    extract: Option<String>,
    #[serde(default)]
    missing: bool,
}

impl WikipediaSearchTool {
    pub fn new(client: reqwest::Client, config: &ResearchConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoints.wikipedia.clone(),
            top_k: config.wikipedia_top_k,
            max_chars: config.max_doc_chars,
        }
    }

    async fn search(&self, query: &str) -> Result<String> {
        let query: String = query.trim().chars().take(MAX_QUERY_LEN).collect();
        if query.is_empty() {
            return Err(ResearchError::EmptyInput);
        }

        let titles = self.search_titles(&query).await?;
        tracing::debug!(query, hits = titles.len(), "Wikipedia search");
        if titles.is_empty() {
            return Ok(NO_RESULT.into());
        }

        let extracts = self.fetch_extracts(&titles).await?;
        let summaries = format_pages(&titles, &extracts);
        if summaries.is_empty() {
            return Ok(NO_RESULT.into());
        }
        Ok(truncate_chars(&summaries, self.max_chars))
    }

    async fn search_titles(&self, query: &str) -> Result<Vec<String>> {
        let limit = self.top_k.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?;
        check_status(&response)?;

        let body: SearchResponse = response.json().await?;
        Ok(body
            .query
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default())
    }

    async fn fetch_extracts(&self, titles: &[String]) -> Result<ExtractQuery> {
        let joined = titles.join("|");
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", joined.as_str()),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?;
        check_status(&response)?;

        let body: ExtractResponse = response.json().await?;
        Ok(body.query.unwrap_or_default())
    }
}

fn check_status(response: &reqwest::Response) -> Result<()> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(ResearchError::Status {
            service: "Wikipedia",
            status: response.status().as_u16(),
        })
    }
}

#[async_trait]
impl Tool for WikipediaSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "wikipedia_search",
            "Search Wikipedia for information on various subjects. Input should be a search query.",
        )
        .with_input_description("Search query")
    }

    async fn invoke(&self, input: &str) -> CoreResult<String> {
        Ok(self.search(input).await?)
    }
}

/// Summaries in search-rank order; the extract API returns pages unordered.
///
/// Requested titles are followed through normalization and redirects. Pages
/// that still match no requested title come last, in response order.
fn format_pages(titles: &[String], query: &ExtractQuery) -> String {
    let mut order: Vec<&Page> = Vec::with_capacity(query.pages.len());
    for title in titles {
        let target = query.resolve(title);
        if let Some(page) = query.pages.iter().find(|p| p.title == target) {
            if !order.iter().any(|seen| std::ptr::eq(*seen, page)) {
                order.push(page);
            }
        }
    }
    for page in &query.pages {
        if !order.iter().any(|seen| std::ptr::eq(*seen, page)) {
            order.push(page);
        }
    }

    order
        .into_iter()
        .filter(|page| !page.missing)
        .filter_map(|page| {
            let extract = page.extract.as_deref()?.trim();
            (!extract.is_empty()).then(|| format!("Page: {}\nSummary: {extract}", page.title))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
