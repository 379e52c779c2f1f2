//! arXiv Search Tool
//!
//! Queries the arXiv export API (Atom feed). Inputs made only of arXiv
//! identifiers are looked up directly.

use async_trait::async_trait;

use agent_core::{Result as CoreResult, Tool, ToolSchema};

use super::text::{collapse_whitespace, decode_entities, tag_text, tag_texts, truncate_chars};
use crate::config::ResearchConfig;
use crate::error::{ResearchError, Result};

const NO_RESULT: &str = "No good Arxiv Result was found";
const MAX_QUERY_LEN: usize = 300;

/// Tool for searching arXiv papers
pub struct ArxivSearchTool {
    client: reqwest::Client,
    endpoint: String,
    top_k: usize,
    max_chars: usize,
}

impl ArxivSearchTool {
    pub fn new(client: reqwest::Client, config: &ResearchConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoints.arxiv.clone(),
            top_k: config.arxiv_top_k,
            max_chars: config.max_doc_chars,
        }
    }

    async fn search(&self, query: &str) -> Result<String> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ResearchError::EmptyInput);
        }

        let max_results = self.top_k.to_string();
        let request = if is_arxiv_identifier(query) {
            let ids = query.split_whitespace().collect::<Vec<_>>().join(",");
            self.client
                .get(&self.endpoint)
                .query(&[("id_list", ids.as_str()), ("max_results", max_results.as_str())])
        } else {
            let truncated: String = query.chars().take(MAX_QUERY_LEN).collect();
            self.client.get(&self.endpoint).query(&[
                ("search_query", format!("all:{truncated}").as_str()),
                ("max_results", max_results.as_str()),
            ])
        };

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ResearchError::Status {
                service: "arXiv",
                status: response.status().as_u16(),
            });
        }
        let feed = response.text().await?;

        let entries = parse_feed(&feed, self.top_k);
        tracing::debug!(query, results = entries.len(), "arXiv search");

        if entries.is_empty() {
            return Ok(NO_RESULT.into());
        }
        Ok(truncate_chars(&entries.join("\n\n"), self.max_chars))
    }
}

#[async_trait]
impl Tool for ArxivSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "arxiv_search",
            "Search Arxiv.org for academic papers. Input should be a search query, like 'quantum computing' or '1003.3568' for a specific paper ID.",
        )
        .with_input_description("Search query or arXiv paper ID")
    }

    async fn invoke(&self, input: &str) -> CoreResult<String> {
        Ok(self.search(input).await?)
    }
}

/// Whether every token looks like an arXiv identifier.
///
/// New style `YYMM.NNNNN` with optional `vN`; old style `archive/YYMMNNN`.
pub(crate) fn is_arxiv_identifier(query: &str) -> bool {
    let mut tokens = query.split_whitespace().peekable();
    tokens.peek().is_some() && tokens.all(|t| is_new_style_id(t) || is_old_style_id(t))
}

fn strip_version(id: &str) -> &str {
    match id.rfind('v') {
        Some(pos) if pos + 1 < id.len() && id[pos + 1..].bytes().all(|b| b.is_ascii_digit()) => &id[..pos],
        _ => id,
    }
}

fn is_new_style_id(token: &str) -> bool {
    let Some((yymm, number)) = strip_version(token).split_once('.') else {
        return false;
    };
    let month = yymm.get(2..).and_then(|m| m.parse::<u8>().ok());
    yymm.len() == 4
        && yymm.bytes().all(|b| b.is_ascii_digit())
        && matches!(month, Some(1..=12))
        && (4..=5).contains(&number.len())
        && number.bytes().all(|b| b.is_ascii_digit())
}

fn is_old_style_id(token: &str) -> bool {
    let Some((archive, number)) = strip_version(token).split_once('/') else {
        return false;
    };
    !archive.is_empty()
        && archive.bytes().all(|b| b.is_ascii_alphabetic() || b == b'-' || b == b'.')
        && number.len() == 7
        && number.bytes().all(|b| b.is_ascii_digit())
}

/// Format up to `top_k` feed entries
pub(crate) fn parse_feed(feed: &str, top_k: usize) -> Vec<String> {
    feed.split("<entry>")
        .skip(1)
        .filter_map(format_entry)
        .take(top_k)
        .collect()
}

fn format_entry(entry: &str) -> Option<String> {
    let title = collapse_whitespace(&decode_entities(tag_text(entry, "title")?));
    // The API reports bad IDs as an entry titled "Error".
    if title.is_empty() || title == "Error" {
        return None;
    }

    let published = tag_text(entry, "published").unwrap_or_default();
    let published = published.get(..10).unwrap_or(published);
    let authors = tag_texts(entry, "name")
        .into_iter()
        .map(|n| decode_entities(n.trim()))
        .collect::<Vec<_>>()
        .join(", ");
    let summary = collapse_whitespace(&decode_entities(tag_text(entry, "summary").unwrap_or_default()));

    Some(format!(
        "Published: {published}\nTitle: {title}\nAuthors: {authors}\nSummary: {summary}"
    ))
}
