//! Semantic Scholar Search Tool
//!
//! Uses the Graph API paper search endpoint. No API key is needed for the
//! public rate tier.

use async_trait::async_trait;
use serde::Deserialize;

use agent_core::{Result as CoreResult, Tool, ToolSchema};

use super::text::{collapse_whitespace, truncate_chars};
use crate::config::ResearchConfig;
use crate::error::{ResearchError, Result};

const NO_RESULT: &str = "No Semantic Scholar Result was found";
const FIELDS: &str = "title,abstract,authors,year,url";

/// Tool for searching Semantic Scholar
pub struct SemanticScholarTool {
    client: reqwest::Client,
    endpoint: String,
    top_k: usize,
    max_chars: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Paper>,
}

#[derive(Debug, Deserialize)]
struct Paper {
    title: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    #[serde(default)]
    authors: Vec<Author>,
    year: Option<u32>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: Option<String>,
}

impl SemanticScholarTool {
    pub fn new(client: reqwest::Client, config: &ResearchConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoints.semantic_scholar.clone(),
            top_k: config.semantic_scholar_top_k,
            max_chars: config.max_doc_chars,
        }
    }

    async fn search(&self, query: &str) -> Result<String> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ResearchError::EmptyInput);
        }

        let limit = self.top_k.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("query", query), ("limit", limit.as_str()), ("fields", FIELDS)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ResearchError::Status {
                service: "Semantic Scholar",
                status: response.status().as_u16(),
            });
        }

        let body: SearchResponse = response.json().await?;
        tracing::debug!(query, results = body.data.len(), "Semantic Scholar search");

        let papers = format_papers(&body.data);
        if papers.is_empty() {
            return Ok(NO_RESULT.into());
        }
        Ok(truncate_chars(&papers, self.max_chars))
    }
}

#[async_trait]
impl Tool for SemanticScholarTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "semantic_scholar_search",
            "Search for research papers on Semantic Scholar.",
        )
        .with_input_description("Search query")
    }

    async fn invoke(&self, input: &str) -> CoreResult<String> {
        Ok(self.search(input).await?)
    }
}

fn format_papers(papers: &[Paper]) -> String {
    papers
        .iter()
        .filter(|p| p.title.as_deref().is_some_and(|t| !t.trim().is_empty()))
        .map(format_paper)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_paper(paper: &Paper) -> String {
    let year = paper.year.map(|y| y.to_string()).unwrap_or_default();
    let title = paper.title.as_deref().unwrap_or_default().trim();
    let authors = paper
        .authors
        .iter()
        .filter_map(|a| a.name.as_deref())
        .collect::<Vec<_>>()
        .join(", ");
    let abstract_text = paper
        .abstract_text
        .as_deref()
        .map_or_else(|| "No abstract available".to_string(), collapse_whitespace);

    let mut out = format!(
        "Published year: {year}\nTitle: {title}\nAuthors: {authors}\nAbstract: {abstract_text}"
    );
    if let Some(url) = &paper.url {
        out.push_str("\nURL: ");
        out.push_str(url);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"{
        "total": 2,
        "offset": 0,
        "data": [
            {
                "paperId": "abc",
                "title": "Attention Is All You Need",
                "abstract": "The dominant sequence\n transduction models...",
                "authors": [{"authorId": "1", "name": "Ashish Vaswani"}, {"authorId": "2", "name": "Noam Shazeer"}],
                "year": 2017,
                "url": "https://www.semanticscholar.org/paper/abc"
            },
            {
                "paperId": "def",
                "title": "Untitled Draft",
                "abstract": null,
                "authors": [],
                "year": null,
                "url": null
            }
        ]
    }"#;

    #[test]
    fn test_format_papers() {
        let body: SearchResponse = serde_json::from_str(RESPONSE).unwrap();
        let out = format_papers(&body.data);
        let blocks: Vec<&str> = out.split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0],
            "Published year: 2017\nTitle: Attention Is All You Need\nAuthors: Ashish Vaswani, Noam Shazeer\nAbstract: The dominant sequence transduction models...\nURL: https://www.semanticscholar.org/paper/abc"
        );
        assert!(blocks[1].contains("Abstract: No abstract available"));
    }

    #[test]
    fn test_missing_data_is_empty() {
        let body: SearchResponse = serde_json::from_str(r#"{"total": 0}"#).unwrap();
        assert!(format_papers(&body.data).is_empty());
    }

    #[test]
    fn test_untitled_papers_are_skipped() {
        let body: SearchResponse =
            serde_json::from_str(r#"{"data": [{"title": "  ", "authors": []}]}"#).unwrap();
        assert!(format_papers(&body.data).is_empty());
    }
}
