//! Web Search via Serper
//!
//! Google results through serper.dev. Requires `SERPER_API_KEY`.

use async_trait::async_trait;
use serde_json::{Value, json};

use agent_core::{Result as CoreResult, Tool, ToolSchema};

use super::text::truncate_chars;
use crate::config::ResearchConfig;
use crate::error::{ResearchError, Result};

const NO_RESULT: &str = "No good Google Search Result was found";
const RESULT_COUNT: u32 = 10;

/// Tool for general web search
pub struct SerperSearchTool {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_chars: usize,
}

impl SerperSearchTool {
    /// Fails with [`ResearchError::MissingApiKey`] when no key is configured
    pub fn new(client: reqwest::Client, config: &ResearchConfig) -> Result<Self> {
        let api_key = config
            .serper_api_key
            .clone()
            .ok_or(ResearchError::MissingApiKey("SERPER_API_KEY"))?;

        Ok(Self {
            client,
            endpoint: config.endpoints.serper.clone(),
            api_key,
            max_chars: config.max_doc_chars,
        })
    }

    async fn search(&self, query: &str) -> Result<String> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ResearchError::EmptyInput);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&json!({
                "q": query,
                "gl": "us",
                "hl": "en",
                "num": RESULT_COUNT,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ResearchError::Status {
                service: "Serper",
                status: response.status().as_u16(),
            });
        }

        let body: Value = response.json().await?;
        let snippets = extract_snippets(&body);
        tracing::debug!(query, snippets = snippets.len(), "Serper search");

        if snippets.is_empty() {
            return Ok(NO_RESULT.into());
        }
        Ok(truncate_chars(&snippets.join(" "), self.max_chars))
    }
}

#[async_trait]
impl Tool for SerperSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "serper",
            "Search news, events, or facts using Serper-powered web search.",
        )
        .with_input_description("Search query")
    }

    async fn invoke(&self, input: &str) -> CoreResult<String> {
        Ok(self.search(input).await?)
    }
}

/// Pull readable snippets out of a Serper response.
///
/// A direct answer box wins outright. Otherwise knowledge-graph facts come
/// first, followed by organic result snippets.
fn extract_snippets(body: &Value) -> Vec<String> {
    if let Some(answer_box) = body.get("answerBox") {
        for key in ["answer", "snippet"] {
            if let Some(text) = answer_box.get(key).and_then(Value::as_str) {
                return vec![text.replace('\n', " ")];
            }
        }
        if let Some(list) = answer_box.get("snippetHighlighted").and_then(Value::as_array) {
            let joined = list.iter().filter_map(Value::as_str).collect::<Vec<_>>().join(" ");
            if !joined.is_empty() {
                return vec![joined];
            }
        }
    }

    let mut snippets = Vec::new();

    if let Some(graph) = body.get("knowledgeGraph") {
        let title = graph.get("title").and_then(Value::as_str).unwrap_or_default();
        if let Some(kind) = graph.get("type").and_then(Value::as_str) {
            snippets.push(format!("{title}: {kind}."));
        }
        if let Some(description) = graph.get("description").and_then(Value::as_str) {
            snippets.push(description.to_string());
        }
        if let Some(attributes) = graph.get("attributes").and_then(Value::as_object) {
            for (attribute, value) in attributes {
                let value = value.as_str().map_or_else(|| value.to_string(), str::to_string);
                snippets.push(format!("{title} {attribute}: {value}."));
            }
        }
    }

    if let Some(organic) = body.get("organic").and_then(Value::as_array) {
        for result in organic {
            if let Some(snippet) = result.get("snippet").and_then(Value::as_str) {
                snippets.push(snippet.to_string());
            }
            if let Some(attributes) = result.get("attributes").and_then(Value::as_object) {
                for (attribute, value) in attributes {
                    let value = value.as_str().map_or_else(|| value.to_string(), str::to_string);
                    snippets.push(format!("{attribute}: {value}."));
                }
            }
        }
    }

    snippets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_box_wins() {
        let body = json!({
            "answerBox": {"answer": "1.62 meters", "snippet": "ignored"},
            "organic": [{"snippet": "ignored too"}]
        });
        assert_eq!(extract_snippets(&body), vec!["1.62 meters"]);
    }

    #[test]
    fn test_answer_box_snippet_fallback() {
        let body = json!({"answerBox": {"snippet": "Line one\nline two"}});
        assert_eq!(extract_snippets(&body), vec!["Line one line two"]);
    }

    #[test]
    fn test_knowledge_graph_then_organic() {
        let body = json!({
            "knowledgeGraph": {
                "title": "Ada Lovelace",
                "type": "Mathematician",
                "description": "English mathematician and writer.",
                "attributes": {"Born": "December 10, 1815"}
            },
            "organic": [
                {"title": "Ada Lovelace - Wikipedia", "snippet": "Augusta Ada King, Countess of Lovelace..."},
                {"title": "No snippet here"}
            ]
        });
        assert_eq!(
            extract_snippets(&body),
            vec![
                "Ada Lovelace: Mathematician.",
                "English mathematician and writer.",
                "Ada Lovelace Born: December 10, 1815.",
                "Augusta Ada King, Countess of Lovelace...",
            ]
        );
    }

    #[test]
    fn test_empty_response() {
        assert!(extract_snippets(&json!({"searchParameters": {"q": "x"}})).is_empty());
    }

    #[test]
    fn test_requires_api_key() {
        let config = ResearchConfig::default();
        assert!(matches!(
            SerperSearchTool::new(reqwest::Client::new(), &config),
            Err(ResearchError::MissingApiKey("SERPER_API_KEY"))
        ));

        let config = ResearchConfig {
            serper_api_key: Some("key".into()),
            ..ResearchConfig::default()
        };
        let tool = SerperSearchTool::new(reqwest::Client::new(), &config).unwrap();
        assert_eq!(tool.schema().name, "serper");
    }
}
