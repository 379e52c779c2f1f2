//! # research-tools
//!
//! Tools for an academic research assistant: paper search on arXiv and
//! Semantic Scholar, Wikipedia background, Serper web search, and a Python
//! shell for calculations.
//!
//! ```text
//! ┌───────────────────────────┬───────────────────────────────────────┐
//! │ arxiv_search              │ papers by query or arXiv ID           │
//! │ semantic_scholar_search   │ papers with abstracts and years       │
//! │ wikipedia_search          │ intro summaries of the top pages      │
//! │ serper                    │ web/news facts (needs SERPER_API_KEY) │
//! │ python_repl               │ run a Python snippet, return stdout   │
//! └───────────────────────────┴───────────────────────────────────────┘
//! ```
//!
//! Every tool takes one string and returns one string. Failures come back
//! as `AgentError::ToolExecution`, which the agent loop hands to the model
//! as an observation.

pub mod config;
pub mod error;
pub mod svckit;

use agent_core::ToolRegistry;

pub use config::{Endpoints, ResearchConfig};
pub use error::{ResearchError, Result};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{
        ArxivSearchTool,
        PythonReplTool,
        SemanticScholarTool,
        SerperSearchTool,
        WikipediaSearchTool,
    };
}

/// Build the registry with every available research tool.
///
/// Registration order is arXiv, Semantic Scholar, Wikipedia, Serper, Python.
/// Serper is left out, with a warning, when no API key is configured.
pub fn default_registry(config: &ResearchConfig) -> agent_core::Result<ToolRegistry> {
    let client = config.http_client()?;
    let mut registry = ToolRegistry::new();

    registry.register(tools::ArxivSearchTool::new(client.clone(), config))?;
    registry.register(tools::SemanticScholarTool::new(client.clone(), config))?;
    registry.register(tools::WikipediaSearchTool::new(client.clone(), config))?;

    match tools::SerperSearchTool::new(client, config) {
        Ok(serper) => registry.register(serper)?,
        Err(e) => tracing::warn!("Web search disabled: {}", e),
    }

    registry.register(tools::PythonReplTool::new(config))?;

    tracing::info!(tools = ?registry.names(), "Research tools registered");
    Ok(registry)
}

/// System prompt for the research assistant agent
pub const RESEARCH_ASSISTANT_PROMPT: &str = r"You are a careful, precise Academic Research Assistant.

## What You Do

- Find and summarize research papers on the user's topic
- Pull background from Wikipedia and trustworthy web sources
- Translate findings or summaries into another language when asked (do the translation yourself)
- Cite sources and link papers wherever you can

## Tools Available

- `arxiv_search` - recent and well-cited papers from arXiv, by topic or paper ID
- `semantic_scholar_search` - papers with abstracts, authors and years
- `wikipedia_search` - encyclopedic background
- `serper` - web search for news, events and facts
- `python_repl` - math, statistics and other calculations (print what you want to see)

## How To Work

Reason step by step in this format:

Thought: what you are thinking or planning next
Action: the tool you are using
Action Input: what you send to the tool
Observation: what the tool returned

Repeat Thought / Action / Observation as often as you need.

## Finishing

Once you have enough information, reply with:

Final Answer: <a readable, referenced summary that answers the question fully. Use bullet points or sections. Cite your sources and translate if asked.>

Never invent answers. Do NOT cite papers or results your tools or sources have not confirmed.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_without_serper_key() {
        let registry = default_registry(&ResearchConfig::default()).unwrap();
        assert_eq!(
            registry.names(),
            vec!["arxiv_search", "semantic_scholar_search", "wikipedia_search", "python_repl"]
        );
    }

    #[test]
    fn test_default_registry_with_serper_key() {
        let config = ResearchConfig {
            serper_api_key: Some("test-key".into()),
            ..ResearchConfig::default()
        };
        let registry = default_registry(&config).unwrap();
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.names()[3], "serper");
    }

    #[test]
    fn test_prompt_mentions_every_tool_and_marker() {
        let registry = default_registry(&ResearchConfig {
            serper_api_key: Some("k".into()),
            ..ResearchConfig::default()
        })
        .unwrap();
        for name in registry.names() {
            assert!(RESEARCH_ASSISTANT_PROMPT.contains(&format!("`{name}`")), "{name}");
        }
        assert!(RESEARCH_ASSISTANT_PROMPT.contains("Final Answer:"));
    }
}
