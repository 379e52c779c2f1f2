//! Tool Configuration
//!
//! Credentials and limits for the research tools, loaded once at startup and
//! handed to each tool's constructor.

use std::time::Duration;

use crate::error::Result;

/// Service endpoints. Overridable for self-hosted mirrors.
#[derive(Clone, Debug)]
pub struct Endpoints {
    pub arxiv: String,
    pub semantic_scholar: String,
    pub wikipedia: String,
    pub serper: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            arxiv: "https://export.arxiv.org/api/query".into(),
            semantic_scholar: "https://api.semanticscholar.org/graph/v1/paper/search".into(),
            wikipedia: "https://en.wikipedia.org/w/api.php".into(),
            serper: "https://google.serper.dev/search".into(),
        }
    }
}

/// Research tool configuration
#[derive(Clone, Debug)]
pub struct ResearchConfig {
    /// Serper API key; the web search tool is skipped without it
    pub serper_api_key: Option<String>,

    /// Papers returned per arXiv query
    pub arxiv_top_k: usize,

    /// Pages summarized per Wikipedia query
    pub wikipedia_top_k: usize,

    /// Papers returned per Semantic Scholar query
    pub semantic_scholar_top_k: usize,

    /// Character cap on any tool output
    pub max_doc_chars: usize,

    /// Timeout for search API requests
    pub http_timeout_secs: u64,

    /// Python interpreter for the REPL tool
    pub python_bin: String,

    /// Wall-clock limit for one Python execution
    pub python_timeout_secs: u64,

    /// User-Agent sent to the search APIs
    pub user_agent: String,

    pub endpoints: Endpoints,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            serper_api_key: None,
            arxiv_top_k: 5,
            wikipedia_top_k: 2,
            semantic_scholar_top_k: 5,
            max_doc_chars: 4000,
            http_timeout_secs: 30,
            python_bin: "python3".into(),
            python_timeout_secs: 60,
            user_agent: concat!("research-agent/", env!("CARGO_PKG_VERSION")).into(),
            endpoints: Endpoints::default(),
        }
    }
}

impl ResearchConfig {
    /// Read `SERPER_API_KEY`, `PYTHON_BIN`, `PYTHON_TIMEOUT_SECS` and
    /// `RESEARCH_HTTP_TIMEOUT_SECS` on top of the defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            serper_api_key: std::env::var("SERPER_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            python_bin: std::env::var("PYTHON_BIN").unwrap_or(defaults.python_bin),
            python_timeout_secs: env_parse("PYTHON_TIMEOUT_SECS").unwrap_or(defaults.python_timeout_secs),
            http_timeout_secs: env_parse("RESEARCH_HTTP_TIMEOUT_SECS").unwrap_or(defaults.http_timeout_secs),
            ..defaults
        }
    }

    /// Shared HTTP client for the search tools
    pub fn http_client(&self) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .timeout(Duration::from_secs(self.http_timeout_secs))
            .build()?)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
