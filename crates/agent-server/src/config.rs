//! Server Configuration

use std::str::FromStr;

use anyhow::{Context, bail};

/// Which reasoning capability backs the agent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Ollama,
}

impl ProviderKind {
    /// Model used when `LLM_MODEL` is unset
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4.1",
            Self::Ollama => "llama3.2",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => bail!("unknown LLM_PROVIDER '{other}' (expected 'openai' or 'ollama')"),
        }
    }
}

/// Server settings read once at startup
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub provider: ProviderKind,
    pub model: String,
    pub temperature: f32,
    pub max_messages: usize,
}

impl ServerConfig {
    /// Read `BIND_ADDR`, `LLM_PROVIDER`, `LLM_MODEL`, `LLM_TEMPERATURE`
    /// and `AGENT_MAX_MESSAGES`
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let provider = lookup("LLM_PROVIDER")
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or(ProviderKind::OpenAi);

        let temperature = lookup("LLM_TEMPERATURE")
            .map(|v| v.parse::<f32>().context("LLM_TEMPERATURE must be a number"))
            .transpose()?
            .unwrap_or(0.7);

        let max_messages = lookup("AGENT_MAX_MESSAGES")
            .map(|v| v.parse::<usize>().context("AGENT_MAX_MESSAGES must be an integer"))
            .transpose()?
            .unwrap_or(agent_core::reasoning::DEFAULT_MAX_MESSAGES);

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into()),
            model: lookup("LLM_MODEL").unwrap_or_else(|| provider.default_model().into()),
            provider,
            temperature,
            max_messages,
        })
    }
}
