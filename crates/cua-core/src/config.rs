//! Configuration management for cua.toml

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub omniparser: OmniParserConfig,
    pub llm: LlmConfig,
    pub agent: AgentConfig,
}

/// Where the OmniParser perception server lives.
#[derive(Debug, Clone, Deserialize)]
pub struct OmniParserConfig {
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
}

/// Where the reasoning model lives (Ollama-compatible API).
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub host: String,
    pub port: u16,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Default step budget when the CLI does not override it.
    pub max_steps: usize,
    /// Delay before each capture so UI transitions settle.
    pub settle_delay_ms: u64,
}

impl Config {
    /// Load configuration from cua.toml
    pub fn load() -> Result<Self> {
        Self::load_from(Self::find_config_path()?)
    }

    /// Try to load configuration, returning None if not found
    pub fn try_load() -> Option<Self> {
        Self::load().ok()
    }

    /// Minimal default configuration for when cua.toml is missing
    pub fn default_minimal() -> Self {
        Self {
            omniparser: OmniParserConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
                timeout_secs: 30,
            },
            llm: LlmConfig {
                host: "127.0.0.1".to_string(),
                port: 11434,
                model: "llama3.2".to_string(),
                max_tokens: 400,
                temperature: 0.1,
                timeout_secs: 60,
            },
            agent: AgentConfig {
                max_steps: 5,
                settle_delay_ms: 1000,
            },
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read {}", path.as_ref().display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.as_ref().display()))
    }

    /// Find cua.toml by searching current directory and parents
    pub fn find_config_path() -> Result<PathBuf> {
        let mut current = std::env::current_dir()?;

        for _ in 0..10 {
            let candidate = current.join("cua.toml");
            if candidate.exists() {
                return Ok(candidate);
            }
            if !current.pop() {
                break;
            }
        }

        anyhow::bail!("cua.toml not found in current directory or parents")
    }

    /// Get OmniParser base URL
    pub fn omniparser_url(&self) -> String {
        format!("http://{}:{}", self.omniparser.host, self.omniparser.port)
    }

    /// Get LLM base URL
    pub fn llm_url(&self) -> String {
        format!("http://{}:{}", self.llm.host, self.llm.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
[omniparser]
host = "127.0.0.1"
port = 8000
timeout_secs = 30

[llm]
host = "127.0.0.1"
port = 11434
model = "llama3.2"
max_tokens = 400
temperature = 0.1
timeout_secs = 60

[agent]
max_steps = 5
settle_delay_ms = 1000
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.omniparser.port, 8000);
        assert_eq!(config.llm.model, "llama3.2");
        assert_eq!(config.agent.max_steps, 5);
        assert_eq!(config.omniparser_url(), "http://127.0.0.1:8000");
        assert_eq!(config.llm_url(), "http://127.0.0.1:11434");
    }

    #[test]
    fn test_default_minimal() {
        let config = Config::default_minimal();
        assert_eq!(config.omniparser.port, 8000);
        assert_eq!(config.llm.port, 11434);
        assert_eq!(config.agent.max_steps, 5);
    }
}
