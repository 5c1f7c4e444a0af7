use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Endpoint, credential and model id for one model role.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub api_key: String,
    pub api_base: String,
    pub model_name: String,
}

/// How job posting pages are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Headless Chrome; JavaScript-rendered pages work.
    Browser,
    /// Plain HTTP GET; only server-rendered markup.
    Http,
}

impl FromStr for FetchMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "browser" => Ok(FetchMode::Browser),
            "http" => Ok(FetchMode::Http),
            other => bail!("unknown fetch mode '{other}' (expected 'browser' or 'http')"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub fast_llm: ModelSettings,
    pub smart_llm: ModelSettings,
    pub embed_llm: ModelSettings,
    pub config_dir: PathBuf,
    pub max_retries: u32,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub fetch_mode: FetchMode,
    pub max_upload_bytes: usize,
    pub share_base_url: String,
    pub port: u16,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Config {
            fast_llm: model_settings("FAST", "llama3-8b-8192")?,
            smart_llm: model_settings("SMART", "gemini-2.5-pro")?,
            embed_llm: model_settings("EMBED", "text-embedding-ada-002")?,
            config_dir: PathBuf::from(
                std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string()),
            ),
            max_retries: parse_env("MAX_RETRIES", 3)?,
            chunk_size: parse_env("CHUNK_SIZE", 2000)?,
            chunk_overlap: parse_env("CHUNK_OVERLAP", 200)?,
            fetch_mode: parse_env("FETCH_MODE", FetchMode::Browser)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            share_base_url: std::env::var("SHARE_BASE_URL")
                .unwrap_or_else(|_| "https://gimmecv.creative-geek.tech".to_string()),
            port: parse_env("PORT", 8000)?,
            log_level: std::env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "info".to_string())
                .to_lowercase(),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            bail!("CHUNK_SIZE must be greater than zero");
        }
        if self.chunk_overlap >= self.chunk_size {
            bail!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                self.chunk_overlap,
                self.chunk_size
            );
        }
        Ok(())
    }
}

fn model_settings(role: &str, default_model: &str) -> Result<ModelSettings> {
    Ok(ModelSettings {
        api_key: require_env(&format!("{role}_LLM_API_KEY"))?,
        api_base: require_env(&format!("{role}_LLM_API_BASE"))?,
        model_name: std::env::var(format!("{role}_LLM_MODEL_NAME"))
            .unwrap_or_else(|_| default_model.to_string()),
    })
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} has an invalid value '{raw}': {e}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    let settings = |model: &str| ModelSettings {
        api_key: "test-key".to_string(),
        api_base: "http://localhost:9".to_string(),
        model_name: model.to_string(),
    };
    Config {
        fast_llm: settings("test-fast-model"),
        smart_llm: settings("test-smart-model"),
        embed_llm: settings("test-embed-model"),
        config_dir: PathBuf::from("config"),
        max_retries: 3,
        chunk_size: 2000,
        chunk_overlap: 200,
        fetch_mode: FetchMode::Http,
        max_upload_bytes: 1024 * 1024,
        share_base_url: "https://share.example.com".to_string(),
        port: 8000,
        log_level: "info".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_mode_parses_case_insensitively() {
        assert_eq!("Browser".parse::<FetchMode>().unwrap(), FetchMode::Browser);
        assert_eq!(" http ".parse::<FetchMode>().unwrap(), FetchMode::Http);
        assert!("selenium".parse::<FetchMode>().is_err());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let mut config = test_config();
        config.chunk_overlap = config.chunk_size;
        assert!(config.validate().is_err());

        config.chunk_overlap = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let mut config = test_config();
        config.chunk_size = 0;
        config.chunk_overlap = 0;
        assert!(config.validate().is_err());
    }
}
