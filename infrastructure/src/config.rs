use anyhow::{anyhow, bail, Context};
use dotenvy::dotenv;
use shared::types::Result;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo-0125";
pub const DEFAULT_EMBED_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_COLLECTION: &str = "medical-textbook";
pub const DEFAULT_INDEX: &str = "vector_index";
pub const DEFAULT_TOP_K: usize = 12;
pub const DEFAULT_RERANK_TOP_N: usize = 5;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1024;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Process-wide settings, read once at startup.
#[derive(Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub store_uri: String,
    pub openai_base_url: String,
    pub chat_model: String,
    pub embed_model: String,
    pub collection: String,
    pub index_name: String,
    pub top_k: usize,
    pub rerank_top_n: usize,
    pub max_query_chars: usize,
    pub max_output_tokens: u32,
    pub request_timeout: Duration,
}

impl Config {
    /// Read `.env` (if present) and the process environment.
    pub fn load() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{key} is not set"))
        };
        let or_default =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Self {
            openai_api_key: required("OPENAI_API_KEY")?,
            store_uri: required("DEEPSYMP_STORE_URI")?,
            openai_base_url: or_default("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            chat_model: or_default("DEEPSYMP_CHAT_MODEL", DEFAULT_CHAT_MODEL),
            embed_model: or_default("DEEPSYMP_EMBED_MODEL", DEFAULT_EMBED_MODEL),
            collection: or_default("DEEPSYMP_COLLECTION", DEFAULT_COLLECTION),
            index_name: or_default("DEEPSYMP_INDEX", DEFAULT_INDEX),
            top_k: parse_or(&lookup, "DEEPSYMP_TOP_K", DEFAULT_TOP_K)?,
            rerank_top_n: parse_or(&lookup, "DEEPSYMP_RERANK_TOP_N", DEFAULT_RERANK_TOP_N)?,
            max_query_chars: parse_or(
                &lookup,
                "DEEPSYMP_MAX_QUERY_CHARS",
                domain::models::DEFAULT_MAX_QUERY_CHARS,
            )?,
            max_output_tokens: parse_or(
                &lookup,
                "DEEPSYMP_MAX_OUTPUT_TOKENS",
                DEFAULT_MAX_OUTPUT_TOKENS,
            )?,
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "DEEPSYMP_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
        };
        config.validate()?;
        Ok(config)
    }

    /// Retrieval must return something, and the rerank must narrow it.
    fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            bail!("DEEPSYMP_TOP_K must be at least 1");
        }
        if self.rerank_top_n == 0 {
            bail!("DEEPSYMP_RERANK_TOP_N must be at least 1");
        }
        if self.rerank_top_n >= self.top_k {
            bail!(
                "DEEPSYMP_RERANK_TOP_N ({}) must be smaller than DEEPSYMP_TOP_K ({})",
                self.rerank_top_n,
                self.top_k
            );
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}

// Secrets stay out of logs and panic messages.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("openai_api_key", &"<redacted>")
            .field("store_uri", &"<redacted>")
            .field("openai_base_url", &self.openai_base_url)
            .field("chat_model", &self.chat_model)
            .field("embed_model", &self.embed_model)
            .field("collection", &self.collection)
            .field("index_name", &self.index_name)
            .field("top_k", &self.top_k)
            .field("rerank_top_n", &self.rerank_top_n)
            .field("max_query_chars", &self.max_query_chars)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
