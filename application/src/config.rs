use domain::models::{ModelSettings, DEFAULT_MAX_QUERY_CHARS};
use infrastructure::config::{
    Config, DEFAULT_CHAT_MODEL, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_RERANK_TOP_N, DEFAULT_TOP_K,
};

pub const EXPANSION_TEMPERATURE: f32 = 0.1;
pub const RERANK_TEMPERATURE: f32 = 0.0;
pub const SYNTHESIS_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_STREAM_BUFFER: usize = 32;

/// Immutable per-process pipeline settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub top_k: usize,
    pub rerank_top_n: usize,
    pub max_query_chars: usize,
    pub expansion: ModelSettings,
    pub rerank: ModelSettings,
    pub synthesis: ModelSettings,
    /// Fragments buffered between the producer task and the consumer.
    pub stream_buffer: usize,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self::for_model(
            &config.chat_model,
            config.top_k,
            config.rerank_top_n,
            config.max_query_chars,
            Some(config.max_output_tokens),
        )
    }

    pub fn for_model(
        model_id: &str,
        top_k: usize,
        rerank_top_n: usize,
        max_query_chars: usize,
        max_output_tokens: Option<u32>,
    ) -> Self {
        let settings = |temperature: f32| ModelSettings {
            model_id: model_id.to_string(),
            temperature,
            max_tokens: max_output_tokens,
        };
        Self {
            top_k,
            rerank_top_n,
            max_query_chars,
            expansion: settings(EXPANSION_TEMPERATURE),
            rerank: settings(RERANK_TEMPERATURE),
            synthesis: settings(SYNTHESIS_TEMPERATURE),
            stream_buffer: DEFAULT_STREAM_BUFFER,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::for_model(
            DEFAULT_CHAT_MODEL,
            DEFAULT_TOP_K,
            DEFAULT_RERANK_TOP_N,
            DEFAULT_MAX_QUERY_CHARS,
            Some(DEFAULT_MAX_OUTPUT_TOKENS),
        )
    }
}
