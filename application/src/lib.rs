pub mod config;
pub mod long_context;
pub mod pipeline;
pub mod postprocess;
pub mod prompts;
pub mod query_expander;
pub mod reranker;
pub mod response_stream;
pub mod synthesizer;
