pub mod config;
pub mod openai_client;
pub mod search;
pub mod sse;
pub mod vector_store;
