use serde::{Deserialize, Serialize};
use shared::utils::char_len;
use std::collections::BTreeMap;
use thiserror::Error;

/// Default upper bound on symptom text length, in characters.
pub const DEFAULT_MAX_QUERY_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("query is empty")]
    Empty,
    #[error("query is {len} characters long, the limit is {max}")]
    TooLong { len: usize, max: usize },
}

/// Validated symptom description. Never empty, never over the character limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query(String);

impl Query {
    pub fn parse(text: &str, max_chars: usize) -> Result<Self, QueryError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(QueryError::Empty);
        }
        let len = char_len(trimmed);
        if len > max_chars {
            return Err(QueryError::TooLong {
                len,
                max: max_chars,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_len(&self) -> usize {
        char_len(&self.0)
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A retrieved passage. Post-processors build new nodes rather than mutating these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassageNode {
    id: String,
    text: String,
    metadata: BTreeMap<String, String>,
    score: f32,
}

impl PassageNode {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        metadata: BTreeMap<String, String>,
        score: f32,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata,
            score,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    /// Same passage, new score.
    pub fn rescored(&self, score: f32) -> Self {
        Self {
            score,
            ..self.clone()
        }
    }
}

/// Output of the HyDE transform.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedQuery {
    pub query_str: String,
    pub hypothetical_document: String,
    /// Texts whose embeddings were averaged: the hypothetical document first, then the original.
    pub embedding_strs: Vec<String>,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Model identifier plus sampling knobs for one kind of call.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model_id: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

/// One call to the generation backend. Built per call, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub messages: Vec<ChatMessage>,
    pub model_id: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

impl GenerationRequest {
    pub fn new(messages: Vec<ChatMessage>, settings: &ModelSettings, stream: bool) -> Self {
        Self {
            messages,
            model_id: settings.model_id.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            stream,
        }
    }

    pub fn from_prompt(prompt: impl Into<String>, settings: &ModelSettings, stream: bool) -> Self {
        Self::new(vec![ChatMessage::user(prompt)], settings, stream)
    }
}
