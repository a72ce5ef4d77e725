use crate::config::Config;
use crate::sse::SseDecoder;
use anyhow::{anyhow, Context};
use domain::models::{ChatMessage, GenerationRequest};
use domain::ports::{FragmentStream, TextEmbedder, TextGenerator};
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::types::Result;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completions and embeddings API.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Arc<Client>,
    base_url: String,
    api_key: String,
    embed_model: String,
}

impl OpenAiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client: Arc::new(client),
            base_url: config.openai_base_url.clone(),
            api_key: config.openai_api_key.clone(),
            embed_model: config.embed_model.clone(),
        })
    }

    async fn post_chat(&self, request: &GenerationRequest) -> Result<reqwest::Response> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &request.model_id,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: request.stream,
        };
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("chat completion request failed")?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("generation API error ({status}): {text}"));
        }
        Ok(response)
    }

    pub async fn generate_response(&self, request: &GenerationRequest) -> Result<String> {
        let request = GenerationRequest {
            stream: false,
            ..request.clone()
        };
        let response = self.post_chat(&request).await?;
        let chat: ChatResponse = response
            .json()
            .await
            .context("unreadable chat completion response")?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        debug!(model = %request.model_id, chars = content.len(), "completion received");
        Ok(content)
    }

    pub async fn stream_response(&self, request: &GenerationRequest) -> Result<FragmentStream> {
        let request = GenerationRequest {
            stream: true,
            ..request.clone()
        };
        let response = self.post_chat(&request).await?;
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();
        Ok(decode_event_stream(body))
    }

    pub async fn generate_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model: &self.embed_model,
            input: texts,
        };
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("embedding request failed")?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("embedding API error ({status}): {text}"));
        }
        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .context("unreadable embedding response")?;
        if parsed.data.len() != texts.len() {
            return Err(anyhow!(
                "embedding API returned {} vectors for {} inputs",
                parsed.data.len(),
                texts.len()
            ));
        }
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

struct DecodeState {
    body: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

/// Turn a raw SSE byte stream into text fragments. A body that ends before
/// the `[DONE]` sentinel yields a trailing error instead of ending quietly.
fn decode_event_stream(body: BoxStream<'static, reqwest::Result<Vec<u8>>>) -> FragmentStream {
    let state = DecodeState {
        body,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };
    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(fragment) = state.pending.pop_front() {
                return Some((Ok(fragment), state));
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(bytes)) => match state.decoder.push(&bytes) {
                    Ok(fragments) => {
                        state.pending.extend(fragments);
                        state.finished = state.decoder.is_done();
                    }
                    Err(e) => {
                        state.finished = true;
                        return Some((Err(e), state));
                    }
                },
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(anyhow!(e).context("stream interrupted")), state));
                }
                None => {
                    state.finished = true;
                    if !state.decoder.is_done() {
                        return Some((
                            Err(anyhow!("stream closed before the completion marker")),
                            state,
                        ));
                    }
                }
            }
        }
    })
    .boxed()
}

impl TextGenerator for OpenAiClient {
    async fn complete(&self, request: &GenerationRequest) -> Result<String> {
        self.generate_response(request).await
    }

    async fn stream(&self, request: &GenerationRequest) -> Result<FragmentStream> {
        self.stream_response(request).await
    }
}

impl TextEmbedder for OpenAiClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.generate_embeddings(texts).await
    }
}
