//! Server-sent-event decoding for OpenAI-style streaming chat completions.

use anyhow::Context;
use serde::Deserialize;
use shared::types::Result;

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Deserialize, Default)]
struct Delta {
    content: Option<String>,
}

/// Incremental decoder. Bytes arrive in arbitrary slices, possibly splitting
/// a line or a multi-byte character; only complete lines are decoded.
#[derive(Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the `[DONE]` sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed bytes and return the text deltas completed by them, in order.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>> {
        let mut fragments = Vec::new();
        if self.done {
            return Ok(fragments);
        }
        self.buffer.extend_from_slice(bytes);

        while let Some(line_end) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim();
            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let data = data.trim_start();
            if data == "[DONE]" {
                self.done = true;
                self.buffer.clear();
                break;
            }
            let chunk: StreamChunk = serde_json::from_str(data)
                .with_context(|| format!("malformed stream event: {data}"))?;
            for choice in chunk.choices {
                if let Some(content) = choice.delta.content {
                    if !content.is_empty() {
                        fragments.push(content);
                    }
                }
            }
        }
        Ok(fragments)
    }
}
