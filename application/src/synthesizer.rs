use crate::prompts::{context_block, context_qa_prompt, InstructionTemplate};
use crate::response_stream::{ResponseStream, StreamEvent};
use anyhow::Context;
use domain::models::{GenerationRequest, ModelSettings, PassageNode, Query};
use domain::ports::{FragmentStream, TextGenerator};
use futures::StreamExt;
use shared::types::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub struct ResponseSynthesizer<G> {
    generator: Arc<G>,
    settings: ModelSettings,
    stream_buffer: usize,
}

impl<G: TextGenerator> ResponseSynthesizer<G> {
    pub fn new(generator: Arc<G>, settings: ModelSettings, stream_buffer: usize) -> Self {
        Self {
            generator,
            settings,
            stream_buffer,
        }
    }

    /// Open the streaming completion and hand back its consumer end.
    ///
    /// Errors here mean nothing was streamed. Failures after this point arrive
    /// as `StreamEvent::Failed` on the returned stream.
    pub async fn synthesize(
        &self,
        context: &[PassageNode],
        template: &InstructionTemplate,
        query: &Query,
    ) -> Result<ResponseStream> {
        let prompt = build_prompt(context, template, query);
        let request = GenerationRequest::from_prompt(prompt, &self.settings, true);
        let fragments = self
            .generator
            .stream(&request)
            .await
            .context("opening the response stream failed")?;

        let (tx, stream) = ResponseStream::channel(self.stream_buffer);
        tokio::spawn(pump(fragments, tx));
        debug!(passages = context.len(), "response stream opened");
        Ok(stream)
    }
}

pub fn build_prompt(
    context: &[PassageNode],
    template: &InstructionTemplate,
    query: &Query,
) -> String {
    context_qa_prompt(&context_block(context), &template.render(query))
}

/// Forward backend fragments to the consumer, then exactly one terminal event.
async fn pump(mut fragments: FragmentStream, tx: mpsc::Sender<StreamEvent>) {
    let mut produced = false;
    while let Some(item) = fragments.next().await {
        match item {
            Ok(fragment) if fragment.is_empty() => continue,
            Ok(fragment) => {
                produced = true;
                if tx.send(StreamEvent::Fragment(fragment)).await.is_err() {
                    debug!("response consumer went away");
                    return;
                }
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "generation failed mid-stream");
                let _ = tx.send(StreamEvent::Failed(format!("{e:#}"))).await;
                return;
            }
        }
    }
    let terminal = if produced {
        StreamEvent::Done
    } else {
        StreamEvent::Failed("generation produced no text".to_string())
    };
    let _ = tx.send(terminal).await;
}
