//! Per-query orchestration: expand, retrieve, post-process, synthesize, stream.

use crate::config::PipelineConfig;
use crate::postprocess::PostProcessorChain;
use crate::prompts::InstructionTemplate;
use crate::query_expander::HydeQueryExpander;
use crate::reranker::RankGptReranker;
use crate::response_stream::{ResponseStream, StreamEvent};
use crate::synthesizer::ResponseSynthesizer;
use domain::errors::PipelineError;
use domain::models::{Query, QueryError};
use domain::pipeline_state::PipelineState;
use domain::ports::{TextEmbedder, TextGenerator, VectorRetriever};
use shared::telemetry::Telemetry;
use std::sync::Arc;
use tracing::{info, warn};

/// The assembled pipeline. Holds only immutable settings and shareable
/// clients; every call to [`DiagnosisPipeline::run`] gets its own [`PipelineRun`].
pub struct DiagnosisPipeline<G, E, R> {
    config: PipelineConfig,
    expander: HydeQueryExpander<G, E>,
    retriever: Arc<R>,
    postprocessors: PostProcessorChain<G>,
    synthesizer: ResponseSynthesizer<G>,
    template: InstructionTemplate,
}

impl<G, E, R> DiagnosisPipeline<G, E, R>
where
    G: TextGenerator,
    E: TextEmbedder,
    R: VectorRetriever,
{
    pub fn new(
        config: &PipelineConfig,
        generator: Arc<G>,
        embedder: Arc<E>,
        retriever: Arc<R>,
    ) -> Self {
        let expander =
            HydeQueryExpander::new(Arc::clone(&generator), embedder, config.expansion.clone());
        let reranker = RankGptReranker::new(
            Arc::clone(&generator),
            config.rerank.clone(),
            config.rerank_top_n,
        );
        let synthesizer =
            ResponseSynthesizer::new(generator, config.synthesis.clone(), config.stream_buffer);
        Self {
            config: config.clone(),
            expander,
            retriever,
            postprocessors: PostProcessorChain::new(reranker),
            synthesizer,
            template: InstructionTemplate::default(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate raw input, then run. Invalid input never reaches a backend.
    pub async fn run(&self, raw: &str) -> Result<PipelineRun, QueryError> {
        let query = Query::parse(raw, self.config.max_query_chars)?;
        Ok(self.run_query(&query).await)
    }

    /// Drive the run up to `Streaming`, or to `Failed` at the first stage error.
    pub async fn run_query(&self, query: &Query) -> PipelineRun {
        let mut run = PipelineRun::new();
        info!(query_chars = query.char_len(), "pipeline started");
        match self.execute(&mut run, query).await {
            Ok(stream) => {
                run.stream = Some(stream);
                run.advance(PipelineState::Streaming);
            }
            Err(err) => run.fail(err),
        }
        run
    }

    async fn execute(
        &self,
        run: &mut PipelineRun,
        query: &Query,
    ) -> Result<ResponseStream, PipelineError> {
        run.advance(PipelineState::Expanding);
        let expanded = self
            .expander
            .expand(query)
            .await
            .map_err(PipelineError::Expansion)?;

        run.advance(PipelineState::Retrieving);
        let nodes = self
            .retriever
            .retrieve(&expanded.embedding, self.config.top_k)
            .await
            .map_err(PipelineError::Retrieval)?;
        info!(retrieved = nodes.len(), top_k = self.config.top_k, "passages retrieved");

        run.advance(PipelineState::PostProcessing);
        let context = self
            .postprocessors
            .postprocess(nodes, query)
            .await
            .map_err(PipelineError::Rerank)?;

        run.advance(PipelineState::Synthesizing);
        self.synthesizer
            .synthesize(&context, &self.template, query)
            .await
            .map_err(PipelineError::Synthesis)
    }
}

/// State machine for one query.
pub struct PipelineRun {
    state: PipelineState,
    transitions: Vec<PipelineState>,
    stream: Option<ResponseStream>,
    error: Option<PipelineError>,
    stage_clock: Telemetry,
    total_clock: Telemetry,
}

impl PipelineRun {
    fn new() -> Self {
        Self {
            state: PipelineState::Idle,
            transitions: vec![PipelineState::Idle],
            stream: None,
            error: None,
            stage_clock: Telemetry::new(),
            total_clock: Telemetry::new(),
        }
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert_eq!(self.state.next(), Some(next));
        info!(
            from = ?self.state,
            to = ?next,
            elapsed_ms = self.stage_clock.elapsed_ms() as u64,
            "pipeline transition"
        );
        if next == PipelineState::Done {
            info!(total_ms = self.total_clock.elapsed_ms() as u64, "pipeline done");
        }
        self.state = next;
        self.transitions.push(next);
        self.stage_clock = Telemetry::new();
    }

    fn fail(&mut self, err: PipelineError) {
        let stage = err.stage();
        warn!(stage = %stage, error = %err, "pipeline failed");
        self.state = PipelineState::Failed { stage };
        self.transitions.push(self.state);
        self.error = Some(err);
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Every state entered, starting with `Idle`.
    pub fn transitions(&self) -> &[PipelineState] {
        &self.transitions
    }

    pub fn error(&self) -> Option<&PipelineError> {
        self.error.as_ref()
    }

    /// Text streamed so far.
    pub fn accumulated(&self) -> &str {
        self.stream.as_ref().map(|s| s.accumulated()).unwrap_or("")
    }

    /// Next stream event. Moves to `Done` or `Failed` on the terminal event.
    /// `None` when the run has no stream or the stream has ended.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        let event = self.stream.as_mut()?.next_event().await?;
        match &event {
            StreamEvent::Fragment(_) => {}
            StreamEvent::Done => self.advance(PipelineState::Done),
            StreamEvent::Failed(reason) => self.fail(PipelineError::Stream(reason.clone())),
        }
        Some(event)
    }

    /// Drain the stream and return the full answer, or the run's error.
    pub async fn finish(mut self) -> Result<String, PipelineError> {
        while self.next_event().await.is_some() {}
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(self.accumulated().to_string()),
        }
    }
}
