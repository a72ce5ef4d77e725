use application::config::PipelineConfig;
use application::pipeline::DiagnosisPipeline;
use application::response_stream::StreamEvent;
use domain::errors::PipelineError;
use domain::models::QueryError;
use domain::pipeline_state::{PipelineState, Stage};
use std::sync::Arc;
use tests::{passages, texts, FixedEmbedder, Scripted, ScriptedGenerator, StaticRetriever};

const SYMPTOMS: &str = "I have a red rash and joint pain";

const TEMPLATED_ANSWER: &str = "Possible diseases based on the symptoms described:
- Systemic lupus erythematosus: malar rash with joint pain
- Rheumatoid arthritis: symmetric joint pain
- Psoriatic arthritis: skin lesions with arthritis

Treatment for each disease/injury:
- Systemic lupus erythematosus: hydroxychloroquine
- Rheumatoid arthritis: methotrexate
- Psoriatic arthritis: NSAIDs

Specify whether the patient should go to a doctor or pharmacy.
See a doctor.";

type Pipeline = DiagnosisPipeline<ScriptedGenerator, FixedEmbedder, StaticRetriever>;

struct Harness {
    generator: Arc<ScriptedGenerator>,
    embedder: Arc<FixedEmbedder>,
    retriever: Arc<StaticRetriever>,
    pipeline: Pipeline,
}

fn harness(generator: ScriptedGenerator, retriever: StaticRetriever) -> Harness {
    harness_with_embedder(generator, FixedEmbedder::new(4), retriever)
}

fn harness_with_embedder(
    generator: ScriptedGenerator,
    embedder: FixedEmbedder,
    retriever: StaticRetriever,
) -> Harness {
    let generator = Arc::new(generator);
    let embedder = Arc::new(embedder);
    let retriever = Arc::new(retriever);
    let config = PipelineConfig::default();
    let pipeline = DiagnosisPipeline::new(
        &config,
        Arc::clone(&generator),
        Arc::clone(&embedder),
        Arc::clone(&retriever),
    );
    Harness {
        generator,
        embedder,
        retriever,
        pipeline,
    }
}

/// Split text into uneven chunks, some mid-word.
fn chop(text: &str, size: usize) -> Vec<Scripted> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size)
        .map(|c| Scripted::Text(c.iter().collect()))
        .collect()
}

#[tokio::test]
async fn scenario_a_streams_the_templated_diagnosis() {
    let h = harness(
        ScriptedGenerator::new(chop(TEMPLATED_ANSWER, 7)),
        StaticRetriever::new(passages(3)),
    );

    let run = h.pipeline.run(SYMPTOMS).await.unwrap();
    assert_eq!(run.state(), PipelineState::Streaming);
    let answer = run.finish().await.unwrap();

    assert_eq!(answer, TEMPLATED_ANSWER);
    let candidates: Vec<&str> = answer
        .split("\n\n")
        .next()
        .unwrap()
        .lines()
        .filter(|l| l.starts_with("- "))
        .collect();
    assert_eq!(candidates.len(), 3);

    let prompt = h.generator.last_stream_prompt().unwrap();
    assert!(prompt.contains(SYMPTOMS));
    for passage in passages(3) {
        assert!(prompt.contains(passage.text()));
    }
    assert_eq!(h.generator.stream_calls(), 1);
    assert_eq!(h.embedder.calls(), 1);
}

#[tokio::test]
async fn scenario_b_retrieval_failure_stops_before_synthesis() {
    let h = harness(
        ScriptedGenerator::new(texts(&["unused"])),
        StaticRetriever::unreachable("connection refused"),
    );

    let run = h.pipeline.run(SYMPTOMS).await.unwrap();

    assert_eq!(
        run.state(),
        PipelineState::Failed {
            stage: Stage::Retrieving
        }
    );
    assert!(matches!(run.error(), Some(PipelineError::Retrieval(_))));
    assert!(run
        .error()
        .unwrap()
        .to_string()
        .contains("connection refused"));
    assert_eq!(
        run.transitions(),
        &[
            PipelineState::Idle,
            PipelineState::Expanding,
            PipelineState::Retrieving,
            PipelineState::Failed {
                stage: Stage::Retrieving
            },
        ]
    );
    assert_eq!(h.generator.stream_calls(), 0);
    // Only the HyDE call reached the generator; no ranking call.
    assert_eq!(h.generator.complete_calls(), 1);
}

#[tokio::test]
async fn scenario_c_visible_text_grows_fragment_by_fragment() {
    let h = harness(
        ScriptedGenerator::new(texts(&["Possible ", "diseases: ", "A, B, C"])),
        StaticRetriever::new(passages(3)),
    );

    let mut run = h.pipeline.run(SYMPTOMS).await.unwrap();
    let mut visible = Vec::new();
    let mut terminal = None;
    while let Some(event) = run.next_event().await {
        match event {
            StreamEvent::Fragment(_) => visible.push(run.accumulated().to_string()),
            other => terminal = Some(other),
        }
    }

    assert_eq!(
        visible,
        vec!["Possible ", "Possible diseases: ", "Possible diseases: A, B, C"]
    );
    assert_eq!(terminal, Some(StreamEvent::Done));
    assert_eq!(run.state(), PipelineState::Done);
    assert_eq!(
        run.transitions(),
        &[
            PipelineState::Idle,
            PipelineState::Expanding,
            PipelineState::Retrieving,
            PipelineState::PostProcessing,
            PipelineState::Synthesizing,
            PipelineState::Streaming,
            PipelineState::Done,
        ]
    );
}

#[tokio::test]
async fn scenario_d_empty_query_is_rejected_before_any_backend() {
    let h = harness(
        ScriptedGenerator::new(texts(&["unused"])),
        StaticRetriever::new(passages(3)),
    );

    for raw in ["", "   \n\t"] {
        let err = h.pipeline.run(raw).await.err().unwrap();
        assert_eq!(err, QueryError::Empty);
    }
    let too_long = "a".repeat(1001);
    assert!(matches!(
        h.pipeline.run(&too_long).await.err(),
        Some(QueryError::TooLong { len: 1001, max: 1000 })
    ));

    assert_eq!(h.generator.complete_calls(), 0);
    assert_eq!(h.generator.stream_calls(), 0);
    assert_eq!(h.embedder.calls(), 0);
    assert_eq!(h.retriever.calls(), 0);
}

#[tokio::test]
async fn empty_hypothetical_document_fails_expansion() {
    let h = harness(
        ScriptedGenerator::new(texts(&["unused"])).with_hypothetical(Some("  \n ")),
        StaticRetriever::new(passages(3)),
    );

    let run = h.pipeline.run(SYMPTOMS).await.unwrap();

    assert_eq!(
        run.state(),
        PipelineState::Failed {
            stage: Stage::Expanding
        }
    );
    assert_eq!(h.embedder.calls(), 0);
    assert_eq!(h.retriever.calls(), 0);
}

#[tokio::test]
async fn hyde_call_failure_stops_before_embedding() {
    let h = harness(
        ScriptedGenerator::new(texts(&["unused"])).with_hypothetical(None),
        StaticRetriever::new(passages(3)),
    );

    let run = h.pipeline.run(SYMPTOMS).await.unwrap();

    assert_eq!(
        run.state(),
        PipelineState::Failed {
            stage: Stage::Expanding
        }
    );
    assert!(matches!(run.error(), Some(PipelineError::Expansion(_))));
    assert_eq!(h.embedder.calls(), 0);
    assert_eq!(h.retriever.calls(), 0);
    assert_eq!(h.generator.stream_calls(), 0);
}

#[tokio::test]
async fn embedder_failure_fails_expansion() {
    let h = harness_with_embedder(
        ScriptedGenerator::new(texts(&["unused"])),
        FixedEmbedder::failing("quota exceeded"),
        StaticRetriever::new(passages(3)),
    );

    let run = h.pipeline.run(SYMPTOMS).await.unwrap();

    assert_eq!(
        run.state(),
        PipelineState::Failed {
            stage: Stage::Expanding
        }
    );
    assert!(matches!(run.error(), Some(PipelineError::Expansion(_))));
    assert_eq!(h.embedder.calls(), 1);
    assert_eq!(h.retriever.calls(), 0);
    assert_eq!(h.generator.stream_calls(), 0);
}

#[tokio::test]
async fn judge_call_failure_fails_post_processing() {
    let h = harness(
        ScriptedGenerator::new(texts(&["unused"])).with_ranking(None),
        StaticRetriever::new(passages(3)),
    );

    let run = h.pipeline.run(SYMPTOMS).await.unwrap();

    assert_eq!(
        run.state(),
        PipelineState::Failed {
            stage: Stage::PostProcessing
        }
    );
    assert!(matches!(run.error(), Some(PipelineError::Rerank(_))));
    assert_eq!(h.retriever.calls(), 1);
    assert_eq!(h.generator.complete_calls(), 2);
    assert_eq!(h.generator.stream_calls(), 0);
}

#[tokio::test]
async fn unusable_ranking_fails_post_processing() {
    let h = harness(
        ScriptedGenerator::new(texts(&["unused"])).with_ranking(Some("no idea")),
        StaticRetriever::new(passages(3)),
    );

    let run = h.pipeline.run(SYMPTOMS).await.unwrap();

    assert_eq!(
        run.state(),
        PipelineState::Failed {
            stage: Stage::PostProcessing
        }
    );
    assert!(matches!(run.error(), Some(PipelineError::Rerank(_))));
    assert_eq!(h.generator.stream_calls(), 0);
}

#[tokio::test]
async fn stream_open_failure_is_a_synthesis_failure() {
    let h = harness(
        ScriptedGenerator::new(texts(&["unused"])).with_open_stream_error("rate limited"),
        StaticRetriever::new(passages(3)),
    );

    let run = h.pipeline.run(SYMPTOMS).await.unwrap();

    assert_eq!(
        run.state(),
        PipelineState::Failed {
            stage: Stage::Synthesizing
        }
    );
    assert_eq!(run.accumulated(), "");
}

#[tokio::test]
async fn mid_stream_failure_keeps_partial_text() {
    let h = harness(
        ScriptedGenerator::new(vec![
            Scripted::Text("Possible ".into()),
            Scripted::Text("dise".into()),
            Scripted::Error("connection reset".into()),
        ]),
        StaticRetriever::new(passages(3)),
    );

    let mut run = h.pipeline.run(SYMPTOMS).await.unwrap();
    let mut events = Vec::new();
    while let Some(event) = run.next_event().await {
        events.push(event);
    }

    assert!(matches!(events.last(), Some(StreamEvent::Failed(_))));
    assert_eq!(run.accumulated(), "Possible dise");
    assert_eq!(
        run.state(),
        PipelineState::Failed {
            stage: Stage::Streaming
        }
    );
    assert!(matches!(run.error(), Some(PipelineError::Stream(_))));
}

#[tokio::test]
async fn retrieves_top_k_and_keeps_top_n_in_long_context_order() {
    let h = harness(
        ScriptedGenerator::new(texts(&["ok"]))
            .with_ranking(Some("[12] > [3] > [7] > [1] > [5] > [2]")),
        StaticRetriever::new(passages(20)),
    );

    let answer = h.pipeline.run(SYMPTOMS).await.unwrap().finish().await.unwrap();
    assert_eq!(answer, "ok");
    assert_eq!(h.retriever.last_k(), 12);

    let prompt = h.generator.last_stream_prompt().unwrap();
    let position = |id: usize| prompt.find(&format!("passage number {id}."));
    // Judged order 12, 3, 7, 1, 5; reordered to 12, 7, 5, 1, 3.
    let kept: Vec<usize> = [12, 7, 5, 1, 3].to_vec();
    let offsets: Vec<usize> = kept.iter().map(|&id| position(id).unwrap()).collect();
    assert!(offsets.windows(2).all(|w| w[0] < w[1]));
    for dropped in [2, 4, 6, 8, 9, 10, 11] {
        assert!(position(dropped).is_none(), "passage {dropped} should be cut");
    }
}

#[tokio::test]
async fn model_settings_follow_the_call_kind() {
    let h = harness(
        ScriptedGenerator::new(texts(&["ok"])),
        StaticRetriever::new(passages(3)),
    );
    h.pipeline.run(SYMPTOMS).await.unwrap().finish().await.unwrap();

    let requests = h.generator.requests();
    assert_eq!(requests.len(), 3);
    let (hyde, rank, synth) = (&requests[0], &requests[1], &requests[2]);
    assert!(!hyde.stream && !rank.stream && synth.stream);
    assert_eq!(hyde.temperature, 0.1);
    assert_eq!(rank.temperature, 0.0);
    assert_eq!(synth.temperature, 0.1);
    assert!(requests.iter().all(|r| r.model_id == "gpt-3.5-turbo-0125"));
}
