use application::config::PipelineConfig;
use application::pipeline::DiagnosisPipeline;
use domain::pipeline_state::{PipelineState, Stage};
use infrastructure::vector_store::{SqliteVectorStore, StoredPassage};
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::tempdir;
use tests::{texts, FixedEmbedder, ScriptedGenerator};

fn source(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("source".to_string(), name.to_string())])
}

#[tokio::test]
async fn pipeline_reads_context_from_the_sqlite_store() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.db");
    let store = SqliteVectorStore::create(path, "medical-textbook", "vector_index", 4).unwrap();
    let passage = |text: &str, chapter: &str, vector: [f32; 4]| {
        StoredPassage::new(text, source(chapter), vector.to_vec())
    };
    store
        .upsert_passages(&[
            passage("Lupus: malar rash and arthralgia.", "rheum", [1.0, 0.1, 0.0, 0.0]),
            passage("Gout: acute monoarthritis.", "rheum", [0.2, 1.0, 0.0, 0.0]),
            passage("Epiglottitis: drooling, stridor.", "ent", [0.0, 0.0, 1.0, 0.0]),
        ])
        .unwrap();
    store.ping().unwrap();

    let generator = Arc::new(
        ScriptedGenerator::new(texts(&["Possible diseases: ", "lupus"]))
            .with_ranking(Some("[1] > [2] > [3]")),
    );
    let pipeline = DiagnosisPipeline::new(
        &PipelineConfig::default(),
        Arc::clone(&generator),
        Arc::new(FixedEmbedder::new(4)),
        Arc::new(store),
    );

    let answer = pipeline
        .run("red rash on cheeks, painful joints")
        .await
        .unwrap()
        .finish()
        .await
        .unwrap();
    assert_eq!(answer, "Possible diseases: lupus");

    let prompt = generator.last_stream_prompt().unwrap();
    // Best match first after reordering.
    let lupus = prompt.find("Lupus: malar rash").unwrap();
    let gout = prompt.find("Gout: acute").unwrap();
    assert!(lupus < gout);
    assert!(prompt.contains("source: rheum"));
}

#[tokio::test]
async fn missing_index_fails_at_retrieval() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.db");
    drop(SqliteVectorStore::create(&path, "medical-textbook", "vector_index", 4).unwrap());
    let store =
        SqliteVectorStore::connect(&path.display().to_string(), "medical-textbook", "other_index")
            .unwrap();

    let generator = Arc::new(ScriptedGenerator::new(texts(&["unused"])));
    let pipeline = DiagnosisPipeline::new(
        &PipelineConfig::default(),
        Arc::clone(&generator),
        Arc::new(FixedEmbedder::new(4)),
        Arc::new(store),
    );

    let run = pipeline.run("sore throat").await.unwrap();
    assert_eq!(
        run.state(),
        PipelineState::Failed {
            stage: Stage::Retrieving
        }
    );
    assert!(run.error().unwrap().to_string().contains("other_index"));
    assert_eq!(generator.stream_calls(), 0);
}
