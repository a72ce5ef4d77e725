use application::config::PipelineConfig;
use application::long_context::LongContextReorder;
use application::postprocess::PostProcessorChain;
use application::reranker::{parse_ranking, RankGptReranker};
use domain::models::{PassageNode, Query};
use std::collections::BTreeSet;
use std::sync::Arc;
use tests::{passages, ScriptedGenerator};

const REPLIES: &[&str] = &[
    "[1] > [2] > [3]",
    "[6] > [2] > [9] > [4]",
    "[3] > [3] > [1] > [42] > [0]",
    "I would rank [2] first, then [5].",
    "[12] > [11] > [10] > [9] > [8] > [7] > [6] > [5] > [4] > [3] > [2] > [1]",
];

fn chain(reply: &str, top_n: usize) -> PostProcessorChain<ScriptedGenerator> {
    let generator = Arc::new(ScriptedGenerator::new(Vec::new()).with_ranking(Some(reply)));
    let settings = PipelineConfig::default().rerank;
    PostProcessorChain::new(RankGptReranker::new(generator, settings, top_n))
}

fn ids(nodes: &[PassageNode]) -> Vec<String> {
    nodes.iter().map(|n| n.id().to_string()).collect()
}

#[tokio::test]
async fn chain_never_grows_or_fabricates() {
    let query = Query::parse("fever and stiff neck", 1000).unwrap();
    for &reply in REPLIES {
        for count in [1, 3, 7, 12] {
            for top_n in [1, 5, 12] {
                let input = passages(count);
                let known: BTreeSet<String> = ids(&input).into_iter().collect();
                let result = chain(reply, top_n).postprocess(input, &query).await;
                if parse_ranking(reply, count).is_none() {
                    assert!(result.is_err(), "reply {reply:?} names none of {count}");
                    continue;
                }
                let out = result.unwrap();

                assert!(out.len() <= count, "reply {reply:?}, {count} in, {} out", out.len());
                assert_eq!(out.len(), count.min(top_n));
                let out_ids = ids(&out);
                let unique: BTreeSet<&String> = out_ids.iter().collect();
                assert_eq!(unique.len(), out_ids.len(), "duplicate node for {reply:?}");
                assert!(out_ids.iter().all(|id| known.contains(id)));
            }
        }
    }
}

#[tokio::test]
async fn identical_judge_output_gives_identical_context() {
    let query = Query::parse("chest pain", 1000).unwrap();
    for &reply in REPLIES {
        let a = chain(reply, 5).postprocess(passages(12), &query).await.unwrap();
        let b = chain(reply, 5).postprocess(passages(12), &query).await.unwrap();
        assert_eq!(ids(&a), ids(&b));
    }
}

#[test]
fn reorder_is_a_permutation() {
    let reorder = LongContextReorder::new();
    for count in 0..=9 {
        let input = passages(count);
        let mut before = ids(&input);
        let mut after = ids(&reorder.reorder(input));
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }
}
