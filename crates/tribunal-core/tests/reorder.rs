//! Completion order must never leak into the report.

mod common;

use common::{case, corpus, CannedAgent};
use std::sync::Arc;
use tribunal_core::engine::{RunOptions, Runner};
use tribunal_core::judge::lexical::LexicalJudge;
use tribunal_core::model::{QueryType, ScoreWeights};

fn five_items() -> tribunal_core::corpus::Corpus {
    corpus(vec![
        case("q1", "pod crashloop", QueryType::ErrorAnalysis, &["logs", "exit code"]),
        case("q2", "slow search", QueryType::Performance, &["SSD"]),
        case("q3", "rolling update", QueryType::Configuration, &["maxUnavailable"]),
        case("q4", "scale out es", QueryType::Scaling, &["shards", "replicas"]),
        case("q5", "node notready", QueryType::Troubleshooting, &["kubelet"]),
    ])
}

fn agent(delays: [u64; 5]) -> CannedAgent {
    let replies = [
        ("q1", "check pod logs and the exit code", 0.9),
        ("q2", "use SSD for slow search", 0.7),
        ("q3", "nothing useful", 0.4),
        ("q4", "add shards", 0.6),
        ("q5", "restart kubelet on the node", 0.8),
    ];
    let mut a = CannedAgent::default();
    for ((id, answer, conf), ms) in replies.into_iter().zip(delays) {
        a = a.reply(id, answer, conf).delay(id, ms);
    }
    a
}

#[tokio::test]
async fn serial_and_concurrent_runs_agree() {
    let judge = Arc::new(LexicalJudge::new(ScoreWeights::default()));

    let serial = Runner::new(Arc::new(agent([0; 5])), judge.clone(), RunOptions::default())
        .run(&five_items(), None)
        .await
        .unwrap();

    // Later items finish first.
    let concurrent = Runner::new(
        Arc::new(agent([200, 150, 100, 50, 0])),
        judge,
        RunOptions {
            parallel: 5,
            ..Default::default()
        },
    )
    .run(&five_items(), None)
    .await
    .unwrap();

    assert_eq!(serial.results_summary, concurrent.results_summary);
    assert_eq!(serial.metrics, concurrent.metrics);

    let ids: Vec<_> = concurrent
        .items
        .iter()
        .map(|i| i.query_id.as_str())
        .collect();
    assert_eq!(ids, vec!["q1", "q2", "q3", "q4", "q5"]);
}
