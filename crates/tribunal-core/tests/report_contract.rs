//! Field names consumed by downstream dashboards.

mod common;

use common::{case, corpus, CannedAgent};
use std::sync::Arc;
use tribunal_core::engine::{RunOptions, Runner};
use tribunal_core::judge::lexical::LexicalJudge;
use tribunal_core::model::{QueryType, ScoreWeights};
use tribunal_core::report::console::render_summary;
use tribunal_core::report::json::{read_json, write_json};

async fn sample_report() -> tribunal_core::report::EvaluationReport {
    let corpus = corpus(vec![
        case("a", "pod pending", QueryType::Scaling, &["node capacity"]),
        case("b", "pod pending again", QueryType::Scaling, &["taints"]),
        case("c", "index slow", QueryType::Performance, &["refresh"]),
    ]);
    let agent = CannedAgent::default()
        .reply("a", "pod pending due to node capacity", 0.9)
        .reply("b", "no idea", 0.7)
        .reply("c", "tune refresh for the index", 0.2);
    Runner::new(
        Arc::new(agent),
        Arc::new(LexicalJudge::new(ScoreWeights::default())),
        RunOptions::default(),
    )
    .run(&corpus, None)
    .await
    .unwrap()
}

fn keys(v: &serde_json::Value) -> Vec<String> {
    let mut k: Vec<_> = v.as_object().unwrap().keys().cloned().collect();
    k.sort();
    k
}

#[tokio::test]
async fn serialized_report_has_contract_fields() {
    let report = sample_report().await;
    let v = serde_json::to_value(&report).unwrap();

    for field in ["timestamp", "evaluator_used", "agent_quality_level", "total_test_cases"] {
        assert!(v["metadata"].get(field).is_some(), "metadata.{}", field);
    }

    let overall = &v["metrics"]["aggregate"]["overall"];
    for field in [
        "avg_correctness", "avg_relevance", "avg_completeness", "avg_overall",
        "std_correctness", "std_relevance", "std_completeness", "std_overall",
        "min_overall", "max_overall", "p25_overall", "p50_overall", "p75_overall",
        "p90_overall", "p95_overall", "total_evaluations",
    ] {
        assert!(overall.get(field).is_some(), "overall.{}", field);
    }
    assert_eq!(
        keys(&v["metrics"]["aggregate"]["distribution"]),
        vec!["0.0-0.2", "0.2-0.4", "0.4-0.6", "0.6-0.8", "0.8-1.0"]
    );
    assert_eq!(
        keys(&v["metrics"]["by_query_type"]["scaling"]),
        vec!["avg_completeness", "avg_correctness", "avg_overall", "avg_relevance", "count"]
    );
    let ca = &v["metrics"]["confidence_analysis"];
    for field in ["correlation", "sample_size", "avg_confidence", "avg_score", "confidence_accuracy_gap"] {
        assert!(ca.get(field).is_some(), "confidence_analysis.{}", field);
    }
    let ia = &v["metrics"]["improvement_areas"];
    assert_eq!(
        keys(&ia["areas_needing_improvement"]),
        vec!["completeness", "correctness", "relevance"]
    );
    for field in ["low_performing_count", "low_performing_percentage", "most_common_issue"] {
        assert!(ia.get(field).is_some(), "improvement_areas.{}", field);
    }
    assert_eq!(
        keys(&v["results_summary"][0]),
        vec!["completeness", "correctness", "overall_score", "query_id", "relevance"]
    );
    assert_eq!(v["results_summary"][0]["query_id"], "a");
}

#[tokio::test]
async fn report_survives_disk_round_trip_and_renders() {
    let report = sample_report().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out/report.json");
    write_json(&report, &path).unwrap();
    let back = read_json(&path).unwrap();
    assert_eq!(back.results_summary, report.results_summary);
    assert_eq!(back.metadata.total_test_cases, 3);

    let text = render_summary(&back);
    assert!(text.contains("Evaluation summary"));
    assert!(text.contains("0.8-1.0"));
    assert!(text.contains("scaling"));
    assert!(text.contains("most common issue"));
}
