#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tribunal_core::agent::Agent;
use tribunal_core::corpus::{Corpus, TestCase};
use tribunal_core::model::{GroundTruth, Query, QueryType, Response};
use tribunal_core::EvalError;

/// Deterministic agent: canned answer, confidence and delay per query id.
#[derive(Default)]
pub struct CannedAgent {
    pub replies: HashMap<String, (String, f64)>,
    pub delays_ms: HashMap<String, u64>,
}

impl CannedAgent {
    pub fn reply(mut self, id: &str, answer: &str, confidence: f64) -> Self {
        self.replies
            .insert(id.to_string(), (answer.to_string(), confidence));
        self
    }

    pub fn delay(mut self, id: &str, ms: u64) -> Self {
        self.delays_ms.insert(id.to_string(), ms);
        self
    }
}

#[async_trait]
impl Agent for CannedAgent {
    async fn process(&self, query: &Query) -> Result<Response, EvalError> {
        if let Some(ms) = self.delays_ms.get(&query.id) {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
        let (answer, confidence) = self
            .replies
            .get(&query.id)
            .cloned()
            .unwrap_or_else(|| (String::new(), 0.5));
        Ok(Response {
            id: format!("resp-{}", query.id),
            query_id: query.id.clone(),
            answer,
            reasoning: "canned".into(),
            confidence,
            sources: vec!["runbook".into()],
            execution_time_secs: 0.0,
            error: None,
        })
    }

    fn quality_tag(&self) -> &str {
        "canned-good"
    }
}

pub fn case(id: &str, text: &str, query_type: QueryType, key_points: &[&str]) -> TestCase {
    TestCase {
        test_id: id.to_string(),
        query: Query::new(id, text, query_type),
        ground_truth: GroundTruth {
            query_id: id.to_string(),
            expected_answer: key_points.join("; "),
            key_points: key_points.iter().map(|s| s.to_string()).collect(),
            acceptable_variations: vec![],
        },
        metadata: Default::default(),
    }
}

pub fn corpus(cases: Vec<TestCase>) -> Corpus {
    Corpus::new(cases).expect("valid corpus")
}
