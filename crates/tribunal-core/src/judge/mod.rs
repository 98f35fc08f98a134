//! Judge strategies: score one agent response against its ground truth.
//!
//! Two interchangeable variants implement [`JudgeStrategy`]: the offline
//! [`lexical::LexicalJudge`] and the model-backed [`few_shot::FewShotJudge`].
//! Exactly one is configured per run.

pub mod few_shot;
pub mod lexical;
pub mod prompt;

use crate::errors::EvalError;
use crate::model::{GroundTruth, JudgmentResult, Query, Response};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Simple means over a set of judgments, for quick checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickMetrics {
    pub avg_correctness: f64,
    pub avg_relevance: f64,
    pub avg_completeness: f64,
    pub avg_overall: f64,
    pub total_evaluations: usize,
    pub evaluation_method: String,
}

#[async_trait]
pub trait JudgeStrategy: Send + Sync {
    /// Stable identifier recorded as `evaluator_used` in reports.
    fn name(&self) -> &'static str;

    async fn evaluate_single(
        &self,
        query: &Query,
        response: &Response,
        ground_truth: &GroundTruth,
    ) -> Result<JudgmentResult, EvalError>;

    /// Judge pre-collected responses, pairing them with queries by position.
    /// Stops at the first error.
    async fn evaluate_batch(
        &self,
        cases: &[(Query, GroundTruth)],
        responses: &[Response],
    ) -> Result<Vec<JudgmentResult>, EvalError> {
        if cases.len() != responses.len() {
            return Err(EvalError::alignment(
                cases.len(),
                responses.len(),
                "batch response count differs from query count",
            ));
        }
        let mut out = Vec::with_capacity(cases.len());
        for ((query, gt), response) in cases.iter().zip(responses) {
            out.push(self.evaluate_single(query, response, gt).await?);
        }
        Ok(out)
    }

    /// `None` when there is nothing to summarize.
    fn calculate_metrics(&self, results: &[JudgmentResult]) -> Option<QuickMetrics> {
        if results.is_empty() {
            return None;
        }
        let n = results.len() as f64;
        let mean = |f: fn(&JudgmentResult) -> f64| results.iter().map(f).sum::<f64>() / n;
        Some(QuickMetrics {
            avg_correctness: mean(|r| r.scores.correctness),
            avg_relevance: mean(|r| r.scores.relevance),
            avg_completeness: mean(|r| r.scores.completeness),
            avg_overall: mean(|r| r.scores.overall),
            total_evaluations: results.len(),
            evaluation_method: self.name().to_string(),
        })
    }
}
