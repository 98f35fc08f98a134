//! Deterministic term-overlap judge. No external calls.

use super::JudgeStrategy;
use crate::errors::EvalError;
use crate::model::{
    Feedback, GroundTruth, JudgeMethod, JudgmentResult, Query, Response, ScoreWeights, Scores,
};
use async_trait::async_trait;
use std::collections::HashSet;

/// Coverage used when a ground truth lists no key points.
const NO_KEY_POINTS_COVERAGE: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct LexicalJudge {
    weights: ScoreWeights,
}

impl LexicalJudge {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    pub(crate) fn judge(
        &self,
        query: &Query,
        response: &Response,
        ground_truth: &GroundTruth,
        method: JudgeMethod,
    ) -> JudgmentResult {
        let answer = response.answer.to_lowercase();
        let missing: Vec<String> = ground_truth
            .key_points
            .iter()
            .filter(|kp| !answer.contains(&kp.to_lowercase()))
            .cloned()
            .collect();
        let coverage = key_point_coverage(&response.answer, &ground_truth.key_points);
        let relevance = term_overlap_relevance(&query.text, &response.answer);

        let scores = Scores::weighted(coverage, relevance, coverage, &self.weights);
        let covered = ground_truth.key_points.len() - missing.len();
        let feedback = Feedback {
            reasoning: format!(
                "{}/{} key points covered; query term relevance {:.2}",
                covered,
                ground_truth.key_points.len(),
                relevance
            ),
            few_shot_comparison: None,
            missing_points: missing,
            exemplars_used: 0,
            method,
            agent_confidence: response.confidence,
            execution_time_secs: response.execution_time_secs,
            cached: false,
        };
        JudgmentResult::new(query, response, scores, feedback)
    }
}

#[async_trait]
impl JudgeStrategy for LexicalJudge {
    fn name(&self) -> &'static str {
        "lexical"
    }

    async fn evaluate_single(
        &self,
        query: &Query,
        response: &Response,
        ground_truth: &GroundTruth,
    ) -> Result<JudgmentResult, EvalError> {
        Ok(self.judge(query, response, ground_truth, JudgeMethod::Lexical))
    }
}

/// Fraction of key points found (case-insensitive substring) in `answer`.
pub fn key_point_coverage(answer: &str, key_points: &[String]) -> f64 {
    if key_points.is_empty() {
        return NO_KEY_POINTS_COVERAGE;
    }
    let answer = answer.to_lowercase();
    let covered = key_points
        .iter()
        .filter(|kp| answer.contains(&kp.to_lowercase()))
        .count();
    covered as f64 / key_points.len() as f64
}

/// `min(1, 2 * |q ∩ a| / |q|)` over lower-cased whitespace-separated terms.
pub fn term_overlap_relevance(query: &str, answer: &str) -> f64 {
    let q = terms(query);
    if q.is_empty() {
        return 0.0;
    }
    let a = terms(answer);
    let overlap = q.intersection(&a).count() as f64 / q.len() as f64;
    (2.0 * overlap).min(1.0)
}

fn terms(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}
