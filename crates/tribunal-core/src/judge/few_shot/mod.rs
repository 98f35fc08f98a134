//! Model-backed judge grounded with ranked expert exemplars.

mod parse;
mod run;

use super::lexical::LexicalJudge;
use super::JudgeStrategy;
use crate::errors::EvalError;
use crate::exemplars::ExemplarLibrary;
use crate::model::{GroundTruth, JudgmentResult, Query, Response, ScoreWeights};
use crate::providers::llm::LlmClient;
use crate::storage::JudgeCache;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct FewShotSettings {
    pub exemplar_limit: usize,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Upper bound for one model call.
    pub timeout: Duration,
}

impl Default for FewShotSettings {
    fn default() -> Self {
        Self {
            exemplar_limit: 2,
            temperature: 0.0,
            max_tokens: 800,
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct FewShotJudge {
    settings: FewShotSettings,
    weights: ScoreWeights,
    library: Arc<ExemplarLibrary>,
    client: Arc<dyn LlmClient>,
    cache: Option<JudgeCache>,
    fallback: Option<LexicalJudge>,
}

impl FewShotJudge {
    pub fn new(
        library: Arc<ExemplarLibrary>,
        client: Arc<dyn LlmClient>,
        weights: ScoreWeights,
        settings: FewShotSettings,
    ) -> Self {
        Self {
            settings,
            weights,
            library,
            client,
            cache: None,
            fallback: None,
        }
    }

    pub fn with_cache(mut self, cache: JudgeCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Score lexically when the model is unreachable instead of failing the item.
    pub fn with_lexical_fallback(mut self) -> Self {
        self.fallback = Some(LexicalJudge::new(self.weights));
        self
    }
}

#[async_trait]
impl JudgeStrategy for FewShotJudge {
    fn name(&self) -> &'static str {
        "few_shot"
    }

    async fn evaluate_single(
        &self,
        query: &Query,
        response: &Response,
        ground_truth: &GroundTruth,
    ) -> Result<JudgmentResult, EvalError> {
        run::evaluate_impl(self, query, response, ground_truth).await
    }
}

#[cfg(test)]
mod tests;
