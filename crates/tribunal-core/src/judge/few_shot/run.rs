use super::parse::{parse_judge_output, JudgeOutput};
use super::FewShotJudge;
use crate::errors::{Collaborator, EvalError};
use crate::judge::prompt::{render_judge_prompt, PromptInput, SYSTEM_PROMPT};
use crate::model::{
    Feedback, GroundTruth, JudgeMethod, JudgmentResult, Query, Response, Scores,
};
use crate::storage::JudgeCache;

pub(crate) async fn evaluate_impl(
    judge: &FewShotJudge,
    query: &Query,
    response: &Response,
    ground_truth: &GroundTruth,
) -> Result<JudgmentResult, EvalError> {
    let exemplars = judge
        .library
        .get_top(query.query_type.as_str(), judge.settings.exemplar_limit);
    let prompt = render_judge_prompt(&PromptInput {
        query,
        answer: &response.answer,
        ground_truth,
        exemplars: &exemplars,
    });
    let exemplars_used = exemplars.len();

    let cache_key = JudgeCache::key(
        judge.client.provider_name(),
        judge.client.model_name(),
        judge.settings.temperature,
        judge.settings.max_tokens,
        &prompt,
    );

    if let Some(cached) = lookup_cache(judge, &cache_key) {
        match parse_judge_output(&cached) {
            Ok(out) => {
                tracing::debug!(query_id = %query.id, "judge cache hit");
                return Ok(build(judge, query, response, out, exemplars_used, true));
            }
            Err(e) => {
                tracing::warn!(query_id = %query.id, error = %e, "ignoring unparseable cache entry");
            }
        }
    }

    let raw = match call_model(judge, &prompt).await {
        Ok(raw) => raw,
        Err(e) => {
            if let Some(lexical) = &judge.fallback {
                tracing::warn!(
                    query_id = %query.id,
                    error = %e,
                    "judge unavailable; scoring lexically"
                );
                return Ok(lexical.judge(
                    query,
                    response,
                    ground_truth,
                    JudgeMethod::LexicalFallback,
                ));
            }
            return Err(e);
        }
    };

    let out = parse_judge_output(&raw).inspect_err(|e| {
        tracing::warn!(query_id = %query.id, error = %e, "judge output did not parse");
    })?;

    if let Some(cache) = &judge.cache {
        if let Err(e) = cache.put(
            &cache_key,
            judge.client.provider_name(),
            judge.client.model_name(),
            &raw,
        ) {
            tracing::warn!(error = %e, "failed to write judge cache");
        }
    }

    Ok(build(judge, query, response, out, exemplars_used, false))
}

fn lookup_cache(judge: &FewShotJudge, key: &str) -> Option<String> {
    let cache = judge.cache.as_ref()?;
    match cache.get(key) {
        Ok(hit) => hit,
        Err(e) => {
            tracing::warn!(error = %e, "judge cache read failed");
            None
        }
    }
}

async fn call_model(judge: &FewShotJudge, prompt: &str) -> Result<String, EvalError> {
    let system = [SYSTEM_PROMPT.to_string()];
    let call = judge.client.complete(prompt, Some(&system));
    match tokio::time::timeout(judge.settings.timeout, call).await {
        Ok(Ok(resp)) => Ok(resp.text),
        Ok(Err(e)) => Err(EvalError::connectivity(Collaborator::Judge, e.to_string())),
        Err(_) => Err(EvalError::timeout(
            Collaborator::Judge,
            judge.settings.timeout.as_secs(),
        )),
    }
}

fn build(
    judge: &FewShotJudge,
    query: &Query,
    response: &Response,
    out: JudgeOutput,
    exemplars_used: usize,
    cached: bool,
) -> JudgmentResult {
    let scores = Scores::weighted(
        out.correctness,
        out.relevance,
        out.completeness,
        &judge.weights,
    );
    let feedback = Feedback {
        reasoning: out.reasoning,
        few_shot_comparison: out.few_shot_comparison,
        missing_points: out.missing_points,
        exemplars_used,
        method: JudgeMethod::FewShot,
        agent_confidence: response.confidence,
        execution_time_secs: response.execution_time_secs,
        cached,
    };
    JudgmentResult::new(query, response, scores, feedback)
}
