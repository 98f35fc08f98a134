//! Structured judge output. The model is asked for a JSON object; anything
//! before the first `{` (code fences, preamble) is ignored.

use crate::errors::EvalError;
use crate::model::clamp_unit;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct JudgeOutput {
    pub(crate) correctness: f64,
    pub(crate) relevance: f64,
    pub(crate) completeness: f64,
    pub(crate) reasoning: String,
    pub(crate) few_shot_comparison: Option<String>,
    pub(crate) missing_points: Vec<String>,
}

pub(crate) fn parse_judge_output(raw: &str) -> Result<JudgeOutput, EvalError> {
    let text = raw.trim();
    let start = text
        .find('{')
        .ok_or_else(|| EvalError::parse_with_excerpt("no JSON object in judge output", raw))?;

    let val: Value = serde_json::Deserializer::from_str(&text[start..])
        .into_iter::<Value>()
        .next()
        .ok_or_else(|| EvalError::parse_with_excerpt("no JSON object in judge output", raw))?
        .map_err(|e| EvalError::parse_with_excerpt(format!("invalid JSON: {}", e), raw))?;

    let obj = val
        .as_object()
        .ok_or_else(|| EvalError::parse_with_excerpt("judge output is not a JSON object", raw))?;

    let score = |name: &str| -> Result<f64, EvalError> {
        let key = format!("{}_score", name);
        let found = obj
            .get(&key)
            .or(obj.get(name))
            .or(val.pointer(&format!("/scores/{}", name)));
        let v = found
            .ok_or_else(|| EvalError::parse_with_excerpt(format!("missing '{}'", key), raw))?;
        let n = v.as_f64().ok_or_else(|| {
            EvalError::parse_with_excerpt(format!("'{}' is not a number", key), raw)
        })?;
        if !n.is_finite() {
            return Err(EvalError::parse_with_excerpt(
                format!("'{}' is not finite", key),
                raw,
            ));
        }
        if !(0.0..=1.0).contains(&n) {
            tracing::warn!(field = %key, value = n, "judge score out of range; clamping");
        }
        Ok(clamp_unit(n))
    };

    let correctness = score("correctness")?;
    let relevance = score("relevance")?;
    let completeness = score("completeness")?;

    let reasoning = obj
        .get("reasoning")
        .and_then(Value::as_str)
        .ok_or_else(|| EvalError::parse_with_excerpt("missing 'reasoning'", raw))?
        .to_string();

    let few_shot_comparison = obj
        .get("few_shot_comparison")
        .or(obj.get("comparison"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let missing_points = match obj.get("missing_points") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str().map(str::to_string).ok_or_else(|| {
                    EvalError::parse_with_excerpt("'missing_points' must hold strings", raw)
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(EvalError::parse_with_excerpt(
                "'missing_points' must be a list",
                raw,
            ))
        }
    };

    Ok(JudgeOutput {
        correctness,
        relevance,
        completeness,
        reasoning,
        few_shot_comparison,
        missing_points,
    })
}
