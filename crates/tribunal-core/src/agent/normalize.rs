//! Wire-shape adapters between agent APIs and the canonical [`Response`].
//!
//! Each shape resolves fields from a fixed, ordered list of candidate keys;
//! the first key present wins.

use crate::errors::EvalError;
use crate::model::{clamp_unit, Query, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

const DEFAULT_CONFIDENCE: f64 = 0.8;
const DEFAULT_REASONING: &str = "Real-time analysis via API";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseShape {
    #[default]
    Standard,
    Simple,
    Nested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestShape {
    #[default]
    Standard,
    Simple,
    Detailed,
}

impl FromStr for ResponseShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "standard" => Ok(Self::Standard),
            "simple" => Ok(Self::Simple),
            "nested" => Ok(Self::Nested),
            other => Err(format!("unknown response shape '{}'", other)),
        }
    }
}

impl FromStr for RequestShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "standard" => Ok(Self::Standard),
            "simple" => Ok(Self::Simple),
            "detailed" => Ok(Self::Detailed),
            other => Err(format!("unknown request shape '{}'", other)),
        }
    }
}

impl fmt::Display for ResponseShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Standard => "standard",
            Self::Simple => "simple",
            Self::Nested => "nested",
        })
    }
}

pub fn request_body(shape: RequestShape, query: &Query) -> Value {
    match shape {
        RequestShape::Standard => json!({
            "query_id": query.id,
            "query": query.text,
            "query_type": query.query_type.as_str(),
            "context": query.context,
            "timestamp": query.created_at.to_rfc3339(),
        }),
        RequestShape::Simple => json!({
            "question": query.text,
            "type": query.query_type.as_str(),
        }),
        RequestShape::Detailed => json!({
            "request": {
                "id": query.id,
                "content": query.text,
                "metadata": {
                    "type": query.query_type.as_str(),
                    "context": query.context,
                }
            }
        }),
    }
}

/// Map a decoded agent body onto a [`Response`] for `query_id`.
pub fn normalize(
    shape: ResponseShape,
    query_id: &str,
    body: &Value,
    execution_time_secs: f64,
) -> Result<Response, EvalError> {
    let obj = body
        .as_object()
        .ok_or_else(|| EvalError::parse("agent response is not a JSON object"))?;

    let mut response = match shape {
        ResponseShape::Standard => Response {
            id: string_field(obj, &["response_id"]).unwrap_or_else(new_id),
            query_id: query_id.to_string(),
            answer: require_answer(obj, &["answer", "response"])?,
            reasoning: string_field(obj, &["reasoning"])
                .unwrap_or_else(|| DEFAULT_REASONING.to_string()),
            confidence: confidence_field(obj, &["confidence_score", "confidence"])?,
            sources: sources_field(obj, &["sources"])?
                .unwrap_or_else(|| vec!["agent-api".to_string()]),
            execution_time_secs,
            error: None,
        },
        ResponseShape::Simple => Response {
            id: new_id(),
            query_id: query_id.to_string(),
            answer: require_answer(obj, &["text"])?,
            reasoning: "API response".to_string(),
            confidence: DEFAULT_CONFIDENCE,
            sources: vec!["API".to_string()],
            execution_time_secs,
            error: None,
        },
        ResponseShape::Nested => {
            let data = obj
                .get("data")
                .and_then(Value::as_object)
                .ok_or_else(|| EvalError::parse("agent response has no 'data' object"))?;
            Response {
                id: string_field(data, &["id"]).unwrap_or_else(new_id),
                query_id: query_id.to_string(),
                answer: require_answer(data, &["content"])?,
                reasoning: string_field(data, &["explanation"]).unwrap_or_default(),
                confidence: confidence_field(data, &["score"])?,
                sources: sources_field(data, &["references"])?.unwrap_or_default(),
                execution_time_secs,
                error: None,
            }
        }
    };

    if response.confidence != clamp_unit(response.confidence) {
        tracing::warn!(
            query_id = %query_id,
            confidence = response.confidence,
            "agent confidence out of range; clamping"
        );
        response.confidence = clamp_unit(response.confidence);
    }
    Ok(response)
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn first<'a, 'k>(obj: &'a Map<String, Value>, keys: &[&'k str]) -> Option<(&'k str, &'a Value)> {
    keys.iter()
        .find_map(|k| obj.get(*k).filter(|v| !v.is_null()).map(|v| (*k, v)))
}

fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    first(obj, keys).map(|(_, v)| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

fn require_answer(obj: &Map<String, Value>, keys: &[&str]) -> Result<String, EvalError> {
    match first(obj, keys) {
        Some((_, Value::String(s))) => Ok(s.clone()),
        Some((k, _)) => Err(EvalError::parse(format!("'{}' is not a string", k))),
        None => Err(EvalError::parse(format!(
            "agent response has none of {:?}",
            keys
        ))),
    }
}

fn confidence_field(obj: &Map<String, Value>, keys: &[&str]) -> Result<f64, EvalError> {
    let Some((k, v)) = first(obj, keys) else {
        return Ok(DEFAULT_CONFIDENCE);
    };
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(EvalError::parse(format!("'{}' is not a number", k))),
    }
}

fn sources_field(
    obj: &Map<String, Value>,
    keys: &[&str],
) -> Result<Option<Vec<String>>, EvalError> {
    let Some((k, v)) = first(obj, keys) else {
        return Ok(None);
    };
    let items = v
        .as_array()
        .ok_or_else(|| EvalError::parse(format!("'{}' must be a list", k)))?;
    Ok(Some(
        items
            .iter()
            .map(|s| match s {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
    ))
}
