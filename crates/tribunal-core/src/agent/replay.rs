//! Offline agent that serves recorded responses.

use super::normalize::{normalize, ResponseShape};
use super::Agent;
use crate::errors::{Collaborator, EvalError};
use crate::model::{Query, Response};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Recordings are JSONL: one agent wire object per line, each carrying the
/// `query_id` it answers and optionally the recorded `execution_time`.
pub struct ReplayAgent {
    recordings: HashMap<String, Value>,
    shape: ResponseShape,
    quality_tag: String,
}

impl ReplayAgent {
    pub fn load(
        path: &Path,
        shape: ResponseShape,
        quality_tag: impl Into<String>,
    ) -> Result<Self, EvalError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EvalError::configuration(format!(
                "failed to read recorded responses '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_jsonl(&raw, shape, quality_tag)
    }

    pub fn from_jsonl(
        raw: &str,
        shape: ResponseShape,
        quality_tag: impl Into<String>,
    ) -> Result<Self, EvalError> {
        let mut recordings = HashMap::new();
        for (i, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line).map_err(|e| {
                EvalError::configuration(format!("recorded response line {}: {}", i + 1, e))
            })?;
            let query_id = value
                .get("query_id")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    EvalError::configuration(format!(
                        "recorded response line {} has no 'query_id'",
                        i + 1
                    ))
                })?
                .to_string();
            if recordings.insert(query_id.clone(), value).is_some() {
                tracing::warn!(query_id = %query_id, "duplicate recording; keeping the last one");
            }
        }
        Ok(Self {
            recordings,
            shape,
            quality_tag: quality_tag.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.recordings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recordings.is_empty()
    }
}

#[async_trait]
impl Agent for ReplayAgent {
    async fn process(&self, query: &Query) -> Result<Response, EvalError> {
        let body = self.recordings.get(&query.id).ok_or_else(|| {
            EvalError::connectivity(
                Collaborator::Agent,
                format!("no recorded response for '{}'", query.id),
            )
        })?;
        let latency = body
            .get("execution_time")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        normalize(self.shape, &query.id, body, latency)
    }

    fn quality_tag(&self) -> &str {
        &self.quality_tag
    }
}
