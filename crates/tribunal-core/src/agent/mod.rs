//! Agent collaborator: the system under evaluation.

pub mod http;
pub mod normalize;
pub mod replay;

use crate::errors::EvalError;
use crate::model::{Query, Response};
use async_trait::async_trait;

pub use normalize::{RequestShape, ResponseShape};

#[async_trait]
pub trait Agent: Send + Sync {
    /// Answer one query. Must report measured latency and a confidence.
    async fn process(&self, query: &Query) -> Result<Response, EvalError>;

    /// Opaque label for the agent configuration under evaluation.
    fn quality_tag(&self) -> &str;
}

/// Placeholder response recorded when the agent could not answer.
pub fn degraded_response(query: &Query, reason: &str, latency_secs: f64) -> Response {
    Response {
        id: uuid::Uuid::new_v4().to_string(),
        query_id: query.id.clone(),
        answer: String::new(),
        reasoning: format!("agent failed: {}", reason),
        confidence: 0.0,
        sources: vec!["error".to_string()],
        execution_time_secs: latency_secs,
        error: Some(reason.to_string()),
    }
}
