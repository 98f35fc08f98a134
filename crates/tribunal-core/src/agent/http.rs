use super::normalize::{normalize, request_body, RequestShape, ResponseShape};
use super::Agent;
use crate::errors::{Collaborator, EvalError};
use crate::model::{Query, Response};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

pub const DEFAULT_QUERY_PATH: &str = "/api/v1/query";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub api_version: String,
}

/// Remote agent reached over HTTP.
pub struct HttpAgent {
    base_url: String,
    query_path: String,
    api_key: Option<String>,
    request_shape: RequestShape,
    response_shape: ResponseShape,
    quality_tag: String,
    client: reqwest::Client,
}

impl HttpAgent {
    pub fn new(base_url: impl Into<String>, quality_tag: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            query_path: DEFAULT_QUERY_PATH.to_string(),
            api_key: None,
            request_shape: RequestShape::default(),
            response_shape: ResponseShape::default(),
            quality_tag: quality_tag.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn with_shapes(mut self, request: RequestShape, response: ResponseShape) -> Self {
        self.request_shape = request;
        self.response_shape = response;
        self
    }

    pub fn with_query_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.query_path = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, self.query_path)
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("Authorization", format!("Bearer {}", key)),
            None => req,
        }
    }

    pub async fn health(&self) -> Result<HealthStatus, EvalError> {
        let url = format!("{}/health", self.base_url);
        let resp = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| EvalError::connectivity(Collaborator::Agent, e.to_string()))?;
        if !resp.status().is_success() {
            return Ok(HealthStatus {
                healthy: false,
                api_version: "unknown".to_string(),
            });
        }
        let body: serde_json::Value = resp.json().await.unwrap_or_default();
        Ok(HealthStatus {
            healthy: true,
            api_version: body
                .get("version")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string(),
        })
    }
}

#[async_trait]
impl Agent for HttpAgent {
    async fn process(&self, query: &Query) -> Result<Response, EvalError> {
        let body = request_body(self.request_shape, query);
        let started = Instant::now();

        let resp = self
            .authorized(self.client.post(self.endpoint()))
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| EvalError::connectivity(Collaborator::Agent, e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(EvalError::connectivity(
                Collaborator::Agent,
                format!("status {}: {}", status, text),
            ));
        }

        let raw = resp
            .text()
            .await
            .map_err(|e| EvalError::connectivity(Collaborator::Agent, e.to_string()))?;
        let elapsed = started.elapsed().as_secs_f64();
        let value: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
            EvalError::parse_with_excerpt(format!("agent returned invalid JSON: {}", e), &raw)
        })?;

        normalize(self.response_shape, &query.id, &value, elapsed)
    }

    fn quality_tag(&self) -> &str {
        &self.quality_tag
    }
}
