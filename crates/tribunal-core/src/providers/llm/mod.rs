//! Chat-completion clients used by the model-backed judge.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod fake;
pub mod openai;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
    pub cached: bool,
    #[serde(default)]
    pub meta: serde_json::Value,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// `system` messages are sent ahead of the user prompt, in order.
    async fn complete(&self, prompt: &str, system: Option<&[String]>)
        -> anyhow::Result<LlmResponse>;

    fn provider_name(&self) -> &'static str;

    fn model_name(&self) -> &str;
}
