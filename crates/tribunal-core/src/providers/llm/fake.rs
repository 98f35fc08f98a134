use super::{LlmClient, LlmResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Offline client. Returns queued replies in order, then the default reply.
pub struct FakeClient {
    model: String,
    default_reply: String,
    queue: Mutex<VecDeque<anyhow::Result<String>>>,
    calls: AtomicUsize,
}

impl FakeClient {
    pub fn new(model: String) -> Self {
        Self {
            model,
            default_reply: r#"{"correctness_score": 0.8, "relevance_score": 0.8, "completeness_score": 0.8, "reasoning": "fake judge"}"#
                .to_string(),
            queue: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_response(mut self, text: impl Into<String>) -> Self {
        self.default_reply = text.into();
        self
    }

    pub fn push_reply(&self, text: impl Into<String>) {
        self.lock_queue().push_back(Ok(text.into()));
    }

    pub fn push_error(&self, message: impl Into<String>) {
        let message: String = message.into();
        self.lock_queue().push_back(Err(anyhow::anyhow!(message)));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, VecDeque<anyhow::Result<String>>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LlmClient for FakeClient {
    async fn complete(
        &self,
        _prompt: &str,
        _system: Option<&[String]>,
    ) -> anyhow::Result<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.lock_queue().pop_front();
        let text = match next {
            Some(reply) => reply?,
            None => self.default_reply.clone(),
        };
        Ok(LlmResponse {
            text,
            provider: "fake".to_string(),
            model: self.model.clone(),
            cached: false,
            meta: serde_json::json!({}),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
