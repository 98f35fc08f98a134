use super::{LlmClient, LlmResponse};
use async_trait::async_trait;
use serde_json::json;

/// Client for any OpenAI-compatible `/chat/completions` endpoint, typically an
/// internally hosted model server.
pub struct OpenAIClient {
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub client: reqwest::Client,
}

impl OpenAIClient {
    pub fn new(
        model: String,
        base_url: String,
        api_key: Option<String>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            model,
            base_url,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            temperature,
            max_tokens,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, prompt: &str, system: Option<&[String]>) -> serde_json::Value {
        let mut messages = Vec::new();
        for s in system.unwrap_or_default() {
            messages.push(json!({ "role": "system", "content": s }));
        }
        messages.push(json!({ "role": "user", "content": prompt }));

        json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        })
    }
}

pub(crate) fn extract_content(body: &serde_json::Value) -> anyhow::Result<String> {
    body.pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("chat completion response missing content"))
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(
        &self,
        prompt: &str,
        system: Option<&[String]>,
    ) -> anyhow::Result<LlmResponse> {
        let url = self.endpoint();
        let body = self.request_body(prompt, system);

        let mut req = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }
        let resp = req.send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            anyhow::bail!("chat API error (status {}): {}", status, error_text);
        }

        let json: serde_json::Value = resp.json().await?;
        let text = extract_content(&json)?;

        Ok(LlmResponse {
            text,
            provider: "openai".to_string(),
            model: self.model.clone(),
            cached: false,
            meta: json.get("usage").cloned().unwrap_or_else(|| json!({})),
        })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpenAIClient {
        OpenAIClient::new(
            "internal-70b".into(),
            "http://10.0.1.100:8000/v1/".into(),
            Some("  ".into()),
            0.0,
            800,
        )
    }

    #[test]
    fn endpoint_joins_base_url_once() {
        assert_eq!(
            client().endpoint(),
            "http://10.0.1.100:8000/v1/chat/completions"
        );
    }

    #[test]
    fn blank_api_key_is_dropped() {
        assert!(client().api_key.is_none());
    }

    #[test]
    fn system_messages_precede_prompt() {
        let body = client().request_body("judge this", Some(&["be strict".to_string()]));
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "judge this");
        assert_eq!(body["max_tokens"], 800);
    }

    #[test]
    fn extracts_first_choice_content() {
        let body = json!({"choices": [{"message": {"content": "{\"correctness_score\": 0.5}"}}]});
        assert_eq!(
            extract_content(&body).unwrap(),
            "{\"correctness_score\": 0.5}"
        );
        assert!(extract_content(&json!({"choices": []})).is_err());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        let c = OpenAIClient::new("m".into(), "http://127.0.0.1:9".into(), None, 0.0, 8);
        assert!(c.complete("hello", None).await.is_err());
    }

    mod http {
        use super::*;
        use wiremock::matchers::{body_partial_json, header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        const JUDGE_REPLY: &str = r#"{"correctness_score": 0.9, "relevance_score": 0.8, "completeness_score": 0.7, "reasoning": "ok"}"#;

        fn against(server: &MockServer, api_key: Option<&str>) -> OpenAIClient {
            OpenAIClient::new(
                "internal-70b".into(),
                format!("{}/v1", server.uri()),
                api_key.map(str::to_string),
                0.0,
                800,
            )
        }

        #[tokio::test]
        async fn reads_reply_content_and_usage() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/v1/chat/completions"))
                .and(body_partial_json(json!({ "model": "internal-70b", "max_tokens": 800 })))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "choices": [{ "message": { "role": "assistant", "content": JUDGE_REPLY } }],
                    "usage": { "prompt_tokens": 412, "completion_tokens": 38 }
                })))
                .expect(1)
                .mount(&server)
                .await;

            let resp = against(&server, None).complete("judge this", None).await.unwrap();
            assert_eq!(resp.text, JUDGE_REPLY);
            assert_eq!(resp.provider, "openai");
            assert_eq!(resp.model, "internal-70b");
            assert!(!resp.cached);
            assert_eq!(resp.meta["prompt_tokens"], 412);
        }

        #[tokio::test]
        async fn server_error_mentions_status() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/v1/chat/completions"))
                .respond_with(ResponseTemplate::new(500).set_body_string("model overloaded"))
                .mount(&server)
                .await;

            let err = against(&server, None)
                .complete("judge this", None)
                .await
                .unwrap_err()
                .to_string();
            assert!(err.contains("500"), "{err}");
            assert!(err.contains("model overloaded"), "{err}");
        }

        #[tokio::test]
        async fn sends_bearer_token() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/v1/chat/completions"))
                .and(header("authorization", "Bearer sk-internal"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "choices": [{ "message": { "content": JUDGE_REPLY } }]
                })))
                .expect(1)
                .mount(&server)
                .await;

            let resp = against(&server, Some("sk-internal"))
                .complete("judge this", None)
                .await
                .unwrap();
            assert_eq!(resp.meta, json!({}));
        }

        #[tokio::test]
        async fn omits_authorization_without_key() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/v1/chat/completions"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "choices": [{ "message": { "content": JUDGE_REPLY } }]
                })))
                .mount(&server)
                .await;

            against(&server, None).complete("judge this", None).await.unwrap();
            let requests = server.received_requests().await.unwrap();
            assert_eq!(requests.len(), 1);
            assert!(!requests[0].headers.contains_key("authorization"));
        }

        #[tokio::test]
        async fn reply_without_content_is_an_error() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/v1/chat/completions"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
                .mount(&server)
                .await;

            let err = against(&server, None)
                .complete("judge this", None)
                .await
                .unwrap_err();
            assert!(err.to_string().contains("missing content"));
        }
    }
}
