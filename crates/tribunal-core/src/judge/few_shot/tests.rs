use super::*;
use crate::model::{Exemplar, ExemplarQuery, JudgeMethod, QueryType};
use crate::providers::llm::LlmResponse;
use crate::storage::Store;

const GOOD: &str = r#"{"correctness_score": 0.9, "relevance_score": 0.8, "completeness_score": 0.5,
    "reasoning": "matches expert", "few_shot_comparison": "close to example 1",
    "missing_points": ["check heap"]}"#;

struct MockLlmClient {
    responses: std::sync::Mutex<Vec<String>>,
    prompts: std::sync::Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl MockLlmClient {
    fn new(responses: &[&str]) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            prompts: std::sync::Mutex::new(Vec::new()),
            delay: None,
        }
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(
        &self,
        prompt: &str,
        _system: Option<&[String]>,
    ) -> anyhow::Result<LlmResponse> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        let text = {
            let mut resps = self.responses.lock().unwrap();
            if resps.is_empty() {
                anyhow::bail!("No more mock responses");
            }
            resps.remove(0)
        };
        Ok(LlmResponse {
            text,
            provider: "mock".to_string(),
            model: "mock".to_string(),
            cached: false,
            meta: serde_json::Value::Null,
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

fn exemplar(answer: &str, quality: f64) -> Exemplar {
    Exemplar {
        category: "performance".into(),
        query: ExemplarQuery {
            user_query: format!("q for {}", answer),
            ..Default::default()
        },
        expert_answer: answer.into(),
        expert_reasoning: "because".into(),
        key_points: vec![],
        quality_score: quality,
    }
}

fn library() -> Arc<ExemplarLibrary> {
    Arc::new(ExemplarLibrary::from_exemplars(vec![
        exemplar("expert-a", 0.9),
        exemplar("expert-b", 0.95),
        exemplar("expert-c", 0.6),
    ]))
}

fn fixture(query_type: QueryType) -> (Query, Response, GroundTruth) {
    let query = Query::new("q1", "Search latency is 500ms", query_type);
    let response = Response {
        id: "r1".into(),
        query_id: "q1".into(),
        answer: "Use SSD volumes".into(),
        reasoning: String::new(),
        confidence: 0.85,
        sources: vec![],
        execution_time_secs: 0.4,
        error: None,
    };
    let gt = GroundTruth {
        query_id: "q1".into(),
        expected_answer: "Use SSD and tune refresh".into(),
        key_points: vec!["SSD".into(), "refresh".into()],
        acceptable_variations: vec![],
    };
    (query, response, gt)
}

fn judge(client: Arc<MockLlmClient>) -> FewShotJudge {
    FewShotJudge::new(
        library(),
        client,
        ScoreWeights::default(),
        FewShotSettings::default(),
    )
}

#[tokio::test]
async fn grounds_prompt_with_top_exemplars() {
    let client = Arc::new(MockLlmClient::new(&[GOOD]));
    let (q, r, gt) = fixture(QueryType::Performance);
    let result = judge(client.clone())
        .evaluate_single(&q, &r, &gt)
        .await
        .unwrap();

    assert_eq!(result.feedback.exemplars_used, 2);
    assert_eq!(result.feedback.method, JudgeMethod::FewShot);
    assert_eq!(result.feedback.missing_points, vec!["check heap"]);
    assert_eq!(result.feedback.agent_confidence, 0.85);
    assert!((result.scores.overall - (0.4 * 0.9 + 0.3 * 0.8 + 0.3 * 0.5)).abs() < 1e-9);

    let prompt = client.prompts.lock().unwrap()[0].clone();
    let b = prompt.find("expert-b").unwrap();
    let a = prompt.find("expert-a").unwrap();
    assert!(b < a);
    assert!(!prompt.contains("expert-c"));
}

#[tokio::test]
async fn unknown_category_runs_without_exemplars() {
    let client = Arc::new(MockLlmClient::new(&[GOOD]));
    let (q, r, gt) = fixture(QueryType::Scaling);
    let result = judge(client).evaluate_single(&q, &r, &gt).await.unwrap();
    assert_eq!(result.feedback.exemplars_used, 0);
}

#[tokio::test]
async fn malformed_output_is_a_parse_error() {
    let client = Arc::new(MockLlmClient::new(&["I think it's about 7/10"]));
    let (q, r, gt) = fixture(QueryType::Performance);
    let err = judge(client).evaluate_single(&q, &r, &gt).await.unwrap_err();
    assert_eq!(err.kind(), "parse_error");
}

#[tokio::test]
async fn unreachable_model_is_connectivity_error() {
    let client = Arc::new(MockLlmClient::new(&[]));
    let (q, r, gt) = fixture(QueryType::Performance);
    let err = judge(client).evaluate_single(&q, &r, &gt).await.unwrap_err();
    assert!(matches!(
        err,
        EvalError::Connectivity {
            collaborator: crate::errors::Collaborator::Judge,
            ..
        }
    ));
}

#[tokio::test]
async fn slow_model_times_out_and_falls_back_when_enabled() {
    let mut mock = MockLlmClient::new(&[GOOD]);
    mock.delay = Some(Duration::from_millis(500));
    let client = Arc::new(mock);
    let settings = FewShotSettings {
        timeout: Duration::from_millis(20),
        ..Default::default()
    };
    let (q, r, gt) = fixture(QueryType::Performance);

    let strict = FewShotJudge::new(library(), client.clone(), ScoreWeights::default(), settings.clone());
    let err = strict.evaluate_single(&q, &r, &gt).await.unwrap_err();
    assert_eq!(err.kind(), "connectivity_error");

    let lenient = FewShotJudge::new(library(), client, ScoreWeights::default(), settings)
        .with_lexical_fallback();
    let result = lenient.evaluate_single(&q, &r, &gt).await.unwrap();
    assert_eq!(result.feedback.method, JudgeMethod::LexicalFallback);
    assert_eq!(result.scores.correctness, 0.5);
}

#[tokio::test]
async fn cache_serves_repeat_prompts_and_skips_failures() {
    let store = Store::memory().unwrap();
    store.init_schema().unwrap();
    let client = Arc::new(MockLlmClient::new(&["not json", GOOD, "unused"]));
    let judge = judge(client.clone()).with_cache(JudgeCache::new(store));
    let (q, r, gt) = fixture(QueryType::Performance);

    assert!(judge.evaluate_single(&q, &r, &gt).await.is_err());
    let first = judge.evaluate_single(&q, &r, &gt).await.unwrap();
    assert!(!first.feedback.cached);
    let second = judge.evaluate_single(&q, &r, &gt).await.unwrap();
    assert!(second.feedback.cached);
    assert_eq!(second.scores, first.scores);
    assert_eq!(client.calls(), 2);
}

#[tokio::test]
async fn works_with_fake_client() {
    let client = Arc::new(crate::providers::llm::fake::FakeClient::new("fake".into()));
    let judge = FewShotJudge::new(
        library(),
        client,
        ScoreWeights::default(),
        FewShotSettings::default(),
    );
    let (q, r, gt) = fixture(QueryType::Performance);
    let result = judge.evaluate_single(&q, &r, &gt).await.unwrap();
    assert!((result.scores.overall - 0.8).abs() < 1e-9);
}
