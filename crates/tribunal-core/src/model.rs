use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Category of a troubleshooting request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    ErrorAnalysis,
    Performance,
    Configuration,
    Scaling,
    Troubleshooting,
}

impl QueryType {
    pub const ALL: [QueryType; 5] = [
        QueryType::ErrorAnalysis,
        QueryType::Performance,
        QueryType::Configuration,
        QueryType::Scaling,
        QueryType::Troubleshooting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::ErrorAnalysis => "error_analysis",
            QueryType::Performance => "performance",
            QueryType::Configuration => "configuration",
            QueryType::Scaling => "scaling",
            QueryType::Troubleshooting => "troubleshooting",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| format!("unknown query type '{}'", s))
    }
}

/// A troubleshooting request. Context keys are ordered so rendering is stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(rename = "query_id")]
    pub id: String,
    #[serde(rename = "user_query")]
    pub text: String,
    pub query_type: QueryType,
    #[serde(default)]
    pub context: BTreeMap<String, serde_json::Value>,
    #[serde(default = "Utc::now", rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Query {
    pub fn new(id: impl Into<String>, text: impl Into<String>, query_type: QueryType) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            query_type,
            context: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }
}

/// One agent answer to one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "response_id")]
    pub id: String,
    pub query_id: String,
    pub answer: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(rename = "confidence_score")]
    pub confidence: f64,
    #[serde(default)]
    pub sources: Vec<String>,
    /// Measured agent latency in seconds.
    #[serde(rename = "execution_time")]
    pub execution_time_secs: f64,
    /// Set when the agent could not produce a real answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

/// Expert-authored expected answer for a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    pub query_id: String,
    pub expected_answer: String,
    pub key_points: Vec<String>,
    #[serde(default)]
    pub acceptable_variations: Vec<String>,
}

/// The question side of an exemplar, as captured by the expert.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExemplarQuery {
    #[serde(default)]
    pub user_query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_type: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, serde_json::Value>,
}

/// A ranked expert question/answer pair used to ground the judge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exemplar {
    pub category: String,
    pub query: ExemplarQuery,
    pub expert_answer: String,
    pub expert_reasoning: String,
    pub key_points: Vec<String>,
    pub quality_score: f64,
}

/// Weights used to combine sub-scores into `overall`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub correctness: f64,
    pub relevance: f64,
    pub completeness: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            correctness: 0.4,
            relevance: 0.3,
            completeness: 0.3,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.correctness + self.relevance + self.completeness
    }
}

pub fn clamp_unit(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

/// The four judged dimensions. Construct through [`Scores::weighted`] so the
/// clamping and `overall` invariants hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    #[serde(rename = "correctness_score")]
    pub correctness: f64,
    #[serde(rename = "relevance_score")]
    pub relevance: f64,
    #[serde(rename = "completeness_score")]
    pub completeness: f64,
    #[serde(rename = "overall_score")]
    pub overall: f64,
}

impl Scores {
    pub fn weighted(
        correctness: f64,
        relevance: f64,
        completeness: f64,
        weights: &ScoreWeights,
    ) -> Self {
        let correctness = clamp_unit(correctness);
        let relevance = clamp_unit(relevance);
        let completeness = clamp_unit(completeness);
        let overall = clamp_unit(
            weights.correctness * correctness
                + weights.relevance * relevance
                + weights.completeness * completeness,
        );
        Self {
            correctness,
            relevance,
            completeness,
            overall,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeMethod {
    Lexical,
    FewShot,
    LexicalFallback,
}

impl JudgeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            JudgeMethod::Lexical => "lexical",
            JudgeMethod::FewShot => "few_shot",
            JudgeMethod::LexicalFallback => "lexical_fallback",
        }
    }
}

/// Structured judge feedback attached to every judgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub few_shot_comparison: Option<String>,
    #[serde(default)]
    pub missing_points: Vec<String>,
    #[serde(rename = "few_shot_examples_used")]
    pub exemplars_used: usize,
    pub method: JudgeMethod,
    pub agent_confidence: f64,
    #[serde(rename = "execution_time")]
    pub execution_time_secs: f64,
    #[serde(default)]
    pub cached: bool,
}

/// One judge assessment of one response against one ground truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgmentResult {
    pub evaluation_id: String,
    pub query_id: String,
    pub response_id: String,
    #[serde(flatten)]
    pub scores: Scores,
    pub feedback: Feedback,
    pub timestamp: DateTime<Utc>,
}

impl JudgmentResult {
    pub fn new(query: &Query, response: &Response, scores: Scores, feedback: Feedback) -> Self {
        Self {
            evaluation_id: uuid::Uuid::new_v4().to_string(),
            query_id: query.id.clone(),
            response_id: response.id.clone(),
            scores,
            feedback,
            timestamp: Utc::now(),
        }
    }
}
