//! The persisted evaluation report and its writers.

pub mod console;
pub mod json;
pub mod progress;

use crate::aggregate::AggregateMetrics;
use crate::errors::ItemError;
use crate::model::{JudgmentResult, QueryType, Response};
use crate::telemetry::TelemetryStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    Judged,
    AgentFailed,
    JudgeFailed,
}

/// Everything recorded for one corpus item, judged or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub test_id: String,
    pub query_id: String,
    pub query_type: QueryType,
    pub outcome: ItemOutcome,
    pub response: Response,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judgment: Option<JudgmentResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ItemError>,
    /// Judge calls made for this item; 0 when the agent failed.
    pub judge_attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub query_id: String,
    pub overall_score: f64,
    pub correctness: f64,
    pub relevance: f64,
    pub completeness: f64,
}

impl From<&JudgmentResult> for ResultSummary {
    fn from(j: &JudgmentResult) -> Self {
        Self {
            query_id: j.query_id.clone(),
            overall_score: j.scores.overall,
            correctness: j.scores.correctness,
            relevance: j.scores.relevance,
            completeness: j.scores.completeness,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub timestamp: DateTime<Utc>,
    pub evaluator_used: String,
    pub agent_quality_level: String,
    /// Items selected for this run.
    pub total_test_cases: usize,
    #[serde(default)]
    pub sample_size: Option<usize>,
    #[serde(default)]
    pub judged: usize,
    #[serde(default)]
    pub failed: usize,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub telemetry: TelemetryStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub metadata: ReportMetadata,
    pub metrics: AggregateMetrics,
    pub results_summary: Vec<ResultSummary>,
    #[serde(default)]
    pub items: Vec<ItemRecord>,
}

impl EvaluationReport {
    pub fn failed_items(&self) -> impl Iterator<Item = &ItemRecord> {
        self.items
            .iter()
            .filter(|i| i.outcome != ItemOutcome::Judged)
    }

    pub fn has_failures(&self) -> bool {
        self.failed_items().next().is_some()
    }
}
