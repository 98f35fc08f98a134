//! Typed evaluation configuration.
//!
//! Loaded from YAML (JSON is accepted as a YAML subset). Every field has a
//! default; `validate` must pass before a run starts.

use crate::errors::EvalError;
use crate::model::ScoreWeights;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeStrategyKind {
    Lexical,
    #[default]
    FewShot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeProvider {
    #[default]
    #[serde(rename = "openai")]
    OpenAI,
    Fake,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeSettings {
    pub strategy: JudgeStrategyKind,
    pub provider: JudgeProvider,
    pub model: Option<String>,
    /// OpenAI-compatible endpoint, e.g. an internal LLM server.
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub exemplar_limit: usize,
    /// Extra judge calls after a parse failure before the item is marked failed.
    pub parse_retries: u32,
    /// Score an item lexically when the model judge is unreachable.
    pub fallback_to_lexical: bool,
    pub cache_path: Option<PathBuf>,
}

impl Default for JudgeSettings {
    fn default() -> Self {
        Self {
            strategy: JudgeStrategyKind::FewShot,
            provider: JudgeProvider::OpenAI,
            model: None,
            base_url: None,
            temperature: 0.0,
            max_tokens: 800,
            exemplar_limit: 2,
            parse_retries: 0,
            fallback_to_lexical: false,
            cache_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    pub judge: JudgeSettings,
    pub few_shot_dir: PathBuf,
    pub low_performance_threshold: f64,
    /// First N corpus items to evaluate; `None` means the whole corpus.
    pub sample_size: Option<usize>,
    pub timeout_seconds: u64,
    pub parallel: usize,
    pub weights: ScoreWeights,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            judge: JudgeSettings::default(),
            few_shot_dir: PathBuf::from("few_shot_examples"),
            low_performance_threshold: 0.7,
            sample_size: None,
            timeout_seconds: 30,
            parallel: 1,
            weights: ScoreWeights::default(),
        }
    }
}

impl EvalConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        Self::from_yaml_str(&raw)
            .with_context(|| format!("failed to parse config '{}'", path.display()))
    }

    pub fn from_yaml_str(raw: &str) -> anyhow::Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn validate(&self) -> Result<(), EvalError> {
        if self.judge.strategy == JudgeStrategyKind::FewShot
            && self.judge.provider == JudgeProvider::OpenAI
        {
            if self.judge.model.as_deref().map_or(true, |m| m.trim().is_empty()) {
                return Err(EvalError::configuration(
                    "few-shot judge requires judge.model (or OPENAI_MODEL)",
                ));
            }
            if self
                .judge
                .base_url
                .as_deref()
                .map_or(true, |u| u.trim().is_empty())
            {
                return Err(EvalError::configuration(
                    "few-shot judge requires judge.base_url (or OPENAI_BASE_URL)",
                ));
            }
        }

        let w = &self.weights;
        for (name, v) in [
            ("correctness", w.correctness),
            ("relevance", w.relevance),
            ("completeness", w.completeness),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(EvalError::configuration(format!(
                    "weights.{} must be a non-negative number, got {}",
                    name, v
                )));
            }
        }
        if (w.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(EvalError::configuration(format!(
                "weights must sum to 1.0, got {}",
                w.sum()
            )));
        }

        if !(0.0..=1.0).contains(&self.low_performance_threshold) {
            return Err(EvalError::configuration(format!(
                "low_performance_threshold must be within [0, 1], got {}",
                self.low_performance_threshold
            )));
        }
        if self.parallel == 0 {
            return Err(EvalError::configuration("parallel must be at least 1"));
        }
        if self.timeout_seconds == 0 {
            return Err(EvalError::configuration(
                "timeout_seconds must be at least 1",
            ));
        }
        if self.sample_size == Some(0) {
            return Err(EvalError::configuration(
                "sample_size must be at least 1 when set",
            ));
        }
        Ok(())
    }
}
