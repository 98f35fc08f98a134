use crate::errors::EvalError;
use crate::model::{GroundTruth, Query, QueryType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// A query paired with its expert ground truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default)]
    pub test_id: String,
    pub query: Query,
    pub ground_truth: GroundTruth,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    #[serde(default)]
    pub dataset_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub test_cases: Vec<TestCase>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl Corpus {
    pub fn new(test_cases: Vec<TestCase>) -> Result<Self, EvalError> {
        let corpus = Self {
            dataset_id: String::new(),
            name: String::new(),
            description: String::new(),
            version: default_version(),
            test_cases,
        };
        corpus.check()?;
        Ok(corpus)
    }

    pub fn load(path: &Path) -> Result<Self, EvalError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EvalError::corpus(format!("failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_yaml_str(&raw)
            .map_err(|e| EvalError::corpus(format!("{} ({})", e, path.display())))
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, EvalError> {
        let mut corpus: Corpus = serde_yaml::from_str(raw)
            .map_err(|e| EvalError::corpus(format!("invalid corpus document: {}", e)))?;
        for tc in corpus.test_cases.iter_mut() {
            if tc.test_id.is_empty() {
                tc.test_id = tc.query.id.clone();
            }
        }
        corpus.check()?;
        Ok(corpus)
    }

    fn check(&self) -> Result<(), EvalError> {
        let mut seen = HashSet::new();
        for tc in &self.test_cases {
            if tc.ground_truth.query_id != tc.query.id {
                return Err(EvalError::corpus(format!(
                    "ground truth for '{}' references query '{}'",
                    tc.query.id, tc.ground_truth.query_id
                )));
            }
            if !seen.insert(tc.query.id.as_str()) {
                return Err(EvalError::corpus(format!(
                    "duplicate query id '{}'",
                    tc.query.id
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.test_cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.test_cases.is_empty()
    }

    /// First `sample_size` cases in corpus order; `None` selects everything.
    pub fn select(&self, sample_size: Option<usize>) -> &[TestCase] {
        let n = sample_size
            .unwrap_or(self.test_cases.len())
            .min(self.test_cases.len());
        &self.test_cases[..n]
    }

    pub fn query_types(&self) -> BTreeMap<String, QueryType> {
        self.test_cases
            .iter()
            .map(|tc| (tc.query.id.clone(), tc.query.query_type))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORPUS: &str = r#"
dataset_id: k8s-eval
name: K8s troubleshooting
description: fixture
test_cases:
  - query:
      query_id: tc_001
      user_query: "My pod is in CrashLoopBackOff with OOMKilled"
      query_type: error_analysis
      context:
        error: OOMKilled
    ground_truth:
      query_id: tc_001
      expected_answer: "Increase memory limits"
      key_points: ["Increase memory limits", "Check current resource usage"]
  - query:
      query_id: tc_002
      user_query: "Search latency is 500ms"
      query_type: performance
    ground_truth:
      query_id: tc_002
      expected_answer: "Use SSD volumes"
      key_points: ["SSD"]
  - query:
      query_id: tc_003
      user_query: "Rolling update with zero downtime"
      query_type: configuration
    ground_truth:
      query_id: tc_003
      expected_answer: "maxUnavailable 0"
      key_points: []
"#;

    #[test]
    fn loads_and_defaults_test_ids() {
        let corpus = Corpus::from_yaml_str(CORPUS).unwrap();
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.version, "1.0.0");
        assert_eq!(corpus.test_cases[0].test_id, "tc_001");
        assert_eq!(
            corpus.test_cases[0].query.context["error"],
            serde_json::json!("OOMKilled")
        );
    }

    #[test]
    fn select_takes_prefix_in_corpus_order() {
        let corpus = Corpus::from_yaml_str(CORPUS).unwrap();
        let ids: Vec<_> = corpus
            .select(Some(2))
            .iter()
            .map(|tc| tc.query.id.as_str())
            .collect();
        assert_eq!(ids, vec!["tc_001", "tc_002"]);
        assert_eq!(corpus.select(None).len(), 3);
        assert_eq!(corpus.select(Some(10)).len(), 3);
    }

    #[test]
    fn mismatched_ground_truth_is_rejected() {
        let bad = CORPUS.replacen("query_id: tc_002\n      expected", "query_id: tc_009\n      expected", 1);
        let err = Corpus::from_yaml_str(&bad).unwrap_err();
        assert_eq!(err.kind(), "corpus_error");
        assert!(err.to_string().contains("tc_009"));
    }

    #[test]
    fn duplicate_query_ids_are_rejected() {
        let q = Query::new("a", "text", QueryType::Scaling);
        let gt = GroundTruth {
            query_id: "a".into(),
            expected_answer: String::new(),
            key_points: vec![],
            acceptable_variations: vec![],
        };
        let tc = TestCase {
            test_id: "a".into(),
            query: q,
            ground_truth: gt,
            metadata: BTreeMap::new(),
        };
        let err = Corpus::new(vec![tc.clone(), tc]).unwrap_err();
        assert!(err.to_string().contains("duplicate query id 'a'"));
    }
}
