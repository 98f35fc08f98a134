//! Run-level statistics over judged items.
//!
//! Everything here is a pure function of its inputs and is recomputed from
//! scratch on every run. An empty result set yields [`AggregateMetrics::empty`].

pub mod stats;

use crate::model::{JudgmentResult, QueryType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_LOW_PERFORMANCE_THRESHOLD: f64 = 0.7;

/// Scores within this distance of a bucket edge or threshold count as on it.
pub const SCORE_EPSILON: f64 = 1e-9;

fn at_most(score: f64, edge: f64) -> bool {
    score <= edge + SCORE_EPSILON
}

fn below(score: f64, threshold: f64) -> bool {
    score < threshold - SCORE_EPSILON
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
    pub avg_correctness: f64,
    pub avg_relevance: f64,
    pub avg_completeness: f64,
    pub avg_overall: f64,
    pub std_correctness: f64,
    pub std_relevance: f64,
    pub std_completeness: f64,
    pub std_overall: f64,
    pub min_overall: f64,
    pub max_overall: f64,
    pub p25_overall: f64,
    pub p50_overall: f64,
    pub p75_overall: f64,
    pub p90_overall: f64,
    pub p95_overall: f64,
    pub total_evaluations: usize,
}

/// Counts per 0.2-wide bucket of `overall`; each bucket includes its upper edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreDistribution {
    #[serde(rename = "0.0-0.2")]
    pub b0_2: usize,
    #[serde(rename = "0.2-0.4")]
    pub b2_4: usize,
    #[serde(rename = "0.4-0.6")]
    pub b4_6: usize,
    #[serde(rename = "0.6-0.8")]
    pub b6_8: usize,
    #[serde(rename = "0.8-1.0")]
    pub b8_10: usize,
}

impl ScoreDistribution {
    pub const LABELS: [&'static str; 5] = ["0.0-0.2", "0.2-0.4", "0.4-0.6", "0.6-0.8", "0.8-1.0"];

    pub fn from_scores(scores: impl IntoIterator<Item = f64>) -> Self {
        let mut d = Self::default();
        for s in scores {
            if at_most(s, 0.2) {
                d.b0_2 += 1;
            } else if at_most(s, 0.4) {
                d.b2_4 += 1;
            } else if at_most(s, 0.6) {
                d.b4_6 += 1;
            } else if at_most(s, 0.8) {
                d.b6_8 += 1;
            } else {
                d.b8_10 += 1;
            }
        }
        d
    }

    pub fn counts(&self) -> [usize; 5] {
        [self.b0_2, self.b2_4, self.b4_6, self.b6_8, self.b8_10]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateBlock {
    pub overall: OverallStats,
    pub distribution: ScoreDistribution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMetrics {
    pub avg_correctness: f64,
    pub avg_relevance: f64,
    pub avg_completeness: f64,
    pub avg_overall: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfidenceAnalysis {
    /// `None` with fewer than two pairs or zero variance.
    pub correlation: Option<f64>,
    pub sample_size: usize,
    pub avg_confidence: Option<f64>,
    pub avg_score: Option<f64>,
    pub confidence_accuracy_gap: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Correctness,
    Relevance,
    Completeness,
}

impl Dimension {
    /// Priority order used to break ties.
    pub const ALL: [Dimension; 3] = [
        Dimension::Correctness,
        Dimension::Relevance,
        Dimension::Completeness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Correctness => "correctness",
            Dimension::Relevance => "relevance",
            Dimension::Completeness => "completeness",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DimensionValues<T> {
    pub correctness: T,
    pub relevance: T,
    pub completeness: T,
}

impl<T: Copy> DimensionValues<T> {
    pub fn get(&self, d: Dimension) -> T {
        match d {
            Dimension::Correctness => self.correctness,
            Dimension::Relevance => self.relevance,
            Dimension::Completeness => self.completeness,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementAreas {
    /// Share of all judged items that are low-performing and weak in each dimension.
    pub areas_needing_improvement: DimensionValues<f64>,
    pub issue_counts: DimensionValues<usize>,
    pub low_performing_count: usize,
    pub low_performing_percentage: f64,
    pub most_common_issue: Option<Dimension>,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub aggregate: Option<AggregateBlock>,
    pub by_query_type: BTreeMap<String, CategoryMetrics>,
    pub confidence_analysis: ConfidenceAnalysis,
    pub improvement_areas: ImprovementAreas,
}

impl AggregateMetrics {
    pub fn empty(threshold: f64) -> Self {
        Self {
            aggregate: None,
            by_query_type: BTreeMap::new(),
            confidence_analysis: ConfidenceAnalysis::default(),
            improvement_areas: ImprovementAreas {
                areas_needing_improvement: DimensionValues::default(),
                issue_counts: DimensionValues::default(),
                low_performing_count: 0,
                low_performing_percentage: 0.0,
                most_common_issue: None,
                threshold,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.aggregate.is_none()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScoreAggregator {
    threshold: f64,
}

impl Default for ScoreAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_LOW_PERFORMANCE_THRESHOLD)
    }
}

impl ScoreAggregator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// `categories` maps query id → type; `confidences` maps response id →
    /// agent-reported confidence.
    pub fn aggregate(
        &self,
        results: &[JudgmentResult],
        categories: Option<&BTreeMap<String, QueryType>>,
        confidences: Option<&BTreeMap<String, f64>>,
    ) -> AggregateMetrics {
        if results.is_empty() {
            return AggregateMetrics::empty(self.threshold);
        }
        AggregateMetrics {
            aggregate: Some(aggregate_block(results)),
            by_query_type: categories
                .map(|c| by_category(results, c))
                .unwrap_or_default(),
            confidence_analysis: confidences
                .map(|c| confidence_analysis(results, c))
                .unwrap_or_default(),
            improvement_areas: improvement_areas(results, self.threshold),
        }
    }
}

fn column(results: &[JudgmentResult], f: fn(&JudgmentResult) -> f64) -> Vec<f64> {
    results.iter().map(f).collect()
}

pub fn aggregate_block(results: &[JudgmentResult]) -> AggregateBlock {
    let c = column(results, |r| r.scores.correctness);
    let r = column(results, |r| r.scores.relevance);
    let m = column(results, |r| r.scores.completeness);
    let o = column(results, |r| r.scores.overall);

    let avg = |xs: &[f64]| stats::mean(xs).unwrap_or(0.0);
    let sd = |xs: &[f64]| stats::population_std(xs).unwrap_or(0.0);
    let pct = |p: f64| stats::percentile(&o, p).unwrap_or(0.0);

    AggregateBlock {
        overall: OverallStats {
            avg_correctness: avg(&c),
            avg_relevance: avg(&r),
            avg_completeness: avg(&m),
            avg_overall: avg(&o),
            std_correctness: sd(&c),
            std_relevance: sd(&r),
            std_completeness: sd(&m),
            std_overall: sd(&o),
            min_overall: o.iter().copied().fold(f64::INFINITY, f64::min),
            max_overall: o.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            p25_overall: pct(25.0),
            p50_overall: pct(50.0),
            p75_overall: pct(75.0),
            p90_overall: pct(90.0),
            p95_overall: pct(95.0),
            total_evaluations: results.len(),
        },
        distribution: ScoreDistribution::from_scores(o.iter().copied()),
    }
}

pub fn by_category(
    results: &[JudgmentResult],
    categories: &BTreeMap<String, QueryType>,
) -> BTreeMap<String, CategoryMetrics> {
    let mut grouped: BTreeMap<&'static str, Vec<&JudgmentResult>> = BTreeMap::new();
    for r in results {
        if let Some(t) = categories.get(&r.query_id) {
            grouped.entry(t.as_str()).or_default().push(r);
        }
    }
    grouped
        .into_iter()
        .map(|(name, items)| {
            let n = items.len() as f64;
            let avg = |f: fn(&JudgmentResult) -> f64| items.iter().map(|r| f(r)).sum::<f64>() / n;
            (
                name.to_string(),
                CategoryMetrics {
                    avg_correctness: avg(|r| r.scores.correctness),
                    avg_relevance: avg(|r| r.scores.relevance),
                    avg_completeness: avg(|r| r.scores.completeness),
                    avg_overall: avg(|r| r.scores.overall),
                    count: items.len(),
                },
            )
        })
        .collect()
}

pub fn confidence_analysis(
    results: &[JudgmentResult],
    confidences: &BTreeMap<String, f64>,
) -> ConfidenceAnalysis {
    let (conf, scores): (Vec<f64>, Vec<f64>) = results
        .iter()
        .filter_map(|r| confidences.get(&r.response_id).map(|c| (*c, r.scores.overall)))
        .unzip();

    let avg_confidence = stats::mean(&conf);
    let avg_score = stats::mean(&scores);
    ConfidenceAnalysis {
        correlation: stats::pearson(&conf, &scores),
        sample_size: conf.len(),
        avg_confidence,
        avg_score,
        confidence_accuracy_gap: avg_confidence.zip(avg_score).map(|(c, s)| (c - s).abs()),
    }
}

pub fn improvement_areas(results: &[JudgmentResult], threshold: f64) -> ImprovementAreas {
    let low: Vec<&JudgmentResult> = results
        .iter()
        .filter(|r| below(r.scores.overall, threshold))
        .collect();
    let count = |f: fn(&JudgmentResult) -> f64| {
        low.iter().filter(|r| below(f(**r), threshold)).count()
    };
    let counts = DimensionValues {
        correctness: count(|r| r.scores.correctness),
        relevance: count(|r| r.scores.relevance),
        completeness: count(|r| r.scores.completeness),
    };

    let total = results.len();
    let ratio = |n: usize| if total == 0 { 0.0 } else { n as f64 / total as f64 };

    // First maximum in priority order wins.
    let most_common_issue = if low.is_empty() {
        None
    } else {
        let mut best = Dimension::ALL[0];
        for d in Dimension::ALL.into_iter().skip(1) {
            if counts.get(d) > counts.get(best) {
                best = d;
            }
        }
        Some(best)
    };

    ImprovementAreas {
        areas_needing_improvement: DimensionValues {
            correctness: ratio(counts.correctness),
            relevance: ratio(counts.relevance),
            completeness: ratio(counts.completeness),
        },
        issue_counts: counts,
        low_performing_count: low.len(),
        low_performing_percentage: ratio(low.len()) * 100.0,
        most_common_issue,
        threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Feedback, JudgeMethod, ScoreWeights, Scores};
    use chrono::Utc;

    fn judgment(id: &str, c: f64, r: f64, m: f64, overall: f64) -> JudgmentResult {
        JudgmentResult {
            evaluation_id: format!("e-{}", id),
            query_id: id.to_string(),
            response_id: format!("r-{}", id),
            scores: Scores {
                correctness: c,
                relevance: r,
                completeness: m,
                overall,
            },
            feedback: Feedback {
                reasoning: String::new(),
                few_shot_comparison: None,
                missing_points: vec![],
                exemplars_used: 0,
                method: JudgeMethod::Lexical,
                agent_confidence: 0.5,
                execution_time_secs: 0.0,
                cached: false,
            },
            timestamp: Utc::now(),
        }
    }

    fn with_overall(scores: &[f64]) -> Vec<JudgmentResult> {
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| judgment(&format!("q{}", i), *s, *s, *s, *s))
            .collect()
    }

    #[test]
    fn mean_and_distribution_for_reference_scores() {
        let results = with_overall(&[0.2, 0.5, 0.8, 0.9, 1.0]);
        let m = ScoreAggregator::default().aggregate(&results, None, None);
        let block = m.aggregate.unwrap();
        assert!((block.overall.avg_overall - 0.68).abs() < 1e-9);
        assert_eq!(block.distribution.counts(), [1, 0, 1, 1, 2]);
        assert_eq!(block.overall.total_evaluations, 5);
        assert_eq!(block.overall.min_overall, 0.2);
        assert_eq!(block.overall.max_overall, 1.0);
        assert!((block.overall.p50_overall - 0.8).abs() < 1e-9);
    }

    #[test]
    fn weighted_scores_on_an_edge_use_the_lower_bucket() {
        let s = Scores::weighted(0.9, 0.4, 0.4, &ScoreWeights::default());
        assert!((s.overall - 0.6).abs() < 1e-9);
        let d = ScoreDistribution::from_scores([s.overall]);
        assert_eq!(d.counts(), [0, 0, 1, 0, 0]);
        assert_eq!(ScoreDistribution::from_scores([0.6 + 1e-6]).b6_8, 1);
    }

    #[test]
    fn scores_at_the_threshold_are_not_low_performing() {
        let s = Scores::weighted(0.7, 0.7, 0.7, &ScoreWeights::default());
        let results = vec![
            judgment("a", s.correctness, s.relevance, s.completeness, s.overall),
            judgment("b", 0.7 - 1e-12, 0.5, 0.9, 0.7 - 1e-12),
            judgment("c", 0.6, 0.9, 0.6, 0.69),
        ];
        let ia = improvement_areas(&results, 0.7);
        assert_eq!(ia.low_performing_count, 1);
        assert_eq!(ia.issue_counts.correctness, 1);
        assert_eq!(ia.issue_counts.completeness, 1);
        assert_eq!(ia.issue_counts.relevance, 0);
    }

    #[test]
    fn bucket_edges_belong_to_lower_bucket() {
        let d = ScoreDistribution::from_scores([0.2]);
        assert_eq!(d.b0_2, 1);
        let d = ScoreDistribution::from_scores([0.8]);
        assert_eq!(d.b6_8, 1);
        let d = ScoreDistribution::from_scores([1.0, 0.0]);
        assert_eq!(d.b8_10, 1);
        assert_eq!(d.b0_2, 1);
    }

    #[test]
    fn distribution_serializes_with_range_keys() {
        let v = serde_json::to_value(ScoreDistribution::from_scores([0.5])).unwrap();
        let keys: Vec<_> = v.as_object().unwrap().keys().cloned().collect();
        let mut expected: Vec<_> = ScoreDistribution::LABELS.iter().map(|s| s.to_string()).collect();
        expected.sort();
        assert_eq!(keys, expected);
        assert_eq!(v["0.4-0.6"], 1);
    }

    #[test]
    fn empty_input_yields_empty_metrics() {
        let m = ScoreAggregator::new(0.7).aggregate(&[], None, None);
        assert!(m.is_empty());
        assert_eq!(m.confidence_analysis.sample_size, 0);
        assert_eq!(m.improvement_areas.low_performing_count, 0);
        assert_eq!(m.improvement_areas.most_common_issue, None);
    }

    #[test]
    fn confidence_needs_two_pairs() {
        let results = with_overall(&[0.4, 0.9]);
        let mut conf = BTreeMap::new();
        let m = ScoreAggregator::default().aggregate(&results, None, Some(&conf));
        assert_eq!(m.confidence_analysis.correlation, None);
        assert_eq!(m.confidence_analysis.sample_size, 0);
        assert_eq!(m.confidence_analysis.avg_confidence, None);

        conf.insert("r-q0".to_string(), 0.3);
        let m = ScoreAggregator::default().aggregate(&results, None, Some(&conf));
        assert_eq!(m.confidence_analysis.correlation, None);
        assert_eq!(m.confidence_analysis.sample_size, 1);
        assert_eq!(m.confidence_analysis.avg_confidence, Some(0.3));

        conf.insert("r-q1".to_string(), 0.8);
        let m = ScoreAggregator::default().aggregate(&results, None, Some(&conf));
        let ca = m.confidence_analysis;
        assert_eq!(ca.sample_size, 2);
        assert!((ca.correlation.unwrap() - 1.0).abs() < 1e-9);
        assert!((ca.confidence_accuracy_gap.unwrap() - (0.55f64 - 0.65).abs()).abs() < 1e-9);
    }

    #[test]
    fn per_category_excludes_unmapped_items() {
        let results = with_overall(&[0.4, 0.8, 0.6]);
        let mut cats = BTreeMap::new();
        cats.insert("q0".to_string(), QueryType::Performance);
        cats.insert("q1".to_string(), QueryType::Performance);
        let m = ScoreAggregator::default().aggregate(&results, Some(&cats), None);
        assert_eq!(m.by_query_type.len(), 1);
        let perf = &m.by_query_type["performance"];
        assert_eq!(perf.count, 2);
        assert!((perf.avg_overall - 0.6).abs() < 1e-9);
        assert_eq!(m.aggregate.unwrap().overall.total_evaluations, 3);
    }

    #[test]
    fn improvement_areas_rank_correctness_first() {
        let results = vec![
            judgment("a", 0.3, 0.5, 0.8, 0.5),
            judgment("b", 0.4, 0.9, 0.9, 0.6),
            judgment("c", 0.5, 0.9, 0.8, 0.65),
            judgment("d", 0.9, 0.9, 0.9, 0.9),
            judgment("e", 0.8, 0.8, 0.8, 0.8),
        ];
        let ia = improvement_areas(&results, 0.7);
        assert_eq!(ia.most_common_issue, Some(Dimension::Correctness));
        assert_eq!(ia.low_performing_count, 3);
        assert!((ia.low_performing_percentage - 60.0).abs() < 1e-9);
        assert_eq!(ia.issue_counts.correctness, 3);
        assert_eq!(ia.issue_counts.relevance, 1);
        assert_eq!(ia.issue_counts.completeness, 0);
        assert!((ia.areas_needing_improvement.correctness - 0.6).abs() < 1e-9);
    }

    #[test]
    fn ties_follow_priority_order() {
        let results = vec![
            judgment("a", 0.9, 0.3, 0.3, 0.5),
            judgment("b", 0.9, 0.3, 0.3, 0.5),
        ];
        assert_eq!(
            improvement_areas(&results, 0.7).most_common_issue,
            Some(Dimension::Relevance)
        );
        let results = vec![judgment("a", 0.3, 0.3, 0.3, 0.3)];
        assert_eq!(
            improvement_areas(&results, 0.7).most_common_issue,
            Some(Dimension::Correctness)
        );
    }

    #[test]
    fn no_low_performers_means_no_issue() {
        let ia = improvement_areas(&with_overall(&[0.9, 0.95]), 0.7);
        assert_eq!(ia.low_performing_count, 0);
        assert_eq!(ia.low_performing_percentage, 0.0);
        assert_eq!(ia.most_common_issue, None);
        assert_eq!(ia.areas_needing_improvement.correctness, 0.0);
    }
}
