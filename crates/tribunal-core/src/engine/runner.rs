//! Drives a run: corpus → agent → judge → aggregator → report.

use crate::agent::{degraded_response, Agent};
use crate::aggregate::ScoreAggregator;
use crate::config::EvalConfig;
use crate::corpus::{Corpus, TestCase};
use crate::errors::{Collaborator, EvalError, ItemError};
use crate::judge::JudgeStrategy;
use crate::model::{JudgmentResult, QueryType};
use crate::report::progress::{ProgressEvent, ProgressSink};
use crate::report::{
    EvaluationReport, ItemOutcome, ItemRecord, ReportMetadata, ResultSummary,
};
use crate::telemetry::TelemetryStatus;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{timeout, Duration};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Concurrent items; 1 runs strictly in corpus order.
    pub parallel: usize,
    /// Upper bound for one agent call.
    pub agent_timeout: Duration,
    pub parse_retries: u32,
    pub low_performance_threshold: f64,
    pub sample_size: Option<usize>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            parallel: 1,
            agent_timeout: Duration::from_secs(30),
            parse_retries: 0,
            low_performance_threshold: crate::aggregate::DEFAULT_LOW_PERFORMANCE_THRESHOLD,
            sample_size: None,
        }
    }
}

impl From<&EvalConfig> for RunOptions {
    fn from(cfg: &EvalConfig) -> Self {
        Self {
            parallel: cfg.parallel.max(1),
            agent_timeout: cfg.timeout(),
            parse_retries: cfg.judge.parse_retries,
            low_performance_threshold: cfg.low_performance_threshold,
            sample_size: cfg.sample_size,
        }
    }
}

pub struct Runner {
    pub agent: Arc<dyn Agent>,
    pub judge: Arc<dyn JudgeStrategy>,
    pub options: RunOptions,
    pub telemetry: TelemetryStatus,
    cancel: CancellationToken,
}

impl Runner {
    pub fn new(agent: Arc<dyn Agent>, judge: Arc<dyn JudgeStrategy>, options: RunOptions) -> Self {
        Self {
            agent,
            judge,
            options,
            telemetry: TelemetryStatus::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryStatus) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Cancelling stops dispatch of new items; items already running finish.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Evaluate the selected corpus prefix. Items are dispatched concurrently
    /// when `parallel > 1` but the report is always in corpus order.
    pub async fn run(
        &self,
        corpus: &Corpus,
        progress: Option<ProgressSink>,
    ) -> Result<EvaluationReport, EvalError> {
        let selected = corpus.select(self.options.sample_size);
        let total = selected.len();
        tracing::info!(
            items = total,
            evaluator = self.judge.name(),
            agent = self.agent.quality_tag(),
            parallel = self.options.parallel,
            "starting evaluation run"
        );

        let (mut records, dispatched) = if self.options.parallel <= 1 {
            self.run_sequential(selected, progress.as_ref()).await?
        } else {
            self.run_concurrent(selected, progress.as_ref()).await?
        };

        if records.len() != dispatched {
            return Err(EvalError::alignment(
                dispatched,
                records.len(),
                "items lost during dispatch",
            ));
        }
        records.sort_by_key(|(idx, _)| *idx);
        let items: Vec<ItemRecord> = records.into_iter().map(|(_, r)| r).collect();
        let cancelled = dispatched < total;

        let report = self.assemble(selected, items, cancelled);
        tracing::info!(
            judged = report.metadata.judged,
            failed = report.metadata.failed,
            cancelled,
            "evaluation run finished"
        );
        Ok(report)
    }

    async fn run_sequential(
        &self,
        selected: &[TestCase],
        progress: Option<&ProgressSink>,
    ) -> Result<(Vec<(usize, ItemRecord)>, usize), EvalError> {
        let mut records = Vec::with_capacity(selected.len());
        for (idx, tc) in selected.iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::warn!(remaining = selected.len() - idx, "run cancelled");
                break;
            }
            let record = process_item(
                self.agent.clone(),
                self.judge.clone(),
                self.options.clone(),
                tc.clone(),
            )
            .await?;
            records.push((idx, record));
            if let Some(sink) = progress {
                sink(ProgressEvent {
                    done: records.len(),
                    total: selected.len(),
                });
            }
        }
        let dispatched = records.len();
        Ok((records, dispatched))
    }

    async fn run_concurrent(
        &self,
        selected: &[TestCase],
        progress: Option<&ProgressSink>,
    ) -> Result<(Vec<(usize, ItemRecord)>, usize), EvalError> {
        let total = selected.len();
        let sem = Arc::new(Semaphore::new(self.options.parallel));
        let mut join_set = JoinSet::new();
        let mut dispatched = 0;

        for (idx, tc) in selected.iter().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::warn!(remaining = total - idx, "run cancelled");
                    break;
                }
                p = sem.clone().acquire_owned() => p.map_err(|e| {
                    EvalError::alignment(total, dispatched, format!("worker pool closed: {}", e))
                })?,
            };
            let agent = self.agent.clone();
            let judge = self.judge.clone();
            let options = self.options.clone();
            let tc = tc.clone();
            join_set.spawn(async move {
                let _permit = permit;
                (idx, process_item(agent, judge, options, tc).await)
            });
            dispatched += 1;
        }

        let mut records = Vec::with_capacity(dispatched);
        let mut fatal: Option<EvalError> = None;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, Ok(record))) => {
                    records.push((idx, record));
                    if let Some(sink) = progress {
                        sink(ProgressEvent {
                            done: records.len(),
                            total,
                        });
                    }
                }
                Ok((_, Err(e))) => {
                    if fatal.is_none() {
                        fatal = Some(e);
                        join_set.abort_all();
                    }
                }
                Err(e) if e.is_cancelled() => {}
                Err(e) => {
                    tracing::error!(error = %e, "evaluation task failed");
                }
            }
        }
        if let Some(e) = fatal {
            return Err(e);
        }
        Ok((records, dispatched))
    }

    fn assemble(
        &self,
        selected: &[TestCase],
        items: Vec<ItemRecord>,
        cancelled: bool,
    ) -> EvaluationReport {
        let judgments: Vec<JudgmentResult> =
            items.iter().filter_map(|i| i.judgment.clone()).collect();

        let categories: BTreeMap<String, QueryType> = selected
            .iter()
            .map(|tc| (tc.query.id.clone(), tc.query.query_type))
            .collect();
        let confidences: BTreeMap<String, f64> = items
            .iter()
            .filter(|i| i.outcome == ItemOutcome::Judged)
            .map(|i| (i.response.id.clone(), i.response.confidence))
            .collect();

        let metrics = ScoreAggregator::new(self.options.low_performance_threshold).aggregate(
            &judgments,
            Some(&categories),
            Some(&confidences),
        );

        let judged = judgments.len();
        EvaluationReport {
            metadata: ReportMetadata {
                timestamp: chrono::Utc::now(),
                evaluator_used: self.judge.name().to_string(),
                agent_quality_level: self.agent.quality_tag().to_string(),
                total_test_cases: selected.len(),
                sample_size: self.options.sample_size,
                judged,
                failed: items.len() - judged,
                cancelled,
                telemetry: self.telemetry.clone(),
            },
            metrics,
            results_summary: judgments.iter().map(ResultSummary::from).collect(),
            items,
        }
    }
}

/// One item: agent call under timeout, then judging with parse retries.
/// Only fatal errors are returned as `Err`; everything else is recorded.
async fn process_item(
    agent: Arc<dyn Agent>,
    judge: Arc<dyn JudgeStrategy>,
    options: RunOptions,
    tc: TestCase,
) -> Result<ItemRecord, EvalError> {
    let query = &tc.query;
    let started = Instant::now();
    let called = match timeout(options.agent_timeout, agent.process(query)).await {
        Ok(res) => res,
        Err(_) => Err(EvalError::timeout(
            Collaborator::Agent,
            options.agent_timeout.as_secs(),
        )),
    };

    let record = |outcome, response, judgment, error, judge_attempts| ItemRecord {
        test_id: tc.test_id.clone(),
        query_id: query.id.clone(),
        query_type: query.query_type,
        outcome,
        response,
        judgment,
        error,
        judge_attempts,
    };

    let response = match called {
        Ok(r) => r,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            tracing::warn!(query_id = %query.id, error = %e, "agent failed; recording degraded response");
            let degraded =
                degraded_response(query, &e.to_string(), started.elapsed().as_secs_f64());
            return Ok(record(
                ItemOutcome::AgentFailed,
                degraded,
                None,
                Some(ItemError::from(&e)),
                0,
            ));
        }
    };

    if response.query_id != query.id {
        return Err(EvalError::alignment(
            1,
            0,
            format!(
                "response for '{}' answers query '{}'",
                query.id, response.query_id
            ),
        ));
    }

    if let Some(reason) = response.error.clone() {
        tracing::warn!(query_id = %query.id, reason = %reason, "agent returned a degraded response");
        let error = ItemError {
            kind: "degraded_response".to_string(),
            message: reason,
        };
        return Ok(record(
            ItemOutcome::AgentFailed,
            response,
            None,
            Some(error),
            0,
        ));
    }

    let mut attempts = 0;
    loop {
        attempts += 1;
        match judge
            .evaluate_single(query, &response, &tc.ground_truth)
            .await
        {
            Ok(judgment) => {
                return Ok(record(
                    ItemOutcome::Judged,
                    response,
                    Some(judgment),
                    None,
                    attempts,
                ))
            }
            Err(e @ EvalError::Parse { .. }) if attempts <= options.parse_retries => {
                tracing::warn!(query_id = %query.id, attempt = attempts, error = %e, "retrying judge");
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!(query_id = %query.id, error = %e, "judgment failed");
                return Ok(record(
                    ItemOutcome::JudgeFailed,
                    response,
                    None,
                    Some(ItemError::from(&e)),
                    attempts,
                ));
            }
        }
    }
}
