//! Tribunal core: judges troubleshooting-agent answers against expert ground
//! truth and rolls the judgments up into run-level quality metrics.
//!
//! Pipeline: corpus → [`engine::runner::Runner`] → agent collaborator →
//! [`judge::JudgeStrategy`] (grounded with ranked exemplars from
//! [`exemplars::ExemplarLibrary`]) → [`aggregate::ScoreAggregator`] →
//! [`report::EvaluationReport`].

pub mod agent;
pub mod aggregate;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod errors;
pub mod exemplars;
pub mod judge;
pub mod model;
pub mod providers;
pub mod report;
pub mod storage;
pub mod telemetry;

pub use errors::EvalError;
