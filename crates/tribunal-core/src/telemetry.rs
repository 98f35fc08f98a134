//! Startup check for external tracing/telemetry settings.
//!
//! Judge prompts contain customer troubleshooting data, so nothing in this
//! crate forwards traces to hosted tracing services. Detection works on an
//! environment snapshot and never mutates the process environment.

use serde::{Deserialize, Serialize};

/// Variables that would enable hosted tracing in common LLM tooling.
pub const EXTERNAL_TELEMETRY_VARS: &[&str] = &[
    "LANGCHAIN_API_KEY",
    "LANGCHAIN_TRACING_V2",
    "LANGCHAIN_PROJECT",
    "LANGSMITH_API_KEY",
    "LANGSMITH_TRACING",
];

const PUBLIC_JUDGE_HOSTS: &[&str] = &["api.openai.com"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryStatus {
    pub external_telemetry_disabled: bool,
    /// Telemetry variables present at startup; they are ignored, not forwarded.
    pub ignored_variables: Vec<String>,
    /// True when the judge endpoint is a public hosted API.
    pub judge_endpoint_external: bool,
}

impl Default for TelemetryStatus {
    fn default() -> Self {
        Self {
            external_telemetry_disabled: true,
            ignored_variables: Vec::new(),
            judge_endpoint_external: false,
        }
    }
}

impl TelemetryStatus {
    pub fn detect<I, K, V>(env: I, judge_base_url: Option<&str>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut ignored: Vec<String> = env
            .into_iter()
            .filter(|(k, v)| {
                !v.as_ref().trim().is_empty() && EXTERNAL_TELEMETRY_VARS.contains(&k.as_ref())
            })
            .map(|(k, _)| k.as_ref().to_string())
            .collect();
        ignored.sort();
        ignored.dedup();

        let judge_endpoint_external = judge_base_url
            .map(|u| {
                let u = u.to_ascii_lowercase();
                PUBLIC_JUDGE_HOSTS.iter().any(|h| u.contains(h))
            })
            .unwrap_or(false);

        if !ignored.is_empty() {
            tracing::warn!(
                variables = ?ignored,
                "external telemetry variables detected; they are ignored"
            );
        }
        if judge_endpoint_external {
            tracing::warn!(
                base_url = judge_base_url.unwrap_or_default(),
                "judge endpoint is a public hosted API; prompts leave the internal network"
            );
        }

        Self {
            external_telemetry_disabled: true,
            ignored_variables: ignored,
            judge_endpoint_external,
        }
    }

    /// Snapshot of the process environment. Entries that are not valid UTF-8
    /// cannot name a telemetry variable and are skipped.
    pub fn from_process_env(judge_base_url: Option<&str>) -> Self {
        let env = std::env::vars_os().filter_map(|(k, v)| {
            Some((k.to_str()?.to_string(), v.to_str()?.to_string()))
        });
        Self::detect(env, judge_base_url)
    }
}
