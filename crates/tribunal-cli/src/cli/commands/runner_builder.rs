//! Turns parsed arguments and the config file into collaborators.

use crate::cli::args::{JudgeArgs, RunArgs};
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tribunal_core::agent::http::HttpAgent;
use tribunal_core::agent::replay::ReplayAgent;
use tribunal_core::agent::Agent;
use tribunal_core::config::{EvalConfig, JudgeProvider, JudgeStrategyKind};
use tribunal_core::exemplars::ExemplarLibrary;
use tribunal_core::judge::few_shot::{FewShotJudge, FewShotSettings};
use tribunal_core::judge::lexical::LexicalJudge;
use tribunal_core::judge::JudgeStrategy;
use tribunal_core::providers::llm::fake::FakeClient;
use tribunal_core::providers::llm::openai::OpenAIClient;
use tribunal_core::providers::llm::LlmClient;
use tribunal_core::storage::{JudgeCache, Store};

const FAKE_MODEL: &str = "fake-judge";

/// Load the config file (or defaults) and resolve its relative paths against
/// the config file's directory.
pub(crate) fn load_config(path: Option<&Path>) -> anyhow::Result<EvalConfig> {
    let Some(path) = path else {
        return Ok(EvalConfig::default());
    };
    let mut cfg = EvalConfig::load(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    cfg.few_shot_dir = resolve(base, &cfg.few_shot_dir);
    cfg.judge.cache_path = cfg.judge.cache_path.as_deref().map(|p| resolve(base, p));
    Ok(cfg)
}

fn resolve(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

pub(crate) fn apply_judge_overrides(cfg: &mut EvalConfig, args: &JudgeArgs) {
    match args.judge.as_deref() {
        Some("lexical") => cfg.judge.strategy = JudgeStrategyKind::Lexical,
        Some("openai") => {
            cfg.judge.strategy = JudgeStrategyKind::FewShot;
            cfg.judge.provider = JudgeProvider::OpenAI;
        }
        Some("fake") => {
            cfg.judge.strategy = JudgeStrategyKind::FewShot;
            cfg.judge.provider = JudgeProvider::Fake;
        }
        _ => {}
    }
    if let Some(m) = &args.judge_model {
        cfg.judge.model = Some(m.clone());
    }
    if let Some(u) = &args.judge_base_url {
        cfg.judge.base_url = Some(u.clone());
    }
    if let Some(dir) = &args.few_shot_dir {
        cfg.few_shot_dir = dir.clone();
    }
}

pub(crate) fn apply_run_overrides(cfg: &mut EvalConfig, args: &RunArgs) {
    apply_judge_overrides(cfg, &args.judge);
    if let Some(n) = args.sample_size {
        cfg.sample_size = Some(n);
    }
    if let Some(p) = args.parallel {
        cfg.parallel = p;
    }
    if let Some(t) = args.timeout {
        cfg.timeout_seconds = t;
    }
}

pub(crate) fn build_judge(
    cfg: &EvalConfig,
    api_key: Option<String>,
) -> anyhow::Result<Arc<dyn JudgeStrategy>> {
    if cfg.judge.strategy == JudgeStrategyKind::Lexical {
        return Ok(Arc::new(LexicalJudge::new(cfg.weights)));
    }

    let library = ExemplarLibrary::load_dir(&cfg.few_shot_dir);
    tracing::info!(
        dir = %cfg.few_shot_dir.display(),
        exemplars = library.len(),
        skipped = library.warnings().len(),
        "loaded exemplar library"
    );

    let model = cfg.judge.model.clone().unwrap_or_default();
    let client: Arc<dyn LlmClient> = match cfg.judge.provider {
        JudgeProvider::OpenAI => Arc::new(OpenAIClient::new(
            model,
            cfg.judge.base_url.clone().unwrap_or_default(),
            api_key,
            cfg.judge.temperature,
            cfg.judge.max_tokens,
        )),
        JudgeProvider::Fake => Arc::new(FakeClient::new(if model.is_empty() {
            FAKE_MODEL.to_string()
        } else {
            model
        })),
    };

    let settings = FewShotSettings {
        exemplar_limit: cfg.judge.exemplar_limit,
        temperature: cfg.judge.temperature,
        max_tokens: cfg.judge.max_tokens,
        timeout: cfg.timeout(),
    };
    let mut judge = FewShotJudge::new(Arc::new(library), client, cfg.weights, settings);

    if let Some(path) = &cfg.judge.cache_path {
        let store = Store::open(path)
            .with_context(|| format!("failed to open judge cache '{}'", path.display()))?;
        store.init_schema()?;
        judge = judge.with_cache(JudgeCache::new(store));
    }
    if cfg.judge.fallback_to_lexical {
        judge = judge.with_lexical_fallback();
    }
    Ok(Arc::new(judge))
}

pub(crate) enum AgentSource {
    Http(Arc<HttpAgent>),
    Replay(Arc<ReplayAgent>),
}

impl AgentSource {
    pub(crate) fn as_agent(&self) -> Arc<dyn Agent> {
        match self {
            AgentSource::Http(a) => a.clone(),
            AgentSource::Replay(a) => a.clone(),
        }
    }
}

pub(crate) fn build_agent(args: &RunArgs) -> anyhow::Result<AgentSource> {
    if let Some(path) = &args.responses {
        let tag = args.agent_tag.clone().unwrap_or_else(|| "recorded".into());
        let agent = ReplayAgent::load(path, args.response_shape, tag)?;
        tracing::info!(path = %path.display(), recordings = agent.len(), "loaded recorded responses");
        return Ok(AgentSource::Replay(Arc::new(agent)));
    }

    let url = args
        .agent_url
        .clone()
        .context("either --agent-url or --responses is required")?;
    let tag = args.agent_tag.clone().unwrap_or_else(|| "http".into());
    let mut agent = HttpAgent::new(url, tag)
        .with_shapes(args.request_shape, args.response_shape)
        .with_api_key(args.agent_api_key.clone());
    if let Some(p) = &args.agent_query_path {
        agent = agent.with_query_path(p.clone());
    }
    Ok(AgentSource::Http(Arc::new(agent)))
}
