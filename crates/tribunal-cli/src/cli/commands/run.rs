use super::runner_builder::{self, AgentSource};
use crate::cli::args::RunArgs;
use crate::exit_codes;
use tribunal_core::corpus::Corpus;
use tribunal_core::engine::{RunOptions, Runner};
use tribunal_core::report::console::{default_progress_sink, render_summary};
use tribunal_core::report::json::write_json;
use tribunal_core::telemetry::TelemetryStatus;

pub async fn run(args: RunArgs) -> anyhow::Result<i32> {
    let mut cfg = runner_builder::load_config(args.config.as_deref())?;
    runner_builder::apply_run_overrides(&mut cfg, &args);
    cfg.validate()?;

    let telemetry = TelemetryStatus::from_process_env(cfg.judge.base_url.as_deref());
    let corpus = Corpus::load(&args.corpus)?;
    let judge = runner_builder::build_judge(&cfg, args.judge.judge_api_key.clone())?;
    let source = runner_builder::build_agent(&args)?;

    if let AgentSource::Http(agent) = &source {
        match agent.health().await {
            Ok(h) if h.healthy => {
                tracing::info!(endpoint = %agent.endpoint(), api_version = ?h.api_version, "agent healthy");
            }
            Ok(_) => tracing::warn!(endpoint = %agent.endpoint(), "agent reports unhealthy"),
            Err(e) => tracing::warn!(error = %e, "agent health check failed; continuing"),
        }
    }

    let runner = Runner::new(source.as_agent(), judge, RunOptions::from(&cfg)).with_telemetry(telemetry);

    let token = runner.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; finishing in-flight items");
            token.cancel();
        }
    });

    let total = corpus.select(cfg.sample_size).len();
    let progress = if args.no_progress {
        None
    } else {
        default_progress_sink(total)
    };

    let report = runner.run(&corpus, progress).await?;

    if let Some(out) = &args.out {
        write_json(&report, out)?;
        eprintln!("Report written to {}", out.display());
    }
    print!("{}", render_summary(&report));

    if report.has_failures() {
        Ok(exit_codes::ITEMS_FAILED)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}
