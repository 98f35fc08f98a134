use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tribunal_core::agent::{RequestShape, ResponseShape};

#[derive(Parser)]
#[command(
    name = "tribunal",
    version,
    about = "Grade troubleshooting agents against expert-annotated corpora with a few-shot grounded judge"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Evaluate an agent against a corpus and write the report
    Run(RunArgs),
    /// Check configuration, exemplars and optionally a corpus
    Validate(ValidateArgs),
    /// Show the ranked exemplars the judge would use for a category
    Exemplars(ExemplarsArgs),
    /// Re-render the summary of a saved report
    Summary(SummaryArgs),
}

#[derive(Args, Clone, Debug, Default)]
pub struct JudgeArgs {
    /// Judge backend
    /// - lexical: key-point coverage and term overlap, no model calls
    /// - openai: few-shot judge via an OpenAI-compatible endpoint
    /// - fake: few-shot judge with a deterministic fake model (tests/dev)
    #[arg(long, value_parser = ["lexical", "openai", "fake"])]
    pub judge: Option<String>,

    /// Judge model identifier
    #[arg(long, env = "OPENAI_MODEL")]
    pub judge_model: Option<String>,

    /// OpenAI-compatible base URL, e.g. http://llm.internal:8000/v1
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub judge_base_url: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, hide = true)]
    pub judge_api_key: Option<String>,

    /// Directory of expert exemplar documents
    #[arg(long)]
    pub few_shot_dir: Option<PathBuf>,
}

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Evaluation config (YAML). Defaults apply when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub corpus: PathBuf,

    /// Base URL of a live agent API
    #[arg(long, conflicts_with = "responses", required_unless_present = "responses")]
    pub agent_url: Option<String>,

    /// Recorded agent responses (JSON lines keyed by query_id)
    #[arg(long)]
    pub responses: Option<PathBuf>,

    #[arg(long, default_value = "standard")]
    pub response_shape: ResponseShape,

    #[arg(long, default_value = "standard")]
    pub request_shape: RequestShape,

    /// Query endpoint path on the agent API
    #[arg(long)]
    pub agent_query_path: Option<String>,

    #[arg(long, env = "AGENT_API_KEY", hide_env_values = true, hide = true)]
    pub agent_api_key: Option<String>,

    /// Label recorded as agent_quality_level in the report
    #[arg(long)]
    pub agent_tag: Option<String>,

    /// Where to write the JSON report
    #[arg(long)]
    pub out: Option<PathBuf>,

    #[arg(long)]
    pub sample_size: Option<usize>,

    #[arg(long)]
    pub parallel: Option<usize>,

    /// Per-call timeout in seconds for agent and judge
    #[arg(long)]
    pub timeout: Option<u64>,

    #[arg(long)]
    pub no_progress: bool,

    #[command(flatten)]
    pub judge: JudgeArgs,
}

#[derive(Args, Clone, Debug)]
pub struct ValidateArgs {
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub corpus: Option<PathBuf>,

    #[command(flatten)]
    pub judge: JudgeArgs,
}

#[derive(Args, Clone, Debug)]
pub struct ExemplarsArgs {
    #[arg(long, default_value = "few_shot_examples")]
    pub dir: PathBuf,

    #[arg(long)]
    pub category: String,

    #[arg(long, default_value_t = 2)]
    pub limit: usize,

    /// Print the selection as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone, Debug)]
pub struct SummaryArgs {
    pub report: PathBuf,
}
