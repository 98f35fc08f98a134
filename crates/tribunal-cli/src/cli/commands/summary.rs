use crate::cli::args::SummaryArgs;
use crate::exit_codes;
use tribunal_core::report::console::render_summary;
use tribunal_core::report::json::read_json;

pub fn run(args: SummaryArgs) -> anyhow::Result<i32> {
    let report = read_json(&args.report)?;
    print!("{}", render_summary(&report));
    Ok(exit_codes::SUCCESS)
}
