use crate::cli::args::ExemplarsArgs;
use crate::exit_codes;
use tribunal_core::exemplars::ExemplarLibrary;

pub fn run(args: ExemplarsArgs) -> anyhow::Result<i32> {
    let library = ExemplarLibrary::load_dir(&args.dir);
    for w in library.warnings() {
        eprintln!("warning: {}: {}", w.path.display(), w.message);
    }

    let top = library.get_top(&args.category, args.limit);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&top)?);
        return Ok(exit_codes::SUCCESS);
    }

    if top.is_empty() {
        println!("no exemplars for category '{}'", args.category);
        return Ok(exit_codes::SUCCESS);
    }
    for (i, ex) in top.iter().enumerate() {
        println!("{}. [{:.2}] {}", i + 1, ex.quality_score, ex.query.user_query);
        let first = ex.expert_answer.lines().next().unwrap_or_default();
        println!("   {first}");
        if !ex.key_points.is_empty() {
            println!("   key points: {}", ex.key_points.join("; "));
        }
    }
    Ok(exit_codes::SUCCESS)
}
