use super::runner_builder;
use crate::cli::args::ValidateArgs;
use crate::exit_codes;
use tribunal_core::config::JudgeStrategyKind;
use tribunal_core::corpus::Corpus;
use tribunal_core::exemplars::ExemplarLibrary;

pub fn run(args: ValidateArgs) -> anyhow::Result<i32> {
    let mut cfg = match runner_builder::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            println!("config: invalid ({e:#})");
            return Ok(exit_codes::FATAL);
        }
    };
    runner_builder::apply_judge_overrides(&mut cfg, &args.judge);

    if let Err(e) = cfg.validate() {
        println!("config: {e}");
        return Ok(exit_codes::FATAL);
    }
    println!(
        "config: ok (judge {:?}, threshold {:.2}, parallel {})",
        cfg.judge.strategy, cfg.low_performance_threshold, cfg.parallel
    );

    if cfg.judge.strategy == JudgeStrategyKind::FewShot {
        let library = ExemplarLibrary::load_dir(&cfg.few_shot_dir);
        println!(
            "exemplars: {} loaded from {}",
            library.len(),
            cfg.few_shot_dir.display()
        );
        for (category, count) in library.categories() {
            println!("  {category:<18} {count}");
        }
        for w in library.warnings() {
            println!("  warning: {}: {}", w.path.display(), w.message);
        }
    }

    if let Some(path) = &args.corpus {
        match Corpus::load(path) {
            Ok(corpus) => {
                println!("corpus: ok ({} test cases)", corpus.len());
                let mut counts = std::collections::BTreeMap::new();
                for qt in corpus.query_types().into_values() {
                    *counts.entry(qt.as_str()).or_insert(0usize) += 1;
                }
                for (qt, count) in counts {
                    println!("  {qt:<18} {count}");
                }
            }
            Err(e) => {
                println!("corpus: {e}");
                return Ok(exit_codes::FATAL);
            }
        }
    }

    Ok(exit_codes::SUCCESS)
}
