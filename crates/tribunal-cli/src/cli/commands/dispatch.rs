use super::super::args::*;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => super::run::run(args).await,
        Command::Validate(args) => super::validate::run(args),
        Command::Exemplars(args) => super::exemplars::run(args),
        Command::Summary(args) => super::summary::run(args),
    }
}
