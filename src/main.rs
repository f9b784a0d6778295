use anyhow::Result;
use clap::Parser;
use visearch::Opts;
use visearch::cli::SubCommandExtend;
use visearch::config::SubCommand;

#[tokio::main]
async fn main() -> Result<()> {
    // The backend reads JSON from stdout, so diagnostics must stay on stderr
    // and remain visible without RUST_LOG being set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = Opts::parse();
    match &opts.subcmd {
        SubCommand::Extract(cmd) => cmd.run(&opts).await,
        SubCommand::Refresh(cmd) => cmd.run(&opts).await,
        SubCommand::Search(cmd) => cmd.run(&opts).await,
    }
}
