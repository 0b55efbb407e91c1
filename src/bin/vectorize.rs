//! Binary entrypoint: parse flags, build configuration, run the engine.
//! Error handling here is `anyhow`-based; the library crate uses its own
//! `EngineError` and this boundary is where the two meet.

use clap::Parser;
use vectorize_engine::cli::{self, Cli, Command, ModelCommand};
use vectorize_engine::provider::ProviderRegistry;
use vectorize_engine::Scheduler;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Embed(args) => {
            let config = args.into_config();
            let provider = ProviderRegistry::resolve(&config.provider_id)?;
            let scheduler = Scheduler::init(config, provider).await?;
            let summary = scheduler.run().await?;
            log::info!(
                "processed {} batches, updated {} rows ({} warnings, {} errors)",
                summary.batches_processed,
                summary.rows_updated,
                summary.warnings.len(),
                summary.errors.len()
            );
        }
        Command::Model { command } => match command {
            ModelCommand::List => cli::run_model_list(),
            ModelCommand::Desc { model } => cli::run_model_desc(&model),
            ModelCommand::Test { model } => cli::run_model_test(&model).await?,
        },
        Command::Search(args) => cli::run_search(args).await?,
    }

    Ok(())
}
