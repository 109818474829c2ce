use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quant_bgru::{
    Cli, MaskNetBuilder, PngReporter, SyntheticProvider, TrainControl, TrainingOrchestrator,
};

fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config();

    let default_filter = if config.verbose { "quant_bgru=debug,info" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    config.validate().context("Invalid arguments")?;

    let control = TrainControl::new().with_time_limit(config.time_limit());
    let orchestrator = TrainingOrchestrator::new(
        SyntheticProvider::from_config(&config),
        MaskNetBuilder,
        PngReporter::default(),
    );

    let started_at = chrono::Local::now().naive_local();
    let summary = orchestrator
        .run(&config, started_at, &control)
        .context("Training run failed")?;

    info!(
        label = %summary.result_label,
        model = %summary.model_path.display(),
        plot = %summary.plot_path.display(),
        "run complete"
    );
    println!("{}", summary.plot_path.display());
    Ok(())
}
