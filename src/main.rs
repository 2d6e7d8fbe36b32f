use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use post_office::cli::Args;
use post_office::report;
use post_office::transcript::Transcript;
use post_office::OfficeCoordinator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr; the transcript file is the program's output.
    // Override the level with RUST_LOG, e.g. RUST_LOG=post_office=trace
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    // === 1. Validate parameters before anything is spawned ===
    let config = args.office_config()?;

    // === 2. Open the transcript ===
    let transcript = Arc::new(Transcript::to_file(&args.output)?);
    tracing::info!(path = %args.output.display(), "Transcript opened");

    // === 3. Run the office until the last actor leaves ===
    let coordinator = OfficeCoordinator::new(config, transcript)?;
    let metrics = coordinator.metrics().clone();
    let summary = coordinator.run().await?;

    // === 4. Optional artifacts ===
    if let Some(path) = &args.report {
        report::write_summary(path, &summary)?;
    }
    if let Some(path) = &args.metrics {
        report::write_metrics(path, &metrics)?;
    }

    tracing::info!(
        run_id = %summary.run_id,
        served = summary.activity.customers_served,
        turned_away = summary.activity.customers_turned_away,
        lines = summary.transcript_lines,
        close_delay_ms = summary.close_delay_ms,
        "Simulation complete"
    );

    Ok(())
}
