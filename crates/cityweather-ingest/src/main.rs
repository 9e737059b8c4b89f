use anyhow::Context;
use clap::Parser;

use cityweather_ingest::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cityweather_core::init_logging(cli.verbose);

    let summary = match cityweather_ingest::run(&cli).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("{}", e.user_message());
            return Err(e).context("cityweather run aborted during setup");
        }
    };

    for report in summary.failures() {
        tracing::warn!(location = %report.location, outcome = ?report.outcome, "Location skipped");
    }
    println!("{summary}");

    Ok(())
}
