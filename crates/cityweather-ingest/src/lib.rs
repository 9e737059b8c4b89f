//! Orchestration of a cityweather run: CLI settings, the run context and the
//! per-location pipeline.

pub mod cli;
pub mod context;
pub mod error;
pub mod pipeline;

pub use cli::Cli;
pub use context::{IngestContext, RunSettings};
pub use error::AppError;
pub use pipeline::{LocationOutcome, LocationReport, Pipeline, RunSummary};

use cityweather_core::Credentials;
use cityweather_fetch::ResponseCache;

/// Load credentials, set up the run and process every location.
///
/// Only setup problems are errors; per-location failures end up in the
/// returned summary.
pub async fn run(cli: &Cli) -> Result<RunSummary, AppError> {
    let credentials = Credentials::load(&cli.config)?;
    let settings = cli.run_settings()?;

    let mut ctx = IngestContext::from_credentials(&credentials, settings, cli.timeout()).await?;
    if !cli.no_cache {
        ctx = ctx.with_cache(ResponseCache::new(&cli.cache_dir));
    }

    Ok(Pipeline::new(ctx).run().await)
}
