mod cli;
mod config;
mod error;
mod gateway;
mod logging;
mod mapping;
mod model;
mod remote;
mod sync;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use cli::Cli;
use gateway::gitlab::GitLabGateway;
use gateway::{DryRun, Gateway};
use remote::RemoteState;
use sync::{SyncContext, Synchronizer};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    // Local inputs first: nothing touches the network until both load
    let config_path = cli.config_path();
    let config = config::load_config(&config_path)?;
    let records = model::source::load_issues(&cli.input, cli.from)?;
    info!(
        records = records.len(),
        from = cli.from,
        config = %config_path.display(),
        "loaded export"
    );

    let http = GitLabGateway::new(&cli.gitlab_url, cli.token.clone());
    let gateway: Box<dyn Gateway> = if cli.dry_run {
        info!("dry run: writes will be logged, not sent");
        Box::new(DryRun::new(http))
    } else {
        Box::new(http)
    };

    let remote = RemoteState::load(gateway.as_ref(), &cli.project)
        .await
        .with_context(|| format!("Failed to read state of {}", cli.project))?;
    let mut synchronizer = Synchronizer::new(gateway.as_ref(), SyncContext::new(&config, remote));
    let report = synchronizer.run(&records).await?;

    info!(%report, "migration finished");
    Ok(())
}
