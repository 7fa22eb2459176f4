use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use futures::StreamExt;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use starboard_api::{FetchError, GitHubClient};
use starboard_core::{
    degradation, pin, popularity, self_starred_repos_of_user, snapshot, table, Config, Repository,
    TokenRegion,
};

#[derive(Parser)]
#[command(name = "starboard")]
#[command(
    version,
    about = "Regenerates the starred-repo pin table inside a profile README",
    long_about = None
)]
struct Cli {
    /// GitHub login whose self-starred repos fill the table
    #[arg(long, env = "GITHUB_REPOSITORY_OWNER")]
    owner: String,

    /// Token for authenticated API requests (higher rate limits)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Path to a TOML config file; defaults apply when it does not exist
    #[arg(long, default_value = "starboard.toml")]
    config: PathBuf,

    /// Render from the local snapshot instead of calling the API
    #[arg(long, env = "MOCK_API")]
    mock_api: bool,

    /// Skip writing the JSON snapshot artifact
    #[arg(long, env = "SKIP_SNAPSHOT")]
    skip_snapshot: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - helps when things go sideways
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "starboard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    let (repos, fetch_failure) = if cli.mock_api {
        (snapshot::mock_repos(&config.snapshot_path, &cli.owner), None)
    } else {
        collect_repos(&cli.owner, cli.token.clone(), config.page_size).await
    };

    let write_snapshot = !cli.mock_api && !cli.skip_snapshot;
    regenerate(&config, repos, fetch_failure, write_snapshot)
}

/// Everything after the fetch: degrade-or-abort, snapshot, render, splice,
/// write, and - when a degraded result was accepted - the deferred re-raise
/// of the original failure after the write.
fn regenerate(
    config: &Config,
    mut repos: Vec<Repository>,
    fetch_failure: Option<FetchError>,
    write_snapshot: bool,
) -> anyhow::Result<()> {
    let readme = std::fs::read_to_string(&config.readme_path)
        .with_context(|| format!("failed to read {}", config.readme_path.display()))?;
    info!("finished reading {}", config.readme_path.display());

    let region = TokenRegion::new(&config.start_token, &config.end_token);

    // A fetch failure after some pages already landed goes through the
    // graceful-degradation gate: publish the partial table if enough of it
    // survived, but still re-raise the failure after the write so CI sees it.
    let mut deferred_failure = None;
    if let Some(failure) = fetch_failure {
        if !failure.is_degradable() {
            return Err(anyhow::Error::new(failure)
                .context("fetch failed before any degradation could apply"));
        }

        let published_middle = region.split(&readme)?.middle;
        let previous_count = pin::extract_pins(published_middle)?.len();

        if degradation::should_accept_partial(repos.len(), previous_count, config.fatal_loss_percent)
        {
            warn!(
                fetched = repos.len(),
                previous = previous_count,
                threshold_percent = config.fatal_loss_percent,
                "fetch failed partway but enough repos survived; publishing the partial table \
                 and re-raising the failure afterwards"
            );
            warn!("original failure: {failure}");
            deferred_failure = Some(failure);
        } else {
            return Err(anyhow::Error::new(failure).context(format!(
                "fetched only {} repos, at or below {}% of the previously published {}",
                repos.len(),
                config.fatal_loss_percent,
                previous_count,
            )));
        }
    }

    if write_snapshot {
        // Saved for later use, e.g. publishing as a CI artifact.
        snapshot::write_snapshot(&config.snapshot_path, &repos)?;
    }

    popularity::sort_by_probable_popularity(&mut repos);

    let pins: Vec<String> = repos
        .iter()
        .map(|repo| pin::render_pin(repo, &config.theme))
        .collect();

    let new_table = table::render_table(&pins, config.columns)?;
    let new_readme = region.replace(&readme, &new_table)?;

    std::fs::write(&config.readme_path, new_readme)
        .with_context(|| format!("failed to write {}", config.readme_path.display()))?;
    info!("finished writing {}", config.readme_path.display());

    match deferred_failure {
        Some(failure) => Err(anyhow::Error::new(failure)
            .context("partial table was published; re-raising the original fetch failure")),
        None => Ok(()),
    }
}

/// Drain the fetch stream, keeping everything delivered before a failure.
async fn collect_repos(
    owner: &str,
    token: Option<String>,
    per_page: u32,
) -> (Vec<Repository>, Option<FetchError>) {
    let client = Arc::new(GitHubClient::new(token));

    let stream = match self_starred_repos_of_user(client, owner, per_page) {
        Ok(stream) => stream,
        Err(error) => return (Vec::new(), Some(error)),
    };
    futures::pin_mut!(stream);

    let mut repos = Vec::new();

    while let Some(item) = stream.next().await {
        match item {
            Ok(repo) => {
                info!(
                    "found own starred repo: {} (last pushed: {})",
                    repo.slug(),
                    repo.pushed_at
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "never".into()),
                );
                repos.push(repo);
            }
            Err(error) => return (repos, Some(error)),
        }
    }

    (repos, None)
}
