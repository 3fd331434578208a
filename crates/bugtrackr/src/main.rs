//! bugtrackr CLI binary.

use anyhow::Result;
use bugtrackr::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the bugtrackr CLI.
///
/// A current-thread runtime is enough: the only concurrent work is the
/// reconciler task behind `list`/`watch`, which is I/O-bound.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Controlled via RUST_LOG, e.g. RUST_LOG=bugtrackr=debug
    // Logs go to stderr so `--json` output stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bugtrackr=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting bugtrackr CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("bugtrackr CLI completed successfully");
    Ok(())
}
