use anyhow::Result;
use clap::Parser;
use glab_tools::cli::{init_tracing, run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.debug);
    tracing::debug!("CLI arguments parsed, invoking run");

    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!("done!"),
        Err(e) => tracing::error!(error = %e, "CLI exited with error"),
    }
    result
}
