// kodegen-sitemirror: mirror a website into a local directory.

use std::process::ExitCode;

use kodegen_tools_sitemirror::cli::Cli;
use kodegen_tools_sitemirror::mirror;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse_args();
    let json = cli.json;

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e:#}");
            return ExitCode::from(2);
        }
    };

    match mirror(config).await {
        Ok(report) => {
            if json {
                match serde_json::to_string_pretty(&report) {
                    Ok(summary) => println!("{summary}"),
                    Err(e) => tracing::warn!("Failed to serialize report: {e}"),
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Mirroring failed: {e}");
            ExitCode::FAILURE
        }
    }
}
