use tracing::error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod cli;

#[tokio::main]
async fn main() {
    let (config, log) = match cli::run() {
        cli::RunOutcome::Serve { config, log } => (config, log),
        cli::RunOutcome::Exit(code) => std::process::exit(code),
    };

    let filter = EnvFilter::try_new(&log).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = shiftbook::serve(config).await {
        error!(%err, "server stopped");
        std::process::exit(1);
    }
}
