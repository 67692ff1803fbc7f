use clap::Parser;
use tracing::error;
use visitorpass_lib::bootstrap::tracing::init_tracing_subscriber;
use visitorpass_lib::cli::{run, Cli};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    // A missing .env is normal
    let _ = dotenvy::dotenv();

    if let Err(err) = init_tracing_subscriber() {
        eprintln!("Failed to initialize tracing: {err}");
    }

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "command failed");
            eprintln!("error: {err:#}");
            std::process::ExitCode::FAILURE
        }
    }
}
