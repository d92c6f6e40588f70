use clap::{Parser, Subcommand};

use runway::narrative::NarrativeConfig;

#[derive(Parser, Debug)]
#[command(
    name = "runway",
    about = "Household runway and risk analysis engine (cash-flow projection + what-if stress scenarios)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP API server.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
        /// Narrative service endpoint; when unset, summaries fall back to a
        /// deterministic template.
        #[arg(long)]
        narrative_url: Option<String>,
        /// Narrative request timeout in seconds.
        #[arg(long, default_value_t = 10)]
        narrative_timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve {
            port,
            narrative_url,
            narrative_timeout_secs,
        } => {
            let narrative = narrative_url.map(|endpoint| NarrativeConfig {
                endpoint,
                timeout_secs: narrative_timeout_secs,
            });
            if let Err(e) = runway::api::run_http_server(port, narrative).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
    }
}
