use clap::{Parser, Subcommand};
use anyhow::Result;
use dotenvy::dotenv;

mod activity;
mod config;
mod github;
mod output;
mod server;
mod telemetry;

#[derive(Parser)]
#[command(name = "live-activity", about = "Latest public GitHub push, served as a JSON envelope")]
struct Cli {
    /// Print `fetch` output as JSON on stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve GET /api/activity
    Serve(server::ServeCmd),
    /// Fetch once and print the envelope
    Fetch(activity::FetchCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // stderr logging; respects RUST_LOG and ACTIVITY_LOG_FORMAT
    telemetry::config::init_tracing();
    let cfg = config::ActivityConfig::from_env()?;

    match cli.command {
        Commands::Serve(args) => server::run(cfg, args).await?,
        Commands::Fetch(args) => activity::run(cfg, args).await?,
    }

    Ok(())
}
