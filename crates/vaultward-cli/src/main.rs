//! Vaultward - autonomous custody agent for rules-governed vaults.
//!
//! One binary, one loop: it watches a vault for deposits, asks the
//! decision service what the rules require, gates every requested action,
//! and posts bonded proposals through the vault's governance module.
//!
//! # Quick Start
//!
//! ```bash
//! # configuration comes from the environment (.env is honored)
//! cp .env.example .env
//!
//! vaultward run
//! vaultward run --max-cycles 10
//! ```

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use vaultward_chain::RpcLedger;
use vaultward_engine::Engine;
use vaultward_oracle::HttpDecisionOracle;
use vaultward_venue::{HttpVenueTransport, VenueClient};

mod settings;

use settings::Settings;

#[derive(Parser)]
#[command(name = "vaultward")]
#[command(version)]
#[command(about = "Autonomous custody agent for rules-governed vaults", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent loop against the configured vault
    Run {
        /// Stop after this many cycles (overrides VAULTWARD_MAX_CYCLES)
        #[arg(long)]
        max_cycles: Option<u32>,
    },
    /// Resolve configuration and print the watched deployment, then exit
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env()?;

    match cli.command {
        Commands::Run { max_cycles } => {
            if let Some(max_cycles) = max_cycles {
                settings.engine.max_cycles = max_cycles;
            }
            run(settings).await
        }
        Commands::Check => {
            info!(
                vault = %settings.engine.vault,
                module = %settings.engine.module,
                signer = %settings.engine.signer,
                tracked_assets = settings.engine.tracked_assets.len(),
                watch_native = settings.engine.watch_native,
                "configuration resolved"
            );
            Ok(())
        }
    }
}

async fn run(settings: Settings) -> anyhow::Result<()> {
    let ledger = RpcLedger::new(settings.rpc_url.clone());
    let oracle = HttpDecisionOracle::new(settings.oracle.clone());
    let venue = VenueClient::new(
        HttpVenueTransport::new(settings.venue_url.clone(), settings.venue_auth.clone()),
        settings.venue_max_attempts,
        settings.venue_retry_delay,
    );

    info!(
        vault = %settings.engine.vault,
        module = %settings.engine.module,
        "starting agent loop"
    );
    let mut engine = Engine::new(ledger, oracle, venue, settings.engine);
    engine.run().await?;
    Ok(())
}
