use clap::{Parser, Subcommand};
use tracing::info;

use amp_source::catalog::ConnectionStatus;
use amp_source::config::{self, ConnectorConfig};
use amp_source::logging;
use amp_source::metrics;
use amp_source::source::AmpSource;

#[derive(Parser)]
#[command(name = "amp_source")]
#[command(about = "Amazon Managed Prometheus metadata source connector")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the connector configuration schema
    Spec,
    /// Verify the configured workspace is reachable
    Check {
        /// Path to the JSON config file
        #[arg(long)]
        config: String,
    },
    /// Print the stream catalog
    Discover {
        /// Path to the JSON config file
        #[arg(long)]
        config: String,
    },
    /// Read records and emit them as JSON lines on stdout
    Read {
        /// Path to the JSON config file
        #[arg(long)]
        config: String,
        /// Specific streams to read (comma-separated). Available: MetricNames, Rules
        #[arg(long)]
        streams: Option<String>,
        /// Path to a state file (accepted for protocol parity; full refresh only)
        #[arg(long)]
        state: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    logging::init_logging();
    metrics::init_metrics();

    let cli = Cli::parse();
    let source = AmpSource::new();

    match cli.command {
        Commands::Spec => {
            println!("{}", serde_json::to_string_pretty(&config::connector_spec())?);
        }
        Commands::Check { config } => {
            let config = ConnectorConfig::from_file(&config)?;
            match source.check(&config).await {
                ConnectionStatus::Succeeded => {
                    println!("✅ Connection check succeeded");
                }
                ConnectionStatus::Failed { message } => {
                    println!("❌ Connection check failed: {}", message);
                    std::process::exit(1);
                }
            }
        }
        Commands::Discover { config } => {
            // Discovery itself is static, but a config that fails schema
            // validation should be reported here, not at first read.
            let _config = ConnectorConfig::from_file(&config)?;
            println!("{}", serde_json::to_string_pretty(&source.discover())?);
        }
        Commands::Read {
            config,
            streams,
            state,
        } => {
            let config = ConnectorConfig::from_file(&config)?;
            let selected: Vec<String> = streams
                .map(|list| {
                    list.split(',')
                        .map(|name| name.trim().to_string())
                        .filter(|name| !name.is_empty())
                        .collect()
                })
                .unwrap_or_default();
            let state = match state {
                Some(path) => Some(serde_json::from_str(&std::fs::read_to_string(path)?)?),
                None => None,
            };

            let envelopes = source.read(&config, &selected, state).await?;
            for envelope in &envelopes {
                println!("{}", serde_json::to_string(envelope)?);
            }
            info!(total = envelopes.len(), "read complete");
        }
    }

    Ok(())
}
