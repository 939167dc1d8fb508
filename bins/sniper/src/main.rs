use alloy::primitives::{Address, Bytes, Log as PrimitiveLog, LogData, B256};
use alloy::rpc::types::Log;
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use pairwatch_bot::Bot;
use pairwatch_core::config::{AppConfig, ObservabilityConfig};
use pairwatch_core::dedupe::SeenSet;
use pairwatch_core::modes::LogFormat;
use pairwatch_core::utils::parse_address;
use pairwatch_dex::{decode_pair_created, select_target};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sniper", version, about = "New-pair liquidity sniper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Run {
        #[arg(short, long)]
        config: Option<String>,
    },
    PrintConfig {
        #[arg(short, long)]
        config: Option<String>,
    },
    Replay {
        #[arg(short, long, default_value = "samples/pair_created.json")]
        file: String,
        #[arg(short, long)]
        config: Option<String>,
        /// Overrides the configured reference asset. With neither set every
        /// pair is a candidate.
        #[arg(long)]
        reference: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    match cli.command {
        Commands::Run { config } => {
            let cfg = load_config(config.as_deref())?;
            init_tracing(&cfg.observability)?;
            let mut bot = Bot::new(cfg).await.inspect_err(|err| {
                error!(?err, "startup failed");
            })?;

            let shutdown = bot.shutdown_token();
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        info!("interrupt received");
                        shutdown.cancel();
                    }
                    Err(err) => warn!(?err, "interrupt handler unavailable"),
                }
            });

            bot.run().await.inspect_err(|err| {
                error!(%err, "fatal; exiting");
            })?;
        }
        Commands::PrintConfig { config } => {
            let cfg = load_config(config.as_deref())?;
            init_tracing(&cfg.observability)?;
            let json = serde_json::to_string_pretty(&cfg)?;
            println!("{json}");
        }
        Commands::Replay {
            file,
            config,
            reference,
        } => {
            let cfg = config.as_deref().map(|path| load_config(Some(path))).transpose()?;
            let observability = cfg
                .as_ref()
                .map(|cfg| cfg.observability.clone())
                .unwrap_or_default();
            init_tracing(&observability)?;
            let reference = match (reference.as_deref(), &cfg) {
                (Some(raw), _) => Some(parse_address(raw)?),
                (None, Some(cfg)) => cfg.wrapped_native().map(parse_address).transpose()?,
                (None, None) => None,
            };
            let data = std::fs::read_to_string(file)?;
            for line in replay(&data, reference)? {
                println!("{line}");
            }
        }
    }

    info!("done");
    Ok(())
}

/// Loads the configuration. A rejected config is still reported through
/// tracing, on a default subscriber, before the error ends the process.
fn load_config(path: Option<&str>) -> Result<AppConfig> {
    AppConfig::load(path).map_err(|err| {
        let _ = init_tracing(&ObservabilityConfig::default());
        error!(%err, "configuration rejected");
        err.into()
    })
}

/// Runs recorded factory logs through decoding, the reference-asset filter
/// and the seen-pair guard. One output line per entry that decodes.
fn replay(data: &str, reference: Option<Address>) -> Result<Vec<String>> {
    let entries: Vec<ReplayEntry> = serde_json::from_str(data)?;
    let mut seen = SeenSet::new(entries.len());
    let mut lines = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let event = match decode_pair_created(&entry.into_log()) {
            Ok(event) => event,
            Err(err) => {
                warn!(index, %err, "malformed PairCreated log");
                continue;
            }
        };
        let line = match select_target(&event, reference) {
            Some(target) if seen.first_sighting(event.pair) => {
                format!("{index}: watch pair={} target={target}", event.pair)
            }
            Some(_) => format!("{index}: duplicate pair={}", event.pair),
            None => format!("{index}: skip pair={}", event.pair),
        };
        lines.push(line);
    }
    Ok(lines)
}

fn init_tracing(obs: &ObservabilityConfig) -> Result<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(value) => EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new("info")),
        Err(_) => EnvFilter::try_new(&obs.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match LogFormat::parse(&obs.log_format)? {
        LogFormat::Pretty => builder.try_init().map_err(|err| anyhow!(err)),
        LogFormat::Json => builder.json().try_init().map_err(|err| anyhow!(err)),
    }
}

#[derive(serde::Deserialize)]
struct ReplayEntry {
    address: Address,
    topics: Vec<B256>,
    data: Bytes,
}

impl ReplayEntry {
    fn into_log(self) -> Log {
        Log {
            inner: PrimitiveLog {
                address: self.address,
                data: LogData::new_unchecked(self.topics, self.data),
            },
            ..Default::default()
        }
    }
}
