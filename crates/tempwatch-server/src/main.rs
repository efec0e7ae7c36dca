//! Tempwatch - entry point.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};

use tempwatch_config::{ConfigLoader, TempwatchConfig, ENV_PREFIX};
use tempwatch_contract::{ContractLoader, LoadedContract};
use tempwatch_core::BoundedErrorStore;
use tempwatch_server::{Server, ServerConfig};

/// Config file read when `--config` is not given, if it exists.
const DEFAULT_CONFIG_FILE: &str = "tempwatch.toml";

/// Command-line arguments.
struct Args {
    config: Option<PathBuf>,
    contract: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut config = None;
        let mut contract = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = args.next().map(PathBuf::from);
                }
                "--contract" => {
                    contract = args.next().map(PathBuf::from);
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-V" => {
                    println!("tempwatch {}", tempwatch_server::VERSION);
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
        }

        Self { config, contract }
    }
}

fn print_help() {
    println!(
        r"Tempwatch - temperature reading service

USAGE:
    tempwatch [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Path to configuration file (TOML or JSON)
        --contract <PATH>  Path to the API contract (JSON); overrides the config
    -h, --help             Print help information
    -V, --version          Print version information

ENVIRONMENT VARIABLES:
    TEMPWATCH__SERVER__HTTP_ADDR             Bind address (default: 0.0.0.0:8080)
    TEMPWATCH__SERVER__API_PREFIX            Route prefix (default: /api/v1)
    TEMPWATCH__CONTRACT__CONTRACT_PATH       API contract file (default: built in)
    TEMPWATCH__ERRORS__CAPACITY              Stored error messages (default: 512)
    TEMPWATCH__TEMPERATURE__UTC_OFFSET       Display zone, e.g. -04:00 (default: local)
    TEMPWATCH__LOGGING__LEVEL                Log filter (default: info)
    TEMPWATCH__LOGGING__FORMAT               json or pretty (default: json)

A .env file in the working directory is loaded before the environment is read.
"
    );
}

fn load_config(args: &Args) -> anyhow::Result<TempwatchConfig> {
    let loader = ConfigLoader::new()
        .with_dotenv()
        .context("failed to load .env file")?;

    let loader = match &args.config {
        Some(path) => loader
            .with_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => loader
            .with_optional_file(DEFAULT_CONFIG_FILE)
            .with_context(|| format!("failed to load configuration from {DEFAULT_CONFIG_FILE}"))?,
    };

    let mut config = loader
        .with_env_prefix(ENV_PREFIX)
        .load()
        .context("invalid configuration")?;

    if let Some(path) = &args.contract {
        config.contract.contract_path = Some(path.display().to_string());
    }

    Ok(config)
}

async fn load_contract(config: &TempwatchConfig) -> anyhow::Result<LoadedContract> {
    match &config.contract.contract_path {
        Some(path) => ContractLoader::from_file(path)
            .await
            .with_context(|| format!("failed to load contract from {path}")),
        None => {
            info!("using built-in contract");
            ContractLoader::builtin().context("built-in contract is invalid")
        }
    }
}

async fn run(config: TempwatchConfig) -> anyhow::Result<()> {
    let contract = load_contract(&config).await?;
    let time_display = config.time_display().context("invalid temperature.utc_offset")?;

    let server = Server::builder()
        .config(ServerConfig::from(&config.server))
        .contract(Arc::new(contract))
        .error_store(Arc::new(BoundedErrorStore::with_capacity(config.errors.capacity)))
        .time_display(time_display)
        .build()
        .context("failed to create server")?;

    info!(
        version = tempwatch_server::VERSION,
        addr = %config.server.http_addr,
        prefix = %config.server.api_prefix,
        "starting tempwatch"
    );

    server.run().await.context("server error")
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("tempwatch: {e:#}");
            std::process::exit(1);
        }
    };

    if let Err(e) = tempwatch_telemetry::init_logging(&config.logging.to_log_config()) {
        eprintln!("tempwatch: {e}");
        std::process::exit(1);
    }

    if let Err(e) = run(config).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}
