//! Syncfix CLI - syncfix command

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;
mod logging;
mod system_config;
mod util;

use cmd::catalog::CatalogArgs;
use cmd::simulate::SimulateArgs;
use cmd::tryon::TryOnArgs;

/// Syncfix - Debounced attachment resync after users join
#[derive(Parser)]
#[command(name = "syncfix")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay join times against the scheduler
    Simulate {
        /// Comma-separated join offsets in milliseconds (e.g. 0,1000,4000)
        #[arg(long, value_delimiter = ',', required = true)]
        joins: Vec<u64>,
        /// Minimum interval in milliseconds (default: from config)
        #[arg(long, allow_hyphen_values = true)]
        interval_ms: Option<i64>,
        /// Number of probe actions to register
        #[arg(long, default_value = "1")]
        actions: usize,
        /// Indices of probe actions that fail (comma-separated)
        #[arg(long, value_delimiter = ',')]
        fail: Vec<usize>,
        /// Use the wall clock instead of a virtual one
        #[arg(long)]
        realtime: bool,
    },
    /// Show the hat menu for a catalog
    Catalog {
        #[command(flatten)]
        source: CatalogSource,
    },
    /// Run a hat try-on session on an in-memory stage
    TryOn {
        #[command(flatten)]
        source: CatalogSource,
        /// Number of users joining
        #[arg(long, default_value = "3")]
        users: usize,
        /// Milliseconds between joins
        #[arg(long, default_value = "1000")]
        spacing_ms: u64,
        /// Override auto-sync (true or false)
        #[arg(long)]
        auto_sync: Option<bool>,
    },
    /// View and edit the system configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(clap::Args)]
struct CatalogSource {
    /// Catalog file (overrides --kit)
    #[arg(long)]
    path: Option<PathBuf>,
    /// Named hat kit (default: from config, then the combined catalog)
    #[arg(long)]
    kit: Option<String>,
    /// Directory holding kit files
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    /// Control set: default, min or none (default: from config)
    #[arg(long)]
    controls: Option<String>,
}

impl From<CatalogSource> for CatalogArgs {
    fn from(source: CatalogSource) -> Self {
        CatalogArgs {
            path: source.path,
            kit: source.kit,
            data_dir: source.data_dir,
            controls: source.controls,
        }
    }
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all values
    List,
    /// Print one value
    Get {
        /// Key such as sync.min_interval_ms
        key: String,
    },
    /// Change one value
    Set {
        /// Key such as sync.min_interval_ms
        key: String,
        /// New value
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Show the config file path
    Path {
        /// Create the file with defaults if missing
        #[arg(long)]
        create: bool,
    },
    /// Print an annotated example config
    Example,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Held until exit so buffered log lines reach the file
    let _guard = logging::init(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Simulate { joins, interval_ms, actions, fail, realtime } => {
            cmd::simulate::run(SimulateArgs {
                interval_ms,
                joins,
                actions,
                fail,
                realtime,
            })
            .await
        }
        Commands::Catalog { source } => cmd::catalog::run(source.into()).await,
        Commands::TryOn { source, users, spacing_ms, auto_sync } => {
            cmd::tryon::run(TryOnArgs {
                catalog: source.into(),
                users,
                spacing_ms,
                auto_sync,
            })
            .await
        }
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::List => cmd::config::run_list().await,
            ConfigCommands::Get { key } => cmd::config::run_get(&key).await,
            ConfigCommands::Set { key, value } => cmd::config::run_set(&key, &value).await,
            ConfigCommands::Path { create } => cmd::config::run_path(create).await,
            ConfigCommands::Example => cmd::config::run_example().await,
        },
    }
}
