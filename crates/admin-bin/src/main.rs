//! Carrier admin - command-line back office for the `carriers` table.

mod commands;
mod output;
mod terminal;

use admin_config_and_utils::{init_logging, parse_level, Config, Paths};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};

/// Carrier admin - list, create, edit and delete carriers.
#[derive(Parser)]
#[command(name = "carrier-admin")]
#[command(about = "Back office for the carriers table")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error); defaults to the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Base directory for config and logs (default: ~/.carrier-admin)
    #[arg(long, env = "CARRIER_ADMIN_HOME", global = true)]
    base_dir: Option<PathBuf>,

    /// Use an in-process store instead of Supabase
    #[arg(long, global = true)]
    memory: bool,

    /// Sample rows to seed the in-process store with (only with --memory)
    #[arg(long, default_value = "0", global = true)]
    seed: usize,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show one page of carriers
    List {
        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: u32,
    },

    /// Show every carrier without pagination
    All,

    /// Show one carrier
    Show {
        /// Carrier ID
        id: String,
    },

    /// Create a carrier
    Create {
        /// Carrier name
        #[arg(short, long)]
        name: String,
    },

    /// Rename a carrier
    Edit {
        /// Carrier ID
        id: String,
        /// New carrier name
        #[arg(short, long)]
        name: String,
    },

    /// Delete a carrier
    Delete {
        /// Carrier ID
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Page through carriers interactively
    Browse,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = run(cli).await;

    if let Err(e) = result {
        if e.downcast_ref::<commands::AlreadyReported>().is_none() {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let paths = match &cli.base_dir {
        Some(dir) => Paths::with_base_dir(dir.clone()),
        None => Paths::new()?,
    };
    paths.ensure_dirs()?;

    let config = Config::load(&paths)?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let level = parse_level(level).to_string().to_lowercase();
    init_logging(&level, &paths, false);

    info!(
        base_dir = %paths.base_dir().display(),
        memory = cli.memory,
        page_size = config.page_size,
        "carrier-admin starting"
    );

    let ctx = commands::Context::build(&config, cli.memory, cli.seed, cli.format)?;
    debug!(command = ?cli.command, "Dispatching command");

    match cli.command {
        Commands::List { page } => commands::list(&ctx, page).await,
        Commands::All => commands::all(&ctx).await,
        Commands::Show { id } => commands::show(&ctx, &id).await,
        Commands::Create { name } => commands::create(&ctx, &name).await,
        Commands::Edit { id, name } => commands::edit(&ctx, &id, &name).await,
        Commands::Delete { id, yes } => commands::delete(&ctx, &id, yes).await,
        Commands::Browse => commands::browse(&ctx).await,
    }
}
