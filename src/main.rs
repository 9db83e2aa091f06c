use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "scopectl")]
#[command(version, about = "Switch and inspect your active Pulseboard scope")]
pub struct Cli {
    /// Verbose logging (debug-level for scopectl)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the active scope and its option-list sizes
    Status,
    /// List the organizations you belong to
    Orgs,
    /// List companies in the active organization
    Companies,
    /// List products in the active company
    Products,
    /// Switch the active scope
    Use {
        #[command(subcommand)]
        target: UseTarget,
    },
    /// Widen the active scope by one level
    Up,
    /// Show your permissions in the active scope
    Permissions,
    /// View or initialize configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
pub enum UseTarget {
    /// Switch to an organization (prompts when no id is given)
    Org { id: Option<String> },
    /// Narrow to a company within the active organization
    Company { id: Option<String> },
    /// Narrow to a product within the active company
    Product { id: Option<String> },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Write a default config file
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "scopectl=debug"
    } else {
        "scopectl=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Status => cmd::cmd_status().await?,
        Commands::Orgs => cmd::cmd_orgs().await?,
        Commands::Companies => cmd::cmd_companies().await?,
        Commands::Products => cmd::cmd_products().await?,
        Commands::Use { target } => cmd::cmd_use(target).await?,
        Commands::Up => cmd::cmd_up().await?,
        Commands::Permissions => cmd::cmd_permissions().await?,
        Commands::Config { command } => cmd::cmd_config(command)?,
    }
    Ok(())
}
