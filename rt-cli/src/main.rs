//! RoomThere CLI - command-line access to the RoomThere marketplace.
//!
//! Every subcommand is a thin wrapper over one accessor call, which makes
//! the CLI handy for scripting and for poking at a project's data while
//! debugging row-level security.

mod commands;

use clap::{Parser, Subcommand};
use tracing::{debug, info};

use rt_core::config::{AppConfig, ConfigHandle};
use rt_core::error::RtResult;
use rt_core::logging;

/// RoomThere - rooms for students, help for homeowners.
#[derive(Parser)]
#[command(
    name = "roomthere",
    version,
    about = "RoomThere marketplace CLI",
    long_about = "A command-line client for the RoomThere room-rental marketplace.\n\
                   Browse listings, manage applications, and message other users."
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json).
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output for scripting.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show configuration, backend reachability, and the signed-in user.
    Status,
    /// Sign up, sign in, and sign out.
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// View and edit profiles.
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },
    /// Browse and manage room listings.
    Listings {
        #[command(subcommand)]
        action: commands::listings::ListingsAction,
    },
    /// Apply to listings and review applications.
    Applications {
        #[command(subcommand)]
        action: commands::applications::ApplicationsAction,
    },
    /// Conversations and messages.
    Messages {
        #[command(subcommand)]
        action: commands::messages::MessagesAction,
    },
    /// Saved listings.
    Saved {
        #[command(subcommand)]
        action: commands::saved::SavedAction,
    },
    /// Contact the RoomThere team or report a problem.
    Contact {
        #[command(subcommand)]
        action: commands::contact::ContactAction,
    },
}

#[tokio::main]
async fn main() -> RtResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match cli.config.as_deref() {
        Some(path) => AppConfig::load_from_file(std::path::Path::new(path))?,
        None => AppConfig::load_default()?,
    };
    config.apply_env_overrides();

    // Initialize logging
    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    let log_dir = config
        .effective_log_dir()
        .unwrap_or_else(|_| std::path::PathBuf::from("logs"));
    let _guard = logging::init_logging(&log_level, &log_dir, config.logging.json_output)?;

    info!("RoomThere CLI v{}", rt_core::constants::APP_VERSION);
    debug!("backend: {}", config.backend.url);

    let config_handle = ConfigHandle::new(config);

    // Dispatch to command handlers
    match cli.command {
        Commands::Status => commands::status::run(config_handle, cli.format).await,
        Commands::Auth { action } => commands::auth::run(config_handle, action, cli.format).await,
        Commands::Profile { action } => {
            commands::profile::run(config_handle, action, cli.format).await
        }
        Commands::Listings { action } => {
            commands::listings::run(config_handle, action, cli.format).await
        }
        Commands::Applications { action } => {
            commands::applications::run(config_handle, action, cli.format).await
        }
        Commands::Messages { action } => {
            commands::messages::run(config_handle, action, cli.format).await
        }
        Commands::Saved { action } => commands::saved::run(config_handle, action, cli.format).await,
        Commands::Contact { action } => {
            commands::contact::run(config_handle, action, cli.format).await
        }
    }
}
