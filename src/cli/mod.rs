pub mod commands;

use clap::{Parser, Subcommand};
use crate::app::App;
use crate::config::Config;
use crate::error::Result;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "zirin")]
#[command(about = "Contes et devinettes du Mali, disponibles hors ligne")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "ZIRIN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Browse stories
    Contes {
        #[command(subcommand)]
        action: ConteCommand,
    },

    /// Browse and play riddles
    Devinettes {
        #[command(subcommand)]
        action: DevinetteCommand,
    },

    /// Warm the story and riddle caches
    Sync,

    /// Drop every cached partition
    ClearCache,

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConteCommand {
    /// List stories (cache first)
    List {
        /// Only free stories
        #[arg(long, conflicts_with = "premium")]
        free: bool,

        /// Only premium stories
        #[arg(long)]
        premium: bool,
    },

    /// Show one story (cache first)
    Show {
        id: String,
    },

    /// Search stories on the server
    Search {
        query: String,
    },

    /// List stories of a category on the server
    Category {
        name: String,
    },

    /// Download a story for offline use
    Download {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum DevinetteCommand {
    /// List riddles (cache first)
    List {
        /// Facile, Moyen or Difficile
        #[arg(long)]
        difficulty: Option<String>,
    },

    /// Reveal a hint
    Hint {
        id: String,

        /// Zero-based hint index
        #[arg(default_value_t = 0)]
        index: usize,
    },

    /// Check an answer
    Answer {
        id: String,
        answer: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => Config::default_path()?,
        };

        // Completions and init need neither logging nor the dependency graph.
        match self.command {
            Commands::Completions { shell } => {
                commands::generate_completions(shell);
                return Ok(());
            }
            Commands::Init { force } => return commands::init(&config_path, force),
            _ => {}
        }

        let config = Config::load_or_default(&config_path)?;
        let _log_guard = commands::init_logging(&config.logging, self.debug, self.verbose)?;
        let app = App::from_config(&config)?;

        let result = match self.command {
            Commands::Contes { action } => commands::contes(&app, action).await,
            Commands::Devinettes { action } => commands::devinettes(&app, action).await,
            Commands::Sync => commands::sync(&app).await,
            Commands::ClearCache => commands::clear_cache(&app).await,
            Commands::Completions { .. } | Commands::Init { .. } => Ok(()),
        };

        if let Err(e) = &result {
            debug!(code = e.error_code(), error = %e, "Command failed");
        }
        result
    }
}
