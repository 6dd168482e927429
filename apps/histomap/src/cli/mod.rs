//! # Histomap CLI Module
//!
//! ## Available Commands
//!
//! - `serve` - Start the HTTP server (default)
//! - `render` - Render the map once to an SVG file
//! - `inspect` - Print the per-country styling and the join report

mod commands;

use crate::config::AppConfig;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use histomap_core::{HistomapError, Language};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Histomap - world map of historionomic stages
///
/// Colors each country by the stage recorded in the classification sheet,
/// with hatch overlays for reboots and heterogeneous sub-entities.
#[derive(Parser, Debug)]
#[command(name = "histomap")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Render the map to an SVG file
    Render {
        /// Label language (FR, EN)
        #[arg(short, long, default_value = "FR")]
        lang: Language,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Date stamped into the title (YYYY-MM-DD, default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Print the joined view and the join report
    Inspect {
        /// Label language (FR, EN)
        #[arg(short, long, default_value = "FR")]
        lang: Language,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), HistomapError> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Serve { host, port }) => cmd_serve(config, &host, port).await,
        Some(Commands::Render { lang, output, date }) => {
            cmd_render(&config, json_mode, lang, &output, date).await
        }
        Some(Commands::Inspect { lang }) => cmd_inspect(&config, json_mode, lang).await,
        // No subcommand - serve on the default address
        None => cmd_serve(config, "127.0.0.1", 8080).await,
    }
}
