//! # Histomap
//!
//! World map of historionomic stages, served as a page with a FR/EN
//! selector or rendered once from the command line.
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! histomap serve --host 0.0.0.0 --port 8080
//!
//! # One-shot render
//! histomap render --lang EN --output map.svg
//!
//! # Per-country styling and join report
//! histomap inspect --lang FR --json-mode
//! ```

use clap::Parser;
use histomap::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // HISTOMAP_LOG_FORMAT=json switches to machine-parseable output.
    let log_format = std::env::var("HISTOMAP_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "histomap=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!(
        r#"
  ╦ ╦╦╔═╗╔╦╗╔═╗╔╦╗╔═╗╔═╗
  ╠═╣║╚═╗ ║ ║ ║║║║╠═╣╠═╝
  ╩ ╩╩╚═╝ ╩ ╚═╝╩ ╩╩ ╩╩

  World Historionomic Map v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
