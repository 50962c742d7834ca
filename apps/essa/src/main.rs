//! # ESSA - Early-Stage Sustainability Assessment
//!
//! The main binary for the ESSA questionnaire.
//!
//! This application provides:
//! - CLI interface walking a project through the five wizard steps
//! - HTTP REST API server (axum-based) for a browser front end
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │             apps/essa (THE BINARY)           │
//! │                                              │
//! │   ┌─────────────┐        ┌─────────────┐     │
//! │   │    CLI      │        │  HTTP API   │     │
//! │   │   (clap)    │        │   (axum)    │     │
//! │   └──────┬──────┘        └──────┬──────┘     │
//! │          └───────────┬──────────┘            │
//! │                      ▼                       │
//! │              ┌───────────────┐               │
//! │              │   essa-core   │               │
//! │              │  (THE LOGIC)  │               │
//! │              └───────────────┘               │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! essa new "Bio-based insulation"
//! essa trl 5
//! essa stages mark "Use phase"
//! essa factors --defaults
//! essa score "Use phase" "Climate change" 2 --note "Lower heating demand"
//! essa results
//! essa export -o results.csv
//!
//! # Start the HTTP server
//! essa server --host 0.0.0.0 --port 8080
//! ```

use clap::Parser;
use essa::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Initialize tracing: ESSA_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("ESSA_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "essa=debug,tower_http=debug"
    } else {
        "essa=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

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

    // Display startup banner
    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the ESSA startup banner.
fn print_banner() {
    println!(
        r#"
  ███████╗███████╗███████╗ █████╗
  ██╔════╝██╔════╝██╔════╝██╔══██╗
  █████╗  ███████╗███████╗███████║
  ██╔══╝  ╚════██║╚════██║██╔══██║
  ███████╗███████║███████║██║  ██║
  ╚══════╝╚══════╝╚══════╝╚═╝  ╚═╝

  Early-Stage Sustainability Assessment v{}

  Environmental • Social • Economic
"#,
        env!("CARGO_PKG_VERSION")
    );
}
