//! # ScienceSource Uploader
//!
//! Pushes annotated articles to a ScienceSource Wikibase instance.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │              apps/sciencesource (THE BINARY)         │
//! │                                                      │
//! │  ┌─────────────┐   ┌─────────────┐   ┌────────────┐  │
//! │  │    CLI      │   │   Config    │   │  Wikibase  │  │
//! │  │   (clap)    │   │   (toml)    │   │  (reqwest) │  │
//! │  └──────┬──────┘   └──────┬──────┘   └─────┬──────┘  │
//! │         └─────────────────┼────────────────┘         │
//! │                           ▼                          │
//! │                ┌────────────────────┐                │
//! │                │ sciencesource-core │                │
//! │                │    (THE LOGIC)     │                │
//! │                └────────────────────┘                │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! sciencesource labels
//! sciencesource resolve -o vocabulary.json
//! sciencesource upload -a article.json -t article.html -V vocabulary.json
//! sciencesource status -a article.json -V vocabulary.json
//! ```

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Parse first so --verbose can raise the default filter.
    let cli = cli::Cli::parse();

    // SCIENCESOURCE_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("SCIENCESOURCE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "sciencesource=debug,sciencesource_core=debug"
    } else {
        "sciencesource=info,sciencesource_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr; stdout carries command output.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  ScienceSource uploader v{}

  Article -> Annotations -> Anchor chain
"#,
        env!("CARGO_PKG_VERSION")
    );
}
