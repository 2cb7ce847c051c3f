// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (RUST_LOG controls the level, default "info")
// 2. Parse command-line arguments using clap
// 3. Resolve the package's dependency tree and download every package in it
// 4. Exit with proper code (0 = success, 1 = fatal error)
//
// Individual failures along the way (one page that didn't load, one .deb
// that failed) are logged as warnings and don't change the exit code.
// =============================================================================

// Module declarations - tells Rust about our other source files
mod app;           // src/app.rs - wiring for a whole run
mod cli;           // src/cli.rs - command-line parsing
mod config;        // src/config.rs - settings shared by every resolver task
mod error;         // src/error.rs - error types
mod page;          // src/page/ - fetching and reading index pages
mod pipeline;      // src/pipeline/ - download queue and workers
mod resolve;       // src/resolve/ - dependency tree walk
mod retry;         // src/retry.rs - retry with backoff

#[cfg(test)]
mod fixtures;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

use anyhow::Result;

#[tokio::main]
async fn main() {
    // Logs go to stderr so --json output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = app::Settings::from_cli(&cli)?;

    if !cli.json {
        println!(
            "🔍 Resolving {} ({}/{}) from {}",
            settings.package,
            settings.config.version,
            settings.config.arch,
            settings.config.mirror
        );
    }

    let summary = app::run(&settings).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "✅ Finished downloading packages to: {}",
            summary.output_dir.display()
        );
    }

    Ok(())
}
