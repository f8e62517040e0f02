//! Kizu Checker - vehicle damage inspection using AI photo analysis
//!
//! A CLI tool that analyzes vehicle photos from fixed angles, records each
//! inspection pass as a stage, and compares stages over time.

mod cli;
mod commands;
mod output;

use clap::Parser;
use cli::Cli;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = commands::execute(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
