//! Blueprint CLI
//!
//! Command-line host for the blueprint generation orchestrator

use blueprint_cli::commands;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "blueprint")]
#[command(about = "Blueprint - Engagement blueprint generation console", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate one blueprint and follow it to completion
    Generate(commands::generate::GenerateArgs),
    /// Interactive console reading commands from stdin
    Console(commands::console::ConsoleArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate(args) => commands::generate::execute(args),
        Commands::Console(args) => commands::console::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
