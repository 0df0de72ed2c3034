//! ShelfDB CLI
//!
//! Command-line tools for trying out ShelfDB collections.
//!
//! # Commands
//!
//! - `query` - Load documents from a JSON file, index a field and run a range query
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use commands::query::{IndexChoice, OutputFormat, QueryArgs, RangeOp};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// ShelfDB command-line tools.
#[derive(Parser)]
#[command(name = "shelfdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a range query over documents read from a JSON file
    Query {
        /// JSON file holding an array of objects
        #[arg(short, long)]
        input: PathBuf,

        /// Field path to query (dotted paths reach into nested objects)
        #[arg(long)]
        field: String,

        /// Index to build on the field before querying
        #[arg(long, value_enum, default_value_t = IndexChoice::Ordered)]
        index: IndexChoice,

        /// Make the index unique
        #[arg(long)]
        unique: bool,

        /// Range operator
        #[arg(long, value_enum)]
        op: RangeOp,

        /// Operand, or lower bound for two-sided ranges (parsed as JSON, else text)
        #[arg(long)]
        value: String,

        /// Upper bound for two-sided ranges
        #[arg(long)]
        upper: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Query {
            input,
            field,
            index,
            unique,
            op,
            value,
            upper,
            format,
        } => {
            commands::query::run(&QueryArgs {
                input,
                field,
                index,
                unique,
                op,
                value,
                upper,
                format,
            })?;
        }
        Commands::Version => {
            println!("ShelfDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("ShelfDB Core v{}", shelfdb_core::VERSION);
        }
    }

    Ok(())
}
