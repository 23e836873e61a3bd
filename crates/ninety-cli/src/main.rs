mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ninety",
    version,
    about = "Structured data extraction from IRS Form 990 filings"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract fields from a Form 990 PDF
    Extract {
        /// Path to the PDF file
        input_file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the full JSON response to a file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// JSON config file overriding extraction defaults
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Minimum overall confidence to pass (overrides config)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Relative tolerance for consistency checks (overrides config)
        #[arg(long)]
        tolerance: Option<rust_decimal::Decimal>,

        /// Show every field, including absent ones
        #[arg(long)]
        show_all: bool,
    },
    /// Run each extraction backend and report what it sees, without
    /// extracting fields
    Inspect {
        /// Path to the PDF file
        input_file: PathBuf,

        /// Only run the named backend (pdftotext or lopdf)
        #[arg(short, long)]
        backend: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            input_file,
            output,
            out,
            config,
            threshold,
            tolerance,
            show_all,
        } => commands::extract::run(input_file, &output, out, config, threshold, tolerance, show_all),
        Commands::Inspect {
            input_file,
            backend,
        } => commands::inspect::run(input_file, backend.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
