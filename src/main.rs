use caduceus::cli::{Cli, Commands};
use caduceus::CaduceusError;
use clap::Parser;
use colored::*;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    // Initialize logging with CADUCEUS_LOG environment variable support
    let log_level = std::env::var("CADUCEUS_LOG").unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);

        // Use appropriate exit codes based on error type
        let exit_code = match e.downcast_ref::<CaduceusError>() {
            Some(CaduceusError::Config(_)) => 2,
            Some(CaduceusError::Io(_)) | Some(CaduceusError::AlreadyExists(_)) => 3,
            Some(CaduceusError::Parse(_))
            | Some(CaduceusError::Lookup(_))
            | Some(CaduceusError::Shape(_))
            | Some(CaduceusError::Serialization(_)) => 4,
            Some(CaduceusError::DegenerateFeature(_)) => 5,
            _ => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // Configure thread pool
    let num_threads = if cli.threads == 0 {
        num_cpus::get()
    } else {
        cli.threads
    };

    // Initialize Rayon thread pool
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .expect("Failed to initialize thread pool");

    if cli.verbose > 0 {
        eprintln!("Using {} threads", num_threads);
    }

    match cli.command {
        Commands::Embed(args) => caduceus::cli::commands::embed::run(args),
        Commands::Encode(args) => caduceus::cli::commands::encode::run(args),
        Commands::Reduce(args) => caduceus::cli::commands::reduce::run(args),
        Commands::Inspect(args) => caduceus::cli::commands::inspect::run(args),
    }
}
