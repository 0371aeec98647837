pub mod commands;
pub mod formatter;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "caduceus",
    version,
    about = "Feature embedding for aligned multi-segment sequence sets",
    long_about = "Caduceus turns directories of aligned per-segment FASTA files into numeric \
                  feature vectors and low-dimensional embeddings, one row per pathogen or \
                  host entity, for downstream interaction models."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Number of threads to use (0 = all available)
    #[arg(short = 'j', long, default_value = "0", global = true)]
    pub threads: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline: encode, align, gap-fill, recombine, reduce
    Embed(commands::embed::EmbedArgs),

    /// Encode segments into the feature table, without reducing
    Encode(commands::encode::EncodeArgs),

    /// Reduce an existing feature table to an embedding
    Reduce(commands::reduce::ReduceArgs),

    /// Summarize a persisted artifact
    Inspect(commands::inspect::InspectArgs),
}
