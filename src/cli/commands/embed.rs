use crate::cli::commands::{CommonOpts, EncodeOpts, ReductionOpts, UniverseOpts};
use crate::cli::formatter::{format_number, print_item, print_section, print_success, print_warning};
use crate::core::pipeline::Pipeline;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct EmbedArgs {
    /// Directory of aligned per-segment FASTA files
    #[arg(value_name = "SEGMENTS_DIR")]
    pub input: PathBuf,

    /// Output directory for artifacts
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    #[command(flatten)]
    pub universe: UniverseOpts,

    #[command(flatten)]
    pub encode: EncodeOpts,

    #[command(flatten)]
    pub reduction: ReductionOpts,

    #[command(flatten)]
    pub common: CommonOpts,
}

pub fn run(args: EmbedArgs) -> anyhow::Result<()> {
    let mut config = args.common.load()?;
    args.encode.apply(&mut config);
    args.reduction.apply(&mut config);
    config.validate()?;

    let spec = args.universe.build_spec()?;
    if !args.common.quiet {
        print_section(&format!("Embedding the {} universe", spec.universe()));
    }

    let pipeline = Pipeline::new(config, spec).with_silent(args.common.quiet);
    let report = pipeline.embed(&args.input, &args.output)?;

    if !args.common.quiet {
        print_item("Entities", &format_number(report.encode.entities));
        print_item("Segments", &report.encode.segments.join(", "));
        print_item(
            "Feature width",
            &format!(
                "{} ({} x {})",
                format_number(report.encode.segments.len() * report.encode.segment_length),
                report.encode.segments.len(),
                format_number(report.encode.segment_length)
            ),
        );
        print_item(
            "Embedding",
            &format!(
                "{} x {} ({})",
                format_number(report.encode.entities),
                report.embedding_dim,
                report.strategy
            ),
        );
        if report.encode.zero_filled > 0 {
            print_item("Zero-filled", &format_number(report.encode.zero_filled));
        }
        if report.encode.dropped_keys > 0 {
            print_warning(&format!(
                "{} encoded key(s) were outside the universe and dropped",
                format_number(report.encode.dropped_keys)
            ));
        }
        if report.encode.skipped > 0 {
            print_warning(&format!(
                "{} sequence(s) skipped, see encode_failures.log",
                format_number(report.encode.skipped)
            ));
        }
        print_success(&format!("Artifacts written to {}", args.output.display()));
    }
    Ok(())
}
