use crate::cli::commands::{CommonOpts, EncodeOpts, UniverseOpts};
use crate::cli::formatter::{format_number, print_item, print_section, print_success, print_warning};
use crate::core::pipeline::Pipeline;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct EncodeArgs {
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
    pub common: CommonOpts,
}

pub fn run(args: EncodeArgs) -> anyhow::Result<()> {
    let mut config = args.common.load()?;
    args.encode.apply(&mut config);
    config.validate()?;

    let spec = args.universe.build_spec()?;
    if !args.common.quiet {
        print_section(&format!("Encoding the {} universe", spec.universe()));
    }

    let pipeline = Pipeline::new(config, spec).with_silent(args.common.quiet);
    let (features, report) = pipeline.encode_features(&args.input, &args.output)?;

    if !args.common.quiet {
        print_item("Entities", &format_number(features.len()));
        print_item("Segments", &report.segments.join(", "));
        print_item("Feature width", &format_number(features.width()));
        if report.skipped > 0 {
            print_warning(&format!(
                "{} sequence(s) skipped, see encode_failures.log",
                format_number(report.skipped)
            ));
        }
        print_success(&format!(
            "Feature table written to {}",
            crate::storage::features_path(&args.output).display()
        ));
    }
    Ok(())
}
