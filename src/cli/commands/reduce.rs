use crate::cli::commands::{CommonOpts, ReductionOpts};
use crate::cli::formatter::{format_number, print_item, print_section, print_success};
use crate::core::pipeline::reduce_features;
use crate::core::recombine::FeatureTable;
use crate::storage::{self, ArtifactKind};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ReduceArgs {
    /// Feature table artifact, or a directory containing features.bin
    #[arg(value_name = "FEATURES")]
    pub features: PathBuf,

    /// Output directory (defaults to the feature table's directory)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub reduction: ReductionOpts,

    #[command(flatten)]
    pub common: CommonOpts,
}

pub fn run(args: ReduceArgs) -> anyhow::Result<()> {
    let mut config = args.common.load()?;
    args.reduction.apply(&mut config);
    config.validate()?;

    let features_path = if args.features.is_dir() {
        storage::features_path(&args.features)
    } else {
        args.features.clone()
    };
    let output_dir = match &args.output {
        Some(dir) => dir.clone(),
        None => features_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let (_, features): (_, FeatureTable) =
        storage::read_artifact(&features_path, ArtifactKind::Features)?;

    if !args.common.quiet {
        print_section(&format!(
            "Reducing the {} universe feature table",
            features.universe()
        ));
        print_item("Entities", &format_number(features.len()));
        print_item("Feature width", &format_number(features.width()));
    }

    let (embedding, _) = reduce_features(&config, &features, &output_dir, args.common.quiet)?;

    if !args.common.quiet {
        print_item(
            "Embedding",
            &format!("{} x {}", format_number(embedding.len()), embedding.dim()),
        );
        print_success(&format!(
            "Embedding and order record written to {}",
            output_dir.display()
        ));
    }
    Ok(())
}
