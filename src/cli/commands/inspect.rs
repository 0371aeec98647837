use crate::cli::formatter::{format_number, print_item, print_section};
use crate::core::encoding::SegmentEncoding;
use crate::core::order::OrderRecord;
use crate::core::recombine::FeatureTable;
use crate::core::reduce::Embedding;
use crate::storage::{self, ArtifactKind};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Artifact file to summarize
    #[arg(value_name = "ARTIFACT")]
    pub path: PathBuf,
}

pub fn run(args: InspectArgs) -> anyhow::Result<()> {
    let header = storage::read_header(&args.path)?;

    print_section(&format!("{} ({})", header.kind, args.path.display()));
    print_item("Created", &header.created.to_rfc3339());

    match header.kind {
        ArtifactKind::Features => {
            let (_, table): (_, FeatureTable) =
                storage::read_artifact(&args.path, ArtifactKind::Features)?;
            print_item("Universe", &table.universe().to_string());
            print_item("Entities", &format_number(table.len()));
            print_item("Segments", &table.segments().join(", "));
            print_item(
                "Row width",
                &format!(
                    "{} ({} x {})",
                    format_number(table.width()),
                    table.segments().len(),
                    format_number(table.segment_length())
                ),
            );
            print_item("Sample keys", &sample(table.keys()));
        }
        ArtifactKind::Embedding => {
            let (_, embedding): (_, Embedding) =
                storage::read_artifact(&args.path, ArtifactKind::Embedding)?;
            print_item(
                "Shape",
                &format!("{} x {}", format_number(embedding.len()), embedding.dim()),
            );
        }
        ArtifactKind::Order => {
            let (_, order): (_, OrderRecord) =
                storage::read_artifact(&args.path, ArtifactKind::Order)?;
            print_item("Universe", &order.universe().to_string());
            print_item("Rows", &format_number(order.len()));
            print_item("Sample keys", &sample(order.keys().iter()));
        }
        ArtifactKind::SegmentEncoding => {
            let (_, encoding): (_, SegmentEncoding) =
                storage::read_artifact(&args.path, ArtifactKind::SegmentEncoding)?;
            print_item("Segment", encoding.segment());
            print_item("Entities", &format_number(encoding.len()));
            print_item("Uniform length", &format_number(encoding.length()));
            print_item("Sample keys", &sample(encoding.rows().keys()));
        }
    }
    Ok(())
}

fn sample<'a>(keys: impl Iterator<Item = &'a String>) -> String {
    const SHOWN: usize = 5;
    let mut taken: Vec<&String> = Vec::with_capacity(SHOWN + 1);
    let mut more = false;
    for key in keys {
        if taken.len() == SHOWN {
            more = true;
            break;
        }
        taken.push(key);
    }
    let mut out = taken
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    if more {
        out.push_str(", ...");
    }
    out
}
