pub mod artifacts;

pub use artifacts::{
    read_artifact, read_header, write_artifact, write_failures_log, ArtifactHeader, ArtifactKind,
    CADUCEUS_MAGIC,
};

use std::path::{Path, PathBuf};

pub const FEATURES_FILE: &str = "features.bin";
pub const EMBEDDING_FILE: &str = "embedding.bin";
pub const ORDER_FILE: &str = "order.bin";
pub const FAILURES_FILE: &str = "encode_failures.log";
pub const SEGMENTS_DIR: &str = "segments";

pub fn features_path(output_dir: &Path) -> PathBuf {
    output_dir.join(FEATURES_FILE)
}

pub fn embedding_path(output_dir: &Path) -> PathBuf {
    output_dir.join(EMBEDDING_FILE)
}

pub fn order_path(output_dir: &Path) -> PathBuf {
    output_dir.join(ORDER_FILE)
}

pub fn failures_path(output_dir: &Path) -> PathBuf {
    output_dir.join(FAILURES_FILE)
}

pub fn segment_encoding_path(output_dir: &Path, segment: &str) -> PathBuf {
    output_dir.join(SEGMENTS_DIR).join(format!("{}.enc", segment))
}
