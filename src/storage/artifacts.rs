//! Artifact persistence.
//!
//! Every derived artifact is a bincode payload behind a small envelope:
//! magic bytes (which carry the format version), then a header naming the
//! artifact kind and creation time, then the payload. Readers verify the
//! magic and the kind before touching the payload, so a mixed-up file path
//! fails with a clear message instead of a deserializer backtrace.

use crate::core::encoding::EncodeFailure;
use crate::CaduceusError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

pub const CADUCEUS_MAGIC: &[u8] = b"CADU\x01";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    SegmentEncoding,
    Features,
    Embedding,
    Order,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::SegmentEncoding => write!(f, "segment encoding"),
            ArtifactKind::Features => write!(f, "feature table"),
            ArtifactKind::Embedding => write!(f, "embedding"),
            ArtifactKind::Order => write!(f, "order record"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactHeader {
    pub kind: ArtifactKind,
    pub created: DateTime<Utc>,
}

/// Write an artifact, refusing to clobber existing output unless the
/// overwrite flag is set.
pub fn write_artifact<T: Serialize, P: AsRef<Path>>(
    path: P,
    kind: ArtifactKind,
    payload: &T,
    overwrite: bool,
) -> Result<(), CaduceusError> {
    let path = path.as_ref();
    if path.exists() && !overwrite {
        return Err(CaduceusError::AlreadyExists(format!(
            "{} (pass --overwrite to replace it)",
            path.display()
        )));
    }

    let header = ArtifactHeader {
        kind,
        created: Utc::now(),
    };

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(CADUCEUS_MAGIC)?;
    bincode::serialize_into(&mut writer, &header)
        .map_err(|e| CaduceusError::Serialization(format!("{}: {}", path.display(), e)))?;
    bincode::serialize_into(&mut writer, payload)
        .map_err(|e| CaduceusError::Serialization(format!("{}: {}", path.display(), e)))?;
    writer.flush()?;
    Ok(())
}

/// Read just the envelope header, leaving the payload untouched.
pub fn read_header<P: AsRef<Path>>(path: P) -> Result<ArtifactHeader, CaduceusError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    check_magic(&mut reader, path)?;
    bincode::deserialize_from(&mut reader)
        .map_err(|e| CaduceusError::Serialization(format!("{}: bad header: {}", path.display(), e)))
}

/// Read an artifact of a known kind.
pub fn read_artifact<T: DeserializeOwned, P: AsRef<Path>>(
    path: P,
    expected: ArtifactKind,
) -> Result<(ArtifactHeader, T), CaduceusError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    check_magic(&mut reader, path)?;

    let header: ArtifactHeader = bincode::deserialize_from(&mut reader).map_err(|e| {
        CaduceusError::Serialization(format!("{}: bad header: {}", path.display(), e))
    })?;
    if header.kind != expected {
        return Err(CaduceusError::Serialization(format!(
            "{} holds a {} artifact, expected a {}",
            path.display(),
            header.kind,
            expected
        )));
    }

    let payload: T = bincode::deserialize_from(&mut reader).map_err(|e| {
        CaduceusError::Serialization(format!("{}: bad payload: {}", path.display(), e))
    })?;
    Ok((header, payload))
}

fn check_magic<R: Read>(reader: &mut R, path: &Path) -> Result<(), CaduceusError> {
    let mut magic = [0u8; 5];
    reader.read_exact(&mut magic)?;
    if magic != CADUCEUS_MAGIC {
        return Err(CaduceusError::Serialization(format!(
            "{} is not a caduceus artifact",
            path.display()
        )));
    }
    Ok(())
}

/// Write the encode failures log: one tab-separated line per skipped
/// sequence, in the order the failures occurred.
pub fn write_failures_log<P: AsRef<Path>>(
    path: P,
    failures: &[EncodeFailure],
) -> Result<(), CaduceusError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for failure in failures {
        writeln!(
            writer,
            "{}\t{}\t{}",
            failure.segment, failure.raw_id, failure.reason
        )?;
    }
    writer.flush()?;
    Ok(())
}
