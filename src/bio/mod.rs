pub mod fasta;
pub mod properties;
pub mod sequence;

pub use fasta::{parse_fasta, parse_fasta_from_bytes, write_fasta};
pub use properties::{ResidueTable, BUILTIN_TABLES};
pub use sequence::AlignedSequence;
