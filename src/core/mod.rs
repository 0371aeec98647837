pub mod align;
pub mod config;
pub mod encoding;
pub mod gapfill;
pub mod identity;
pub mod order;
pub mod pipeline;
pub mod recombine;
pub mod reduce;
pub mod universe;

pub use config::{Config, ErrorPolicy, ReductionStrategy};
pub use encoding::{RawSegmentEncoding, SegmentEncoding};
pub use order::OrderRecord;
pub use pipeline::{reduce_features, EmbedReport, EncodeReport, Pipeline};
pub use recombine::FeatureTable;
pub use reduce::{Embedding, Reducer};
pub use universe::{ParseRule, Universe, UniverseSpec};
