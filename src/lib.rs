pub mod bio;
pub mod cli;
pub mod core;
pub mod storage;
pub mod utils;

pub use crate::core::{pipeline::Pipeline, reduce::Reducer};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaduceusError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Lookup error: {0}")]
    Lookup(String),

    #[error("Shape error: {0}")]
    Shape(String),

    #[error("Degenerate feature: {0}")]
    DegenerateFeature(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CaduceusError>;
