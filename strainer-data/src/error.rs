//! Error types for extraction, packaging and the combined pipeline.

use crate::types::Channel;
use thiserror::Error;

/// Errors raised while pulling arrays out of a geometry provider.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported source format: {0}")]
    UnsupportedSourceFormat(String),

    #[error("Polygon {polygon} references point {index}, but only {point_count} points exist")]
    IndexOutOfRange {
        polygon: usize,
        index: i64,
        point_count: usize,
    },

    #[error("Polygon run at offset {offset} declares {count} vertices but the sequence has {len} entries")]
    TruncatedRun { offset: usize, count: i64, len: usize },

    /// Absence of an optional channel. The extractor recovers from this locally.
    #[error("Missing channel: {0}")]
    MissingChannel(Channel),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while packaging extracted geometry.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Cannot normalize values: every value equals {value}")]
    DegenerateNormalization { value: f32 },

    #[error("Polygon {polygon} references point {index}, but only {point_count} points exist")]
    IndexOutOfRange {
        polygon: usize,
        index: u32,
        point_count: usize,
    },
}

/// Any failure surfaced by a full pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("Packaging failed: {0}")]
    Package(#[from] PackageError),
}
