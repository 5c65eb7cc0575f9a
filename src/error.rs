use std::path::PathBuf;
use thiserror::Error;

/// Broad class of a failure, used when reporting to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input detected before any simulation work starts.
    Parameter,
    /// The inputs are well formed but cannot support the requested work.
    DataSufficiency,
    /// A file or index could not be opened, read or written.
    Resource,
}

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("parameter error: {0}")]
    Parameter(String),

    #[error("could not parse region '{input}': {reason}")]
    RegionParse { input: String, reason: String },

    #[error(
        "region of {length} bp is too short to place {requested} {what} \
         (gave up after {attempts} placement attempts)"
    )]
    InsufficientRegionLength {
        /// `"rearrangements"` or `"indels"`.
        what: &'static str,
        length: usize,
        requested: usize,
        attempts: usize,
    },

    #[error("read length {read_length} exceeds the shortest allele ({allele_length} bp)")]
    AlleleTooShort {
        read_length: usize,
        allele_length: usize,
    },

    #[error("weighted fractionation needs at least one region weight")]
    EmptyFractionSpec,

    #[error("cannot access {}: {source}", path.display())]
    Resource {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl BenchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BenchError::Parameter(_) | BenchError::RegionParse { .. } => ErrorCategory::Parameter,
            BenchError::InsufficientRegionLength { .. }
            | BenchError::AlleleTooShort { .. }
            | BenchError::EmptyFractionSpec => ErrorCategory::DataSufficiency,
            BenchError::Resource { .. } => ErrorCategory::Resource,
        }
    }

    pub(crate) fn parameter(msg: impl Into<String>) -> Self {
        BenchError::Parameter(msg.into())
    }

    pub(crate) fn region(input: impl Into<String>, reason: impl Into<String>) -> Self {
        BenchError::RegionParse {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn resource<E>(path: impl Into<PathBuf>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        BenchError::Resource {
            path: path.into(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
