use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    /// Malformed or truncated serialized input
    #[error("Format error: {0}")]
    Format(String),

    /// The open track resolved from the work stack is not the one the step describes
    #[error("Track mismatch: work stack expected track {expected}, step reports track {found}")]
    TrackMismatch { expected: u32, found: u32 },

    /// Step delivery violated an assembly precondition
    #[error("Consistency error: {0}")]
    Consistency(String),

    /// Collection index out of range
    #[error("Index {index} out of range for collection of {len} events")]
    Lookup { index: usize, len: usize },

    /// A persistence path could not be opened
    #[error("Cannot access {}: {source}", path.display())]
    Resource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl GraphError {
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn consistency(msg: impl Into<String>) -> Self {
        Self::Consistency(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn resource(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Resource {
            path: path.into(),
            source,
        }
    }

    /// True for errors raised by work-stack resolution
    pub fn is_consistency(&self) -> bool {
        matches!(self, Self::TrackMismatch { .. } | Self::Consistency(_))
    }
}
