//! Error types for pfcluster-core.

use thiserror::Error;

/// Result type alias for pfcluster operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for pfcluster operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Layer code that does not name a calorimeter layer.
    #[error("unknown layer code: {0}")]
    UnknownLayer(i32),

    /// Two cells of one subsystem share a detector id.
    #[error("duplicate detector id: {0}")]
    DuplicateDetectorId(u32),

    /// Configuration error.
    #[error("configuration error: {0}")]
    InvalidConfig(String),
}
