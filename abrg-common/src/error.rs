//! Common error types for the geocoder workspace

use thiserror::Error;

/// Common result type for geocoder operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the geocoder crates
#[derive(Error, Debug)]
pub enum Error {
    /// A key-derivation call received a missing or malformed component.
    ///
    /// Stages catch this at their boundary and degrade to no-match;
    /// it is never fatal for a request.
    #[error("Malformed key input: {field}")]
    MalformedKeyInput {
        /// Name of the offending key component (e.g. "lg_code")
        field: &'static str,
    },

    /// The storage collaborator could not serve a lookup table or open a
    /// per-municipality dataset. Fatal for the current request only.
    #[error("Storage provider error: {0}")]
    Provider(String),

    /// Invalid request rejected before the pipeline starts
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
