//! Error types for the ride ledger

use thiserror::Error;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Registry errors
#[derive(Error, Debug)]
pub enum Error {
    /// Unknown ride ID
    #[error("Ride not found: {0}")]
    NotFound(String),

    /// Operation not valid for the ride's current status
    #[error("{0}")]
    InvalidState(String),

    /// Caller lacks the required role for the ride
    #[error("{0}")]
    Unauthorized(String),

    /// Malformed coordinates, price, or identity
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
