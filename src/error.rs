use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the simulator
#[derive(Error, Debug)]
pub enum SimulatorError {
    #[error("Failed to load trace: {0}")]
    TraceError(#[from] TraceError),

    #[error("Invalid configuration: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Memory error: {0}")]
    MemoryError(#[from] MemoryError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

/// Errors related to reading trace files
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Failed to read trace file '{0}': {1}")]
    FileReadError(PathBuf, #[source] std::io::Error),

    #[error("Invalid format at line {0}: expected 'op address'")]
    InvalidFormat(usize),

    #[error("Invalid operation '{1}' at line {0}: expected 'r' or 'w'")]
    InvalidOperation(usize, String),

    #[error("Invalid hexadecimal address '{1}' at line {0}")]
    InvalidAddress(usize, String),
}

/// Errors related to the hierarchy configuration
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Block size {0} is not a power of 2")]
    BlockSizeNotPowerOfTwo(u64),

    #[error("{0} associativity must be at least 1")]
    ZeroAssociativity(&'static str),

    #[error("{level} size {size} is not a multiple of {set_bytes} (block size x associativity)")]
    UnevenSize {
        level: &'static str,
        size: u64,
        set_bytes: u64,
    },

    #[error("{0} has no sets")]
    NoSets(&'static str),

    #[error("{0} set count {1} is not a power of 2")]
    SetsNotPowerOfTwo(&'static str, u64),

    #[error("Unknown replacement policy '{0}'")]
    UnknownReplacementPolicy(String),

    #[error("Unknown inclusion property '{0}'")]
    UnknownInclusionPolicy(String),
}

/// Errors related to cache state
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Cache inconsistency detected at level {0}: {1}")]
    CacheInconsistency(usize, String),
}

/// Type alias for Result with SimulatorError
pub type SimulatorResult<T> = Result<T, SimulatorError>;
