use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unexpected transcript retrieval method: {0}")]
    UnknownMethod(String),
    #[error("Required {what} file not found: {path:?}")]
    MissingFile { what: &'static str, path: PathBuf },
    #[error("{what} is required for region method '{method}' but none was configured")]
    Unconfigured { what: &'static str, method: String },
    #[error("Chromosome {0} is not present in the chromosome sizes table")]
    UnknownChromosome(String),
    #[error("Invalid transcript window: {0}")]
    InvalidWindow(String),
}

/// Raised when a batch-wide computation returns a different set of samples
/// than it was given.
#[derive(Error, Debug)]
#[error("Inconsistent samples in and out of SV bin calculation:\nout: {actual:?}\nin : {expected:?}")]
pub struct ConsistencyError {
    pub expected: Vec<String>,
    pub actual: Vec<String>,
}
