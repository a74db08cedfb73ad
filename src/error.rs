//! Error types shared by the simulators, the evaluators and the results writer.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Proof verification rejected a forged proof for dataset size {dataset_size}")]
    VerificationFailed { dataset_size: u64 },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SimError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SimError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
