//! Error handling for epsmatch-core

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::seed::SeedError;

/// Main error type for pipeline operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Seeding error: {0}")]
    Seed(#[from] SeedError),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parsing error in {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("No sequences found in {}", .path.display())]
    EmptyInput { path: PathBuf },
}

impl Error {
    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn parse<P: Into<PathBuf>, S: Into<String>>(path: P, message: S) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
