//! # Kernel Error Types
//!
//! Only loading and validating configuration can fail. Tick operations
//! never return errors: unknown identifiers are `None`, growth is
//! unconditional and blocked units revert.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the kernel's fallible entry points.
#[derive(Error, Debug)]
pub enum SimError {
    /// The configuration text is not valid TOML for [`crate::SimConfig`].
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A configuration or scenario file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration parsed but holds values the kernel cannot run with.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A scenario (spawn list) is malformed.
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),
}

/// Result type for kernel setup operations.
pub type SimResult<T> = Result<T, SimError>;
