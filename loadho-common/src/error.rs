//! Error types for loadho

use thiserror::Error;

use crate::types::{CellId, Quality};

/// Error types for the loadho library.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration failed validation.
    #[error("Configuration validation failed: {0}")]
    Validation(#[from] ConfigValidationError),

    /// Scenario description errors.
    #[error("Scenario error: {0}")]
    Scenario(String),

    /// File I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Errors that can occur during configuration validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// A threshold or quality is outside the quantized scale
    #[error("{field} = {value} is outside the quality scale 0..={max}")]
    QualityOutOfRange {
        /// Offending field name
        field: &'static str,
        /// Configured value
        value: Quality,
        /// Scale upper bound
        max: Quality,
    },

    /// The loaded threshold would make cells stickier under load
    #[error("load_threshold {load} must not exceed default_threshold {default}")]
    LoadThresholdAboveDefault {
        /// Configured load threshold
        load: Quality,
        /// Configured default threshold
        default: Quality,
    },

    /// A period that drives a recurring timer is zero
    #[error("{0} must be non-zero")]
    ZeroPeriod(&'static str),

    /// Cell ID 0 is reserved for "not attached"
    #[error("Cell ID 0 is reserved and cannot be provisioned")]
    ReservedCellId,

    /// The same cell was provisioned twice
    #[error("Cell {0} is provisioned more than once")]
    DuplicateCell(CellId),
}
