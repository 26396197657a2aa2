//! Configuration structures for the handover engine
//!
//! This module provides configuration types for the A2/A4 evaluator, the
//! load-driven threshold controller and the simulation clock.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigValidationError;
use crate::sim_tick::SimulationTimeConfig;
use crate::types::{Quality, QUALITY_MAX};

/// Default serving-cell threshold applied to idle cells
pub const DEFAULT_SERVING_THRESHOLD: Quality = 30;
/// Default serving-cell threshold applied to loaded cells
pub const DEFAULT_LOAD_THRESHOLD: Quality = 20;
/// Attached-UE count above which a cell is considered loaded
pub const DEFAULT_LOAD_HIGH_WATERMARK: u32 = 13;
/// Default A4 margin over the serving threshold
pub const DEFAULT_NEIGHBOUR_OFFSET: Quality = 1;
/// Default A2 time-to-trigger (ms)
pub const DEFAULT_TIME_TO_TRIGGER_MS: u64 = 256;
/// Default controller period (ms)
pub const DEFAULT_CONTROLLER_PERIOD_MS: u64 = 500;

/// A2/A4 handover parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoverConfig {
    /// Serving-cell threshold for unloaded cells and unknown cells
    pub default_threshold: Quality,
    /// Serving-cell threshold applied while a cell is above the watermark
    pub load_threshold: Quality,
    /// Attached-UE count that switches a cell into load mode (strictly above)
    pub load_high_watermark: u32,
    /// Margin a neighbour must exceed over the serving threshold (A4)
    pub neighbour_offset: Quality,
    /// How long the A2 condition must hold before it fires (ms)
    pub time_to_trigger_ms: u64,
}

impl Default for HandoverConfig {
    fn default() -> Self {
        Self {
            default_threshold: DEFAULT_SERVING_THRESHOLD,
            load_threshold: DEFAULT_LOAD_THRESHOLD,
            load_high_watermark: DEFAULT_LOAD_HIGH_WATERMARK,
            neighbour_offset: DEFAULT_NEIGHBOUR_OFFSET,
            time_to_trigger_ms: DEFAULT_TIME_TO_TRIGGER_MS,
        }
    }
}

impl HandoverConfig {
    /// Validates the handover parameters.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        check_quality("default_threshold", self.default_threshold)?;
        check_quality("load_threshold", self.load_threshold)?;
        check_quality("neighbour_offset", self.neighbour_offset)?;
        if self.load_threshold > self.default_threshold {
            return Err(ConfigValidationError::LoadThresholdAboveDefault {
                load: self.load_threshold,
                default: self.default_threshold,
            });
        }
        Ok(())
    }
}

fn check_quality(field: &'static str, value: Quality) -> Result<(), ConfigValidationError> {
    if value > QUALITY_MAX {
        return Err(ConfigValidationError::QualityOutOfRange {
            field,
            value,
            max: QUALITY_MAX,
        });
    }
    Ok(())
}

/// Which threshold strategy the evaluator reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMode {
    /// Fixed threshold for every cell (plain A2/A4 baseline)
    Static,
    /// Per-cell thresholds rewritten by the load controller
    #[default]
    Adaptive,
}

impl fmt::Display for ThresholdMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdMode::Static => write!(f, "static"),
            ThresholdMode::Adaptive => write!(f, "adaptive"),
        }
    }
}

/// Load sampler / threshold controller parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Threshold strategy
    pub mode: ThresholdMode,
    /// Sampling period (ms)
    pub period_ms: u64,
    /// Time of the first sampling tick (ms)
    pub start_offset_ms: u64,
    /// Include provisioned cells with no attached UE in every sample,
    /// resetting their threshold to the default
    pub reset_empty_cells: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            mode: ThresholdMode::Adaptive,
            period_ms: DEFAULT_CONTROLLER_PERIOD_MS,
            start_offset_ms: DEFAULT_CONTROLLER_PERIOD_MS,
            reset_empty_cells: true,
        }
    }
}

impl ControllerConfig {
    /// Validates the controller parameters.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.period_ms == 0 {
            return Err(ConfigValidationError::ZeroPeriod("controller.period_ms"));
        }
        Ok(())
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// A2/A4 parameters
    pub handover: HandoverConfig,
    /// Load controller parameters
    pub controller: ControllerConfig,
    /// Simulation clock
    pub time: SimulationTimeConfig,
}

impl EngineConfig {
    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.handover.validate()?;
        self.controller.validate()?;
        if self.time.tick_duration_ms == 0 {
            return Err(ConfigValidationError::ZeroPeriod("time.tick_duration_ms"));
        }
        Ok(())
    }
}

// ============================================================================
// YAML Configuration Parsing
// ============================================================================

use crate::error::Error;
use std::fs;
use std::path::Path;

impl EngineConfig {
    /// Parses an engine configuration from a YAML string.
    ///
    /// Missing sections and fields take their defaults.
    ///
    /// # Example
    /// ```
    /// use loadho_common::EngineConfig;
    ///
    /// let yaml = r#"
    /// handover:
    ///   load_threshold: 15
    /// controller:
    ///   period_ms: 1000
    /// "#;
    ///
    /// let config = EngineConfig::from_yaml(yaml).unwrap();
    /// assert_eq!(config.handover.load_threshold, 15);
    /// assert_eq!(config.handover.default_threshold, 30);
    /// assert_eq!(config.controller.period_ms, 1000);
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads an engine configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Serializes the configuration to YAML.
    pub fn to_yaml(&self) -> Result<String, Error> {
        Ok(serde_yaml::to_string(self)?)
    }
}
