//! Common types and utilities for loadho
//!
//! This crate provides shared identifiers, configuration structures, the
//! error type, logging bootstrap and the simulation clock used across all
//! loadho crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod sim_tick;
pub mod types;

pub use config::{
    ControllerConfig, EngineConfig, HandoverConfig, ThresholdMode, DEFAULT_CONTROLLER_PERIOD_MS,
    DEFAULT_LOAD_HIGH_WATERMARK, DEFAULT_LOAD_THRESHOLD, DEFAULT_NEIGHBOUR_OFFSET,
    DEFAULT_SERVING_THRESHOLD, DEFAULT_TIME_TO_TRIGGER_MS,
};
pub use error::{ConfigValidationError, Error};
pub use logging::{
    init_logging, init_logging_with_filter, log_cell_load, log_handover_decision, LogLevel,
};
pub use sim_tick::{RecurringTimer, SimulationClock, SimulationTimeConfig};
pub use types::{CellId, Quality, UeId, QUALITY_MAX};
