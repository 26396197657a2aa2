//! loadho-sim - Discrete-event driver for the load-adaptive handover engine
//!
//! Runs the threshold controller and the A2/A4 evaluator over a single
//! simulated clock:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     HandoverEngine                       │
//! │  ┌────────────┐   thresholds   ┌──────────────────────┐  │
//! │  │ Controller │ ─────────────> │ ThresholdPolicy      │  │
//! │  └─────┬──────┘                └──────────┬───────────┘  │
//! │        │ attachments                      │ read         │
//! │  ┌─────┴──────────────────────────────────┴───────────┐  │
//! │  │                    Evaluator                       │  │
//! │  └─────────────────────────┬──────────────────────────┘  │
//! │                            │ decisions                   │
//! │                     ┌──────┴──────┐                      │
//! │                     │  Executor   │                      │
//! │                     └─────────────┘                      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use loadho_sim::Scenario;
//!
//! let scenario = Scenario::from_yaml_file("config/loaded-cell.yaml")?;
//! let mut engine = scenario.build_engine()?;
//! let trace = engine.run();
//! println!("{} handover(s)", trace.decisions.len());
//! ```

pub mod engine;
pub mod executor;
pub mod scenario;
pub mod scheduler;

pub use engine::{DiscardRecord, EngineTrace, HandoverEngine, OutcomeRecord};
pub use executor::{
    ExecutionResult, ExecutorConfig, FailureSpec, HandoverExecutor, ScriptedExecutor,
    DEFAULT_EXECUTION_DELAY_MS,
};
pub use scenario::{AttachmentSpec, DetachmentSpec, ReportSeries, Scenario};
pub use scheduler::{EventQueue, SimEvent};
