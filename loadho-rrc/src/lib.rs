//! Load-adaptive A2/A4 handover decision core
//!
//! Two independent loops share one piece of state, the per-cell serving
//! threshold:
//!
//! ```text
//!   MeasurementReport ──> HandoverEvaluator ──> HandoverDecision
//!                               │ reads
//!                               ▼
//!                        ThresholdSource  (StaticThreshold | ThresholdTable)
//!                               ▲ writes
//!                               │
//!   AttachmentView ──> LoadSampler ──> ThresholdController
//! ```
//!
//! The controller is the sole writer of the table; the evaluator only reads
//! it, so the adaptive and static variants differ only in which
//! [`ThresholdSource`] the evaluator is handed.

pub mod controller;
pub mod evaluator;
pub mod load;
pub mod measurement;
pub mod threshold;

pub use controller::{ThresholdController, ThresholdUpdate};
pub use evaluator::{
    DiscardReason, EvaluatorStats, HandoverDecision, HandoverEvaluator, ReportOutcome,
    UeHandoverContext, UeHandoverState,
};
pub use load::{AttachmentView, LoadSample, LoadSampler};
pub use measurement::MeasurementReport;
pub use threshold::{StaticThreshold, ThresholdPolicy, ThresholdSource, ThresholdTable};
