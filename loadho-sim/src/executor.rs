//! Handover executor seam
//!
//! The executor stands in for the RRC/X2 signalling that carries out a
//! commanded handover. It answers each decision with a success or failure
//! that the engine feeds back to the evaluator after `delay_ms`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use loadho_common::UeId;
use loadho_rrc::HandoverDecision;

/// Default handover execution latency (ms)
pub const DEFAULT_EXECUTION_DELAY_MS: u64 = 20;

/// Executor verdict for one decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionResult {
    pub success: bool,
    /// Time until the outcome is reported back (ms)
    pub delay_ms: u64,
}

/// Carries out handover decisions.
pub trait HandoverExecutor {
    fn execute(&mut self, decision: &HandoverDecision) -> ExecutionResult;
}

/// Scripted failure budget for one UE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureSpec {
    /// Affected UE
    pub ue: UeId,
    /// Number of leading attempts that fail
    pub attempts: u32,
}

/// Executor configuration as written in a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    pub delay_ms: u64,
    pub failures: Vec<FailureSpec>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_EXECUTION_DELAY_MS,
            failures: Vec::new(),
        }
    }
}

/// Executor that succeeds unless a UE still has scripted failures left.
#[derive(Debug, Clone, Default)]
pub struct ScriptedExecutor {
    delay_ms: u64,
    remaining_failures: BTreeMap<UeId, u32>,
    executed: Vec<HandoverDecision>,
}

impl ScriptedExecutor {
    pub fn new(config: &ExecutorConfig) -> Self {
        let mut remaining_failures = BTreeMap::new();
        for spec in &config.failures {
            *remaining_failures.entry(spec.ue).or_insert(0) += spec.attempts;
        }
        Self {
            delay_ms: config.delay_ms,
            remaining_failures,
            executed: Vec::new(),
        }
    }

    /// Executor that always succeeds after `delay_ms`.
    pub fn always_succeed(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            ..Default::default()
        }
    }

    /// Every decision received so far, in order.
    pub fn executed(&self) -> &[HandoverDecision] {
        &self.executed
    }
}

impl HandoverExecutor for ScriptedExecutor {
    fn execute(&mut self, decision: &HandoverDecision) -> ExecutionResult {
        self.executed.push(*decision);
        let success = match self.remaining_failures.get_mut(&decision.ue_id) {
            Some(left) if *left > 0 => {
                *left -= 1;
                false
            }
            _ => true,
        };
        debug!(
            "Executing handover for UE {}: cell {} -> cell {}, will {}",
            decision.ue_id,
            decision.source,
            decision.target,
            if success { "succeed" } else { "fail" }
        );
        ExecutionResult {
            success,
            delay_ms: self.delay_ms,
        }
    }
}
