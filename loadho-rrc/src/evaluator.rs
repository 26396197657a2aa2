//! A2/A4 Handover Evaluator
//!
//! Per-UE two-stage event logic driven by periodic measurement reports.
//!
//! # State Machine
//!
//! ```text
//!              serving < thr(serving) held for TTT
//!   ┌────────┐ ───────────────────────────────────> ┌──────────┐
//!   │ Stable │                                      │ Degraded │
//!   └────────┘ <─────────────────────────────────── └────┬─────┘
//!       ▲        serving > thr(serving)                  │ best neighbour >
//!       │                                                │ thr(serving) + offset
//!       │ handover succeeded                             ▼
//!       │ (serving := target)               ┌───────────────────┐
//!       └────────────────────────────────── │ HandoverRequested │
//!                                           └─────────┬─────────┘
//!                      handover failed -> Degraded    │
//! ```
//!
//! The A4 floor is computed from the *current* threshold of the serving cell,
//! so a load-driven threshold drop makes both stages easier to satisfy.
//! All comparisons are strict; equality never moves the machine.
//!
//! # Reference
//! - 3GPP TS 36.331 §5.5.4.3 (Event A2), §5.5.4.5 (Event A4)

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use loadho_common::{log_handover_decision, CellId, HandoverConfig, Quality, UeId};

use crate::load::AttachmentView;
use crate::measurement::MeasurementReport;
use crate::threshold::ThresholdSource;

/// Evaluator state for a UE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum UeHandoverState {
    /// Serving quality adequate
    #[default]
    Stable,
    /// A2 fired, searching for a neighbour
    Degraded,
    /// Decision emitted, waiting for the executor
    HandoverRequested,
}

impl fmt::Display for UeHandoverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UeHandoverState::Stable => write!(f, "STABLE"),
            UeHandoverState::Degraded => write!(f, "DEGRADED"),
            UeHandoverState::HandoverRequested => write!(f, "HANDOVER_REQUESTED"),
        }
    }
}

/// Handover command handed to the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HandoverDecision {
    pub ue_id: UeId,
    pub source: CellId,
    pub target: CellId,
    /// Timestamp of the report that produced the decision (ms)
    pub time_ms: u64,
    /// Evaluator-wide sequence number; outcomes must quote it back
    pub attempt: u64,
}

/// Why a report was dropped without touching UE state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// No context for this UE
    UnknownUe,
    /// UE is not attached to any cell
    Unattached,
    /// Serving quality missing
    MissingServingQuality,
    /// Report refers to a cell that was never provisioned (or cell 0)
    UnknownCell(CellId),
    /// A decision is outstanding; the executor has not answered yet
    HandoverPending,
    /// Older than the last report already processed for this UE
    StaleTimestamp,
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscardReason::UnknownUe => write!(f, "unknown UE"),
            DiscardReason::Unattached => write!(f, "UE not attached"),
            DiscardReason::MissingServingQuality => write!(f, "missing serving quality"),
            DiscardReason::UnknownCell(cell) => write!(f, "unknown cell {cell}"),
            DiscardReason::HandoverPending => write!(f, "handover pending"),
            DiscardReason::StaleTimestamp => write!(f, "stale timestamp"),
        }
    }
}

/// Result of feeding one report to the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Report dropped; state unchanged
    Discarded(DiscardReason),
    /// Report evaluated; state unchanged
    NoTransition(UeHandoverState),
    /// State changed without a decision
    Transition {
        from: UeHandoverState,
        to: UeHandoverState,
    },
    /// A handover decision was emitted
    Decision(HandoverDecision),
}

impl ReportOutcome {
    pub fn decision(&self) -> Option<HandoverDecision> {
        match self {
            ReportOutcome::Decision(decision) => Some(*decision),
            _ => None,
        }
    }

    pub fn is_discarded(&self) -> bool {
        matches!(self, ReportOutcome::Discarded(_))
    }
}

/// Diagnostic counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvaluatorStats {
    pub reports_received: u64,
    pub reports_discarded: u64,
    pub reports_while_pending: u64,
    pub a2_triggers: u64,
    pub recoveries: u64,
    pub decisions: u64,
    pub handover_successes: u64,
    pub handover_failures: u64,
}

/// Evaluator context for one UE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UeHandoverContext {
    /// Current state
    pub state: UeHandoverState,
    /// Serving cell ([`CellId::NONE`] when not attached)
    pub serving_cell: CellId,
    /// Timestamp of the first report of the current A2 run
    pub a2_since_ms: Option<u64>,
    /// Target of the outstanding decision
    pub pending_target: Option<CellId>,
    /// Attempt number of the outstanding decision
    pub pending_attempt: Option<u64>,
    /// Most recent accepted report
    pub last_report: Option<MeasurementReport>,
}

impl UeHandoverContext {
    fn attached_to(cell: CellId) -> Self {
        Self {
            state: UeHandoverState::Stable,
            serving_cell: cell,
            a2_since_ms: None,
            pending_target: None,
            pending_attempt: None,
            last_report: None,
        }
    }
}

/// A2/A4 evaluator for every UE in the network
pub struct HandoverEvaluator {
    config: HandoverConfig,
    /// Provisioned cells
    cells: BTreeSet<CellId>,
    /// Context per UE
    ue_contexts: BTreeMap<UeId, UeHandoverContext>,
    /// Last attempt number handed out
    last_attempt: u64,
    stats: EvaluatorStats,
}

impl HandoverEvaluator {
    pub fn new(config: HandoverConfig) -> Self {
        Self {
            config,
            cells: BTreeSet::new(),
            ue_contexts: BTreeMap::new(),
            last_attempt: 0,
            stats: EvaluatorStats::default(),
        }
    }

    pub fn config(&self) -> &HandoverConfig {
        &self.config
    }

    /// Registers a cell of the topology. Cell 0 is rejected.
    pub fn provision_cell(&mut self, cell: CellId) -> bool {
        cell.is_valid() && self.cells.insert(cell)
    }

    pub fn cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cells.iter().copied()
    }

    /// (Re)attaches a UE. Any previous context is replaced by a fresh
    /// `Stable` one.
    pub fn attach(&mut self, ue_id: UeId, cell: CellId) {
        info!("UE {} attached to cell {}", ue_id, cell);
        self.ue_contexts
            .insert(ue_id, UeHandoverContext::attached_to(cell));
    }

    /// Forgets a UE. Returns false if it was unknown.
    pub fn detach(&mut self, ue_id: UeId) -> bool {
        match self.ue_contexts.remove(&ue_id) {
            Some(ctx) => {
                info!("UE {} detached from cell {} in {}", ue_id, ctx.serving_cell, ctx.state);
                true
            }
            None => false,
        }
    }

    pub fn state(&self, ue_id: UeId) -> Option<UeHandoverState> {
        self.ue_contexts.get(&ue_id).map(|ctx| ctx.state)
    }

    pub fn serving_cell(&self, ue_id: UeId) -> Option<CellId> {
        self.ue_contexts.get(&ue_id).map(|ctx| ctx.serving_cell)
    }

    pub fn context(&self, ue_id: UeId) -> Option<&UeHandoverContext> {
        self.ue_contexts.get(&ue_id)
    }

    pub fn is_in_progress(&self, ue_id: UeId) -> bool {
        self.state(ue_id) == Some(UeHandoverState::HandoverRequested)
    }

    pub fn ue_count(&self) -> usize {
        self.ue_contexts.len()
    }

    pub fn stats(&self) -> &EvaluatorStats {
        &self.stats
    }

    /// Evaluates one measurement report against the current thresholds.
    pub fn process_report(
        &mut self,
        report: &MeasurementReport,
        thresholds: &dyn ThresholdSource,
    ) -> ReportOutcome {
        self.stats.reports_received += 1;

        let serving_quality = match self.validate(report) {
            Ok(quality) => quality,
            Err(reason) => {
                if reason == DiscardReason::HandoverPending {
                    self.stats.reports_while_pending += 1;
                    debug!("Ignoring report from UE {}: {}", report.ue_id, reason);
                } else {
                    self.stats.reports_discarded += 1;
                    warn!("Discarding report from UE {}: {}", report.ue_id, reason);
                }
                return ReportOutcome::Discarded(reason);
            }
        };

        let time_to_trigger = self.config.time_to_trigger_ms;
        let neighbour_offset = self.config.neighbour_offset;
        let now = report.timestamp_ms;
        let ue_id = report.ue_id;

        let Some(ctx) = self.ue_contexts.get_mut(&ue_id) else {
            return ReportOutcome::Discarded(DiscardReason::UnknownUe);
        };
        ctx.last_report = Some(report.clone());

        let serving = ctx.serving_cell;
        let threshold = thresholds.threshold(serving);
        let initial = ctx.state;

        debug!(
            "UE {} report at {} ms: serving cell {} quality {} (threshold {}), {} neighbour(s), state {}",
            ue_id,
            now,
            serving,
            serving_quality,
            threshold,
            report.neighbours.len(),
            initial
        );

        // Stage 1: A2 watch
        if ctx.state == UeHandoverState::Stable {
            if serving_quality < threshold {
                let since = *ctx.a2_since_ms.get_or_insert(now);
                if now.saturating_sub(since) < time_to_trigger {
                    return ReportOutcome::NoTransition(UeHandoverState::Stable);
                }
                ctx.state = UeHandoverState::Degraded;
                ctx.a2_since_ms = None;
                self.stats.a2_triggers += 1;
                info!(
                    "UE {} A2 on cell {}: quality {} < threshold {} for {} ms",
                    ue_id,
                    serving,
                    serving_quality,
                    threshold,
                    now - since
                );
            } else {
                ctx.a2_since_ms = None;
                return ReportOutcome::NoTransition(UeHandoverState::Stable);
            }
        } else if serving_quality > threshold {
            // Recovered before any neighbour qualified
            ctx.state = UeHandoverState::Stable;
            self.stats.recoveries += 1;
            info!(
                "UE {} recovered on cell {}: quality {} > threshold {}",
                ue_id, serving, serving_quality, threshold
            );
            return ReportOutcome::Transition {
                from: UeHandoverState::Degraded,
                to: UeHandoverState::Stable,
            };
        }

        // Stage 2: A4 search
        let floor = u16::from(threshold) + u16::from(neighbour_offset);
        let best = report
            .neighbours_above(floor)
            .into_iter()
            .find(|&(cell, _)| cell != serving);

        match best {
            Some((target, quality)) => {
                ctx.state = UeHandoverState::HandoverRequested;
                self.last_attempt += 1;
                ctx.pending_target = Some(target);
                ctx.pending_attempt = Some(self.last_attempt);
                self.stats.decisions += 1;
                debug!(
                    "UE {} A4: cell {} quality {} > {} (threshold {} + offset {})",
                    ue_id, target, quality, floor, threshold, neighbour_offset
                );
                log_handover_decision(now, ue_id, serving, target);
                ReportOutcome::Decision(HandoverDecision {
                    ue_id,
                    source: serving,
                    target,
                    time_ms: now,
                    attempt: self.last_attempt,
                })
            }
            None if initial == UeHandoverState::Stable => ReportOutcome::Transition {
                from: UeHandoverState::Stable,
                to: UeHandoverState::Degraded,
            },
            None => ReportOutcome::NoTransition(UeHandoverState::Degraded),
        }
    }

    /// Checks everything that makes a report unusable and returns the
    /// serving quality of a usable one.
    fn validate(&self, report: &MeasurementReport) -> Result<Quality, DiscardReason> {
        let ctx = self
            .ue_contexts
            .get(&report.ue_id)
            .ok_or(DiscardReason::UnknownUe)?;

        if !ctx.serving_cell.is_valid() {
            return Err(DiscardReason::Unattached);
        }
        if !self.cells.contains(&ctx.serving_cell) {
            return Err(DiscardReason::UnknownCell(ctx.serving_cell));
        }
        if ctx.state == UeHandoverState::HandoverRequested {
            return Err(DiscardReason::HandoverPending);
        }
        let serving_quality = report
            .serving_quality
            .ok_or(DiscardReason::MissingServingQuality)?;
        if let Some(&cell) = report.neighbours.keys().find(|c| !self.cells.contains(*c)) {
            return Err(DiscardReason::UnknownCell(cell));
        }
        if let Some(last) = &ctx.last_report {
            if report.timestamp_ms < last.timestamp_ms {
                return Err(DiscardReason::StaleTimestamp);
            }
        }
        Ok(serving_quality)
    }

    /// Executor reported success of `attempt`: the UE now lives on the
    /// target cell.
    ///
    /// Returns the new serving cell, or `None` if `attempt` is not the
    /// outstanding decision of this UE.
    pub fn handover_succeeded(&mut self, ue_id: UeId, attempt: u64) -> Option<CellId> {
        let ctx = Self::outstanding(&mut self.ue_contexts, ue_id, attempt, "success")?;
        let target = ctx.pending_target.take()?;
        info!("Handover complete for UE {}: cell {} -> cell {}", ue_id, ctx.serving_cell, target);
        *ctx = UeHandoverContext {
            last_report: ctx.last_report.take(),
            ..UeHandoverContext::attached_to(target)
        };
        self.stats.handover_successes += 1;
        Some(target)
    }

    /// Executor reported failure of `attempt`: keep the UE degraded so the
    /// search goes on.
    ///
    /// Returns the source cell, or `None` if `attempt` is not the outstanding
    /// decision of this UE.
    pub fn handover_failed(&mut self, ue_id: UeId, attempt: u64) -> Option<CellId> {
        let ctx = Self::outstanding(&mut self.ue_contexts, ue_id, attempt, "failure")?;
        warn!(
            "Handover failed for UE {}: cell {} -> cell {:?}, back to {}",
            ue_id,
            ctx.serving_cell,
            ctx.pending_target,
            UeHandoverState::Degraded
        );
        ctx.state = UeHandoverState::Degraded;
        ctx.pending_target = None;
        ctx.pending_attempt = None;
        self.stats.handover_failures += 1;
        Some(ctx.serving_cell)
    }

    /// Context whose pending decision is `attempt`, if any.
    fn outstanding<'a>(
        contexts: &'a mut BTreeMap<UeId, UeHandoverContext>,
        ue_id: UeId,
        attempt: u64,
        kind: &str,
    ) -> Option<&'a mut UeHandoverContext> {
        let Some(ctx) = contexts.get_mut(&ue_id) else {
            debug!("Handover {} for unknown UE {} (attempt {}), ignored", kind, ue_id, attempt);
            return None;
        };
        if ctx.state != UeHandoverState::HandoverRequested || ctx.pending_attempt != Some(attempt) {
            warn!(
                "Stale handover {} for UE {} (attempt {}, pending {:?}, state {}), ignored",
                kind, ue_id, attempt, ctx.pending_attempt, ctx.state
            );
            return None;
        }
        Some(ctx)
    }
}

impl AttachmentView for HandoverEvaluator {
    fn for_each_attachment(&self, f: &mut dyn FnMut(UeId, Option<CellId>)) {
        for (&ue_id, ctx) in &self.ue_contexts {
            f(ue_id, Some(ctx.serving_cell).filter(CellId::is_valid));
        }
    }
}
