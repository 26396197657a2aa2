//! Handover engine
//!
//! Owns the two loops (load controller and per-UE evaluator) plus the shared
//! threshold policy, and drives them from one [`EventQueue`]. Nothing here is
//! concurrent: the threshold table has exactly one writer (the controller,
//! during a tick) and is read by the evaluator between ticks.
//!
//! # Event Flow
//!
//! ```text
//! ControllerTick ──> sample load ──> rewrite thresholds ──> schedule next tick
//! Measurement ─────> evaluator ──> decision? ──> executor ──> HandoverOutcome
//! HandoverOutcome ─> evaluator (success: re-attach, failure: Degraded)
//! ```

use serde::Serialize;
use tracing::{debug, info, warn};

use loadho_common::{
    CellId, ConfigValidationError, EngineConfig, Error, Quality, SimulationClock, UeId,
};
use loadho_rrc::{
    DiscardReason, EvaluatorStats, HandoverDecision, HandoverEvaluator, MeasurementReport,
    ReportOutcome, ThresholdController, ThresholdPolicy, ThresholdSource, ThresholdUpdate,
};

use crate::executor::HandoverExecutor;
use crate::scheduler::{EventQueue, SimEvent};

/// Executor verdict as observed by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutcomeRecord {
    pub time_ms: u64,
    pub ue_id: UeId,
    pub success: bool,
    /// Serving cell after the outcome was applied
    pub serving_cell: CellId,
}

/// Report dropped by the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscardRecord {
    pub time_ms: u64,
    pub ue_id: UeId,
    pub reason: DiscardReason,
}

/// Everything observable that happened during a run, in dispatch order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineTrace {
    pub decisions: Vec<HandoverDecision>,
    pub threshold_updates: Vec<ThresholdUpdate>,
    pub outcomes: Vec<OutcomeRecord>,
    #[serde(skip)]
    pub discarded: Vec<DiscardRecord>,
}

impl EngineTrace {
    /// Threshold updates that actually changed a cell's value.
    pub fn threshold_changes(&self) -> impl Iterator<Item = &ThresholdUpdate> {
        self.threshold_updates.iter().filter(|u| u.changed())
    }

    pub fn decisions_for(&self, ue_id: UeId) -> impl Iterator<Item = &HandoverDecision> {
        self.decisions.iter().filter(move |d| d.ue_id == ue_id)
    }
}

/// Load-adaptive A2/A4 handover engine.
pub struct HandoverEngine<E: HandoverExecutor> {
    config: EngineConfig,
    clock: SimulationClock,
    policy: ThresholdPolicy,
    controller: ThresholdController,
    evaluator: HandoverEvaluator,
    executor: E,
    queue: EventQueue,
    trace: EngineTrace,
    controller_scheduled: bool,
}

impl<E: HandoverExecutor> HandoverEngine<E> {
    /// Builds an engine over the given cell topology.
    ///
    /// Fails if the configuration is invalid, a cell ID is 0, or a cell is
    /// listed twice.
    pub fn new(config: EngineConfig, cells: &[CellId], executor: E) -> Result<Self, Error> {
        config.validate()?;

        let evaluator = HandoverEvaluator::new(config.handover);
        let controller = ThresholdController::new(&config.handover, &config.controller, std::iter::empty());
        let policy = ThresholdPolicy::from_config(config.controller.mode, &config.handover);

        info!(
            "Handover engine ready: {} cell(s), mode={}, default={}, load={}, watermark={}, offset={}, ttt={}ms",
            cells.len(),
            config.controller.mode,
            config.handover.default_threshold,
            config.handover.load_threshold,
            config.handover.load_high_watermark,
            config.handover.neighbour_offset,
            config.handover.time_to_trigger_ms
        );

        let mut engine = Self {
            config,
            clock: SimulationClock::new(config.time),
            policy,
            controller,
            evaluator,
            executor,
            queue: EventQueue::new(),
            trace: EngineTrace::default(),
            controller_scheduled: false,
        };
        for &cell in cells {
            engine.provision_cell(cell)?;
        }
        Ok(engine)
    }

    /// Adds a cell to the topology seen by both loops.
    pub fn provision_cell(&mut self, cell: CellId) -> Result<(), Error> {
        if !cell.is_valid() {
            return Err(ConfigValidationError::ReservedCellId.into());
        }
        if !self.evaluator.provision_cell(cell) {
            return Err(ConfigValidationError::DuplicateCell(cell).into());
        }
        self.controller.provision_cell(cell);
        Ok(())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current simulated time (ms)
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn evaluator(&self) -> &HandoverEvaluator {
        &self.evaluator
    }

    pub fn policy(&self) -> &ThresholdPolicy {
        &self.policy
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn trace(&self) -> &EngineTrace {
        &self.trace
    }

    pub fn stats(&self) -> &EvaluatorStats {
        self.evaluator.stats()
    }

    /// Current serving threshold of `cell`.
    pub fn threshold(&self, cell: CellId) -> Quality {
        self.policy.threshold(cell)
    }

    /// Threshold of every provisioned cell, in cell order.
    pub fn thresholds(&self) -> Vec<(CellId, Quality)> {
        self.evaluator
            .cells()
            .map(|cell| (cell, self.policy.threshold(cell)))
            .collect()
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Attaches a UE immediately (at the current simulated time).
    pub fn attach(&mut self, ue_id: UeId, cell: CellId) {
        self.evaluator.attach(ue_id, cell);
    }

    /// Detaches a UE immediately.
    pub fn detach(&mut self, ue_id: UeId) -> bool {
        self.evaluator.detach(ue_id)
    }

    pub fn schedule_attach(&mut self, time_ms: u64, ue_id: UeId, cell: CellId) {
        self.queue.schedule(time_ms, SimEvent::Attach { ue_id, cell });
    }

    pub fn schedule_detach(&mut self, time_ms: u64, ue_id: UeId) {
        self.queue.schedule(time_ms, SimEvent::Detach { ue_id });
    }

    /// Queues a report for delivery at its own timestamp.
    pub fn schedule_report(&mut self, report: MeasurementReport) {
        self.queue
            .schedule(report.timestamp_ms, SimEvent::Measurement(report));
    }

    /// Delivers a report right now, bypassing the queue.
    ///
    /// Any resulting decision is handed to the executor and its outcome is
    /// queued like any other event.
    pub fn deliver_report(&mut self, report: &MeasurementReport) -> ReportOutcome {
        let now_ms = self.clock.now_ms();
        let outcome = self.evaluator.process_report(report, &self.policy);
        match outcome {
            ReportOutcome::Decision(decision) => self.dispatch_decision(now_ms, decision),
            ReportOutcome::Discarded(reason) => self.trace.discarded.push(DiscardRecord {
                time_ms: now_ms,
                ue_id: report.ue_id,
                reason,
            }),
            _ => {}
        }
        outcome
    }

    /// Runs every event due at or before `end_ms`, then parks the clock at
    /// `end_ms`.
    pub fn run_until(&mut self, end_ms: u64) -> &EngineTrace {
        self.arm_controller();

        while let Some((time_ms, event)) = self.queue.pop_until(end_ms) {
            if !self.clock.advance_to(time_ms) {
                warn!(
                    "Event at {} ms is behind the clock ({} ms), dispatched late",
                    time_ms,
                    self.clock.now_ms()
                );
            }
            self.dispatch(event);
        }

        self.clock.advance_to(end_ms);
        debug!(
            "Run reached {} ms, {} event(s) still pending",
            end_ms,
            self.queue.len()
        );
        &self.trace
    }

    /// Runs to the end of the configured simulation time.
    pub fn run(&mut self) -> &EngineTrace {
        let end_ms = self.clock.end_ms();
        self.run_until(end_ms)
    }

    /// Stops the controller and drops everything still queued.
    pub fn stop(&mut self) {
        info!("Stopping handover engine at {} ms", self.clock.now_ms());
        self.controller.stop();
        self.queue.clear();
        self.controller_scheduled = false;
    }

    /// Consumes the engine, returning its trace.
    pub fn into_trace(self) -> EngineTrace {
        self.trace
    }

    fn arm_controller(&mut self) {
        if self.controller_scheduled {
            return;
        }
        if let Some(due) = self.controller.next_due() {
            self.queue.schedule(due, SimEvent::ControllerTick);
            self.controller_scheduled = true;
        }
    }

    fn dispatch(&mut self, event: SimEvent) {
        let now_ms = self.clock.now_ms();
        match event {
            SimEvent::Attach { ue_id, cell } => self.evaluator.attach(ue_id, cell),
            SimEvent::Detach { ue_id } => {
                if !self.evaluator.detach(ue_id) {
                    debug!("Detach for unknown UE {} ignored", ue_id);
                }
            }
            SimEvent::ControllerTick => {
                self.controller_scheduled = false;
                let updates = self
                    .controller
                    .on_tick(now_ms, &self.evaluator, &mut self.policy);
                self.trace.threshold_updates.extend(updates);
                self.arm_controller();
            }
            SimEvent::HandoverOutcome {
                ue_id,
                attempt,
                success,
            } => self.apply_outcome(now_ms, ue_id, attempt, success),
            SimEvent::Measurement(report) => {
                self.deliver_report(&report);
            }
        }
    }

    fn dispatch_decision(&mut self, now_ms: u64, decision: HandoverDecision) {
        self.trace.decisions.push(decision);
        let result = self.executor.execute(&decision);
        self.queue.schedule(
            now_ms + result.delay_ms,
            SimEvent::HandoverOutcome {
                ue_id: decision.ue_id,
                attempt: decision.attempt,
                success: result.success,
            },
        );
    }

    fn apply_outcome(&mut self, now_ms: u64, ue_id: UeId, attempt: u64, success: bool) {
        let applied = if success {
            self.evaluator.handover_succeeded(ue_id, attempt)
        } else {
            self.evaluator.handover_failed(ue_id, attempt)
        };
        if let Some(serving_cell) = applied {
            self.trace.outcomes.push(OutcomeRecord {
                time_ms: now_ms,
                ue_id,
                success,
                serving_cell,
            });
        }
    }
}
