//! Test fixtures and topology helpers
//!
//! Provides pre-configured topologies and report builders.

use loadho_common::{CellId, EngineConfig, Quality, ThresholdMode, UeId};
use loadho_rrc::MeasurementReport;
use loadho_sim::{ExecutorConfig, FailureSpec, HandoverEngine, ScriptedExecutor};

/// Cell that carries more UEs than the watermark in the loaded fixtures
pub const LOADED_CELL: CellId = CellId::new(3);

/// Neighbour used as the handover target in the loaded fixtures
pub const TARGET_CELL: CellId = CellId::new(5);

/// Cell topology plus initial attachments
#[derive(Debug, Clone)]
pub struct TestTopology {
    pub config: EngineConfig,
    pub cells: Vec<CellId>,
    pub attachments: Vec<(UeId, CellId)>,
    pub executor: ExecutorConfig,
}

impl Default for TestTopology {
    fn default() -> Self {
        Self::five_cells()
    }
}

impl TestTopology {
    /// Cells 1..=5, default configuration, no UEs.
    pub fn five_cells() -> Self {
        Self {
            config: EngineConfig::default(),
            cells: (1..=5).map(CellId::new).collect(),
            attachments: Vec::new(),
            executor: ExecutorConfig::default(),
        }
    }

    /// UEs 1..=14 on [`LOADED_CELL`], one above the default watermark.
    pub fn loaded_cell() -> Self {
        Self::five_cells().with_ues(1, 14, LOADED_CELL)
    }

    pub fn with_mode(mut self, mode: ThresholdMode) -> Self {
        self.config.controller.mode = mode;
        self
    }

    pub fn with_load_threshold(mut self, threshold: Quality) -> Self {
        self.config.handover.load_threshold = threshold;
        self
    }

    pub fn with_reset_empty_cells(mut self, reset: bool) -> Self {
        self.config.controller.reset_empty_cells = reset;
        self
    }

    /// Attaches UEs `first..first + count` to `cell`.
    pub fn with_ues(mut self, first: u32, count: u32, cell: CellId) -> Self {
        self.attachments
            .extend((first..first + count).map(|ue| (UeId::new(ue), cell)));
        self
    }

    pub fn with_execution_delay(mut self, delay_ms: u64) -> Self {
        self.executor.delay_ms = delay_ms;
        self
    }

    /// Makes the first `attempts` handovers of `ue` fail.
    pub fn with_failures(mut self, ue: u32, attempts: u32) -> Self {
        self.executor.failures.push(FailureSpec {
            ue: UeId::new(ue),
            attempts,
        });
        self
    }

    /// Builds an engine with every attachment applied at time 0.
    pub fn build(&self) -> HandoverEngine<ScriptedExecutor> {
        let mut engine = HandoverEngine::new(
            self.config,
            &self.cells,
            ScriptedExecutor::new(&self.executor),
        )
        .expect("Failed to build engine from test topology");
        for &(ue, cell) in &self.attachments {
            engine.attach(ue, cell);
        }
        engine
    }
}

/// Periodic reports from one UE
#[derive(Debug, Clone)]
pub struct ReportPlan {
    pub ue: UeId,
    pub period_ms: u64,
}

impl ReportPlan {
    /// Reports every 100 ms.
    pub fn new(ue: u32) -> Self {
        Self {
            ue: UeId::new(ue),
            period_ms: 100,
        }
    }

    pub fn every(mut self, period_ms: u64) -> Self {
        self.period_ms = period_ms;
        self
    }

    /// Identical reports at every period in `[from_ms, to_ms]`.
    pub fn series(
        &self,
        from_ms: u64,
        to_ms: u64,
        serving: Quality,
        neighbours: &[(u16, Quality)],
    ) -> Vec<MeasurementReport> {
        std::iter::successors(Some(from_ms), |t| t.checked_add(self.period_ms.max(1)))
            .take_while(|&t| t <= to_ms)
            .map(|t| self.at(t, serving, neighbours))
            .collect()
    }

    /// Single report at `time_ms`.
    pub fn at(&self, time_ms: u64, serving: Quality, neighbours: &[(u16, Quality)]) -> MeasurementReport {
        neighbours.iter().fold(
            MeasurementReport::new(self.ue, serving, time_ms),
            |report, &(cell, quality)| report.with_neighbour(CellId::new(cell), quality),
        )
    }
}

/// Queues every report on the engine.
pub fn schedule_all(engine: &mut HandoverEngine<ScriptedExecutor>, reports: Vec<MeasurementReport>) {
    for report in reports {
        engine.schedule_report(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_plan_series_stops_at_end_of_time() {
        let plan = ReportPlan::new(1).every(u64::MAX);
        let reports = plan.series(0, u64::MAX, 10, &[(5, 22)]);
        let times: Vec<_> = reports.iter().map(|r| r.timestamp_ms).collect();
        assert_eq!(times, vec![0, u64::MAX]);

        let reports = ReportPlan::new(1).series(100, 350, 10, &[]);
        assert_eq!(reports.len(), 3);
    }
}
