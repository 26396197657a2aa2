//! Load-driven threshold controller
//!
//! Every `period_ms` the controller samples per-cell load and rewrites the
//! serving threshold of each sampled cell with a two-level step policy:
//!
//! ```text
//! attached(cell) >  watermark  ->  threshold(cell) = load_threshold
//! attached(cell) <= watermark  ->  threshold(cell) = default_threshold
//! ```
//!
//! A lower threshold lets A2 fire sooner, pushing UEs off the loaded cell.
//! There is no hysteresis on the load signal: a cell whose count oscillates
//! around the watermark sees its threshold oscillate too.

use serde::Serialize;
use tracing::{debug, info};

use loadho_common::{
    log_cell_load, CellId, ControllerConfig, HandoverConfig, Quality, RecurringTimer,
    ThresholdMode,
};

use crate::load::{AttachmentView, LoadSample, LoadSampler};
use crate::threshold::{ThresholdPolicy, ThresholdSource, ThresholdTable};

/// One cell's outcome of a controller tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThresholdUpdate {
    /// Simulated time of the tick (ms)
    pub time_ms: u64,
    /// Sampled cell
    pub cell: CellId,
    /// Attached UEs at sampling time
    pub attached: u32,
    /// Threshold before the tick
    pub previous: Quality,
    /// Threshold after the tick
    pub threshold: Quality,
}

impl ThresholdUpdate {
    /// Returns true if the tick changed this cell's threshold.
    pub fn changed(&self) -> bool {
        self.previous != self.threshold
    }
}

/// Periodic load sampler + threshold writer.
#[derive(Debug, Clone)]
pub struct ThresholdController {
    default_threshold: Quality,
    load_threshold: Quality,
    load_high_watermark: u32,
    sampler: LoadSampler,
    timer: RecurringTimer,
}

impl ThresholdController {
    pub fn new(
        handover: &HandoverConfig,
        controller: &ControllerConfig,
        cells: impl IntoIterator<Item = CellId>,
    ) -> Self {
        Self {
            default_threshold: handover.default_threshold,
            load_threshold: handover.load_threshold,
            load_high_watermark: handover.load_high_watermark,
            sampler: LoadSampler::new(cells, controller.reset_empty_cells),
            timer: RecurringTimer::new(controller.period_ms, controller.start_offset_ms),
        }
    }

    /// Adds a cell to the set sampled when empty cells are included.
    pub fn provision_cell(&mut self, cell: CellId) {
        self.sampler.provision(cell);
    }

    /// Threshold the step policy assigns to a cell with `attached` UEs.
    pub fn target_threshold(&self, attached: u32) -> Quality {
        if attached > self.load_high_watermark {
            self.load_threshold
        } else {
            self.default_threshold
        }
    }

    /// Applies the step policy to every cell in `sample`.
    ///
    /// Cells absent from the sample keep whatever threshold they had.
    pub fn apply(
        &self,
        time_ms: u64,
        sample: &LoadSample,
        table: &mut ThresholdTable,
    ) -> Vec<ThresholdUpdate> {
        sample
            .cells()
            .map(|(cell, attached)| {
                let threshold = self.target_threshold(attached);
                let previous = table.set(cell, threshold);
                let update = ThresholdUpdate {
                    time_ms,
                    cell,
                    attached,
                    previous,
                    threshold,
                };
                if update.changed() {
                    info!(
                        "Cell {} threshold {} -> {} ({} attached, watermark {})",
                        cell, previous, threshold, attached, self.load_high_watermark
                    );
                }
                update
            })
            .collect()
    }

    /// Next instant at which the controller wants to run.
    pub fn next_due(&self) -> Option<u64> {
        self.timer.next_due()
    }

    /// Runs one controller tick if the timer is due at `now_ms`.
    ///
    /// In static mode the sample is still taken and logged but nothing is
    /// written. Returns the per-cell updates of this tick (empty when not due
    /// or static).
    pub fn on_tick(
        &mut self,
        now_ms: u64,
        view: &dyn AttachmentView,
        policy: &mut ThresholdPolicy,
    ) -> Vec<ThresholdUpdate> {
        if !self.timer.fire(now_ms) {
            return Vec::new();
        }

        let sample = self.sampler.sample(view);
        debug!("Load sample at {} ms: {}", now_ms, sample);

        let updates = match policy.as_table_mut() {
            Some(table) => self.apply(now_ms, &sample, table),
            None => Vec::new(),
        };

        for (cell, attached) in sample.cells() {
            log_cell_load(now_ms, cell, attached, policy.threshold(cell));
        }
        if policy.mode() == ThresholdMode::Static {
            debug!("Static threshold mode, {} cell(s) sampled, no update", sample.len());
        }

        updates
    }

    /// Stops re-arming the controller timer.
    pub fn stop(&mut self) {
        self.timer.cancel();
    }

    pub fn ticks_run(&self) -> u64 {
        self.timer.fire_count()
    }
}
