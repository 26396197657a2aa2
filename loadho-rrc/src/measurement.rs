//! Measurement reports
//!
//! A report is an immutable snapshot of what one UE measured at one instant:
//! the quality of its serving cell and of each neighbour it could hear. The
//! serving cell itself is not carried; the evaluator knows where the UE is
//! attached.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use loadho_common::{CellId, Quality, UeId};

/// Periodic measurement report from one UE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementReport {
    /// Reporting UE
    pub ue_id: UeId,
    /// Serving-cell RSRQ; `None` marks a partial report
    #[serde(default)]
    pub serving_quality: Option<Quality>,
    /// Neighbour-cell RSRQ by cell
    #[serde(default)]
    pub neighbours: BTreeMap<CellId, Quality>,
    /// Measurement instant (ms)
    pub timestamp_ms: u64,
}

impl MeasurementReport {
    pub fn new(ue_id: UeId, serving_quality: Quality, timestamp_ms: u64) -> Self {
        Self {
            ue_id,
            serving_quality: Some(serving_quality),
            neighbours: BTreeMap::new(),
            timestamp_ms,
        }
    }

    /// A report with no serving measurement.
    pub fn partial(ue_id: UeId, timestamp_ms: u64) -> Self {
        Self {
            ue_id,
            serving_quality: None,
            neighbours: BTreeMap::new(),
            timestamp_ms,
        }
    }

    pub fn with_neighbour(mut self, cell: CellId, quality: Quality) -> Self {
        self.neighbours.insert(cell, quality);
        self
    }

    /// Neighbours that beat `floor` strictly, best first.
    ///
    /// Equal qualities are ordered by ascending cell ID so the result is
    /// deterministic.
    pub fn neighbours_above(&self, floor: u16) -> Vec<(CellId, Quality)> {
        let mut candidates: Vec<_> = self
            .neighbours
            .iter()
            .filter(|(_, quality)| u16::from(**quality) > floor)
            .map(|(&cell, &quality)| (cell, quality))
            .collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        candidates
    }

    /// Best neighbour strictly above `floor`, ties to the lowest cell ID.
    pub fn best_neighbour_above(&self, floor: u16) -> Option<(CellId, Quality)> {
        self.neighbours_above(floor).into_iter().next()
    }
}
