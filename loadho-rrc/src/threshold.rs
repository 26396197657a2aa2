//! Serving-cell threshold strategies
//!
//! The evaluator only ever asks "what is the A2 threshold of this cell right
//! now?" through [`ThresholdSource`]. Two strategies answer it:
//!
//! - [`StaticThreshold`]: one constant for every cell (plain A2/A4)
//! - [`ThresholdTable`]: per-cell overrides written by the load controller,
//!   falling back to a default for cells never written
//!
//! [`ThresholdPolicy`] tags the two so the engine can hold either one.

use std::collections::BTreeMap;

use loadho_common::{CellId, HandoverConfig, Quality, ThresholdMode};

/// Read-only access to per-cell serving thresholds.
///
/// Lookups never fail: an unknown cell yields the source's default.
pub trait ThresholdSource {
    /// Returns the current serving-cell threshold for `cell`.
    fn threshold(&self, cell: CellId) -> Quality;
}

/// Same threshold for every cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticThreshold(Quality);

impl StaticThreshold {
    pub fn new(threshold: Quality) -> Self {
        Self(threshold)
    }
}

impl ThresholdSource for StaticThreshold {
    fn threshold(&self, _cell: CellId) -> Quality {
        self.0
    }
}

/// Per-cell serving threshold table.
///
/// The load controller is the only writer. Entries are plain `u8` values
/// replaced whole, so a reader never sees a partially written threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdTable {
    default_threshold: Quality,
    per_cell: BTreeMap<CellId, Quality>,
}

impl ThresholdTable {
    pub fn new(default_threshold: Quality) -> Self {
        Self {
            default_threshold,
            per_cell: BTreeMap::new(),
        }
    }

    /// Threshold for `cell`, or the default if the cell was never written.
    pub fn get(&self, cell: CellId) -> Quality {
        self.per_cell
            .get(&cell)
            .copied()
            .unwrap_or(self.default_threshold)
    }

    /// Overwrites the threshold for `cell`, returning what `get` returned
    /// before the write.
    pub fn set(&mut self, cell: CellId, threshold: Quality) -> Quality {
        let previous = self.get(cell);
        self.per_cell.insert(cell, threshold);
        previous
    }

    /// Drops the override for `cell` so it reads as default again.
    pub fn reset(&mut self, cell: CellId) {
        self.per_cell.remove(&cell);
    }

    pub fn default_threshold(&self) -> Quality {
        self.default_threshold
    }

    /// Cells with an explicit entry, in cell order.
    pub fn overrides(&self) -> impl Iterator<Item = (CellId, Quality)> + '_ {
        self.per_cell.iter().map(|(&cell, &threshold)| (cell, threshold))
    }

    pub fn len(&self) -> usize {
        self.per_cell.len()
    }

    pub fn is_empty(&self) -> bool {
        self.per_cell.is_empty()
    }
}

impl ThresholdSource for ThresholdTable {
    fn threshold(&self, cell: CellId) -> Quality {
        self.get(cell)
    }
}

/// Threshold strategy selected at configuration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThresholdPolicy {
    /// Baseline: thresholds never change
    Static(StaticThreshold),
    /// Load-adaptive: thresholds rewritten by the controller
    Adaptive(ThresholdTable),
}

impl ThresholdPolicy {
    /// Builds the strategy named by `mode`, seeded with the configured default.
    pub fn from_config(mode: ThresholdMode, config: &HandoverConfig) -> Self {
        match mode {
            ThresholdMode::Static => Self::Static(StaticThreshold::new(config.default_threshold)),
            ThresholdMode::Adaptive => Self::Adaptive(ThresholdTable::new(config.default_threshold)),
        }
    }

    pub fn mode(&self) -> ThresholdMode {
        match self {
            Self::Static(_) => ThresholdMode::Static,
            Self::Adaptive(_) => ThresholdMode::Adaptive,
        }
    }

    /// Mutable table access; `None` for the static strategy.
    pub fn as_table_mut(&mut self) -> Option<&mut ThresholdTable> {
        match self {
            Self::Static(_) => None,
            Self::Adaptive(table) => Some(table),
        }
    }

    pub fn as_table(&self) -> Option<&ThresholdTable> {
        match self {
            Self::Static(_) => None,
            Self::Adaptive(table) => Some(table),
        }
    }
}

impl ThresholdSource for ThresholdPolicy {
    fn threshold(&self, cell: CellId) -> Quality {
        match self {
            Self::Static(fixed) => fixed.threshold(cell),
            Self::Adaptive(table) => table.threshold(cell),
        }
    }
}
