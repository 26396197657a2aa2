//! Per-cell load sampling
//!
//! A [`LoadSample`] is rebuilt from scratch on every call by scanning the
//! whole attachment table. Nothing is maintained incrementally: attachments
//! change between ticks (handover, detach, radio link failure) without
//! telling the sampler.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use loadho_common::{CellId, UeId};

/// Read access to the current UE -> serving cell attachment table.
///
/// `None` (or [`CellId::NONE`]) means the UE exists but is not attached.
pub trait AttachmentView {
    /// Calls `f` once for every known UE.
    fn for_each_attachment(&self, f: &mut dyn FnMut(UeId, Option<CellId>));
}

impl AttachmentView for BTreeMap<UeId, CellId> {
    fn for_each_attachment(&self, f: &mut dyn FnMut(UeId, Option<CellId>)) {
        for (&ue, &cell) in self {
            f(ue, Some(cell));
        }
    }
}

/// Attached-UE count per cell at one sampling instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSample {
    counts: BTreeMap<CellId, u32>,
}

impl LoadSample {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attached UEs on `cell`; 0 for cells absent from the sample.
    pub fn count(&self, cell: CellId) -> u32 {
        self.counts.get(&cell).copied().unwrap_or(0)
    }

    /// Returns true if `cell` appears in the sample (possibly with count 0).
    pub fn contains(&self, cell: CellId) -> bool {
        self.counts.contains_key(&cell)
    }

    /// Sampled cells with their counts, in cell order.
    pub fn cells(&self) -> impl Iterator<Item = (CellId, u32)> + '_ {
        self.counts.iter().map(|(&cell, &count)| (cell, count))
    }

    pub fn total_attached(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    fn add(&mut self, cell: CellId) {
        *self.counts.entry(cell).or_insert(0) += 1;
    }

    fn ensure(&mut self, cell: CellId) {
        self.counts.entry(cell).or_insert(0);
    }
}

impl FromIterator<(CellId, u32)> for LoadSample {
    fn from_iter<I: IntoIterator<Item = (CellId, u32)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for LoadSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (cell, count) in self.cells() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "cell {cell}: {count}")?;
            first = false;
        }
        Ok(())
    }
}

/// Counts attached UEs per cell.
#[derive(Debug, Clone, Default)]
pub struct LoadSampler {
    provisioned: BTreeSet<CellId>,
    include_empty: bool,
}

impl LoadSampler {
    /// Creates a sampler.
    ///
    /// With `include_empty`, every provisioned cell appears in the sample even
    /// when nothing is attached to it.
    pub fn new(provisioned: impl IntoIterator<Item = CellId>, include_empty: bool) -> Self {
        Self {
            provisioned: provisioned.into_iter().filter(CellId::is_valid).collect(),
            include_empty,
        }
    }

    pub fn provision(&mut self, cell: CellId) {
        if cell.is_valid() {
            self.provisioned.insert(cell);
        }
    }

    pub fn provisioned(&self) -> impl Iterator<Item = CellId> + '_ {
        self.provisioned.iter().copied()
    }

    /// Takes a fresh sample of `view`.
    ///
    /// UEs whose cell is `None` or zero are not attached and are not counted.
    pub fn sample(&self, view: &dyn AttachmentView) -> LoadSample {
        let mut sample = LoadSample::new();
        if self.include_empty {
            for &cell in &self.provisioned {
                sample.ensure(cell);
            }
        }
        view.for_each_attachment(&mut |_ue, cell| {
            if let Some(cell) = cell.filter(CellId::is_valid) {
                sample.add(cell);
            }
        });
        sample
    }
}
