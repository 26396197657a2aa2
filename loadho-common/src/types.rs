//! Core RAN identifiers: cell and terminal handles, quality scale.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Upper bound of the quantized RSRQ scale (3GPP TS 36.133, RSRQ_00..RSRQ_34).
pub const QUALITY_MAX: u8 = 34;

/// Quantized signal quality.
///
/// Higher is better. Thresholds live on the same scale, so a threshold is
/// just a `Quality` that a measurement is compared against.
pub type Quality = u8;

/// Cell identifier.
///
/// Cell ID 0 is reserved for "not attached" and never names a real cell.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(u16);

impl CellId {
    /// The reserved "no cell" value.
    pub const NONE: CellId = CellId(0);

    /// Creates a cell identifier from its raw value.
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    pub const fn value(&self) -> u16 {
        self.0
    }

    /// Returns true if this names a real cell (non-zero).
    pub const fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Debug for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellId({})", self.0)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for CellId {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

/// Terminal (UE) attachment handle, RNTI-like.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UeId(u32);

impl UeId {
    /// Creates a UE handle from its raw value.
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for UeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UeId({})", self.0)
    }
}

impl fmt::Display for UeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for UeId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}
