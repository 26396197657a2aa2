//! Deterministic event queue
//!
//! Single-threaded, no preemption: events are dispatched strictly in
//! `(time, priority, insertion order)` order. Same-instant ties between the
//! two loops are resolved by [`SimEvent::priority`]: attachment changes first,
//! then the controller tick, then executor outcomes, then measurement
//! reports. A threshold rewritten at instant `t` is therefore already visible
//! to every report evaluated at `t`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use loadho_common::{CellId, UeId};
use loadho_rrc::MeasurementReport;

/// Something scheduled on the simulation clock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    /// UE attaches (or re-attaches) to a cell
    Attach { ue_id: UeId, cell: CellId },
    /// UE leaves the network
    Detach { ue_id: UeId },
    /// Threshold controller period elapsed
    ControllerTick,
    /// Executor finished the handover commanded as `attempt`
    HandoverOutcome { ue_id: UeId, attempt: u64, success: bool },
    /// Measurement report delivered to the evaluator
    Measurement(MeasurementReport),
}

impl SimEvent {
    /// Same-instant dispatch rank, lowest first.
    pub fn priority(&self) -> u8 {
        match self {
            SimEvent::Attach { .. } | SimEvent::Detach { .. } => 0,
            SimEvent::ControllerTick => 1,
            SimEvent::HandoverOutcome { .. } => 2,
            SimEvent::Measurement(_) => 3,
        }
    }
}

#[derive(Debug)]
struct Scheduled {
    time_ms: u64,
    priority: u8,
    seq: u64,
    event: SimEvent,
}

impl Scheduled {
    fn key(&self) -> (u64, u8, u64) {
        (self.time_ms, self.priority, self.seq)
    }
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (earliest first)
        other.key().cmp(&self.key())
    }
}

/// Min-heap of pending events.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Scheduled>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `event` at `time_ms`.
    pub fn schedule(&mut self, time_ms: u64, event: SimEvent) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled {
            time_ms,
            priority: event.priority(),
            seq,
            event,
        });
    }

    /// Time of the earliest pending event.
    pub fn peek_time(&self) -> Option<u64> {
        self.heap.peek().map(|s| s.time_ms)
    }

    /// Removes the earliest event if it is due at or before `limit_ms`.
    pub fn pop_until(&mut self, limit_ms: u64) -> Option<(u64, SimEvent)> {
        if self.peek_time()? > limit_ms {
            return None;
        }
        self.heap.pop().map(|s| (s.time_ms, s.event))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}
