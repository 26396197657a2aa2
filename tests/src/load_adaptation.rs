//! Load adaptation integration tests
//!
//! Controller ticks against the attachment table and the resulting per-cell
//! thresholds.

use integration_tests::{init_test_logging, schedule_all, ReportPlan, TestTopology, LOADED_CELL};
use loadho_common::{CellId, ThresholdMode, UeId};
use loadho_rrc::{StaticThreshold, ThresholdSource, ThresholdTable};

/// Cells never written read the default threshold
#[test]
fn test_unwritten_cells_read_default() {
    init_test_logging();

    let table = ThresholdTable::new(30);
    for id in [1, 2, 3, 42, u16::MAX] {
        assert_eq!(table.threshold(CellId::new(id)), 30);
    }
    assert_eq!(StaticThreshold::new(30).threshold(CellId::new(7)), 30);

    let engine = TestTopology::loaded_cell().build();
    for (cell, threshold) in engine.thresholds() {
        assert_eq!(threshold, 30, "cell {cell} before first tick");
    }
    assert_eq!(engine.threshold(CellId::new(99)), 30);
}

/// 14 UEs on cell 3: threshold drops to the load threshold at the first tick
#[test]
fn test_loaded_cell_switches_at_tick() {
    init_test_logging();

    let mut engine = TestTopology::loaded_cell().build();
    engine.run_until(499);
    assert_eq!(engine.threshold(LOADED_CELL), 30);

    engine.run_until(500);
    assert_eq!(engine.threshold(LOADED_CELL), 20);
    for id in [1, 2, 4, 5] {
        assert_eq!(engine.threshold(CellId::new(id)), 30);
    }

    let changes: Vec<_> = engine.trace().threshold_changes().collect();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].cell, LOADED_CELL);
    assert_eq!(changes[0].attached, 14);
    assert_eq!(changes[0].previous, 30);
}

/// Exactly the watermark is not loaded
#[test]
fn test_watermark_is_strict() {
    init_test_logging();

    let mut engine = TestTopology::five_cells().with_ues(1, 13, LOADED_CELL).build();
    engine.run_until(2000);
    assert_eq!(engine.threshold(LOADED_CELL), 30);
    assert_eq!(engine.trace().threshold_changes().count(), 0);
}

/// The loaded-branch threshold is a parameter
#[test]
fn test_load_threshold_is_configurable() {
    init_test_logging();

    let mut engine = TestTopology::loaded_cell().with_load_threshold(15).build();
    engine.run_until(500);
    assert_eq!(engine.threshold(LOADED_CELL), 15);
}

/// Load falling back under the watermark restores the default
#[test]
fn test_threshold_restored_when_load_drops() {
    init_test_logging();

    let mut engine = TestTopology::loaded_cell().build();
    engine.schedule_detach(700, UeId::new(14));
    engine.run_until(500);
    assert_eq!(engine.threshold(LOADED_CELL), 20);
    engine.run_until(1000);
    assert_eq!(engine.threshold(LOADED_CELL), 30);
}

/// An emptied cell is sampled with count 0 and reset
#[test]
fn test_emptied_cell_resets_to_default() {
    init_test_logging();

    let mut engine = TestTopology::loaded_cell().build();
    for ue in 1..=14 {
        engine.schedule_detach(700, UeId::new(ue));
    }
    engine.run_until(1000);

    assert_eq!(engine.threshold(LOADED_CELL), 30);
    let last = engine
        .trace()
        .threshold_updates
        .iter()
        .filter(|u| u.cell == LOADED_CELL)
        .last()
        .copied()
        .unwrap();
    assert_eq!(last.attached, 0);
    assert_eq!(last.time_ms, 1000);
}

/// With empty cells left out of the sample, the last threshold sticks
#[test]
fn test_emptied_cell_holds_when_not_sampled() {
    init_test_logging();

    let mut engine = TestTopology::loaded_cell().with_reset_empty_cells(false).build();
    for ue in 1..=14 {
        engine.schedule_detach(700, UeId::new(ue));
    }
    engine.run_until(3000);
    assert_eq!(engine.threshold(LOADED_CELL), 20);
}

/// Static mode samples but never writes
#[test]
fn test_static_mode_never_changes_thresholds() {
    init_test_logging();

    let mut engine = TestTopology::five_cells()
        .with_mode(ThresholdMode::Static)
        .with_ues(1, 40, LOADED_CELL)
        .build();
    engine.run_until(5000);

    assert!(engine.trace().threshold_updates.is_empty());
    assert!(engine.thresholds().iter().all(|&(_, t)| t == 30));
}

/// No hysteresis: a count oscillating around the watermark flips the threshold
#[test]
fn test_threshold_follows_oscillating_load() {
    init_test_logging();

    let mut engine = TestTopology::five_cells().with_ues(1, 13, LOADED_CELL).build();
    engine.schedule_attach(400, UeId::new(14), LOADED_CELL);
    engine.schedule_detach(700, UeId::new(14));
    engine.schedule_attach(1200, UeId::new(14), LOADED_CELL);
    engine.run_until(1500);

    let thresholds: Vec<_> = engine
        .trace()
        .threshold_updates
        .iter()
        .filter(|u| u.cell == LOADED_CELL)
        .map(|u| u.threshold)
        .collect();
    assert_eq!(thresholds, vec![20, 30, 20]);
}

/// Attachment changes made by completed handovers are picked up by the next
/// full rescan
#[test]
fn test_handover_relieves_loaded_cell() {
    init_test_logging();

    let mut engine = TestTopology::loaded_cell().build();
    let plan = ReportPlan::new(1);
    schedule_all(&mut engine, plan.series(500, 800, 18, &[(5, 22)]));
    engine.run_until(1000);

    assert_eq!(engine.trace().decisions.len(), 1);
    assert_eq!(engine.evaluator().serving_cell(UeId::new(1)), Some(CellId::new(5)));

    let at_1000 = engine
        .trace()
        .threshold_updates
        .iter()
        .find(|u| u.cell == LOADED_CELL && u.time_ms == 1000)
        .copied()
        .unwrap();
    assert_eq!(at_1000.attached, 13);
    assert_eq!(at_1000.threshold, 30);
}
