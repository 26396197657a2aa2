//! Handover decision integration tests
//!
//! A2/A4 behaviour of the full engine, including the coupling between the
//! load-driven threshold and the neighbour floor.

use integration_tests::{
    decision_triples, init_test_logging, schedule_all, ReportPlan, TestTopology, LOADED_CELL,
    TARGET_CELL,
};
use loadho_common::{CellId, ThresholdMode, UeId};
use loadho_rrc::{DiscardReason, MeasurementReport, ReportOutcome, UeHandoverState};

const UE: UeId = UeId::new(1);

/// Cell 3 carries 14 UEs; after the tick its threshold is 20 and a neighbour
/// at 20 + 1 + 1 wins the handover.
#[test]
fn test_loaded_cell_hands_over_to_neighbour() {
    init_test_logging();

    let mut engine = TestTopology::loaded_cell().build();
    let plan = ReportPlan::new(1);
    schedule_all(&mut engine, plan.series(500, 800, 18, &[(5, 22)]));

    // A2 run opened at 500 under the freshly lowered threshold
    engine.run_until(700);
    assert_eq!(engine.threshold(LOADED_CELL), 20);
    let ctx = engine.evaluator().context(UE).unwrap();
    assert_eq!(ctx.state, UeHandoverState::Stable);
    assert_eq!(ctx.a2_since_ms, Some(500));

    // Time-to-trigger elapses at 800: DEGRADED, then A4 on the same report
    engine.run_until(800);
    assert_eq!(engine.evaluator().state(UE), Some(UeHandoverState::HandoverRequested));
    assert_eq!(engine.stats().a2_triggers, 1);
    assert_eq!(decision_triples(&engine.trace().decisions), vec![(1, 3, 5)]);

    engine.run_until(1000);
    assert_eq!(engine.evaluator().state(UE), Some(UeHandoverState::Stable));
    assert_eq!(engine.evaluator().serving_cell(UE), Some(TARGET_CELL));
}

/// Neighbour exactly at threshold + offset does not qualify
#[test]
fn test_neighbour_at_floor_does_not_trigger() {
    init_test_logging();

    let mut engine = TestTopology::loaded_cell().build();
    let plan = ReportPlan::new(1);
    schedule_all(&mut engine, plan.series(500, 3000, 18, &[(5, 21)]));
    engine.run_until(3000);

    assert!(engine.trace().decisions.is_empty());
    assert_eq!(engine.evaluator().state(UE), Some(UeHandoverState::Degraded));
    assert_eq!(engine.evaluator().serving_cell(UE), Some(LOADED_CELL));
}

/// The static baseline keeps the floor at 31 so the same neighbour never wins
#[test]
fn test_static_baseline_does_not_hand_over() {
    init_test_logging();

    let mut engine = TestTopology::loaded_cell()
        .with_mode(ThresholdMode::Static)
        .build();
    let plan = ReportPlan::new(1);
    schedule_all(&mut engine, plan.series(500, 3000, 18, &[(5, 22)]));
    engine.run_until(3000);

    assert!(engine.trace().decisions.is_empty());
    assert_eq!(engine.evaluator().state(UE), Some(UeHandoverState::Degraded));
}

/// Losing the only candidate leaves the UE DEGRADED until serving recovers
#[test]
fn test_lost_neighbour_stays_degraded() {
    init_test_logging();

    let mut engine = TestTopology::loaded_cell().build();
    let plan = ReportPlan::new(1);
    schedule_all(&mut engine, plan.series(500, 800, 18, &[(5, 19)]));
    schedule_all(&mut engine, plan.series(900, 1200, 18, &[]));
    engine.run_until(1200);

    assert!(engine.trace().decisions.is_empty());
    assert_eq!(engine.evaluator().state(UE), Some(UeHandoverState::Degraded));
    assert_eq!(engine.stats().recoveries, 0);

    // 21 > 20: recovery
    engine.schedule_report(plan.at(1300, 21, &[]));
    engine.run_until(1300);
    assert_eq!(engine.evaluator().state(UE), Some(UeHandoverState::Stable));
    assert_eq!(engine.stats().recoveries, 1);
}

/// Serving strictly above threshold never leaves STABLE
#[test]
fn test_good_serving_never_leaves_stable() {
    init_test_logging();

    for mode in [ThresholdMode::Static, ThresholdMode::Adaptive] {
        let mut engine = TestTopology::loaded_cell().with_mode(mode).build();
        let plan = ReportPlan::new(1).every(50);
        for (i, serving) in [31u8, 34, 32, 31, 33].into_iter().enumerate() {
            let from = i as u64 * 1000;
            schedule_all(&mut engine, plan.series(from, from + 950, serving, &[(5, 34), (2, 34)]));
        }
        engine.run_until(5000);

        assert!(engine.trace().decisions.is_empty(), "mode {mode}");
        assert_eq!(engine.evaluator().state(UE), Some(UeHandoverState::Stable));
        assert_eq!(engine.stats().a2_triggers, 0);
        assert_eq!(engine.evaluator().context(UE).unwrap().a2_since_ms, None);
    }
}

/// Serving equal to the threshold is not "below"
#[test]
fn test_serving_at_threshold_does_not_open_a2() {
    init_test_logging();

    let mut engine = TestTopology::five_cells()
        .with_ues(1, 1, CellId::new(1))
        .with_mode(ThresholdMode::Static)
        .build();
    let plan = ReportPlan::new(1);
    schedule_all(&mut engine, plan.series(0, 2000, 30, &[(2, 34)]));
    engine.run_until(2000);

    assert_eq!(engine.stats().a2_triggers, 0);
    assert_eq!(engine.evaluator().context(UE).unwrap().a2_since_ms, None);
}

/// DEGRADED with no qualifying neighbour never requests a handover
#[test]
fn test_degraded_without_candidate_never_requests() {
    init_test_logging();

    let mut engine = TestTopology::five_cells()
        .with_ues(1, 1, CellId::new(1))
        .with_mode(ThresholdMode::Static)
        .build();
    let plan = ReportPlan::new(1);
    schedule_all(&mut engine, plan.series(0, 10_000, 10, &[(2, 31), (3, 25), (4, 0)]));
    engine.run_until(10_000);

    assert!(engine.trace().decisions.is_empty());
    assert_eq!(engine.evaluator().state(UE), Some(UeHandoverState::Degraded));
    assert_eq!(engine.stats().a2_triggers, 1);
}

/// A good report in the middle of the window restarts time-to-trigger
#[test]
fn test_time_to_trigger_requires_continuous_hold() {
    init_test_logging();

    let mut engine = TestTopology::five_cells()
        .with_ues(1, 1, CellId::new(1))
        .with_mode(ThresholdMode::Static)
        .build();
    let plan = ReportPlan::new(1);
    engine.schedule_report(plan.at(100, 10, &[]));
    engine.schedule_report(plan.at(200, 31, &[]));
    schedule_all(&mut engine, plan.series(300, 600, 10, &[]));

    engine.run_until(500);
    assert_eq!(engine.stats().a2_triggers, 0);
    assert_eq!(engine.evaluator().context(UE).unwrap().a2_since_ms, Some(300));

    engine.run_until(600);
    assert_eq!(engine.stats().a2_triggers, 1);
    assert_eq!(engine.evaluator().state(UE), Some(UeHandoverState::Degraded));
}

/// Best neighbour wins; equal qualities go to the lowest cell ID
#[test]
fn test_best_neighbour_selection() {
    init_test_logging();

    let mut engine = TestTopology::five_cells()
        .with_ues(1, 1, CellId::new(1))
        .with_ues(2, 1, CellId::new(1))
        .with_mode(ThresholdMode::Static)
        .build();
    schedule_all(&mut engine, ReportPlan::new(1).series(0, 300, 10, &[(2, 32), (4, 33), (5, 33)]));
    schedule_all(&mut engine, ReportPlan::new(2).series(0, 300, 10, &[(3, 32), (5, 34)]));
    engine.run_until(1000);

    let mut decisions = decision_triples(&engine.trace().decisions);
    decisions.sort();
    assert_eq!(decisions, vec![(1, 1, 4), (2, 1, 5)]);
}

/// Failure reverts to DEGRADED and the next report retries
#[test]
fn test_failed_handover_retries() {
    init_test_logging();

    let mut engine = TestTopology::five_cells()
        .with_ues(1, 1, CellId::new(1))
        .with_mode(ThresholdMode::Static)
        .with_failures(1, 1)
        .build();
    let plan = ReportPlan::new(1);
    schedule_all(&mut engine, plan.series(100, 800, 10, &[(2, 33)]));

    engine.run_until(450);
    assert_eq!(engine.evaluator().state(UE), Some(UeHandoverState::Degraded));
    assert_eq!(engine.evaluator().serving_cell(UE), Some(CellId::new(1)));

    engine.run_until(1000);
    let trace = engine.trace();
    assert_eq!(decision_triples(&trace.decisions), vec![(1, 1, 2), (1, 1, 2)]);
    assert_eq!(trace.decisions[0].time_ms, 400);
    assert_eq!(trace.decisions[1].time_ms, 500);
    let outcomes: Vec<_> = trace.outcomes.iter().map(|o| o.success).collect();
    assert_eq!(outcomes, vec![false, true]);
    assert_eq!(engine.stats().handover_failures, 1);
    assert_eq!(engine.stats().handover_successes, 1);
    assert_eq!(engine.evaluator().serving_cell(UE), Some(CellId::new(2)));
}

/// Reports arriving while the executor works are ignored and counted
#[test]
fn test_reports_while_pending_are_ignored() {
    init_test_logging();

    let mut engine = TestTopology::five_cells()
        .with_ues(1, 1, CellId::new(1))
        .with_mode(ThresholdMode::Static)
        .with_execution_delay(250)
        .build();
    let plan = ReportPlan::new(1);
    schedule_all(&mut engine, plan.series(100, 600, 10, &[(2, 33)]));
    engine.run_until(1000);

    assert_eq!(engine.trace().decisions.len(), 1);
    assert_eq!(engine.stats().reports_while_pending, 2);
    assert_eq!(engine.stats().reports_discarded, 0);
    assert_eq!(engine.evaluator().serving_cell(UE), Some(CellId::new(2)));
}

/// A report naming an unknown cell is dropped whole
#[test]
fn test_unknown_cell_report_discarded() {
    init_test_logging();

    let mut engine = TestTopology::five_cells()
        .with_ues(1, 1, CellId::new(1))
        .with_mode(ThresholdMode::Static)
        .build();

    let outcome = engine.deliver_report(&ReportPlan::new(1).at(0, 10, &[(42, 34)]));
    assert_eq!(outcome, ReportOutcome::Discarded(DiscardReason::UnknownCell(CellId::new(42))));

    let outcome = engine.deliver_report(&ReportPlan::new(1).at(0, 10, &[(0, 34)]));
    assert_eq!(outcome, ReportOutcome::Discarded(DiscardReason::UnknownCell(CellId::NONE)));

    let outcome = engine.deliver_report(&MeasurementReport::partial(UE, 0));
    assert_eq!(outcome, ReportOutcome::Discarded(DiscardReason::MissingServingQuality));

    let ctx = engine.evaluator().context(UE).unwrap();
    assert_eq!(ctx.state, UeHandoverState::Stable);
    assert_eq!(ctx.a2_since_ms, None);
    assert_eq!(engine.stats().reports_discarded, 3);
    assert_eq!(engine.trace().discarded.len(), 3);
}

/// Unattached and unknown UEs produce no state
#[test]
fn test_report_from_unknown_ue_discarded() {
    init_test_logging();

    let mut engine = TestTopology::five_cells().build();
    let outcome = engine.deliver_report(&ReportPlan::new(77).at(0, 10, &[(2, 34)]));
    assert_eq!(outcome, ReportOutcome::Discarded(DiscardReason::UnknownUe));
    assert_eq!(engine.evaluator().ue_count(), 0);
}

/// Re-attaching resets a UE to STABLE
#[test]
fn test_reattach_resets_state() {
    init_test_logging();

    let mut engine = TestTopology::five_cells()
        .with_ues(1, 1, CellId::new(1))
        .with_mode(ThresholdMode::Static)
        .build();
    schedule_all(&mut engine, ReportPlan::new(1).series(0, 400, 10, &[]));
    engine.schedule_attach(450, UE, CellId::new(4));
    engine.run_until(500);

    let ctx = engine.evaluator().context(UE).unwrap();
    assert_eq!(ctx.state, UeHandoverState::Stable);
    assert_eq!(ctx.serving_cell, CellId::new(4));
    assert_eq!(ctx.a2_since_ms, None);
}
