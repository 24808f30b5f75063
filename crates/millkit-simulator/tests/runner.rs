//! Background run-to-completion tests

use millkit_core::{SimulationError, ToolProfile, ToolShape};
use millkit_simulator::{
    spawn_run_to_completion, MillStepper, RunOptions, RunOutcome, StepperState, StockBlock,
    StockModel,
};
use nalgebra::{Point3, Vector3};

fn stepper(shape: ToolShape) -> MillStepper {
    let stock = StockModel::new(
        StockBlock::new(Vector3::new(10.0, 1.0, 10.0), Point3::origin(), 0.0),
        50,
        50,
    );
    MillStepper::new(stock, ToolProfile::new(shape, 1.0, 4.0))
}

#[tokio::test]
async fn test_run_completes_and_reports_progress() {
    let mut s = stepper(ToolShape::Ball);
    s.begin(&[
        Point3::new(-4.0, 0.5, -4.0),
        Point3::new(4.0, 0.5, -4.0),
        Point3::new(4.0, 0.5, 4.0),
    ])
    .unwrap();

    let mut handle = spawn_run_to_completion(
        s,
        RunOptions {
            cancel_check_interval: 5,
        },
    );
    let mut reports = Vec::new();
    while let Some(progress) = handle.progress().recv().await {
        reports.push(progress);
    }
    let (s, outcome) = handle.join().await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(s.state(), StepperState::Finished);
    assert!(s.stock().removed_volume() > 0.0);

    assert!(reports.len() > 1);
    assert!(reports.windows(2).all(|w| w[0].cells <= w[1].cells));
    let last = reports.last().unwrap();
    assert_eq!(last.cells, s.cells_milled());
    assert_eq!(last.segments, 2);
}

#[tokio::test]
async fn test_run_reports_illegal_cut() {
    let mut s = stepper(ToolShape::Flat);
    s.begin(&[Point3::new(0.0, 2.0, 0.0), Point3::new(0.0, -0.5, 0.0)])
        .unwrap();

    let handle = spawn_run_to_completion(s, RunOptions::default());
    let (s, outcome) = handle.join().await.unwrap();

    assert!(matches!(
        outcome,
        RunOutcome::Failed(SimulationError::BelowBaseLevel { .. })
    ));
    assert_eq!(s.state(), StepperState::Failed);
}

#[tokio::test]
async fn test_cancel_stops_the_run() {
    let mut s = stepper(ToolShape::Ball);
    let zigzag: Vec<_> = (0..200)
        .map(|i| {
            let x = if i % 2 == 0 { -4.5 } else { 4.5 };
            Point3::new(x, 0.5, -4.5 + i as f64 * 0.045)
        })
        .collect();
    s.begin(&zigzag).unwrap();

    let handle = spawn_run_to_completion(
        s,
        RunOptions {
            cancel_check_interval: 1,
        },
    );
    handle.cancel();
    let (s, outcome) = handle.join().await.unwrap();

    // the worker may finish a few chunks before it sees the flag
    if outcome == RunOutcome::Cancelled {
        assert!(s.is_running());
    } else {
        assert_eq!(outcome, RunOutcome::Completed);
    }
}
