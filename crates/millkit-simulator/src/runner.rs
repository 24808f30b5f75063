//! Run-to-completion simulation on a blocking worker
//!
//! The stepper (and the stock it owns) moves into a `spawn_blocking` task.
//! Progress is sent over an unbounded channel so the owning context can drain
//! it on its own schedule, and a shared flag lets that context stop the run
//! between chunks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use millkit_core::{Error, Result, SimulationError};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::stepper::MillStepper;

/// Options for [`spawn_run_to_completion`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Cells milled between cancellation checks and progress reports.
    pub cancel_check_interval: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            cancel_check_interval: 4096,
        }
    }
}

/// Progress snapshot sent after each chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationProgress {
    pub segment: usize,
    pub segments: usize,
    pub cells: u64,
}

impl SimulationProgress {
    fn of(stepper: &MillStepper) -> Self {
        Self {
            segment: stepper.segment().min(stepper.segment_count()),
            segments: stepper.segment_count(),
            cells: stepper.cells_milled(),
        }
    }

    /// Completed fraction in `[0, 1]`
    pub fn fraction(&self) -> f64 {
        if self.segments == 0 {
            1.0
        } else {
            self.segment as f64 / self.segments as f64
        }
    }
}

/// How a background run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
    Failed(SimulationError),
}

/// Handle to a background run
pub struct RunHandle {
    progress: mpsc::UnboundedReceiver<SimulationProgress>,
    cancel: Arc<AtomicBool>,
    task: JoinHandle<(MillStepper, RunOutcome)>,
}

impl RunHandle {
    /// Progress reports, oldest first
    pub fn progress(&mut self) -> &mut mpsc::UnboundedReceiver<SimulationProgress> {
        &mut self.progress
    }

    /// Ask the worker to stop at its next check
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Shared cancellation flag, for wiring into other contexts
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Wait for the worker and take the stepper back
    pub async fn join(self) -> Result<(MillStepper, RunOutcome)> {
        self.task
            .await
            .map_err(|e| Error::other(format!("simulation worker failed: {}", e)))
    }
}

/// Start running a loaded stepper to completion on the blocking pool
///
/// Must be called from within a tokio runtime.
pub fn spawn_run_to_completion(stepper: MillStepper, options: RunOptions) -> RunHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    let task = tokio::task::spawn_blocking(move || run_blocking(stepper, options, &flag, &tx));
    RunHandle {
        progress: rx,
        cancel,
        task,
    }
}

fn run_blocking(
    mut stepper: MillStepper,
    options: RunOptions,
    cancel: &AtomicBool,
    progress: &mpsc::UnboundedSender<SimulationProgress>,
) -> (MillStepper, RunOutcome) {
    let chunk = options.cancel_check_interval.max(1);
    info!("Background simulation started (chunk = {} cells)", chunk);
    loop {
        if cancel.load(Ordering::SeqCst) {
            info!(
                "Background simulation cancelled after {} cells",
                stepper.cells_milled()
            );
            return (stepper, RunOutcome::Cancelled);
        }
        match stepper.step(chunk, false) {
            Ok(more) => {
                // receiver may be gone; the run still completes
                let _ = progress.send(SimulationProgress::of(&stepper));
                if !more {
                    debug!("Background simulation drained");
                    return (stepper, RunOutcome::Completed);
                }
            }
            Err(e) => return (stepper, RunOutcome::Failed(e)),
        }
    }
}
