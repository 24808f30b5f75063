//! Glue between the configuration, the planners and the simulator

use std::path::PathBuf;

use millkit_camtools::{
    BasePaths, BasePlanner, CamToolResult, ContourSegment, DetailPlanner, RoughPlanner,
};
use millkit_core::{
    Heightmap, MoveFileError, Outcome, ParametricSurface, SimulationError, ToolData, ToolShape,
};
use millkit_settings::MillConfig;
use millkit_simulator::{
    spawn_run_to_completion, write_move_file, MillStepper, MoveProgram, RunOutcome, StockModel,
};
use nalgebra::Point3;
use tracing::{debug, info, warn};

/// What a run-to-completion simulation left behind
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub outcome: RunOutcome,
    pub cells_milled: u64,
    pub stock: StockModel,
}

impl SimulationReport {
    pub fn removed_volume(&self) -> f64 {
        self.stock.removed_volume()
    }
}

/// Mill `program` into fresh stock built from `config`
///
/// Must be called from within a tokio runtime.
pub async fn simulate_program(
    program: &MoveProgram,
    config: &MillConfig,
) -> anyhow::Result<Outcome<SimulationReport>> {
    let mut stepper = MillStepper::new(config.stock.model(), program.tool.profile());
    if let Outcome::Skipped(reason) = stepper.begin(&program.moves)? {
        warn!("Nothing to simulate: {}", reason);
        return Ok(Outcome::Skipped(reason));
    }

    let mut handle = spawn_run_to_completion(stepper, config.simulation.run_options());
    while let Some(progress) = handle.progress().recv().await {
        debug!(
            "Segment {}/{} ({} cells)",
            progress.segment, progress.segments, progress.cells
        );
    }
    let (stepper, outcome) = handle.join().await?;

    let report = SimulationReport {
        outcome,
        cells_milled: stepper.cells_milled(),
        stock: stepper.into_stock(),
    };
    info!(
        "Simulation finished: {:?}, removed volume {:.4}",
        report.outcome,
        report.removed_volume()
    );
    Ok(Outcome::Produced(report))
}

/// Mill `program` on the calling thread, `step_budget` cells per tick
///
/// `on_tick` sees the stepper after every tick, including the last one.
pub fn simulate_live(
    program: &MoveProgram,
    config: &MillConfig,
    mut on_tick: impl FnMut(&MillStepper),
) -> Result<Outcome<SimulationReport>, SimulationError> {
    let mut stepper = MillStepper::new(config.stock.model(), program.tool.profile());
    if let Outcome::Skipped(reason) = stepper.begin(&program.moves)? {
        warn!("Nothing to simulate: {}", reason);
        return Ok(Outcome::Skipped(reason));
    }

    let budget = config.simulation.step_budget;
    let outcome = loop {
        match stepper.step(budget, false) {
            Ok(more) => {
                on_tick(&stepper);
                if !more {
                    break RunOutcome::Completed;
                }
            }
            Err(e) => break RunOutcome::Failed(e),
        }
    };
    debug!("Live run ended after {} cells", stepper.cells_milled());

    Ok(Outcome::Produced(SimulationReport {
        outcome,
        cells_milled: stepper.cells_milled(),
        stock: stepper.into_stock(),
    }))
}

/// Roughing path over the configured stock footprint
pub fn plan_roughing(heightmap: &Heightmap, config: &MillConfig) -> CamToolResult<Vec<Point3<f64>>> {
    RoughPlanner::new(config.roughing).plan(heightmap, &config.stock.footprint())
}

/// Raster finishing path over `surface` with the configured detail pass
pub fn plan_detail(
    surface: &dyn ParametricSurface,
    config: &MillConfig,
) -> CamToolResult<Outcome<Vec<Point3<f64>>>> {
    DetailPlanner::new(config.detail).plan(surface)
}

/// Facing and contour paths around `silhouette` on the configured stock
pub fn plan_base(
    silhouette: Vec<ContourSegment>,
    config: &MillConfig,
) -> CamToolResult<Outcome<BasePaths>> {
    BasePlanner::new(config.base).plan(silhouette, &config.stock.footprint())
}

/// Write `points` into the configured output directory as `name.<tool>`
pub fn write_toolpath(
    points: &[Point3<f64>],
    shape: ToolShape,
    diameter_mm: f64,
    config: &MillConfig,
    name: &str,
) -> Result<PathBuf, MoveFileError> {
    let tool = ToolData::new(shape, diameter_mm.round().max(0.0) as u32);
    write_move_file(
        points,
        &tool,
        &config.output.directory,
        name,
        config.output.start_index,
    )
}
