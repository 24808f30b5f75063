//! Move sequence replay against the stock
//!
//! [`MillStepper`] walks each segment of a move sequence cell by cell,
//! lowering the stock under the tool footprint and stopping at the first
//! illegal cut.

use millkit_core::{Degenerate, Outcome, SimulationError, ToolProfile};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::stock::StockModel;
use crate::walk::{clip_segment, GridWalk, WalkCell};

/// Tolerance for the illegal-cut checks, in world units
pub const CUT_EPSILON: f64 = 1e-4;

/// Stepper lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepperState {
    /// No program loaded
    Idle,
    /// Walking a segment of the loaded program
    Advancing,
    /// Every segment has been milled
    Finished,
    /// An illegal cut stopped the run; only `reset` recovers
    Failed,
}

/// Footprint context for one walk cell
#[derive(Debug, Clone, Copy)]
struct Footprint {
    x: i64,
    z: i64,
    tip: f64,
    /// Mill only the half-disc ahead of this travel direction.
    leading: Option<(i64, i64)>,
    descending: bool,
}

/// Replays a move sequence against a [`StockModel`]
///
/// The stepper owns its stock while a program runs, so no other stepper can
/// mutate the same height field.
#[derive(Debug, Clone)]
pub struct MillStepper {
    stock: StockModel,
    tool: ToolProfile,
    state: StepperState,
    moves: Vec<Point3<f64>>,
    segment: usize,
    walk: Option<GridWalk>,
    leading: Option<(i64, i64)>,
    descending: bool,
    tool_position: Point3<f64>,
    cells_milled: u64,
}

impl MillStepper {
    pub fn new(stock: StockModel, tool: ToolProfile) -> Self {
        Self {
            stock,
            tool,
            state: StepperState::Idle,
            moves: Vec::new(),
            segment: 0,
            walk: None,
            leading: None,
            descending: false,
            tool_position: Point3::origin(),
            cells_milled: 0,
        }
    }

    /// Load a program and start at its first segment
    ///
    /// An empty program is a degenerate outcome and leaves the stepper idle.
    /// A failed stepper must be reset first.
    pub fn begin(&mut self, moves: &[Point3<f64>]) -> Result<Outcome<()>, SimulationError> {
        if self.state == StepperState::Failed {
            return Err(SimulationError::Halted);
        }
        let Some(first) = moves.first() else {
            warn!("Refusing to simulate an empty move sequence");
            return Ok(Outcome::Skipped(Degenerate::EmptyPath));
        };

        self.moves = moves.to_vec();
        self.segment = 0;
        self.walk = None;
        self.tool_position = *first;
        self.cells_milled = 0;
        self.state = StepperState::Advancing;
        info!(
            "Simulating {} moves with {} (d = {:.3})",
            moves.len(),
            self.tool.shape,
            self.tool.diameter
        );
        Ok(Outcome::Produced(()))
    }

    /// Advance the simulation
    ///
    /// Mills up to `budget` walk cells, or everything left when `jump` is
    /// set. Returns whether more work remains.
    pub fn step(&mut self, budget: usize, jump: bool) -> Result<bool, SimulationError> {
        match self.state {
            StepperState::Idle | StepperState::Finished => return Ok(false),
            StepperState::Failed => return Err(SimulationError::Halted),
            StepperState::Advancing => {}
        }

        if self.moves.len() == 1 {
            let only = self.moves[0];
            let (min, max) = self.reach();
            if clip_segment((only.x, only.z), (only.x, only.z), min, max).is_some() {
                let (x, z) = self.stock.snap_to_grid(only.x, only.z);
                let footprint = Footprint {
                    x,
                    z,
                    tip: only.y,
                    leading: None,
                    descending: false,
                };
                self.mill_footprint(&footprint).map_err(|e| self.fail(e))?;
            }
            self.cells_milled += 1;
            self.finish();
            return Ok(false);
        }

        let mut remaining = if jump { u64::MAX } else { budget.max(1) as u64 };
        while remaining > 0 {
            let Some(walk) = self.walk.as_mut() else {
                if !self.enter_segment() {
                    self.finish();
                    return Ok(false);
                }
                continue;
            };
            match walk.next() {
                Some(cell) => {
                    self.mill_cell(cell).map_err(|e| self.fail(e))?;
                    remaining -= 1;
                }
                None => {
                    self.walk = None;
                    self.segment += 1;
                }
            }
        }

        let last_segment = self.segment + 2 >= self.moves.len();
        if last_segment && self.walk.as_ref().is_some_and(GridWalk::is_done) {
            self.finish();
            return Ok(false);
        }
        Ok(true)
    }

    /// Run the whole program in one call
    pub fn run_to_end(&mut self) -> Result<(), SimulationError> {
        while self.step(0, true)? {}
        Ok(())
    }

    /// Clear the program and restore the stock to full height
    pub fn reset(&mut self) {
        self.stock.restore();
        self.state = StepperState::Idle;
        self.moves.clear();
        self.segment = 0;
        self.walk = None;
        self.cells_milled = 0;
        debug!("Stepper reset");
    }

    /// Replace the tool; the current program is discarded
    pub fn set_tool(&mut self, tool: ToolProfile) {
        self.tool = tool;
        self.reset();
    }

    /// Start walking the next segment that comes within reach of the stock
    ///
    /// Segments are clipped to [`Self::reach`] first, so a far-off move only
    /// walks the cells where the tool can still touch material.
    fn enter_segment(&mut self) -> bool {
        let (min, max) = self.reach();
        while self.segment + 1 < self.moves.len() {
            let from = self.moves[self.segment];
            let to = self.moves[self.segment + 1];
            let Some((t0, t1)) = clip_segment((from.x, from.z), (to.x, to.z), min, max) else {
                debug!("Segment {} never reaches the stock", self.segment);
                self.segment += 1;
                continue;
            };
            let at = |t: f64| {
                if t <= 0.0 {
                    from
                } else if t >= 1.0 {
                    to
                } else {
                    from + (to - from) * t
                }
            };
            let (start, end) = (at(t0), at(t1));
            let walk = GridWalk::new(
                self.stock.snap_to_grid(start.x, start.z),
                self.stock.snap_to_grid(end.x, end.z),
                start.y,
                end.y,
            );

            let horizontal = (to.y - from.y).abs() < CUT_EPSILON;
            self.leading = if horizontal {
                walk.axis_direction()
            } else {
                None
            };
            self.descending = to.y - from.y < -CUT_EPSILON;
            debug!(
                "Segment {}: {} steps, {:?} dominant",
                self.segment,
                walk.steps(),
                walk.dominant_axis()
            );
            self.walk = Some(walk);
            return true;
        }
        false
    }

    /// World (x, z) box inside which the tool can touch the stock
    fn reach(&self) -> ((f64, f64), (f64, f64)) {
        let block = self.stock.block();
        let (cx, cz) = block.corner();
        let (cell_x, cell_z) = self.stock.cell_size();
        let rx = self.tool.radius() + cell_x;
        let rz = self.tool.radius() + cell_z;
        (
            (cx - rx, cz - rz),
            (cx + block.size.x + rx, cz + block.size.z + rz),
        )
    }

    fn mill_cell(&mut self, cell: WalkCell) -> Result<(), SimulationError> {
        let footprint = Footprint {
            x: cell.x,
            z: cell.z,
            tip: cell.tip,
            leading: if cell.index > 0 { self.leading } else { None },
            descending: self.descending,
        };
        self.tool_position = self.world_position(cell.x, cell.z, cell.tip);
        self.mill_footprint(&footprint)?;
        self.cells_milled += 1;
        Ok(())
    }

    /// Lower every stock sample under the tool at one walk position
    fn mill_footprint(&mut self, footprint: &Footprint) -> Result<(), SimulationError> {
        let (cell_x, cell_z) = self.stock.cell_size();
        let radius = self.tool.radius();
        let reach_x = (radius / cell_x).ceil() as i64;
        let reach_z = (radius / cell_z).ceil() as i64;
        let floor = self.stock.base_floor();

        for dz in -reach_z..=reach_z {
            for dx in -reach_x..=reach_x {
                if let Some((lx, lz)) = footprint.leading {
                    if dx * lx + dz * lz < 0 {
                        continue;
                    }
                }
                let (x, z) = (footprint.x + dx, footprint.z + dz);
                let Some(current) = self.stock.height(x, z) else {
                    continue;
                };
                let offset = ((dx as f64 * cell_x).powi(2) + (dz as f64 * cell_z).powi(2)).sqrt();
                let Some(contact) = self.tool.contact_height(offset, footprint.tip) else {
                    continue;
                };

                let position = self.world_position(footprint.x, footprint.z, footprint.tip);
                if contact <= floor {
                    return Err(SimulationError::BelowBaseLevel {
                        position,
                        base: floor,
                    });
                }
                if self.tool.is_flat() && footprint.descending && current - contact > CUT_EPSILON
                {
                    return Err(SimulationError::FlatToolDownward { position });
                }
                self.stock.set_height_if_lower(x, z, contact);
            }
        }
        Ok(())
    }

    fn world_position(&self, x: i64, z: i64, y: f64) -> Point3<f64> {
        let (wx, wz) = self.stock.grid_to_world(x as f64, z as f64);
        Point3::new(wx, y, wz)
    }

    fn finish(&mut self) {
        if let Some(last) = self.moves.last() {
            self.tool_position = *last;
        }
        self.walk = None;
        self.state = StepperState::Finished;
        info!(
            "Simulation finished: {} cells milled, {:.4} removed",
            self.cells_milled,
            self.stock.removed_volume()
        );
    }

    fn fail(&mut self, error: SimulationError) -> SimulationError {
        if let Some(position) = error.position() {
            self.tool_position = position;
        }
        self.state = StepperState::Failed;
        warn!("Simulation halted: {}", error);
        error
    }

    pub fn state(&self) -> StepperState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == StepperState::Advancing
    }

    /// Current tool tip position in world space
    pub fn tool_position(&self) -> Point3<f64> {
        self.tool_position
    }

    pub fn tool(&self) -> &ToolProfile {
        &self.tool
    }

    pub fn stock(&self) -> &StockModel {
        &self.stock
    }

    /// Give up the stock, e.g. to rebuild it with new dimensions
    pub fn into_stock(self) -> StockModel {
        self.stock
    }

    /// Index of the segment being milled
    pub fn segment(&self) -> usize {
        self.segment
    }

    pub fn segment_count(&self) -> usize {
        self.moves.len().saturating_sub(1)
    }

    pub fn cells_milled(&self) -> u64 {
        self.cells_milled
    }
}
