//! # millkit Simulator
//!
//! Height-field stock removal for millkit.
//! Includes the stock model, the grid walk, the move sequence stepper,
//! a background runner, and move file I/O.

pub mod gcode;
pub mod runner;
pub mod stepper;
pub mod stock;
pub mod walk;

pub use gcode::{
    format_moves, move_file_name, move_file_path, parse_moves, read_move_file, write_move_file,
    MoveProgram,
};

pub use runner::{spawn_run_to_completion, RunHandle, RunOptions, RunOutcome, SimulationProgress};

pub use stepper::{MillStepper, StepperState, CUT_EPSILON};

pub use stock::{StockBlock, StockModel};

pub use walk::{clip_segment, DominantAxis, GridWalk, WalkCell};
