//! # millkit
//!
//! Height-field milling simulation and three-axis toolpath generation:
//! - Stock removal simulation of ball and flat end mills with illegal-cut detection
//! - Move file reading and writing with the cutter encoded in the extension
//! - Roughing, parametric detail and base contour toolpath planners
//!
//! ## Architecture
//!
//! millkit is organized as a workspace with multiple crates:
//!
//! 1. **millkit-core** - Error taxonomy, tool types, frame transform, geometry capabilities
//! 2. **millkit-simulator** - Stock model, stepper, background runner, move file I/O
//! 3. **millkit-camtools** - Path simplification, contour graphs, roughing/detail/base planners
//! 4. **millkit-settings** - Configuration persisted as JSON or TOML
//! 5. **millkit** - Logging setup, pipeline helpers and the command-line binary

pub mod pipeline;

pub use millkit_camtools as camtools;
pub use millkit_settings as settings;
pub use millkit_simulator as simulator;

pub use millkit_core::{
    Degenerate, Error, FileFrame, Heightmap, MoveFileError, Outcome, Result, SimulationError,
    ToolData, ToolProfile, ToolShape, SCALE,
};

pub use millkit_simulator::{
    read_move_file, spawn_run_to_completion, write_move_file, MillStepper, MoveProgram,
    RunOutcome, StockModel,
};

pub use millkit_camtools::{
    BasePlanner, ContourGraphBuilder, DetailPlanner, RoughPlanner, StockFootprint,
};

pub use millkit_settings::MillConfig;

pub use pipeline::{
    plan_base, plan_detail, plan_roughing, simulate_live, simulate_program, write_toolpath,
    SimulationReport,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output on stderr
/// - RUST_LOG environment variable support, INFO by default
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_names(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
