//! millkit command line
//!
//! Inspects move files, simulates them against fresh stock and generates
//! roughing paths from serialized heightmaps.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use millkit::{
    init_logging, plan_roughing, read_move_file, simulate_live, simulate_program, write_toolpath,
    Heightmap, MillConfig, Outcome, RunOutcome, ToolShape, BUILD_DATE, VERSION,
};

#[derive(Parser)]
#[command(name = "millkit")]
#[command(about = "Height-field milling simulator and toolpath generator", long_about = None)]
#[command(version = VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a move file and report its tool and move count
    Check {
        /// Move file, e.g. part.k16
        file: PathBuf,
    },
    /// Run a move file to completion against fresh stock
    Simulate {
        file: PathBuf,
        /// JSON or TOML config (default: per-user config if present)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Step on this thread in ticks of `simulation.step_budget` cells
        #[arg(long)]
        live: bool,
    },
    /// Build a roughing path from a heightmap serialized as JSON
    Rough {
        heightmap: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output directory (default: from config)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// File stem of the written move file
        #[arg(short, long, default_value = "rough")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();
    tracing::debug!("millkit {} (built {})", VERSION, BUILD_DATE);

    match cli.command {
        Commands::Check { file } => check(&file),
        Commands::Simulate { file, config, live } => {
            simulate(&file, config.as_deref(), live).await
        }
        Commands::Rough {
            heightmap,
            config,
            out,
            name,
        } => rough(&heightmap, config.as_deref(), out, &name),
    }
}

fn check(file: &Path) -> Result<()> {
    let program = read_move_file(file)?;
    println!(
        "{}: {} ({} mm), {} moves",
        file.display(),
        program.tool.shape,
        program.tool.diameter_mm,
        program.len()
    );
    Ok(())
}

async fn simulate(file: &Path, config: Option<&Path>, live: bool) -> Result<()> {
    let config = MillConfig::load_or_default(config)?;
    let program = read_move_file(file)?;

    let outcome = if live {
        simulate_live(&program, &config, |stepper| {
            tracing::trace!(
                "Segment {}/{} ({} cells)",
                stepper.segment(),
                stepper.segment_count(),
                stepper.cells_milled()
            );
        })?
    } else {
        simulate_program(&program, &config).await?
    };

    match outcome {
        Outcome::Skipped(reason) => println!("{}: {}", file.display(), reason),
        Outcome::Produced(report) => match report.outcome {
            RunOutcome::Completed => println!(
                "{}: removed volume {:.4} over {} cells",
                file.display(),
                report.removed_volume(),
                report.cells_milled
            ),
            RunOutcome::Cancelled => println!("{}: cancelled", file.display()),
            RunOutcome::Failed(err) => anyhow::bail!("{}: {}", file.display(), err),
        },
    }
    Ok(())
}

fn rough(heightmap: &Path, config: Option<&Path>, out: Option<PathBuf>, name: &str) -> Result<()> {
    let mut config = MillConfig::load_or_default(config)?;
    if let Some(out) = out {
        config.output.directory = out;
    }

    let content = std::fs::read_to_string(heightmap)
        .with_context(|| format!("reading {}", heightmap.display()))?;
    let map: Heightmap = serde_json::from_str(&content)
        .with_context(|| format!("parsing heightmap {}", heightmap.display()))?;

    let points = plan_roughing(&map, &config)?;
    std::fs::create_dir_all(&config.output.directory)?;
    let path = write_toolpath(
        &points,
        ToolShape::Ball,
        config.roughing.tool_diameter,
        &config,
        name,
    )?;
    println!("{}: {} moves", path.display(), points.len());
    Ok(())
}
