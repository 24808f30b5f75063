//! Configuration Management
//!
//! Stock dimensions, simulation pacing, planner parameters and output
//! naming. Persists as JSON or TOML depending on the file extension.

use std::path::{Path, PathBuf};

use millkit_camtools::{BaseParameters, DetailParameters, RoughingParameters, StockFootprint};
use millkit_simulator::{RunOptions, StockBlock, StockModel};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};

/// Raw block settings, in world units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockSettings {
    /// Extents along X, Y (height) and Z
    pub size: [f64; 3],
    /// Centre of the bottom face
    pub position: [f64; 3],
    /// Grid divisions along X and Z
    pub divisions: [usize; 2],
    /// Cutting floor, measured up from the bottom face
    pub base_height: f64,
}

impl Default for StockSettings {
    fn default() -> Self {
        Self {
            size: [15.0, 5.0, 15.0],
            position: [0.0, 0.0, 0.0],
            divisions: [300, 300],
            base_height: 1.0,
        }
    }
}

impl StockSettings {
    pub fn block(&self) -> StockBlock {
        StockBlock::new(
            Vector3::from(self.size),
            Point3::from(self.position),
            self.base_height,
        )
    }

    /// Fresh full-height stock
    pub fn model(&self) -> StockModel {
        StockModel::new(self.block(), self.divisions[0], self.divisions[1])
    }

    pub fn footprint(&self) -> StockFootprint {
        StockFootprint::centered(self.position[0], self.position[2], self.size[0], self.size[2])
    }

    /// Absolute height of the cutting floor
    pub fn floor(&self) -> f64 {
        self.position[1] + self.base_height
    }
}

/// Simulation pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Cells milled per live tick
    pub step_budget: usize,
    /// Cells between cancellation checks when running to completion
    pub cancel_check_interval: usize,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            step_budget: 200,
            cancel_check_interval: RunOptions::default().cancel_check_interval,
        }
    }
}

impl SimulationSettings {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            cancel_check_interval: self.cancel_check_interval,
        }
    }
}

/// Where generated move files go
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSettings {
    pub directory: PathBuf,
    /// First `N` index written to a move file
    pub start_index: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            start_index: 1,
        }
    }
}

/// Complete millkit configuration
///
/// Aggregates all sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MillConfig {
    #[serde(default)]
    pub stock: StockSettings,
    #[serde(default)]
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub roughing: RoughingParameters,
    #[serde(default)]
    pub detail: DetailParameters,
    #[serde(default)]
    pub base: BaseParameters,
    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

impl MillConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-user config location, `<config dir>/millkit/config.toml`
    pub fn default_path() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("millkit").join("config.toml"))
            .ok_or_else(|| ConfigError::UnsupportedPlatform(std::env::consts::OS.to_string()))
    }

    /// Load `path` if given, else the per-user file if it exists, else defaults
    pub fn load_or_default(path: Option<&Path>) -> SettingsResult<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }
        match Self::default_path() {
            Ok(path) if path.is_file() => Self::load_from_file(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = Format::of(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match Format::of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content).map_err(|e| {
            SettingsError::SaveError(format!("{}: {}", path.display(), e))
        })?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        let stock = &self.stock;
        if stock.size.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(SettingsError::invalid(
                "stock.size",
                "every extent must be positive",
            ));
        }
        if stock.position.iter().any(|p| !p.is_finite()) {
            return Err(SettingsError::invalid("stock.position", "must be finite"));
        }
        if stock.divisions.contains(&0) {
            return Err(SettingsError::invalid(
                "stock.divisions",
                "must be at least 1",
            ));
        }
        if !(0.0..stock.size[1]).contains(&stock.base_height) {
            return Err(ConfigError::ValueOutOfRange {
                key: "stock.base_height".to_string(),
                value: stock.base_height.to_string(),
            }
            .into());
        }

        if self.simulation.step_budget == 0 {
            return Err(SettingsError::invalid(
                "simulation.step_budget",
                "must be > 0",
            ));
        }
        if self.simulation.cancel_check_interval == 0 {
            return Err(SettingsError::invalid(
                "simulation.cancel_check_interval",
                "must be > 0",
            ));
        }

        self.roughing.validate()?;
        self.detail.validate()?;
        self.base.validate()?;

        if self.base.cut_height <= stock.floor() {
            return Err(ConfigError::ValueOutOfRange {
                key: "base.cut_height".to_string(),
                value: self.base.cut_height.to_string(),
            }
            .into());
        }

        Ok(())
    }
}
