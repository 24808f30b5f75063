//! millkit Settings Crate
//!
//! Stock, simulation, planner and output configuration, persisted as JSON or TOML.

pub mod config;
pub mod error;

pub use config::{MillConfig, OutputSettings, SimulationSettings, StockSettings};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
