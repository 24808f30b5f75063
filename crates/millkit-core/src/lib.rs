//! # millkit Core
//!
//! Core types, traits, and utilities for millkit.
//! Provides the error taxonomy, tool geometry, the file/world frame
//! transform, and the geometry capabilities the planners consume.

pub mod data;
pub mod error;
pub mod geometry;
pub mod outcome;
pub mod units;

pub use data::{MoveSequence, PartialPosition, ToolData, ToolProfile, ToolShape};

pub use error::{Error, MoveFileError, Result, SimulationError};

pub use geometry::{
    Heightmap, HeightmapSource, IntersectionCurve, IntersectionFinder, IntersectionResult,
    ParameterDomain, ParametricSurface, SearchSeed,
};

pub use outcome::{Degenerate, Outcome};

pub use units::{mm_to_world, FileFrame, SCALE};
