//! Tool definitions
//!
//! This module provides:
//! - Tool shapes (flat end mill, ball nose)
//! - [`ToolProfile`]: world-space cutter geometry used by the simulator
//! - [`ToolData`]: the shape + integer diameter pair encoded in move file names

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::MoveFileError;
use crate::units::mm_to_world;

/// Default shaft height in world units
pub const DEFAULT_SHAFT_HEIGHT: f64 = 4.0;

/// Cutter end shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ToolShape {
    /// Flat end mill
    Flat,
    /// Ball end mill / ball nose
    Ball,
}

impl ToolShape {
    /// Letter used in move file extensions
    pub fn code(&self) -> char {
        match self {
            Self::Flat => 'f',
            Self::Ball => 'k',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'f' => Some(Self::Flat),
            'k' => Some(Self::Ball),
            _ => None,
        }
    }
}

impl std::fmt::Display for ToolShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flat => write!(f, "Flat End Mill"),
            Self::Ball => write!(f, "Ball End Mill"),
        }
    }
}

/// Cutter geometry in world units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolProfile {
    /// Cutting diameter in world units.
    pub diameter: f64,
    /// Length of the cutting shaft in world units.
    pub shaft_height: f64,
    /// End shape.
    pub shape: ToolShape,
}

impl ToolProfile {
    pub fn new(shape: ToolShape, diameter: f64, shaft_height: f64) -> Self {
        Self {
            diameter,
            shaft_height,
            shape,
        }
    }

    /// Profile for a tool decoded from a move file name
    pub fn from_tool_data(data: &ToolData) -> Self {
        Self::new(
            data.shape,
            mm_to_world(data.diameter_mm as f64),
            DEFAULT_SHAFT_HEIGHT,
        )
    }

    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }

    pub fn is_flat(&self) -> bool {
        self.shape == ToolShape::Flat
    }

    /// Height of the cutter's underside at `planar_offset` from its axis
    ///
    /// `tip` is the height of the lowest point of the tool. Returns `None`
    /// outside the cutter's planar radius.
    pub fn contact_height(&self, planar_offset: f64, tip: f64) -> Option<f64> {
        let r = self.radius();
        if planar_offset > r {
            return None;
        }
        match self.shape {
            ToolShape::Flat => Some(tip),
            ToolShape::Ball => {
                let rise = r - (r * r - planar_offset * planar_offset).max(0.0).sqrt();
                Some(tip + rise)
            }
        }
    }
}

/// Tool identity persisted in a move file name
///
/// Encoded 1:1 as a three character extension: `k` (ball) or `f` (flat)
/// followed by the two digit diameter in millimetres, e.g. `path.k08`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct ToolData {
    pub shape: ToolShape,
    /// Diameter in whole millimetres (1..=99).
    pub diameter_mm: u32,
}

impl ToolData {
    pub fn new(shape: ToolShape, diameter_mm: u32) -> Self {
        Self { shape, diameter_mm }
    }

    /// Encode as a file extension (without the leading dot)
    pub fn extension(&self) -> Result<String, MoveFileError> {
        if !(1..=99).contains(&self.diameter_mm) {
            return Err(MoveFileError::DiameterOutOfRange {
                diameter: self.diameter_mm,
            });
        }
        Ok(format!("{}{:02}", self.shape.code(), self.diameter_mm))
    }

    /// Decode from a file extension, with or without the leading dot
    pub fn from_extension(extension: &str) -> Result<Self, MoveFileError> {
        let ext = extension.strip_prefix('.').unwrap_or(extension);
        Self::decode(ext).inspect_err(|e| debug!("Rejected tool extension {:?}: {}", ext, e))
    }

    fn decode(ext: &str) -> Result<Self, MoveFileError> {
        let bad_extension = || MoveFileError::BadExtension {
            extension: ext.to_string(),
        };

        let mut chars = ext.chars();
        let shape = chars
            .next()
            .and_then(ToolShape::from_code)
            .ok_or_else(bad_extension)?;
        let digits = chars.as_str();
        if digits.chars().count() != 2 {
            return Err(bad_extension());
        }

        let bad_diameter = || MoveFileError::BadDiameter {
            value: digits.to_string(),
        };
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(bad_diameter());
        }
        match digits.parse::<u32>() {
            Ok(d) if d > 0 => Ok(Self::new(shape, d)),
            _ => Err(bad_diameter()),
        }
    }

    /// Decode from the extension of a path
    pub fn from_path(path: &Path) -> Result<Self, MoveFileError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| MoveFileError::BadExtension {
                extension: String::new(),
            })?;
        Self::from_extension(ext)
    }

    pub fn profile(&self) -> ToolProfile {
        ToolProfile::from_tool_data(self)
    }
}

impl std::fmt::Display for ToolData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}mm", self.shape, self.diameter_mm)
    }
}
