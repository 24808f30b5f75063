//! Error handling for millkit
//!
//! Provides the error types shared by every layer of the milling engine:
//! - Simulation errors (illegal cuts detected while stepping a program)
//! - Move file errors (filename codec, unreadable files, malformed lines)
//!
//! All error types use `thiserror` for ergonomic error handling.
//! Expected workflow states such as an empty program are not errors; see
//! [`crate::outcome`].

use nalgebra::Point3;
use thiserror::Error;

/// Simulation error type
///
/// Raised synchronously from inside a simulation step. Every variant is fatal
/// for the current run: the stepper halts until it is explicitly reset.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// The tool reached or passed the stock's base floor
    #[error(
        "Milling below base level {:.3} at ({:.3}, {:.3}, {:.3})",
        .base, .position.x, .position.y, .position.z
    )]
    BelowBaseLevel {
        /// World position of the tool tip when the cut was attempted.
        position: Point3<f64>,
        /// Base floor height in world units.
        base: f64,
    },

    /// A flat tool tried to cut downwards with its flat face
    #[error(
        "Flat tool cutting downward with its flat face at ({:.3}, {:.3}, {:.3})",
        .position.x, .position.y, .position.z
    )]
    FlatToolDownward {
        /// World position of the tool tip when the cut was attempted.
        position: Point3<f64>,
    },

    /// The stepper already failed and needs a reset
    #[error("Simulation halted after an illegal cut; reset before stepping again")]
    Halted,
}

impl SimulationError {
    /// World position associated with the error, if any
    pub fn position(&self) -> Option<Point3<f64>> {
        match self {
            Self::BelowBaseLevel { position, .. } | Self::FlatToolDownward { position } => {
                Some(*position)
            }
            Self::Halted => None,
        }
    }
}

/// Move file error type
///
/// Represents errors related to reading and writing the fixed-format
/// move files. Any of these means no parsed move may be trusted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveFileError {
    /// File extension does not encode a tool
    #[error("Invalid tool extension '{extension}': expected '.k<dd>' or '.f<dd>'")]
    BadExtension {
        /// The extension found on the file name (without the dot).
        extension: String,
    },

    /// Diameter digits in the extension are not a positive integer
    #[error("Invalid tool diameter '{value}' in file extension")]
    BadDiameter {
        /// The diameter text found in the extension.
        value: String,
    },

    /// Diameter cannot be encoded in two digits
    #[error("Tool diameter {diameter} mm cannot be encoded (valid: 1..99)")]
    DiameterOutOfRange {
        /// The diameter that was requested.
        diameter: u32,
    },

    /// The file could not be read
    #[error("Unable to read move file {path}: {reason}")]
    Unreadable {
        /// Path of the file.
        path: String,
        /// Underlying reason.
        reason: String,
    },

    /// A line does not follow the move grammar
    #[error("Malformed move at line {line_number}: '{content}'")]
    MalformedLine {
        /// 1-based line number.
        line_number: usize,
        /// The offending line content.
        content: String,
    },

    /// The file could not be written
    #[error("Unable to write move file {path}: {reason}")]
    Write {
        /// Path of the file.
        path: String,
        /// Underlying reason.
        reason: String,
    },
}

/// Main error type for millkit
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Simulation error
    #[error(transparent)]
    Simulation(#[from] SimulationError),

    /// Move file error
    #[error(transparent)]
    MoveFile(#[from] MoveFileError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is an illegal-cut simulation error
    pub fn is_simulation_error(&self) -> bool {
        matches!(self, Error::Simulation(_))
    }

    /// Check if this is a move file error
    pub fn is_move_file_error(&self) -> bool {
        matches!(self, Error::MoveFile(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
