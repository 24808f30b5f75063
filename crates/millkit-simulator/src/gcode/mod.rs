//! Move file I/O
//!
//! Move files hold one linear move per line in file space (millimetres,
//! Z up) and encode the cutter in the file extension:
//!
//! ```text
//! part.k08
//! N1G01X0.000Y0.000Z60.000
//! N2G01X12.500Y-3.250Z20.000
//! N3G01Z60.000
//! ```
//!
//! Axes missing from a line carry over from the previous line.

pub mod filename;
pub mod reader;
pub mod writer;

pub use filename::{move_file_name, move_file_path};
pub use reader::{parse_move_line, parse_moves, read_move_file};
pub use writer::{format_move_line, format_moves, write_move_file};

use millkit_core::{MoveSequence, ToolData};
use serde::{Deserialize, Serialize};

/// A loaded move file: the cutter and its world-space moves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveProgram {
    pub tool: ToolData,
    pub moves: MoveSequence,
}

impl MoveProgram {
    pub fn new(tool: ToolData, moves: MoveSequence) -> Self {
        Self { tool, moves }
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}
