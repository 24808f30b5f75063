//! Move file naming

use std::path::{Path, PathBuf};

use millkit_core::{MoveFileError, ToolData};

/// File name for a path milled with `tool`, e.g. `rough.k16`
pub fn move_file_name(name: &str, tool: &ToolData) -> Result<String, MoveFileError> {
    Ok(format!("{}.{}", name, tool.extension()?))
}

/// Full path of a move file inside `location`
pub fn move_file_path(
    location: &Path,
    name: &str,
    tool: &ToolData,
) -> Result<PathBuf, MoveFileError> {
    Ok(location.join(move_file_name(name, tool)?))
}
