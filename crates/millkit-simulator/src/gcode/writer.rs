//! Move file writer

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use millkit_core::{FileFrame, MoveFileError, ToolData};
use nalgebra::Point3;
use tracing::info;

use super::filename::move_file_path;

/// Round to the file precision, folding negative zero into zero
fn file_value(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0 + 0.0
}

/// Format one move line from a file-space point
pub fn format_move_line(index: usize, file_point: &Point3<f64>) -> String {
    format!(
        "N{}G01X{:.3}Y{:.3}Z{:.3}",
        index,
        file_value(file_point.x),
        file_value(file_point.y),
        file_value(file_point.z)
    )
}

/// Format world-space points as move file content
pub fn format_moves(points: &[Point3<f64>], frame: &FileFrame, start_index: usize) -> String {
    let mut out = String::with_capacity(points.len() * 32);
    for (i, point) in points.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}",
            format_move_line(start_index + i, &frame.to_file(point))
        );
    }
    out
}

/// Write world-space points to `location/name.<tool extension>`
pub fn write_move_file(
    points: &[Point3<f64>],
    tool: &ToolData,
    location: &Path,
    name: &str,
    start_index: usize,
) -> Result<PathBuf, MoveFileError> {
    let path = move_file_path(location, name, tool)?;
    let content = format_moves(points, &FileFrame::new(), start_index);
    std::fs::write(&path, content).map_err(|e| MoveFileError::Write {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    info!("Wrote {} moves to {}", points.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line() {
        assert_eq!(
            format_move_line(3, &Point3::new(1.0, -2.5, 0.0004)),
            "N3G01X1.000Y-2.500Z0.000"
        );
        assert_eq!(
            format_move_line(1, &Point3::new(-0.0, -0.0001, 12.3456)),
            "N1G01X0.000Y0.000Z12.346"
        );
    }

    #[test]
    fn test_format_moves_remaps_axes() {
        let content = format_moves(
            &[Point3::new(1.0, 2.0, 3.0), Point3::new(0.5, 0.0, -1.0)],
            &FileFrame::new(),
            10,
        );
        assert_eq!(
            content,
            "N10G01X10.000Y-30.000Z20.000\nN11G01X5.000Y10.000Z0.000\n"
        );
    }
}
