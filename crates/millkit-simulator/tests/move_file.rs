//! Move file round-trips through the filesystem

use millkit_core::{MoveFileError, ToolData, ToolShape};
use millkit_simulator::{read_move_file, write_move_file};
use nalgebra::Point3;
use tempfile::TempDir;

#[test]
fn test_write_then_read_round_trip() {
    let dir = TempDir::new().unwrap();
    let tool = ToolData::new(ToolShape::Ball, 8);
    let points = vec![
        Point3::new(0.0, 6.0, 0.0),
        Point3::new(-7.25, 1.5, 3.125),
        Point3::new(7.5, 0.0214, -7.5),
    ];

    let path = write_move_file(&points, &tool, dir.path(), "1", 1).unwrap();
    assert_eq!(path.file_name().unwrap(), "1.k08");

    let program = read_move_file(&path).unwrap();
    assert_eq!(program.tool, tool);
    assert_eq!(program.len(), points.len());
    for (read, written) in program.moves.iter().zip(&points) {
        // 3 decimals in millimetres
        assert!((read - written).norm() < 1e-4, "{read:?} vs {written:?}");
    }

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("N1G01X0.000Y0.000Z60.000\n"));
}

#[test]
fn test_read_carries_axes_over() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("part.f10");
    std::fs::write(&path, "N1G01X1.000Y2.000Z3.000\nN2G01Y5.000\n").unwrap();

    let program = read_move_file(&path).unwrap();
    assert_eq!(program.tool, ToolData::new(ToolShape::Flat, 10));
    let second = program.moves[1];
    // file (1, 5, 3) mm -> world (0.1, 0.3, -0.5) cm
    assert!((second - Point3::new(0.1, 0.3, -0.5)).norm() < 1e-12);
}

#[test]
fn test_read_rejects_bad_files() {
    let dir = TempDir::new().unwrap();

    let bad_ext = dir.path().join("part.nc");
    std::fs::write(&bad_ext, "N1G01X1.000\n").unwrap();
    assert!(matches!(
        read_move_file(&bad_ext),
        Err(MoveFileError::BadExtension { .. })
    ));

    let missing = dir.path().join("missing.k08");
    assert!(matches!(
        read_move_file(&missing),
        Err(MoveFileError::Unreadable { .. })
    ));

    let malformed = dir.path().join("bad.k08");
    std::fs::write(&malformed, "N1G01X1.000\nN2G01X1.000Q\n").unwrap();
    assert!(matches!(
        read_move_file(&malformed),
        Err(MoveFileError::MalformedLine { line_number: 2, .. })
    ));
}

#[test]
fn test_empty_file_loads_no_moves() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.k01");
    std::fs::write(&path, "\n").unwrap();
    assert!(read_move_file(&path).unwrap().is_empty());
}
