//! Move file reader

use std::path::Path;
use std::sync::OnceLock;

use millkit_core::{FileFrame, MoveFileError, MoveSequence, PartialPosition, ToolData};
use nalgebra::Point3;
use regex::Regex;
use tracing::{debug, info};

use super::MoveProgram;

fn line_regex() -> &'static Regex {
    static LINE_REGEX: OnceLock<Regex> = OnceLock::new();
    LINE_REGEX.get_or_init(|| {
        Regex::new(r"^N(\d+)G01((?:[XYZ]-?\d+\.\d{3})+)$").expect("invalid regex pattern")
    })
}

fn word_regex() -> &'static Regex {
    static WORD_REGEX: OnceLock<Regex> = OnceLock::new();
    WORD_REGEX.get_or_init(|| Regex::new(r"([XYZ])(-?\d+\.\d{3})").expect("invalid regex pattern"))
}

/// Parse one trimmed move line into its index and file-space axis updates
///
/// Returns `None` when the line does not follow the move grammar.
pub fn parse_move_line(line: &str) -> Option<(u64, PartialPosition)> {
    let caps = line_regex().captures(line)?;
    let index = caps.get(1)?.as_str().parse::<u64>().ok()?;
    let mut partial = PartialPosition::new();
    for word in word_regex().captures_iter(caps.get(2)?.as_str()) {
        let axis = word.get(1)?.as_str().chars().next()?;
        let value = word.get(2)?.as_str().parse::<f64>().ok()?;
        partial.set_axis(axis, value);
    }
    Some((index, partial))
}

/// Parse move file content into world-space points
///
/// Blank lines are skipped. The first missing axis values come from the
/// file-space origin.
pub fn parse_moves(content: &str, frame: &FileFrame) -> Result<MoveSequence, MoveFileError> {
    let mut current = Point3::origin();
    let mut moves = Vec::new();

    for (line_idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let (_, partial) =
            parse_move_line(line).ok_or_else(|| MoveFileError::MalformedLine {
                line_number: line_idx + 1,
                content: line.to_string(),
            })?;
        current = partial.apply_to(&current);
        moves.push(frame.to_world(&current));
    }

    debug!("Parsed {} moves", moves.len());
    Ok(moves)
}

/// Read a move file, decoding the tool from its extension
pub fn read_move_file(path: &Path) -> Result<MoveProgram, MoveFileError> {
    let tool = ToolData::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|e| MoveFileError::Unreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let moves = parse_moves(&content, &FileFrame::new())?;
    info!(
        "Loaded {} moves from {} ({})",
        moves.len(),
        path.display(),
        tool
    );
    Ok(MoveProgram::new(tool, moves))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_line() {
        let (index, partial) = parse_move_line("N12G01X1.000Y-2.500Z30.125").unwrap();
        assert_eq!(index, 12);
        assert_eq!(partial, PartialPosition::xyz(1.0, -2.5, 30.125));
    }

    #[test]
    fn test_parse_partial_line() {
        let (_, partial) = parse_move_line("N2G01Y5.000").unwrap();
        assert_eq!(
            partial,
            PartialPosition {
                y: Some(5.0),
                ..PartialPosition::default()
            }
        );
    }

    #[test]
    fn test_rejects_bad_lines() {
        for line in [
            "N1G01X1.00",
            "N1G00X1.000",
            "G01X1.000",
            "N1G01",
            "N1G01X1.000 Y2.000",
            "N1G01A1.000",
            "N1G01X+1.000",
            "N1G01X1.0000",
        ] {
            assert!(parse_move_line(line).is_none(), "accepted {line}");
        }
    }

    #[test]
    fn test_carry_over() {
        let frame = FileFrame::with_scale(1.0);
        let moves = parse_moves("N1G01X1.000Y2.000Z3.000\nN2G01Y5.000\n", &frame).unwrap();
        assert_eq!(moves.len(), 2);
        // file (1, 5, 3) is world (1, 3, -5)
        assert_eq!(moves[1], Point3::new(1.0, 3.0, -5.0));
    }

    #[test]
    fn test_first_move_defaults_to_origin() {
        let frame = FileFrame::with_scale(1.0);
        let moves = parse_moves("N1G01Z2.000", &frame).unwrap();
        assert_eq!(moves, vec![Point3::new(0.0, 2.0, 0.0)]);
    }

    #[test]
    fn test_malformed_line_reports_number() {
        let content = "N1G01X1.000\n\n  N2G01Y1.000  \nN3G01X1.5\n";
        let err = parse_moves(content, &FileFrame::new()).unwrap_err();
        assert_eq!(
            err,
            MoveFileError::MalformedLine {
                line_number: 4,
                content: "N3G01X1.5".to_string(),
            }
        );
    }
}
