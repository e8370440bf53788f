//! Coordinate text ingestion
//!
//! Reads newline-delimited coordinate files: each non-comment line carries
//! x and y and optionally z, separated by any run of commas, spaces, or
//! tabs. Parsing is line-by-line over a buffered reader so memory stays
//! bounded on multi-million-point files, and malformed lines are counted
//! rather than propagated.

use cloudmesh_core::{Error, Point3f, PointCloud, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Outcome of loading a single coordinate file.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    /// Full path of the source file
    pub path: PathBuf,
    /// File name without directory, for display
    pub display_name: String,
    /// Number of points parsed from the file
    pub point_count: usize,
    /// Number of lines skipped (comments and malformed lines)
    pub skipped_lines: usize,
}

/// Parse one line of coordinate text.
///
/// Returns `None` for lines to skip: empty lines, `#` or `//` comments,
/// and lines without two parseable numeric tokens. A third token supplies
/// z when it parses; otherwise z defaults to 0. Never fails.
pub fn parse_line(line: &str) -> Option<Point3f> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
        return None;
    }

    let mut tokens = line
        .split(|c: char| c == ',' || c == ' ' || c == '\t')
        .filter(|t| !t.is_empty());

    let x: f32 = tokens.next()?.parse().ok()?;
    let y: f32 = tokens.next()?.parse().ok()?;
    let z: f32 = tokens
        .next()
        .and_then(|t| t.parse().ok())
        .unwrap_or(0.0);

    Some(Point3f::new(x, y, z))
}

/// Stream a coordinate file into `cloud`, appending points in file order.
///
/// Fails with [`Error::FileAccess`] when the file cannot be opened or read
/// and with [`Error::InsufficientData`] when it contains no valid point;
/// callers are expected to truncate the cloud back to its prior length on
/// failure so file records stay contiguous.
pub fn load_points<P: AsRef<Path>>(path: P, cloud: &mut PointCloud<Point3f>) -> Result<LoadedFile> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let mut point_count = 0usize;
    let mut skipped_lines = 0usize;

    for line in reader.lines() {
        let line = line.map_err(|source| Error::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;
        match parse_line(&line) {
            Some(point) => {
                cloud.push(point);
                point_count += 1;
            }
            None => {
                if !line.trim().is_empty() {
                    skipped_lines += 1;
                }
            }
        }
    }

    if point_count == 0 {
        return Err(Error::InsufficientData(format!(
            "no valid points in {}",
            path.display()
        )));
    }

    Ok(LoadedFile {
        path: path.to_path_buf(),
        display_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        point_count,
        skipped_lines,
    })
}
