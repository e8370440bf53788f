//! Per-file provenance records
//!
//! When several coordinate files are loaded, every point carries the index
//! of its originating file so the presentation layer can color or toggle
//! points per file after reduction. Records describe contiguous,
//! non-overlapping ranges of the concatenated point sequence; resolving a
//! point position to its file is a binary search over the record start
//! offsets rather than a scan of all records.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One loaded source file's slice of the concatenated point sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Full path of the source file
    pub path: PathBuf,
    /// Short name shown by the presentation layer
    pub display_name: String,
    /// Offset of this file's first point in the concatenated sequence
    pub start_offset: usize,
    /// Number of points loaded from this file
    pub point_count: usize,
    /// Ordinal index of this record; the value used as a provenance tag
    pub index: usize,
}

impl FileRecord {
    /// End of this record's range in the concatenated sequence (exclusive)
    pub fn end_offset(&self) -> usize {
        self.start_offset + self.point_count
    }
}

/// Ordered sequence of [`FileRecord`]s over one accumulated point set.
///
/// Invariant: records are contiguous; record `i + 1` starts where record
/// `i` ends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileTable {
    records: Vec<FileRecord>,
}

impl FileTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record for `point_count` points just added to the sequence,
    /// returning its ordinal index.
    pub fn push(&mut self, path: PathBuf, display_name: String, point_count: usize) -> usize {
        let index = self.records.len();
        let start_offset = self.total_points();
        self.records.push(FileRecord {
            path,
            display_name,
            start_offset,
            point_count,
            index,
        });
        index
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total number of points covered by all records
    pub fn total_points(&self) -> usize {
        self.records.last().map(FileRecord::end_offset).unwrap_or(0)
    }

    /// All records, in load order
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    /// Resolve a position in the concatenated point sequence to the index
    /// of the file that contributed it.
    ///
    /// Binary search over start offsets; `None` when the position is past
    /// the end of the covered range.
    pub fn resolve(&self, point_offset: usize) -> Option<u32> {
        if point_offset >= self.total_points() {
            return None;
        }
        let idx = self
            .records
            .partition_point(|r| r.start_offset <= point_offset)
            - 1;
        // Zero-point records never satisfy start <= offset < end, so step
        // back to the record whose range actually contains the offset.
        let record = self.records[..=idx]
            .iter()
            .rev()
            .find(|r| point_offset < r.end_offset())?;
        Some(record.index as u32)
    }

    /// Build the provenance tag sequence for the whole covered range.
    pub fn tags(&self) -> Vec<u32> {
        let mut tags = Vec::with_capacity(self.total_points());
        for record in &self.records {
            tags.extend(std::iter::repeat(record.index as u32).take(record.point_count));
        }
        tags
    }

    /// Remove all records
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
