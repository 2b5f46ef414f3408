//! Delimited numeric table loading.
//!
//! Simulation output is a tab-delimited text table with a fixed number of
//! free-form header lines (1 for the estimator files, 15 for the Wilson
//! loop file). Header lines are skipped verbatim; every remaining line must
//! be fully numeric. Short rows and non-numeric cells are fatal; silently
//! coercing them would hide simulation bugs downstream.

use std::path::Path;

use crate::domain::RowLimit;
use crate::error::PostError;

/// An immutable table of `f64` rows with positionally addressed columns.
#[derive(Debug, Clone, Default)]
pub struct SampleTable {
    rows: Vec<Vec<f64>>,
    width: usize,
}

impl SampleTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Extract one column by position.
    ///
    /// # Panics
    /// Panics if `idx >= width`. Column layouts are fixed per experiment
    /// and validated at load time, so an out-of-range index is a
    /// programming error.
    pub fn column(&self, idx: usize) -> Vec<f64> {
        assert!(idx < self.width, "column {idx} out of range (width {})", self.width);
        self.rows.iter().map(|r| r[idx]).collect()
    }

    /// A new table keeping only the leading rows selected by `limit`.
    pub fn truncated(&self, limit: RowLimit) -> SampleTable {
        let kept = limit.resolve(self.rows.len());
        SampleTable {
            rows: self.rows[..kept].to_vec(),
            width: self.width,
        }
    }
}

/// Load a delimited numeric table, skipping `skip_header` leading lines.
///
/// `min_width` is the number of columns the caller will address; a file
/// with fewer columns fails immediately instead of panicking later.
pub fn load_table(
    path: &Path,
    delimiter: u8,
    skip_header: usize,
    min_width: usize,
) -> Result<SampleTable, PostError> {
    let contents = std::fs::read_to_string(path).map_err(|e| PostError::DataFormat {
        path: path.to_path_buf(),
        line: 0,
        message: format!("cannot open data file: {e}"),
    })?;

    // Header lines are free-form (titles, lattice geometry, column names),
    // so they are dropped before the reader ever sees them. Blank lines are
    // dropped here too, keeping `line_numbers` (1-based positions in the
    // original file) aligned with the reader's record index.
    let mut line_numbers = Vec::new();
    let mut body = String::new();
    for (idx, raw) in contents.lines().enumerate().skip(skip_header) {
        if raw.trim().is_empty() {
            continue;
        }
        line_numbers.push(idx + 1);
        body.push_str(raw);
        body.push('\n');
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(true)
        // One record per line: a stray quote must not swallow the next row.
        .quoting(false)
        .from_reader(body.as_bytes());

    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut width = 0usize;

    for (idx, record) in reader.records().enumerate() {
        let line = line_numbers.get(idx).copied().unwrap_or(0);

        let record = record.map_err(|e| PostError::DataFormat {
            path: path.to_path_buf(),
            line,
            message: format!("parse error: {e}"),
        })?;

        // Trailing delimiter padding produces empty cells; drop them rather
        // than failing the numeric parse.
        let cells: Vec<&str> = record.iter().filter(|s| !s.is_empty()).collect();
        if cells.is_empty() {
            continue;
        }

        let mut row = Vec::with_capacity(cells.len());
        for cell in &cells {
            let v = cell.parse::<f64>().map_err(|_| PostError::DataFormat {
                path: path.to_path_buf(),
                line,
                message: format!("non-numeric cell '{cell}'"),
            })?;
            row.push(v);
        }

        if width == 0 {
            width = row.len();
        } else if row.len() != width {
            return Err(PostError::DataFormat {
                path: path.to_path_buf(),
                line,
                message: format!("expected {width} columns, found {}", row.len()),
            });
        }

        rows.push(row);
    }

    if rows.is_empty() {
        return Err(PostError::DataFormat {
            path: path.to_path_buf(),
            line: 0,
            message: "no data rows".to_string(),
        });
    }

    if width < min_width {
        return Err(PostError::DataFormat {
            path: path.to_path_buf(),
            line: line_numbers.first().copied().unwrap_or(0),
            message: format!("need at least {min_width} columns, found {width}"),
        });
    }

    Ok(SampleTable { rows, width })
}
