//! Tabular file decoding
//!
//! Reads a CSV file or a spreadsheet on a blocking thread and streams its data
//! rows (header skipped) through a bounded channel, so the pipeline consumes
//! them lazily and a slow store applies backpressure to the reader.

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

/// Rows buffered between the decoder thread and the pipeline.
const ROW_BUFFER: usize = 64;

// == File Format ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Workbook,
}

impl FileFormat {
    /// Picks a format from the file extension, case-insensitively.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Self::Workbook),
            _ => None,
        }
    }
}

// == Decoded Rows ==
/// One data row; `row` counts from 1 at the first row after the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub row: usize,
    pub cells: Vec<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The file or sheet could not be opened; nothing was read.
    #[error("cannot open {path}: {reason}")]
    Open { path: String, reason: String },

    /// A single row could not be decoded; later rows are still delivered.
    #[error("row {row}: {reason}")]
    Row { row: usize, reason: String },
}

pub type DecodedRow = Result<RawRow, DecodeError>;

/// Receiving half handed to the ingestion pipeline.
pub type RowReceiver = mpsc::Receiver<DecodedRow>;

// == Spawn ==
/// Starts decoding `path` on the blocking pool and returns the row stream.
///
/// `sheet` selects a worksheet for workbooks (first sheet when `None`) and is
/// ignored for CSV. The decoder stops early if the receiver is dropped.
pub fn spawn_decoder(path: PathBuf, format: FileFormat, sheet: Option<String>) -> RowReceiver {
    let (tx, rx) = mpsc::channel(ROW_BUFFER);

    tokio::task::spawn_blocking(move || {
        let sent = match format {
            FileFormat::Csv => decode_csv(&path, &tx),
            FileFormat::Workbook => decode_workbook(&path, sheet.as_deref(), &tx),
        };
        debug!(path = %path.display(), rows = sent, "decoder finished");
    });

    rx
}

fn open_error(path: &Path, reason: impl ToString) -> DecodeError {
    DecodeError::Open {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Returns the number of items delivered.
fn decode_csv(path: &Path, tx: &mpsc::Sender<DecodedRow>) -> usize {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path);

    let mut reader = match reader {
        Ok(reader) => reader,
        Err(e) => {
            let _ = tx.blocking_send(Err(open_error(path, e)));
            return 1;
        }
    };

    let mut sent = 0;
    for (index, result) in reader.records().enumerate() {
        let row = index + 1;
        let item = result
            .map(|record| RawRow {
                row,
                cells: record.iter().map(str::to_string).collect(),
            })
            .map_err(|e| DecodeError::Row {
                row,
                reason: e.to_string(),
            });

        if tx.blocking_send(item).is_err() {
            break;
        }
        sent += 1;
    }
    sent
}

fn decode_workbook(path: &Path, sheet: Option<&str>, tx: &mpsc::Sender<DecodedRow>) -> usize {
    let range = open_workbook_auto(path)
        .map_err(|e| open_error(path, e))
        .and_then(|mut workbook| {
            let name = match sheet {
                Some(name) => name.to_string(),
                None => workbook
                    .sheet_names()
                    .first()
                    .cloned()
                    .ok_or_else(|| open_error(path, "workbook has no sheets"))?,
            };
            workbook
                .worksheet_range(&name)
                .map_err(|e| open_error(path, format!("sheet {name}: {e}")))
        });

    let range = match range {
        Ok(range) => range,
        Err(e) => {
            let _ = tx.blocking_send(Err(e));
            return 1;
        }
    };

    let mut rows = range.rows();
    let width = rows.next().map_or(0, filled_len);

    let mut sent = 0;
    for (index, cells) in rows.enumerate() {
        let item = Ok(RawRow {
            row: index + 1,
            cells: row_cells(cells, width),
        });
        if tx.blocking_send(item).is_err() {
            break;
        }
        sent += 1;
    }
    sent
}

/// One past the last non-blank cell.
fn filled_len(cells: &[Data]) -> usize {
    cells
        .iter()
        .rposition(|cell| !matches!(cell, Data::Empty))
        .map_or(0, |last| last + 1)
}

/// Renders a data row as strings, keeping blank cells up to the header
/// `width` so an empty last column reads like `a,b,` in a CSV file. A row
/// with no values at all yields no cells.
fn row_cells(cells: &[Data], width: usize) -> Vec<String> {
    let filled = filled_len(cells);
    if filled == 0 {
        return Vec::new();
    }
    let len = filled.max(width).min(cells.len());
    cells[..len].iter().map(ToString::to_string).collect()
}
