//! Spreadsheet export of a [`CollectionResult`].
//!
//! One sheet per record kind present (`news`, `video`, `comment`), each with
//! a bold header row and the kind's fixed column subset. Counts are written
//! as numeric cells. Column widths follow the longest cell, header included,
//! plus 2, capped at 50.

use chrono::{Local, NaiveDateTime};
use rust_xlsxwriter::{Format, Workbook};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::models::{Cell, CollectionResult, Record, RecordKind};

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const MAX_COLUMN_WIDTH: usize = 50;
/// Longest string a spreadsheet cell accepts, in characters.
pub const MAX_CELL_CHARS: usize = 32_767;

/// `collection_YYYYMMDD_HHMMSS.xlsx`
pub fn export_file_name(at: NaiveDateTime) -> String {
    at.format("collection_%Y%m%d_%H%M%S.xlsx").to_string()
}

/// Width per column for `kind`: longest cell (header included) + 2, capped.
pub fn column_widths<'a>(kind: RecordKind, rows: impl IntoIterator<Item = &'a Record>) -> Vec<usize> {
    let mut widths: Vec<usize> = kind.columns().iter().map(|c| c.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.display_len());
        }
    }
    widths
        .into_iter()
        .map(|w| (w + 2).min(MAX_COLUMN_WIDTH))
        .collect()
}

fn fit_cell(text: &str) -> Cow<'_, str> {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        None => Cow::Borrowed(text),
        Some((cut, _)) => Cow::Owned(text[..cut].to_string()),
    }
}

/// Build the workbook in memory.
pub fn build_workbook(result: &CollectionResult) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    for kind in RecordKind::ALL {
        if result.count(kind) == 0 {
            continue;
        }
        let sheet = workbook.add_worksheet();
        sheet.set_name(kind.sheet_name())?;

        for (col, name) in kind.columns().iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *name, &header)?;
        }
        for (i, record) in result.of_kind(kind).enumerate() {
            let row = (i + 1) as u32;
            for (col, cell) in record.cells().into_iter().enumerate() {
                match cell {
                    Cell::Text(text) => sheet.write_string(row, col as u16, fit_cell(text))?,
                    Cell::Number(n) => sheet.write_number(row, col as u16, n as f64)?,
                };
            }
        }
        for (col, width) in column_widths(kind, result.of_kind(kind)).into_iter().enumerate() {
            sheet.set_column_width(col as u16, width as f64)?;
        }
        debug!(sheet = kind.sheet_name(), rows = result.count(kind), "Wrote sheet");
    }
    Ok(workbook)
}

/// Write the workbook to `output_dir` under a timestamped name; returns its path.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn write_workbook(result: &CollectionResult, output_dir: &Path) -> Result<PathBuf> {
    let mut workbook = build_workbook(result)?;
    let bytes = workbook.save_to_buffer()?;

    fs::create_dir_all(output_dir).await?;
    let path = output_dir.join(export_file_name(Local::now().naive_local()));
    fs::write(&path, &bytes).await?;
    info!(path = %path.display(), bytes = bytes.len(), mime = XLSX_MIME, "Wrote spreadsheet");
    Ok(path)
}
