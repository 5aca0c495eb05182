//! The seam between row addressing and the spreadsheet library.
//!
//! A [`SheetDocument`] answers two questions about a sheet: how many physical
//! rows it reports, and what the cells of a block of physical rows are. The
//! calamine-backed implementation lives in [`crate::calamine_backend`];
//! [`MemoryDocument`] keeps rows in memory.

use std::ops::Range;

use crate::error::{Result, SheetError};
use crate::value::CellValue;

/// A spreadsheet document a [`crate::RowSource`] can read from.
pub trait SheetDocument {
    /// All sheet names, in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Number of physical rows the sheet reports (last row + 1).
    ///
    /// When `limit` is set, implementations must stop looking once the extent
    /// is known to reach it and return at most `limit`.
    fn row_extent(&mut self, sheet: usize, limit: Option<u32>) -> Result<u32>;

    /// Cells of physical rows `rows`, one entry per requested row.
    ///
    /// Rows with no cells come back empty; each row is trimmed after its last
    /// non-empty cell and holds at most `max_columns` cells.
    fn read_rows(
        &mut self,
        sheet: usize,
        rows: Range<u32>,
        max_columns: Option<u16>,
    ) -> Result<Vec<Vec<CellValue>>>;

    /// Number of sheets
    fn sheet_count(&self) -> usize {
        self.sheet_names().len()
    }
}

impl<T: SheetDocument + ?Sized> SheetDocument for &mut T {
    fn sheet_names(&self) -> Vec<String> {
        (**self).sheet_names()
    }

    fn row_extent(&mut self, sheet: usize, limit: Option<u32>) -> Result<u32> {
        (**self).row_extent(sheet, limit)
    }

    fn read_rows(
        &mut self,
        sheet: usize,
        rows: Range<u32>,
        max_columns: Option<u16>,
    ) -> Result<Vec<Vec<CellValue>>> {
        (**self).read_rows(sheet, rows, max_columns)
    }
}

/// Drop trailing empty cells and apply the column cap.
pub(crate) fn trim_row(mut cells: Vec<CellValue>, max_columns: Option<u16>) -> Vec<CellValue> {
    if let Some(max) = max_columns {
        cells.truncate(usize::from(max));
    }
    while cells.last().is_some_and(CellValue::is_empty) {
        cells.pop();
    }
    cells
}

pub(crate) fn clamp_extent(extent: u32, limit: Option<u32>) -> u32 {
    limit.map_or(extent, |limit| extent.min(limit))
}

#[derive(Debug, Clone, PartialEq)]
struct MemorySheet {
    name: String,
    rows: Vec<Vec<CellValue>>,
    declared_rows: Option<u32>,
}

/// An in-memory document.
///
/// A sheet may declare more rows than it holds, the way damaged files report
/// a last row far beyond their content; rows past the stored data read as empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryDocument {
    sheets: Vec<MemorySheet>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet.
    pub fn with_sheet<R, V>(mut self, name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        self.sheets.push(MemorySheet {
            name: name.into(),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
            declared_rows: None,
        });
        self
    }

    /// Make the most recently added sheet report `rows` physical rows.
    pub fn declaring_rows(mut self, rows: u32) -> Self {
        if let Some(sheet) = self.sheets.last_mut() {
            sheet.declared_rows = Some(rows);
        }
        self
    }

    fn sheet(&self, index: usize) -> Result<&MemorySheet> {
        self.sheets
            .get(index)
            .ok_or(SheetError::InvalidSheetSelector {
                index,
                available: self.sheets.len(),
            })
    }
}

impl SheetDocument for MemoryDocument {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    fn row_extent(&mut self, sheet: usize, limit: Option<u32>) -> Result<u32> {
        let sheet = self.sheet(sheet)?;
        let stored = u32::try_from(sheet.rows.len()).unwrap_or(u32::MAX);
        Ok(clamp_extent(sheet.declared_rows.unwrap_or(stored), limit))
    }

    fn read_rows(
        &mut self,
        sheet: usize,
        rows: Range<u32>,
        max_columns: Option<u16>,
    ) -> Result<Vec<Vec<CellValue>>> {
        let sheet = self.sheet(sheet)?;
        Ok(rows
            .map(|row| {
                let cells = sheet.rows.get(row as usize).cloned().unwrap_or_default();
                trim_row(cells, max_columns)
            })
            .collect())
    }
}
