//! In-memory workbook buffer serialized with rust_xlsxwriter.
//!
//! rust_xlsxwriter only produces new files, so appending to an existing
//! document means loading its cell values first (through calamine), adding
//! rows, and writing the whole book back out.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Reader};
use indexmap::IndexMap;
use log::debug;
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};

use crate::error::{Result, SheetError};
use crate::value::CellValue;

/// Rows per worksheet in the XLSX format.
pub const MAX_ROWS: u32 = 1_048_576;

/// Columns per worksheet in the XLSX format.
pub const MAX_COLUMNS: usize = 16_384;

/// Characters per text cell in the XLSX format.
pub const MAX_STRING_CHARS: usize = 32_767;

type CellKey = (usize, u32, u16); // (sheet, row, col)

// ---------------------------------------------------------------------------
// Helper: write a single cell's value to a Worksheet
// ---------------------------------------------------------------------------

/// Error tokens that have a formula producing them.
fn error_formula(token: &str) -> Option<&'static str> {
    match token {
        "#DIV/0!" => Some("=1/0"),
        "#N/A" => Some("=NA()"),
        "#VALUE!" => Some("=\"text\"+1"),
        _ => None,
    }
}

fn write_cell(ws: &mut Worksheet, row: u32, col: u16, value: &CellValue) -> Result<()> {
    match value {
        CellValue::Empty => {}
        CellValue::Number(n) => {
            ws.write_number(row, col, *n)?;
        }
        CellValue::Text(s) => {
            ws.write_string(row, col, s)?;
        }
        CellValue::Bool(b) => {
            ws.write_boolean(row, col, *b)?;
        }
        CellValue::Error(token) => match error_formula(token) {
            Some(formula) => {
                ws.write_formula(row, col, formula)?;
            }
            None => {
                ws.write_string(row, col, token)?;
            }
        },
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// BufferedBook
// ---------------------------------------------------------------------------

/// Sheets and cell values waiting to be serialized.
#[derive(Debug, Default)]
pub struct BufferedBook {
    sheet_names: Vec<String>,
    /// Rows in use per sheet (last row + 1)
    row_counts: Vec<u32>,
    values: IndexMap<CellKey, CellValue>,
}

impl BufferedBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the cell values of an existing document (any format calamine reads).
    pub fn from_existing(bytes: Vec<u8>) -> Result<Self> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        let mut book = Self::new();
        for name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&name)?;
            let sheet = book.push_sheet(name);
            let (first_row, first_col) = range.start().unwrap_or((0, 0));
            for (row, col, data) in range.used_cells() {
                let row = first_row as usize + row;
                let col = first_col as usize + col;
                book.set_cell(sheet, row as u32, col, CellValue::from(data))?;
            }
            if let Some((last_row, _)) = range.end() {
                book.row_counts[sheet] = book.row_counts[sheet].max(last_row + 1);
            }
        }
        debug!(
            "loaded {} existing sheets ({} cells)",
            book.sheet_names.len(),
            book.values.len()
        );
        Ok(book)
    }

    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    /// Index of the sheet called `name`, compared case-insensitively as
    /// spreadsheet applications do.
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        let name = name.to_lowercase();
        self.sheet_names
            .iter()
            .position(|existing| existing.to_lowercase() == name)
    }

    /// First `SheetN` name not already taken.
    pub fn next_free_name(&self) -> String {
        (1..)
            .map(|n| format!("Sheet{n}"))
            .find(|name| self.sheet_index(name).is_none())
            .unwrap_or_default()
    }

    /// Append a sheet after checking the name against XLSX naming rules.
    pub fn add_sheet(&mut self, name: &str) -> Result<usize> {
        Worksheet::new().set_name(name)?;
        if self.sheet_index(name).is_some() {
            return Err(XlsxError::SheetnameReused(name.to_string()).into());
        }
        Ok(self.push_sheet(name.to_string()))
    }

    pub fn row_count(&self, sheet: usize) -> u32 {
        self.row_counts.get(sheet).copied().unwrap_or(0)
    }

    /// Check that `cells` fit into `row` without exceeding the format's limits.
    pub fn check_row(row: u32, cells: &[CellValue]) -> Result<()> {
        if row >= MAX_ROWS {
            return Err(SheetError::RowOutOfRange { row });
        }
        if cells.len() > MAX_COLUMNS {
            return Err(SheetError::ColumnOutOfRange {
                column: cells.len() - 1,
            });
        }
        for (column, value) in cells.iter().enumerate() {
            if let CellValue::Text(text) | CellValue::Error(text) = value {
                let length = text.chars().count();
                if length > MAX_STRING_CHARS {
                    return Err(SheetError::StringTooLong {
                        row,
                        column,
                        length,
                    });
                }
            }
        }
        Ok(())
    }

    /// Write `cells` into `row` of `sheet`, starting at the first column.
    ///
    /// Nothing is written when the row is rejected.
    pub fn write_row(&mut self, sheet: usize, row: u32, cells: &[CellValue]) -> Result<()> {
        Self::check_row(row, cells)?;
        for (col, value) in cells.iter().enumerate() {
            if !value.is_empty() {
                self.set_cell(sheet, row, col, value.clone())?;
            }
        }
        if let Some(count) = self.row_counts.get_mut(sheet) {
            *count = (*count).max(row.saturating_add(1));
        }
        Ok(())
    }

    /// Cell value at `(row, col)` of `sheet`, if one was written.
    pub fn cell(&self, sheet: usize, row: u32, col: u16) -> Option<&CellValue> {
        self.values.get(&(sheet, row, col))
    }

    /// Serialize every sheet into XLSX bytes.
    pub fn save(&self) -> Result<Vec<u8>> {
        let mut worksheets = Vec::with_capacity(self.sheet_names.len());
        for name in &self.sheet_names {
            let mut ws = Worksheet::new();
            ws.set_name(name)?;
            worksheets.push(ws);
        }

        for (&(sheet, row, col), value) in &self.values {
            if let Some(ws) = worksheets.get_mut(sheet) {
                write_cell(ws, row, col, value)?;
            }
        }

        let mut workbook = Workbook::new();
        for ws in worksheets {
            workbook.push_worksheet(ws);
        }
        Ok(workbook.save_to_buffer()?)
    }

    fn push_sheet(&mut self, name: String) -> usize {
        self.sheet_names.push(name);
        self.row_counts.push(0);
        self.sheet_names.len() - 1
    }

    fn set_cell(&mut self, sheet: usize, row: u32, col: usize, value: CellValue) -> Result<()> {
        let col = u16::try_from(col)
            .ok()
            .filter(|&col| usize::from(col) < MAX_COLUMNS)
            .ok_or(SheetError::ColumnOutOfRange { column: col })?;
        self.values.insert((sheet, row, col), value);
        if let Some(count) = self.row_counts.get_mut(sheet) {
            *count = (*count).max(row.saturating_add(1));
        }
        Ok(())
    }
}
