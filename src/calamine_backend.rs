//! [`SheetDocument`] over calamine workbooks.
//!
//! XLSX and XLSB worksheets are streamed cell by cell: finding the extent keeps
//! only a running maximum and stops at the caller's limit, and reading a block
//! of rows keeps only that block. calamine has no cell reader for XLS or ODS,
//! so those sheets are parsed whole into a `Range` once and cached. For them
//! the row cap bounds what a source hands out, not what parsing allocates.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::ops::{ControlFlow, Range as RowRange};
use std::path::Path;

use calamine::{
    open_workbook_auto, open_workbook_auto_from_rs, Data, DataRef, Range, Reader, Sheets,
};
use log::{debug, trace};

use crate::document::{clamp_extent, trim_row, SheetDocument};
use crate::error::{Result, SheetError};
use crate::value::CellValue;

/// An opened spreadsheet document (XLSX, XLSM, XLS, XLSB or ODS).
pub struct SpreadsheetDocument<RS> {
    workbook: Sheets<RS>,
    sheet_names: Vec<String>,
    /// Parsed worksheets for formats that cannot be streamed, by sheet index.
    range_cache: HashMap<usize, Range<Data>>,
}

impl SpreadsheetDocument<BufReader<File>> {
    /// Open a document from disk, detecting its format.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let workbook = open_workbook_auto(path)?;
        let document = Self::from_sheets(workbook);
        debug!(
            "opened {} ({} sheets)",
            path.display(),
            document.sheet_names.len()
        );
        Ok(document)
    }
}

impl<RS: Read + Seek + Clone> SpreadsheetDocument<RS> {
    /// Open a document from an in-memory or otherwise cloneable reader.
    pub fn from_reader(reader: RS) -> Result<Self> {
        Ok(Self::from_sheets(open_workbook_auto_from_rs(reader)?))
    }
}

impl<RS: Read + Seek> SpreadsheetDocument<RS> {
    /// Wrap a workbook the caller already opened with calamine.
    pub fn from_sheets(workbook: Sheets<RS>) -> Self {
        let sheet_names = workbook.sheet_names();
        Self {
            workbook,
            sheet_names,
            range_cache: HashMap::new(),
        }
    }

    pub fn into_sheets(self) -> Sheets<RS> {
        self.workbook
    }

    /// True when worksheets are streamed rather than parsed whole.
    pub fn is_streaming(&self) -> bool {
        matches!(self.workbook, Sheets::Xlsx(_) | Sheets::Xlsb(_))
    }

    fn sheet_name(&self, sheet: usize) -> Result<String> {
        self.sheet_names
            .get(sheet)
            .cloned()
            .ok_or(SheetError::InvalidSheetSelector {
                index: sheet,
                available: self.sheet_names.len(),
            })
    }

    fn cached_range(&mut self, sheet: usize) -> Result<&Range<Data>> {
        let name = self.sheet_name(sheet)?;
        match self.range_cache.entry(sheet) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                debug!("parsing worksheet {name}");
                let range = self.workbook.worksheet_range(&name)?;
                Ok(entry.insert(range))
            }
        }
    }

    /// Feed the cells of a streamable sheet to `visit` in row order.
    ///
    /// Returns `false` without reading anything when the format has no cell
    /// reader.
    fn stream_cells<F>(&mut self, name: &str, mut visit: F) -> Result<bool>
    where
        F: FnMut((u32, u32), &DataRef<'_>) -> ControlFlow<()>,
    {
        match &mut self.workbook {
            Sheets::Xlsx(xlsx) => {
                let mut cells = xlsx.worksheet_cells_reader(name)?;
                while let Some(cell) = cells.next_cell()? {
                    if visit(cell.get_position(), cell.get_value()).is_break() {
                        break;
                    }
                }
            }
            Sheets::Xlsb(xlsb) => {
                let mut cells = xlsb.worksheet_cells_reader(name)?;
                while let Some(cell) = cells.next_cell()? {
                    if visit(cell.get_position(), cell.get_value()).is_break() {
                        break;
                    }
                }
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl<RS: Read + Seek> SheetDocument for SpreadsheetDocument<RS> {
    fn sheet_names(&self) -> Vec<String> {
        self.sheet_names.clone()
    }

    fn row_extent(&mut self, sheet: usize, limit: Option<u32>) -> Result<u32> {
        let name = self.sheet_name(sheet)?;
        let mut extent = 0u32;
        let streamed = self.stream_cells(&name, |(row, _), value| {
            if !matches!(value, DataRef::Empty) {
                extent = extent.max(row.saturating_add(1));
            }
            if limit.is_some_and(|limit| extent >= limit) {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;
        if !streamed {
            let range = self.cached_range(sheet)?;
            extent = range.end().map_or(0, |(row, _)| row.saturating_add(1));
        }
        Ok(clamp_extent(extent, limit))
    }

    fn read_rows(
        &mut self,
        sheet: usize,
        rows: RowRange<u32>,
        max_columns: Option<u16>,
    ) -> Result<Vec<Vec<CellValue>>> {
        let name = self.sheet_name(sheet)?;
        trace!("reading rows {}..{} of {name}", rows.start, rows.end);

        let mut block: Vec<Vec<CellValue>> = vec![Vec::new(); rows.len()];
        let streamed = self.stream_cells(&name, |(row, col), value| {
            // Both formats list rows in ascending order.
            if row >= rows.end {
                return ControlFlow::Break(());
            }
            if row < rows.start || max_columns.is_some_and(|max| col >= u32::from(max)) {
                return ControlFlow::Continue(());
            }
            let slot = &mut block[(row - rows.start) as usize];
            let col = col as usize;
            if slot.len() <= col {
                slot.resize(col + 1, CellValue::Empty);
            }
            slot[col] = CellValue::from(&Data::from(value.clone()));
            ControlFlow::Continue(())
        })?;
        if streamed {
            return Ok(block
                .into_iter()
                .map(|cells| trim_row(cells, max_columns))
                .collect());
        }

        let range = self.cached_range(sheet)?;
        Ok(rows
            .map(|row| range_row(range, row, max_columns))
            .collect())
    }
}

fn range_row(range: &Range<Data>, row: u32, max_columns: Option<u16>) -> Vec<CellValue> {
    let Some((_, last_col)) = range.end() else {
        return Vec::new();
    };
    let width = max_columns.map_or(last_col.saturating_add(1), |max| {
        u32::from(max).min(last_col.saturating_add(1))
    });
    let cells = (0..width)
        .map(|col| range.get_value((row, col)).map(CellValue::from).unwrap_or_default())
        .collect();
    trim_row(cells, max_columns)
}
