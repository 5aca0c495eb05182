//! Row-oriented reading of one sheet.
//!
//! [`RowSource`] maps data-row indices onto physical sheet rows, skipping a
//! configured header row, and hands rows out either by random access or by
//! iteration. Both paths share one translation and one read-ahead window.

use std::fs::File;
use std::io::BufReader;
use std::iter::FusedIterator;
use std::path::Path;

use log::{debug, trace, warn};

use crate::calamine_backend::SpreadsheetDocument;
use crate::document::SheetDocument;
use crate::error::{Result, SheetError};
use crate::options::{HeaderIndexing, ReaderOptions};
use crate::value::{CellValue, Row};

// ---------------------------------------------------------------------------
// Read-ahead window
// ---------------------------------------------------------------------------

/// A block of consecutive physical rows materialized by one document read.
struct Window {
    start: u32,
    end: u32,
    rows: Vec<Vec<CellValue>>,
}

impl Window {
    fn get(&self, physical: u32) -> Option<&Vec<CellValue>> {
        physical
            .checked_sub(self.start)
            .and_then(|offset| self.rows.get(offset as usize))
    }
}

// ---------------------------------------------------------------------------
// RowSource
// ---------------------------------------------------------------------------

/// Reads the rows of a single sheet, with optional header labels and row cap.
pub struct RowSource<D> {
    document: D,
    options: ReaderOptions,
    sheet: usize,
    sheet_name: String,
    /// Physical rows this source may read (extent after the scan limit)
    extent: u32,
    count: usize,
    labels: Option<Vec<String>>,
    window: Option<Window>,
    /// Rows requested by the next window load
    window_len: u32,
    position: Option<usize>,
}

impl RowSource<SpreadsheetDocument<BufReader<File>>> {
    /// Open a document from disk and read one of its sheets.
    pub fn open(path: impl AsRef<Path>, options: ReaderOptions) -> Result<Self> {
        Self::new(SpreadsheetDocument::open(path)?, options)
    }
}

impl<D: SheetDocument> RowSource<D> {
    pub fn new(mut document: D, options: ReaderOptions) -> Result<Self> {
        let sheet = options.sheet.unwrap_or(0);
        let names = document.sheet_names();
        let sheet_name = names
            .get(sheet)
            .cloned()
            .ok_or(SheetError::InvalidSheetSelector {
                index: sheet,
                available: names.len(),
            })?;

        let header_offset = u32::from(options.header_row.is_some());
        let limit = options.max_rows.map(|max| {
            let limit = max.saturating_add(header_offset);
            options
                .header_row
                .map_or(limit, |header| limit.max(header.saturating_add(1)))
        });

        let extent = document.row_extent(sheet, limit)?;
        if limit.is_some_and(|limit| extent >= limit) {
            debug!("sheet {sheet_name}: extent clamped to {extent} rows by max_rows");
        }
        if let Some(header) = options.header_row {
            if header >= extent {
                return Err(SheetError::InvalidHeaderRow {
                    row: header,
                    rows: extent,
                });
            }
        }

        let data_rows = extent.saturating_sub(header_offset);
        let data_rows = options.max_rows.map_or(data_rows, |max| data_rows.min(max));
        let count = data_rows as usize;
        debug!("reading sheet {sheet_name} (index {sheet}): {count} data rows");

        let window_len = options.window_rows.max(1);
        Ok(Self {
            document,
            options,
            sheet,
            sheet_name,
            extent,
            count,
            labels: None,
            window: None,
            window_len,
            position: None,
        })
    }

    /// Number of data rows (header excluded, row cap applied).
    pub fn count(&self) -> usize {
        self.count
    }

    /// Index passed to the most recent successful `get_row`.
    pub fn key(&self) -> Option<usize> {
        self.position
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn sheet_index(&self) -> usize {
        self.sheet
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    pub fn into_document(self) -> D {
        self.document
    }

    /// Column labels used to key rows.
    ///
    /// Derived from the header row on first use; empty when no header row is
    /// configured (or the header row is blank) and none were set, in which
    /// case rows are positional.
    pub fn column_headers(&mut self) -> Result<&[String]> {
        if self.labels.is_none() {
            let labels: Vec<String> = self
                .header_row()?
                .unwrap_or_default()
                .iter()
                .map(CellValue::to_label)
                .collect();
            debug!("sheet {}: {} column labels", self.sheet_name, labels.len());
            if labels.is_empty() && self.options.header_row.is_some() {
                warn!(
                    "sheet {}: header row is blank, rows will be positional",
                    self.sheet_name
                );
            }
            self.labels = Some(labels);
        }
        Ok(self.labels.as_deref().unwrap_or_default())
    }

    /// Replace the column labels. Rows fetched afterwards are keyed by `labels`.
    pub fn set_column_headers<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = Some(labels.into_iter().map(Into::into).collect());
    }

    /// Raw cells of the configured header row.
    pub fn header_row(&mut self) -> Result<Option<Vec<CellValue>>> {
        let Some(header) = self.options.header_row else {
            return Ok(None);
        };
        let mut rows = self.document.read_rows(
            self.sheet,
            header..header.saturating_add(1),
            self.options.max_columns,
        )?;
        Ok(Some(rows.pop().unwrap_or_default()))
    }

    /// Fetch the row at data index `index`.
    pub fn get_row(&mut self, index: usize) -> Result<Row> {
        let physical = self.physical_row(index)?;
        self.column_headers()?;
        let cells = self.fetch(physical)?;
        let labels = self.labels.as_deref().unwrap_or_default();
        let row = Row::from_cells(labels, cells);
        self.position = Some(index);
        Ok(row)
    }

    /// Iterate over all data rows, starting from the first.
    pub fn rows(&mut self) -> Rows<'_, D> {
        Rows {
            source: self,
            next: 0,
            failed: false,
        }
    }

    fn physical_row(&self, index: usize) -> Result<u32> {
        let header = self.options.header_row.map(|h| h as usize);
        let (bound, physical) = match (self.options.indexing, header) {
            (HeaderIndexing::Physical, Some(_)) => (self.count + 1, index),
            (HeaderIndexing::SkipHeader, Some(h)) if index >= h => (self.count, index + 1),
            _ => (self.count, index),
        };
        if index >= bound {
            return Err(SheetError::InvalidIndex { index, bound });
        }
        // physical < extent <= u32::MAX
        Ok(physical as u32)
    }

    /// The `get_row` index of the `n`th data row.
    fn data_index(&self, n: usize) -> usize {
        match (self.options.indexing, self.options.header_row) {
            (HeaderIndexing::Physical, Some(h)) if n >= h as usize => n + 1,
            _ => n,
        }
    }

    fn fetch(&mut self, physical: u32) -> Result<Vec<CellValue>> {
        if let Some(cells) = self.window.as_ref().and_then(|w| w.get(physical)) {
            return Ok(cells.clone());
        }
        let base = self.options.window_rows.max(1);
        let sequential = self.window.as_ref().is_some_and(|w| w.end == physical);
        self.window_len = if sequential {
            let ceiling = self.options.max_window_rows.max(base);
            self.window_len.saturating_mul(2).min(ceiling)
        } else {
            base
        };
        let end = physical.saturating_add(self.window_len).min(self.extent);
        trace!("sheet {}: loading rows {physical}..{end}", self.sheet_name);
        let rows = self
            .document
            .read_rows(self.sheet, physical..end, self.options.max_columns)?;
        let window = Window {
            start: physical,
            end,
            rows,
        };
        let cells = window.get(physical).cloned().unwrap_or_default();
        self.window = Some(window);
        Ok(cells)
    }
}

// ---------------------------------------------------------------------------
// Iteration
// ---------------------------------------------------------------------------

/// Iterator over the data rows of a [`RowSource`]; stops after the first error.
pub struct Rows<'a, D> {
    source: &'a mut RowSource<D>,
    next: usize,
    failed: bool,
}

impl<D: SheetDocument> Iterator for Rows<'_, D> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next >= self.source.count {
            return None;
        }
        let index = self.source.data_index(self.next);
        self.next += 1;
        let row = self.source.get_row(index);
        self.failed = row.is_err();
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let remaining = self.source.count.saturating_sub(self.next);
        (0, Some(remaining))
    }
}

impl<D: SheetDocument> FusedIterator for Rows<'_, D> {}

impl<'a, D: SheetDocument> IntoIterator for &'a mut RowSource<D> {
    type Item = Result<Row>;
    type IntoIter = Rows<'a, D>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows()
    }
}
