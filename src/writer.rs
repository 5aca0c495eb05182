//! Row-oriented writing into one sheet of an XLSX document.
//!
//! A [`RowSink`] session runs `prepare` -> `write_item`* -> `finish`. Rows are
//! buffered in memory; `finish` serializes the whole book and rewrites the
//! output handle from the start. A non-empty handle is treated as an existing
//! document to append a sheet to.

use std::fs::{File, OpenOptions};
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::{debug, warn};

use crate::error::{Result, SheetError};
use crate::options::{OutputFormat, WriterOptions};
use crate::value::{CellValue, Row};
use crate::xlsxwriter_backend::BufferedBook;

/// A readable, writable, seekable output that can be truncated.
pub trait OutputHandle: Read + Write + Seek {
    fn set_len(&mut self, len: u64) -> io::Result<()>;
}

impl OutputHandle for File {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }
}

impl OutputHandle for Cursor<Vec<u8>> {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len).map_err(io::Error::other)?;
        self.get_mut().resize(len, 0);
        Ok(())
    }
}

impl<T: OutputHandle + ?Sized> OutputHandle for &mut T {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        (**self).set_len(len)
    }
}

/// State of the open write session.
struct Session {
    book: BufferedBook,
    sheet: usize,
    next_row: u32,
}

enum SinkState {
    Created,
    Open(Session),
    Finished,
}

/// Writes rows into a sheet of a spreadsheet document.
pub struct RowSink<W: OutputHandle> {
    output: Option<W>,
    options: WriterOptions,
    state: SinkState,
}

impl RowSink<File> {
    /// Open (or create) `path` for a write session without truncating it.
    pub fn create(path: impl AsRef<Path>, options: WriterOptions) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        Ok(Self::new(file, options))
    }
}

impl<W: OutputHandle> RowSink<W> {
    pub fn new(output: W, options: WriterOptions) -> Self {
        Self {
            output: Some(output),
            options,
            state: SinkState::Created,
        }
    }

    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    pub fn is_prepared(&self) -> bool {
        matches!(self.state, SinkState::Open(_))
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, SinkState::Finished)
    }

    /// Name of the sheet being written, once prepared.
    pub fn sheet_name(&self) -> Option<&str> {
        match &self.state {
            SinkState::Open(session) => session
                .book
                .sheet_names()
                .get(session.sheet)
                .map(String::as_str),
            _ => None,
        }
    }

    /// Sheet row the next `write_item` starts at, once prepared.
    pub fn next_row(&self) -> Option<u32> {
        match &self.state {
            SinkState::Open(session) => Some(session.next_row),
            _ => None,
        }
    }

    /// Load or create the workbook and select the target sheet.
    pub fn prepare(&mut self) -> Result<()> {
        match self.state {
            SinkState::Created => {}
            SinkState::Open(_) => return Err(SheetError::AlreadyPrepared),
            SinkState::Finished => return Err(SheetError::WriteAfterFinish),
        }
        let output = self.output.as_mut().ok_or(SheetError::WriteAfterFinish)?;

        let len = output.seek(SeekFrom::End(0))?;
        let mut book = if len > 0 {
            output.seek(SeekFrom::Start(0))?;
            let mut bytes = Vec::new();
            output.read_to_end(&mut bytes)?;
            BufferedBook::from_existing(bytes)?
        } else {
            BufferedBook::new()
        };

        let title = self.options.sheet_title.as_deref();
        let (sheet, next_row) = match title.and_then(|title| book.sheet_index(title)) {
            Some(sheet) => (sheet, book.row_count(sheet)),
            None => {
                let name = title.map_or_else(|| book.next_free_name(), str::to_string);
                (book.add_sheet(&name)?, 0)
            }
        };
        debug!(
            "prepared sheet {} at row {next_row} ({} sheets, {len} existing bytes)",
            book.sheet_names()[sheet],
            book.sheet_names().len()
        );

        self.state = SinkState::Open(Session {
            book,
            sheet,
            next_row,
        });
        Ok(())
    }

    /// Write one row.
    ///
    /// With `prepend_header`, the first row written to an empty sheet is
    /// preceded by its labels when it is a labeled row.
    pub fn write_item(&mut self, row: impl Into<Row>) -> Result<()> {
        let prepend_header = self.options.prepend_header;
        let session = match &mut self.state {
            SinkState::Open(session) => session,
            SinkState::Created => return Err(SheetError::WriteBeforePrepare),
            SinkState::Finished => return Err(SheetError::WriteAfterFinish),
        };
        let row = row.into();

        let labels: Option<Vec<CellValue>> = if prepend_header && session.next_row == 0 {
            row.keys()
                .map(|keys| keys.into_iter().map(CellValue::from).collect())
        } else {
            None
        };
        let data_row = session.next_row + u32::from(labels.is_some());
        let values = row.into_values();

        // Reject before buffering so a bad row leaves the session intact.
        BufferedBook::check_row(data_row, &values)?;
        if let Some(labels) = &labels {
            BufferedBook::check_row(0, labels)?;
            session.book.write_row(session.sheet, 0, labels)?;
        }
        session.book.write_row(session.sheet, data_row, &values)?;
        session.next_row = data_row + 1;
        Ok(())
    }

    /// Serialize the workbook into the output handle.
    ///
    /// On failure the session stays open, so `finish` can be called again.
    pub fn finish(&mut self) -> Result<()> {
        let session = match &self.state {
            SinkState::Open(session) => session,
            SinkState::Created => return Err(SheetError::WriteBeforePrepare),
            SinkState::Finished => return Err(SheetError::WriteAfterFinish),
        };
        let output = self.output.as_mut().ok_or(SheetError::WriteAfterFinish)?;
        persist(output, self.options.format, session)?;
        self.state = SinkState::Finished;
        Ok(())
    }

    /// Give back the output handle, finishing an open session first.
    pub fn into_inner(mut self) -> Result<W> {
        if self.is_prepared() {
            self.finish()?;
        }
        self.output.take().ok_or(SheetError::WriteAfterFinish)
    }
}

fn persist<W: OutputHandle>(
    output: &mut W,
    format: OutputFormat,
    session: &Session,
) -> Result<()> {
    let bytes = match format {
        OutputFormat::Xlsx => session.book.save()?,
    };
    output.seek(SeekFrom::Start(0))?;
    output.write_all(&bytes)?;
    output.set_len(bytes.len() as u64)?;
    output.flush()?;
    debug!(
        "wrote {} bytes ({} rows in sheet {})",
        bytes.len(),
        session.next_row,
        session.sheet
    );
    Ok(())
}

impl<W: OutputHandle> Drop for RowSink<W> {
    fn drop(&mut self) {
        let SinkState::Open(session) = &self.state else {
            return;
        };
        let Some(output) = self.output.as_mut() else {
            return;
        };
        warn!("row sink dropped before finish(), saving buffered rows");
        if let Err(err) = persist(output, self.options.format, session) {
            warn!("failed to save unfinished row sink: {err}");
        }
    }
}
