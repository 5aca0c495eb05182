//! Spreadsheet rows in and out of ETL pipelines.
//!
//! [`RowSource`] reads one sheet of a document as a counted, indexable and
//! iterable collection of rows, optionally keyed by a header row and capped at
//! a maximum row count. [`RowSink`] writes rows into a named sheet of an XLSX
//! document, creating the document or appending a sheet to an existing one.
//!
//! ```no_run
//! use sheetport::{ReaderOptions, RowSink, RowSource, WriterOptions};
//!
//! # fn main() -> sheetport::Result<()> {
//! let mut source = RowSource::open("input.xlsx", ReaderOptions::default().with_header_row(0))?;
//! let mut sink = RowSink::create(
//!     "output.xlsx",
//!     WriterOptions::default().with_sheet_title("copy").with_prepend_header(true),
//! )?;
//! sink.prepare()?;
//! for row in source.rows() {
//!     sink.write_item(row?)?;
//! }
//! sink.finish()?;
//! # Ok(())
//! # }
//! ```

pub mod calamine_backend;
pub mod document;
pub mod error;
pub mod options;
pub mod reader;
pub mod value;
pub mod writer;
pub mod xlsxwriter_backend;

pub use calamine_backend::SpreadsheetDocument;
pub use document::{MemoryDocument, SheetDocument};
pub use error::{Result, SheetError};
pub use options::{HeaderIndexing, OutputFormat, ReaderOptions, WriterOptions};
pub use reader::{RowSource, Rows};
pub use value::{CellValue, Row};
pub use writer::{OutputHandle, RowSink};
