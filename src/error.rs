//! Error types shared by the row source and the row sink.

use thiserror::Error;

/// Result type for sheetport operations
pub type Result<T> = std::result::Result<T, SheetError>;

/// Errors raised while reading rows from, or writing rows to, a spreadsheet
#[derive(Debug, Error)]
pub enum SheetError {
    /// Row index outside the source's valid range `0..bound`
    #[error("row index {index} is out of range (valid indices are below {bound})")]
    InvalidIndex { index: usize, bound: usize },

    /// Sheet selector that does not name an existing sheet
    #[error("sheet index {index} does not exist (document has {available} sheets)")]
    InvalidSheetSelector { index: usize, available: usize },

    /// Header row configured past the last row of the sheet
    #[error("header row {row} is outside the sheet ({rows} rows)")]
    InvalidHeaderRow { row: u32, rows: u32 },

    /// Row past the spreadsheet row limit
    #[error("row {row} exceeds the spreadsheet row limit")]
    RowOutOfRange { row: u32 },

    /// Row wider than the spreadsheet column limit
    #[error("column {column} exceeds the spreadsheet column limit")]
    ColumnOutOfRange { column: usize },

    /// Text cell longer than the spreadsheet allows
    #[error("text in row {row}, column {column} has {length} characters, more than a cell holds")]
    StringTooLong {
        row: u32,
        column: usize,
        length: usize,
    },

    /// `write_item` or `finish` called before `prepare`
    #[error("row sink used before prepare()")]
    WriteBeforePrepare,

    /// Any sink call after `finish`
    #[error("row sink used after finish()")]
    WriteAfterFinish,

    /// `prepare` called twice in one session
    #[error("row sink is already prepared")]
    AlreadyPrepared,

    /// Output format selector the writer cannot produce
    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// The document could not be parsed
    #[error("failed to read spreadsheet: {0}")]
    Parse(#[from] calamine::Error),

    /// An XLSX worksheet could not be streamed
    #[error("failed to read xlsx worksheet: {0}")]
    ParseXlsx(#[from] calamine::XlsxError),

    /// An XLSB worksheet could not be streamed
    #[error("failed to read xlsb worksheet: {0}")]
    ParseXlsb(#[from] calamine::XlsbError),

    /// The workbook could not be serialized
    #[error("failed to write spreadsheet: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    /// IO error on the output handle
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SheetError {
    /// True for failures reported by the wrapped spreadsheet library.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            SheetError::Parse(_)
                | SheetError::ParseXlsx(_)
                | SheetError::ParseXlsb(_)
                | SheetError::Write(_)
                | SheetError::UnsupportedFormat(_)
        )
    }

    /// True for reader/writer misuse by the caller.
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            SheetError::InvalidIndex { .. }
                | SheetError::WriteBeforePrepare
                | SheetError::WriteAfterFinish
                | SheetError::AlreadyPrepared
        )
    }
}
