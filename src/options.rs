//! Reader and writer configuration.
//!
//! Both option structs deserialize with `serde` so a pipeline can keep them in
//! its own configuration files; every field has a default.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::error::SheetError;

/// Rows materialized per read-ahead window by default.
pub const DEFAULT_WINDOW_ROWS: u32 = 256;

/// Ceiling for a read-ahead window grown by sequential access.
pub const DEFAULT_MAX_WINDOW_ROWS: u32 = 65_536;

/// How `RowSource::get_row` interprets its index when a header row is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderIndexing {
    /// Index 0 is the first row that is not the header row.
    #[default]
    SkipHeader,
    /// Index `i` is physical row `i`; fetching the header row's index returns
    /// the header's own values. Iteration still skips the header row.
    Physical,
}

/// Options for [`crate::RowSource`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Physical row (0-based) holding column labels
    pub header_row: Option<u32>,
    /// Sheet index (0-based); the first sheet when `None`
    pub sheet: Option<usize>,
    /// Upper bound on data rows, whatever extent the document reports
    pub max_rows: Option<u32>,
    /// Upper bound on cells materialized per row
    pub max_columns: Option<u16>,
    pub indexing: HeaderIndexing,
    /// Rows materialized per document read
    pub window_rows: u32,
    /// Sequential reads double the window up to this many rows
    pub max_window_rows: u32,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            header_row: None,
            sheet: None,
            max_rows: None,
            max_columns: None,
            indexing: HeaderIndexing::SkipHeader,
            window_rows: DEFAULT_WINDOW_ROWS,
            max_window_rows: DEFAULT_MAX_WINDOW_ROWS,
        }
    }
}

impl ReaderOptions {
    pub fn with_header_row(mut self, row: u32) -> Self {
        self.header_row = Some(row);
        self
    }

    pub fn with_sheet(mut self, index: usize) -> Self {
        self.sheet = Some(index);
        self
    }

    pub fn with_max_rows(mut self, max_rows: u32) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    pub fn with_max_columns(mut self, max_columns: u16) -> Self {
        self.max_columns = Some(max_columns);
        self
    }

    pub fn with_indexing(mut self, indexing: HeaderIndexing) -> Self {
        self.indexing = indexing;
        self
    }

    pub fn with_window_rows(mut self, window_rows: u32) -> Self {
        self.window_rows = window_rows;
        self
    }

    pub fn with_max_window_rows(mut self, max_window_rows: u32) -> Self {
        self.max_window_rows = max_window_rows;
        self
    }
}

/// Serialization format produced by [`crate::RowSink::finish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Office Open XML workbook (`.xlsx`)
    #[default]
    Xlsx,
}

impl OutputFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsx" | "excel2007" => Ok(OutputFormat::Xlsx),
            _ => Err(SheetError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Xlsx => f.write_str("Xlsx"),
        }
    }
}

impl<'de> Deserialize<'de> for OutputFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let selector = String::deserialize(deserializer)?;
        selector.parse().map_err(serde::de::Error::custom)
    }
}

/// Options for [`crate::RowSink`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct WriterOptions {
    /// Name of the sheet to create or select
    pub sheet_title: Option<String>,
    pub format: OutputFormat,
    /// Emit the first row's labels as a header row
    pub prepend_header: bool,
}

impl WriterOptions {
    pub fn with_sheet_title(mut self, title: impl Into<String>) -> Self {
        self.sheet_title = Some(title.into());
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Select the format by name, e.g. `"Xlsx"`.
    pub fn with_format_selector(mut self, selector: &str) -> Result<Self, SheetError> {
        self.format = selector.parse()?;
        Ok(self)
    }

    pub fn with_prepend_header(mut self, prepend: bool) -> Self {
        self.prepend_header = prepend;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_output_format_selectors() {
        assert_eq!("Xlsx".parse::<OutputFormat>().unwrap(), OutputFormat::Xlsx);
        assert_eq!("xlsx".parse::<OutputFormat>().unwrap(), OutputFormat::Xlsx);
        assert_eq!(
            "Excel2007".parse::<OutputFormat>().unwrap(),
            OutputFormat::Xlsx
        );
        assert!(matches!(
            "Xls".parse::<OutputFormat>(),
            Err(SheetError::UnsupportedFormat(s)) if s == "Xls"
        ));
    }

    #[test]
    fn test_reader_options_builder() {
        let options = ReaderOptions::default()
            .with_header_row(0)
            .with_sheet(1)
            .with_max_rows(1000)
            .with_max_window_rows(512);
        assert_eq!(options.header_row, Some(0));
        assert_eq!(options.sheet, Some(1));
        assert_eq!(options.max_rows, Some(1000));
        assert_eq!(options.window_rows, DEFAULT_WINDOW_ROWS);
        assert_eq!(options.max_window_rows, 512);
        assert_eq!(options.indexing, HeaderIndexing::SkipHeader);
    }

    #[test]
    fn test_reader_options_from_config() {
        let options: ReaderOptions =
            serde_json::from_str(r#"{"header_row": 0, "max_rows": 5, "indexing": "physical"}"#)
                .unwrap();
        assert_eq!(
            options,
            ReaderOptions::default()
                .with_header_row(0)
                .with_max_rows(5)
                .with_indexing(HeaderIndexing::Physical)
        );
    }

    #[test]
    fn test_writer_options_from_config() {
        let options: WriterOptions =
            serde_json::from_str(r#"{"sheet_title": "Sheet 2", "format": "Excel2007"}"#).unwrap();
        assert_eq!(options.sheet_title.as_deref(), Some("Sheet 2"));
        assert_eq!(options.format, OutputFormat::Xlsx);
        assert!(!options.prepend_header);

        let err = serde_json::from_str::<WriterOptions>(r#"{"format": "Ods"}"#).unwrap_err();
        assert!(err.to_string().contains("unsupported output format"));
    }

    #[test]
    fn test_writer_options_format_selector() {
        let options = WriterOptions::default()
            .with_format_selector("XLSX")
            .unwrap()
            .with_prepend_header(true);
        assert!(options.prepend_header);
        assert!(WriterOptions::default().with_format_selector("Csv").is_err());
    }
}
