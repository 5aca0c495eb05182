//! Cell values and the row shapes that cross the reader/writer boundary.

use std::fmt;

use calamine::Data;
use indexmap::IndexMap;

/// A single cell value.
///
/// Numeric cells (including integers and date serials) surface as `Number`;
/// text cells as `Text`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    /// Spreadsheet error token such as `#DIV/0!`
    Error(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Text used when this cell serves as a column label.
    pub fn to_label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            // Integral numbers print without a fractional part
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{n:.0}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Error(e) => f.write_str(e),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => CellValue::Empty,
            Data::Int(v) => CellValue::Number(*v as f64),
            Data::Float(v) => CellValue::Number(*v),
            Data::String(v) => CellValue::Text(v.clone()),
            Data::Bool(v) => CellValue::Bool(*v),
            Data::DateTime(v) => CellValue::Number(v.as_f64()),
            Data::DateTimeIso(v) => CellValue::Text(v.clone()),
            Data::DurationIso(v) => CellValue::Text(v.clone()),
            Data::Error(e) => CellValue::Error(e.to_string()),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Number(f64::from(value))
    }
}

impl From<u32> for CellValue {
    fn from(value: u32) -> Self {
        CellValue::Number(f64::from(value))
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Empty, Into::into)
    }
}

/// One row in transit between a document and a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    /// Label -> value pairs in column order
    Labeled(IndexMap<String, CellValue>),
    /// Values in column order, no labels
    Positional(Vec<CellValue>),
}

impl Row {
    /// Build a labeled row from `(label, value)` pairs.
    ///
    /// A repeated label keeps its first position and takes the later value.
    pub fn labeled<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<CellValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Row::Labeled(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a positional row from values.
    pub fn positional<V, I>(values: I) -> Self
    where
        V: Into<CellValue>,
        I: IntoIterator<Item = V>,
    {
        Row::Positional(values.into_iter().map(Into::into).collect())
    }

    /// Zip `cells` against `labels`; missing cells become `Empty`, surplus cells are dropped.
    pub(crate) fn from_cells(labels: &[String], cells: Vec<CellValue>) -> Self {
        if labels.is_empty() {
            return Row::Positional(cells);
        }
        let mut cells = cells.into_iter();
        Row::Labeled(
            labels
                .iter()
                .map(|label| (label.clone(), cells.next().unwrap_or_default()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        match self {
            Row::Labeled(map) => map.len(),
            Row::Positional(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_labeled(&self) -> bool {
        matches!(self, Row::Labeled(_))
    }

    /// Look up a value by label (labeled rows only).
    pub fn get(&self, label: &str) -> Option<&CellValue> {
        match self {
            Row::Labeled(map) => map.get(label),
            Row::Positional(_) => None,
        }
    }

    /// Look up a value by column position (either shape).
    pub fn get_index(&self, index: usize) -> Option<&CellValue> {
        match self {
            Row::Labeled(map) => map.get_index(index).map(|(_, v)| v),
            Row::Positional(values) => values.get(index),
        }
    }

    /// Labels of a labeled row.
    pub fn keys(&self) -> Option<Vec<&str>> {
        match self {
            Row::Labeled(map) => Some(map.keys().map(String::as_str).collect()),
            Row::Positional(_) => None,
        }
    }

    /// Values in column order, labels discarded.
    pub fn into_values(self) -> Vec<CellValue> {
        match self {
            Row::Labeled(map) => map.into_values().collect(),
            Row::Positional(values) => values,
        }
    }
}

impl From<Vec<CellValue>> for Row {
    fn from(values: Vec<CellValue>) -> Self {
        Row::Positional(values)
    }
}

impl From<IndexMap<String, CellValue>> for Row {
    fn from(map: IndexMap<String, CellValue>) -> Self {
        Row::Labeled(map)
    }
}
