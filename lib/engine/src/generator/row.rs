use indexmap::IndexMap;
use std::fmt;

/// Strings that denote a missing value (compared case-insensitively after trimming).
const NULL_LIKE: [&str; 5] = ["null", "na", "n/a", "-", "."];

/// A single cell of a row.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl CellValue {
    /// Holds for blank text and the usual spellings of a missing value.
    pub fn is_null_like(&self) -> bool {
        match self {
            CellValue::Text(text) => {
                let text = text.trim();
                text.is_empty() || NULL_LIKE.iter().any(|null| text.eq_ignore_ascii_case(null))
            }
            CellValue::Integer(_) | CellValue::Float(_) | CellValue::Boolean(_) => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(text) => f.write_str(text.trim()),
            CellValue::Integer(value) => value.fmt(f),
            CellValue::Float(value) => value.fmt(f),
            CellValue::Boolean(value) => value.fmt(f),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

/// A row of a table: column names mapped to possibly missing values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    cells: IndexMap<String, Option<CellValue>>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of `column`.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.insert(column, Some(value.into()));
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Option<CellValue>) {
        self.cells.insert(column.into(), value);
    }

    /// Returns the value of `column` unless it is absent or null-like.
    pub fn value(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .get(column)
            .and_then(Option::as_ref)
            .filter(|value| !value.is_null_like())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<CellValue>)> for Row {
    fn from_iter<T: IntoIterator<Item = (K, Option<CellValue>)>>(iter: T) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(column, value)| (column.into(), value))
                .collect(),
        }
    }
}
