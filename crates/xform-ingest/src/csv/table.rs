//! In-memory CSV table with a normalized header index.

use crate::error::{IngestError, Result};
use crate::normalize::{HeaderIndex, normalize_header};

/// A fully loaded CSV: header row plus string cells.
///
/// Every row holds exactly one cell per header; short rows are padded with
/// empty strings when the table is built.
#[derive(Debug, Clone)]
pub struct CsvTable {
    source_name: String,
    headers: Vec<String>,
    index: HeaderIndex,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn new(
        source_name: impl Into<String>,
        headers: Vec<String>,
        mut rows: Vec<Vec<String>>,
    ) -> Self {
        let width = headers.len();
        for row in &mut rows {
            row.resize(width, String::new());
        }
        let index = HeaderIndex::new(&headers);
        Self {
            source_name: source_name.into(),
            headers,
            index,
            rows,
        }
    }

    /// Label used in messages, usually the file name.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `column`, by exact header first and normalized header second.
    pub fn column_position(&self, column: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|header| header == column)
            .or_else(|| self.index.position(&normalize_header(column)))
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_position(column).is_some()
    }

    /// Fail with [`IngestError::MissingColumn`] naming the first absent column.
    pub fn require_columns(&self, columns: &[&str]) -> Result<()> {
        match columns.iter().find(|column| !self.has_column(column)) {
            Some(column) => Err(IngestError::MissingColumn {
                column: (*column).to_string(),
                source_name: self.source_name.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn row(&self, index: usize) -> Option<TableRow<'_>> {
        (index < self.rows.len()).then_some(TableRow { table: self, index })
    }

    pub fn rows(&self) -> impl Iterator<Item = TableRow<'_>> {
        (0..self.rows.len()).map(move |index| TableRow { table: self, index })
    }
}

/// Borrowed view of one data row.
#[derive(Debug, Clone, Copy)]
pub struct TableRow<'a> {
    table: &'a CsvTable,
    index: usize,
}

impl<'a> TableRow<'a> {
    /// Zero-based data row number (header excluded).
    pub fn index(&self) -> usize {
        self.index
    }

    fn cells(&self) -> &'a [String] {
        &self.table.rows[self.index]
    }

    /// Value at column `position`.
    pub fn cell(&self, position: usize) -> Option<&'a str> {
        self.cells().get(position).map(String::as_str)
    }

    /// Value of `column`, resolved like [`CsvTable::column_position`].
    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.cell(self.table.column_position(column)?)
    }

    /// Value of `column`, or `""` when the column is absent.
    pub fn field(&self, column: &str) -> &'a str {
        self.get(column).unwrap_or("")
    }

    /// Value of the column whose normalized header is `normalized`.
    pub fn get_normalized(&self, normalized: &str) -> Option<&'a str> {
        self.cell(self.table.index.position(normalized)?)
    }

    /// `(header, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.table
            .headers
            .iter()
            .map(String::as_str)
            .zip(self.cells().iter().map(String::as_str))
    }
}
