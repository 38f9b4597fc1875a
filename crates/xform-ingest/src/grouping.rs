//! Grouping of CSV rows by linkage columns.

use std::collections::HashMap;

use crate::csv::{CsvTable, TableRow};
use crate::error::{IngestError, Result};

/// Values of the linkage columns for one row, in key-column order.
pub type GroupKey = Vec<String>;

/// Rows of one table grouped by a tuple of linkage-column values.
///
/// Groups are kept in first-seen order and rows keep their file order within
/// a group. Every row of the table lands in exactly one group.
#[derive(Debug, Clone)]
pub struct RowGroups<'a> {
    table: Option<&'a CsvTable>,
    key_columns: Vec<String>,
    order: Vec<GroupKey>,
    groups: HashMap<GroupKey, Vec<usize>>,
}

impl<'a> RowGroups<'a> {
    /// Groups for a table that was not supplied: always empty, never an error.
    pub fn absent(key_columns: &[&str]) -> Self {
        Self {
            table: None,
            key_columns: key_columns.iter().map(|c| (*c).to_string()).collect(),
            order: Vec::new(),
            groups: HashMap::new(),
        }
    }

    /// Group every row of `table` by the values in `key_columns`.
    ///
    /// Key columns resolve by exact header, then by normalized header.
    pub fn build(table: &'a CsvTable, key_columns: &[&str]) -> Result<Self> {
        let mut positions = Vec::with_capacity(key_columns.len());
        for column in key_columns {
            let position =
                table
                    .column_position(column)
                    .ok_or_else(|| IngestError::MissingColumn {
                        column: (*column).to_string(),
                        source_name: table.source_name().to_string(),
                    })?;
            positions.push(position);
        }

        let mut order = Vec::new();
        let mut groups: HashMap<GroupKey, Vec<usize>> = HashMap::new();
        for row in table.rows() {
            let key: GroupKey = positions
                .iter()
                .map(|&position| row.cell(position).unwrap_or_default().to_string())
                .collect();
            let members = groups.entry(key).or_insert_with_key(|key| {
                order.push(key.clone());
                Vec::new()
            });
            members.push(row.index());
        }

        tracing::debug!(
            source = %table.source_name(),
            keys = ?key_columns,
            groups = order.len(),
            rows = table.len(),
            "grouped rows"
        );

        Ok(Self {
            table: Some(table),
            key_columns: key_columns.iter().map(|c| (*c).to_string()).collect(),
            order,
            groups,
        })
    }

    /// Group `table` when it was supplied, otherwise return empty groups.
    pub fn build_optional(table: Option<&'a CsvTable>, key_columns: &[&str]) -> Result<Self> {
        match table {
            Some(table) => Self::build(table, key_columns),
            None => Ok(Self::absent(key_columns)),
        }
    }

    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    pub fn source_name(&self) -> Option<&'a str> {
        self.table.map(CsvTable::source_name)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.order.iter()
    }

    /// Row numbers sharing `key`, in file order.
    pub fn indices(&self, key: &[String]) -> &[usize] {
        self.groups.get(key).map_or(&[], Vec::as_slice)
    }

    /// Rows sharing `key`, in file order.
    pub fn rows(&self, key: &[String]) -> impl Iterator<Item = TableRow<'a>> + '_ {
        let table = self.table;
        self.indices(key)
            .iter()
            .filter_map(move |&index| table.and_then(|table| table.row(index)))
    }

    /// `(key, rows)` pairs in first-seen key order.
    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &[usize])> {
        self.order.iter().map(|key| (key, self.indices(key)))
    }
}
