//! CSV file reading.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use ::csv::{ReaderBuilder, Trim};

use crate::error::{IngestError, Result};

use super::table::CsvTable;

/// Reads a UTF-8 CSV file (header row required) into a [`CsvTable`].
///
/// Header names and cell values are trimmed, a leading BOM is dropped and
/// ragged rows are accepted.
pub fn read_csv_table(path: &Path) -> Result<CsvTable> {
    let file = File::open(path).map_err(|e| IngestError::open(path, e))?;
    let source_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map_or_else(|| path.display().to_string(), str::to_string);
    let table = read_csv_reader(source_name, file)?;
    tracing::debug!(
        path = %path.display(),
        rows = table.len(),
        columns = table.headers().len(),
        "loaded csv"
    );
    Ok(table)
}

/// Reads CSV content from any reader. `source_name` labels the table in errors.
pub fn read_csv_reader<R: Read>(source_name: impl Into<String>, reader: R) -> Result<CsvTable> {
    let source_name = source_name.into();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| IngestError::CsvParse {
            source_name: source_name.clone(),
            source,
        })?
        .iter()
        .map(|header| header.trim_matches('\u{feff}').trim().to_string())
        .collect();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(IngestError::EmptyCsv { source_name });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| IngestError::CsvParse {
            source_name: source_name.clone(),
            source,
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(CsvTable::new(source_name, headers, rows))
}
