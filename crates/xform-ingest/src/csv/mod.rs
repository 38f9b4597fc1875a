//! CSV reading utilities.

mod reader;
mod table;

pub use reader::{read_csv_reader, read_csv_table};
pub use table::{CsvTable, TableRow};
