//! Input handling for the extraction record builder.
//!
//! # Features
//!
//! - **Header normalization**: canonical lowercase form of question text and
//!   CSV column names for tolerant matching
//! - **CSV loading**: read a UTF-8 CSV with a header row into a [`CsvTable`]
//! - **Row grouping**: group rows by linkage columns (`refid`, `spd_id`,
//!   `safety_id`) preserving row order
//! - **Template loading**: read the template JSON document
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use xform_ingest::{RowGroups, read_csv_table};
//!
//! let safety = read_csv_table(Path::new("Safety.csv"))?;
//! let by_spd = RowGroups::build(&safety, &["refid", "spd_id"])?;
//! for row in by_spd.rows(&["12".to_string(), "1".to_string()]) {
//!     println!("{:?}", row.get("Adverse Event"));
//! }
//! ```

mod csv;
mod error;
mod grouping;
mod normalize;
mod template;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading ===
pub use self::csv::{CsvTable, TableRow, read_csv_reader, read_csv_table};

// === Header Normalization ===
pub use normalize::{HeaderIndex, normalize_header};

// === Row Grouping ===
pub use grouping::{GroupKey, RowGroups};

// === Template Loading ===
pub use template::load_template_json;
