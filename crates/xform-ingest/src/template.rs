//! Template JSON loading.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{IngestError, Result};

/// Read and parse the template document. Shape checks happen when the
/// template is indexed, not here.
pub fn load_template_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).map_err(|e| IngestError::open(path, e))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    let value = serde_json::from_str(text).map_err(|source| IngestError::JsonParse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loaded template");
    Ok(value)
}
