//! File-level pipeline: load inputs, assemble records, write the output.
//!
//! Every stage attaches a short context message to its error; the typed
//! `IngestError`/`BuildError` underneath stays reachable with
//! `anyhow::Error::downcast_ref`.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Serializer;
use serde_json::ser::PrettyFormatter;
use tracing::{debug, info, info_span, trace};

use xform_build::{BuildOutput, SourceTables, TemplateIndex, assemble};
use xform_ingest::{CsvTable, load_template_json, read_csv_table};
use xform_model::{BuildOptions, Record};

use crate::logging::redact_value;

/// Paths of every input file for one build.
#[derive(Debug, Clone)]
pub struct BuildInputs {
    pub template: PathBuf,
    pub spd: PathBuf,
    pub safety: Option<PathBuf>,
    pub performance: Option<PathBuf>,
    pub harms: Option<PathBuf>,
    pub follow_up: Option<PathBuf>,
}

impl BuildInputs {
    pub fn new(template: impl Into<PathBuf>, spd: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
            spd: spd.into(),
            safety: None,
            performance: None,
            harms: None,
            follow_up: None,
        }
    }
}

/// Load and index a template file.
pub fn load_template(path: &Path) -> Result<TemplateIndex> {
    let value =
        load_template_json(path).with_context(|| format!("load template {}", path.display()))?;
    TemplateIndex::from_value(&value)
        .with_context(|| format!("index template {}", path.display()))
}

fn load_table(path: &Path, form: &str) -> Result<CsvTable> {
    let table =
        read_csv_table(path).with_context(|| format!("read {form} CSV {}", path.display()))?;
    debug!(
        form,
        source = %table.source_name(),
        rows = table.len(),
        columns = table.headers().len(),
        "loaded table"
    );
    if let Some(row) = table.row(0) {
        for (header, value) in row.iter() {
            trace!(form, header, value = redact_value(value), "first row");
        }
    }
    Ok(table)
}

fn load_optional(path: Option<&Path>, form: &str) -> Result<Option<CsvTable>> {
    path.map(|path| load_table(path, form)).transpose()
}

/// Read every supplied CSV. Only the SPD file is required.
pub fn load_sources(inputs: &BuildInputs) -> Result<SourceTables> {
    let spd = load_table(&inputs.spd, "SPD")?;
    Ok(SourceTables::new(spd)
        .with_safety(load_optional(inputs.safety.as_deref(), "Safety")?)
        .with_performance(load_optional(inputs.performance.as_deref(), "Performance")?)
        .with_harms(load_optional(inputs.harms.as_deref(), "Harms")?)
        .with_follow_up(load_optional(inputs.follow_up.as_deref(), "Follow-up")?))
}

/// Run a whole build from files. Nothing is written here.
pub fn build_from_files(inputs: &BuildInputs, options: &BuildOptions) -> Result<BuildOutput> {
    let span = info_span!("build", template = %inputs.template.display());
    let _guard = span.enter();

    let load_start = Instant::now();
    let index = load_template(&inputs.template)?;
    let sources = load_sources(inputs)?;
    info!(
        spd_rows = sources.spd.len(),
        max_key = index.max_key(),
        duration_ms = load_start.elapsed().as_millis(),
        "inputs loaded"
    );

    assemble(&index, &sources, options).context("assemble records")
}

/// Write `records` as a 4-space indented JSON array.
///
/// The document goes to a sibling temp file that is renamed over `path`, so
/// a failed write never leaves a partial output behind.
pub fn write_output_json(path: &Path, records: &[Record]) -> Result<()> {
    let start = Instant::now();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let temp_path = temp_sibling(path);
    let result = write_json_file(&temp_path, records).and_then(|()| {
        fs::rename(&temp_path, path).with_context(|| {
            format!("move {} to {}", temp_path.display(), path.display())
        })
    });
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result?;
    info!(
        path = %path.display(),
        records = records.len(),
        duration_ms = start.elapsed().as_millis(),
        "output written"
    );
    Ok(())
}

fn write_json_file(path: &Path, records: &[Record]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let mut serializer =
        Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
    records
        .serialize(&mut serializer)
        .with_context(|| format!("serialize records to {}", path.display()))?;
    writer
        .write_all(b"\n")
        .and_then(|()| writer.flush())
        .with_context(|| format!("write {}", path.display()))?;
    writer
        .get_ref()
        .sync_all()
        .with_context(|| format!("sync {}", path.display()))
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
