//! Tree assembly: one record per `refid`, one SPD per `spd_id`, and the
//! Safety/Harms/Performance/Follow-up forms underneath.

use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, debug_span, info, warn};

use xform_ingest::{CsvTable, RowGroups, TableRow, normalize_header};
use xform_model::{
    BuildOptions, ChildForms, FollowUpFallback, FormKind, FormNode, QuestionEntry, QuestionType,
    Record, RefId, Response,
};

use crate::error::{BuildError, Result};
use crate::ids::IdFactory;
use crate::index::TemplateIndex;
use crate::populate::{NodeIdentity, populate_form};

const REFID: &str = "refid";
const SPD_ID: &str = "spd_id";
const SAFETY_ID: &str = "safety_id";

const ARTICLE_IDENTIFIER: &str = "Article Identifier";
const SPD_LABEL_QUESTIONS: [&str; 2] = ["Dataset Label", "Form Name"];
const ADVERSE_EVENT: &str = "Adverse Event";
const PERF_ENDPOINT: &str = "Perf Discrete Endpoint";
const PERF_TIME_POINT: &str = "Perf Discrete Time Point";

/// Loaded CSV inputs. Only the SPD table is mandatory.
#[derive(Debug, Clone)]
pub struct SourceTables {
    pub spd: CsvTable,
    pub safety: Option<CsvTable>,
    pub performance: Option<CsvTable>,
    pub harms: Option<CsvTable>,
    pub follow_up: Option<CsvTable>,
}

impl SourceTables {
    pub fn new(spd: CsvTable) -> Self {
        Self {
            spd,
            safety: None,
            performance: None,
            harms: None,
            follow_up: None,
        }
    }

    #[must_use]
    pub fn with_safety(mut self, table: Option<CsvTable>) -> Self {
        self.safety = table;
        self
    }

    #[must_use]
    pub fn with_performance(mut self, table: Option<CsvTable>) -> Self {
        self.performance = table;
        self
    }

    #[must_use]
    pub fn with_harms(mut self, table: Option<CsvTable>) -> Self {
        self.harms = table;
        self
    }

    #[must_use]
    pub fn with_follow_up(mut self, table: Option<CsvTable>) -> Self {
        self.follow_up = table;
        self
    }
}

/// Node counts for one build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub records: usize,
    pub spd: usize,
    pub safety: usize,
    pub harms: usize,
    pub performance: usize,
    pub follow_up: usize,
    /// Follow-up nodes built without a template prototype.
    pub synthesized_follow_up: usize,
    /// Follow-up rows dropped because the template has no Follow-up form.
    pub skipped_follow_up: usize,
    /// SPD rows dropped for a blank `refid` or `spd_id`.
    pub skipped_spd_rows: usize,
}

#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub records: Vec<Record>,
    pub stats: BuildStats,
}

/// Build one record per unique `refid` in the SPD table, in first-seen order.
///
/// Any missing linkage column or missing prototype aborts the whole build.
pub fn assemble(
    index: &TemplateIndex,
    sources: &SourceTables,
    options: &BuildOptions,
) -> Result<BuildOutput> {
    let start = Instant::now();
    sources.spd.require_columns(&[REFID, SPD_ID])?;
    if let Some(safety) = &sources.safety {
        safety.require_columns(&[SAFETY_ID])?;
    }

    let spd_by_refid = RowGroups::build(&sources.spd, &[REFID])?;
    let links = Links {
        safety: RowGroups::build_optional(sources.safety.as_ref(), &[REFID, SPD_ID])?,
        performance: RowGroups::build_optional(sources.performance.as_ref(), &[REFID, SPD_ID])?,
        harms: harms_groups(sources.harms.as_ref())?,
        follow_up: RowGroups::build_optional(sources.follow_up.as_ref(), &[REFID, SPD_ID])?,
    };

    let user = options
        .user
        .clone()
        .unwrap_or_else(|| index.extraction().user.clone());
    let mut assembler = Assembler {
        index,
        options,
        links: &links,
        user: &user,
        ids: index.id_factory(),
        stats: BuildStats::default(),
    };

    let mut records = Vec::with_capacity(spd_by_refid.len());
    for key in spd_by_refid.keys() {
        let refid = key[0].as_str();
        let rows: Vec<TableRow<'_>> = spd_by_refid.rows(key).collect();
        if refid.is_empty() {
            warn!(rows = rows.len(), "skipping SPD rows with a blank refid");
            assembler.stats.skipped_spd_rows += rows.len();
            continue;
        }
        records.push(assembler.build_record(refid, &rows)?);
    }

    let stats = assembler.stats;
    warn_unattached(sources.safety.as_ref(), stats.safety, "Safety");
    warn_unattached(sources.performance.as_ref(), stats.performance, "Performance");
    warn_unattached(sources.harms.as_ref(), stats.harms, "Harms");
    warn_unattached(
        sources.follow_up.as_ref(),
        stats.follow_up + stats.skipped_follow_up,
        "Follow-up",
    );
    info!(
        records = stats.records,
        spd = stats.spd,
        safety = stats.safety,
        harms = stats.harms,
        performance = stats.performance,
        follow_up = stats.follow_up,
        last_id = assembler.ids.last(),
        duration_ms = start.elapsed().as_millis(),
        "assembly complete"
    );
    Ok(BuildOutput { records, stats })
}

/// Harms rows link to their Safety row by (`refid`, `spd_id`, `safety_id`);
/// exports without `refid`/`spd_id` link by `safety_id` alone.
fn harms_groups(table: Option<&CsvTable>) -> Result<RowGroups<'_>> {
    let Some(table) = table else {
        return Ok(RowGroups::absent(&[REFID, SPD_ID, SAFETY_ID]));
    };
    if table.has_column(REFID) && table.has_column(SPD_ID) {
        return Ok(RowGroups::build(table, &[REFID, SPD_ID, SAFETY_ID])?);
    }
    info!(
        source = %table.source_name(),
        "Harms rows carry no refid/spd_id; linking by safety_id only"
    );
    Ok(RowGroups::build(table, &[SAFETY_ID])?)
}

fn warn_unattached(table: Option<&CsvTable>, attached: usize, form: &str) {
    if let Some(table) = table {
        if attached < table.len() {
            warn!(
                source = %table.source_name(),
                form,
                rows = table.len(),
                attached,
                "some rows matched no parent form"
            );
        }
    }
}

struct Links<'a> {
    safety: RowGroups<'a>,
    performance: RowGroups<'a>,
    harms: RowGroups<'a>,
    follow_up: RowGroups<'a>,
}

struct Assembler<'a> {
    index: &'a TemplateIndex,
    options: &'a BuildOptions,
    links: &'a Links<'a>,
    user: &'a str,
    ids: IdFactory,
    stats: BuildStats,
}

impl<'a> Assembler<'a> {
    fn build_record(&mut self, refid: &str, rows: &[TableRow<'_>]) -> Result<Record> {
        let span = debug_span!("refid", refid = %refid);
        let _guard = span.enter();

        let mut record = self.index.envelope().envelope();
        record.refid = Some(RefId::parse(refid));

        let extraction_id = self.ids.next_id()?;
        let mut extraction = populate_form(
            self.index.extraction(),
            rows.first().copied(),
            NodeIdentity::new(refid, self.user),
            &[(ARTICLE_IDENTIFIER, refid)],
        );
        for (spd_id, row) in unique_spd_rows(rows, &mut self.stats) {
            let node_id = self.ids.next_id()?;
            let spd = self.build_spd(refid, spd_id, row)?;
            extraction.child_forms.push(node_id, spd);
        }
        let spd_forms = extraction.child_forms.len();
        record.data_sets.push(extraction_id, extraction);
        debug!(spd_forms, forms = record.forms().len(), "record built");
        self.stats.records += 1;
        Ok(record)
    }

    fn build_spd(&mut self, refid: &str, spd_id: &str, row: TableRow<'_>) -> Result<FormNode> {
        let spd_key = self.options.spd_key(spd_id);
        let overrides = SPD_LABEL_QUESTIONS.map(|question| (question, spd_key.as_str()));
        let mut spd = populate_form(
            self.index.spd(),
            Some(row),
            NodeIdentity::new(spd_key.clone(), self.user),
            &overrides,
        );
        self.stats.spd += 1;

        let link = vec![refid.to_string(), spd_id.to_string()];
        let links = self.links;

        for safety_row in links.safety.rows(&link) {
            let proto = self.require(FormKind::Safety, &links.safety)?;
            let node_id = self.ids.next_id()?;
            let safety = self.build_safety(proto, &link, &spd_key, safety_row)?;
            spd.child_forms.push(node_id, safety);
        }

        for perf_row in links.performance.rows(&link) {
            let proto = self.require(FormKind::Performance, &links.performance)?;
            let key = format!(
                "{spd_key}\n{}-{}",
                perf_row.field(PERF_ENDPOINT),
                perf_row.field(PERF_TIME_POINT)
            );
            let key = key.trim_end_matches('-').trim().to_string();
            let node_id = self.ids.next_id()?;
            let node = populate_form(proto, Some(perf_row), NodeIdentity::new(key, self.user), &[]);
            spd.child_forms.push(node_id, node);
            self.stats.performance += 1;
        }

        for follow_row in links.follow_up.rows(&link) {
            let key = format!("{spd_key}\nFollow-up");
            let node = match self.index.prototype(FormKind::FollowUp) {
                Some(proto) => {
                    populate_form(proto, Some(follow_row), NodeIdentity::new(key, self.user), &[])
                }
                None => match self.options.follow_up_fallback {
                    FollowUpFallback::Synthesize => {
                        self.stats.synthesized_follow_up += 1;
                        self.synthesize_follow_up(key, follow_row)
                    }
                    FollowUpFallback::Skip => {
                        debug!(row = follow_row.index(), "follow-up row skipped");
                        self.stats.skipped_follow_up += 1;
                        continue;
                    }
                },
            };
            let node_id = self.ids.next_id()?;
            spd.child_forms.push(node_id, node);
            self.stats.follow_up += 1;
        }

        Ok(spd)
    }

    fn build_safety(
        &mut self,
        proto: &FormNode,
        link: &[String],
        spd_key: &str,
        row: TableRow<'_>,
    ) -> Result<FormNode> {
        let key = format!("{spd_key}\n{}", row.field(ADVERSE_EVENT));
        let mut safety = populate_form(
            proto,
            Some(row),
            NodeIdentity::new(key.trim(), self.user),
            &[],
        );
        self.stats.safety += 1;

        let safety_id = row.field(SAFETY_ID);
        let links = self.links;
        let harms_key: Vec<String> = if links.harms.key_columns().len() == 3 {
            vec![link[0].clone(), link[1].clone(), safety_id.to_string()]
        } else {
            vec![safety_id.to_string()]
        };
        for harms_row in links.harms.rows(&harms_key) {
            let harms_proto = self.require(FormKind::Harms, &links.harms)?;
            let key = format!("{spd_key}\n{safety_id}");
            let node_id = self.ids.next_id()?;
            let node = populate_form(
                harms_proto,
                Some(harms_row),
                NodeIdentity::new(key.trim(), self.user),
                &[],
            );
            safety.child_forms.push(node_id, node);
            self.stats.harms += 1;
        }
        Ok(safety)
    }

    /// Ad-hoc Follow-up node: one Text entry per non-linkage column.
    fn synthesize_follow_up(&self, key: String, row: TableRow<'_>) -> FormNode {
        let linkage = [REFID, SPD_ID, SAFETY_ID].map(normalize_header);
        let data = row
            .iter()
            .filter(|(header, _)| !linkage.contains(&normalize_header(header)))
            .map(|(header, value)| QuestionEntry {
                question: header.to_string(),
                question_type: QuestionType::Text,
                response: Response {
                    text: value.to_string(),
                    ..Response::default()
                },
                ..QuestionEntry::default()
            })
            .collect();
        // Follow-up is an SPD child, like Safety and Performance.
        let sibling = self
            .index
            .prototype(FormKind::Safety)
            .or_else(|| self.index.prototype(FormKind::Performance));
        FormNode {
            form: FormKind::FollowUp.label().to_string(),
            key,
            level: Some(sibling.and_then(|s| s.level.clone()).unwrap_or(Value::from(1))),
            is_subform: Some(
                sibling
                    .and_then(|s| s.is_subform.clone())
                    .unwrap_or(Value::from(1)),
            ),
            user: self.user.to_string(),
            data,
            child_forms: ChildForms::new(),
            ..FormNode::default()
        }
    }

    fn require(&self, kind: FormKind, groups: &RowGroups<'_>) -> Result<&'a FormNode> {
        self.index
            .prototype(kind)
            .ok_or_else(|| BuildError::MissingPrototype {
                form: kind,
                source_name: groups.source_name().unwrap_or_default().to_string(),
            })
    }
}

/// Sort key for `spd_id`: numbers first in numeric order, then text.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SpdOrder<'a> {
    Numeric(u64),
    Text(&'a str),
}

impl<'a> SpdOrder<'a> {
    fn of(spd_id: &'a str) -> Self {
        spd_id
            .parse::<u64>()
            .map_or(SpdOrder::Text(spd_id), SpdOrder::Numeric)
    }
}

/// First row per distinct non-blank `spd_id`, sorted by [`SpdOrder`].
fn unique_spd_rows<'r>(
    rows: &[TableRow<'r>],
    stats: &mut BuildStats,
) -> Vec<(&'r str, TableRow<'r>)> {
    let mut unique: Vec<(&'r str, TableRow<'r>)> = Vec::new();
    for row in rows {
        let spd_id = row.field(SPD_ID);
        if spd_id.is_empty() {
            warn!(row = row.index(), "skipping SPD row with a blank spd_id");
            stats.skipped_spd_rows += 1;
            continue;
        }
        if unique.iter().any(|(seen, _)| *seen == spd_id) {
            warn!(
                spd_id,
                row = row.index(),
                "duplicate spd_id row; the first row populates the form"
            );
            continue;
        }
        unique.push((spd_id, *row));
    }
    unique.sort_by(|(left, _), (right, _)| SpdOrder::of(left).cmp(&SpdOrder::of(right)));
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spd_table(ids: &[&str]) -> CsvTable {
        CsvTable::new(
            "spd.csv",
            vec![REFID.to_string(), SPD_ID.to_string()],
            ids.iter()
                .map(|id| vec!["1".to_string(), (*id).to_string()])
                .collect(),
        )
    }

    #[test]
    fn spd_ids_sort_numeric_then_text() {
        let table = spd_table(&["10", "b", "2", "a", "2", "", "1"]);
        let rows: Vec<TableRow<'_>> = table.rows().collect();
        let mut stats = BuildStats::default();
        let unique = unique_spd_rows(&rows, &mut stats);
        let ids: Vec<&str> = unique.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec!["1", "2", "10", "a", "b"]);
        assert_eq!(unique[1].1.index(), 2, "first row for a duplicate id wins");
        assert_eq!(stats.skipped_spd_rows, 1);
    }
}
