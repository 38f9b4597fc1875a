//! End-to-end assembly over in-memory tables.

use std::collections::HashSet;

use proptest::prelude::*;
use serde_json::{Value, json};

use xform_build::{BuildError, SourceTables, TemplateIndex, assemble, max_numeric_key};
use xform_ingest::{CsvTable, IngestError};
use xform_model::{BuildOptions, FollowUpFallback, FormKind, FormNode, Record, RefId};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn table(name: &str, headers: &[&str], rows: &[&[&str]]) -> CsvTable {
    CsvTable::new(
        name,
        strings(headers),
        rows.iter().copied().map(strings).collect(),
    )
}

fn question(text: &str, kind: &str) -> Value {
    json!({"question": text, "type": kind, "response": {"text": "", "answer": ""}})
}

fn form(label: &str, level: u64, data: Vec<Value>, children: Value) -> Value {
    json!({
        "form": label,
        "key": "",
        "level": level,
        "is_subform": if level > 1 { 1 } else { 0 },
        "user": "template-user",
        "data": data,
        "child_forms": children
    })
}

fn template(with_follow_up: bool) -> Value {
    let mut spd_children = json!({
        "1003": form(
            "Safety",
            3,
            vec![question("Adverse Event", "Text"), question("Serious?", "Radio")],
            json!({"1004": form("Harms", 4, vec![question("Harm Description", "Text")], json!({}))})
        ),
        "1005": form(
            "Performance (discrete)",
            3,
            vec![
                question("Perf Discrete Endpoint", "Text"),
                question("Perf Discrete Time Point", "Text")
            ],
            json!({})
        )
    });
    if with_follow_up {
        spd_children["1006"] = form(
            "Follow-up Subform",
            3,
            vec![question("Follow-up Duration", "Text")],
            json!({}),
        );
    }
    json!([{
        "refid": 1,
        "tags": ["device"],
        "attachments": [],
        "biblio_string": "",
        "data_sets": {
            "1001": form(
                "Extraction",
                1,
                vec![question("Article Identifier", "Text"), question("Reviewer Notes", "Text")],
                json!({
                    "1002": form(
                        "Study Parameters and Demographics",
                        2,
                        vec![
                            question("Dataset Label", "Text"),
                            question("Country", "Text"),
                            question("Associated CERs", "Checkbox")
                        ],
                        spd_children
                    )
                })
            )
        }
    }])
}

fn spd() -> CsvTable {
    table(
        "SPD.csv",
        &["refid", "spd_id", "Country", "Associated CERs"],
        &[&["1", "1", "Germany", "CER-1; CER-2"]],
    )
}

fn safety() -> CsvTable {
    table(
        "Safety.csv",
        &["refid", "spd_id", "safety_id", "Adverse Event", "Serious?"],
        &[&["1", "1", "10", "Bleeding", "Yes"]],
    )
}

fn harms() -> CsvTable {
    table(
        "Harms.csv",
        &["refid", "spd_id", "safety_id", "Harm Description"],
        &[&["1", "1", "10", "minor"], &["1", "1", "10", "major"]],
    )
}

fn children(node: &FormNode) -> Vec<(&str, &FormNode)> {
    node.child_forms.iter().collect()
}

fn only_record(records: &[Record]) -> &Record {
    assert_eq!(records.len(), 1);
    &records[0]
}

fn extraction_node(record: &Record) -> (&str, &FormNode) {
    record.data_sets.first().expect("extraction node")
}

fn answer<'a>(node: &'a FormNode, question: &str) -> Vec<&'a str> {
    node.data
        .iter()
        .filter(|entry| entry.question == question)
        .map(|entry| entry.value())
        .collect()
}

#[test]
fn safety_with_two_harms() {
    let index = TemplateIndex::from_value(&template(true)).unwrap();
    let sources = SourceTables::new(spd())
        .with_safety(Some(safety()))
        .with_harms(Some(harms()));
    let output = assemble(&index, &sources, &BuildOptions::default()).unwrap();

    let record = only_record(&output.records);
    assert_eq!(record.refid, Some(RefId::Number(1)));
    assert_eq!(record.tags, json!(["device"]));

    let (extraction_id, extraction) = extraction_node(record);
    assert_eq!(extraction_id, "1007");
    assert_eq!(extraction.key, "1");
    assert_eq!(answer(extraction, "Article Identifier"), vec!["1"]);

    let spds = children(extraction);
    assert_eq!(spds.len(), 1);
    let (_, spd) = spds[0];
    assert_eq!(spd.key, "spd_1");
    assert_eq!(answer(spd, "Dataset Label"), vec!["spd_1"]);
    assert_eq!(answer(spd, "Country"), vec!["Germany"]);
    assert_eq!(answer(spd, "Associated CERs"), vec!["CER-1", "CER-2"]);

    let safeties = children(spd);
    assert_eq!(safeties.len(), 1);
    let (_, safety) = safeties[0];
    assert_eq!(safety.form, "Safety");
    assert_eq!(safety.key, "spd_1\nBleeding");
    assert_eq!(answer(safety, "Serious?"), vec!["Yes"]);

    let harms = children(safety);
    assert_eq!(harms.len(), 2);
    let descriptions: Vec<&str> = harms
        .iter()
        .flat_map(|(_, node)| answer(node, "Harm Description"))
        .collect();
    assert_eq!(descriptions, vec!["minor", "major"]);
    assert!(harms.iter().all(|(_, node)| node.key == "spd_1\n10"));

    assert_eq!(output.stats.records, 1);
    assert_eq!(output.stats.safety, 1);
    assert_eq!(output.stats.harms, 2);
}

#[test]
fn generated_ids_are_unique_and_above_template_keys() {
    let template = template(true);
    let ceiling = max_numeric_key(&template).unwrap();
    let index = TemplateIndex::from_value(&template).unwrap();
    let sources = SourceTables::new(spd())
        .with_safety(Some(safety()))
        .with_harms(Some(harms()));
    let output = assemble(&index, &sources, &BuildOptions::default()).unwrap();

    let value = serde_json::to_value(&output.records).unwrap();
    let mut seen = HashSet::new();
    collect_child_ids(&value, &mut seen);
    // extraction + spd + safety + 2 harms
    assert_eq!(seen.len(), 5);
    assert!(seen.iter().all(|id| *id > ceiling));
}

fn collect_child_ids(value: &Value, seen: &mut HashSet<u64>) {
    match value {
        Value::Object(map) => {
            for (name, member) in map {
                if name == "data_sets" || name == "child_forms" {
                    if let Value::Object(children) = member {
                        for id in children.keys() {
                            assert!(seen.insert(id.parse().unwrap()), "duplicate id {id}");
                        }
                    }
                }
                collect_child_ids(member, seen);
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_child_ids(item, seen)),
        _ => {}
    }
}

#[test]
fn absent_optional_tables_add_no_children() {
    let index = TemplateIndex::from_value(&template(true)).unwrap();
    let output = assemble(&index, &SourceTables::new(spd()), &BuildOptions::default()).unwrap();
    let record = only_record(&output.records);
    let (_, extraction) = extraction_node(record);
    let (_, spd) = extraction.child_forms.first().unwrap();
    assert!(spd.child_forms.is_empty());
}

#[test]
fn prototype_metadata_is_copied() {
    let index = TemplateIndex::from_value(&template(true)).unwrap();
    let sources = SourceTables::new(spd()).with_safety(Some(safety()));
    let output = assemble(&index, &sources, &BuildOptions::default()).unwrap();
    let record = only_record(&output.records);
    let (_, extraction) = extraction_node(record);
    let (_, spd) = extraction.child_forms.first().unwrap();
    let (_, safety) = spd.child_forms.first().unwrap();

    assert_eq!(extraction.level, Some(json!(1)));
    assert_eq!(extraction.is_subform, Some(json!(0)));
    assert_eq!(spd.level, Some(json!(2)));
    assert_eq!(safety.level, Some(json!(3)));
    assert_eq!(safety.is_subform, Some(json!(1)));
    // at most one response field carries a value
    assert!(
        safety
            .data
            .iter()
            .all(|entry| entry.response.text.is_empty() || entry.response.answer.is_empty())
    );
}

#[test]
fn unmatched_questions_stay_blank() {
    let index = TemplateIndex::from_value(&template(true)).unwrap();
    let output = assemble(&index, &SourceTables::new(spd()), &BuildOptions::default()).unwrap();
    let record = only_record(&output.records);
    let (_, extraction) = extraction_node(record);
    let notes = extraction
        .data
        .iter()
        .find(|entry| entry.question == "Reviewer Notes")
        .unwrap();
    assert!(notes.response.is_empty());
}

#[test]
fn performance_keys_trim_missing_time_point() {
    let index = TemplateIndex::from_value(&template(true)).unwrap();
    let performance = table(
        "Perf.csv",
        &["refid", "spd_id", "Perf Discrete Endpoint", "Perf Discrete Time Point"],
        &[&["1", "1", "Success", "30 days"], &["1", "1", "Patency", ""]],
    );
    let sources = SourceTables::new(spd()).with_performance(Some(performance));
    let output = assemble(&index, &sources, &BuildOptions::default()).unwrap();
    let record = only_record(&output.records);
    let (_, extraction) = extraction_node(record);
    let (_, spd) = extraction.child_forms.first().unwrap();
    let keys: Vec<&str> = spd.child_forms.nodes().map(|node| node.key.as_str()).collect();
    assert_eq!(keys, vec!["spd_1\nSuccess-30 days", "spd_1\nPatency"]);
}

#[test]
fn follow_up_synthesized_without_prototype() {
    let index = TemplateIndex::from_value(&template(false)).unwrap();
    let follow_up = table(
        "FollowUp.csv",
        &["refid", "spd_id", "Follow-up Duration", "Lost to follow-up"],
        &[&["1", "1", "12 months", "3"]],
    );
    let sources = SourceTables::new(spd()).with_follow_up(Some(follow_up.clone()));
    let output = assemble(&index, &sources, &BuildOptions::default()).unwrap();
    let record = only_record(&output.records);
    let (_, extraction) = extraction_node(record);
    let (_, spd) = extraction.child_forms.first().unwrap();
    let (_, node) = spd.child_forms.first().unwrap();
    assert_eq!(node.form, FormKind::FollowUp.label());
    assert_eq!(node.key, "spd_1\nFollow-up");
    assert_eq!(node.level, Some(json!(3)));
    let questions: Vec<&str> = node.data.iter().map(|e| e.question.as_str()).collect();
    assert_eq!(questions, vec!["Follow-up Duration", "Lost to follow-up"]);
    assert_eq!(output.stats.synthesized_follow_up, 1);

    let skip = BuildOptions::default().with_follow_up_fallback(FollowUpFallback::Skip);
    let sources = SourceTables::new(crate::spd()).with_follow_up(Some(follow_up));
    let output = assemble(&index, &sources, &skip).unwrap();
    let (_, extraction) = extraction_node(only_record(&output.records));
    let (_, spd) = extraction.child_forms.first().unwrap();
    assert!(spd.child_forms.is_empty());
    assert_eq!(output.stats.skipped_follow_up, 1);
}

#[test]
fn missing_prototype_with_rows_fails() {
    let mut value = template(true);
    value[0]["data_sets"]["1001"]["child_forms"]["1002"]["child_forms"]["1003"]["child_forms"] =
        json!({});
    let index = TemplateIndex::from_value(&value).unwrap();
    let sources = SourceTables::new(spd())
        .with_safety(Some(safety()))
        .with_harms(Some(harms()));
    let error = assemble(&index, &sources, &BuildOptions::default()).unwrap_err();
    expect_missing_prototype(error, FormKind::Harms, "Harms.csv");
}

fn spd_children_mut(value: &mut Value) -> &mut serde_json::Map<String, Value> {
    value[0]["data_sets"]["1001"]["child_forms"]["1002"]["child_forms"]
        .as_object_mut()
        .unwrap()
}

fn expect_missing_prototype(error: BuildError, expected: FormKind, expected_source: &str) {
    match error {
        BuildError::MissingPrototype { form, source_name } => {
            assert_eq!(form, expected);
            assert_eq!(source_name, expected_source);
        }
        other => panic!("expected MissingPrototype, got {other}"),
    }
}

#[test]
fn safety_rows_without_safety_form_fail() {
    let mut value = template(true);
    spd_children_mut(&mut value).remove("1003");
    let index = TemplateIndex::from_value(&value).unwrap();
    let sources = SourceTables::new(spd()).with_safety(Some(safety()));
    let error = assemble(&index, &sources, &BuildOptions::default()).unwrap_err();
    expect_missing_prototype(error, FormKind::Safety, "Safety.csv");
}

#[test]
fn performance_rows_without_performance_form_fail() {
    let mut value = template(true);
    spd_children_mut(&mut value).remove("1005");
    let index = TemplateIndex::from_value(&value).unwrap();
    let performance = table(
        "Perf.csv",
        &["refid", "spd_id", "Perf Discrete Endpoint"],
        &[&["1", "1", "Success"]],
    );
    let sources = SourceTables::new(spd()).with_performance(Some(performance));
    let error = assemble(&index, &sources, &BuildOptions::default()).unwrap_err();
    expect_missing_prototype(error, FormKind::Performance, "Perf.csv");
}

#[test]
fn missing_safety_form_is_fine_without_safety_rows() {
    let mut value = template(true);
    spd_children_mut(&mut value).remove("1003");
    let index = TemplateIndex::from_value(&value).unwrap();
    let output = assemble(&index, &SourceTables::new(spd()), &BuildOptions::default()).unwrap();
    let (_, extraction) = extraction_node(only_record(&output.records));
    let (_, spd_node) = extraction.child_forms.first().unwrap();
    assert!(spd_node.child_forms.is_empty());
    assert_eq!(output.stats.safety, 0);

    // a Safety table whose rows link to no SPD row needs no prototype either
    let unlinked = table(
        "Safety.csv",
        &["refid", "spd_id", "safety_id", "Adverse Event"],
        &[&["2", "1", "10", "Bleeding"]],
    );
    let sources = SourceTables::new(spd()).with_safety(Some(unlinked));
    let output = assemble(&index, &sources, &BuildOptions::default()).unwrap();
    assert_eq!(output.stats.safety, 0);
}

#[test]
fn null_metadata_is_copied_as_null() {
    let mut value = template(true);
    let proto = &mut value[0]["data_sets"]["1001"]["child_forms"]["1002"];
    proto["level"] = Value::Null;
    proto["is_subform"] = Value::Null;
    let index = TemplateIndex::from_value(&value).unwrap();
    let output = assemble(&index, &SourceTables::new(spd()), &BuildOptions::default()).unwrap();
    let records = serde_json::to_value(&output.records).unwrap();
    let extraction = records[0]["data_sets"].as_object().unwrap().values().next().unwrap();
    let spd_node = extraction["child_forms"]
        .as_object()
        .unwrap()
        .values()
        .next()
        .unwrap()
        .as_object()
        .unwrap();
    assert_eq!(spd_node.get("level"), Some(&Value::Null));
    assert_eq!(spd_node.get("is_subform"), Some(&Value::Null));
}

#[test]
fn template_key_at_u64_max_is_an_error() {
    let mut value = template(true);
    let data_sets = value[0]["data_sets"].as_object_mut().unwrap();
    let extraction = data_sets.remove("1001").unwrap();
    data_sets.insert(u64::MAX.to_string(), extraction);
    let index = TemplateIndex::from_value(&value).unwrap();
    assert_eq!(index.max_key(), Some(u64::MAX));

    let error = assemble(&index, &SourceTables::new(spd()), &BuildOptions::default()).unwrap_err();
    assert!(matches!(error, BuildError::IdsExhausted { last } if last == u64::MAX));
}

#[test]
fn missing_spd_id_column_fails() {
    let index = TemplateIndex::from_value(&template(true)).unwrap();
    let spd = table("SPD.csv", &["refid", "Country"], &[&["1", "Chile"]]);
    let error = assemble(&index, &SourceTables::new(spd), &BuildOptions::default()).unwrap_err();
    assert!(matches!(
        error,
        BuildError::Ingest(IngestError::MissingColumn { ref column, .. }) if column == "spd_id"
    ));
}

#[test]
fn records_follow_refid_first_seen_order() {
    let index = TemplateIndex::from_value(&template(true)).unwrap();
    let spd = table(
        "SPD.csv",
        &["refid", "spd_id"],
        &[&["7", "2"], &["A-3", "1"], &["7", "1"], &["", "1"]],
    );
    let output = assemble(&index, &SourceTables::new(spd), &BuildOptions::default()).unwrap();
    let refids: Vec<String> = output
        .records
        .iter()
        .map(|r| r.refid.as_ref().unwrap().to_string())
        .collect();
    assert_eq!(refids, vec!["7", "A-3"]);
    assert_eq!(output.stats.skipped_spd_rows, 1);

    let (_, extraction) = output.records[0].data_sets.first().unwrap();
    let keys: Vec<&str> = extraction.child_forms.nodes().map(|n| n.key.as_str()).collect();
    assert_eq!(keys, vec!["spd_1", "spd_2"]);
}

proptest! {
    #[test]
    fn every_node_gets_a_fresh_id(spd_ids in prop::collection::vec(1u8..20, 1..8), safety_rows in 0usize..6) {
        let index = TemplateIndex::from_value(&template(true)).unwrap();
        let spd_rows: Vec<Vec<String>> = spd_ids
            .iter()
            .map(|id| vec!["1".to_string(), id.to_string()])
            .collect();
        let spd = CsvTable::new("SPD.csv", strings(&["refid", "spd_id"]), spd_rows);
        let safety_rows: Vec<Vec<String>> = (0..safety_rows)
            .map(|n| vec!["1".to_string(), spd_ids[n % spd_ids.len()].to_string(), n.to_string()])
            .collect();
        let safety = CsvTable::new("Safety.csv", strings(&["refid", "spd_id", "safety_id"]), safety_rows);
        let output = assemble(
            &index,
            &SourceTables::new(spd).with_safety(Some(safety)),
            &BuildOptions::default(),
        )
        .unwrap();

        let value = serde_json::to_value(&output.records).unwrap();
        let mut seen = HashSet::new();
        collect_child_ids(&value, &mut seen);
        let distinct: HashSet<u8> = spd_ids.iter().copied().collect();
        prop_assert_eq!(seen.len(), 1 + distinct.len() + output.stats.safety);
        prop_assert!(seen.iter().all(|id| *id > 1006));
    }
}
