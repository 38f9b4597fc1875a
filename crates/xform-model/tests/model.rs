//! Tests for xform-model types.

use xform_model::{FormKind, QuestionType, Record};

const TEMPLATE: &str = r#"[{
    "refid": 1001,
    "tags": [],
    "attachments": [],
    "biblio_string": "",
    "data_sets": {
        "501": {
            "form": "Extraction",
            "key": "1001",
            "level": 0,
            "is_subform": 0,
            "user": "reviewer",
            "data": [
                {"question": "Article Identifier", "type": "Text", "response": {"text": "1001", "answer": ""}}
            ],
            "child_forms": {
                "502": {
                    "form": "Study Parameters and Demographics",
                    "key": "spd_1",
                    "level": 1,
                    "is_subform": 1,
                    "user": "reviewer",
                    "data": [
                        {"question": "Device Type", "type": "Radio", "response": {"text": "", "answer": "Implant"}}
                    ],
                    "child_forms": {}
                }
            }
        }
    }
}]"#;

#[test]
fn template_record_decodes_and_walks() {
    let records: Vec<Record> = serde_json::from_str(TEMPLATE).expect("decode template");
    let record = &records[0];
    let forms = record.forms();
    assert_eq!(forms.len(), 2);
    assert_eq!(forms[0].form, "Extraction");
    assert_eq!(forms[1].data[0].question_type, QuestionType::Radio);
    assert_eq!(forms[1].data[0].value(), "Implant");
}

#[test]
fn template_record_round_trips() {
    let records: Vec<Record> = serde_json::from_str(TEMPLATE).expect("decode template");
    let original: serde_json::Value = serde_json::from_str(TEMPLATE).unwrap();
    let encoded = serde_json::to_value(&records).expect("encode template");
    assert_eq!(encoded, original);
}

#[test]
fn kind_labels_match_their_own_predicates() {
    for kind in FormKind::ALL {
        let normalized = kind.label().to_lowercase();
        assert!(kind.matches(&normalized), "{kind} label should match itself");
    }
}
