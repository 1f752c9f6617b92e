//! Symptom and TAL document reshaping

use crate::query::parse_datetime;
use crate::types::{without_keys, JsonObject, JsonValue, Record};
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Fields of a symptom listing entry
pub const SYMPTOM_FIELDS: &[&str] = &["created", "updated", "symptom_id", "symptom", "hash"];

/// Fields needed to find affected addresses
pub const AFFECTED_FIELDS: &[&str] = &["symptom_id", "symptom", "hash"];

const DATE_FIELDS: &[&str] = &["created", "updated"];
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static IPV4: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$").unwrap());

static XML_UTF8: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)encoding\s*=\s*['"]utf-?8['"]"#).unwrap());

/// Client view of a symptom: dates as `YYYY-MM-DD HH:MM:SS`, no identity
pub fn symptom_view(record: &Record) -> Record {
    without_keys(record, &["id", "_id"])
        .into_iter()
        .map(|(key, value)| {
            if !DATE_FIELDS.contains(&key.as_str()) {
                return (key, value);
            }
            let rendered = value
                .as_str()
                .and_then(parse_datetime)
                .map(|dt| JsonValue::String(dt.format(DATE_FORMAT).to_string()));
            (key, rendered.unwrap_or(value))
        })
        .collect()
}

/// Copy each action's reported status onto the tactic action it ran
///
/// `actions` maps an action option id to its report; the matching entry
/// of `tactic.action` gains `status`. The `actions` map is not returned.
pub fn with_action_status(record: &Record) -> Record {
    let reports = record.get("actions").and_then(JsonValue::as_object);
    let mut out = without_keys(record, &["actions"]);

    let Some(tactic) = record.get("tactic").and_then(JsonValue::as_object) else {
        return out;
    };
    let Some(actions) = tactic.get("action").and_then(JsonValue::as_array) else {
        return out;
    };

    let actions: Vec<JsonValue> = actions
        .iter()
        .map(|action| {
            let status = action
                .pointer("/actionOption/id")
                .and_then(JsonValue::as_str)
                .and_then(|id| reports.and_then(|r| r.get(id)))
                .and_then(|report| report.get("status"));
            match (action.as_object(), status) {
                (Some(fields), Some(status)) => {
                    let mut fields = fields.clone();
                    fields.insert("status".into(), status.clone());
                    JsonValue::Object(fields)
                }
                _ => action.clone(),
            }
        })
        .collect();

    let mut tactic = tactic.clone();
    tactic.insert("action".into(), JsonValue::Array(actions));
    out.insert("tactic".into(), JsonValue::Object(tactic));
    out
}

/// Addresses named by symptom parameters
///
/// Every dotted-quad string inside a symptom maps to the symptoms that
/// mention it and the parameter that held it.
pub fn affected_ips(records: &[Record]) -> JsonObject {
    let mut affected = JsonObject::new();
    for record in records {
        let Some(symptom) = record.get("symptom").and_then(JsonValue::as_object) else {
            continue;
        };
        for (parameter, value) in symptom {
            let Some(ip) = value.as_str().filter(|v| IPV4.is_match(v)) else {
                continue;
            };
            let entry = serde_json::json!({
                "hash": record.get("hash").cloned().unwrap_or_default(),
                "symptom_id": record.get("symptom_id").cloned().unwrap_or_default(),
                "parameter": parameter,
            });
            match affected.get_mut(ip) {
                Some(JsonValue::Array(list)) => list.push(entry),
                _ => {
                    affected.insert(ip.to_string(), JsonValue::Array(vec![entry]));
                }
            }
        }
    }
    affected
}

/// Symptom a TAL reacts to
pub fn tal_symptom(document: &Record) -> Option<&str> {
    document
        .get("reaction")
        .and_then(|r| r.pointer("/0/diagnosis/symptom/oid"))
        .and_then(JsonValue::as_str)
}

/// `{symptom, status}` per TAL; unknown symptoms are `disabled`
pub fn tal_summaries(documents: &[Record], statuses: &JsonValue) -> Vec<JsonValue> {
    documents
        .iter()
        .filter_map(tal_symptom)
        .map(|symptom| {
            let status = statuses
                .get(symptom)
                .cloned()
                .unwrap_or_else(|| JsonValue::String("disabled".into()));
            serde_json::json!({ "symptom": symptom, "status": status })
        })
        .collect()
}

/// TAL document as shown to clients
pub fn tal_view(document: &Record) -> Record {
    without_keys(document, &["id", "className"])
}

/// The TAL service only accepts `encoding="UTF-8"` in the XML prolog
pub fn normalize_xml_encoding(script: &str) -> Cow<'_, str> {
    XML_UTF8.replace_all(script, r#"encoding="UTF-8""#)
}
