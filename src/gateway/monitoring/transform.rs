//! Monasca response reshaping
//!
//! Pure functions: each builds a new value and leaves its input untouched.

use crate::types::{without_keys, JsonObject, JsonValue};

const DEFINITION_HIDDEN: &[&str] = &["links", "alarm_actions", "ok_actions", "undetermined_actions"];

/// `elements` of a Monasca listing
pub fn elements(body: &JsonValue) -> &[JsonValue] {
    body.get("elements")
        .and_then(JsonValue::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Monasca `dimensions` filter, `k1:v1,k2:v2`
pub fn dimensions(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{k}:{v}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn strip(value: &JsonValue, keys: &[&str]) -> JsonValue {
    match value.as_object() {
        Some(object) => JsonValue::Object(without_keys(object, keys)),
        None => value.clone(),
    }
}

fn alarm_without(alarm: &JsonObject, keys: &[&str]) -> JsonObject {
    let mut out = without_keys(alarm, keys);
    if let Some(definition) = alarm.get("alarm_definition") {
        out.insert("alarm_definition".into(), strip(definition, &["links"]));
    }
    out
}

/// Alarm listing entry without Monasca's links
pub fn listed_alarm(alarm: &JsonObject) -> JsonObject {
    alarm_without(alarm, &["links"])
}

/// Single alarm without Monasca's links
pub fn single_alarm(alarm: &JsonObject) -> JsonObject {
    alarm_without(alarm, &["links", "link"])
}

pub fn alarms(body: &JsonValue) -> Vec<JsonValue> {
    elements(body)
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|a| JsonValue::Object(listed_alarm(a)))
        .collect()
}

/// Alarm definition without links and notification actions
pub fn definition(body: &JsonValue) -> JsonValue {
    strip(body, DEFINITION_HIDDEN)
}

/// Dimensions of every flow
pub fn flows(body: &JsonValue) -> Vec<JsonValue> {
    elements(body)
        .iter()
        .filter_map(|e| e.get("dimensions").cloned())
        .collect()
}

/// Metric names only
pub fn metric_names(body: &JsonValue) -> Vec<JsonValue> {
    elements(body)
        .iter()
        .filter_map(|e| e.get("name").cloned())
        .collect()
}

/// Every measurement row keyed by its element's `columns`
pub fn measurements(body: &JsonValue) -> Vec<JsonValue> {
    let mut rows = Vec::new();
    for element in elements(body) {
        let columns: Vec<&str> = element
            .get("columns")
            .and_then(JsonValue::as_array)
            .map(|cs| cs.iter().filter_map(JsonValue::as_str).collect())
            .unwrap_or_default();
        let Some(values) = element.get("measurements").and_then(JsonValue::as_array) else {
            continue;
        };
        for measurement in values.iter().filter_map(JsonValue::as_array) {
            let row: JsonObject = columns
                .iter()
                .zip(measurement)
                .map(|(c, v)| ((*c).to_string(), v.clone()))
                .collect();
            rows.push(JsonValue::Object(row));
        }
    }
    rows
}
