//! Query string parsing

use super::types::{DateRange, LimitPolicy, ParamValue, QuerySpec, RawQuery};
use crate::error::{code, Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

const SINCE_SUFFIX: &str = "_since";
const TO_SUFFIX: &str = "_to";

/// Normalize a raw query under the given limit policy
pub fn normalize(raw: &RawQuery, limits: LimitPolicy) -> Result<QuerySpec> {
    let search_by = match raw.get("search_by") {
        Some(value) => parse_search_by(&value)?,
        None => Vec::new(),
    };

    let filter = raw.get("filter").map(|v| parse_filter(&v)).unwrap_or_default();

    let limit = parse_limit(raw.first("limit"), limits)?;
    let cursor = raw
        .first("offset")
        .filter(|c| !c.is_empty())
        .map(ToString::to_string);

    let spec = QuerySpec {
        search_by,
        filter,
        date_ranges: parse_date_ranges(raw)?,
        limit,
        cursor,
    };
    debug!(?spec, "normalized query");
    Ok(spec)
}

/// Split `k1=v1,k2=v2` (or a list of `k=v` entries) into ordered pairs
///
/// Either `=` or `:` separates key and value; only the first separator
/// counts so values may contain further colons.
pub fn parse_search_by(value: &ParamValue) -> Result<Vec<(String, String)>> {
    let mut pairs: Vec<(String, String)> = Vec::new();

    let entries: Vec<&str> = match value {
        ParamValue::Single(s) => s.split(',').collect(),
        ParamValue::Multiple(items) => items.iter().flat_map(|s| s.split(',')).collect(),
    };

    for entry in entries.into_iter().filter(|e| !e.trim().is_empty()) {
        let Some(idx) = entry.find(|c: char| c == '=' || c == ':') else {
            return Err(Error::bad_request(
                "Invalid search_by",
                format!("Search criteria '{entry}' must have the form key=value"),
                code::INVALID_SEARCH,
            ));
        };
        let key = entry[..idx].trim();
        if key.is_empty() {
            return Err(Error::bad_request(
                "Invalid search_by",
                format!("Search criteria '{entry}' has an empty field name"),
                code::INVALID_SEARCH,
            ));
        }
        let val = entry[idx + 1..].trim().to_string();
        pairs.retain(|(k, _)| k != key);
        pairs.push((key.to_string(), val));
    }

    Ok(pairs)
}

/// Split `a,b` (or a list) into an ordered, duplicate-free field list
pub fn parse_filter(value: &ParamValue) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    for item in value.values() {
        for field in item.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            if !fields.iter().any(|f| f == field) {
                fields.push(field.to_string());
            }
        }
    }
    fields
}

/// Parse `limit`, applying the policy default and ceiling
pub fn parse_limit(value: Option<&str>, limits: LimitPolicy) -> Result<usize> {
    let Some(raw) = value else {
        return Ok(limits.default);
    };

    let limit: i64 = raw.trim().parse().map_err(|_| {
        Error::invalid_parameter("Limit must be an int value", code::INVALID_LIMIT)
    })?;

    if limit <= 0 {
        return Err(Error::invalid_parameter(
            "Limit must be a positive int value",
            code::INVALID_LIMIT,
        ));
    }

    Ok((limit as usize).min(limits.max))
}

/// Parse a date-time bound in any accepted notation
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn parse_date_ranges(raw: &RawQuery) -> Result<Vec<DateRange>> {
    let mut ranges: Vec<DateRange> = Vec::new();

    for key in raw.keys() {
        let (field, is_start) = if let Some(field) = key.strip_suffix(SINCE_SUFFIX) {
            (field, true)
        } else if let Some(field) = key.strip_suffix(TO_SUFFIX) {
            (field, false)
        } else {
            continue;
        };
        if field.is_empty() {
            continue;
        }

        let value = raw.first(key).unwrap_or_default();
        let bound = parse_datetime(value).ok_or_else(|| {
            Error::bad_request(
                "Invalid Date",
                format!("'{key}' must be a date or date-time, got '{value}'"),
                code::INVALID_DATE,
            )
        })?;

        let idx = match ranges.iter().position(|r| r.field == field) {
            Some(idx) => idx,
            None => {
                ranges.push(DateRange {
                    field: field.to_string(),
                    start: None,
                    end: None,
                });
                ranges.len() - 1
            }
        };
        if is_start {
            ranges[idx].start = Some(bound);
        } else {
            ranges[idx].end = Some(bound);
        }
    }

    Ok(ranges)
}
