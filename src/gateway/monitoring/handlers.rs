//! Monitoring route handlers

use super::transform::{self, dimensions};
use super::MonitoringGateway;
use crate::error::{code, Error, Result};
use crate::pagination::rewrite_backend_links;
use crate::query::RawQuery;
use crate::server::RequestUri;
use crate::types::{JsonObject, JsonValue};
use axum::extract::{Path, State};
use axum::Json;
use chrono::{Duration, SecondsFormat, Utc};
use serde_json::json;
use std::sync::Arc;

type Gateway = State<Arc<MonitoringGateway>>;

const DEFAULT_ALARM_LIMIT: &str = "5";
const FLOW_GROUPING: &str = "SourceIP,DestinationIP,DestinationPort,FlowID";

const MEASUREMENTS: &str = "metrics/measurements";
const METRIC_NAMES: &str = "metrics/names";

/// `{key: items, links}` with Monasca's links pointing back at the gateway
fn paged(
    key: &str,
    items: Vec<JsonValue>,
    body: &JsonValue,
    uri: &RequestUri,
    raw: &RawQuery,
) -> Json<JsonValue> {
    let links = rewrite_backend_links(body.get("links"), uri.as_str(), raw);
    let mut envelope = JsonObject::new();
    envelope.insert(key.to_string(), JsonValue::Array(items));
    envelope.insert("links".into(), json!(links));
    Json(JsonValue::Object(envelope))
}

// ============================================================================
// Alarms
// ============================================================================

pub(super) async fn list_alarms(
    State(gw): Gateway,
    uri: RequestUri,
    raw: RawQuery,
) -> Result<Json<JsonValue>> {
    let query = if raw.contains("limit") {
        raw.clone()
    } else {
        raw.with("limit", DEFAULT_ALARM_LIMIT)
    };
    let body = gw.fetch("alarms", query.pairs().clone()).await?;
    Ok(paged("alarms", transform::alarms(&body), &body, &uri, &raw))
}

pub(super) async fn get_alarm(
    State(gw): Gateway,
    Path(alarm_id): Path<String>,
    raw: RawQuery,
) -> Result<Json<JsonValue>> {
    let body = gw
        .fetch(&format!("alarms/{alarm_id}"), raw.pairs().clone())
        .await?;
    let alarm = body
        .as_object()
        .ok_or_else(|| Error::not_found(format!("Alarm {alarm_id}")))?;
    Ok(Json(JsonValue::Object(transform::single_alarm(alarm))))
}

pub(super) async fn get_alarm_definition(
    State(gw): Gateway,
    Path(definition_id): Path<String>,
) -> Result<Json<JsonValue>> {
    let body = gw
        .fetch(&format!("alarm-definitions/{definition_id}"), Vec::new())
        .await?;
    Ok(Json(json!({ "definition": transform::definition(&body) })))
}

// ============================================================================
// Flows
// ============================================================================

pub(super) async fn flows_from(
    State(gw): Gateway,
    uri: RequestUri,
    raw: RawQuery,
    Path(source): Path<String>,
) -> Result<Json<JsonValue>> {
    flows(&gw, &uri, &raw, &[("SourceIP", source.as_str())]).await
}

pub(super) async fn flows_to(
    State(gw): Gateway,
    uri: RequestUri,
    raw: RawQuery,
    Path((source, destination_ip)): Path<(String, String)>,
) -> Result<Json<JsonValue>> {
    let dims = [("SourceIP", source.as_str()), ("DestinationIP", destination_ip.as_str())];
    flows(&gw, &uri, &raw, &dims).await
}

pub(super) async fn flows_to_port(
    State(gw): Gateway,
    uri: RequestUri,
    raw: RawQuery,
    Path((source, destination_ip, destination_port)): Path<(String, String, String)>,
) -> Result<Json<JsonValue>> {
    let dims = [
        ("SourceIP", source.as_str()),
        ("DestinationIP", destination_ip.as_str()),
        ("DestinationPort", destination_port.as_str()),
    ];
    flows(&gw, &uri, &raw, &dims).await
}

async fn flows(
    gw: &MonitoringGateway,
    uri: &RequestUri,
    raw: &RawQuery,
    dims: &[(&str, &str)],
) -> Result<Json<JsonValue>> {
    let Some(metric) = raw.first("metric") else {
        return Err(Error::bad_request(
            "Missing Metric",
            "Missing metric name to collect metrics",
            code::MISSING_METRIC,
        ));
    };

    let mut query = RawQuery::from_pairs(raw.without(&["metric"]))
        .with("dimensions", dimensions(dims))
        .with("name", metric)
        .with("group_by", FLOW_GROUPING)
        .with("merge_metrics", "true");
    if !query.contains("start_time") {
        let since = Utc::now() - Duration::days(1);
        query = query.with("start_time", since.to_rfc3339_opts(SecondsFormat::Secs, true));
    }

    let body = gw.fetch(MEASUREMENTS, query.pairs().clone()).await?;
    Ok(paged("flows", transform::flows(&body), &body, uri, raw))
}

pub(super) async fn flow_metrics(
    State(gw): Gateway,
    uri: RequestUri,
    raw: RawQuery,
    Path(flow_id): Path<String>,
) -> Result<Json<JsonValue>> {
    let query = raw.with("dimensions", dimensions(&[("FlowID", flow_id.as_str())]));
    let body = gw.fetch(METRIC_NAMES, query.pairs().clone()).await?;
    let metrics = transform::elements(&body).to_vec();
    Ok(paged("metrics", metrics, &body, &uri, &raw))
}

// ============================================================================
// Metrics and measurements
// ============================================================================

pub(super) async fn flow_measurements(
    State(gw): Gateway,
    uri: RequestUri,
    raw: RawQuery,
    Path((flow_id, metric)): Path<(String, String)>,
) -> Result<Json<JsonValue>> {
    measurements(&gw, &uri, &raw, ("FlowID", flow_id.as_str()), &metric).await
}

pub(super) async fn vm_measurements(
    State(gw): Gateway,
    uri: RequestUri,
    raw: RawQuery,
    Path((instance_id, metric)): Path<(String, String)>,
) -> Result<Json<JsonValue>> {
    measurements(&gw, &uri, &raw, ("InstanceID", instance_id.as_str()), &metric).await
}

async fn measurements(
    gw: &MonitoringGateway,
    uri: &RequestUri,
    raw: &RawQuery,
    dimension: (&str, &str),
    metric: &str,
) -> Result<Json<JsonValue>> {
    let query = raw
        .with("dimensions", dimensions(&[dimension]))
        .with("name", metric);
    let body = gw.fetch(MEASUREMENTS, query.pairs().clone()).await?;
    Ok(paged("measurements", transform::measurements(&body), &body, uri, raw))
}

pub(super) async fn vm_metrics(
    State(gw): Gateway,
    uri: RequestUri,
    raw: RawQuery,
    Path(instance_id): Path<String>,
) -> Result<Json<JsonValue>> {
    let query = raw.with("dimensions", dimensions(&[("InstanceID", instance_id.as_str())]));
    let body = gw.fetch(METRIC_NAMES, query.pairs().clone()).await?;
    Ok(paged("metrics", transform::metric_names(&body), &body, &uri, &raw))
}

pub(super) async fn metric_measurements(
    State(gw): Gateway,
    uri: RequestUri,
    raw: RawQuery,
    Path(metric_name): Path<String>,
) -> Result<Json<JsonValue>> {
    let query = raw.with("name", metric_name);
    let body = gw.fetch(MEASUREMENTS, query.pairs().clone()).await?;
    Ok(paged("measurements", transform::measurements(&body), &body, &uri, &raw))
}
