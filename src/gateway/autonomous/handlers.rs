//! Autonomous route handlers

use super::transform::{
    affected_ips as collect_affected, normalize_xml_encoding, symptom_view, tal_summaries,
    tal_symptom, tal_view, with_action_status, AFFECTED_FIELDS, SYMPTOM_FIELDS,
};
use super::AutonomousGateway;
use crate::error::{Error, Result};
use crate::http::RequestConfig;
use crate::pagination::PageResult;
use crate::projection::Projection;
use crate::query::{normalize, LimitPolicy, QuerySpec, RawQuery};
use crate::server::RequestUri;
use crate::types::{JsonValue, SortOrder};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

type Gateway = State<Arc<AutonomousGateway>>;

fn envelope(page: PageResult, key: &str) -> Json<JsonValue> {
    Json(JsonValue::Object(page.into_envelope(key)))
}

fn symptoms_spec(raw: &RawQuery) -> Result<QuerySpec> {
    normalize(raw, LimitPolicy::SYMPTOMS)
}

// ============================================================================
// Symptoms
// ============================================================================

impl AutonomousGateway {
    /// Listing entries: the narrow symptom fields only
    async fn symptom_summaries(&self, spec: QuerySpec, uri: &RequestUri) -> Result<Json<JsonValue>> {
        let projection = Projection::new("id").fields(SYMPTOM_FIELDS);
        let page = self.symptoms.find(&spec, &projection, uri.as_str()).await?;
        Ok(envelope(page.map_items(|r| symptom_view(&r)), "symptoms"))
    }

    async fn affected(&self, spec: QuerySpec, uri: &RequestUri) -> Result<Json<JsonValue>> {
        let projection = Projection::new("id").fields(AFFECTED_FIELDS);
        let page = self.symptoms.find(&spec, &projection, uri.as_str()).await?;
        let affected = collect_affected(&page.items);
        Ok(Json(JsonValue::Object(
            page.envelope_with("affected_ips", JsonValue::Object(affected)),
        )))
    }
}

pub(super) async fn list_symptoms(
    State(gw): Gateway,
    uri: RequestUri,
    raw: RawQuery,
) -> Result<Json<JsonValue>> {
    gw.symptom_summaries(symptoms_spec(&raw)?, &uri).await
}

pub(super) async fn symptoms_of_type(
    State(gw): Gateway,
    uri: RequestUri,
    raw: RawQuery,
    Path(symptom_type): Path<String>,
) -> Result<Json<JsonValue>> {
    let spec = symptoms_spec(&raw)?.and_search("symptom_id", symptom_type);
    gw.symptom_summaries(spec, &uri).await
}

/// Full symptom documents; the first carries its action statuses
pub(super) async fn symptom_by_hash(
    State(gw): Gateway,
    uri: RequestUri,
    raw: RawQuery,
    Path((symptom_type, hash)): Path<(String, String)>,
) -> Result<Json<JsonValue>> {
    let spec = symptoms_spec(&raw)?
        .and_search("symptom_id", symptom_type)
        .and_search("hash", hash);
    let page = gw
        .symptoms
        .find(&spec, &Projection::new("id"), uri.as_str())
        .await?;

    let items = page
        .items
        .iter()
        .enumerate()
        .map(|(i, record)| {
            if i == 0 {
                symptom_view(&with_action_status(record))
            } else {
                symptom_view(record)
            }
        })
        .collect();
    Ok(envelope(page.with_items(items), "symptoms"))
}

pub(super) async fn affected_ips(
    State(gw): Gateway,
    uri: RequestUri,
    raw: RawQuery,
) -> Result<Json<JsonValue>> {
    gw.affected(symptoms_spec(&raw)?, &uri).await
}

pub(super) async fn affected_ips_of_type(
    State(gw): Gateway,
    uri: RequestUri,
    raw: RawQuery,
    Path(symptom_type): Path<String>,
) -> Result<Json<JsonValue>> {
    let spec = symptoms_spec(&raw)?.and_search("symptom_id", symptom_type);
    gw.affected(spec, &uri).await
}

// ============================================================================
// TAL
// ============================================================================

pub(super) async fn list_tals(
    State(gw): Gateway,
    uri: RequestUri,
    raw: RawQuery,
) -> Result<Json<JsonValue>> {
    let spec = symptoms_spec(&raw)?;
    let page = gw
        .tals
        .find(&spec, &Projection::new("id"), uri.as_str())
        .await?;

    let statuses: JsonValue = gw.tal_engine.get_json("", RequestConfig::new()).await?;
    let summaries = tal_summaries(&page.items, &statuses);
    Ok(Json(JsonValue::Object(
        page.envelope_with("tal", JsonValue::Array(summaries)),
    )))
}

/// The TAL reacting to a symptom
pub(super) async fn get_tal(
    State(gw): Gateway,
    raw: RawQuery,
    Path(tal_id): Path<String>,
) -> Result<Json<JsonValue>> {
    let spec = symptoms_spec(&raw)?;
    let request = gw.tals.request(&spec)?.order(SortOrder::Descending);
    let documents = gw.tals.all(request).await?;

    let document = documents
        .iter()
        .find(|d| tal_symptom(d) == Some(tal_id.as_str()))
        .ok_or_else(|| Error::not_found(format!("TAL {tal_id}")))?;
    Ok(Json(json!({ "tal": tal_view(document) })))
}

pub(super) async fn create_tal(State(gw): Gateway, body: Bytes) -> Result<StatusCode> {
    let script = std::str::from_utf8(&body).map_err(|_| Error::InvalidBody {
        description: "TAL script must be UTF-8 text".into(),
    })?;
    let script = normalize_xml_encoding(script);

    gw.tal_service
        .post("", RequestConfig::new().text("application/xml", script.into_owned()))
        .await?;
    info!("TAL script submitted");
    Ok(StatusCode::CREATED)
}

pub(super) async fn delete_tal(
    State(gw): Gateway,
    Path(tal_id): Path<String>,
) -> Result<StatusCode> {
    gw.tal_service.delete(&tal_id, RequestConfig::new()).await?;
    info!(tal_id = %tal_id, "TAL deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Intelligence
// ============================================================================

pub(super) async fn list_models(
    State(gw): Gateway,
    uri: RequestUri,
    raw: RawQuery,
) -> Result<Json<JsonValue>> {
    let spec = normalize(&raw, LimitPolicy::DOCUMENTS)?;
    let projection = gw.models.projection(&spec);
    let page = gw.models.find(&spec, &projection, uri.as_str()).await?;
    Ok(envelope(page, "intelligence_models"))
}
