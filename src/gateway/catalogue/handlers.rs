//! Catalogue route handlers

use super::{facet_key, is_app_class, CatalogueGateway, PACKAGE_ACTIONS};
use crate::error::{code, Error, Result};
use crate::http::RequestConfig;
use crate::query::{parse_limit, LimitPolicy, RawQuery};
use crate::server::parse_json;
use crate::types::JsonValue;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

type Gateway = State<Arc<CatalogueGateway>>;

const PACKAGE_FIELD: &str = "file";
const APP_CLASS_PARAM: &str = "app-class";

fn no_package() -> Error {
    Error::bad_request("No Package", "No package provided as file", code::NO_PACKAGE)
}

pub(super) async fn list_packages(State(gw): Gateway, raw: RawQuery) -> Result<Json<JsonValue>> {
    if let Some(class) = raw.first(APP_CLASS_PARAM) {
        if !is_app_class(class) {
            info!(app_class = class, "unknown app class requested");
            return Err(Error::not_found(format!("app class {class}")));
        }
    }
    if let Some(limit) = raw.first("limit") {
        parse_limit(Some(limit), LimitPolicy::DOCUMENTS)?;
    }

    let ids: JsonValue = gw
        .catalogue
        .get_json("ids", RequestConfig::new().query_pairs(raw.pairs().clone()))
        .await?;
    Ok(Json(json!({ "app": ids })))
}

pub(super) async fn get_package(
    State(gw): Gateway,
    Path(package_id): Path<String>,
) -> Result<Json<JsonValue>> {
    let app: JsonValue = gw.catalogue.get_json(&package_id, RequestConfig::new()).await?;
    Ok(Json(json!({ "app": app })))
}

/// One facet of a package; an empty catalogue answer reads as `{}`
pub(super) async fn package_facet(
    State(gw): Gateway,
    Path((package_id, facet)): Path<(String, String)>,
) -> Result<Json<JsonValue>> {
    let key = facet_key(&facet).ok_or_else(|| Error::not_found(format!("package facet {facet}")))?;

    let url = format!("{package_id}/{}", facet.to_ascii_lowercase());
    let value: JsonValue = gw.catalogue.get_json(&url, RequestConfig::new()).await?;
    let value = if value.is_null() { json!({}) } else { value };

    let mut body = serde_json::Map::new();
    body.insert(key, value);
    Ok(Json(JsonValue::Object(body)))
}

/// Forward the multipart `file` field to the catalogue
pub(super) async fn upload_package(
    State(gw): Gateway,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<JsonValue>)> {
    let mut multipart = multipart.map_err(|_| no_package())?;

    let mut package: Option<(String, Bytes)> = None;
    while let Some(field) = multipart.next_field().await.map_err(|_| no_package())? {
        if field.name() != Some(PACKAGE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("package").to_string();
        let bytes = field.bytes().await.map_err(|_| no_package())?;
        package = Some((file_name, bytes));
        break;
    }
    let (file_name, bytes) = package.ok_or_else(no_package)?;

    let response = gw
        .catalogue
        .post(
            "",
            RequestConfig::new().file(PACKAGE_FIELD, file_name.clone(), bytes.to_vec()),
        )
        .await?;
    let id = response.text().await?;
    info!(file = %file_name, size = bytes.len(), "package uploaded");

    Ok((StatusCode::CREATED, Json(json!({ "app": { "id": id } }))))
}

/// Replace a package's metadata with the body's `app` object
pub(super) async fn update_package(
    State(gw): Gateway,
    Path(package_id): Path<String>,
    body: Bytes,
) -> Result<StatusCode> {
    let missing = || {
        Error::bad_request(
            "No data",
            "No data provided to update package",
            code::NO_UPDATE_DATA,
        )
    };
    if body.is_empty() {
        return Err(missing());
    }
    let app = parse_json(&body)?
        .get("app")
        .cloned()
        .ok_or_else(missing)?;

    gw.catalogue
        .put(&package_id, RequestConfig::new().json(app))
        .await?;
    info!(package_id = %package_id, "package updated");
    Ok(StatusCode::OK)
}

/// `enable` or `disable` a package
pub(super) async fn package_action(
    State(gw): Gateway,
    Path((package_id, action)): Path<(String, String)>,
) -> Result<StatusCode> {
    let action = action.to_ascii_lowercase();
    if !PACKAGE_ACTIONS.contains(&action.as_str()) {
        return Err(Error::not_found(format!("package action {action}")));
    }

    gw.catalogue
        .put(
            &format!("{package_id}/action"),
            RequestConfig::new().query("status", action.as_str()),
        )
        .await?;
    info!(package_id = %package_id, action = %action, "package status changed");
    Ok(StatusCode::OK)
}

pub(super) async fn delete_package(
    State(gw): Gateway,
    Path(package_id): Path<String>,
) -> Result<StatusCode> {
    gw.catalogue
        .delete(&package_id, RequestConfig::new())
        .await?;
    info!(package_id = %package_id, "package deleted");
    Ok(StatusCode::NO_CONTENT)
}
