//! Identity route handlers

use super::transform::{
    global_roles, object_at, objects_at, password_auth, role_from_keystone, session_from_token,
    tenant_from_domain, user_from_keystone, validated_session,
};
use super::IdentityGateway;
use crate::auth::AuthContext;
use crate::error::{Error, Result};
use crate::gateway::target;
use crate::server::{parse_body, BodySchema, Field, FieldKind, RequestUri};
use crate::types::{without_nulls, JsonObject, JsonValue, StringMap};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

type Gateway = State<Arc<IdentityGateway>>;

const TENANT: &str = "Tenant";
const USER: &str = "User";
const ROLE: &str = "Role";

const ROLE_REF: &[Field] = &[Field::required("id", FieldKind::String)];

const LOGIN_BODY: BodySchema = BodySchema::new(
    "auth",
    &[
        Field::required("username", FieldKind::String),
        Field::required("password", FieldKind::String),
        Field::required("tenant", FieldKind::String),
    ],
);

const TENANT_CREATE: BodySchema = BodySchema::new(
    "tenant",
    &[
        Field::required("name", FieldKind::String),
        Field::optional("description", FieldKind::String),
    ],
);

const TENANT_UPDATE: BodySchema = BodySchema::new(
    "tenant",
    &[
        Field::optional("name", FieldKind::String),
        Field::optional("description", FieldKind::String),
        Field::optional("enabled", FieldKind::Boolean),
    ],
);

const USER_CREATE: BodySchema = BodySchema::new(
    "user",
    &[
        Field::required("username", FieldKind::String),
        Field::required("password", FieldKind::String),
        Field::required("role", FieldKind::Object(ROLE_REF)),
        Field::optional("description", FieldKind::String),
        Field::optional("enabled", FieldKind::Boolean),
    ],
);

const USER_UPDATE: BodySchema = BodySchema::new(
    "user",
    &[
        Field::optional("username", FieldKind::String),
        Field::optional("password", FieldKind::String),
        Field::optional("role", FieldKind::Object(ROLE_REF)),
        Field::optional("description", FieldKind::String),
        Field::optional("enabled", FieldKind::Boolean),
    ],
);

const ROLE_CREATE: BodySchema =
    BodySchema::new("role", &[Field::required("name", FieldKind::String)]);

fn child_href(uri: &RequestUri, object: &JsonObject) -> String {
    let id = object.get("id").and_then(JsonValue::as_str).unwrap_or_default();
    format!("{}/{id}", uri.path())
}

// ============================================================================
// Session
// ============================================================================

pub async fn login(State(gw): Gateway, body: Bytes) -> Result<Response> {
    let auth = parse_body(&body, &LOGIN_BODY)?;
    let request = password_auth(&auth);

    let response = gw
        .keystone
        .post("auth/tokens", crate::http::RequestConfig::new().json(request))
        .await?;
    let subject = response
        .headers()
        .get("X-Subject-Token")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
        .ok_or_else(|| Error::Other("Keystone issued no subject token".into()))?;

    let body: JsonValue = gw.keystone.read_json(response).await?;
    let session = session_from_token(&body)?;
    info!(
        user = ?session.get("user").and_then(|u| u.get("id")),
        "user successfully logged"
    );

    Ok((
        StatusCode::CREATED,
        [("X-Subject-Token", subject)],
        Json(json!({ "session": session })),
    )
        .into_response())
}

pub async fn validate_token(Extension(ctx): Extension<AuthContext>) -> Json<JsonValue> {
    Json(validated_session(&ctx))
}

// ============================================================================
// Tenants
// ============================================================================

pub async fn list_tenants(
    State(gw): Gateway,
    Extension(ctx): Extension<AuthContext>,
    uri: RequestUri,
) -> Result<Json<JsonValue>> {
    gw.policy.enforce(&ctx, TENANT, "default", &StringMap::new())?;

    let body: JsonValue = gw
        .keystone
        .get_json("domains", IdentityGateway::as_caller(&ctx))
        .await?;

    let tenants: Vec<JsonObject> = objects_at(&body, "domains")
        .into_iter()
        .map(|domain| {
            let href = child_href(&uri, &domain);
            tenant_from_domain(domain, href)
        })
        .collect();

    let mut links = body
        .get("links")
        .and_then(JsonValue::as_object)
        .cloned()
        .unwrap_or_default();
    links.insert("self".into(), JsonValue::String(uri.0));

    Ok(Json(json!({ "tenants": tenants, "links": links })))
}

pub async fn get_tenant(
    State(gw): Gateway,
    Extension(ctx): Extension<AuthContext>,
    Path(tenant_id): Path<String>,
    uri: RequestUri,
) -> Result<Json<JsonValue>> {
    gw.policy
        .enforce(&ctx, TENANT, "default", &target(&[("tenant_id", &tenant_id)]))?;

    let body: JsonValue = gw
        .keystone
        .get_json(&format!("domains/{tenant_id}"), IdentityGateway::as_caller(&ctx))
        .await?;
    let tenant = tenant_from_domain(object_at(&body, "domain")?, uri.0);
    Ok(Json(json!({ "tenant": tenant })))
}

pub async fn create_tenant(
    State(gw): Gateway,
    Extension(ctx): Extension<AuthContext>,
    uri: RequestUri,
    body: Bytes,
) -> Result<Response> {
    gw.policy.enforce(&ctx, TENANT, "default", &StringMap::new())?;
    let data = parse_body(&body, &TENANT_CREATE)?;

    let domain = json!({
        "domain": {
            "name": data.get("name"),
            "enabled": true,
            "description": data.get("description"),
        }
    });
    let body: JsonValue = gw
        .keystone
        .request_json(Method::POST, "domains", IdentityGateway::as_caller(&ctx).json(domain))
        .await?;

    let tenant = object_at(&body, "domain")?;
    let href = child_href(&uri, &tenant);
    info!(tenant = ?tenant.get("id"), "tenant created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "tenant": tenant_from_domain(tenant, href) })),
    )
        .into_response())
}

pub async fn update_tenant(
    State(gw): Gateway,
    Extension(ctx): Extension<AuthContext>,
    Path(tenant_id): Path<String>,
    uri: RequestUri,
    body: Bytes,
) -> Result<Json<JsonValue>> {
    gw.policy
        .enforce(&ctx, TENANT, "default", &target(&[("tenant_id", &tenant_id)]))?;
    let data = parse_body(&body, &TENANT_UPDATE)?;

    let body: JsonValue = gw
        .keystone
        .request_json(
            Method::PATCH,
            &format!("domains/{tenant_id}"),
            IdentityGateway::as_caller(&ctx).json(json!({ "domain": without_nulls(data) })),
        )
        .await?;
    let tenant = tenant_from_domain(object_at(&body, "domain")?, uri.0);
    Ok(Json(json!({ "tenant": tenant })))
}

/// Keystone refuses to delete enabled domains, so disable first
pub async fn delete_tenant(
    State(gw): Gateway,
    Extension(ctx): Extension<AuthContext>,
    Path(tenant_id): Path<String>,
) -> Result<StatusCode> {
    gw.policy
        .enforce(&ctx, TENANT, "default", &target(&[("tenant_id", &tenant_id)]))?;

    let endpoint = format!("domains/{tenant_id}");
    gw.keystone
        .patch(
            &endpoint,
            IdentityGateway::as_caller(&ctx).json(json!({ "domain": { "enabled": false } })),
        )
        .await?;
    gw.keystone
        .delete(&endpoint, IdentityGateway::as_caller(&ctx))
        .await?;

    info!(tenant = %tenant_id, "tenant deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Users
// ============================================================================

impl IdentityGateway {
    /// The user's role in a tenant; absent when Keystone will not say
    async fn user_role(&self, ctx: &AuthContext, tenant_id: &str, user_id: &str) -> Result<Option<JsonValue>> {
        let response = self
            .keystone
            .probe(
                Method::GET,
                &format!("domains/{tenant_id}/users/{user_id}/roles"),
                Self::as_caller(ctx),
            )
            .await?;
        if response.status() != StatusCode::OK {
            return Ok(None);
        }
        let body: JsonValue = self.keystone.read_json(response).await?;
        Ok(objects_at(&body, "roles")
            .first()
            .map(|role| json!({ "id": role.get("id"), "name": role.get("name") })))
    }

    async fn convert_user(&self, ctx: &AuthContext, user: JsonObject, self_href: String) -> Result<JsonObject> {
        let tenant = user.get("domain_id").and_then(JsonValue::as_str).unwrap_or_default().to_string();
        let id = user.get("id").and_then(JsonValue::as_str).unwrap_or_default().to_string();
        let role = self.user_role(ctx, &tenant, &id).await?;
        Ok(user_from_keystone(user, role, self_href))
    }

    /// Fails with 404 when the role does not exist
    async fn check_role(&self, ctx: &AuthContext, role_id: &str) -> Result<()> {
        self.keystone
            .get(&format!("roles/{role_id}"), Self::as_caller(ctx))
            .await?;
        Ok(())
    }

    async fn assign_role(&self, ctx: &AuthContext, tenant_id: &str, user_id: &str, role_id: &str) -> Result<()> {
        self.keystone
            .put(
                &format!("domains/{tenant_id}/users/{user_id}/roles/{role_id}"),
                Self::as_caller(ctx),
            )
            .await?;
        Ok(())
    }
}

fn role_id(data: &JsonObject) -> Option<String> {
    data.get("role")
        .and_then(|r| r.get("id"))
        .and_then(JsonValue::as_str)
        .map(ToString::to_string)
}

pub async fn list_users(
    State(gw): Gateway,
    Extension(ctx): Extension<AuthContext>,
    Path(tenant_id): Path<String>,
    uri: RequestUri,
) -> Result<Json<JsonValue>> {
    let body: JsonValue = gw
        .keystone
        .get_json(
            "users",
            IdentityGateway::as_caller(&ctx).query("domain_id", tenant_id.as_str()),
        )
        .await?;

    let mut users = Vec::new();
    for user in objects_at(&body, "users") {
        let href = child_href(&uri, &user);
        users.push(gw.convert_user(&ctx, user, href).await?);
    }
    Ok(Json(json!({ "users": users })))
}

pub async fn get_user(
    State(gw): Gateway,
    Extension(ctx): Extension<AuthContext>,
    Path((_tenant_id, user_id)): Path<(String, String)>,
    uri: RequestUri,
) -> Result<Json<JsonValue>> {
    let body: JsonValue = gw
        .keystone
        .get_json(&format!("users/{user_id}"), IdentityGateway::as_caller(&ctx))
        .await?;
    let user = gw.convert_user(&ctx, object_at(&body, "user")?, uri.0).await?;
    Ok(Json(json!({ "user": user })))
}

pub async fn create_user(
    State(gw): Gateway,
    Extension(ctx): Extension<AuthContext>,
    Path(tenant_id): Path<String>,
    uri: RequestUri,
    body: Bytes,
) -> Result<Response> {
    gw.policy
        .enforce(&ctx, USER, "create", &target(&[("tenant_id", &tenant_id)]))?;
    let data = parse_body(&body, &USER_CREATE)?;
    let role = role_id(&data).unwrap_or_default();

    gw.check_role(&ctx, &role).await?;

    let request = json!({
        "user": {
            "description": data.get("description"),
            "name": data.get("username"),
            "password": data.get("password"),
            "enabled": data.get("enabled").cloned().unwrap_or(JsonValue::Bool(true)),
            "domain_id": tenant_id,
        }
    });
    let body: JsonValue = gw
        .keystone
        .request_json(Method::POST, "users", IdentityGateway::as_caller(&ctx).json(request))
        .await?;

    let mut user = gw.convert_user(&ctx, object_at(&body, "user")?, uri.0).await?;
    let user_id = user.get("id").and_then(JsonValue::as_str).unwrap_or_default().to_string();
    gw.assign_role(&ctx, &tenant_id, &user_id, &role).await?;
    user.insert("role".into(), json!({ "id": role }));

    info!(user = %user_id, tenant = %tenant_id, "user created");
    Ok((StatusCode::CREATED, Json(json!({ "user": user }))).into_response())
}

pub async fn update_user(
    State(gw): Gateway,
    Extension(ctx): Extension<AuthContext>,
    Path((tenant_id, user_id)): Path<(String, String)>,
    uri: RequestUri,
    body: Bytes,
) -> Result<Json<JsonValue>> {
    gw.policy.enforce(
        &ctx,
        USER,
        "update",
        &target(&[("tenant_id", &tenant_id), ("user_id", &user_id)]),
    )?;
    let data = parse_body(&body, &USER_UPDATE)?;

    let mut patch = JsonObject::new();
    for (from, to) in [
        ("description", "description"),
        ("username", "name"),
        ("enabled", "enabled"),
        ("password", "password"),
    ] {
        if let Some(value) = data.get(from).filter(|v| !v.is_null()) {
            patch.insert(to.into(), value.clone());
        }
    }

    let body: JsonValue = gw
        .keystone
        .request_json(
            Method::PATCH,
            &format!("users/{user_id}"),
            IdentityGateway::as_caller(&ctx).json(json!({ "user": patch })),
        )
        .await?;
    let mut user = gw.convert_user(&ctx, object_at(&body, "user")?, uri.0).await?;

    let Some(new_role) = role_id(&data) else {
        return Ok(Json(json!({ "user": user })));
    };

    gw.check_role(&ctx, &new_role).await?;
    if let Some(old_role) = role_id(&user) {
        gw.keystone
            .delete(
                &format!("domains/{tenant_id}/users/{user_id}/roles/{old_role}"),
                IdentityGateway::as_caller(&ctx),
            )
            .await?;
    }
    gw.assign_role(&ctx, &tenant_id, &user_id, &new_role).await?;
    user.insert("role".into(), json!({ "id": new_role }));

    Ok(Json(json!({ "user": user })))
}

pub async fn delete_user(
    State(gw): Gateway,
    Extension(ctx): Extension<AuthContext>,
    Path((tenant_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    gw.policy.enforce(
        &ctx,
        USER,
        "delete",
        &target(&[("tenant_id", &tenant_id), ("user_id", &user_id)]),
    )?;
    gw.keystone
        .delete(&format!("users/{user_id}"), IdentityGateway::as_caller(&ctx))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Roles
// ============================================================================

pub async fn list_roles(
    State(gw): Gateway,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<JsonValue>> {
    gw.policy.enforce(&ctx, ROLE, "list", &StringMap::new())?;
    let body: JsonValue = gw
        .keystone
        .get_json("roles", IdentityGateway::as_caller(&ctx))
        .await?;
    Ok(Json(json!({ "roles": global_roles(objects_at(&body, "roles")) })))
}

pub async fn get_role(
    State(gw): Gateway,
    Extension(ctx): Extension<AuthContext>,
    Path(role_id): Path<String>,
) -> Result<Json<JsonValue>> {
    gw.policy
        .enforce(&ctx, ROLE, "list", &target(&[("role_id", &role_id)]))?;
    let body: JsonValue = gw
        .keystone
        .get_json(&format!("roles/{role_id}"), IdentityGateway::as_caller(&ctx))
        .await?;
    Ok(Json(json!({ "role": role_from_keystone(object_at(&body, "role")?) })))
}

pub async fn create_role(
    State(gw): Gateway,
    Extension(ctx): Extension<AuthContext>,
    body: Bytes,
) -> Result<Response> {
    gw.policy.enforce(&ctx, ROLE, "default", &StringMap::new())?;
    let data = parse_body(&body, &ROLE_CREATE)?;

    let body: JsonValue = gw
        .keystone
        .request_json(
            Method::POST,
            "roles",
            IdentityGateway::as_caller(&ctx).json(json!({ "role": data })),
        )
        .await?;
    let role = role_from_keystone(object_at(&body, "role")?);
    Ok((StatusCode::CREATED, Json(json!({ "role": role }))).into_response())
}

pub async fn delete_role(
    State(gw): Gateway,
    Extension(ctx): Extension<AuthContext>,
    Path(role_id): Path<String>,
) -> Result<StatusCode> {
    gw.policy
        .enforce(&ctx, ROLE, "default", &target(&[("role_id", &role_id)]))?;
    gw.keystone
        .delete(&format!("roles/{role_id}"), IdentityGateway::as_caller(&ctx))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
