//! Keystone object reshaping
//!
//! Pure functions: each takes the Keystone representation and returns the
//! gateway's, never touching the network.

use crate::auth::AuthContext;
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use serde_json::json;

/// Object stored under `key` in a Keystone response
pub fn object_at(body: &JsonValue, key: &str) -> Result<JsonObject> {
    body.get(key)
        .and_then(JsonValue::as_object)
        .cloned()
        .ok_or_else(|| Error::Other(format!("Keystone response has no '{key}' object")))
}

/// Objects stored under `key` in a Keystone list response
pub fn objects_at(body: &JsonValue, key: &str) -> Vec<JsonObject> {
    body.get(key)
        .and_then(JsonValue::as_array)
        .map(|items| items.iter().filter_map(|i| i.as_object().cloned()).collect())
        .unwrap_or_default()
}

fn set_self_link(object: &mut JsonObject, href: String) {
    match object.get_mut("links").and_then(JsonValue::as_object_mut) {
        Some(links) => {
            links.insert("self".into(), JsonValue::String(href));
        }
        None => {
            object.insert("links".into(), json!({ "self": href }));
        }
    }
}

/// Session from a Keystone `auth/tokens` response
///
/// The user's domain becomes their `tenant`, the first role becomes their
/// `role`; catalog, methods and domain are dropped.
pub fn session_from_token(body: &JsonValue) -> Result<JsonObject> {
    let mut token = object_at(body, "token")?;

    let mut user = token
        .get("user")
        .and_then(JsonValue::as_object)
        .cloned()
        .unwrap_or_default();
    let domain = user.remove("domain").unwrap_or(JsonValue::Null);
    user.insert(
        "tenant".into(),
        json!({ "id": domain.get("id"), "name": domain.get("name") }),
    );

    let role = token
        .remove("roles")
        .and_then(|roles| roles.as_array().and_then(|r| r.first().cloned()))
        .unwrap_or(JsonValue::Null);
    user.insert("role".into(), role);
    token.insert("user".into(), JsonValue::Object(user));

    for key in ["catalog", "methods", "domain"] {
        token.remove(key);
    }
    Ok(token)
}

/// Session describing an already validated caller
pub fn validated_session(ctx: &AuthContext) -> JsonValue {
    json!({
        "session": {
            "user": {
                "id": ctx.user_id,
                "name": ctx.user_name,
                "tenant": { "id": ctx.tenant_id, "name": ctx.tenant_name },
                "role": { "name": ctx.roles.first() },
            }
        }
    })
}

/// Tenant from a Keystone domain
pub fn tenant_from_domain(mut domain: JsonObject, self_href: String) -> JsonObject {
    set_self_link(&mut domain, self_href);
    domain
}

/// User from a Keystone user, with their role in the tenant when known
pub fn user_from_keystone(
    mut user: JsonObject,
    role: Option<JsonValue>,
    self_href: String,
) -> JsonObject {
    if let Some(role) = role {
        user.insert("role".into(), role);
    }
    set_self_link(&mut user, self_href);
    for key in ["domain_id", "extra", "password_expires_at"] {
        user.remove(key);
    }
    let name = user.remove("name").unwrap_or(JsonValue::Null);
    user.insert("username".into(), name);
    user
}

/// Role without Keystone bookkeeping
pub fn role_from_keystone(mut role: JsonObject) -> JsonObject {
    role.remove("links");
    role.remove("domain_id");
    role
}

/// Cross-domain roles only
pub fn global_roles(roles: Vec<JsonObject>) -> Vec<JsonObject> {
    roles
        .into_iter()
        .filter(|r| r.get("domain_id").map_or(true, JsonValue::is_null))
        .map(role_from_keystone)
        .collect()
}

/// Keystone password authentication scoped to the user's domain
pub fn password_auth(credentials: &JsonObject) -> JsonValue {
    let domain = json!({ "name": credentials.get("tenant") });
    let username = credentials.get("username");
    let password = credentials.get("password");
    json!({
        "auth": {
            "identity": {
                "methods": ["password"],
                "password": {
                    "user": { "name": username, "password": password, "domain": domain }
                }
            },
            "scope": { "domain": domain }
        }
    })
}
