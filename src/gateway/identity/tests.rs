//! Tests for the identity gateway

use super::transform::*;
use super::*;
use crate::config::PolicyConfig;
use crate::gateway::backend;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn object(value: Value) -> crate::types::JsonObject {
    value.as_object().cloned().unwrap()
}

async fn gateway(server: &MockServer) -> Router {
    let keystone = backend("Keystone", &server.uri(), Duration::from_secs(2)).unwrap();
    let policy = PolicyEnforcer::new(&PolicyConfig::default()).with_admin_tenant("default");
    IdentityGateway::new(keystone, policy).router()
}

fn as_admin(builder: axum::http::request::Builder, tenant: &str) -> axum::http::request::Builder {
    builder
        .header("host", "gw")
        .header("X-Auth-Token", "caller-token")
        .header("X-User-Id", "u0")
        .header("X-User-Name", "root")
        .header("X-User-Domain-Id", tenant)
        .header("X-Roles", "admin")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Transforms
// ============================================================================

#[test]
fn test_session_from_token() {
    let body = json!({
        "token": {
            "issued_at": "2017-05-01T10:00:00Z",
            "expires_at": "2017-05-01T11:00:00Z",
            "methods": ["password"],
            "catalog": [],
            "domain": {"id": "d1", "name": "acme"},
            "roles": [{"id": "r1", "name": "admin"}, {"id": "r2", "name": "member"}],
            "user": {"id": "u1", "name": "alice", "domain": {"id": "d1", "name": "acme"}}
        }
    });

    let session = session_from_token(&body).unwrap();
    assert_eq!(
        Value::Object(session),
        json!({
            "issued_at": "2017-05-01T10:00:00Z",
            "expires_at": "2017-05-01T11:00:00Z",
            "user": {
                "id": "u1",
                "name": "alice",
                "tenant": {"id": "d1", "name": "acme"},
                "role": {"id": "r1", "name": "admin"}
            }
        })
    );
}

#[test]
fn test_session_without_token_fails() {
    assert!(session_from_token(&json!({"error": {}})).is_err());
}

#[test]
fn test_validated_session_from_context() {
    let ctx = AuthContext {
        auth_token: "t".into(),
        user_id: Some("u1".into()),
        user_name: Some("alice".into()),
        tenant_id: Some("d1".into()),
        tenant_name: Some("acme".into()),
        roles: vec!["member".into()],
        ..AuthContext::default()
    };
    assert_eq!(
        validated_session(&ctx),
        json!({"session": {"user": {
            "id": "u1", "name": "alice",
            "tenant": {"id": "d1", "name": "acme"},
            "role": {"name": "member"}
        }}})
    );
}

#[test]
fn test_user_from_keystone() {
    let user = object(json!({
        "id": "u1",
        "name": "alice",
        "domain_id": "d1",
        "extra": {},
        "password_expires_at": null,
        "enabled": true,
        "links": {"self": "http://keystone/v3/users/u1"}
    }));
    let converted = user_from_keystone(
        user,
        Some(json!({"id": "r1", "name": "admin"})),
        "http://gw/tenants/d1/users/u1".into(),
    );
    assert_eq!(
        Value::Object(converted),
        json!({
            "id": "u1",
            "enabled": true,
            "links": {"self": "http://gw/tenants/d1/users/u1"},
            "role": {"id": "r1", "name": "admin"},
            "username": "alice"
        })
    );
}

#[test]
fn test_global_roles_only() {
    let roles = vec![
        object(json!({"id": "r1", "name": "admin", "domain_id": null, "links": {}})),
        object(json!({"id": "r2", "name": "local", "domain_id": "d1", "links": {}})),
    ];
    assert_eq!(
        global_roles(roles),
        vec![object(json!({"id": "r1", "name": "admin"}))]
    );
}

// ============================================================================
// Routes
// ============================================================================

#[tokio::test]
async fn test_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/tokens"))
        .and(body_partial_json(json!({"auth": {"scope": {"domain": {"name": "acme"}}}})))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("X-Subject-Token", "new-token")
                .set_body_json(json!({"token": {
                    "expires_at": "2017-05-01T11:00:00Z",
                    "catalog": [],
                    "roles": [{"id": "r1", "name": "admin"}],
                    "user": {"id": "u1", "name": "alice", "domain": {"id": "d1", "name": "acme"}}
                }})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = Request::post("/login")
        .body(Body::from(
            r#"{"auth": {"username": "alice", "password": "pw", "tenant": "acme"}}"#,
        ))
        .unwrap();
    let response = gateway(&server).await.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()["x-subject-token"], "new-token");
    let body = body_json(response).await;
    assert_eq!(body["session"]["user"]["tenant"], json!({"id": "d1", "name": "acme"}));
    assert!(body["session"].get("catalog").is_none());
}

#[tokio::test]
async fn test_login_invalid_body_never_reaches_keystone() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let request = Request::post("/login").body(Body::from("not json")).unwrap();
    let response = gateway(&server).await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "001");

    let request = Request::post("/login")
        .body(Body::from(r#"{"auth": {"username": "alice"}}"#))
        .unwrap();
    let response = gateway(&server).await.oneshot(request).await.unwrap();
    assert_eq!(body_json(response).await["code"], "002");
}

#[tokio::test]
async fn test_list_tenants_rewrites_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/domains"))
        .and(header("X-Auth-Token", "caller-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "domains": [{"id": "d1", "name": "acme", "links": {"self": "http://keystone/v3/domains/d1"}}],
            "links": {"self": "http://keystone/v3/domains", "next": null}
        })))
        .mount(&server)
        .await;

    let request = as_admin(Request::get("/tenants"), "default")
        .body(Body::empty())
        .unwrap();
    let response = gateway(&server).await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "tenants": [{"id": "d1", "name": "acme", "links": {"self": "http://gw/tenants/d1"}}],
            "links": {"self": "http://gw/tenants", "next": null}
        })
    );
}

#[tokio::test]
async fn test_policy_denial_never_reaches_keystone() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let request = Request::get("/tenants")
        .header("X-Auth-Token", "t")
        .header("X-Roles", "member")
        .body(Body::empty())
        .unwrap();
    let response = gateway(&server).await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["title"], "Permission Denied");
}

#[tokio::test]
async fn test_missing_token_is_401() {
    let server = MockServer::start().await;
    let response = gateway(&server)
        .await
        .oneshot(Request::get("/roles").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_user_assigns_role() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/roles/r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"role": {"id": "r1"}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .and(body_partial_json(json!({"user": {"name": "bob", "domain_id": "d1", "enabled": true}})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"user": {
            "id": "u2", "name": "bob", "domain_id": "d1", "enabled": true, "links": {}
        }})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/domains/d1/users/u2/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"roles": []})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/domains/d1/users/u2/roles/r1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let request = as_admin(Request::post("/tenants/d1/users"), "d1")
        .body(Body::from(
            r#"{"user": {"username": "bob", "password": "pw", "role": {"id": "r1"}}}"#,
        ))
        .unwrap();
    let response = gateway(&server).await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["user"]["username"], "bob");
    assert_eq!(body["user"]["role"], json!({"id": "r1"}));
    assert!(body["user"].get("domain_id").is_none());
}

#[tokio::test]
async fn test_tenant_admin_cannot_create_user_elsewhere() {
    let server = MockServer::start().await;
    let request = as_admin(Request::post("/tenants/d2/users"), "d1")
        .body(Body::from(
            r#"{"user": {"username": "bob", "password": "pw", "role": {"id": "r1"}}}"#,
        ))
        .unwrap();
    let response = gateway(&server).await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_list_users_with_roles() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("domain_id", "d1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"users": [
            {"id": "u1", "name": "alice", "domain_id": "d1", "links": {}},
            {"id": "u2", "name": "bob", "domain_id": "d1", "links": {}}
        ]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/domains/d1/users/u1/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"roles": [{"id": "r1", "name": "admin"}]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/domains/d1/users/u2/roles"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let request = as_admin(Request::get("/tenants/d1/users"), "d1")
        .body(Body::empty())
        .unwrap();
    let body = body_json(gateway(&server).await.oneshot(request).await.unwrap()).await;

    let users = body["users"].as_array().unwrap();
    assert_eq!(users[0]["role"], json!({"id": "r1", "name": "admin"}));
    assert_eq!(users[0]["links"]["self"], "http://gw/tenants/d1/users/u1");
    assert!(users[1].get("role").is_none());
}

#[tokio::test]
async fn test_delete_tenant_disables_first() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/domains/d1"))
        .and(body_partial_json(json!({"domain": {"enabled": false}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"domain": {}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/domains/d1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let request = as_admin(Request::delete("/tenants/d1"), "default")
        .body(Body::empty())
        .unwrap();
    let response = gateway(&server).await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_keystone_conflict_passes_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/roles"))
        .respond_with(ResponseTemplate::new(409).set_body_string("Duplicate entry"))
        .mount(&server)
        .await;

    let request = as_admin(Request::post("/roles"), "default")
        .body(Body::from(r#"{"role": {"name": "operator"}}"#))
        .unwrap();
    let response = gateway(&server).await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["code"], "103");
    assert_eq!(body["description"], "Duplicate entry");
}

#[tokio::test]
async fn test_options_routes() {
    let server = MockServer::start().await;
    let request = as_admin(Request::options("/tenants/d1"), "default")
        .body(Body::empty())
        .unwrap();
    let response = gateway(&server).await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.headers()["allow"], "DELETE, GET, OPTIONS, PATCH");
}
