//! Integration tests over the assembled application
//!
//! Tests the full path: YAML config → service routers → middleware chain →
//! DuckDB record sources and mocked HTTP backends

use axum::body::Body;
use axum::http::{Request, StatusCode};
use pretty_assertions::assert_eq;
use selfnet_nbi::config::{load_config_from_str, GatewayConfig, Service};
use selfnet_nbi::gateway;
use selfnet_nbi::server::{build_app, App, REQUEST_ID_HEADER};
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Fixtures
// ============================================================================

const TOPOLOGY_SQL: &str = r#"
CREATE TABLE physical_machine (
    "id" BIGINT, "hostname" VARCHAR, "location" VARCHAR, "ip" VARCHAR,
    "networkId" VARCHAR, "state" VARCHAR
);
CREATE TABLE virtual_machine (
    "id" BIGINT, "location" VARCHAR, "name" VARCHAR, "tenantId" VARCHAR, "userId" VARCHAR,
    "hostName" VARCHAR, "hostIp" VARCHAR, "instanceId" VARCHAR, "uuid" VARCHAR,
    "imageId" VARCHAR, "reportedTime" TIMESTAMP, "resourceId" VARCHAR, "state" VARCHAR
);
CREATE TABLE vm_network (
    "id" BIGINT, "uuid" VARCHAR, "mac" VARCHAR, "iface" VARCHAR, "dhcp" VARCHAR,
    "gateway" VARCHAR, "dns" VARCHAR, "vmIp" VARCHAR, "networkId" VARCHAR, "portId" VARCHAR,
    "ovsId" VARCHAR, "segmentationId" VARCHAR, "reportedTime" TIMESTAMP, "resourceId" VARCHAR
);
CREATE TABLE ue (
    "id" BIGINT, "IMSI" VARCHAR, "MCC" VARCHAR, "MNC" VARCHAR, "UEId" VARCHAR,
    "mmeTeidS11" VARCHAR, "sgwTeidS11" VARCHAR, "epsBearerId" VARCHAR, "MMEIp" VARCHAR,
    "sgwTeidS1" VARCHAR, "enbTeidS1u" VARCHAR, "sgwIPS1U" VARCHAR, "enbIPS1U" VARCHAR,
    "UEIP" VARCHAR
);
INSERT INTO physical_machine VALUES (1, 'compute-1', 'lab', '10.1.0.1', 'n0', 'CREATE');
INSERT INTO virtual_machine VALUES
    (1, 'lab', 'vm-1', 't1', 'u', 'compute-1', '10.1.0.1', 'i-1', 'u1', 'img', NULL, 'r1', 'ACTIVE'),
    (2, 'edge', 'vm-2', 't1', 'u', 'compute-1', '10.1.0.1', 'i-2', 'u2', 'img', NULL, 'r2', 'ACTIVE'),
    (3, 'edge', 'vm-3', 't1', 'u', 'compute-1', '10.1.0.1', 'i-3', 'u3', 'img', NULL, 'r3', NULL);
INSERT INTO vm_network VALUES
    (1, 'u1', 'fa:16:01', 'eth0', NULL, NULL, NULL, '192.168.0.11', 'net-a', NULL, NULL, NULL, NULL, NULL),
    (2, 'u3', 'fa:16:03', 'eth0', NULL, NULL, NULL, '192.168.0.13', 'net-b', NULL, NULL, NULL, NULL, NULL);
INSERT INTO ue VALUES
    (1, '001', '214', '07', 'ue-1', NULL, NULL, '5', '10.3.0.1', NULL, NULL, NULL, '10.2.0.1', '172.16.0.5');
"#;

fn topology_database(dir: &TempDir, sql: &str) -> String {
    let path = dir.path().join("topology.duckdb");
    let conn = duckdb::Connection::open(&path).unwrap();
    conn.execute_batch(sql).unwrap();
    path.display().to_string()
}

fn config(database: &str, backend: &str) -> GatewayConfig {
    load_config_from_str(&format!(
        r#"
topology_database:
  type: duckdb
  connection: "{database}"
service_inventory: "{backend}/inventory/"
app_catalogue: "{backend}/catalogue/"
monasca:
  url: "{backend}/v2.0/"
  keystone: "{backend}/identity/"
"#
    ))
    .unwrap()
}

async fn app(config: &GatewayConfig, services: &[Service]) -> App {
    let mut mounts = Vec::new();
    for &service in services {
        let router = gateway::router(service, config).await.unwrap();
        mounts.push((config.server.base_path(service), router));
    }
    build_app(mounts)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("host", "gw")
        .header("X-Auth-Token", "caller-token")
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn exists(path: &str) -> bool {
    Path::new(path).exists()
}

// ============================================================================
// Orchestration over DuckDB
// ============================================================================

#[tokio::test]
async fn test_vm_search_over_duckdb() {
    let dir = TempDir::new().unwrap();
    let database = topology_database(&dir, TOPOLOGY_SQL);
    assert!(exists(&database));
    let server = MockServer::start().await;
    let app = app(&config(&database, &server.uri()), &[Service::Orchestration]).await;

    let response = app
        .oneshot(get("/nbi/orchestration/api/topology/vm/?limit=2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    let names: Vec<&str> = body["vms"]
        .as_array()
        .unwrap()
        .iter()
        .map(|vm| vm["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["vm-3", "vm-2"]);
    assert_eq!(body["offset"], "2");
    assert_eq!(
        body["vms"][0]["network"],
        json!([{"mac": "fa:16:03", "iface": "eth0", "ip": "192.168.0.13", "network_id": "net-b"}])
    );
    assert_eq!(body["vms"][1]["network"], json!([]));
}

#[tokio::test]
async fn test_snapshot_over_duckdb() {
    let dir = TempDir::new().unwrap();
    let database = topology_database(&dir, TOPOLOGY_SQL);
    let server = MockServer::start().await;
    let app = app(&config(&database, &server.uri()), &[Service::Orchestration]).await;

    let response = app
        .oneshot(get("/nbi/orchestration/api/topology/snapshot"))
        .await
        .unwrap();
    let body = body_json(response).await;

    assert_eq!(
        body["physical"],
        json!([{
            "eventtype": "compute_event",
            "type": "CREATE",
            "compute_node": {"hostname": "compute-1", "location": "lab", "ip": "10.1.0.1", "network_id": "n0"}
        }])
    );
    assert_eq!(body["virtual"].as_array().unwrap().len(), 3);
    assert!(body["virtual"][2].get("type").is_none());
    assert_eq!(body["ue"][0]["type"], "UPDATE");
    assert_eq!(body["ue"][0]["ue"]["ue_ip"], "172.16.0.5");
}

#[tokio::test]
async fn test_missing_column_fails_at_startup() {
    let dir = TempDir::new().unwrap();
    let sql = TOPOLOGY_SQL.replace(r#""IMSI" VARCHAR, "#, "");
    let sql = sql.replace("(1, '001', ", "(1, ");
    let database = topology_database(&dir, &sql);
    let server = MockServer::start().await;

    let result = gateway::router(Service::Orchestration, &config(&database, &server.uri())).await;
    let message = result.err().map(|e| e.to_string()).unwrap_or_default();
    assert!(message.contains("IMSI"), "unexpected error: {message}");
}

// ============================================================================
// Middleware chain
// ============================================================================

#[tokio::test]
async fn test_unauthenticated_never_reaches_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;
    let config = config("unused.duckdb", &server.uri());
    let app = app(&config, &[Service::Catalogue]).await;

    let request = Request::builder()
        .uri("/nbi/catalogue/api/packages")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
}

#[tokio::test]
async fn test_malformed_limit_rejected_before_backends() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"elements": []})))
        .expect(0)
        .mount(&server)
        .await;
    let config = config("unused.duckdb", &server.uri());
    let app = app(&config, &[Service::Monitoring, Service::Catalogue]).await;

    for uri in [
        "/nbi/monitoring/api/alarms?limit=abc",
        "/nbi/monitoring/api/vm/metrics/i-1?limit=0",
        "/nbi/catalogue/api/packages?limit=abc",
    ] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body_json(response).await["code"], "202", "{uri}");
    }
}

#[tokio::test]
async fn test_request_id_echoed_and_unknown_route() {
    let server = MockServer::start().await;
    let config = config("unused.duckdb", &server.uri());
    let app = app(&config, &[Service::Catalogue]).await;

    let request = Request::builder()
        .uri("/nbi/unknown")
        .header(REQUEST_ID_HEADER, "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-42");
}

#[tokio::test]
async fn test_services_share_one_app() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["p1"])))
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let database = topology_database(&dir, TOPOLOGY_SQL);
    let config = config(&database, &server.uri());
    let app = app(&config, &[Service::Orchestration, Service::Catalogue]).await;

    let response = app
        .clone()
        .oneshot(get("/nbi/catalogue/api/packages/"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!({"app": ["p1"]}));

    let response = app
        .oneshot(get("/nbi/orchestration/api/topology/locations"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!({"locations": ["edge", "lab"]}));
}
