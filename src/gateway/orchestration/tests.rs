//! Tests for the orchestration gateway

use super::inventory::*;
use super::vm::*;
use super::*;
use crate::gateway::backend;
use crate::query::{normalize, LimitPolicy, RawQuery};
use crate::store::MemorySource;
use crate::types::Record;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

fn machine(n: u32, location: &str) -> Record {
    record(json!({
        "id": n,
        "uuid": format!("u{n}"),
        "name": format!("vm-{n}"),
        "location": location,
        "hostname": "compute-1",
        "state": "ACTIVE"
    }))
}

fn network(id: u32, uuid: &str, ip: &str, network_id: &str) -> Record {
    record(json!({
        "id": id,
        "uuid": uuid,
        "ip": ip,
        "mac": format!("fa:16:{id:02}"),
        "network_id": network_id
    }))
}

fn source() -> Arc<dyn RecordSource> {
    Arc::new(
        MemorySource::new()
            .with(
                &PHYSICAL_MACHINE,
                vec![record(json!({"id": 1, "hostname": "compute-1", "ip": "10.1.0.1", "state": "CREATE"}))],
            )
            .with(
                &VIRTUAL_MACHINE,
                vec![
                    machine(1, "lab"),
                    machine(2, "lab"),
                    machine(3, "edge"),
                    machine(4, "edge"),
                ],
            )
            .with(
                &VM_NETWORK,
                vec![
                    network(1, "u1", "192.168.0.11", "net-a"),
                    network(2, "u1", "192.168.1.11", "net-b"),
                    network(3, "u3", "192.168.0.13", "net-a"),
                ],
            )
            .with(
                &UE,
                vec![
                    record(json!({"id": 1, "imsi": "001", "ue_ip": "172.16.0.5", "enb_ip_s1u": "10.2.0.1"})),
                    record(json!({"id": 2, "imsi": "002", "ue_ip": "172.16.0.6", "enb_ip_s1u": "10.2.0.1"})),
                    record(json!({"id": 3, "imsi": "003", "ue_ip": "172.16.0.5", "enb_ip_s1u": "10.2.0.2"})),
                ],
            ),
    )
}

fn gateway(server: &MockServer) -> Router {
    let inventory = backend(
        "Service Inventory",
        &format!("{}/inventory/", server.uri()),
        Duration::from_secs(2),
    )
    .unwrap();
    OrchestrationGateway::new(source(), inventory).router()
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("host", "gw")
        .header("X-Auth-Token", "caller-token")
        .body(Body::empty())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    request("GET", uri)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn names(body: &Value) -> Vec<&str> {
    body["vms"]
        .as_array()
        .unwrap()
        .iter()
        .map(|vm| vm["name"].as_str().unwrap())
        .collect()
}

fn service_document() -> Value {
    json!({
        "service_id": "s1",
        "created_at": "2018-01-10T09:00:00",
        "service_status": "RUNNING",
        "service_type": "SDN",
        "service_info": {"owner": "ops"},
        "lifecycle_status": "DEPLOYED",
        "related_services": [],
        "network_services": [
            {"ns_instance_id": "ns1", "ns_status": "UP", "ns_type": "firewall", "nfvo_id": "osm"}
        ],
        "apps": [
            {
                "app_instance_id": "a1",
                "ns_instance_id": "ns1",
                "app_class": "VNF_SENSOR",
                "app_type": "snort",
                "status": "RUNNING",
                "location": "edge",
                "vm_ids": [{"vim_vm_id": "u1"}, {"vim_vm_id": "missing"}]
            },
            {
                "app_instance_id": "a2",
                "ns_instance_id": "ns1",
                "app_class": "SDN_CONTROLLER",
                "app_type": "onos",
                "status": "RUNNING",
                "location": "lab"
            },
            {
                "app_instance_id": "a3",
                "app_class": "SDN_ANALYZER",
                "app_type": "flow",
                "status": "STOPPED",
                "location": "lab"
            }
        ]
    })
}

// ============================================================================
// Query translation
// ============================================================================

fn query(raw: &str) -> VmQuery {
    let spec = normalize(&RawQuery::parse(Some(raw)), LimitPolicy::TOPOLOGY).unwrap();
    VmQuery::translate(&spec)
}

#[test]
fn test_translate_splits_tables_and_drops_unknown() {
    let q = query("search_by=location:edge,ip:192.168.0.13,colour:red&filter=name,mac,network,colour");
    assert_eq!(q.vm_search, vec![("location".to_string(), "edge".to_string())]);
    assert_eq!(q.network_search, vec![("ip".to_string(), "192.168.0.13".to_string())]);
    assert_eq!(q.vm_fields, vec!["name".to_string()]);
    assert_eq!(q.network_fields, vec!["mac".to_string()]);
    assert!(q.network_requested);
}

#[test]
fn test_networks_attached_unless_only_machine_fields() {
    assert!(query("").attaches_networks());
    assert!(!query("filter=name").attaches_networks());
    assert!(query("filter=name,network").attaches_networks());
    assert!(query("filter=ip").attaches_networks());
}

#[test]
fn test_machine_ids_distinct_in_order() {
    let networks = vec![
        network(1, "u2", "a", "n"),
        network(2, "u1", "b", "n"),
        network(3, "u2", "c", "n"),
    ];
    assert_eq!(machine_ids(&networks), vec!["u2".to_string(), "u1".to_string()]);
}

// ============================================================================
// Inventory views
// ============================================================================

#[test]
fn test_service_view_splits_apps() {
    let record: ServiceRecord = serde_json::from_value(service_document()).unwrap();
    assert_eq!(record.vm_ids(), vec!["u1".to_string(), "missing".to_string()]);

    let mut machines = HashMap::new();
    machines.insert("u1".to_string(), machine(1, "lab"));
    let view = ServiceView::build(&record, &machines);

    let ns = view.network_service("ns1").unwrap();
    assert_eq!(ns.apps.len(), 1);
    assert_eq!(ns.apps[0].id, "a1");
    assert_eq!(ns.apps[0].virtual_machines.as_ref().map(Vec::len), Some(1));
    assert_eq!(ns.sdn_apps[0].id, "a2");
    assert_eq!(view.sdn_apps.len(), 1);
    assert!(view.sdn_app("a3").is_some());
    assert!(view.sdn_app("a2").is_none());
}

#[test]
fn test_summary_skips_missing_created() {
    let record: ServiceRecord =
        serde_json::from_value(json!({"service_id": "s2", "service_status": "NEW", "service_type": "VNF"})).unwrap();
    assert_eq!(
        serde_json::to_value(ServiceSummary::from(&record)).unwrap(),
        json!({"id": "s2", "status": "NEW", "type": "VNF"})
    );
}

#[test]
fn test_app_without_machines_has_no_machine_list() {
    let app: AppRecord = serde_json::from_value(json!({"app_instance_id": "a9", "app_class": "SDN"})).unwrap();
    let view = serde_json::to_value(AppView::build(&app, &HashMap::new())).unwrap();
    assert!(view.get("virtual_machines").is_none());
    assert_eq!(view["app_class"], "SDN");
}

// ============================================================================
// Topology routes
// ============================================================================

#[tokio::test]
async fn test_snapshot_served_and_invalidated() {
    let server = MockServer::start().await;
    let app = gateway(&server);

    let response = app.clone().oneshot(get("/topology/snapshot")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["physical"].as_array().unwrap().len(), 1);
    assert_eq!(body["virtual"].as_array().unwrap().len(), 4);
    assert_eq!(
        body["virtual"][0]["vm"]["network"],
        json!([
            {"mac": "fa:16:01", "ip": "192.168.0.11", "network_id": "net-a"},
            {"mac": "fa:16:02", "ip": "192.168.1.11", "network_id": "net-b"}
        ])
    );
    assert_eq!(body["ue"].as_array().unwrap().len(), 3);

    let response = app
        .oneshot(request("DELETE", "/topology/snapshot"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_vm_listing_descending_with_networks() {
    let server = MockServer::start().await;
    let response = gateway(&server)
        .oneshot(get("/topology/vm?limit=2"))
        .await
        .unwrap();
    let body = body_json(response).await;

    assert_eq!(names(&body), vec!["vm-4", "vm-3"]);
    assert_eq!(body["offset"], "3");
    assert_eq!(body["vms"][0]["network"], json!([]));
    assert_eq!(
        body["vms"][1]["network"],
        json!([{"mac": "fa:16:03", "ip": "192.168.0.13", "network_id": "net-a"}])
    );
    assert_eq!(body["vms"][1]["state"], "ACTIVE");
    assert_eq!(
        body["links"][1]["href"],
        "http://gw/topology/vm?offset=3&limit=2"
    );
}

#[tokio::test]
async fn test_vm_search_by_network_field() {
    let server = MockServer::start().await;
    let response = gateway(&server)
        .oneshot(get("/topology/vm?search_by=network_id:net-a&filter=name,ip"))
        .await
        .unwrap();
    let body = body_json(response).await;

    assert_eq!(names(&body), vec!["vm-3", "vm-1"]);
    assert_eq!(
        body["vms"][1],
        json!({"id": 1, "name": "vm-1", "uuid": "u1", "network": [{"ip": "192.168.0.11"}]})
    );
    assert!(body.get("offset").is_none());
}

#[tokio::test]
async fn test_vm_search_combined_criteria() {
    let server = MockServer::start().await;
    let response = gateway(&server)
        .oneshot(get("/topology/vm?search_by=location:lab,network_id:net-b&filter=name"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["vms"], json!([{"id": 1, "name": "vm-1", "uuid": "u1"}]));
}

#[tokio::test]
async fn test_vm_search_unknown_network_matches_nothing() {
    let server = MockServer::start().await;
    let response = gateway(&server)
        .oneshot(get("/topology/vm?search_by=network_id:none"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["vms"], json!([]));
}

#[tokio::test]
async fn test_ue_lookups() {
    let server = MockServer::start().await;
    let app = gateway(&server);

    let response = app.clone().oneshot(get("/topology/lte/ue/ip/172.16.0.5")).await.unwrap();
    let body = body_json(response).await;
    let imsis: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|ue| ue["imsi"].as_str().unwrap())
        .collect();
    assert_eq!(imsis, vec!["001", "003"]);

    let response = app.clone().oneshot(get("/topology/lte/ue/enb")).await.unwrap();
    assert_eq!(body_json(response).await, json!({"enb": ["10.2.0.1", "10.2.0.2"]}));

    let response = app.oneshot(get("/topology/locations")).await.unwrap();
    assert_eq!(body_json(response).await, json!({"locations": ["edge", "lab"]}));
}

// ============================================================================
// Inventory routes
// ============================================================================

async fn mount_service(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/inventory/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(service_document()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_list_services() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/inventory"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([service_document()])))
        .expect(1)
        .mount(&server)
        .await;

    let response = gateway(&server).oneshot(get("/services")).await.unwrap();
    assert_eq!(
        body_json(response).await,
        json!([{"id": "s1", "created": "2018-01-10T09:00:00", "status": "RUNNING", "type": "SDN"}])
    );
}

#[tokio::test]
async fn test_service_expands_machines() {
    let server = MockServer::start().await;
    mount_service(&server).await;

    let response = gateway(&server).oneshot(get("/services/s1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["id"], "s1");
    assert_eq!(body["lifecycle"], "DEPLOYED");
    let vms = &body["network_services"][0]["apps"][0]["virtual_machines"];
    assert_eq!(vms.as_array().unwrap().len(), 1);
    assert_eq!(vms[0]["name"], "vm-1");
    assert_eq!(vms[0]["network"].as_array().unwrap().len(), 2);
    assert_eq!(body["sdn_apps"][0]["id"], "a3");
}

#[tokio::test]
async fn test_nested_inventory_paths() {
    let server = MockServer::start().await;
    mount_service(&server).await;
    let app = gateway(&server);

    let response = app
        .clone()
        .oneshot(get("/services/s1/network-services/ns1/apps/a1/virtual-machines"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["vms"][0]["uuid"], "u1");

    let response = app
        .clone()
        .oneshot(get("/services/s1/network-services/ns1/apps/a1/virtual-machines/u1"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["name"], "vm-1");

    let response = app
        .clone()
        .oneshot(get("/services/s1/network-services/ns1/apps/a2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(get("/services/s1/sdn-apps/a3"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["type"], "flow");

    let response = app
        .oneshot(get("/services/s1/network-services/ns9"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_service_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/inventory/nope"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let response = gateway(&server).oneshot(get("/services/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unauthenticated_rejected() {
    let server = MockServer::start().await;
    let request = Request::builder()
        .uri("/topology/snapshot")
        .body(Body::empty())
        .unwrap();
    let response = gateway(&server).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
