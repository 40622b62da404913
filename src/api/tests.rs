//! Unit tests for the Nscale API client.

use rstest::rstest;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::*;
use crate::config::NscaleConfig;

fn config_for(endpoint: &str) -> NscaleConfig {
    NscaleConfig {
        service_token: String::from("token"),
        organization_id: String::from("org-1"),
        project_id: String::from("proj-1"),
        region_id: None,
        region_service_api_endpoint: format!("{endpoint}/"),
        compute_service_api_endpoint: endpoint.to_owned(),
        user_agent: String::from("nscale-reconcile-tests"),
        poll_interval_secs: 1,
        wait_timeout_secs: 10,
    }
}

/// Serves a single canned HTTP response and returns the base URL.
async fn serve_once(status_line: &'static str, body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|err| panic!("bind listener: {err}"));
    let addr = listener
        .local_addr()
        .unwrap_or_else(|err| panic!("listener addr: {err}"));
    tokio::spawn(async move {
        let Ok((mut stream, _)) = listener.accept().await else {
            return;
        };
        let mut request = Vec::new();
        let mut chunk = [0_u8; 1024];
        while !request.windows(4).any(|window| window == b"\r\n\r\n") {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(read) => request.extend_from_slice(chunk.get(..read).unwrap_or_default()),
            }
        }
        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
    });
    format!("http://{addr}")
}

#[rstest]
#[case(ResourceKind::Instance, "http://compute/api/v2/instances/abc")]
#[case(ResourceKind::Network, "http://region/api/v2/networks/abc")]
#[case(ResourceKind::SecurityGroup, "http://region/api/v2/securitygroups/abc")]
#[case(ResourceKind::FileStorage, "http://region/api/v2/filestorage/abc")]
#[case(
    ResourceKind::ComputeCluster,
    "http://compute/api/v1/organizations/org-1/clusters"
)]
fn resource_endpoint_routes_each_kind(#[case] kind: ResourceKind, #[case] expected: &str) {
    let config = NscaleConfig {
        region_service_api_endpoint: String::from("http://region/"),
        compute_service_api_endpoint: String::from("http://compute"),
        ..config_for("http://unused")
    };
    let client = NscaleClient::new(&config).expect("client should build");
    let target = ResourceTarget::new(kind, "abc");
    assert_eq!(client.resource_endpoint(&target), expected);
}

#[test]
fn new_rejects_invalid_configuration() {
    let config = NscaleConfig {
        service_token: String::new(),
        ..config_for("http://unused")
    };
    let err = NscaleClient::new(&config).expect_err("blank token must be rejected");
    assert!(matches!(err, ClientError::Config(ref message) if message.contains("NSCALE_SERVICE_TOKEN")));
}

#[test]
fn api_error_display_includes_optional_parts() {
    let err = ApiError::from_response(
        409,
        "http://compute/api/v2/instances/abc",
        br#"{"error":"conflict","error_description":"busy","trace_id":"t-1"}"#.to_vec(),
    );
    assert_eq!(
        err.to_string(),
        "server returned status code 409, code: conflict, message: busy, trace_id: t-1"
    );
    assert!(!err.is_not_found());
}

#[test]
fn api_error_keeps_unparsable_body() {
    let err = ApiError::from_response(502, "http://region", b"<html>bad gateway</html>".to_vec());
    assert_eq!(err.to_string(), "server returned status code 502");
    let fetch = FetchError::from(err);
    assert_eq!(fetch.response_body(), Some(&b"<html>bad gateway</html>"[..]));
    assert_eq!(fetch.endpoint(), Some("http://region"));
}

#[test]
fn only_api_404_counts_as_not_found() {
    assert!(FetchError::not_found("gone").is_not_found());
    assert!(!FetchError::from(ApiError::with_status(500, "boom")).is_not_found());
    let transport = FetchError::Transport {
        endpoint: String::from("http://compute"),
        message: String::from("connection refused"),
    };
    assert!(!transport.is_not_found());
}

#[rstest]
#[case("unknown", ProvisioningStatus::Unknown)]
#[case("provisioning", ProvisioningStatus::Provisioning)]
#[case("provisioned", ProvisioningStatus::Provisioned)]
#[case("deprovisioning", ProvisioningStatus::Deprovisioning)]
#[case("error", ProvisioningStatus::Error)]
#[case("degraded", ProvisioningStatus::Other(String::from("degraded")))]
fn provisioning_status_parses_wire_values(
    #[case] raw: &str,
    #[case] expected: ProvisioningStatus,
) {
    let parsed = ProvisioningStatus::from(raw);
    assert_eq!(parsed, expected);
    assert_eq!(parsed.as_str(), raw);
}

#[test]
fn snapshot_decodes_metadata_and_keeps_body() {
    let body = serde_json::json!({
        "metadata": {
            "id": "inst-1",
            "name": "web",
            "provisioningStatus": "provisioning",
            "tags": [{"name": "team", "value": "infra"}]
        },
        "spec": {"flavorId": "g1"}
    });
    let snapshot = ResourceSnapshot::from_body(body.clone()).expect("snapshot should decode");
    assert_eq!(snapshot.id(), "inst-1");
    assert_eq!(snapshot.status(), &ProvisioningStatus::Provisioning);
    assert_eq!(snapshot.tags(), Some(&[Tag::new("team", "infra")][..]));
    assert_eq!(snapshot.body, body);
}

#[test]
fn snapshot_without_metadata_is_rejected() {
    let result = ResourceSnapshot::from_body(serde_json::json!({"spec": {}}));
    assert!(result.is_err());
}

#[tokio::test]
async fn get_decodes_instance_snapshot() {
    let body = serde_json::json!({
        "metadata": {"id": "inst-1", "name": "web", "provisioningStatus": "provisioned"}
    })
    .to_string();
    let endpoint = serve_once("200 OK", body).await;
    let client = NscaleClient::new(&config_for(&endpoint)).expect("client should build");

    let snapshot = client
        .get(&ResourceTarget::new(ResourceKind::Instance, "inst-1"))
        .await
        .expect("fetch should succeed");
    assert_eq!(snapshot.status(), &ProvisioningStatus::Provisioned);
}

#[tokio::test]
async fn get_maps_error_responses_to_api_errors() {
    let body = String::from(r#"{"error":"not_found","error_description":"no such network"}"#);
    let endpoint = serve_once("404 Not Found", body).await;
    let client = NscaleClient::new(&config_for(&endpoint)).expect("client should build");

    let err = client
        .get(&ResourceTarget::new(ResourceKind::Network, "net-1"))
        .await
        .expect_err("404 must surface as an error");
    assert!(err.is_not_found());
    assert!(err.to_string().contains("no such network"));
}

#[tokio::test]
async fn compute_cluster_missing_from_list_is_not_found() {
    let body = serde_json::json!([
        {"metadata": {"id": "cc-other", "provisioningStatus": "provisioned"}}
    ])
    .to_string();
    let endpoint = serve_once("200 OK", body).await;
    let client = NscaleClient::new(&config_for(&endpoint)).expect("client should build");

    let err = client
        .get(&ResourceTarget::new(ResourceKind::ComputeCluster, "cc-1"))
        .await
        .expect_err("missing cluster must be reported");
    assert!(err.is_not_found());
    assert!(err.to_string().contains("failed to find compute cluster 'cc-1'"));
}

#[tokio::test]
async fn compute_cluster_is_found_in_list() {
    let body = serde_json::json!([
        {"metadata": {"id": "cc-other", "provisioningStatus": "provisioned"}},
        {"metadata": {"id": "cc-1", "provisioningStatus": "provisioning"}}
    ])
    .to_string();
    let endpoint = serve_once("200 OK", body).await;
    let client = NscaleClient::new(&config_for(&endpoint)).expect("client should build");

    let snapshot = client
        .get(&ResourceTarget::new(ResourceKind::ComputeCluster, "cc-1"))
        .await
        .expect("cluster should be found");
    assert_eq!(snapshot.id(), "cc-1");
    assert_eq!(snapshot.status(), &ProvisioningStatus::Provisioning);
}
