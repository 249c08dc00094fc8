//! Full search-export-download runs against wiremock catalogue, identity and
//! download services.

use std::path::Path;

use sentinel_fetch::batch::{self, BatchRequest};
use sentinel_fetch::copernicus::CredentialOverrides;
use sentinel_fetch::settings::{DownloadSettings, Endpoints, Settings};
use sentinel_fetch::Error;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SQUARE_AOI: &str = r#"{
    "type": "FeatureCollection",
    "features": [{
        "type": "Feature",
        "properties": {"name": "tile"},
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[-47.0, -23.0], [-46.0, -23.0], [-46.0, -22.0], [-47.0, -22.0], [-47.0, -23.0]]]
        }
    }]
}"#;

fn settings(server: &MockServer) -> Settings {
    Settings {
        endpoints: Endpoints {
            catalogue: format!("{}/odata/v1", server.uri()),
            identity: format!("{}/auth/token", server.uri()),
            download: format!("{}/download/odata/v1", server.uri()),
            client_id: "cdse-public".to_string(),
        },
        download: DownloadSettings {
            max_attempts: 3,
            retry_delay_secs: 0,
        },
        credentials: CredentialOverrides::default(),
    }
}

fn request(dir: &Path, max_items: usize, list_only: bool) -> BatchRequest {
    let aoi = dir.join("aoi.geojson");
    std::fs::write(&aoi, SQUARE_AOI).expect("failed to write aoi");
    BatchRequest {
        aoi,
        start: "2025-10-03".to_string(),
        end: "2025-10-03".to_string(),
        max_cloud: 20.0,
        level: "L2A".to_string(),
        max_items,
        output_dir: dir.join("out"),
        list_only,
        credentials: CredentialOverrides::new(Some("user".into()), Some("pass".into())),
    }
}

fn page(ids: &[&str]) -> serde_json::Value {
    let value: Vec<_> = ids
        .iter()
        .map(|id| {
            json!({
                "Id": id,
                "Name": format!("S2B_MSIL2A_{id}.SAFE"),
                "ContentDate": {"Start": "2025-10-03T13:12:39.024Z", "End": "2025-10-03T13:12:39.024Z"},
                "Online": true,
                "ContentLength": 1024,
                "S3Path": format!("/eodata/Sentinel-2/MSI/L2A/{id}.SAFE"),
                "Attributes": [
                    {"@odata.type": "#OData.CSC.DoubleAttribute", "Name": "cloudCover", "Value": 12.5}
                ]
            })
        })
        .collect();
    json!({ "value": value })
}

/// Five matching records served in pages of three, ignoring `$top`.
async fn mount_catalogue(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/odata/v1/Products"))
        .and(query_param("$skip", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&["p1", "p2", "p3"])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/odata/v1/Products"))
        .and(query_param("$skip", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&["p4", "p5"])))
        .mount(server)
        .await;
}

async fn mount_auth(server: &MockServer, tokens: &[&str]) {
    for token in tokens {
        Mock::given(method("POST"))
            .and(path("/auth/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access_token": token})),
            )
            .up_to_n_times(1)
            .mount(server)
            .await;
    }
}

async fn request_paths(server: &MockServer, prefix: &str) -> Vec<String> {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .iter()
        .map(|r| r.url.path().to_string())
        .filter(|p| p.starts_with(prefix))
        .collect()
}

#[tokio::test]
async fn test_end_to_end_caps_and_downloads_in_order() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("failed to create temp dir");
    mount_catalogue(&server).await;
    mount_auth(&server, &["token-1"]).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/download/odata/v1/Products\(p[12]\)/\$value$"))
        .and(header("Authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"zip bytes".to_vec()))
        .expect(2)
        .mount(&server)
        .await;

    let request = request(dir.path(), 2, false);
    let summary = batch::run(&request, &settings(&server)).await.unwrap();

    let ids: Vec<_> = summary.search.products.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "p2"]);
    assert!(summary.search.truncated);
    assert_eq!(request_paths(&server, "/odata/v1/Products").await.len(), 1);

    let csv = std::fs::read_to_string(summary.metadata_path.unwrap()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("p1,S2B_MSIL2A_p1.SAFE,"));
    assert!(lines[1].contains(",12.5,true,1024,"));

    assert_eq!(
        request_paths(&server, "/download").await,
        vec![
            "/download/odata/v1/Products(p1)/$value",
            "/download/odata/v1/Products(p2)/$value"
        ]
    );

    let report = summary.downloads.unwrap();
    assert_eq!(report.downloaded.len(), 2);
    assert!(report.failed.is_empty());
    assert_eq!(
        std::fs::read(request.output_dir.join("p1.zip")).unwrap(),
        b"zip bytes"
    );
    assert!(request.output_dir.join(batch::PLAN_FILE).exists());
}

#[tokio::test]
async fn test_expired_token_is_refreshed_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("failed to create temp dir");
    mount_catalogue(&server).await;
    mount_auth(&server, &["token-1", "token-2"]).await;

    // p1 works with the first token; p2 finds it expired.
    Mock::given(method("GET"))
        .and(header("Authorization", "Bearer token-1"))
        .and(path("/download/odata/v1/Products(p1)/$value"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"one".to_vec()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header("Authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header("Authorization", "Bearer token-2"))
        .and(path("/download/odata/v1/Products(p2)/$value"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"two".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let summary = batch::run(&request(dir.path(), 2, false), &settings(&server))
        .await
        .unwrap();

    let report = summary.downloads.unwrap();
    assert_eq!(report.downloaded.len(), 2);
    assert_eq!(report.refreshes, 1);
    assert_eq!(request_paths(&server, "/auth/token").await.len(), 2);
}

#[tokio::test]
async fn test_failed_item_does_not_stop_batch() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("failed to create temp dir");
    mount_catalogue(&server).await;
    mount_auth(&server, &["token-1", "token-2"]).await;

    Mock::given(method("GET"))
        .and(path("/download/odata/v1/Products(p1)/$value"))
        .respond_with(ResponseTemplate::new(500))
        .expect(6)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download/odata/v1/Products(p2)/$value"))
        .and(header("Authorization", "Bearer token-2"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"two".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let summary = batch::run(&request(dir.path(), 2, false), &settings(&server))
        .await
        .unwrap();

    let report = summary.downloads.unwrap();
    assert_eq!(report.failed, vec!["p1".to_string()]);
    assert_eq!(report.downloaded.len(), 1);
}

#[tokio::test]
async fn test_list_only_skips_auth_and_downloads() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("failed to create temp dir");
    mount_catalogue(&server).await;

    let mut request = request(dir.path(), 0, true);
    request.credentials = CredentialOverrides::default();
    let summary = batch::run(&request, &settings(&server)).await.unwrap();

    // Unbounded search asks for 100 per page; the 3-record page reads as the end.
    assert_eq!(summary.search.products.len(), 3);
    assert!(!summary.search.truncated);
    assert!(summary.downloads.is_none());
    assert_eq!(request_paths(&server, "/odata/v1/Products").await.len(), 1);
    assert!(request_paths(&server, "/auth").await.is_empty());

    let csv = std::fs::read_to_string(request.output_dir.join("results.csv")).unwrap();
    assert_eq!(csv.lines().count(), 4);
}

#[tokio::test]
async fn test_missing_credentials_before_any_download() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("failed to create temp dir");
    mount_catalogue(&server).await;

    let mut request = request(dir.path(), 2, false);
    request.credentials = CredentialOverrides::new(Some("user".into()), None);
    let err = batch::run(&request, &settings(&server)).await.unwrap_err();

    assert!(matches!(err, Error::MissingCredentials));
    assert!(request_paths(&server, "/download").await.is_empty());
    assert!(request_paths(&server, "/auth").await.is_empty());
}

#[tokio::test]
async fn test_bad_input_fails_before_network() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("failed to create temp dir");

    let mut bad_level = request(dir.path(), 2, false);
    bad_level.level = "L3".to_string();
    let err = batch::run(&bad_level, &settings(&server)).await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedLevel(_)));

    let bad_aoi = request(dir.path(), 2, false);
    std::fs::write(&bad_aoi.aoi, "{\"type\": \"Nothing\"}").unwrap();
    let err = batch::run(&bad_aoi, &settings(&server)).await.unwrap_err();
    assert!(matches!(err, Error::MalformedInput(_)));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_no_results_writes_nothing() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("failed to create temp dir");
    Mock::given(method("GET"))
        .and(path("/odata/v1/Products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .expect(1)
        .mount(&server)
        .await;

    let request = request(dir.path(), 2, false);
    let summary = batch::run(&request, &settings(&server)).await.unwrap();

    assert!(summary.search.products.is_empty());
    assert!(summary.metadata_path.is_none());
    assert!(!request.output_dir.join("results.csv").exists());
}
