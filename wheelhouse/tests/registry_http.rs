//! Registry client behavior against a mock HTTP server.

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wheelhouse::config::BundleConfig;
use wheelhouse::error::RegistryError;
use wheelhouse::registry::{resolve_version, DistKind, RegistryClient};

fn test_config(server: &MockServer) -> BundleConfig {
    BundleConfig::default()
        .with_registry_url(server.uri())
        .with_max_retries(3)
        .with_retry_delay(Duration::from_millis(10))
        .with_timeout(Duration::from_secs(5))
}

fn sample_body() -> serde_json::Value {
    serde_json::json!({
        "info": {"name": "requests", "version": "2.31.0"},
        "releases": {
            "2.31.0": [
                {
                    "filename": "requests-2.31.0-py3-none-any.whl",
                    "url": "https://files.example.org/requests-2.31.0-py3-none-any.whl",
                    "packagetype": "bdist_wheel",
                    "size": 62574,
                    "digests": {"sha256": "abc123"}
                }
            ],
            "2.30.0.post0": [
                {
                    "filename": "requests-2.30.0.post0-py3-none-any.whl",
                    "url": "https://files.example.org/requests-2.30.0.post0-py3-none-any.whl",
                    "packagetype": "bdist_wheel"
                }
            ]
        }
    })
}

#[tokio::test]
async fn test_package_info_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/requests/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
        .mount(&server)
        .await;

    let config = test_config(&server);
    let info = tokio::task::spawn_blocking(move || {
        RegistryClient::new(&config).package_info("requests")
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(info.latest_version(), "2.31.0");
    let files = &info.releases["2.31.0"];
    assert_eq!(files[0].packagetype, DistKind::BdistWheel);
    assert_eq!(files[0].size, Some(62574));
}

#[tokio::test]
async fn test_missing_package_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/nosuchpackage/json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server);
    let err = tokio::task::spawn_blocking(move || {
        RegistryClient::new(&config).package_info("nosuchpackage")
    })
    .await
    .unwrap()
    .unwrap_err();

    assert!(matches!(err, RegistryError::PackageNotFound { .. }));
}

#[tokio::test]
async fn test_server_errors_retried_to_ceiling() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/requests/json"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let config = test_config(&server);
    let err = tokio::task::spawn_blocking(move || {
        RegistryClient::new(&config).package_info("requests")
    })
    .await
    .unwrap()
    .unwrap_err();

    match err {
        RegistryError::FetchFailed { reason, .. } => {
            assert!(reason.contains("500"), "unexpected reason: {}", reason);
        }
        other => panic!("expected FetchFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/requests/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server);
    let err = tokio::task::spawn_blocking(move || {
        RegistryClient::new(&config).package_info("requests")
    })
    .await
    .unwrap()
    .unwrap_err();

    assert!(matches!(err, RegistryError::ParseFailed { .. }));
}

#[tokio::test]
async fn test_fetched_info_resolves_post_release() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/requests/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
        .mount(&server)
        .await;

    let config = test_config(&server);
    let info = tokio::task::spawn_blocking(move || {
        RegistryClient::new(&config).package_info("requests")
    })
    .await
    .unwrap()
    .unwrap();

    // 2.30.0 was never published; its .post0 re-release stands in.
    let (version, files) = resolve_version(&info, Some("2.30.0")).unwrap();
    assert_eq!(version, "2.30.0.post0");
    assert_eq!(files.len(), 1);
}
