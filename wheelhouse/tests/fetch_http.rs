//! Fetcher behavior against a mock HTTP server.
//!
//! The fetcher is blocking, so every call runs on `spawn_blocking`
//! while wiremock serves from the test runtime.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wheelhouse::error::FetchError;
use wheelhouse::fetch::{FetchOutcome, Fetcher};

const BODY: &[u8] = b"wheel archive bytes here";

/// Run a fetch on the blocking pool; the blocking client must be built
/// and used off the async runtime.
async fn fetch_blocking(
    url: String,
    dest: PathBuf,
    resume: bool,
    sha256: Option<String>,
) -> Result<FetchOutcome, FetchError> {
    tokio::task::spawn_blocking(move || {
        let fetcher = Fetcher::with_settings(Duration::from_secs(5), 3, Duration::from_millis(10));
        fetcher.fetch(&url, &dest, resume, sha256.as_deref(), None)
    })
    .await
    .expect("fetch task panicked")
}

async fn mount_head(server: &MockServer, len: usize) {
    // The body itself is never transferred for a HEAD request; it is
    // set so the mock advertises the right content-length.
    Mock::given(method("HEAD"))
        .and(path("/pkg.whl"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; len]))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fresh_download_writes_full_body() {
    let server = MockServer::start().await;
    mount_head(&server, BODY.len()).await;

    Mock::given(method("GET"))
        .and(path("/pkg.whl"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(BODY))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("pkg.whl");
    let url = format!("{}/pkg.whl", server.uri());

    let outcome = fetch_blocking(url, dest.clone(), true, None)
        .await
        .unwrap();

    assert_eq!(outcome, FetchOutcome::Downloaded(BODY.len() as u64));
    assert_eq!(fs::read(&dest).unwrap(), BODY);
}

#[tokio::test]
async fn test_already_complete_transfers_nothing() {
    let server = MockServer::start().await;
    mount_head(&server, BODY.len()).await;

    // Any GET would be a protocol violation for a complete file.
    Mock::given(method("GET"))
        .and(path("/pkg.whl"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(BODY))
        .expect(0)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("pkg.whl");
    fs::write(&dest, BODY).unwrap();
    let url = format!("{}/pkg.whl", server.uri());

    let outcome = fetch_blocking(url, dest.clone(), true, None)
        .await
        .unwrap();

    assert_eq!(outcome, FetchOutcome::AlreadyComplete);
    assert_eq!(fs::read(&dest).unwrap(), BODY);
}

#[tokio::test]
async fn test_resume_appends_remaining_bytes() {
    let server = MockServer::start().await;
    mount_head(&server, BODY.len()).await;

    let partial = 10usize;

    // The fetcher must ask for exactly the bytes it is missing.
    Mock::given(method("GET"))
        .and(path("/pkg.whl"))
        .and(header("Range", format!("bytes={}-", partial).as_str()))
        .respond_with(ResponseTemplate::new(206).set_body_bytes(&BODY[partial..]))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("pkg.whl");
    fs::write(&dest, &BODY[..partial]).unwrap();
    let url = format!("{}/pkg.whl", server.uri());

    let outcome = fetch_blocking(url, dest.clone(), true, None)
        .await
        .unwrap();

    // The resumed file is byte-identical to a fresh uninterrupted fetch.
    assert_eq!(outcome, FetchOutcome::Downloaded(BODY.len() as u64));
    assert_eq!(fs::read(&dest).unwrap(), BODY);
}

#[tokio::test]
async fn test_resume_disabled_restarts_from_scratch() {
    let server = MockServer::start().await;
    mount_head(&server, BODY.len()).await;

    Mock::given(method("GET"))
        .and(path("/pkg.whl"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(BODY))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("pkg.whl");
    fs::write(&dest, &BODY[..5]).unwrap();
    let url = format!("{}/pkg.whl", server.uri());

    let outcome = fetch_blocking(url, dest.clone(), false, None)
        .await
        .unwrap();

    assert_eq!(outcome, FetchOutcome::Downloaded(BODY.len() as u64));
    assert_eq!(fs::read(&dest).unwrap(), BODY);
}

#[tokio::test]
async fn test_server_ignoring_range_starts_fresh() {
    let server = MockServer::start().await;
    mount_head(&server, BODY.len()).await;

    // A server without range support answers 200 with the whole body;
    // appending it to the partial file would corrupt the artifact.
    Mock::given(method("GET"))
        .and(path("/pkg.whl"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(BODY))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("pkg.whl");
    fs::write(&dest, &BODY[..7]).unwrap();
    let url = format!("{}/pkg.whl", server.uri());

    let outcome = fetch_blocking(url, dest.clone(), true, None)
        .await
        .unwrap();

    assert_eq!(outcome, FetchOutcome::Downloaded(BODY.len() as u64));
    assert_eq!(fs::read(&dest).unwrap(), BODY);
}

#[tokio::test]
async fn test_retries_exhausted_reports_last_error() {
    let server = MockServer::start().await;
    mount_head(&server, BODY.len()).await;

    Mock::given(method("GET"))
        .and(path("/pkg.whl"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("pkg.whl");
    let url = format!("{}/pkg.whl", server.uri());

    let err = fetch_blocking(url, dest, true, None)
        .await
        .unwrap_err();

    match err {
        FetchError::RetriesExhausted {
            attempts, reason, ..
        } => {
            assert_eq!(attempts, 3);
            assert!(reason.contains("503"), "unexpected reason: {}", reason);
        }
        other => panic!("expected RetriesExhausted, got {:?}", other),
    }
}

#[tokio::test]
async fn test_digest_mismatch_discards_bytes_and_retries() {
    let server = MockServer::start().await;
    mount_head(&server, BODY.len()).await;

    Mock::given(method("GET"))
        .and(path("/pkg.whl"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(BODY))
        .expect(3)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("pkg.whl");
    let url = format!("{}/pkg.whl", server.uri());

    let err = fetch_blocking(url, dest.clone(), true, Some("0".repeat(64)))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::RetriesExhausted { .. }));
    // The poisoned bytes were removed rather than kept for resume.
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_matching_digest_accepted() {
    let server = MockServer::start().await;
    mount_head(&server, BODY.len()).await;

    Mock::given(method("GET"))
        .and(path("/pkg.whl"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(BODY))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("pkg.whl");
    let url = format!("{}/pkg.whl", server.uri());

    // Digest of the body, computed with the crate's own hasher against
    // a file written independently of the fetch path.
    let reference = temp.path().join("reference");
    fs::write(&reference, BODY).unwrap();
    let digest = wheelhouse::fetch::file_sha256(&reference).unwrap();

    let outcome = fetch_blocking(url, dest.clone(), true, Some(digest))
        .await
        .unwrap();

    assert_eq!(outcome, FetchOutcome::Downloaded(BODY.len() as u64));
}
