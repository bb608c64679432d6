//! Symbol upload against a mocked App Center backend and blob store

use std::path::PathBuf;
use std::sync::Mutex;

use acdist::{ApiFactory, Step, SymbolUploader, UploadError};
use serde_json::json;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_TOKEN: &str = "api-secret";
const SYMBOL_UPLOADS_PATH: &str = "/v0.1/apps/betomorrow/sample-app/symbol_uploads";
const JSON: &str = "application/json";
const MAPPING: &str = "com.example.a -> a:\n    void run() -> b\n";

fn mapping_file() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("mapping.txt");
    std::fs::write(&file, MAPPING).unwrap();
    (dir, file)
}

fn uploader(server: &MockServer) -> SymbolUploader {
    let base_url = Url::parse(&format!("{}/v0.1/", server.uri())).unwrap();
    SymbolUploader::new(
        &ApiFactory::new(base_url, API_TOKEN.to_string()),
        "betomorrow".to_string(),
        "sample-app".to_string(),
    )
}

async fn mount_prepare(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(SYMBOL_UPLOADS_PATH))
        .and(header("X-API-Token", API_TOKEN))
        .and(header("content-type", JSON))
        .and(header("accept", JSON))
        .and(body_json(json!({
            "symbol_type": "AndroidProguard",
            "file_name": "mapping.txt",
            "version": "1.2.0",
            "build": "120"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "symbol_upload_id": "sym-1",
            "upload_url": format!("{}/blobs/sym-1?sv=2019&sig=abc", server.uri()),
            "expiration_date": "2026-10-20T00:00:00Z"
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_symbol_upload() {
    let server = MockServer::start().await;
    mount_prepare(&server).await;

    Mock::given(method("PUT"))
        .and(path("/blobs/sym-1"))
        .and(header("x-ms-blob-type", "BlockBlob"))
        .and(header("content-type", "text/plain; charset=UTF-8"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("{}/sym-1", SYMBOL_UPLOADS_PATH)))
        .and(header("X-API-Token", API_TOKEN))
        .and(header("content-type", JSON))
        .and(header("accept", JSON))
        .and(body_json(json!({"status": "committed"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, file) = mapping_file();
    let labels = Mutex::new(Vec::new());
    let record = |label: &str| labels.lock().unwrap().push(label.to_string());

    uploader(&server)
        .upload_symbols(&file, "AndroidProguard", "1.2.0", "120", &record)
        .await
        .unwrap();

    let put = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .find(|request| request.method.as_str() == "PUT")
        .unwrap();
    assert_eq!(put.body, MAPPING.as_bytes());
    assert!(put.headers.get("x-api-token").is_none());

    assert_eq!(
        *labels.lock().unwrap(),
        vec![
            "Step 1/3 : Prepare Symbol",
            "Step 2/3 : Upload Symbol",
            "Step 3/3 : Commit Symbol",
        ]
    );
}

#[tokio::test]
async fn test_prepare_failure_skips_blob_upload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SYMBOL_UPLOADS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let (_dir, file) = mapping_file();

    let err = uploader(&server)
        .upload_symbols(&file, "AndroidProguard", "1.2.0", "120", &acdist::NoProgress)
        .await
        .unwrap_err();

    assert_eq!(err.step(), Some(Step::PrepareSymbolUpload));
    assert_eq!(
        err.to_string(),
        "prepareSymbolUpload failed, code=500, reason=internal error"
    );
}

#[tokio::test]
async fn test_missing_mapping_file_fails_before_prepare() {
    let server = MockServer::start().await;
    mount_prepare(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing-mapping.txt");
    let labels = Mutex::new(Vec::new());
    let record = |label: &str| labels.lock().unwrap().push(label.to_string());

    let err = uploader(&server)
        .upload_symbols(&missing, "AndroidProguard", "1.2.0", "120", &record)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Io { .. }));
    assert_eq!(err.step(), None);
    assert!(server.received_requests().await.unwrap().is_empty());
    assert!(labels.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_blob_rejection_skips_commit() {
    let server = MockServer::start().await;
    mount_prepare(&server).await;

    Mock::given(method("PUT"))
        .and(path("/blobs/sym-1"))
        .respond_with(ResponseTemplate::new(403).set_body_string("AuthenticationFailed"))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (_dir, file) = mapping_file();

    let err = uploader(&server)
        .upload_symbols(&file, "AndroidProguard", "1.2.0", "120", &acdist::NoProgress)
        .await
        .unwrap_err();

    assert_eq!(err.step(), Some(Step::UploadSymbol));
    assert_eq!(err.status(), Some(403));
    assert!(err.to_string().contains("AuthenticationFailed"));
}

#[tokio::test]
async fn test_commit_failure_is_reported() {
    let server = MockServer::start().await;
    mount_prepare(&server).await;

    Mock::given(method("PUT"))
        .and(path("/blobs/sym-1"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("{}/sym-1", SYMBOL_UPLOADS_PATH)))
        .respond_with(ResponseTemplate::new(409).set_body_string("already committed"))
        .mount(&server)
        .await;

    let (_dir, file) = mapping_file();

    let err = uploader(&server)
        .upload_symbols(&file, "AndroidProguard", "1.2.0", "120", &acdist::NoProgress)
        .await
        .unwrap_err();

    assert_eq!(err.step(), Some(Step::CommitSymbolUpload));
    assert_eq!(err.status(), Some(409));
}
