// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * ChimeraScan - Pipeline Integration Tests
 * End-to-end scan lifecycle against a scripted scanner and a mocked
 * inference service
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chimerascan::config::AppConfig;
use chimerascan::enrichment::provider::{InferenceProvider, OllamaProvider};
use chimerascan::errors::PipelineError;
use chimerascan::pipeline::ScanPipeline;
use chimerascan::store::memory::MemoryScanStore;
use chimerascan::types::{ReportFormat, ScanStatus};
use tempfile::TempDir;
use uuid::Uuid;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TWO_FINDINGS_SCRIPT: &str = r#"#!/bin/sh
echo '{"template-id":"weak-tls","info":{"name":"Weak TLS configuration detected","severity":"high","description":"The server supports weak TLS ciphers.","reference":["https://ref.example/tls"],"tags":["ssl","tls"],"classification":{"cve-id":["CVE-2016-2183"],"cwe-id":["CWE-326"]}},"host":"https://example.com","matched-at":"https://example.com:443","ip":"93.184.216.34","timestamp":"2026-01-15T10:00:00Z","curl-command":"curl -k https://example.com","request":"GET / HTTP/1.1"}'
echo 'stray diagnostic output that is not JSON'
echo '{"template-id":"server-header","info":{"name":"Server version disclosure","severity":"low","description":"","tags":["headers"]},"host":"https://example.com","matched-at":"https://example.com/"}'
"#;

const SLEEPING_SCRIPT: &str = "#!/bin/sh\nexec sleep 30\n";

fn write_fake_scanner(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-nuclei");
    fs::write(&path, body).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn test_config(scanner_binary: &Path, reports_dir: &Path, inference_url: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.scanner.binary_path = scanner_binary.display().to_string();
    config.reports.dir = reports_dir.to_path_buf();
    config.inference.base_url = inference_url.to_string();
    config
}

fn completion(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "model": "test-model",
        "response": text,
        "done": true
    }))
}

async fn mount_inference_mocks(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_string_contains("Rate the risk level"))
        .and(body_string_contains("Weak TLS configuration detected"))
        .respond_with(completion("high"))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_string_contains("Rate the risk level"))
        .and(body_string_contains("Server version disclosure"))
        .respond_with(completion("low"))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_string_contains("Translate into"))
        .respond_with(completion("Translated description text"))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_string_contains("remediation steps"))
        .respond_with(completion("Disable weak cipher suites."))
        .mount(server)
        .await;
}

fn build_pipeline(config: &AppConfig, store: Arc<MemoryScanStore>) -> Arc<ScanPipeline> {
    let provider: Arc<dyn InferenceProvider> = Arc::new(
        OllamaProvider::new(
            Some(config.inference.base_url.clone()),
            Some("test-model".to_string()),
            30,
        )
        .unwrap(),
    );
    Arc::new(ScanPipeline::new(config, store, provider))
}

async fn wait_for_terminal(
    pipeline: &ScanPipeline,
    scan_id: Uuid,
    owner_id: Uuid,
) -> ScanStatus {
    for _ in 0..200 {
        let view = pipeline.status(scan_id, owner_id).await.unwrap();
        if view.status.is_terminal() {
            return view.status;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("scan {} never reached a terminal state", scan_id);
}

async fn wait_for_status(
    pipeline: &ScanPipeline,
    scan_id: Uuid,
    owner_id: Uuid,
    wanted: ScanStatus,
) {
    for _ in 0..200 {
        let view = pipeline.status(scan_id, owner_id).await.unwrap();
        if view.status == wanted {
            return;
        }
        assert!(
            !view.status.is_terminal(),
            "scan {} reached terminal {} while waiting for {}",
            scan_id,
            view.status,
            wanted
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("scan {} never became {}", scan_id, wanted);
}

#[tokio::test]
async fn scan_completes_with_enriched_findings_and_three_artifacts() {
    let tmp = TempDir::new().unwrap();
    let scanner = write_fake_scanner(tmp.path(), TWO_FINDINGS_SCRIPT);
    let reports_dir = tmp.path().join("reports");

    let server = MockServer::start().await;
    mount_inference_mocks(&server).await;

    let store = Arc::new(MemoryScanStore::new());
    let config = test_config(&scanner, &reports_dir, &server.uri());
    let pipeline = build_pipeline(&config, Arc::clone(&store));

    let owner_id = Uuid::new_v4();
    let scan_id = pipeline
        .submit("https://example.com".to_string(), owner_id, None)
        .await
        .unwrap();

    // Submission returns before the scan is done; the scan is observable
    // right away.
    assert!(pipeline.status(scan_id, owner_id).await.is_ok());

    let status = wait_for_terminal(&pipeline, scan_id, owner_id).await;
    assert_eq!(status, ScanStatus::Completed);

    let view = pipeline.status(scan_id, owner_id).await.unwrap();
    assert!(view.started_at.is_some());

    // All three artifacts exist on disk.
    let mut artifact_paths = Vec::new();
    for format in [ReportFormat::Json, ReportFormat::Pdf, ReportFormat::Html] {
        let path = pipeline
            .artifact_path(scan_id, owner_id, format)
            .await
            .unwrap();
        assert!(path.exists(), "{} artifact missing", format);
        artifact_paths.push(path);
    }

    // The structured artifact carries the enriched findings and stats.
    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&artifact_paths[0]).unwrap()).unwrap();
    assert_eq!(report["target_url"], "https://example.com");
    assert_eq!(report["total_count"], 2);
    assert_eq!(report["severity_stats"]["info"], 0);
    assert_eq!(report["severity_stats"]["low"], 1);
    assert_eq!(report["severity_stats"]["medium"], 0);
    assert_eq!(report["severity_stats"]["high"], 1);

    let findings = report["findings"].as_array().unwrap();
    assert_eq!(findings.len(), 2);
    assert_eq!(findings[0]["template-id"], "weak-tls");
    assert_eq!(findings[0]["severity_ai"], "high");
    assert_eq!(
        findings[0]["description_translated"],
        "Translated description text"
    );
    assert_eq!(findings[0]["recommendation_ai"], "Disable weak cipher suites.");
    assert_eq!(findings[1]["severity_ai"], "low");
    // Empty description: no translation call, field stays empty.
    assert_eq!(findings[1]["description_translated"], "");

    // The PDF artifact is a real PDF document.
    let pdf = fs::read(&artifact_paths[1]).unwrap();
    assert!(pdf.starts_with(b"%PDF"));

    // The HTML artifact renders the findings.
    let html = fs::read_to_string(&artifact_paths[2]).unwrap();
    assert!(html.contains("Weak TLS configuration detected"));
    assert!(html.contains("severity high-sev"));

    // Enriched findings were persisted.
    assert_eq!(store.findings_for(scan_id).len(), 2);
}

#[tokio::test]
async fn rejected_target_fails_before_any_subprocess() {
    let tmp = TempDir::new().unwrap();
    let scanner = write_fake_scanner(tmp.path(), TWO_FINDINGS_SCRIPT);
    let reports_dir = tmp.path().join("reports");

    let server = MockServer::start().await;
    let store = Arc::new(MemoryScanStore::new());
    let config = test_config(&scanner, &reports_dir, &server.uri());
    let pipeline = build_pipeline(&config, Arc::clone(&store));

    let owner_id = Uuid::new_v4();
    let scan_id = pipeline
        .submit(
            "http://example.com/path with space".to_string(),
            owner_id,
            None,
        )
        .await
        .unwrap();

    let status = wait_for_terminal(&pipeline, scan_id, owner_id).await;
    assert_eq!(status, ScanStatus::Failed);

    // Validation failed before the transition to In Progress.
    let view = pipeline.status(scan_id, owner_id).await.unwrap();
    assert!(view.started_at.is_none());

    // No artifacts were produced.
    for format in [ReportFormat::Json, ReportFormat::Pdf, ReportFormat::Html] {
        assert!(matches!(
            pipeline.artifact_path(scan_id, owner_id, format).await,
            Err(PipelineError::NotFound)
        ));
    }
    assert!(!reports_dir.exists());
}

#[tokio::test]
async fn cancellation_takes_precedence_over_the_running_task() {
    let tmp = TempDir::new().unwrap();
    let scanner = write_fake_scanner(tmp.path(), SLEEPING_SCRIPT);
    let reports_dir = tmp.path().join("reports");

    let server = MockServer::start().await;
    let store = Arc::new(MemoryScanStore::new());
    let config = test_config(&scanner, &reports_dir, &server.uri());
    let pipeline = build_pipeline(&config, Arc::clone(&store));

    let owner_id = Uuid::new_v4();
    let scan_id = pipeline
        .submit("https://example.com".to_string(), owner_id, None)
        .await
        .unwrap();

    wait_for_status(&pipeline, scan_id, owner_id, ScanStatus::InProgress).await;

    pipeline.cancel(scan_id, owner_id).await.unwrap();

    // The status write happens on the cancel request itself, not when the
    // background task notices.
    let view = pipeline.status(scan_id, owner_id).await.unwrap();
    assert_eq!(view.status, ScanStatus::Canceled);

    // Give the background task time to wind down; the canceled status must
    // survive whatever it does afterwards.
    tokio::time::sleep(Duration::from_millis(500)).await;
    let view = pipeline.status(scan_id, owner_id).await.unwrap();
    assert_eq!(view.status, ScanStatus::Canceled);

    for format in [ReportFormat::Json, ReportFormat::Pdf, ReportFormat::Html] {
        assert!(matches!(
            pipeline.artifact_path(scan_id, owner_id, format).await,
            Err(PipelineError::NotFound)
        ));
    }
}

#[tokio::test]
async fn cancel_after_completion_leaves_the_scan_completed() {
    let tmp = TempDir::new().unwrap();
    let scanner = write_fake_scanner(tmp.path(), TWO_FINDINGS_SCRIPT);
    let reports_dir = tmp.path().join("reports");

    let server = MockServer::start().await;
    mount_inference_mocks(&server).await;

    let store = Arc::new(MemoryScanStore::new());
    let config = test_config(&scanner, &reports_dir, &server.uri());
    let pipeline = build_pipeline(&config, Arc::clone(&store));

    let owner_id = Uuid::new_v4();
    let scan_id = pipeline
        .submit("https://example.com".to_string(), owner_id, None)
        .await
        .unwrap();

    assert_eq!(
        wait_for_terminal(&pipeline, scan_id, owner_id).await,
        ScanStatus::Completed
    );

    pipeline.cancel(scan_id, owner_id).await.unwrap();
    let view = pipeline.status(scan_id, owner_id).await.unwrap();
    assert_eq!(view.status, ScanStatus::Completed);
}

#[tokio::test]
async fn foreign_owner_cannot_observe_or_cancel_a_scan() {
    let tmp = TempDir::new().unwrap();
    let scanner = write_fake_scanner(tmp.path(), SLEEPING_SCRIPT);
    let reports_dir = tmp.path().join("reports");

    let server = MockServer::start().await;
    let store = Arc::new(MemoryScanStore::new());
    let config = test_config(&scanner, &reports_dir, &server.uri());
    let pipeline = build_pipeline(&config, Arc::clone(&store));

    let owner_id = Uuid::new_v4();
    let stranger_id = Uuid::new_v4();
    let scan_id = pipeline
        .submit("https://example.com".to_string(), owner_id, None)
        .await
        .unwrap();

    assert!(matches!(
        pipeline.status(scan_id, stranger_id).await,
        Err(PipelineError::NotFound)
    ));
    assert!(matches!(
        pipeline.cancel(scan_id, stranger_id).await,
        Err(PipelineError::NotFound)
    ));
    assert!(matches!(
        pipeline
            .artifact_path(scan_id, stranger_id, ReportFormat::Json)
            .await,
        Err(PipelineError::NotFound)
    ));

    // The owner still can; clean up the sleeping scan.
    pipeline.cancel(scan_id, owner_id).await.unwrap();
    assert_eq!(
        wait_for_terminal(&pipeline, scan_id, owner_id).await,
        ScanStatus::Canceled
    );
}

#[tokio::test]
async fn scanner_emitting_nothing_completes_with_empty_report() {
    let tmp = TempDir::new().unwrap();
    // Exits non-zero after emitting nothing; that alone must not fail the scan.
    let scanner = write_fake_scanner(tmp.path(), "#!/bin/sh\nexit 2\n");
    let reports_dir = tmp.path().join("reports");

    let server = MockServer::start().await;
    let store = Arc::new(MemoryScanStore::new());
    let config = test_config(&scanner, &reports_dir, &server.uri());
    let pipeline = build_pipeline(&config, Arc::clone(&store));

    let owner_id = Uuid::new_v4();
    let scan_id = pipeline
        .submit("https://example.com".to_string(), owner_id, None)
        .await
        .unwrap();

    assert_eq!(
        wait_for_terminal(&pipeline, scan_id, owner_id).await,
        ScanStatus::Completed
    );

    let json_path = pipeline
        .artifact_path(scan_id, owner_id, ReportFormat::Json)
        .await
        .unwrap();
    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(json_path).unwrap()).unwrap();
    assert_eq!(report["total_count"], 0);
    assert_eq!(report["severity_stats"]["high"], 0);

    let html_path = pipeline
        .artifact_path(scan_id, owner_id, ReportFormat::Html)
        .await
        .unwrap();
    assert!(fs::read_to_string(html_path)
        .unwrap()
        .contains("No vulnerabilities found."));
}
