//! Republish flow integration tests.
//!
//! Run with: `cargo test -p sealgate-pipeline --test republish_test`

mod helpers;

use helpers::fixtures;
use helpers::probe::InstrumentedEngine;
use helpers::{screener, screener_with_config, test_engine};
use sealgate_core::models::{FileUpload, InvalidReason};
use sealgate_core::{PipelineError, ScreenerConfig};
use sealgate_engine::ProtectionScheme;
use sealgate_pipeline::ScreenOptions;
use std::sync::atomic::Ordering;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_protected_pdf_republishes_unprotected() {
    let inner = test_engine();
    let sealed = fixtures::sealed_pdf(&inner, 2);
    let engine = InstrumentedEngine::new(inner);
    let probe = engine.probe();
    let screener = screener(engine);

    let upload = FileUpload::new("brief.pdf", sealed);
    let report = screener.screen_upload(&upload).await.unwrap();

    assert!(report.is_valid);
    assert!(report.was_protected);
    let outcome = report.republish.unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.bytes, fixtures::pdf_bytes());
    assert_eq!(probe.opens(), 2, "primary and republish handles");
    assert_eq!(probe.disposes(), 2);
    assert_eq!(probe.commit_kinds(), vec!["buffer"]);
    assert_eq!(probe.labels_applied(), vec!["Public"]);
}

#[tokio::test]
async fn test_republish_artifacts_get_fresh_names() {
    let inner = test_engine();
    let sealed = fixtures::sealed_pdf(&inner, 1);
    let engine = InstrumentedEngine::new(inner);
    let probe = engine.probe();
    let screener = screener(engine);

    let upload = FileUpload::new("brief.pdf", sealed);
    screener.screen_upload(&upload).await.unwrap();
    screener.screen_upload(&upload).await.unwrap();

    let names = probe.open_names();
    assert_eq!(names.len(), 4);
    assert_eq!(names[0], "brief.pdf");
    assert_eq!(names[2], "brief.pdf");
    assert!(names[1].ends_with(".pdf") && names[1] != "brief.pdf");
    assert_ne!(names[1], names[3], "artifact names are never reused");
}

#[tokio::test]
async fn test_unprotected_pdf_is_not_republished() {
    let engine = InstrumentedEngine::new(test_engine());
    let probe = engine.probe();
    let screener = screener(engine);

    let upload = FileUpload::new("plain.pdf", fixtures::pdf_bytes());
    let report = screener.screen_upload(&upload).await.unwrap();

    assert!(report.is_valid);
    assert!(report.republish.is_none());
    assert_eq!(probe.opens(), 1);
    assert_eq!(probe.disposes(), 1);
}

#[tokio::test]
async fn test_rejected_upload_is_not_republished() {
    let inner = test_engine();
    let sealed = fixtures::sealed_pdf(&inner, 3);
    let engine = InstrumentedEngine::new(inner);
    let probe = engine.probe();
    let screener = screener(engine);

    let upload = FileUpload::new("secret.pdf", sealed);
    let report = screener.screen_upload(&upload).await.unwrap();

    assert_eq!(report.reasons, vec![InvalidReason::SensitivityLevel]);
    assert!(report.republish.is_none());
    assert_eq!(probe.opens(), 1, "no republish session for rejected uploads");
}

#[tokio::test]
async fn test_declined_commit_leaves_no_outcome() {
    let inner = test_engine();
    let sealed = fixtures::sealed_pdf(&inner, 1);
    let engine = InstrumentedEngine::new(inner);
    let probe = engine.probe();
    probe.decline_commits();
    let screener = screener(engine);

    let upload = FileUpload::new("brief.pdf", sealed);
    let report = screener.screen_upload(&upload).await.unwrap();

    assert!(
        report.is_valid,
        "a declined commit does not invalidate the file"
    );
    assert!(report.republish.is_none());
    assert_eq!(probe.commit_kinds(), vec!["buffer"]);
    assert_eq!(probe.disposes(), 2);
}

#[tokio::test]
async fn test_transient_labeling_failure_is_retried_once() {
    let inner = test_engine();
    let sealed = fixtures::sealed_pdf(&inner, 1);
    let engine = InstrumentedEngine::new(inner);
    let probe = engine.probe();
    probe.fail_labeling(1);
    let screener = screener(engine);

    let upload = FileUpload::new("brief.pdf", sealed);
    let report = screener.screen_upload(&upload).await.unwrap();

    assert!(report.is_valid);
    assert!(report.republish.is_some());
    assert_eq!(probe.set_label_calls.load(Ordering::SeqCst), 2);
    assert_eq!(probe.labels_applied(), vec!["Public"]);
}

#[tokio::test]
async fn test_persistent_labeling_failure_wipes_the_report() {
    let inner = test_engine();
    let sealed = fixtures::sealed_pdf(&inner, 1);
    let engine = InstrumentedEngine::new(inner);
    let probe = engine.probe();
    probe.fail_labeling(2);
    let screener = screener(engine);

    let upload = FileUpload::new("brief.pdf", sealed);
    let report = screener.screen_upload(&upload).await.unwrap();

    assert!(!report.is_valid);
    assert_eq!(report.reasons, vec![InvalidReason::Unknown]);
    assert!(
        report.decrypted_bytes.is_none(),
        "late failure wipes earlier state"
    );
    assert!(report.republish.is_none());
    assert_eq!(probe.disposes(), 2, "both handles cleaned up");
}

#[tokio::test]
async fn test_default_label_overrides_lowest_catalog_entry() {
    let inner = test_engine();
    let sealed = fixtures::sealed_pdf(&inner, 2);
    let general = fixtures::label(&inner, 1);
    let engine = InstrumentedEngine::new(inner.with_default_label(general));
    let probe = engine.probe();
    let screener = screener(engine);

    let upload = FileUpload::new("brief.pdf", sealed);
    let report = screener.screen_upload(&upload).await.unwrap();

    assert!(report.is_valid);
    assert!(report.republish.is_some());
    assert_eq!(probe.labels_applied(), vec!["General"]);
}

#[tokio::test]
async fn test_oversized_payload_spills_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let inner = test_engine();
    let mut payload = fixtures::pdf_bytes();
    payload.resize(1024 * 1024 + 1, b' ');
    let sealed = inner
        .seal(
            &payload,
            &fixtures::label(&inner, 1),
            ProtectionScheme::TemplateBased,
        )
        .unwrap();
    let engine = InstrumentedEngine::new(inner);
    let probe = engine.probe();
    let config = ScreenerConfig {
        republish_spill_mb: 1,
        temp_dir: dir.path().to_path_buf(),
        ..ScreenerConfig::default()
    };
    let screener = screener_with_config(engine, config);

    let upload = FileUpload::new("big.pdf", sealed);
    let report = screener.screen_upload(&upload).await.unwrap();

    assert!(report.is_valid);
    let outcome = report.republish.unwrap();
    assert_eq!(outcome.bytes, payload);
    assert_eq!(probe.commit_kinds(), vec!["path"]);

    let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert!(leftovers.is_empty(), "spill file must be removed");
}

#[tokio::test]
async fn test_payload_at_threshold_commits_in_memory() {
    let inner = test_engine();
    let mut payload = fixtures::pdf_bytes();
    payload.resize(1024 * 1024, b' ');
    let sealed = inner
        .seal(
            &payload,
            &fixtures::label(&inner, 1),
            ProtectionScheme::TemplateBased,
        )
        .unwrap();
    let engine = InstrumentedEngine::new(inner);
    let probe = engine.probe();
    let config = ScreenerConfig {
        republish_spill_mb: 1,
        ..ScreenerConfig::default()
    };
    let screener = screener_with_config(engine, config);

    let upload = FileUpload::new("exact.pdf", sealed);
    let report = screener.screen_upload(&upload).await.unwrap();

    assert!(report.is_valid);
    assert_eq!(report.republish.unwrap().bytes, payload);
    assert_eq!(probe.commit_kinds(), vec!["buffer"]);
}

#[tokio::test]
async fn test_cancellation_during_republish_cleans_both_handles() {
    let inner = test_engine();
    let sealed = fixtures::sealed_pdf(&inner, 1);
    let engine = InstrumentedEngine::new(inner);
    let probe = engine.probe();
    let screener = screener(engine);

    let cancel = CancellationToken::new();
    probe.cancel_at_open(2, cancel.clone());

    let options = ScreenOptions {
        republish: true,
        ..ScreenOptions::default()
    };
    let err = screener
        .screen_with_cancel(&sealed, "brief.pdf", ".pdf", &options, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Cancelled));
    assert_eq!(probe.opens(), 2);
    assert_eq!(
        probe.disposes(),
        2,
        "republish handle cleaned after cancellation"
    );
}
