//! Pipeline runs against throwaway projects.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use super::fixture::*;
use crate::core::{AttemptStatus, BuildError, BuildTrigger, Published, Stage};

#[tokio::test]
async fn test_valid_document_is_published() {
    let project = TestProject::new(COMPILE_OK);
    let attempt = project
        .runner()
        .run(BuildTrigger::initial(), CancellationToken::new())
        .await;

    assert_eq!(attempt.status(), &AttemptStatus::Succeeded(Published::Replaced));
    assert_eq!(attempt.stage(), Stage::Publish);
    assert_eq!(project.published().unwrap(), DOCUMENT.as_bytes());
    assert!(project.root().join("bld/doc.tex").is_file());
}

#[tokio::test]
async fn test_rebuild_without_changes_is_identical() {
    let project = TestProject::new(COMPILE_OK);
    let runner = project.runner();

    let first = runner.run(BuildTrigger::new(1), CancellationToken::new()).await;
    let before = project.published().unwrap();
    let second = runner.run(BuildTrigger::new(2), CancellationToken::new()).await;

    assert!(first.succeeded());
    assert_eq!(second.status(), &AttemptStatus::Succeeded(Published::Unchanged));
    assert_eq!(project.published().unwrap(), before);
}

#[tokio::test]
async fn test_compile_error_keeps_previous_artifact() {
    let project = TestProject::new(COMPILE_CHECKED);
    let runner = project.runner();

    assert!(runner.run(BuildTrigger::new(1), CancellationToken::new()).await.succeeded());
    let good = project.published().unwrap();

    project.write_source("doc.tex", "BROKEN\n");
    let attempt = runner.run(BuildTrigger::new(2), CancellationToken::new()).await;

    assert_eq!(attempt.stage(), Stage::Compile);
    let Some(BuildError::Compile { log_excerpt }) = attempt.error_detail() else {
        panic!("expected compile failure, got {:?}", attempt.status());
    };
    assert!(log_excerpt.contains("! Undefined control sequence."));
    assert!(log_excerpt.contains("l.1 BROKEN"));
    assert_eq!(project.published().unwrap(), good);

    // Fixing the document recovers.
    project.write_source("doc.tex", "fixed\n");
    let attempt = runner.run(BuildTrigger::new(3), CancellationToken::new()).await;
    assert!(attempt.succeeded());
    assert_eq!(project.published().unwrap(), b"fixed\n");
}

#[tokio::test]
async fn test_compile_error_excerpt_skips_banner() {
    let project = TestProject::new(COMPILE_ERROR);
    let attempt = project
        .runner()
        .run(BuildTrigger::initial(), CancellationToken::new())
        .await;

    let detail = attempt.error_detail().unwrap().detail();
    assert!(detail.starts_with("! Undefined control sequence."));
    assert!(!detail.contains("LuaHBTeX"));
    assert!(project.published().is_none());
}

#[tokio::test]
async fn test_sync_failure_aborts_before_compile() {
    let mut project = TestProject::new(COMPILE_OK);
    project.config.sync.command = sh("echo 'rsync: permission denied' >&2; exit 23");

    let attempt = project
        .runner()
        .run(BuildTrigger::initial(), CancellationToken::new())
        .await;

    assert_eq!(attempt.stage(), Stage::Sync);
    let Some(BuildError::Sync { detail }) = attempt.error_detail() else {
        panic!("expected sync failure, got {:?}", attempt.status());
    };
    assert!(detail.contains("permission denied"));
    assert!(!project.root().join("bld/doc.pdf").exists());
    assert!(project.published().is_none());
}

#[tokio::test]
async fn test_missing_output_is_publish_error() {
    let project = TestProject::new("true");
    let attempt = project
        .runner()
        .run(BuildTrigger::initial(), CancellationToken::new())
        .await;

    assert_eq!(attempt.stage(), Stage::Publish);
    assert!(matches!(attempt.error_detail(), Some(BuildError::Publish { .. })));
}

#[tokio::test]
async fn test_cancel_terminates_compiler() {
    let project = TestProject::new(COMPILE_SLOW);
    let runner = project.runner();
    let cancel = CancellationToken::new();

    let task = tokio::spawn({
        let cancel = cancel.clone();
        async move { runner.run(BuildTrigger::new(1), cancel).await }
    });

    tokio::time::sleep(Duration::from_millis(300)).await;
    let start = Instant::now();
    cancel.cancel();
    let attempt = task.await.unwrap();

    assert!(attempt.is_cancelled());
    assert!(attempt.error_detail().is_none());
    assert!(start.elapsed() < Duration::from_secs(10));
    assert!(project.published().is_none());
}

#[tokio::test]
async fn test_cancelled_before_start_never_publishes() {
    let project = TestProject::new(COMPILE_OK);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let attempt = project.runner().run(BuildTrigger::new(1), cancel).await;
    assert!(attempt.is_cancelled());
    assert_eq!(attempt.stage(), Stage::Sync);
    assert!(project.published().is_none());
}

#[tokio::test]
async fn test_sync_only_mirrors_sources() {
    let project = TestProject::new(COMPILE_OK);
    project.write_source("refs.bib", "@book{x}");

    project
        .runner()
        .sync_only(&CancellationToken::new())
        .await
        .unwrap();

    assert!(project.root().join("bld/doc.tex").is_file());
    assert!(project.root().join("bld/refs.bib").is_file());
    assert!(!project.root().join("bld/doc.pdf").exists());
}
