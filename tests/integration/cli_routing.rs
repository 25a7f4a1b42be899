//! Integration tests for the CLI route table over an in-memory backend

use crate::integration::test_utils::{chapter, panel, png_data_uri, MockBackend};
use clap::Parser;
use educomic::cli::{Cli, RunContext};
use educomic::config::EduComicConfig;
use educomic::{ChapterId, ChapterSummary, ComicError};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tempfile::TempDir;

fn summary(id: &str, index: i64) -> ChapterSummary {
    ChapterSummary {
        id: ChapterId::new(id),
        index,
        story_title: Some(format!("Chapter {index}")),
        thumbnail_url: None,
        created_at: None,
    }
}

fn context(backend: Arc<MockBackend>, workspace: &TempDir) -> RunContext {
    let mut config = EduComicConfig::default();
    config.polling.interval_ms = 10;
    RunContext::with_backend(config, workspace.path().to_path_buf(), backend).unwrap()
}

async fn run(ctx: &RunContext, args: &[&str]) -> Result<String, ComicError> {
    let mut argv = vec!["educomic"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();
    ctx.execute_async(&cli.command).await
}

#[tokio::test]
async fn test_ideas_lists_three_candidates() {
    let workspace = TempDir::new().unwrap();
    let ctx = context(Arc::new(MockBackend::new(vec![])), &workspace);
    let output = run(&ctx, &["ideas", "--classroom", "class-1", "--outline", "Photosynthesis"])
        .await
        .unwrap();
    assert!(output.contains("[idea-1] Photosynthesis #1"));
    assert!(output.contains("[idea-3]"));

    let err = run(&ctx, &["ideas", "--classroom", "class-1", "--outline", " "])
        .await
        .unwrap_err();
    assert!(matches!(err, ComicError::InvalidChoice(_)));
}

#[tokio::test]
async fn test_generate_with_export_writes_pdf() {
    let workspace = TempDir::new().unwrap();
    let backend = Arc::new(MockBackend::new(vec![
        Ok(chapter("chapter-1", "generating", vec![])),
        Ok(chapter(
            "chapter-1",
            "ready",
            vec![panel(1, png_data_uri(4, 4)), panel(0, png_data_uri(4, 4))],
        )),
    ]).with_draft());
    let ctx = context(backend.clone(), &workspace);

    let output = run(
        &ctx,
        &[
            "generate",
            "--chapter",
            "chapter-1",
            "--idea",
            "idea-1",
            "--classroom",
            "class-1",
            "--export",
            "--per-page",
            "1",
            "--out",
            "pdfs",
        ],
    )
    .await
    .unwrap();

    assert!(output.contains("is ready with 2 panel(s)"));
    assert_eq!(backend.commits.load(Ordering::SeqCst), 1);
    let pdf = workspace.path().join("pdfs").join("The Water Cycle.pdf");
    assert!(pdf.exists(), "expected {}", pdf.display());
    let doc = lopdf::Document::load(&pdf).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
}

#[tokio::test]
async fn test_generate_looks_up_classroom_when_omitted() {
    let workspace = TempDir::new().unwrap();
    let backend = Arc::new(MockBackend::new(vec![
        Ok(chapter("chapter-1", "generating", vec![])),
        Ok(chapter("chapter-1", "failed", vec![])),
    ]).with_draft());
    let ctx = context(backend.clone(), &workspace);

    let err = run(&ctx, &["generate", "--chapter", "chapter-1", "--idea", "idea-1"])
        .await
        .unwrap_err();
    assert!(matches!(err, ComicError::GenerationFailed(_)));
    assert_eq!(backend.commits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_generate_rejects_bad_layout_before_commit() {
    let workspace = TempDir::new().unwrap();
    let backend = Arc::new(
        MockBackend::new(vec![Ok(chapter("chapter-1", "ready", vec![]))]).with_draft(),
    );
    let ctx = context(backend.clone(), &workspace);

    let err = run(
        &ctx,
        &[
            "generate",
            "--chapter",
            "chapter-1",
            "--idea",
            "idea-1",
            "--classroom",
            "class-1",
            "--export",
            "--per-page",
            "5",
        ],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ComicError::InvalidChoice(_)));
    assert_eq!(backend.commits.load(Ordering::SeqCst), 0);
    assert_eq!(backend.draft_fetches.load(Ordering::SeqCst), 0);
    assert_eq!(backend.fetch_count(), 0);
}

#[tokio::test]
async fn test_generate_rejects_idea_the_draft_does_not_offer() {
    let workspace = TempDir::new().unwrap();
    let backend = Arc::new(MockBackend::new(vec![]).with_draft());
    let ctx = context(backend.clone(), &workspace);

    let err = run(
        &ctx,
        &["generate", "--chapter", "chapter-1", "--idea", "idea-9", "--classroom", "class-1"],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ComicError::InvalidChoice(_)));
    assert_eq!(backend.commits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_neighbours_and_unknown_chapter() {
    let workspace = TempDir::new().unwrap();
    let backend = Arc::new(
        MockBackend::new(vec![]).with_chapters(vec![
            summary("c3", 3),
            summary("c1", 1),
            summary("c2", 2),
        ]),
    );
    let ctx = context(backend, &workspace);

    let output = run(&ctx, &["neighbours", "class-1", "c2"]).await.unwrap();
    assert!(output.contains("Previous: c1"));
    assert!(output.contains("Next:     c3"));

    let err = run(&ctx, &["neighbours", "class-1", "c9"]).await.unwrap_err();
    assert!(matches!(err, ComicError::NotFound(_)));
}

#[tokio::test]
async fn test_chapters_json_and_delete() {
    let workspace = TempDir::new().unwrap();
    let backend = Arc::new(MockBackend::new(vec![]).with_chapters(vec![summary("c1", 1)]));
    let ctx = context(backend.clone(), &workspace);

    let output = run(&ctx, &["chapters", "class-1", "--format", "json"])
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["total"], 1);
    assert_eq!(value["chapters"][0]["id"], "c1");

    let output = run(&ctx, &["delete", "c1"]).await.unwrap();
    assert_eq!(output, "Deleted chapter c1");
    assert_eq!(backend.deletes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_config_commands() {
    let workspace = TempDir::new().unwrap();
    let ctx = context(Arc::new(MockBackend::new(vec![])), &workspace);

    let shown = run(&ctx, &["config", "show"]).await.unwrap();
    assert!(shown.contains("base_url = \"http://localhost:8000\""));
    assert!(shown.contains("interval_ms = 10"));

    let validated = run(&ctx, &["config", "validate"]).await.unwrap();
    assert_eq!(validated, "Configuration is valid.");

    let health = run(&ctx, &["health"]).await.unwrap();
    assert_eq!(health, "Backend is healthy");
}
