//! Integration tests for the poll-then-export pipeline

use crate::integration::test_utils::{chapter, panel, png_data_uri, MockBackend};
use educomic::export::{AspectPolicy, PageSize, PanelsPerPage};
use educomic::{
    ChapterId, ComicError, DocumentExporter, ExportSpec, HttpTimeouts, PollPolicy,
    SessionHandle, SessionRegistry, StatusPoller, TokioScheduler,
};
use lopdf::content::Content;
use lopdf::Document;
use std::sync::Arc;
use std::time::Duration;

/// Number of images drawn on each page, in page order.
fn images_per_page(bytes: &[u8]) -> Vec<usize> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
            content
                .operations
                .iter()
                .filter(|op| op.operator == "Do")
                .count()
        })
        .collect()
}

/// Pixel width of each image drawn on each page, in drawing order.
fn drawn_widths(bytes: &[u8]) -> Vec<Vec<i64>> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let page = doc.get_dictionary(page_id).unwrap();
            let resources = doc
                .get_dictionary(page.get(b"Resources").unwrap().as_reference().unwrap())
                .unwrap();
            let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
            let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
            content
                .operations
                .iter()
                .filter(|op| op.operator == "Do")
                .map(|op| {
                    let name = op.operands[0].as_name().unwrap();
                    let image_id = xobjects.get(name).unwrap().as_reference().unwrap();
                    let image = doc.get_object(image_id).unwrap().as_stream().unwrap();
                    image.dict.get(b"Width").unwrap().as_i64().unwrap()
                })
                .collect()
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_ready_chapter_exports_every_panel() {
    let panels = (0..5).rev().map(|i| panel(i, png_data_uri(8, 8))).collect();
    let backend = Arc::new(MockBackend::new(vec![
        Ok(chapter("chapter-1", "generating", vec![])),
        Ok(chapter("chapter-1", "ready", panels)),
    ]));
    let registry = SessionRegistry::new();
    let handle = SessionHandle::resume(&registry, ChapterId::new("chapter-1")).unwrap();
    let policy = PollPolicy {
        interval: Duration::from_millis(500),
        ..PollPolicy::default()
    };

    let report = StatusPoller::new(handle, backend, Arc::new(TokioScheduler), policy)
        .run()
        .await;
    assert!(report.outcome.is_ready());

    let spec = ExportSpec {
        panels_per_page: PanelsPerPage::Four,
        ..ExportSpec::default()
    };
    let exporter = DocumentExporter::new(HttpTimeouts::default()).unwrap();
    let document = exporter.export_session(&report.session, &spec).await.unwrap();

    assert_eq!(document.file_name, "The Water Cycle.pdf");
    assert_eq!(document.page_count, 2);
    assert_eq!(document.embedded, 5);
    assert!(document.skipped.is_empty());
    assert_eq!(images_per_page(&document.bytes), vec![4, 1]);
}

#[tokio::test]
async fn test_export_mixes_payload_kinds_and_skips_broken_ones() {
    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("panel.png");
    let uri = png_data_uri(12, 6);
    let png = {
        use base64::Engine;
        let encoded = uri.trim_start_matches("data:image/png;base64,");
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap()
    };
    std::fs::write(&local, png).unwrap();

    let snapshot = chapter(
        "chapter-1",
        "ready",
        vec![
            panel(0, uri.clone()),
            panel(1, local.to_string_lossy().into_owned()),
            panel(2, dir.path().join("missing.png").to_string_lossy().into_owned()),
            panel(3, format!("file://{}", local.display())),
        ],
    );

    let spec = ExportSpec {
        page_size: PageSize::Letter,
        panels_per_page: PanelsPerPage::Two,
        aspect: AspectPolicy::Native,
        ..ExportSpec::default()
    };
    let exporter = DocumentExporter::new(HttpTimeouts::default()).unwrap();
    let document = exporter.export_chapter(&snapshot, &spec).await.unwrap();

    assert_eq!(document.page_count, 2);
    assert_eq!(document.embedded, 3);
    assert_eq!(document.skipped.len(), 1);
    assert_eq!(document.skipped[0].index, 2);
    assert_eq!(images_per_page(&document.bytes), vec![2, 1]);

    let err: ComicError = document.skipped[0].clone().into();
    assert!(matches!(err, ComicError::EmbedFailure { index: 2, .. }));

    let path = document.write_to_dir(&dir.path().join("out")).unwrap();
    assert!(path.exists());
}

#[tokio::test]
async fn test_panels_are_drawn_in_sequence_order() {
    // Panel i is 4 + i pixels wide, so widths identify panels in the document.
    let panels = [3, 0, 5, 1, 4, 2]
        .into_iter()
        .map(|i| panel(i, png_data_uri(4 + i as u32, 4)))
        .collect();
    let snapshot = chapter("chapter-1", "ready", panels);
    let spec = ExportSpec {
        panels_per_page: PanelsPerPage::Four,
        ..ExportSpec::default()
    };
    let exporter = DocumentExporter::new(HttpTimeouts::default()).unwrap();
    let document = exporter.export_chapter(&snapshot, &spec).await.unwrap();

    assert_eq!(document.embedded, 6);
    assert_eq!(
        drawn_widths(&document.bytes),
        vec![vec![4, 5, 6, 7], vec![8, 9]]
    );
}

#[tokio::test]
async fn test_chapter_without_panels_has_nothing_to_export() {
    let exporter = DocumentExporter::new(HttpTimeouts::default()).unwrap();
    let err = exporter
        .export_chapter(&chapter("chapter-1", "ready", vec![]), &ExportSpec::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ComicError::NothingToExport));
}
