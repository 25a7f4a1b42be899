//! Property-based tests for page layout guarantees

use educomic::export::layout::{fit_aspect, place_in_cell, plan_pages, Rect};
use educomic::export::{ExportSpec, Margins, PageSize, PanelsPerPage, Spacing};
use educomic::models::sort_by_index;
use educomic::Panel;
use proptest::prelude::*;

fn export_spec() -> impl Strategy<Value = ExportSpec> {
    (
        prop_oneof![Just(PageSize::A4), Just(PageSize::Letter)],
        prop_oneof![
            Just(PanelsPerPage::One),
            Just(PanelsPerPage::Two),
            Just(PanelsPerPage::Four),
            Just(PanelsPerPage::Six),
        ],
        prop_oneof![Just(Margins::None), Just(Margins::Standard), Just(Margins::Large)],
        prop_oneof![Just(Spacing::None), Just(Spacing::Small), Just(Spacing::Medium)],
    )
        .prop_map(|(page_size, panels_per_page, margins, spacing)| ExportSpec {
            page_size,
            panels_per_page,
            margins,
            spacing,
            ..ExportSpec::default()
        })
}

/// Page count is ceil(n / k) and every artifact gets exactly one cell
#[test]
fn test_page_count_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(0usize..200, export_spec()), |(count, spec)| {
            let pages = plan_pages(count, &spec).unwrap();
            let per_page = spec.panels_per_page.count();
            prop_assert_eq!(pages.len(), count.div_ceil(per_page));
            let placed: usize = pages.iter().map(|p| p.cells.len()).sum();
            prop_assert_eq!(placed, count);
            for page in pages.iter().take(pages.len().saturating_sub(1)) {
                prop_assert_eq!(page.cells.len(), per_page);
            }
            Ok(())
        })
        .unwrap();
}

/// Placed images keep the requested ratio and stay inside the cell's max box
#[test]
fn test_placement_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(20.0f32..600.0, 20.0f32..800.0, 0.0f32..15.0, 0.2f32..5.0),
            |(width, height, spacing, ratio)| {
                let cell = Rect {
                    x: 10.0,
                    y: 10.0,
                    width,
                    height,
                };
                let placed = place_in_cell(&cell, spacing, ratio);
                let max_box = Rect {
                    x: cell.x + spacing / 2.0,
                    y: cell.y + spacing / 2.0,
                    width: width - spacing,
                    height: height - spacing,
                };
                prop_assert!(max_box.contains(&placed, 0.01));
                prop_assert!(((placed.width / placed.height) - ratio).abs() < ratio * 1e-3);

                // One dimension touches the max box.
                let touches_w = (placed.width - max_box.width).abs() < 0.01;
                let touches_h = (placed.height - max_box.height).abs() < 0.01;
                prop_assert!(touches_w || touches_h);
                Ok(())
            },
        )
        .unwrap();
}

/// Degenerate boxes never produce negative sizes
#[test]
fn test_fit_aspect_never_negative() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(-50.0f32..50.0, -50.0f32..50.0, -2.0f32..4.0),
            |(max_w, max_h, ratio)| {
                let (w, h) = fit_aspect(max_w, max_h, ratio);
                prop_assert!(w >= 0.0 && h >= 0.0);
                prop_assert!(w <= max_w.max(0.0) + 1e-3 && h <= max_h.max(0.0) + 1e-3);
                Ok(())
            },
        )
        .unwrap();
}

/// Export order depends only on sequence indices, not arrival order
#[test]
fn test_sort_order_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &Just((0i64..40).collect::<Vec<i64>>()).prop_shuffle(),
            |indices| {
                let mut panels: Vec<Panel> = indices
                    .iter()
                    .map(|&index| Panel {
                        id: format!("p{index}"),
                        chapter_id: None,
                        index,
                        image: String::new(),
                        created_at: None,
                    })
                    .collect();
                sort_by_index(&mut panels);
                let order: Vec<i64> = panels.iter().map(|p| p.index).collect();
                prop_assert_eq!(order, (0i64..40).collect::<Vec<i64>>());
                Ok(())
            },
        )
        .unwrap();
}
