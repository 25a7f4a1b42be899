//! Page layout arithmetic for panel export.
//!
//! All coordinates are PDF points with the origin at the bottom-left of the
//! page. Cells are filled row-major starting at the top-left.

use std::fmt;
use std::str::FromStr;

use crate::error::ComicError;

/// Millimetres to PDF points.
pub const MM_TO_PT: f32 = 72.0 / 25.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
}

impl PageSize {
    /// Portrait width and height in points.
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelsPerPage {
    One,
    #[default]
    Two,
    Four,
    Six,
}

impl PanelsPerPage {
    pub fn count(self) -> usize {
        let (cols, rows) = self.grid();
        cols * rows
    }

    /// Grid as (columns, rows).
    pub fn grid(self) -> (usize, usize) {
        match self {
            PanelsPerPage::One => (1, 1),
            PanelsPerPage::Two => (1, 2),
            PanelsPerPage::Four => (2, 2),
            PanelsPerPage::Six => (2, 3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Margins {
    None,
    #[default]
    Standard,
    Large,
}

impl Margins {
    pub fn points(self) -> f32 {
        match self {
            Margins::None => 0.0,
            Margins::Standard => 15.0 * MM_TO_PT,
            Margins::Large => 25.0 * MM_TO_PT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Spacing {
    None,
    #[default]
    Small,
    Medium,
}

impl Spacing {
    pub fn points(self) -> f32 {
        match self {
            Spacing::None => 0.0,
            Spacing::Small => 4.0 * MM_TO_PT,
            Spacing::Medium => 8.0 * MM_TO_PT,
        }
    }
}

/// How a panel's aspect ratio is chosen when fitting it into a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectPolicy {
    /// Every panel is laid out 1:1.
    #[default]
    Square,
    /// Use each decoded image's own width and height.
    Native,
}

macro_rules! named_choice {
    ($ty:ty, { $($name:literal => $value:expr),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($value),)+
                    other => Err(format!(
                        "Invalid value '{}' (expected one of: {})",
                        other,
                        [$($name),+].join(", ")
                    )),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                $(if *self == $value {
                    return f.write_str($name);
                })+
                Ok(())
            }
        }
    };
}

named_choice!(PageSize, { "a4" => PageSize::A4, "letter" => PageSize::Letter });
named_choice!(PanelsPerPage, {
    "1" => PanelsPerPage::One,
    "2" => PanelsPerPage::Two,
    "4" => PanelsPerPage::Four,
    "6" => PanelsPerPage::Six,
});
named_choice!(Margins, {
    "none" => Margins::None,
    "standard" => Margins::Standard,
    "large" => Margins::Large,
});
named_choice!(Spacing, {
    "none" => Spacing::None,
    "small" => Spacing::Small,
    "medium" => Spacing::Medium,
});
named_choice!(AspectPolicy, { "square" => AspectPolicy::Square, "native" => AspectPolicy::Native });

/// How artifacts are laid out into a document. Fixed once export begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportSpec {
    pub page_size: PageSize,
    pub panels_per_page: PanelsPerPage,
    pub margins: Margins,
    pub spacing: Spacing,
    pub aspect: AspectPolicy,
}

/// Axis-aligned rectangle in points; `(x, y)` is the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn contains(&self, other: &Rect, tolerance: f32) -> bool {
        other.x >= self.x - tolerance
            && other.y >= self.y - tolerance
            && other.x + other.width <= self.x + self.width + tolerance
            && other.y + other.height <= self.y + self.height + tolerance
    }
}

/// Cells of one page, one per artifact placed on it.
#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    pub cells: Vec<Rect>,
}

/// Page area left after removing the margins on all four sides.
pub fn usable_area(spec: &ExportSpec) -> Result<Rect, ComicError> {
    let (page_w, page_h) = spec.page_size.dimensions();
    let margin = spec.margins.points();
    let width = page_w - 2.0 * margin;
    let height = page_h - 2.0 * margin;
    if width <= 0.0 || height <= 0.0 {
        return Err(ComicError::DocumentAssemblyFailure(format!(
            "Margins of {:.1}pt leave no room on a {} page",
            margin, spec.page_size
        )));
    }
    Ok(Rect {
        x: margin,
        y: margin,
        width,
        height,
    })
}

/// All grid cells of a page in row-major order, top row first.
pub fn grid_cells(spec: &ExportSpec) -> Result<Vec<Rect>, ComicError> {
    let area = usable_area(spec)?;
    let (cols, rows) = spec.panels_per_page.grid();
    let cell_w = area.width / cols as f32;
    let cell_h = area.height / rows as f32;
    let mut cells = Vec::with_capacity(cols * rows);
    for row in 0..rows {
        for col in 0..cols {
            cells.push(Rect {
                x: area.x + col as f32 * cell_w,
                y: area.y + area.height - (row + 1) as f32 * cell_h,
                width: cell_w,
                height: cell_h,
            });
        }
    }
    Ok(cells)
}

/// Assign `count` artifacts to cells, starting a new page whenever the
/// current page is full.
pub fn plan_pages(count: usize, spec: &ExportSpec) -> Result<Vec<PagePlan>, ComicError> {
    let cells = grid_cells(spec)?;
    let per_page = cells.len();
    let pages = (0..count)
        .step_by(per_page)
        .map(|start| PagePlan {
            cells: cells[..per_page.min(count - start)].to_vec(),
        })
        .collect();
    Ok(pages)
}

/// Largest `width / height == ratio` box within `max_w` x `max_h`.
pub fn fit_aspect(max_w: f32, max_h: f32, ratio: f32) -> (f32, f32) {
    if max_w <= 0.0 || max_h <= 0.0 || !ratio.is_finite() || ratio <= 0.0 {
        return (0.0, 0.0);
    }
    if max_w / ratio <= max_h {
        (max_w, max_w / ratio)
    } else {
        (max_h * ratio, max_h)
    }
}

/// Image rectangle inside `cell`: the max box is the cell minus spacing, the
/// image keeps `ratio` and is centred on both axes.
pub fn place_in_cell(cell: &Rect, spacing: f32, ratio: f32) -> Rect {
    let max_w = (cell.width - spacing).max(0.0);
    let max_h = (cell.height - spacing).max(0.0);
    let (width, height) = fit_aspect(max_w, max_h, ratio);
    Rect {
        x: cell.x + (cell.width - width) / 2.0,
        y: cell.y + (cell.height - height) / 2.0,
        width,
        height,
    }
}
