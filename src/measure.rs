use unicode_width::UnicodeWidthStr;

use crate::model::Table;

/// Font class a piece of table text is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextClass {
    Title,
    CellName,
    CellType,
}

/// Approximate text metrics: display columns times a per-class advance.
#[derive(Debug, Clone)]
pub struct TextMetrics {
    pub title_char_width: f64,
    pub name_char_width: f64,
    pub type_char_width: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            title_char_width: 8.5,
            name_char_width: 7.5,
            type_char_width: 7.0,
        }
    }
}

impl TextMetrics {
    pub fn text_width(&self, text: &str, class: TextClass) -> f64 {
        let advance = match class {
            TextClass::Title => self.title_char_width,
            TextClass::CellName => self.name_char_width,
            TextClass::CellType => self.type_char_width,
        };
        UnicodeWidthStr::width(text) as f64 * advance
    }
}

/// Box geometry constants shared by sizing, rendering and compaction.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub pad_x: f64,
    pub row_height: f64,
    pub header_height: f64,
    pub min_width: f64,
    pub name_type_gap: f64,
    pub header_radius: f64,
    /// Rows kept visible in compact mode.
    pub compact_rows: usize,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            pad_x: 18.0,
            row_height: 28.0,
            header_height: 34.0,
            min_width: 260.0,
            name_type_gap: 18.0,
            header_radius: 8.0,
            compact_rows: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    pub w: f64,
    pub full_h: f64,
    pub compact_h: f64,
}

impl Dimensions {
    pub fn height(&self, compact: bool) -> f64 {
        if compact { self.compact_h } else { self.full_h }
    }
}

impl Geometry {
    pub fn measure(&self, table: &Table, metrics: &TextMetrics) -> Dimensions {
        let title_w = metrics.text_width(&table.id, TextClass::Title);
        let (name_w, type_w) = table.fields.iter().fold((0.0f64, 0.0f64), |(n, t), c| {
            (
                n.max(metrics.text_width(&c.name, TextClass::CellName)),
                t.max(metrics.text_width(&c.typ, TextClass::CellType)),
            )
        });

        let content_w = title_w.max(name_w + self.name_type_gap + type_w);
        let rows = table.fields.len();
        Dimensions {
            w: self.min_width.max(self.pad_x + content_w + self.pad_x),
            full_h: self.height_for_rows(rows),
            compact_h: self.height_for_rows(rows.min(self.compact_rows)),
        }
    }

    pub fn height_for_rows(&self, rows: usize) -> f64 {
        self.header_height + rows as f64 * self.row_height
    }

    /// Baseline of row `i` (text is vertically centered, +5 for the font).
    pub fn row_baseline(&self, i: usize) -> f64 {
        self.header_height + i as f64 * self.row_height + self.row_height / 2.0 + 5.0
    }

    pub fn is_extra_row(&self, i: usize) -> bool {
        i >= self.compact_rows
    }
}

/// Axis-aligned extent of a set of boxes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Bounds of `(x, y, w, h)` rectangles; `None` when there are none.
    pub fn of(rects: impl IntoIterator<Item = (f64, f64, f64, f64)>) -> Option<Self> {
        rects.into_iter().fold(None, |acc, (x, y, w, h)| {
            let b = acc.unwrap_or(Bounds {
                min_x: f64::INFINITY,
                min_y: f64::INFINITY,
                max_x: f64::NEG_INFINITY,
                max_y: f64::NEG_INFINITY,
            });
            Some(Bounds {
                min_x: b.min_x.min(x),
                min_y: b.min_y.min(y),
                max_x: b.max_x.max(x + w),
                max_y: b.max_y.max(y + h),
            })
        })
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Path for a rectangle whose top corners are rounded.
pub fn rounded_top_rect_path(w: f64, h: f64, radius: f64) -> String {
    let r = radius.min(w / 2.0).min(h);
    format!(
        "M0,{r} Q0,0 {r},0 H{} Q{w},0 {w},{r} V{h} H0 Z",
        w - r
    )
}
