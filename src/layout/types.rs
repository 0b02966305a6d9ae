//! Runtime table boxes shared by layout, routing and interaction.

use crate::measure::{Bounds, Dimensions};
use crate::model::Table;

/// A table as drawn: top-left corner, width and current height, plus the
/// two heights compaction moves between.
#[derive(Debug, Clone, PartialEq)]
pub struct TableBox {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub full_h: f64,
    pub compact_h: f64,
    /// Position came from the input rather than the layout engine.
    pub pinned: bool,
}

impl TableBox {
    pub fn new(table: &Table, dims: Dimensions, compact: bool) -> Self {
        Self {
            id: table.id.clone(),
            x: table.x.unwrap_or(0.0),
            y: table.y.unwrap_or(0.0),
            w: dims.w,
            h: dims.height(compact),
            full_h: dims.full_h,
            compact_h: dims.compact_h,
            pinned: table.is_positioned(),
        }
    }

    /// Box with explicit geometry, mostly for tests and restored scenes.
    pub fn at(id: impl Into<String>, x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            w,
            h,
            full_h: h,
            compact_h: h,
            pinned: true,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn rect(&self) -> (f64, f64, f64, f64) {
        (self.x, self.y, self.w, self.h)
    }
}

/// Content bounds of a set of boxes.
pub fn bounds(boxes: &[TableBox]) -> Option<Bounds> {
    Bounds::of(boxes.iter().map(TableBox::rect))
}
