//! Anchor sides and slot distribution on table boxes.

use std::collections::HashMap;

use super::Point;
use crate::layout::TableBox;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    /// Left and right sides; lines leave them horizontally.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }

    /// Outward unit vector.
    pub fn direction(self) -> (f64, f64) {
        match self {
            Side::Left => (-1.0, 0.0),
            Side::Right => (1.0, 0.0),
            Side::Top => (0.0, -1.0),
            Side::Bottom => (0.0, 1.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
            Side::Top => "top",
            Side::Bottom => "bottom",
        }
    }
}

/// Side of `a` facing `b`, by the dominant axis of the center-to-center
/// vector. Ties go vertical.
pub fn auto_side(a: &TableBox, b: &TableBox) -> Side {
    let (ax, ay) = a.center();
    let (bx, by) = b.center();
    let (dx, dy) = (bx - ax, by - ay);
    if dx.abs() > dy.abs() {
        if dx > 0.0 { Side::Right } else { Side::Left }
    } else if dy > 0.0 {
        Side::Bottom
    } else {
        Side::Top
    }
}

/// Point on `side` of `b` for slot `slot` of `total`. A lone edge uses the
/// side midpoint; otherwise slots split the side minus `padding` at both
/// ends into `total + 1` equal parts.
pub fn anchor_point(b: &TableBox, side: Side, slot: usize, total: usize, padding: f64) -> Point {
    let t = if total <= 1 {
        0.5
    } else {
        (slot + 1) as f64 / (total + 1) as f64
    };
    let along = |start: f64, len: f64| {
        if total <= 1 {
            start + len / 2.0
        } else {
            start + padding + (len - 2.0 * padding) * t
        }
    };
    match side {
        Side::Left => Point::new(b.x, along(b.y, b.h)),
        Side::Right => Point::new(b.x + b.w, along(b.y, b.h)),
        Side::Top => Point::new(along(b.x, b.w), b.y),
        Side::Bottom => Point::new(along(b.x, b.w), b.y + b.h),
    }
}

/// One end of a planned edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndPlan {
    pub table: usize,
    pub side: Side,
    pub slot: usize,
    pub total: usize,
}

/// Sides and slots for both ends of every edge given as `(from, to)` box
/// indices. Ends sharing a side are ordered by the other end's center along
/// that side, so lines leaving one side do not cross each other.
pub fn plan_ends(boxes: &[TableBox], edges: &[(usize, usize)]) -> Vec<(EndPlan, EndPlan)> {
    let sides: Vec<(Side, Side)> = edges
        .iter()
        .map(|&(a, b)| (auto_side(&boxes[a], &boxes[b]), auto_side(&boxes[b], &boxes[a])))
        .collect();

    // (table, side) -> [(sort key, edge index, end)]; end 0 = from, 1 = to
    let mut groups: HashMap<(usize, Side), Vec<(f64, usize, u8)>> = HashMap::new();
    for (k, (&(a, b), &(sa, sb))) in edges.iter().zip(&sides).enumerate() {
        groups
            .entry((a, sa))
            .or_default()
            .push((sort_key(&boxes[b], sa), k, 0));
        groups
            .entry((b, sb))
            .or_default()
            .push((sort_key(&boxes[a], sb), k, 1));
    }

    let mut plans: Vec<[Option<EndPlan>; 2]> = vec![[None, None]; edges.len()];
    for ((table, side), mut ends) in groups {
        ends.sort_by(|x, y| {
            x.0.total_cmp(&y.0)
                .then(x.1.cmp(&y.1))
                .then(x.2.cmp(&y.2))
        });
        let total = ends.len();
        for (slot, &(_, k, end)) in ends.iter().enumerate() {
            plans[k][end as usize] = Some(EndPlan {
                table,
                side,
                slot,
                total,
            });
        }
    }

    edges
        .iter()
        .zip(sides)
        .zip(plans)
        .map(|((&(a, b), (sa, sb)), [from, to])| {
            let fallback = |table, side| EndPlan {
                table,
                side,
                slot: 0,
                total: 1,
            };
            (
                from.unwrap_or_else(|| fallback(a, sa)),
                to.unwrap_or_else(|| fallback(b, sb)),
            )
        })
        .collect()
}

fn sort_key(other: &TableBox, side: Side) -> f64 {
    let (cx, cy) = other.center();
    if side.is_horizontal() { cy } else { cx }
}
