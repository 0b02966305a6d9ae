//! Link routing between placed tables.
//!
//! Every edge gets a side on each of its two boxes, a slot on that side, an
//! orthogonal polyline between the slots, rounded SVG path data and a pair
//! of cardinality labels. Routing is a pure function of box geometry and
//! edge order, so it can re-run on every drag frame.

pub mod anchors;
pub mod labels;
pub mod path;
pub mod routing;

use std::collections::HashMap;

use crate::layout::TableBox;
use crate::model::Edge;
pub use anchors::Side;
pub use labels::{LabelPlacement, TextAnchor};
use routing::Anchor;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Point a fraction `t` of the way from `self` to `other`.
    #[inline]
    pub fn toward(self, other: Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Kept free at both ends of a side when it carries several slots.
    pub edge_padding: f64,
    /// Distance a line runs straight out of its box before turning.
    pub offset: f64,
    pub simplify_epsilon: f64,
    pub corner_radius: f64,
    pub label_near: f64,
    pub label_offset: f64,
    /// Extra lift of labels sitting on horizontal segments.
    pub horizontal_lift: f64,
    pub label_axis_tolerance: f64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            edge_padding: 10.0,
            offset: 12.0,
            simplify_epsilon: 2.0,
            corner_radius: 3.0,
            label_near: 14.0,
            label_offset: 6.0,
            horizontal_lift: 2.0,
            label_axis_tolerance: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub points: Vec<Point>,
    /// SVG path data.
    pub path: String,
    pub start_label: LabelPlacement,
    pub end_label: LabelPlacement,
    pub from_side: Side,
    pub to_side: Side,
}

#[derive(Debug, Default)]
pub struct Router {
    config: RouterConfig,
}

impl Router {
    pub fn new(config: RouterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// One route per edge, in edge order; `None` for edges whose endpoints
    /// are not among `boxes`.
    pub fn route(&self, boxes: &[TableBox], edges: &[Edge]) -> Vec<Option<Route>> {
        let index: HashMap<&str, usize> = boxes
            .iter()
            .enumerate()
            .map(|(i, b)| (b.id.as_str(), i))
            .collect();

        let resolved: Vec<Option<(usize, usize)>> = edges
            .iter()
            .map(|e| Some((*index.get(e.from.as_str())?, *index.get(e.to.as_str())?)))
            .collect();
        let pairs: Vec<(usize, usize)> = resolved.iter().flatten().copied().collect();
        let mut plans = anchors::plan_ends(boxes, &pairs).into_iter();

        let c = &self.config;
        resolved
            .iter()
            .zip(edges)
            .map(|(pair, edge)| {
                pair.as_ref()?;
                let (from, to) = plans.next()?;
                let anchor = |end: anchors::EndPlan| Anchor {
                    point: anchors::anchor_point(
                        &boxes[end.table],
                        end.side,
                        end.slot,
                        end.total,
                        c.edge_padding,
                    ),
                    side: end.side,
                };
                let raw = routing::manhattan(&anchor(from), &anchor(to), c.offset);
                let points = routing::simplify(&raw, c.simplify_epsilon);
                let path = path::rounded_path(&points, c.corner_radius, c.simplify_epsilon);
                let (start_label, end_label) = labels::place_labels(
                    &points,
                    edge.from_cardinality,
                    edge.to_cardinality,
                    c,
                )?;
                Some(Route {
                    points,
                    path,
                    start_label,
                    end_label,
                    from_side: from.side,
                    to_side: to.side,
                })
            })
            .collect()
    }
}
