//! Automatic placement of table boxes.
//!
//! Runs only when at least one table lacks explicit coordinates: a force
//! simulation spreads the tables out, the result is shifted into positive
//! space, and a separation pass removes any remaining overlap.

pub mod force;
pub mod overlap;
pub mod types;

use std::collections::HashMap;
use tracing::debug;

use crate::model::Edge;
use force::{Body, Simulation, Spring};
pub use overlap::{rects_overlap, resolve_overlaps};
pub use types::{TableBox, bounds};

#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Angle step of the seeding spiral, in radians.
    pub golden_angle: f64,
    pub seed_radius: f64,
    pub seed_radius_step: f64,
    pub charge_strength: f64,
    pub link_strength: f64,
    pub link_base_distance: f64,
    /// Share of the larger width and height added to the spring length.
    pub link_size_factor: f64,
    /// Added to half the box diagonal to get the collision radius.
    pub collide_padding: f64,
    pub collide_iterations: usize,
    /// forceX / forceY strength toward the origin.
    pub pull_strength: f64,
    pub velocity_decay: f64,
    pub alpha_min: f64,
    /// Ticks it takes alpha to cool from 1 to `alpha_min`.
    pub alpha_decay_ticks: f64,
    pub ticks_per_sqrt_node: f64,
    pub max_ticks: usize,
    /// Distance of the top-left-most box from the origin after layout.
    pub margin: f64,
    pub overlap_padding: f64,
    pub overlap_step: f64,
    pub overlap_max_passes: usize,
    /// Seed for breaking ties between boxes with identical centers.
    pub seed: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            golden_angle: 2.399963229728653,
            seed_radius: 200.0,
            seed_radius_step: 6.0,
            charge_strength: -900.0,
            link_strength: 0.3,
            link_base_distance: 220.0,
            link_size_factor: 0.2,
            collide_padding: 36.0,
            collide_iterations: 3,
            pull_strength: 0.04,
            velocity_decay: 0.4,
            alpha_min: 0.001,
            alpha_decay_ticks: 300.0,
            ticks_per_sqrt_node: 30.0,
            max_ticks: 1200,
            margin: 200.0,
            overlap_padding: 28.0,
            overlap_step: 10.0,
            overlap_max_passes: 400,
            seed: 0x5eed,
        }
    }
}

#[derive(Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Place every box. Returns `false` (and leaves the boxes untouched) when
    /// all of them already carry explicit coordinates.
    pub fn layout(&self, boxes: &mut [TableBox], edges: &[Edge]) -> bool {
        if boxes.is_empty() || boxes.iter().all(|b| b.pinned) {
            return false;
        }

        let bodies = self.seed_bodies(boxes);
        let springs = self.springs(boxes, edges);
        let ticks = Simulation::tick_count(&self.config, boxes.len());
        let bodies = Simulation::new(&self.config, bodies, springs).run(ticks);

        let (min_x, min_y) = bodies.iter().fold(
            (f64::INFINITY, f64::INFINITY),
            |(mx, my), b| (mx.min(b.x - b.w / 2.0), my.min(b.y - b.h / 2.0)),
        );
        let dx = self.config.margin - min_x;
        let dy = self.config.margin - min_y;
        for (bx, body) in boxes.iter_mut().zip(&bodies) {
            bx.x = body.x - body.w / 2.0 + dx;
            bx.y = body.y - body.h / 2.0 + dy;
        }

        let passes = resolve_overlaps(
            boxes,
            self.config.overlap_padding,
            self.config.overlap_step,
            self.config.overlap_max_passes,
            self.config.seed,
        );
        debug!(
            tables = boxes.len(),
            links = edges.len(),
            ticks,
            overlap_passes = passes,
            "laid out tables"
        );
        true
    }

    /// Centers on a golden-angle spiral; boxes with coordinates keep theirs.
    fn seed_bodies(&self, boxes: &[TableBox]) -> Vec<Body> {
        boxes
            .iter()
            .enumerate()
            .map(|(i, b)| {
                let (x, y) = if b.pinned {
                    b.center()
                } else {
                    let r = self.config.seed_radius + i as f64 * self.config.seed_radius_step;
                    let angle = i as f64 * self.config.golden_angle;
                    (angle.cos() * r, angle.sin() * r)
                };
                Body::new(x, y, b.w, b.h)
            })
            .collect()
    }

    fn springs(&self, boxes: &[TableBox], edges: &[Edge]) -> Vec<Spring> {
        let index: HashMap<&str, usize> = boxes
            .iter()
            .enumerate()
            .map(|(i, b)| (b.id.as_str(), i))
            .collect();
        edges
            .iter()
            .filter_map(|e| {
                let (&source, &target) = (index.get(e.from.as_str())?, index.get(e.to.as_str())?);
                let (a, b) = (&boxes[source], &boxes[target]);
                let distance = self.config.link_base_distance
                    + a.w.max(b.w) * self.config.link_size_factor
                    + a.h.max(b.h) * self.config.link_size_factor;
                Some(Spring {
                    source,
                    target,
                    distance,
                })
            })
            .collect()
    }
}
