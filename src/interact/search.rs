//! Table search box.

use super::Emphasis;
use super::anim::Debouncer;
use super::zoom::ZoomController;
use crate::layout::TableBox;
use crate::model::Edge;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Cleared,
    Matched(String),
    NoMatch,
}

#[derive(Debug, Clone)]
pub struct Search {
    debounce: Debouncer<String>,
    /// Viewport center before the first matching search, restored when the
    /// query is cleared.
    saved_center: Option<(f64, f64)>,
}

impl Search {
    pub fn new(debounce_ms: f64) -> Self {
        Self {
            debounce: Debouncer::new(debounce_ms),
            saved_center: None,
        }
    }

    /// Normalize and queue raw input text.
    pub fn input(&mut self, raw: &str, now: f64) {
        self.debounce.push(raw.trim().to_lowercase(), now);
    }

    /// The query whose debounce delay has elapsed, if any.
    pub fn poll(&mut self, now: f64) -> Option<String> {
        self.debounce.poll(now)
    }

    pub fn reset(&mut self) {
        self.debounce.cancel();
        self.saved_center = None;
    }

    /// Apply a normalized query: emphasize an exact (case-insensitive) table
    /// match and pan to it, dim everything on a miss, undo both on an empty
    /// query.
    pub fn apply(
        &mut self,
        query: &str,
        boxes: &[TableBox],
        edges: &[Edge],
        emphasis: &mut Emphasis,
        zoom: &mut ZoomController,
        now: f64,
    ) -> SearchOutcome {
        if query.is_empty() {
            emphasis.clear();
            if let Some((x, y)) = self.saved_center.take() {
                zoom.pan_to(x, y, now);
            }
            return SearchOutcome::Cleared;
        }

        let Some(found) = boxes.iter().find(|b| b.id.to_lowercase() == query) else {
            emphasis.dimmed_tables = boxes.iter().map(|b| b.id.clone()).collect();
            emphasis.dimmed_links = (0..edges.len()).collect();
            return SearchOutcome::NoMatch;
        };

        emphasis.dimmed_tables = boxes
            .iter()
            .filter(|b| b.id != found.id)
            .map(|b| b.id.clone())
            .collect();
        emphasis.dimmed_links = edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.from != found.id && e.to != found.id)
            .map(|(i, _)| i)
            .collect();

        if self.saved_center.is_none() {
            self.saved_center = Some(zoom.current_center());
        }
        let (cx, cy) = found.center();
        zoom.pan_to(cx, cy, now);
        SearchOutcome::Matched(found.id.clone())
    }
}
