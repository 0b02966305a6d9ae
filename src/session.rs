//! One diagram canvas: tables, routed links, emphasis and the controllers
//! that mutate them.
//!
//! The host forwards pointer, wheel and keyboard events with timestamps and
//! calls [`Session::frame`] from its animation loop. Every geometry change
//! re-runs the router; the layout engine only runs on [`Session::load`].

use tracing::debug;

use crate::color::LinkPalette;
use crate::error::ErdError;
use crate::interact::{
    Compaction, DragController, Emphasis, FrameGate, Highlight, Search, SearchOutcome, Transform,
    WheelMode, ZoomConfig, ZoomController,
};
use crate::layout::{LayoutEngine, TableBox, bounds};
use crate::measure::{Geometry, TextMetrics};
use crate::model::{Edge, Graph, Table};
use crate::router::{Route, Router};

const SETTLE_MS: f64 = 60_000.0;

/// Timing and sizing knobs of the viewer.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub search_debounce_ms: f64,
    pub input_debounce_ms: f64,
    pub compaction_ms: f64,
    pub pan_ms: f64,
    pub zoom_ms: f64,
    pub fit_padding: f64,
    pub click_threshold: f64,
    /// Added below the depth controls when reserving space for them.
    pub reserved_bottom_extra: f64,
    /// Height of the depth-controls overlay, if the host shows one.
    pub depth_controls_height: Option<f64>,
    pub min_scale: f64,
    pub max_scale: f64,
    pub zoom_step: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    /// Start in compact mode.
    pub compact: bool,
    /// Color links by `from->to` pair instead of by position.
    pub color_by_relationship: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: 220.0,
            input_debounce_ms: 250.0,
            compaction_ms: 260.0,
            pan_ms: 450.0,
            zoom_ms: 200.0,
            fit_padding: 40.0,
            click_threshold: 5.0,
            reserved_bottom_extra: 24.0,
            depth_controls_height: None,
            min_scale: 0.2,
            max_scale: 3.0,
            zoom_step: 1.2,
            viewport_width: 1200.0,
            viewport_height: 800.0,
            compact: false,
            color_by_relationship: false,
        }
    }
}

impl ViewerConfig {
    pub fn zoom(&self) -> ZoomConfig {
        ZoomConfig {
            min_scale: self.min_scale,
            max_scale: self.max_scale,
            step: self.zoom_step,
            button_ms: self.zoom_ms,
            pan_ms: self.pan_ms,
        }
    }

    pub fn reserved_bottom(&self) -> f64 {
        self.depth_controls_height
            .map_or(0.0, |h| h + self.reserved_bottom_extra)
    }
}

/// An edge as drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedLink {
    pub edge: Edge,
    pub color: String,
    /// `None` while an endpoint is missing from the canvas.
    pub route: Option<Route>,
    pub dimmed: bool,
}

/// A table as drawn, in paint order.
#[derive(Debug, Clone, Copy)]
pub struct SceneTable<'a> {
    pub table: &'a Table,
    pub bbox: &'a TableBox,
    pub dimmed: bool,
    pub selected: bool,
}

/// Everything a surface needs to draw the current state.
#[derive(Debug, Clone)]
pub struct Scene<'a> {
    pub empty: bool,
    pub transform: Transform,
    pub tables: Vec<SceneTable<'a>>,
    pub links: &'a [RenderedLink],
    pub compact: bool,
    pub extra_rows_visible: bool,
    pub extra_opacity: f64,
}

/// Background press that pans the canvas.
#[derive(Debug, Clone, Copy)]
struct Pan {
    start: (f64, f64),
    last: (f64, f64),
    moved: bool,
}

pub struct Session {
    config: ViewerConfig,
    metrics: TextMetrics,
    geometry: Geometry,
    layout: LayoutEngine,
    router: Router,
    palette: LinkPalette,

    graph: Graph,
    boxes: Vec<TableBox>,
    /// Paint order, bottom to top, as indices into `boxes`.
    order: Vec<usize>,
    links: Vec<RenderedLink>,
    emphasis: Emphasis,
    empty: bool,

    zoom: ZoomController,
    drag: DragController,
    compaction: Compaction,
    highlight: Highlight,
    search: Search,
    gate: FrameGate,
    pan: Option<Pan>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl Session {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            metrics: TextMetrics::default(),
            geometry: Geometry::default(),
            layout: LayoutEngine::default(),
            router: Router::default(),
            palette: LinkPalette::default(),
            graph: Graph::default(),
            boxes: Vec::new(),
            order: Vec::new(),
            links: Vec::new(),
            emphasis: Emphasis::default(),
            empty: true,
            zoom: ZoomController::new(config.zoom(), config.viewport_width, config.viewport_height),
            drag: DragController::default(),
            compaction: Compaction::new(config.compact, config.compaction_ms),
            highlight: Highlight::new(config.click_threshold),
            search: Search::new(config.search_debounce_ms),
            gate: FrameGate::default(),
            pan: None,
            config,
        }
    }

    pub fn with_engines(mut self, layout: LayoutEngine, router: Router, palette: LinkPalette) -> Self {
        self.layout = layout;
        self.router = router;
        self.palette = palette;
        self
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn boxes(&self) -> &[TableBox] {
        &self.boxes
    }

    pub fn links(&self) -> &[RenderedLink] {
        &self.links
    }

    pub fn emphasis(&self) -> &Emphasis {
        &self.emphasis
    }

    pub fn zoom(&self) -> &ZoomController {
        &self.zoom
    }

    pub fn highlight(&self) -> &Highlight {
        &self.highlight
    }

    pub fn is_compact(&self) -> bool {
        self.compaction.is_compact()
    }

    /// Replace the scene with `graph`. An empty graph enters the empty state.
    pub fn load(&mut self, graph: Graph) {
        self.purge();
        if graph.is_empty() {
            self.empty = true;
            return;
        }
        self.empty = false;

        let compact = self.compaction.is_compact();
        self.boxes = graph
            .nodes
            .iter()
            .map(|t| TableBox::new(t, self.geometry.measure(t, &self.metrics), compact))
            .collect();
        self.order = (0..self.boxes.len()).collect();
        let laid_out = self.layout.layout(&mut self.boxes, &graph.links);

        self.palette.reset();
        self.links = graph
            .links
            .iter()
            .enumerate()
            .map(|(i, e)| RenderedLink {
                color: if self.config.color_by_relationship {
                    self.palette.color_for(&e.from, &e.to).to_string()
                } else {
                    self.palette.color_at(i).to_string()
                },
                edge: e.clone(),
                route: None,
                dimmed: false,
            })
            .collect();
        self.highlight
            .setup(graph.nodes.iter().map(|t| t.id.as_str()), &graph.links);
        self.graph = graph;
        self.reroute();
        self.fit();
        debug!(
            tables = self.boxes.len(),
            links = self.links.len(),
            laid_out,
            "loaded diagram"
        );
    }

    /// Apply the outcome of a parse request. Stale responses leave the
    /// canvas untouched; any other failure enters the empty state.
    pub fn apply_parse(&mut self, outcome: Result<Graph, ErdError>) -> Result<(), ErdError> {
        match outcome {
            Ok(graph) => {
                self.load(graph);
                Ok(())
            }
            Err(e @ ErdError::Stale { .. }) => Err(e),
            Err(e) => {
                debug!(kind = e.kind(), error = %e, "parse failed");
                self.clear();
                Err(e)
            }
        }
    }

    /// Drop the scene and show the empty state.
    pub fn clear(&mut self) {
        self.purge();
        self.empty = true;
    }

    fn purge(&mut self) {
        self.graph = Graph::default();
        self.boxes.clear();
        self.order.clear();
        self.links.clear();
        self.emphasis = Emphasis::default();
        self.drag.cancel();
        self.pan = None;
        self.gate.take();
        self.search.reset();
        self.highlight.setup(std::iter::empty(), &[]);
        self.compaction = Compaction::new(self.compaction.is_compact(), self.config.compaction_ms);
    }

    /// Graph carrying the current table positions, as shared or exported.
    pub fn positioned_graph(&self) -> Graph {
        let mut graph = self.graph.clone();
        for (t, b) in graph.nodes.iter_mut().zip(&self.boxes) {
            t.x = Some(b.x);
            t.y = Some(b.y);
        }
        graph
    }

    /// Fit the content into the viewport.
    pub fn fit(&mut self) {
        if let Some(b) = bounds(&self.boxes) {
            self.zoom
                .fit_to_bounds(&b, self.config.fit_padding, self.config.reserved_bottom());
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.zoom.resize(width, height);
    }

    fn reroute(&mut self) {
        let routes = self.router.route(&self.boxes, &self.graph.links);
        for (link, route) in self.links.iter_mut().zip(routes) {
            link.route = route;
        }
    }

    fn sync_emphasis(&mut self) {
        for (i, link) in self.links.iter_mut().enumerate() {
            link.dimmed = self.emphasis.is_link_dimmed(i);
        }
    }

    /// Topmost table under screen point `(x, y)`.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<usize> {
        let (cx, cy) = self.zoom.transform().invert((x, y));
        self.order.iter().rev().copied().find(|&i| {
            let b = &self.boxes[i];
            cx >= b.x && cx <= b.x + b.w && cy >= b.y && cy <= b.y + b.h
        })
    }

    pub fn pointer_down(&mut self, x: f64, y: f64, button: i16) {
        match self.hit_test(x, y) {
            Some(i) => {
                if button == 0 {
                    let p = self.zoom.transform().invert((x, y));
                    self.drag.pointer_down(&self.boxes, &mut self.order, i, p);
                }
                self.highlight.pointer_down(&self.boxes[i].id, x, y, button);
            }
            None if button == 0 => {
                self.pan = Some(Pan {
                    start: (x, y),
                    last: (x, y),
                    moved: false,
                });
            }
            None => {}
        }
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.highlight.pointer_move(x, y);
        if self.drag.is_dragging() {
            let p = self.zoom.transform().invert((x, y));
            self.drag.pointer_move(&mut self.boxes, p, &mut self.gate);
        } else if let Some(pan) = &mut self.pan {
            self.zoom.pan_by(x - pan.last.0, y - pan.last.1);
            pan.last = (x, y);
            if (x - pan.start.0).hypot(y - pan.start.1) > self.config.click_threshold {
                pan.moved = true;
            }
        }
    }

    pub fn pointer_up(&mut self, x: f64, y: f64) {
        self.pointer_move(x, y);
        if self.drag.pointer_up().is_some() {
            self.gate.take();
            self.reroute();
        }
        if self.highlight.pointer_up(&mut self.emphasis, &self.graph.links) {
            self.sync_emphasis();
        }
        if let Some(pan) = self.pan.take() {
            if !pan.moved {
                self.highlight.clear(&mut self.emphasis, &self.graph.links);
                self.sync_emphasis();
            }
        }
    }

    pub fn pointer_cancel(&mut self) {
        if self.drag.pointer_up().is_some() {
            self.reroute();
        }
        self.highlight.pointer_cancel();
        self.pan = None;
    }

    pub fn wheel(&mut self, delta_y: f64, mode: WheelMode, ctrl: bool, x: f64, y: f64) {
        self.zoom.wheel(delta_y, mode, ctrl, x, y);
    }

    pub fn zoom_in(&mut self, now: f64) {
        self.zoom.zoom_in(now);
    }

    pub fn zoom_out(&mut self, now: f64) {
        self.zoom.zoom_out(now);
    }

    pub fn reset_zoom(&mut self) {
        self.zoom.reset();
    }

    /// Toggle compact mode; returns the new mode.
    pub fn toggle_compaction(&mut self, now: f64) -> bool {
        let compact = self.compaction.toggle(&self.boxes, now);
        self.gate.request();
        compact
    }

    pub fn set_depth(&mut self, value: &str) {
        self.highlight
            .set_depth(value, &mut self.emphasis, &self.graph.links);
        self.sync_emphasis();
    }

    /// Highlight `id` and its neighborhood without a pointer event.
    pub fn select(&mut self, id: &str) -> bool {
        let found = self
            .highlight
            .select(id, &mut self.emphasis, &self.graph.links);
        self.sync_emphasis();
        found
    }

    /// Raw search box text; applied after the debounce delay by `frame`.
    pub fn search_input(&mut self, raw: &str, now: f64) {
        self.search.input(raw, now);
    }

    /// Apply a search query immediately.
    pub fn search(&mut self, query: &str, now: f64) -> SearchOutcome {
        let query = query.trim().to_lowercase();
        let outcome = self.search.apply(
            &query,
            &self.boxes,
            &self.graph.links,
            &mut self.emphasis,
            &mut self.zoom,
            now,
        );
        self.sync_emphasis();
        outcome
    }

    /// Advance animations and debouncers, then run at most one pending
    /// router pass. Returns true when something needs redrawing.
    pub fn frame(&mut self, now: f64) -> bool {
        let mut dirty = self.zoom.tick(now);

        let tick = self.compaction.tick(&mut self.boxes, now, &mut self.gate);
        if tick.finished {
            self.gate.request();
        }
        dirty |= tick.changed;

        if let Some(query) = self.search.poll(now) {
            self.search(&query, now);
            dirty = true;
        }

        if self.gate.take() {
            self.reroute();
            dirty = true;
        }
        dirty
    }

    /// Run every pending debouncer and animation started at or before
    /// `now` to completion.
    pub fn settle(&mut self, now: f64) {
        let later = now + SETTLE_MS;
        self.frame(later);
        // tweens started by the first frame (search pans) finish here
        self.frame(later + SETTLE_MS);
    }

    pub fn scene(&self) -> Scene<'_> {
        let selected = self.emphasis.selected.as_deref();
        Scene {
            empty: self.empty,
            transform: self.zoom.transform(),
            tables: self
                .order
                .iter()
                .map(|&i| {
                    let bbox = &self.boxes[i];
                    SceneTable {
                        table: &self.graph.nodes[i],
                        bbox,
                        dimmed: self.emphasis.is_table_dimmed(&bbox.id),
                        selected: selected == Some(bbox.id.as_str()),
                    }
                })
                .collect(),
            links: &self.links,
            compact: self.compaction.is_compact(),
            extra_rows_visible: self.compaction.extra_rows_visible(),
            extra_opacity: self.compaction.extra_opacity(),
        }
    }
}
