pub mod client;
pub mod color;
pub mod error;
pub mod interact;
pub mod layout;
pub mod measure;
pub mod model;
pub mod prefs;
pub mod router;
pub mod schema;
pub mod session;
pub mod share;
pub mod svg;

use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use client::{ParseClient, ParseRequest, Submit};
use error::ErdError;
use interact::WheelMode;
use model::Graph;
use prefs::{KeyValueStore, PanePrefs};
use session::{Session, ViewerConfig};
use share::{Payload, Restored};
use svg::SvgRenderer;
use tracing::warn;

/// How a schema is turned into a static picture.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub compact: bool,
    pub width: Option<f64>,
    pub height: Option<f64>,
    /// Table to highlight.
    pub select: Option<String>,
    /// Highlight depth: a hop count or `"all"`.
    pub depth: Option<String>,
    pub search: Option<String>,
    pub color_by_relationship: bool,
}

impl RenderOptions {
    fn viewer_config(&self) -> ViewerConfig {
        let defaults = ViewerConfig::default();
        ViewerConfig {
            compact: self.compact,
            color_by_relationship: self.color_by_relationship,
            viewport_width: self.width.unwrap_or(defaults.viewport_width),
            viewport_height: self.height.unwrap_or(defaults.viewport_height),
            ..defaults
        }
    }
}

/// Lay out, route and draw `graph` with every animation settled.
pub fn render_graph(graph: Graph, options: &RenderOptions) -> String {
    let config = options.viewer_config();
    let (width, height) = (config.viewport_width, config.viewport_height);
    let mut session = Session::new(config);
    session.load(graph);
    if let Some(depth) = &options.depth {
        session.set_depth(depth);
    }
    if let Some(id) = &options.select {
        if !session.select(id) {
            warn!(table = %id, "no such table to select");
        }
    }
    if let Some(query) = &options.search {
        session.search(query, 0.0);
    }
    session.settle(0.0);
    SvgRenderer::default().render(&session.scene(), width, height)
}

pub fn render_schema(text: &str, options: &RenderOptions) -> Result<String, ErdError> {
    let graph = schema::parse(text)?;
    Ok(render_graph(graph, options))
}

/// Graph JSON for schema text, or the error payload of the parse endpoint.
pub fn parse_to_json(text: &str) -> Result<String, ErdError> {
    Ok(schema::parse(text)?.to_json())
}

/// Share token for a graph given as JSON, with the schema text it came from.
pub fn encode_share(graph_json: &str, schema_text: &str) -> Result<String, ErdError> {
    let graph = Graph::from_json(graph_json).map_err(|e| ErdError::Decode(e.into()))?;
    Ok(share::encode_snapshot(&graph, schema_text))
}

#[derive(Debug, Serialize)]
struct DecodedShare {
    graph: Option<Graph>,
    schema: Option<String>,
}

impl From<Restored> for DecodedShare {
    fn from(r: Restored) -> Self {
        Self {
            graph: r.graph,
            schema: r.schema,
        }
    }
}

/// `{"graph": ..., "schema": ...}` for a share token; either may be null.
pub fn decode_share(token: &str) -> Result<String, ErdError> {
    let payload: Payload = share::decode(token)?;
    Ok(to_json(&DecodedShare::from(Restored::from(payload))))
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

fn js_error(e: ErdError) -> JsError {
    JsError::new(&e.to_json())
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

#[wasm_bindgen(js_name = "parseSchema")]
pub fn parse_schema_js(text: &str) -> Result<String, JsError> {
    parse_to_json(text).map_err(js_error)
}

#[wasm_bindgen(js_name = "renderSchema")]
pub fn render_schema_js(
    text: &str,
    compact: Option<bool>,
    width: Option<f64>,
    height: Option<f64>,
) -> Result<String, JsError> {
    let options = RenderOptions {
        compact: compact.unwrap_or(false),
        width,
        height,
        ..RenderOptions::default()
    };
    render_schema(text, &options).map_err(js_error)
}

#[wasm_bindgen(js_name = "encodeShare")]
pub fn encode_share_js(graph_json: &str, schema_text: &str) -> Result<String, JsError> {
    encode_share(graph_json, schema_text).map_err(js_error)
}

#[wasm_bindgen(js_name = "decodeShare")]
pub fn decode_share_js(token: &str) -> Result<String, JsError> {
    decode_share(token).map_err(js_error)
}

/// The browser's `localStorage`, reached through the global object. Missing
/// storage (private mode, workers) reads as empty and ignores writes.
struct LocalStorage {
    storage: Option<JsValue>,
}

impl LocalStorage {
    fn new() -> Self {
        let storage = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("localStorage"))
            .ok()
            .filter(|v| !v.is_undefined() && !v.is_null());
        Self { storage }
    }

    fn method(&self, name: &str) -> Option<(&JsValue, js_sys::Function)> {
        let storage = self.storage.as_ref()?;
        let f = js_sys::Reflect::get(storage, &JsValue::from_str(name)).ok()?;
        Some((storage, f.dyn_into::<js_sys::Function>().ok()?))
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        let (storage, get_item) = self.method("getItem")?;
        get_item
            .call1(storage, &JsValue::from_str(key))
            .ok()?
            .as_string()
    }

    fn set(&mut self, key: &str, value: &str) {
        if let Some((storage, set_item)) = self.method("setItem") {
            if let Err(e) = set_item.call2(storage, &JsValue::from_str(key), &JsValue::from_str(value)) {
                warn!(key, error = ?e, "localStorage rejected a write");
            }
        }
    }
}

/// One interactive diagram for the page: the host forwards DOM events with
/// `performance.now()` timestamps and repaints from `svg()` whenever
/// `frame()` returns true.
#[wasm_bindgen]
pub struct ErdView {
    session: Session,
    client: ParseClient,
    /// Schema text behind the graph on the canvas.
    schema: String,
    /// Request whose response is awaited; its text becomes `schema` once
    /// the response is applied.
    in_flight: Option<ParseRequest>,
    prefs: Option<PanePrefs<LocalStorage>>,
    renderer: SvgRenderer,
}

#[wasm_bindgen]
impl ErdView {
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> ErdView {
        let config = ViewerConfig {
            viewport_width: width,
            viewport_height: height,
            ..ViewerConfig::default()
        };
        let client = ParseClient::new(config.input_debounce_ms);
        ErdView {
            session: Session::new(config),
            client,
            schema: String::new(),
            in_flight: None,
            prefs: None,
            renderer: SvgRenderer::default(),
        }
    }

    /// Show a graph given as JSON.
    pub fn load(&mut self, graph_json: &str) -> Result<(), JsError> {
        let graph = Graph::from_json(graph_json)
            .map_err(|e| js_error(ErdError::Decode(e.into())))?;
        self.replace_canvas();
        self.session.load(graph);
        self.schema.clear();
        Ok(())
    }

    /// Parse schema text locally and show it.
    #[wasm_bindgen(js_name = "loadSchema")]
    pub fn load_schema(&mut self, text: &str) -> Result<(), JsError> {
        self.replace_canvas();
        self.apply_schema(text).map_err(js_error)
    }

    pub fn clear(&mut self) {
        self.session.clear();
    }

    #[wasm_bindgen(js_name = "isEmpty")]
    pub fn is_empty(&self) -> bool {
        self.session.is_empty()
    }

    #[wasm_bindgen(js_name = "pointerDown")]
    pub fn pointer_down(&mut self, x: f64, y: f64, button: i16) {
        self.session.pointer_down(x, y, button);
    }

    #[wasm_bindgen(js_name = "pointerMove")]
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.session.pointer_move(x, y);
    }

    #[wasm_bindgen(js_name = "pointerUp")]
    pub fn pointer_up(&mut self, x: f64, y: f64) {
        self.session.pointer_up(x, y);
    }

    #[wasm_bindgen(js_name = "pointerCancel")]
    pub fn pointer_cancel(&mut self) {
        self.session.pointer_cancel();
    }

    /// `mode` is `WheelEvent.deltaMode`.
    pub fn wheel(&mut self, delta_y: f64, mode: u32, ctrl: bool, x: f64, y: f64) {
        self.session
            .wheel(delta_y, WheelMode::from_dom(mode), ctrl, x, y);
    }

    #[wasm_bindgen(js_name = "zoomIn")]
    pub fn zoom_in(&mut self, now: f64) {
        self.session.zoom_in(now);
    }

    #[wasm_bindgen(js_name = "zoomOut")]
    pub fn zoom_out(&mut self, now: f64) {
        self.session.zoom_out(now);
    }

    #[wasm_bindgen(js_name = "resetZoom")]
    pub fn reset_zoom(&mut self) {
        self.session.reset_zoom();
    }

    pub fn fit(&mut self) {
        self.session.fit();
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.session.resize(width, height);
    }

    #[wasm_bindgen(js_name = "toggleCompact")]
    pub fn toggle_compact(&mut self, now: f64) -> bool {
        self.session.toggle_compaction(now)
    }

    #[wasm_bindgen(js_name = "setDepth")]
    pub fn set_depth(&mut self, value: &str) {
        self.session.set_depth(value);
    }

    #[wasm_bindgen(js_name = "searchInput")]
    pub fn search_input(&mut self, raw: &str, now: f64) {
        self.session.search_input(raw, now);
    }

    pub fn frame(&mut self, now: f64) -> bool {
        self.session.frame(now)
    }

    pub fn svg(&self) -> String {
        let (w, h) = self.session.zoom().viewport();
        self.renderer.render(&self.session.scene(), w, h)
    }

    /// Edited schema text; submitted by `pollParse` once typing pauses.
    pub fn input(&mut self, text: &str, now: f64) {
        self.client.input(text, now);
    }

    /// The parse request due at `now` as `{"seq": n, "body": "..."}`, or
    /// undefined. Blank input clears the canvas instead.
    #[wasm_bindgen(js_name = "pollParse")]
    pub fn poll_parse(&mut self, now: f64) -> Option<String> {
        match self.client.poll(now)? {
            Submit::Request(r) => {
                let json = serde_json::json!({ "seq": r.seq, "body": r.body() }).to_string();
                self.in_flight = Some(r);
                Some(json)
            }
            Submit::Empty => {
                self.in_flight = None;
                self.session.clear();
                self.schema.clear();
                None
            }
        }
    }

    /// Response to request `seq`. Stale responses are ignored; failures
    /// clear the canvas and reject with the error JSON.
    pub fn complete(&mut self, seq: u32, status: u16, body: &str) -> Result<(), JsError> {
        let outcome = self.client.complete(u64::from(seq), status, body);
        match self.session.apply_parse(outcome) {
            Ok(()) => {
                self.schema = self
                    .in_flight
                    .take()
                    .filter(|r| r.seq == u64::from(seq))
                    .map(|r| r.schema)
                    .unwrap_or_default();
                Ok(())
            }
            Err(ErdError::Stale { .. }) => Ok(()),
            Err(e) => {
                self.in_flight = None;
                self.schema.clear();
                Err(js_error(e))
            }
        }
    }

    /// Transport failure for request `seq`.
    pub fn fail(&mut self, seq: u32, reason: &str) -> Result<(), JsError> {
        let e = self.client.fail(u64::from(seq), reason);
        match self.session.apply_parse(Err(e)) {
            Ok(()) | Err(ErdError::Stale { .. }) => Ok(()),
            Err(e) => {
                self.in_flight = None;
                self.schema.clear();
                Err(js_error(e))
            }
        }
    }

    /// Restore from the page: an inline graph first, then the `s` query
    /// parameter. Returns the restored schema text, if any.
    pub fn restore(&mut self, inline: Option<String>, location: Option<String>) -> Option<String> {
        let restored = share::restore(inline.as_deref(), location.as_deref())?;
        self.replace_canvas();
        match (restored.graph, &restored.schema) {
            (Some(graph), text) => {
                self.session.load(graph);
                self.schema = text.clone().unwrap_or_default();
            }
            (None, Some(text)) => {
                if let Err(e) = self.apply_schema(text) {
                    warn!(kind = e.kind(), error = %e, "restored schema does not parse");
                }
            }
            (None, None) => {}
        }
        restored.schema
    }

    /// Share token for the diagram as currently arranged.
    pub fn share(&self) -> String {
        share::encode_snapshot(&self.session.positioned_graph(), &self.schema)
    }

    #[wasm_bindgen(js_name = "paneCollapsed")]
    pub fn pane_collapsed(&mut self) -> bool {
        self.prefs().is_collapsed()
    }

    #[wasm_bindgen(js_name = "togglePane")]
    pub fn toggle_pane(&mut self) -> bool {
        self.prefs().toggle()
    }
}

impl ErdView {
    /// Outdate in-flight parse requests before the canvas is replaced
    /// locally.
    fn replace_canvas(&mut self) {
        self.client.invalidate();
        self.in_flight = None;
    }

    fn apply_schema(&mut self, text: &str) -> Result<(), ErdError> {
        let outcome = schema::parse(text).map_err(ErdError::from);
        let applied = self.session.apply_parse(outcome);
        self.schema = if applied.is_ok() { text.to_string() } else { String::new() };
        applied
    }

    fn prefs(&mut self) -> &mut PanePrefs<LocalStorage> {
        self.prefs
            .get_or_insert_with(|| PanePrefs::load(LocalStorage::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SCHEMA: &str = r#"
create_table "users" do |t|
  t.string "email"
end

create_table "posts" do |t|
  t.references :user
  t.string "title"
end
"#;

    #[test]
    fn test_parse_to_json() {
        let json = parse_to_json(SCHEMA).unwrap();
        let g = Graph::from_json(&json).unwrap();
        assert_eq!(g.nodes.len(), 2);
        assert_eq!(g.links.len(), 1);
    }

    #[test]
    fn test_render_schema_options() {
        let options = RenderOptions {
            width: Some(640.0),
            height: Some(480.0),
            select: Some("users".into()),
            ..RenderOptions::default()
        };
        let svg = render_schema(SCHEMA, &options).unwrap();
        assert!(svg.contains(r#"width="640""#));
        assert!(svg.contains(r#"class="table selected" data-id="users""#));

        let options = RenderOptions {
            search: Some("posts".into()),
            ..RenderOptions::default()
        };
        let svg = render_schema(SCHEMA, &options).unwrap();
        assert!(svg.contains(r#"class="table dimmed" data-id="users""#));
    }

    #[test]
    fn test_render_empty_schema() {
        let svg = render_schema("", &RenderOptions::default()).unwrap();
        assert!(svg.contains(svg::EMPTY_STATE_MESSAGE));
    }

    #[test]
    fn test_share_round_trip() {
        let graph_json = parse_to_json(SCHEMA).unwrap();
        let token = encode_share(&graph_json, SCHEMA).unwrap();
        let decoded: serde_json::Value = serde_json::from_str(&decode_share(&token).unwrap()).unwrap();
        assert_eq!(decoded["schema"], SCHEMA);
        assert_eq!(decoded["graph"]["nodes"][0]["id"], "users");
    }

    const POSTS_ONLY: &str = "create_table \"posts\" do |t|\n  t.string \"title\"\nend\n";

    fn table_ids(view: &ErdView) -> Vec<&str> {
        view.session
            .graph()
            .nodes
            .iter()
            .map(|t| t.id.as_str())
            .collect()
    }

    fn request_seq(json: &str) -> u32 {
        let v: serde_json::Value = serde_json::from_str(json).unwrap();
        v["seq"].as_u64().unwrap() as u32
    }

    fn shared_schema(view: &ErdView) -> String {
        let v: serde_json::Value = serde_json::from_str(&decode_share(&view.share()).unwrap()).unwrap();
        v["schema"].as_str().unwrap_or_default().to_string()
    }

    #[test]
    fn test_local_load_outdates_inflight_parse() {
        let mut view = ErdView::new(800.0, 600.0);
        view.input(SCHEMA, 0.0);
        let seq = request_seq(&view.poll_parse(300.0).unwrap());

        view.load_schema(POSTS_ONLY).unwrap();
        view.complete(seq, 200, &parse_to_json(SCHEMA).unwrap()).unwrap();
        assert_eq!(table_ids(&view), vec!["posts"]);
        assert_eq!(shared_schema(&view), POSTS_ONLY);
    }

    #[test]
    fn test_graph_load_drops_pending_input() {
        let mut view = ErdView::new(800.0, 600.0);
        view.input(SCHEMA, 0.0);
        view.load(r#"{"nodes":[{"id":"pinned","fields":[]}],"links":[]}"#)
            .unwrap();
        assert_eq!(view.poll_parse(1000.0), None);
        assert_eq!(table_ids(&view), vec!["pinned"]);
    }

    #[test]
    fn test_restore_outdates_inflight_parse() {
        let mut view = ErdView::new(800.0, 600.0);
        view.input(SCHEMA, 0.0);
        let seq = request_seq(&view.poll_parse(300.0).unwrap());

        let token = encode_share(&parse_to_json(POSTS_ONLY).unwrap(), POSTS_ONLY).unwrap();
        let restored = view.restore(None, Some(format!("https://erd.test/?s={token}")));
        assert_eq!(restored.as_deref(), Some(POSTS_ONLY));
        view.complete(seq, 200, &parse_to_json(SCHEMA).unwrap()).unwrap();
        assert_eq!(table_ids(&view), vec!["posts"]);
    }

    #[test]
    fn test_share_pairs_text_with_applied_graph() {
        let mut view = ErdView::new(800.0, 600.0);
        view.load_schema(POSTS_ONLY).unwrap();

        view.input(SCHEMA, 0.0);
        assert_eq!(shared_schema(&view), POSTS_ONLY);
        let seq = request_seq(&view.poll_parse(300.0).unwrap());
        assert_eq!(shared_schema(&view), POSTS_ONLY);

        view.complete(seq, 200, &parse_to_json(SCHEMA).unwrap()).unwrap();
        assert_eq!(table_ids(&view), vec!["users", "posts"]);
        assert_eq!(shared_schema(&view), SCHEMA);
    }

    #[test]
    fn test_share_errors() {
        assert_eq!(encode_share("nope", "").unwrap_err().kind(), "decode_error");
        assert_eq!(decode_share("!!!").unwrap_err().kind(), "decode_error");
    }
}
