//! Parse requests and their responses.
//!
//! The host performs the HTTP round-trip; this module numbers requests,
//! drops responses that arrive after a newer request was issued, and turns
//! response bodies into graphs or [`ErdError`]s.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ErdError;
use crate::interact::Debouncer;
use crate::model::Graph;
use crate::schema;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRequest {
    pub seq: u64,
    pub schema: String,
}

impl ParseRequest {
    /// JSON body for the parse endpoint: `{"schema": "..."}`.
    pub fn body(&self) -> String {
        serde_json::json!({ "schema": self.schema }).to_string()
    }
}

/// What to do with schema text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submit {
    /// Send this request.
    Request(ParseRequest),
    /// Blank input: show the empty state, nothing to send.
    Empty,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone)]
pub struct ParseClient {
    latest: u64,
    input: Debouncer<String>,
}

impl ParseClient {
    pub fn new(debounce_ms: f64) -> Self {
        Self {
            latest: 0,
            input: Debouncer::new(debounce_ms),
        }
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }

    /// Queue edited schema text; it is submitted once typing pauses.
    pub fn input(&mut self, text: &str, now: f64) {
        self.input.push(text.to_string(), now);
    }

    /// The submission due at `now`, if the debounce delay has elapsed.
    pub fn poll(&mut self, now: f64) -> Option<Submit> {
        self.input.poll(now).map(|text| self.submit(&text))
    }

    /// Issue a request for `text` right away. Blank text still advances
    /// the sequence so in-flight responses cannot repaint over the empty
    /// state.
    pub fn submit(&mut self, text: &str) -> Submit {
        self.latest += 1;
        if text.trim().is_empty() {
            return Submit::Empty;
        }
        Submit::Request(ParseRequest {
            seq: self.latest,
            schema: text.to_string(),
        })
    }

    /// Outdate every issued request and drop pending input. Used when the
    /// canvas is replaced without going through the parse endpoint.
    pub fn invalidate(&mut self) {
        self.latest += 1;
        self.input.cancel();
    }

    /// Interpret the endpoint's answer to request `seq`.
    pub fn complete(&self, seq: u64, status: u16, body: &str) -> Result<Graph, ErdError> {
        if seq != self.latest {
            debug!(seq, latest = self.latest, "dropping stale parse response");
            return Err(ErdError::Stale {
                seq,
                latest: self.latest,
            });
        }
        if !(200..300).contains(&status) {
            return Err(match serde_json::from_str::<ErrorBody>(body) {
                Ok(e) => ErdError::Parse {
                    error: e.error,
                    message: e.message,
                },
                Err(_) => ErdError::Network(format!("parse endpoint returned status {status}")),
            });
        }
        Graph::from_json(body).map_err(|e| {
            warn!(error = %e, "undecodable parse response");
            ErdError::Network(format!("undecodable response: {e}"))
        })
    }

    /// Report a transport failure for request `seq`.
    pub fn fail(&self, seq: u64, reason: &str) -> ErdError {
        if seq != self.latest {
            return ErdError::Stale {
                seq,
                latest: self.latest,
            };
        }
        ErdError::Network(reason.to_string())
    }
}

/// Server side of the parse endpoint: `(status, JSON body)` for a request
/// body `{"schema": "..."}`.
pub fn respond(request_body: &str) -> (u16, String) {
    #[derive(Deserialize)]
    struct Body {
        #[serde(default)]
        schema: Option<serde_json::Value>,
    }
    let text = match serde_json::from_str::<Body>(request_body) {
        Ok(Body {
            schema: Some(serde_json::Value::String(s)),
        }) => s,
        Ok(Body { schema: Some(v) }) => v.to_string(),
        Ok(Body { schema: None }) => String::new(),
        Err(e) => {
            let body = serde_json::json!({ "error": "bad_request", "message": e.to_string() });
            return (400, body.to_string());
        }
    };
    match schema::parse(&text) {
        Ok(graph) => (200, graph.to_json()),
        Err(e) => (422, e.to_json()),
    }
}
