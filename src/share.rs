//! Share tokens and restore-from-link.
//!
//! A token is `{"graph": ..., "schema": "..."}` as JSON, raw-deflated at
//! level 9 and base64url-encoded without padding. Persisting tokens behind
//! short links is the job of a [`ShareStore`].

use std::collections::HashMap;
use std::io::{self, Read, Write};

use base64::Engine;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::model::Graph;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub graph: Graph,
    #[serde(default)]
    pub schema: String,
}

/// What a token carried.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Snapshot(Snapshot),
    Graph(Graph),
    /// Bare schema text.
    Schema(String),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid deflate stream: {0}")]
    Inflate(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is neither a snapshot, a graph nor schema text")]
    UnsupportedPayload,
}

pub fn encode_snapshot(graph: &Graph, schema: &str) -> String {
    encode(&Snapshot {
        graph: graph.clone(),
        schema: schema.to_string(),
    })
}

/// Token for `snapshot`. An in-memory serialization or deflate failure is
/// logged and yields an empty token.
pub fn encode(snapshot: &Snapshot) -> String {
    let compressed = serde_json::to_vec(snapshot)
        .map_err(io::Error::from)
        .and_then(|json| deflate(&json));
    match compressed {
        Ok(bytes) => URL_SAFE_NO_PAD.encode(bytes),
        Err(e) => {
            warn!(error = %e, "could not encode share snapshot");
            String::new()
        }
    }
}

fn deflate(bytes: &[u8]) -> io::Result<Vec<u8>> {
    let mut enc = DeflateEncoder::new(Vec::new(), Compression::new(9));
    enc.write_all(bytes)?;
    enc.finish()
}

pub fn decode(token: &str) -> Result<Payload, DecodeError> {
    let mut cleaned: String = token
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();
    while cleaned.len() % 4 != 0 {
        cleaned.push('=');
    }
    let compressed = URL_SAFE.decode(cleaned.as_bytes())?;

    let mut json = Vec::new();
    DeflateDecoder::new(compressed.as_slice()).read_to_end(&mut json)?;

    let value: serde_json::Value = serde_json::from_slice(&json)?;
    if let serde_json::Value::String(s) = value {
        return Ok(Payload::Schema(s));
    }
    if value.get("graph").is_some() {
        Ok(Payload::Snapshot(serde_json::from_value(value)?))
    } else if value.get("nodes").is_some() {
        Ok(Payload::Graph(serde_json::from_value(value)?))
    } else {
        Err(DecodeError::UnsupportedPayload)
    }
}

/// Result of restore-from-link.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Restored {
    pub graph: Option<Graph>,
    pub schema: Option<String>,
}

impl From<Payload> for Restored {
    fn from(p: Payload) -> Self {
        match p {
            Payload::Snapshot(s) => Restored {
                graph: Some(s.graph),
                schema: (!s.schema.is_empty()).then_some(s.schema),
            },
            Payload::Graph(g) => Restored {
                graph: Some(g),
                schema: None,
            },
            Payload::Schema(s) => Restored {
                graph: None,
                schema: Some(s),
            },
        }
    }
}

/// Restore from a server-provided inline graph, else from the `s` query
/// parameter of `location` (a full URL or a bare `?a=b` query). Anything
/// malformed means nothing is restored.
pub fn restore(inline_graph: Option<&str>, location: Option<&str>) -> Option<Restored> {
    if let Some(json) = inline_graph.filter(|s| !s.trim().is_empty()) {
        match Graph::from_json(json) {
            Ok(graph) => {
                return Some(Restored {
                    graph: Some(graph),
                    schema: None,
                });
            }
            Err(e) => warn!(error = %e, "ignoring malformed inline graph"),
        }
    }

    let token = location.and_then(share_param)?;
    match decode(&token) {
        Ok(payload) => Some(payload.into()),
        Err(e) => {
            warn!(error = %e, "ignoring malformed share token");
            None
        }
    }
}

fn share_param(location: &str) -> Option<String> {
    let query = match Url::parse(location) {
        Ok(url) => url.query()?.to_string(),
        Err(_) => location.trim_start_matches('?').to_string(),
    };
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == "s")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShareError {
    #[error("share link expired")]
    Expired,
    #[error("share link not found")]
    Missing,
    #[error("share store rejected the payload: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShareLink {
    pub key: String,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Persistence for share tokens behind short links.
pub trait ShareStore {
    fn store(&mut self, payload: &str) -> Result<ShareLink, ShareError>;
    fn fetch(&self, key: &str) -> Result<String, ShareError>;
}

/// Content-derived key: CRC-32 of the payload as eight hex digits.
pub fn share_key(payload: &str) -> String {
    let mut crc = flate2::Crc::new();
    crc.update(payload.as_bytes());
    format!("{:08x}", crc.sum())
}

pub const SHARE_TTL_HOURS: i64 = 48;

/// In-memory [`ShareStore`] with an injected clock.
pub struct MemoryShareStore<C> {
    base: Url,
    ttl: Duration,
    clock: C,
    entries: HashMap<String, (String, DateTime<Utc>)>,
}

impl<C: Fn() -> DateTime<Utc>> MemoryShareStore<C> {
    /// `base` is the URL short links are resolved against, e.g.
    /// `https://example.com/erd/s/`.
    pub fn new(base: &str, clock: C) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Url::parse(base)?,
            ttl: Duration::hours(SHARE_TTL_HOURS),
            clock,
            entries: HashMap::new(),
        })
    }
}

impl<C: Fn() -> DateTime<Utc>> ShareStore for MemoryShareStore<C> {
    fn store(&mut self, payload: &str) -> Result<ShareLink, ShareError> {
        if payload.is_empty() {
            return Err(ShareError::Rejected("empty payload".into()));
        }
        let key = share_key(payload);
        let url = self
            .base
            .join(&key)
            .map_err(|e| ShareError::Rejected(e.to_string()))?;
        let expires_at = (self.clock)() + self.ttl;
        self.entries
            .insert(key.clone(), (payload.to_string(), expires_at));
        Ok(ShareLink {
            key,
            url: url.into(),
            expires_at,
        })
    }

    fn fetch(&self, key: &str) -> Result<String, ShareError> {
        let (payload, expires_at) = self.entries.get(key).ok_or(ShareError::Missing)?;
        if (self.clock)() >= *expires_at {
            return Err(ShareError::Expired);
        }
        Ok(payload.clone())
    }
}
