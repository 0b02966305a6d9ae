//! Graph model shared by the parser, the layout engine and the viewer.
//!
//! The serde representation is the JSON wire format used by the parse
//! endpoint and by share tokens:
//! `{"nodes":[{"id":"users","fields":[["email","varchar"]]}],
//!   "links":[{"from":"posts","to":"users","fromCard":"many","toCard":"1"}]}`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Table>,
    #[serde(default)]
    pub links: Vec<Edge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: String,
    #[serde(default)]
    pub fields: Vec<Column>,
    /// Top-left corner, present when restored from a share link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

/// A column, serialized as a `[name, type]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct Column {
    pub name: String,
    pub typ: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(rename = "fromCard")]
    pub from_cardinality: Cardinality,
    #[serde(rename = "toCard")]
    pub to_cardinality: Cardinality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "many")]
    Many,
}

impl Cardinality {
    /// Marker drawn next to the line end.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::One => "1",
            Self::Many => "*",
        }
    }
}

impl Table {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Vec::new(),
            x: None,
            y: None,
        }
    }

    pub fn with_field(mut self, name: &str, typ: &str) -> Self {
        self.fields.push(Column::new(name, typ));
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn is_positioned(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }
}

impl Column {
    pub fn new(name: impl Into<String>, typ: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            typ: typ.into(),
        }
    }
}

impl From<(String, String)> for Column {
    fn from((name, typ): (String, String)) -> Self {
        Self { name, typ }
    }
}

impl From<Column> for (String, String) {
    fn from(c: Column) -> Self {
        (c.name, c.typ)
    }
}

impl Edge {
    pub fn many_to_one(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            from_cardinality: Cardinality::Many,
            to_cardinality: Cardinality::One,
        }
    }

    pub fn is_self_ref(&self) -> bool {
        self.from == self.to
    }
}

impl Graph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn table(&self, id: &str) -> Option<&Table> {
        self.nodes.iter().find(|t| t.id == id)
    }

    pub fn to_json(&self) -> String {
        // Serializing plain strings/numbers cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| String::from(r#"{"nodes":[],"links":[]}"#))
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let graph = Graph {
            nodes: vec![Table::new("users").with_field("email", "varchar")],
            links: vec![Edge::many_to_one("posts", "users")],
        };
        assert_eq!(
            graph.to_json(),
            r#"{"nodes":[{"id":"users","fields":[["email","varchar"]]}],"links":[{"from":"posts","to":"users","fromCard":"many","toCard":"1"}]}"#
        );
    }

    #[test]
    fn test_positions_roundtrip() {
        let json = r#"{"nodes":[{"id":"a","fields":[],"x":10.5,"y":-3}],"links":[]}"#;
        let graph = Graph::from_json(json).unwrap();
        assert_eq!(graph.nodes[0].x, Some(10.5));
        assert_eq!(graph.nodes[0].y, Some(-3.0));
        assert!(graph.nodes[0].is_positioned());
    }

    #[test]
    fn test_missing_collections_default_to_empty() {
        let graph = Graph::from_json("{}").unwrap();
        assert!(graph.is_empty());
        assert!(graph.links.is_empty());
    }

    #[test]
    fn test_cardinality_symbol() {
        assert_eq!(Cardinality::One.symbol(), "1");
        assert_eq!(Cardinality::Many.symbol(), "*");
    }
}
