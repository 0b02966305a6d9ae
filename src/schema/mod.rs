//! Rails `schema.rb` to [`Graph`] conversion.
//!
//! Parsing runs in two tiers. The line reader handles what the Rails schema
//! dumper emits; when it meets call syntax it does not model, the text is
//! re-read by the tolerant interpreter. Either way the result goes through
//! the same post-processing (foreign-key inference, exclusion, dedup,
//! cardinality).

pub mod collect;
pub mod inflect;
pub mod interp;
pub mod lexer;
pub mod lines;
pub mod post;
pub mod types;

use tracing::{debug, warn};

use crate::model::Graph;
use collect::Collected;
use interp::InterpError;
use lines::LineError;

pub use inflect::pluralize;

/// Table name prefixes left out of the diagram by default.
pub const DEFAULT_EXCLUDED_PREFIXES: &[&str] = &[
    "active_storage_",
    "action_text_",
    "action_mailbox_",
    "ar_internal_metadata",
    "schema_migrations",
];

#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Connect `<name>_id` columns to the `<name>s` table when it exists.
    pub infer_foreign_keys: bool,
    pub excluded_prefixes: Vec<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            infer_foreign_keys: true,
            excluded_prefixes: DEFAULT_EXCLUDED_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("could not parse schema: {fallback} (line reader: {primary})")]
    Failed {
        primary: LineError,
        fallback: InterpError,
    },
}

impl SchemaError {
    pub fn kind(&self) -> &'static str {
        "parse_error"
    }

    /// `{"error":"parse_error","message":"..."}`
    pub fn to_json(&self) -> String {
        serde_json::json!({ "error": self.kind(), "message": self.to_string() }).to_string()
    }
}

pub fn parse(text: &str) -> Result<Graph, SchemaError> {
    parse_with(text, &ParseOptions::default())
}

pub fn parse_with(text: &str, options: &ParseOptions) -> Result<Graph, SchemaError> {
    if text.trim().is_empty() {
        return Ok(Graph::default());
    }

    let mut collected = Collected::default();
    if let Err(primary) = lines::read(text, &mut collected) {
        debug!(error = %primary, "line reader gave up, interpreting schema");
        collected = Collected::default();
        if let Err(fallback) = interp::run(text, &mut collected) {
            warn!(error = %fallback, "schema could not be parsed");
            return Err(SchemaError::Failed { primary, fallback });
        }
    }

    let graph = post::finalize(collected, options);
    debug!(
        tables = graph.nodes.len(),
        links = graph.links.len(),
        "parsed schema"
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cardinality, Column, Edge, Table};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_users_posts_scenario() {
        let graph = parse(
            r#"create_table "users" do |t|
  t.string "email"
end
create_table "posts" do |t|
  t.references :user, foreign_key: true
end
"#,
        )
        .unwrap();
        assert_eq!(
            graph,
            Graph {
                nodes: vec![
                    Table::new("users").with_field("email", "varchar"),
                    Table::new("posts").with_field("user_id", "int"),
                ],
                links: vec![Edge::many_to_one("posts", "users")],
            }
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").unwrap().is_empty());
        let graph = parse("  \n\t \n").unwrap();
        assert!(graph.nodes.is_empty());
        assert!(graph.links.is_empty());
    }

    #[test]
    fn test_column_order_preserved() {
        let graph = parse(
            "create_table \"a\" do |t|\n  t.string \"z\"\n  t.integer \"m\"\n  t.timestamps\n  t.boolean \"b\"\nend\n",
        )
        .unwrap();
        let names: Vec<&str> = graph.nodes[0].fields.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["z", "m", "created_at", "updated_at", "b"]);
    }

    #[test]
    fn test_references_property() {
        let graph = parse("create_table \"bars\" do |t|\n  t.references :foo, foreign_key: true\nend\ncreate_table \"foos\" do |t|\nend\n").unwrap();
        assert_eq!(graph.nodes[0].fields, vec![Column::new("foo_id", "int")]);
        assert_eq!(graph.links, vec![Edge::many_to_one("bars", "foos")]);
    }

    #[test]
    fn test_duplicate_declarations_collapse() {
        let graph = parse(
            r#"create_table "users" do |t|
end
create_table "posts" do |t|
  t.references :user, foreign_key: true
end
add_foreign_key "posts", "users"
"#,
        )
        .unwrap();
        assert_eq!(graph.links.len(), 1);
    }

    #[test]
    fn test_unique_index_cardinality() {
        let graph = parse(
            r#"create_table "users" do |t|
end
create_table "accounts" do |t|
  t.references :user, foreign_key: true
  t.index ["user_id"], name: "index_accounts_on_user_id", unique: true
end
create_table "posts" do |t|
  t.bigint "user_id"
  t.index ["user_id", "id"], unique: true
end
add_foreign_key "posts", "users"
"#,
        )
        .unwrap();
        let accounts = graph.links.iter().find(|l| l.from == "accounts").unwrap();
        assert_eq!(accounts.from_cardinality, Cardinality::One);
        let posts = graph.links.iter().find(|l| l.from == "posts").unwrap();
        assert_eq!(posts.from_cardinality, Cardinality::Many);
        assert!(graph.links.iter().all(|l| l.to_cardinality == Cardinality::One));
    }

    #[test]
    fn test_fallback_tier() {
        let graph = parse(
            r#"ActiveRecord::Schema[7.1].define(version: 2024_01_01_000000) do
  create_table("users") do |t|
    t.string("email")
  end
  create_table("posts") do |t|
    t.references(:user, foreign_key: true)
    t.index ["user_id"], unique: true
  end
end
"#,
        )
        .unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.links.len(), 1);
        // index lines are sanitized away before interpretation
        assert_eq!(graph.links[0].from_cardinality, Cardinality::Many);
    }

    #[test]
    fn test_both_tiers_fail() {
        let err = parse("create_table(\"users) do |t|\nend\n").unwrap_err();
        assert_eq!(err.kind(), "parse_error");
        let json: serde_json::Value = serde_json::from_str(&err.to_json()).unwrap();
        assert_eq!(json["error"], "parse_error");
        assert!(json["message"].as_str().unwrap().contains("unterminated"));
    }

    #[test]
    fn test_internal_tables_excluded() {
        let graph = parse(
            "create_table \"active_storage_blobs\" do |t|\nend\ncreate_table \"schema_migrations\" do |t|\nend\ncreate_table \"users\" do |t|\nend\n",
        )
        .unwrap();
        assert_eq!(graph.nodes, vec![Table::new("users")]);
    }

    #[test]
    fn test_self_reference_declared_explicitly() {
        let graph = parse(
            "create_table \"comments\" do |t|\n  t.references :parent, foreign_key: { to_table: :comments }\nend\n",
        )
        .unwrap();
        assert_eq!(graph.links, vec![Edge::many_to_one("comments", "comments")]);
    }

    #[test]
    fn test_custom_exclusions() {
        let options = ParseOptions {
            excluded_prefixes: vec!["legacy_".into()],
            ..ParseOptions::default()
        };
        let graph = parse_with(
            "create_table \"legacy_users\" do |t|\nend\ncreate_table \"schema_migrations\" do |t|\nend\n",
            &options,
        )
        .unwrap();
        assert_eq!(graph.nodes, vec![Table::new("schema_migrations")]);
    }
}
