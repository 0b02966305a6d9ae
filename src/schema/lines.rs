//! Line-oriented schema.rb reader.
//!
//! Recognizes the handful of statement shapes Rails' schema dumper emits and
//! skips everything else. There is no grammar: a missing `end` just leaves
//! the last table open, which is harmless.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use super::collect::{Collected, Reference};
use super::types::column_type;

#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("line {line}: unsupported syntax: {text}")]
    UnsupportedSyntax { line: usize, text: String },
}

/// `"name"`, `'name'` or `:name`; occupies three capture groups.
const NAME: &str = r#"(?:"([^"]+)"|'([^']+)'|:(\w+))"#;

struct Patterns {
    create_table: Regex,
    create_table_any: Regex,
    paren_call: Regex,
    column: Regex,
    typed_column: Regex,
    timestamps: Regex,
    table_index: Regex,
    add_index: Regex,
    add_foreign_key: Regex,
    fk_column: Regex,
    fk_marker: Regex,
    to_table: Regex,
    unique: Regex,
    polymorphic: Regex,
    opens_block: Regex,
}

fn patterns() -> &'static Patterns {
    static CELL: OnceLock<Patterns> = OnceLock::new();
    CELL.get_or_init(|| {
        let re = |s: &str| Regex::new(s).expect("schema line pattern must compile");
        Patterns {
            create_table: re(&format!(r"^create_table\s+{NAME}")),
            create_table_any: re(r"^create_table\b"),
            paren_call: re(r"^(?:create_table|t\.\w+)\("),
            column: re(&format!(r"^t\.(\w+)\s+{NAME}")),
            typed_column: re(&format!(r"^t\.column\s+{NAME}\s*,\s*(?:'(\w+)'|\x22(\w+)\x22|:(\w+))")),
            timestamps: re(r"^t\.timestamps\b"),
            // Single column only: `["email"]`, `"email"` or `:email`.
            table_index: re(&format!(r"^t\.index\s+(?:\[\s*{NAME}\s*\]|{NAME})\s*(?:,|$)")),
            add_index: re(&format!(
                r"^add_index\s+{NAME}\s*,\s*(?:\[\s*{NAME}\s*\]|{NAME})\s*(?:,|$)"
            )),
            add_foreign_key: re(&format!(r"^add_foreign_key\s+{NAME}\s*,\s*{NAME}")),
            fk_column: re(&format!(r"\bcolumn:\s*{NAME}")),
            fk_marker: re(r"(?:\bforeign_key:|:foreign_key\s*=>)\s*(?:true\b|\{)"),
            to_table: re(&format!(r"\bto_table:\s*{NAME}")),
            unique: re(r"(?:\bunique:|:unique\s*=>)\s*true\b"),
            polymorphic: re(r"\bpolymorphic:\s*true\b"),
            opens_block: re(r"\bdo(?:\s*\|[^|]*\|)?\s*$"),
        }
    })
}

/// First non-empty group among `count` groups starting at `start`.
fn name_at<'t>(caps: &Captures<'t>, start: usize, count: usize) -> Option<&'t str> {
    (start..start + count).find_map(|i| caps.get(i).map(|m| m.as_str()))
}

struct TableContext {
    name: String,
    /// Nested `do ... end` blocks opened inside the table body.
    nested: usize,
}

/// Scan `text` line by line into `out`.
pub fn read(text: &str, out: &mut Collected) -> Result<(), LineError> {
    let p = patterns();
    let mut current: Option<TableContext> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if p.paren_call.is_match(line) {
            return Err(LineError::UnsupportedSyntax {
                line: idx + 1,
                text: line.to_string(),
            });
        }

        if p.create_table_any.is_match(line) {
            let Some(caps) = p.create_table.captures(line) else {
                return Err(LineError::UnsupportedSyntax {
                    line: idx + 1,
                    text: line.to_string(),
                });
            };
            if let Some(name) = name_at(&caps, 1, 3) {
                out.open_table(name);
                current = Some(TableContext {
                    name: name.to_string(),
                    nested: 0,
                });
            }
            continue;
        }

        if let Some(ctx) = current.as_mut() {
            if line == "end" {
                if ctx.nested == 0 {
                    current = None;
                } else {
                    ctx.nested -= 1;
                }
                continue;
            }
            if line.starts_with("t.") {
                read_table_line(line, &ctx.name, out);
            }
            if p.opens_block.is_match(line) {
                ctx.nested += 1;
            }
            continue;
        }

        if let Some(caps) = p.add_foreign_key.captures(line) {
            if let (Some(from), Some(to)) = (name_at(&caps, 1, 3), name_at(&caps, 4, 3)) {
                let column = p
                    .fk_column
                    .captures(line)
                    .and_then(|c| name_at(&c, 1, 3).map(str::to_string));
                out.add_foreign_key(from, to, column.as_deref());
            }
            continue;
        }

        if let Some(caps) = p.add_index.captures(line) {
            if p.unique.is_match(line) {
                if let (Some(table), Some(column)) = (name_at(&caps, 1, 3), name_at(&caps, 4, 6)) {
                    out.add_unique_index(table, column);
                }
            }
        }
    }

    Ok(())
}

fn read_table_line(line: &str, table: &str, out: &mut Collected) {
    let p = patterns();

    if p.timestamps.is_match(line) {
        out.add_timestamps(table);
        return;
    }

    if line.starts_with("t.index") {
        if let Some(caps) = p.table_index.captures(line) {
            if p.unique.is_match(line) {
                if let Some(column) = name_at(&caps, 1, 6) {
                    out.add_unique_index(table, column);
                }
            }
        }
        return;
    }

    if let Some(caps) = p.typed_column.captures(line) {
        if let (Some(name), Some(typ)) = (name_at(&caps, 1, 3), name_at(&caps, 4, 3)) {
            out.add_column(table, name, &column_type(typ));
        }
        return;
    }

    let Some(caps) = p.column.captures(line) else {
        return;
    };
    let Some(method) = caps.get(1).map(|m| m.as_str()) else {
        return;
    };
    let Some(col) = name_at(&caps, 2, 3) else {
        return;
    };

    match method {
        "references" | "belongs_to" => {
            let to_table = p
                .to_table
                .captures(line)
                .and_then(|c| name_at(&c, 1, 3));
            out.add_reference(
                table,
                &Reference {
                    name: col,
                    foreign_key: p.fk_marker.is_match(line),
                    to_table,
                    polymorphic: p.polymorphic.is_match(line),
                    unique: p.unique.is_match(line),
                },
            );
        }
        "check_constraint" | "exclusion_constraint" | "unique_constraint" => {}
        _ => out.add_column(table, col, &column_type(method)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Column;

    fn collect(text: &str) -> Collected {
        let mut out = Collected::default();
        read(text, &mut out).unwrap();
        out
    }

    #[test]
    fn test_basic_table() {
        let out = collect(
            r#"
ActiveRecord::Schema[7.1].define(version: 2024_01_01_000000) do
  create_table "users", force: :cascade do |t|
    t.string "email", null: false
    t.integer "age"
    t.citext "slug"
  end
end
"#,
        );
        assert_eq!(
            out.tables["users"],
            vec![
                Column::new("email", "varchar"),
                Column::new("age", "int"),
                Column::new("slug", "citext"),
            ]
        );
    }

    #[test]
    fn test_symbol_names() {
        let out = collect(
            "create_table :posts do |t|\n  t.references :user, foreign_key: true\nend\n",
        );
        assert_eq!(out.tables["posts"], vec![Column::new("user_id", "int")]);
        assert_eq!(out.edges.len(), 1);
        assert_eq!(out.edges[0].from, "posts");
        assert_eq!(out.edges[0].to, "users");
        assert_eq!(out.edges[0].column.as_deref(), Some("user_id"));
    }

    #[test]
    fn test_reference_without_fk_marker() {
        let out = collect("create_table \"posts\" do |t|\n  t.references \"user\"\nend\n");
        assert_eq!(out.tables["posts"], vec![Column::new("user_id", "int")]);
        assert!(out.edges.is_empty());
    }

    #[test]
    fn test_reference_to_table_and_unique() {
        let out = collect(
            r#"create_table "profiles" do |t|
  t.belongs_to :owner, foreign_key: { to_table: :users }, index: { unique: true }
end
"#,
        );
        assert_eq!(out.edges[0].to, "users");
        assert!(out.edges[0].unique);
    }

    #[test]
    fn test_polymorphic_reference() {
        let out = collect("create_table \"comments\" do |t|\n  t.references :commentable, polymorphic: true\nend\n");
        assert_eq!(
            out.tables["comments"],
            vec![
                Column::new("commentable_id", "int"),
                Column::new("commentable_type", "varchar"),
            ]
        );
        assert!(out.edges.is_empty());
    }

    #[test]
    fn test_timestamps_with_and_without_args() {
        let out = collect(
            "create_table \"a\" do |t|\n  t.timestamps\nend\ncreate_table \"b\" do |t|\n  t.timestamps null: false\nend\n",
        );
        for table in ["a", "b"] {
            assert_eq!(
                out.tables[table],
                vec![
                    Column::new("created_at", "datetime"),
                    Column::new("updated_at", "datetime"),
                ]
            );
        }
    }

    #[test]
    fn test_typed_column() {
        let out = collect("create_table \"a\" do |t|\n  t.column \"score\", :decimal\nend\n");
        assert_eq!(out.tables["a"], vec![Column::new("score", "decimal")]);
    }

    #[test]
    fn test_unique_indexes() {
        let out = collect(
            r#"create_table "users" do |t|
  t.string "email"
  t.string "first"
  t.string "last"
  t.index ["email"], name: "index_users_on_email", unique: true
  t.index ["first", "last"], unique: true
  t.index ["last"], name: "index_users_on_last"
end
add_index "accounts", "slug", unique: true
add_index :accounts, [:owner_id, :slug], unique: true
"#,
        );
        assert!(out.unique_columns.contains(&("users".into(), "email".into())));
        assert!(out.unique_columns.contains(&("accounts".into(), "slug".into())));
        assert_eq!(out.unique_columns.len(), 2);
        assert_eq!(out.tables["users"].len(), 3);
    }

    #[test]
    fn test_add_foreign_key_with_column() {
        let out = collect(
            "add_foreign_key \"posts\", \"users\"\nadd_foreign_key \"posts\", \"users\", column: \"editor_id\"\n",
        );
        assert_eq!(out.edges.len(), 2);
        assert_eq!(out.edges[0].column, None);
        assert_eq!(out.edges[1].column.as_deref(), Some("editor_id"));
    }

    #[test]
    fn test_missing_end_keeps_partial_result() {
        let out = collect("create_table \"users\" do |t|\n  t.string \"email\"\n");
        assert_eq!(out.tables["users"], vec![Column::new("email", "varchar")]);
    }

    #[test]
    fn test_nested_block_does_not_close_table() {
        let out = collect(
            "create_table \"a\" do |t|\n  t.string \"x\"\n  t.with_options null: false do |o|\n  end\n  t.string \"y\"\nend\n",
        );
        assert_eq!(out.tables["a"].len(), 2);
    }

    #[test]
    fn test_parenthesized_call_is_unsupported() {
        let mut out = Collected::default();
        let err = read("create_table(\"users\") do |t|\nend\n", &mut out).unwrap_err();
        assert!(matches!(err, LineError::UnsupportedSyntax { line: 1, .. }));
    }

    #[test]
    fn test_non_literal_table_name_is_unsupported() {
        let mut out = Collected::default();
        assert!(read("create_table table_name do |t|\nend\n", &mut out).is_err());
    }

    #[test]
    fn test_unknown_lines_skipped() {
        let out = collect(
            "enable_extension \"plpgsql\"\ncreate_enum \"mood\", [\"happy\"]\ncreate_table \"a\" do |t|\n  t.check_constraint \"x > 0\"\nend\n",
        );
        assert!(out.tables["a"].is_empty());
    }
}
