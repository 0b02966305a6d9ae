//! Accumulator filled by either parser tier.

use indexmap::IndexMap;
use std::collections::HashSet;

use super::inflect::pluralize;
use super::types::{POLYMORPHIC_TYPE, REFERENCE_TYPE, TIMESTAMP_TYPE};
use crate::model::Column;

/// A foreign key exactly as declared, before inference and dedup.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEdge {
    pub from: String,
    pub to: String,
    pub column: Option<String>,
    /// Declared unique at the reference site (`index: { unique: true }`).
    pub unique: bool,
}

#[derive(Debug, Default)]
pub struct Collected {
    /// Table name -> columns, in declaration order.
    pub tables: IndexMap<String, Vec<Column>>,
    pub edges: Vec<RawEdge>,
    /// (table, column) pairs covered by a single-column unique index.
    pub unique_columns: HashSet<(String, String)>,
}

/// What a `references` / `belongs_to` declaration asked for.
#[derive(Debug, Default)]
pub struct Reference<'a> {
    pub name: &'a str,
    pub foreign_key: bool,
    pub to_table: Option<&'a str>,
    pub polymorphic: bool,
    pub unique: bool,
}

impl Collected {
    pub fn open_table(&mut self, name: &str) {
        self.tables.entry(name.to_string()).or_default();
    }

    pub fn add_column(&mut self, table: &str, name: &str, typ: &str) {
        self.tables
            .entry(table.to_string())
            .or_default()
            .push(Column::new(name, typ));
    }

    pub fn add_timestamps(&mut self, table: &str) {
        self.add_column(table, "created_at", TIMESTAMP_TYPE);
        self.add_column(table, "updated_at", TIMESTAMP_TYPE);
    }

    pub fn add_reference(&mut self, table: &str, r: &Reference<'_>) {
        let column = format!("{}_id", r.name);
        self.add_column(table, &column, REFERENCE_TYPE);
        if r.polymorphic {
            self.add_column(table, &format!("{}_type", r.name), POLYMORPHIC_TYPE);
        }
        if r.foreign_key {
            let to = r
                .to_table
                .map(str::to_string)
                .unwrap_or_else(|| pluralize(r.name));
            self.edges.push(RawEdge {
                from: table.to_string(),
                to,
                column: Some(column),
                unique: r.unique,
            });
        }
    }

    pub fn add_foreign_key(&mut self, from: &str, to: &str, column: Option<&str>) {
        self.edges.push(RawEdge {
            from: from.to_string(),
            to: to.to_string(),
            column: column.map(str::to_string),
            unique: false,
        });
    }

    pub fn add_unique_index(&mut self, table: &str, column: &str) {
        self.unique_columns
            .insert((table.to_string(), column.to_string()));
    }
}
