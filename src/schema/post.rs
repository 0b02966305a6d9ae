//! Turns collected declarations into the final [`Graph`].

use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::debug;

use super::collect::{Collected, RawEdge};
use super::inflect::pluralize;
use super::ParseOptions;
use crate::model::{Cardinality, Column, Edge, Graph, Table};

/// Add an edge for every `<prefix>_id` column whose pluralized prefix names
/// a known table, unless that (from, to) pair is already connected.
pub fn infer_foreign_keys(collected: &mut Collected) {
    let mut connected: HashSet<(String, String)> = collected
        .edges
        .iter()
        .map(|e| (e.from.clone(), e.to.clone()))
        .collect();

    let mut inferred = Vec::new();
    for (table, columns) in &collected.tables {
        for column in columns {
            let Some(prefix) = column.name.strip_suffix("_id") else {
                continue;
            };
            if prefix.is_empty() {
                continue;
            }
            let target = pluralize(prefix);
            if !collected.tables.contains_key(&target) {
                continue;
            }
            if connected.insert((table.clone(), target.clone())) {
                inferred.push(RawEdge {
                    from: table.clone(),
                    to: target,
                    column: Some(column.name.clone()),
                    unique: false,
                });
            }
        }
    }

    if !inferred.is_empty() {
        debug!(count = inferred.len(), "inferred foreign keys from _id columns");
    }
    collected.edges.extend(inferred);
}

fn is_excluded(name: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|p| name.starts_with(p.as_str()))
}

/// Collapse edges by (from, to); the first declaration keeps its place and
/// absorbs a missing column and the unique flag of later duplicates.
pub fn dedup_edges(edges: Vec<RawEdge>) -> Vec<RawEdge> {
    let mut merged: IndexMap<(String, String), RawEdge> = IndexMap::new();
    for edge in edges {
        let key = (edge.from.clone(), edge.to.clone());
        match merged.get_mut(&key) {
            Some(first) => {
                if first.column.is_none() {
                    first.column = edge.column;
                }
                first.unique |= edge.unique;
            }
            None => {
                merged.insert(key, edge);
            }
        }
    }
    merged.into_values().collect()
}

pub fn finalize(mut collected: Collected, options: &ParseOptions) -> Graph {
    if options.infer_foreign_keys {
        infer_foreign_keys(&mut collected);
    }

    let Collected {
        tables,
        edges,
        unique_columns,
    } = collected;

    let tables: IndexMap<String, Vec<Column>> = tables
        .into_iter()
        .filter(|(name, _)| !is_excluded(name, &options.excluded_prefixes))
        .collect();

    let links = dedup_edges(edges)
        .into_iter()
        .filter(|e| tables.contains_key(&e.from) && tables.contains_key(&e.to))
        .map(|e| {
            let unique = e.unique
                || e.column
                    .as_ref()
                    .is_some_and(|c| unique_columns.contains(&(e.from.clone(), c.clone())));
            Edge {
                from: e.from,
                to: e.to,
                from_cardinality: if unique {
                    Cardinality::One
                } else {
                    Cardinality::Many
                },
                to_cardinality: Cardinality::One,
            }
        })
        .collect();

    let nodes = tables
        .into_iter()
        .map(|(id, fields)| Table {
            id,
            fields,
            x: None,
            y: None,
        })
        .collect();

    Graph { nodes, links }
}
