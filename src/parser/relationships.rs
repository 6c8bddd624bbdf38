/*!
# Relationship Parser

Parses `relationships.tmdl`. Each `relationship <name>` line, or a bare
`relationship` line without a name, opens a record; the following property
lines fill it. A record is kept only when both endpoint
tables were captured.
*/

use super::lines::{unquote_identifier, unquote_value, Keyword, Line, LineKind};
use crate::model::{Cardinality, Relationship};
use once_cell::sync::Lazy;
use regex::Regex;

/// `Table.Column`, `'Table Name'.Column` or `'Table'.'Column Name'`
static COLUMN_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^('(?:[^']|'')+'|[^.\s']+)\.('(?:[^']|'')+'|.+)$")
        .expect("column reference pattern is valid")
});

/// Parses the relationships file. Malformed or incomplete records are dropped.
pub fn parse_relationships(text: &str) -> Vec<Relationship> {
    let mut relationships = Vec::new();
    let mut current: Option<Relationship> = None;

    for raw in text.lines() {
        let line = Line::parse(raw);
        match line.kind {
            LineKind::Declaration {
                keyword: Keyword::Relationship,
                name,
                ..
            } => {
                flush(&mut relationships, current.take());
                current = Some(Relationship {
                    name: Some(name),
                    ..Relationship::default()
                });
            }
            LineKind::Flag("relationship") => {
                flush(&mut relationships, current.take());
                current = Some(Relationship::default());
            }
            LineKind::Property { key, value } => {
                if let Some(rel) = current.as_mut() {
                    apply_property(rel, key, value);
                }
            }
            _ => {}
        }
    }
    flush(&mut relationships, current);

    tracing::debug!("Parsed {} relationships", relationships.len());
    relationships
}

fn flush(relationships: &mut Vec<Relationship>, candidate: Option<Relationship>) {
    let Some(rel) = candidate else {
        return;
    };
    if rel.has_endpoints() {
        relationships.push(rel);
    } else {
        tracing::warn!(
            "Dropping relationship '{}' without both endpoints",
            rel.name.as_deref().unwrap_or("<unnamed>")
        );
    }
}

fn apply_property(rel: &mut Relationship, key: &str, value: &str) {
    match key {
        "fromColumn" => {
            if let Some((table, column)) = split_column_ref(value) {
                rel.from_table = table;
                rel.from_column = column;
            }
        }
        "toColumn" => {
            if let Some((table, column)) = split_column_ref(value) {
                rel.to_table = table;
                rel.to_column = column;
            }
        }
        "fromCardinality" => rel.from_cardinality = Cardinality::parse(value),
        "toCardinality" => rel.to_cardinality = Cardinality::parse(value),
        // only the exact `false` deactivates
        "isActive" => {
            if value.trim() == "false" {
                rel.is_active = false;
            }
        }
        "crossFilteringBehavior" => rel.cross_filtering_behavior = Some(unquote_value(value)),
        "securityFilteringBehavior" => {
            rel.security_filtering_behavior = Some(unquote_value(value))
        }
        "lineageTag" => rel.lineage_tag = Some(unquote_value(value)),
        _ => {}
    }
}

/// Splits a `Table.Column` reference into unquoted table and column names
pub fn split_column_ref(value: &str) -> Option<(String, String)> {
    let caps = COLUMN_REF.captures(value.trim())?;
    let table = unquote_identifier(caps.get(1)?.as_str());
    let column = unquote_identifier(caps.get(2)?.as_str());
    if table.is_empty() || column.is_empty() {
        return None;
    }
    Some((table, column))
}
