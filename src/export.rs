/*!
# Export

Plain-text and structured views of a single table: a DAX script listing every
measure, and a schema summary of its columns.
*/

use crate::model::Table;
use serde::{Deserialize, Serialize};

/// DAX script of a table's measures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaxExport {
    pub dax_script: String,
    pub table_name: String,
    pub measure_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: String,
    /// Source column, or the column name when none is declared
    pub source: String,
    pub is_hidden: bool,
}

/// Schema summary of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnSchema>,
    pub measure_count: usize,
    pub hierarchy_count: usize,
}

/// Renders every measure of the table as `[Name] = expression`, each preceded
/// by its description (or name) as a comment and followed by a blank line
pub fn export_dax_script(table: &Table) -> DaxExport {
    let mut lines = vec![
        format!("-- DAX Measures for {}", table.name),
        format!("-- Generated by {}", env!("CARGO_PKG_NAME")),
        String::new(),
    ];

    for measure in &table.measures {
        let title = measure
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(&measure.name);
        // Multi-line descriptions stay inside the comment
        for comment in title.lines() {
            lines.push(format!("-- {}", comment));
        }
        lines.push(format!("[{}] = {}", measure.name, measure.expression));
        if let Some(format_string) = &measure.format_string {
            lines.push(format!("-- Format: {}", format_string));
        }
        lines.push(String::new());
    }

    DaxExport {
        dax_script: lines.join("\n"),
        table_name: table.name.clone(),
        measure_count: table.measures.len(),
    }
}

pub fn table_schema(table: &Table) -> TableSchema {
    TableSchema {
        table_name: table.name.clone(),
        columns: table
            .columns
            .iter()
            .map(|column| ColumnSchema {
                name: column.name.clone(),
                data_type: column.data_type.clone(),
                source: column
                    .source_column
                    .clone()
                    .unwrap_or_else(|| column.name.clone()),
                is_hidden: column.is_hidden,
            })
            .collect(),
        measure_count: table.measures.len(),
        hierarchy_count: table.hierarchies.len(),
    }
}
