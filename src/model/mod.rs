/*!
# Semantic Model

In-memory representation of a tabular semantic model reconstructed from TMDL text.
Records are created once by the parsers and never mutated afterwards; every
analysis in [`crate::dependencies`] and [`crate::metrics`] is derived from them.
*/

pub mod relationship;
pub mod table;

pub use relationship::{Cardinality, Relationship};
pub use table::{
    Annotation, Column, Hierarchy, Level, Measure, Table, Variation, DEFAULT_COLUMN_DATA_TYPE,
};

use crate::core::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete semantic model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub tables: Vec<Table>,
    pub relationships: Vec<Relationship>,
    /// Reserved, never parsed
    pub calculation_groups: Vec<String>,
    /// Reserved, never parsed
    pub perspectives: Vec<String>,
    /// Reserved, never parsed
    pub roles: Vec<String>,
    /// Reserved, never parsed
    pub cultures: Vec<String>,
    /// Reserved, never parsed
    pub annotations: Vec<Annotation>,
}

impl Model {
    pub fn new(name: impl Into<String>, tables: Vec<Table>, relationships: Vec<Relationship>) -> Self {
        Self {
            name: name.into(),
            tables,
            relationships,
            ..Self::default()
        }
    }

    /// Gets table by name
    pub fn table(&self, name: &str) -> ModelResult<&Table> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .or_else(|| self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name)))
            .ok_or_else(|| ModelError::TableNotFound(name.to_string()))
    }

    /// Gets a measure and its owning table. When the name is declared in several
    /// tables the first declaration in table order wins.
    pub fn measure(&self, name: &str) -> ModelResult<(&Table, &Measure)> {
        self.measures()
            .find(|(_, m)| m.name == name)
            .or_else(|| self.measures().find(|(_, m)| m.name.eq_ignore_ascii_case(name)))
            .ok_or_else(|| ModelError::MeasureNotFound(name.to_string()))
    }

    /// Gets a column of a table
    pub fn column(&self, table: &str, column: &str) -> ModelResult<&Column> {
        let owner = self.table(table)?;
        owner.find_column(column).ok_or_else(|| ModelError::ColumnNotFound {
            table: owner.name.clone(),
            column: column.to_string(),
        })
    }

    /// Iterates over every measure with its owning table, in declaration order
    pub fn measures(&self) -> impl Iterator<Item = (&Table, &Measure)> {
        self.tables
            .iter()
            .flat_map(|t| t.measures.iter().map(move |m| (t, m)))
    }

    pub fn measure_count(&self) -> usize {
        self.tables.iter().map(|t| t.measures.len()).sum()
    }

    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }
}

/// A loaded project: the source path, the resolved semantic model directory and the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub source_path: String,
    pub semantic_model_path: PathBuf,
    pub model: Model,
}
