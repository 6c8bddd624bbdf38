//! Table-level records: tables, measures, columns, hierarchies and annotations.

use serde::{Deserialize, Serialize};

/// Data type assumed for columns that never declare one
pub const DEFAULT_COLUMN_DATA_TYPE: &str = "string";

/// Name/value annotation attached to a table, measure or column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    pub value: String,
}

/// A table of the semantic model with its child objects in declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub lineage_tag: Option<String>,
    pub is_hidden: bool,
    pub description: Option<String>,
    pub measures: Vec<Measure>,
    pub columns: Vec<Column>,
    pub hierarchies: Vec<Hierarchy>,
    pub annotations: Vec<Annotation>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Find a measure declared in this table (exact name first, then case-insensitive)
    pub fn find_measure(&self, name: &str) -> Option<&Measure> {
        self.measures
            .iter()
            .find(|m| m.name == name)
            .or_else(|| self.measures.iter().find(|m| m.name.eq_ignore_ascii_case(name)))
    }

    /// Find a column declared in this table (exact name first, then case-insensitive)
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .or_else(|| self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)))
    }

    pub fn find_hierarchy(&self, name: &str) -> Option<&Hierarchy> {
        self.hierarchies.iter().find(|h| h.name == name)
    }
}

/// A DAX measure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub name: String,
    /// Formula text: the trimmed fenced block, or the remainder of the declaration line
    pub expression: String,
    pub display_folder: Option<String>,
    pub format_string: Option<String>,
    pub description: Option<String>,
    pub is_hidden: bool,
    pub data_category: Option<String>,
    pub lineage_tag: Option<String>,
    pub annotations: Vec<Annotation>,
}

impl Measure {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            ..Self::default()
        }
    }

    pub fn has_description(&self) -> bool {
        self.description.as_deref().is_some_and(|d| !d.trim().is_empty())
    }

    pub fn has_display_folder(&self) -> bool {
        self.display_folder.as_deref().is_some_and(|d| !d.trim().is_empty())
    }
}

/// Date-table variation of a column (auto date/time)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    pub name: String,
    pub is_default: bool,
    pub relationship: Option<String>,
    pub default_hierarchy: Option<String>,
}

/// A table column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    pub source_column: Option<String>,
    pub is_hidden: bool,
    pub format_string: Option<String>,
    pub data_category: Option<String>,
    pub summarize_by: Option<String>,
    pub sort_by_column: Option<String>,
    pub display_folder: Option<String>,
    pub lineage_tag: Option<String>,
    pub description: Option<String>,
    /// DAX expression of a calculated column
    pub expression: Option<String>,
    pub annotations: Vec<Annotation>,
    pub variation: Option<Variation>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: DEFAULT_COLUMN_DATA_TYPE.to_string(),
            source_column: None,
            is_hidden: false,
            format_string: None,
            data_category: None,
            summarize_by: None,
            sort_by_column: None,
            display_folder: None,
            lineage_tag: None,
            description: None,
            expression: None,
            annotations: Vec::new(),
            variation: None,
        }
    }

    pub fn is_calculated(&self) -> bool {
        self.expression.is_some()
    }
}

/// A hierarchy level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    pub column: Option<String>,
    pub lineage_tag: Option<String>,
    pub ordinal: Option<i32>,
}

/// A user hierarchy with ordered levels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hierarchy {
    pub name: String,
    pub lineage_tag: Option<String>,
    pub levels: Vec<Level>,
    pub is_hidden: bool,
    pub display_folder: Option<String>,
}
