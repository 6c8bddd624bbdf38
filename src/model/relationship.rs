//! Relationships between tables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One side of a relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

impl Cardinality {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "one" => Some(Cardinality::One),
            "many" => Some(Cardinality::Many),
            _ => None,
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::One => write!(f, "one"),
            Cardinality::Many => write!(f, "many"),
        }
    }
}

/// A relationship between two table columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub name: Option<String>,
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    pub from_cardinality: Option<Cardinality>,
    pub to_cardinality: Option<Cardinality>,
    pub is_active: bool,
    pub cross_filtering_behavior: Option<String>,
    pub security_filtering_behavior: Option<String>,
    pub lineage_tag: Option<String>,
}

impl Default for Relationship {
    fn default() -> Self {
        Self {
            name: None,
            from_table: String::new(),
            from_column: String::new(),
            to_table: String::new(),
            to_column: String::new(),
            from_cardinality: None,
            to_cardinality: None,
            is_active: true,
            cross_filtering_behavior: None,
            security_filtering_behavior: None,
            lineage_tag: None,
        }
    }
}

impl Relationship {
    /// Both endpoints captured; only such relationships are kept by the parser
    pub fn has_endpoints(&self) -> bool {
        !self.from_table.is_empty() && !self.to_table.is_empty()
    }

    /// Both sides carry an explicit cardinality
    pub fn has_explicit_cardinality(&self) -> bool {
        self.from_cardinality.is_some() && self.to_cardinality.is_some()
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] -> {}[{}]",
            self.from_table, self.from_column, self.to_table, self.to_column
        )?;
        if !self.is_active {
            write!(f, " (inactive)")?;
        }
        Ok(())
    }
}
