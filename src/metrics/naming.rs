/*!
# Naming Conventions

Display names of tables, measures and columns follow one style: words
separated by single spaces, each significant word capitalized, no cryptic
abbreviations and no special characters. Each offending object yields exactly
one [`NamingIssue`] listing every violated rule and a suggested name.
*/

use crate::config::AnalysisConfig;
use crate::model::Model;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Abbreviation → full word
pub const ABBREVIATIONS: &[(&str, &str)] = &[
    ("amt", "Amount"),
    ("qty", "Quantity"),
    ("cnt", "Count"),
    ("pct", "Percent"),
    ("yr", "Year"),
    ("mth", "Month"),
    ("avg", "Average"),
    ("num", "Number"),
    ("desc", "Description"),
    ("cust", "Customer"),
    ("prod", "Product"),
];

/// Characters allowed besides letters, digits, spaces and underscores
const ALLOWED_PUNCTUATION: &[char] = &['-', '%', '(', ')', '&', '.', '#', '/', ','];

/// Lower-case joining words left as is inside a name
const MINOR_WORDS: &[&str] = &["of", "by", "and", "or", "per", "vs", "to", "in", "the", "for"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Table,
    Measure,
    Column,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Table => write!(f, "table"),
            ObjectKind::Measure => write!(f, "measure"),
            ObjectKind::Column => write!(f, "column"),
        }
    }
}

/// Naming problem of one object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingIssue {
    pub object_kind: ObjectKind,
    /// Owning table for measures and columns
    pub table: Option<String>,
    pub name: String,
    pub problems: Vec<String>,
    pub suggested_name: String,
}

impl fmt::Display for NamingIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{} {}[{}]", self.object_kind, table, self.name)?,
            None => write!(f, "{} {}", self.object_kind, self.name)?,
        }
        write!(
            f,
            ": {} (suggested: '{}')",
            self.problems.join("; "),
            self.suggested_name
        )
    }
}

/// Checker for naming rules
pub struct NamingChecker {
    abbreviations: HashMap<&'static str, &'static str>,
    allowed: Vec<String>,
}

impl NamingChecker {
    pub fn new() -> Self {
        Self::with_config(&AnalysisConfig::default())
    }

    pub fn with_config(config: &AnalysisConfig) -> Self {
        Self {
            abbreviations: ABBREVIATIONS.iter().copied().collect(),
            allowed: config
                .allowed_abbreviations
                .iter()
                .map(|a| a.to_lowercase())
                .collect(),
        }
    }

    /// Checks every table, measure and column of the model
    pub fn check_model(&self, model: &Model) -> Vec<NamingIssue> {
        let mut issues = Vec::new();
        for table in &model.tables {
            issues.extend(self.check_name(ObjectKind::Table, None, &table.name));
            for measure in &table.measures {
                issues.extend(self.check_name(ObjectKind::Measure, Some(&table.name), &measure.name));
            }
            for column in &table.columns {
                issues.extend(self.check_name(ObjectKind::Column, Some(&table.name), &column.name));
            }
        }
        issues
    }

    /// Checks one name; `None` when it already follows the style
    pub fn check_name(&self, kind: ObjectKind, table: Option<&str>, name: &str) -> Option<NamingIssue> {
        let mut problems = Vec::new();

        if name != name.trim() {
            problems.push("leading or trailing whitespace".to_string());
        }
        if name.contains("  ") {
            problems.push("repeated spaces".to_string());
        }
        let has_underscore = name.contains('_');
        if has_underscore && name.trim().contains(' ') {
            problems.push("mixed '_' and space delimiters".to_string());
        } else if has_underscore {
            problems.push("underscore delimiters".to_string());
        }
        let special: String = name.chars().filter(|c| is_special(*c)).collect();
        if !special.is_empty() {
            problems.push(format!("special characters '{}'", special));
        }

        let words = split_words(name);
        for word in &words {
            let lower = word.to_lowercase();
            if self.abbreviations.contains_key(lower.as_str()) && !self.allowed.contains(&lower) {
                problems.push(format!("abbreviation '{}'", word));
            }
        }
        if words.iter().enumerate().any(|(i, w)| needs_capital(i, w)) {
            problems.push("lower-case words".to_string());
        }

        if problems.is_empty() {
            return None;
        }

        let mut suggested_name = self.suggest(&words);
        if suggested_name.is_empty() {
            suggested_name = name.trim().to_string();
        }
        Some(NamingIssue {
            object_kind: kind,
            table: table.map(str::to_string),
            name: name.to_string(),
            problems,
            suggested_name,
        })
    }

    fn suggest(&self, words: &[String]) -> String {
        words
            .iter()
            .enumerate()
            .map(|(i, word)| {
                let lower = word.to_lowercase();
                match self.abbreviations.get(lower.as_str()) {
                    Some(full) if !self.allowed.contains(&lower) => full.to_string(),
                    _ if needs_capital(i, word) => capitalize(word),
                    _ => word.clone(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for NamingChecker {
    fn default() -> Self {
        Self::new()
    }
}

fn is_special(c: char) -> bool {
    !(c.is_alphanumeric() || c == ' ' || c == '_' || ALLOWED_PUNCTUATION.contains(&c))
}

/// Words split on spaces and underscores, special characters removed
fn split_words(name: &str) -> Vec<String> {
    name.split(|c: char| c == '_' || c.is_whitespace())
        .map(|w| w.chars().filter(|c| !is_special(*c)).collect::<String>())
        .filter(|w| !w.is_empty())
        .collect()
}

/// An all-lower-case word that is not a joining word (the first word always counts)
fn needs_capital(index: usize, word: &str) -> bool {
    let starts_lower = word.chars().next().is_some_and(|c| c.is_lowercase());
    let all_lower = !word.chars().any(|c| c.is_uppercase());
    starts_lower && all_lower && (index == 0 || !MINOR_WORDS.contains(&word))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_names_pass() {
        let checker = NamingChecker::new();
        for name in ["Total Sales", "CustomerKey", "Sales YTD", "Margin %", "Sales by Region", "ID"] {
            assert!(
                checker.check_name(ObjectKind::Measure, None, name).is_none(),
                "{name} should pass"
            );
        }
    }

    #[test]
    fn test_snake_case_and_abbreviation() {
        let checker = NamingChecker::new();
        let issue = checker
            .check_name(ObjectKind::Measure, Some("Sales"), "total_sales_amt")
            .expect("issue");
        assert_eq!(issue.suggested_name, "Total Sales Amount");
        assert_eq!(issue.problems.len(), 3);
    }

    #[test]
    fn test_mixed_delimiters() {
        let issue = NamingChecker::new()
            .check_name(ObjectKind::Column, Some("Sales"), "Order_Date Key")
            .expect("issue");
        assert_eq!(issue.suggested_name, "Order Date Key");
        assert!(issue.problems[0].contains("mixed"));
    }

    #[test]
    fn test_special_characters_removed() {
        let issue = NamingChecker::new()
            .check_name(ObjectKind::Table, None, "Sales$!")
            .expect("issue");
        assert_eq!(issue.suggested_name, "Sales");
    }

    #[test]
    fn test_allowed_abbreviation_configurable() {
        let mut config = AnalysisConfig::default();
        config.allowed_abbreviations.push("Qty".to_string());
        let checker = NamingChecker::with_config(&config);
        assert!(checker.check_name(ObjectKind::Column, None, "Order Qty").is_none());
        assert!(NamingChecker::new().check_name(ObjectKind::Column, None, "Order Qty").is_some());
    }

    #[test]
    fn test_one_issue_per_object() {
        let mut table = crate::model::Table::new("fact_sales");
        table.measures.push(crate::model::Measure::new("avg price", "1"));
        table.measures.push(crate::model::Measure::new("Total Sales", "1"));
        let model = Model::new("M", vec![table], Vec::new());
        let issues = NamingChecker::new().check_model(&model);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].suggested_name, "Fact Sales");
        assert_eq!(issues[1].suggested_name, "Average Price");
    }
}
