/*!
# DAX Quality Issues

Rule-based checks of a single measure. Rules are independent: every rule
that applies produces its own issue.

| Code | Severity | Check |
|---|---|---|
| DAX001 | error | `/` operator and no `DIVIDE` anywhere in the formula |
| DAX002 | info | no description |
| DAX003 | info | no display folder |
| DAX004 | warning | `IF`/`SWITCH` nested deeper than the configured limit |
| DAX005 | warning | no references and no literal constant |
| DAX006 | warning | `IFERROR` |
| DAX007 | info | `EARLIER` |
| DAX008 | warning | `FILTER(ALL(...))` |
| DAX009 | error | empty formula |
| DAX010 | info | complexity in the complex band |

DAX006-DAX008 are keyword rules from [`KEYWORD_RULES`].
*/

use super::complexity::{conditional_depth, ComplexityLevel, DaxComplexity};
use super::keywords::{function_calls, RATIO_FUNCTIONS};
use crate::config::AnalysisConfig;
use crate::dependencies::{
    has_literal, mask_bracket_names, strip_comments_and_strings, MeasureDependency,
};
use crate::model::Measure;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Issue severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueSeverity::Error => write!(f, "error"),
            IssueSeverity::Warning => write!(f, "warning"),
            IssueSeverity::Info => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    Correctness,
    Performance,
    Maintainability,
    Documentation,
}

/// A detected problem in one measure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaxIssue {
    pub code: String,
    pub severity: IssueSeverity,
    pub category: IssueCategory,
    pub measure: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl fmt::Display for DaxIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}: {}", self.severity, self.code, self.measure, self.message)
    }
}

/// Rule triggered by a keyword sequence in the formula
pub struct KeywordRule {
    pub code: &'static str,
    /// Upper case, without whitespace
    pub pattern: &'static str,
    pub severity: IssueSeverity,
    pub category: IssueCategory,
    pub message: &'static str,
    pub suggestion: &'static str,
}

pub static KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        code: "DAX006",
        pattern: "IFERROR(",
        severity: IssueSeverity::Warning,
        category: IssueCategory::Performance,
        message: "IFERROR forces row-by-row error handling",
        suggestion: "Prevent the error instead, e.g. with DIVIDE or an explicit IF test",
    },
    KeywordRule {
        code: "DAX007",
        pattern: "EARLIER(",
        severity: IssueSeverity::Info,
        category: IssueCategory::Maintainability,
        message: "EARLIER is hard to read",
        suggestion: "Capture the outer row value in a variable (VAR)",
    },
    KeywordRule {
        code: "DAX008",
        pattern: "FILTER(ALL(",
        severity: IssueSeverity::Warning,
        category: IssueCategory::Performance,
        message: "FILTER over ALL of a table iterates every row",
        suggestion: "Use a column filter in CALCULATE or REMOVEFILTERS instead",
    },
];

/// Detector running every rule against a measure
pub struct IssueDetector {
    max_if_nesting: usize,
}

impl IssueDetector {
    pub fn new() -> Self {
        Self::with_config(&AnalysisConfig::default())
    }

    pub fn with_config(config: &AnalysisConfig) -> Self {
        Self {
            max_if_nesting: config.max_if_nesting,
        }
    }

    /// Runs all rules. `dependency` and `complexity` enable the rules that
    /// need them; without a dependency node the "no references" rule is skipped.
    pub fn detect(
        &self,
        measure: &Measure,
        dependency: Option<&MeasureDependency>,
        complexity: Option<&DaxComplexity>,
    ) -> Vec<DaxIssue> {
        let mut issues = Vec::new();
        let expression = measure.expression.trim();
        let code = strip_comments_and_strings(expression);
        let issue = |code: &str, severity, category, message: String, suggestion: Option<&str>| {
            DaxIssue {
                code: code.to_string(),
                severity,
                category,
                measure: measure.name.clone(),
                message,
                suggestion: suggestion.map(str::to_string),
            }
        };

        let masked = mask_bracket_names(&code);
        let uses_divide = function_calls(&code)
            .iter()
            .any(|call| RATIO_FUNCTIONS.contains(call.as_str()));

        if has_bare_division(&masked) && !uses_divide {
            issues.push(issue(
                "DAX001",
                IssueSeverity::Error,
                IssueCategory::Correctness,
                "Division operator '/' fails on a zero denominator".to_string(),
                Some("Use DIVIDE(numerator, denominator) for safe division"),
            ));
        }

        if !measure.has_description() {
            issues.push(issue(
                "DAX002",
                IssueSeverity::Info,
                IssueCategory::Documentation,
                "Measure has no description".to_string(),
                Some("Add a description explaining what the measure calculates"),
            ));
        }

        if !measure.has_display_folder() {
            issues.push(issue(
                "DAX003",
                IssueSeverity::Info,
                IssueCategory::Documentation,
                "Measure is not assigned to a display folder".to_string(),
                Some("Group related measures with displayFolder"),
            ));
        }

        let depth = conditional_depth(&code);
        if depth > self.max_if_nesting {
            issues.push(issue(
                "DAX004",
                IssueSeverity::Warning,
                IssueCategory::Maintainability,
                format!(
                    "Conditional nesting depth {} exceeds {}",
                    depth, self.max_if_nesting
                ),
                Some("Replace nested IF with SWITCH(TRUE(), ...)"),
            ));
        }

        if let Some(dep) = dependency {
            if !expression.is_empty() && dep.has_no_dependencies() && !has_literal(expression) {
                issues.push(issue(
                    "DAX005",
                    IssueSeverity::Warning,
                    IssueCategory::Correctness,
                    "Formula references no measure, column or table".to_string(),
                    Some("Check for a broken or misspelled reference"),
                ));
            }
        }

        let normalized: String = masked
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();
        for rule in KEYWORD_RULES {
            if normalized.contains(rule.pattern) {
                issues.push(issue(
                    rule.code,
                    rule.severity,
                    rule.category,
                    rule.message.to_string(),
                    Some(rule.suggestion),
                ));
            }
        }

        if expression.is_empty() {
            issues.push(issue(
                "DAX009",
                IssueSeverity::Error,
                IssueCategory::Correctness,
                "Measure has an empty formula".to_string(),
                None,
            ));
        }

        if let Some(complexity) = complexity {
            if complexity.level == ComplexityLevel::Complex {
                issues.push(issue(
                    "DAX010",
                    IssueSeverity::Info,
                    IssueCategory::Maintainability,
                    format!("Complexity score {} is in the complex band", complexity.score),
                    Some(complexity.recommendation.as_str()),
                ));
            }
        }

        issues
    }
}

impl Default for IssueDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// `/` outside quoted names. Expects stripped text with bracketed names masked.
fn has_bare_division(code: &str) -> bool {
    let mut in_quote = false;
    for c in code.chars() {
        match c {
            '\'' => in_quote = !in_quote,
            '/' if !in_quote => return true,
            _ => {}
        }
    }
    false
}
