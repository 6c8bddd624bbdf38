/*!
# Complexity Analysis for DAX Formulas

Scores a formula from 0 to 100:

| Component | Weight |
|---|---|
| parenthesis nesting depth | 8 per level |
| recognized function calls | 3 each |
| distinct tables referenced | 5 each |
| distinct measures referenced | 4 each |
| row iterator present (`SUMX`, `FILTER`, ...) | 15 |
| filter context modified (`CALCULATE`, `ALL`, ...) | 10 |

The sum is capped at 100. Every component only adds, so the score never
decreases when a formula grows.
*/

use super::keywords::{
    function_calls, matching_functions, DAX_FUNCTIONS, FILTER_MODIFIER_FUNCTIONS,
    ITERATOR_FUNCTIONS,
};
use crate::config::AnalysisConfig;
use crate::dependencies::{scan_references, strip_comments_and_strings, MeasureDependency};
use serde::{Deserialize, Serialize};
use std::fmt;

const NESTING_WEIGHT: u32 = 8;
const FUNCTION_WEIGHT: u32 = 3;
const TABLE_WEIGHT: u32 = 5;
const MEASURE_WEIGHT: u32 = 4;
const ITERATOR_WEIGHT: u32 = 15;
const FILTER_MODIFIER_WEIGHT: u32 = 10;
const MAX_SCORE: u32 = 100;

/// Qualitative band of a complexity score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityLevel {
    Simple,
    Moderate,
    Complex,
}

impl fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComplexityLevel::Simple => write!(f, "simple"),
            ComplexityLevel::Moderate => write!(f, "moderate"),
            ComplexityLevel::Complex => write!(f, "complex"),
        }
    }
}

/// Complexity of one formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaxComplexity {
    pub score: u32,
    pub nesting_depth: usize,
    pub function_count: usize,
    pub table_references: usize,
    pub measure_references: usize,
    pub has_iterators: bool,
    pub has_filter_modification: bool,
    pub level: ComplexityLevel,
    pub recommendation: String,
}

/// Analyzer for formula complexity
pub struct ComplexityAnalyzer {
    moderate_threshold: u32,
    complex_threshold: u32,
}

impl ComplexityAnalyzer {
    pub fn new() -> Self {
        Self::with_config(&AnalysisConfig::default())
    }

    pub fn with_config(config: &AnalysisConfig) -> Self {
        Self {
            moderate_threshold: config.moderate_threshold,
            complex_threshold: config.complex_threshold,
        }
    }

    /// Analyzes a formula. Table and measure counts come from the dependency
    /// node when given; otherwise unqualified brackets count as measures.
    pub fn analyze(&self, expression: &str, dependency: Option<&MeasureDependency>) -> DaxComplexity {
        let code = strip_comments_and_strings(expression);
        let calls = function_calls(&code);

        let (table_references, measure_references) = match dependency {
            Some(dep) => (dep.tables.len(), dep.measures.len()),
            None => {
                let refs = scan_references(expression);
                (refs.tables().len(), refs.brackets.len())
            }
        };

        let nesting_depth = paren_depth(&code);
        let function_count = calls
            .iter()
            .filter(|c| DAX_FUNCTIONS.contains(c.as_str()))
            .count();
        let has_iterators = !matching_functions(&calls, &ITERATOR_FUNCTIONS).is_empty();
        let has_filter_modification =
            !matching_functions(&calls, &FILTER_MODIFIER_FUNCTIONS).is_empty();

        let raw = NESTING_WEIGHT * nesting_depth as u32
            + FUNCTION_WEIGHT * function_count as u32
            + TABLE_WEIGHT * table_references as u32
            + MEASURE_WEIGHT * measure_references as u32
            + if has_iterators { ITERATOR_WEIGHT } else { 0 }
            + if has_filter_modification {
                FILTER_MODIFIER_WEIGHT
            } else {
                0
            };
        let score = raw.min(MAX_SCORE);
        let level = self.level_for(score);

        DaxComplexity {
            score,
            nesting_depth,
            function_count,
            table_references,
            measure_references,
            has_iterators,
            has_filter_modification,
            level,
            recommendation: recommendation_for(level).to_string(),
        }
    }

    pub fn level_for(&self, score: u32) -> ComplexityLevel {
        if score >= self.complex_threshold {
            ComplexityLevel::Complex
        } else if score >= self.moderate_threshold {
            ComplexityLevel::Moderate
        } else {
            ComplexityLevel::Simple
        }
    }
}

impl Default for ComplexityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn recommendation_for(level: ComplexityLevel) -> &'static str {
    match level {
        ComplexityLevel::Simple => "Formula is simple and easy to maintain",
        ComplexityLevel::Moderate => {
            "Consider using variables (VAR) to name intermediate results"
        }
        ComplexityLevel::Complex => {
            "Split the formula into smaller base measures and reuse them"
        }
    }
}

/// Maximum parenthesis nesting, ignoring parentheses inside `[...]` and `'...'`.
/// Expects text with strings and comments already removed.
pub fn paren_depth(code: &str) -> usize {
    scan_parens(code, |_| false).0
}

/// Maximum nesting of conditional calls (`IF`, `SWITCH`) inside each other
pub fn conditional_depth(code: &str) -> usize {
    scan_parens(code, |name| {
        matches!(name.to_ascii_uppercase().as_str(), "IF" | "SWITCH" | "IF.EAGER")
    })
    .1
}

/// Returns (max paren depth, max depth of parens opened by `is_marked` calls)
fn scan_parens(code: &str, is_marked: impl Fn(&str) -> bool) -> (usize, usize) {
    let mut stack: Vec<bool> = Vec::new();
    let mut marked = 0usize;
    let mut max_depth = 0usize;
    let mut max_marked = 0usize;
    let mut word = String::new();
    let mut pending_word = String::new();
    let mut in_bracket = false;
    let mut in_quote = false;

    for c in code.chars() {
        if in_bracket {
            in_bracket = c != ']';
            continue;
        }
        if in_quote {
            in_quote = c != '\'';
            continue;
        }
        match c {
            '[' => in_bracket = true,
            '\'' => in_quote = true,
            '(' => {
                let name = if word.is_empty() { &pending_word } else { &word };
                let is_call_marked = !name.is_empty() && is_marked(name);
                stack.push(is_call_marked);
                if is_call_marked {
                    marked += 1;
                }
                max_depth = max_depth.max(stack.len());
                max_marked = max_marked.max(marked);
            }
            ')' => {
                if stack.pop() == Some(true) {
                    marked -= 1;
                }
            }
            _ => {}
        }

        if c.is_alphanumeric() || c == '_' || c == '.' {
            word.push(c);
            pending_word.clear();
        } else if c.is_whitespace() {
            if !word.is_empty() {
                pending_word = std::mem::take(&mut word);
            }
        } else {
            word.clear();
            pending_word.clear();
        }
    }
    (max_depth, max_marked)
}
