/*!
# Pattern Detection

Classifies a formula by the function families it calls. The rule table is
ordered by precedence: the first category with at least one matching function
wins, so a formula that both aggregates and divides with `DIVIDE` is a ratio.
*/

use super::keywords::{
    function_calls, matching_functions, AGGREGATION_FUNCTIONS, CONDITIONAL_FUNCTIONS,
    RATIO_FUNCTIONS, TEXT_FUNCTIONS, TIME_INTELLIGENCE_FUNCTIONS,
};
use crate::dependencies::strip_comments_and_strings;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

const BASE_CONFIDENCE: f64 = 0.4;
const CONFIDENCE_PER_MATCH: f64 = 0.2;

/// Formula category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    TimeIntelligence,
    Ratio,
    Conditional,
    Aggregation,
    Text,
    Unknown,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::TimeIntelligence => "time_intelligence",
            PatternType::Ratio => "ratio",
            PatternType::Conditional => "conditional",
            PatternType::Aggregation => "aggregation",
            PatternType::Text => "text",
            PatternType::Unknown => "unknown",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            PatternType::TimeIntelligence => "Time intelligence calculation over a date table",
            PatternType::Ratio => "Ratio computed with safe division",
            PatternType::Conditional => "Conditional logic selecting between results",
            PatternType::Aggregation => "Aggregation of column values",
            PatternType::Text => "Text manipulation or formatting",
            PatternType::Unknown => "No recognized pattern",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaxPattern {
    pub pattern_type: PatternType,
    /// 0.0 for `unknown`, otherwise grows with the number of matched functions
    pub confidence: f64,
    pub matched_keywords: Vec<String>,
    pub description: String,
}

/// Category rules in precedence order
pub static PATTERN_RULES: Lazy<Vec<(PatternType, &'static HashSet<&'static str>)>> =
    Lazy::new(|| {
        vec![
            (PatternType::TimeIntelligence, &*TIME_INTELLIGENCE_FUNCTIONS),
            (PatternType::Ratio, &*RATIO_FUNCTIONS),
            (PatternType::Conditional, &*CONDITIONAL_FUNCTIONS),
            (PatternType::Aggregation, &*AGGREGATION_FUNCTIONS),
            (PatternType::Text, &*TEXT_FUNCTIONS),
        ]
    });

/// Detector of formula patterns
pub struct PatternDetector {}

impl PatternDetector {
    pub fn new() -> Self {
        Self {}
    }

    pub fn detect(&self, expression: &str) -> DaxPattern {
        let calls = function_calls(&strip_comments_and_strings(expression));

        for (pattern_type, functions) in PATTERN_RULES.iter() {
            let matched = matching_functions(&calls, functions);
            if !matched.is_empty() {
                let confidence =
                    (BASE_CONFIDENCE + CONFIDENCE_PER_MATCH * matched.len() as f64).min(1.0);
                return DaxPattern {
                    pattern_type: *pattern_type,
                    confidence,
                    matched_keywords: matched,
                    description: pattern_type.description().to_string(),
                };
            }
        }

        DaxPattern {
            pattern_type: PatternType::Unknown,
            confidence: 0.0,
            matched_keywords: Vec::new(),
            description: PatternType::Unknown.description().to_string(),
        }
    }
}

impl Default for PatternDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divide_is_ratio() {
        let pattern = PatternDetector::new().detect("DIVIDE([Profit],[Sales])");
        assert_eq!(pattern.pattern_type, PatternType::Ratio);
        assert!(pattern.confidence > 0.0);
        assert_eq!(pattern.matched_keywords, vec!["DIVIDE"]);
    }

    #[test]
    fn test_time_intelligence_wins_precedence() {
        let detector = PatternDetector::new();
        let pattern = detector.detect("CALCULATE(SUM(Sales[Amount]), SAMEPERIODLASTYEAR('Date'[Date]))");
        assert_eq!(pattern.pattern_type, PatternType::TimeIntelligence);
        assert_eq!(pattern.pattern_type.to_string(), "time_intelligence");
    }

    #[test]
    fn test_conditional_before_aggregation() {
        let pattern = PatternDetector::new().detect("IF(SUM(Sales[Qty]) > 0, 1, 0)");
        assert_eq!(pattern.pattern_type, PatternType::Conditional);
    }

    #[test]
    fn test_confidence_grows_with_matches() {
        let detector = PatternDetector::new();
        let one = detector.detect("SUM(Sales[A])");
        let three = detector.detect("SUM(Sales[A]) + COUNT(Sales[B]) + MAX(Sales[C])");
        assert_eq!(one.pattern_type, PatternType::Aggregation);
        assert!(three.confidence > one.confidence);
        assert!(three.confidence <= 1.0);
    }

    #[test]
    fn test_unknown() {
        let pattern = PatternDetector::new().detect("[Sales] * 1.1");
        assert_eq!(pattern.pattern_type, PatternType::Unknown);
        assert_eq!(pattern.confidence, 0.0);
    }

    #[test]
    fn test_apostrophe_in_measure_name() {
        let pattern = PatternDetector::new().detect("[Customer's Count] + SUM(Sales[Amount])");
        assert_eq!(pattern.pattern_type, PatternType::Aggregation);
        assert_eq!(pattern.matched_keywords, vec!["SUM"]);
    }

    #[test]
    fn test_keywords_in_comments_are_ignored() {
        let pattern = PatternDetector::new().detect("// DIVIDE(a, b)\nUPPER([Name])");
        assert_eq!(pattern.pattern_type, PatternType::Text);
    }
}
