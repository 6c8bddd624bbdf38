/*!
# Model Quality Score

Aggregates per-measure results and structural checks into one 0-100 score.

| Component | Weight | Sub-score |
|---|---|---|
| issues | 0.35 | 100 - 10 per error - 3 per warning |
| documentation | 0.15 | share of measures with a description |
| display folders | 0.10 | share of measures in a display folder |
| relationships | 0.15 | share of relationships with both cardinalities |
| complexity | 0.15 | 100 - average complexity score |
| cycles | 0.10 | 100 - 25 per circular dependency |

Coverage of an empty set counts as complete. The result is rounded to one decimal.
*/

use super::complexity::DaxComplexity;
use super::issues::{DaxIssue, IssueSeverity};
use crate::model::Model;
use serde::{Deserialize, Serialize};

const ISSUES_WEIGHT: f64 = 0.35;
const DOCUMENTATION_WEIGHT: f64 = 0.15;
const FOLDER_WEIGHT: f64 = 0.10;
const RELATIONSHIP_WEIGHT: f64 = 0.15;
const COMPLEXITY_WEIGHT: f64 = 0.15;
const CYCLE_WEIGHT: f64 = 0.10;

const ERROR_PENALTY: f64 = 10.0;
const WARNING_PENALTY: f64 = 3.0;
const CYCLE_PENALTY: f64 = 25.0;

/// Quality summary of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelQuality {
    /// Overall score (0-100)
    pub overall_score: f64,
    pub issue_score: f64,
    /// 0.0-1.0
    pub documentation_coverage: f64,
    /// 0.0-1.0
    pub display_folder_coverage: f64,
    /// 0.0-1.0
    pub relationship_completeness: f64,
    pub average_complexity: f64,
    pub total_tables: usize,
    pub total_measures: usize,
    pub total_columns: usize,
    pub total_relationships: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    pub cycle_count: usize,
    pub unused_measure_count: usize,
    pub naming_issue_count: usize,
    pub recommendations: Vec<String>,
}

/// Inputs of the score computed elsewhere
pub struct QualityInputs<'a> {
    pub model: &'a Model,
    pub issues: &'a [DaxIssue],
    pub complexities: &'a [DaxComplexity],
    pub cycle_count: usize,
    pub unused_measure_count: usize,
    pub naming_issue_count: usize,
}

/// Computes every metric except the recommendations (left empty)
pub fn calculate_model_quality(inputs: &QualityInputs<'_>) -> ModelQuality {
    let model = inputs.model;
    let total_measures = model.measure_count();

    let count = |severity: IssueSeverity| inputs.issues.iter().filter(|i| i.severity == severity).count();
    let error_count = count(IssueSeverity::Error);
    let warning_count = count(IssueSeverity::Warning);
    let info_count = count(IssueSeverity::Info);

    let documented = model.measures().filter(|(_, m)| m.has_description()).count();
    let foldered = model.measures().filter(|(_, m)| m.has_display_folder()).count();
    let with_cardinality = model
        .relationships
        .iter()
        .filter(|r| r.has_explicit_cardinality())
        .count();

    let documentation_coverage = ratio(documented, total_measures);
    let display_folder_coverage = ratio(foldered, total_measures);
    let relationship_completeness = ratio(with_cardinality, model.relationships.len());

    let average_complexity = if inputs.complexities.is_empty() {
        0.0
    } else {
        inputs.complexities.iter().map(|c| c.score as f64).sum::<f64>()
            / inputs.complexities.len() as f64
    };

    let issue_score = (100.0
        - ERROR_PENALTY * error_count as f64
        - WARNING_PENALTY * warning_count as f64)
        .max(0.0);
    let cycle_score = (100.0 - CYCLE_PENALTY * inputs.cycle_count as f64).max(0.0);

    let overall = issue_score * ISSUES_WEIGHT
        + documentation_coverage * 100.0 * DOCUMENTATION_WEIGHT
        + display_folder_coverage * 100.0 * FOLDER_WEIGHT
        + relationship_completeness * 100.0 * RELATIONSHIP_WEIGHT
        + (100.0 - average_complexity) * COMPLEXITY_WEIGHT
        + cycle_score * CYCLE_WEIGHT;

    ModelQuality {
        overall_score: round1(overall.clamp(0.0, 100.0)),
        issue_score,
        documentation_coverage,
        display_folder_coverage,
        relationship_completeness,
        average_complexity: round1(average_complexity),
        total_tables: model.tables.len(),
        total_measures,
        total_columns: model.column_count(),
        total_relationships: model.relationships.len(),
        error_count,
        warning_count,
        info_count,
        cycle_count: inputs.cycle_count,
        unused_measure_count: inputs.unused_measure_count,
        naming_issue_count: inputs.naming_issue_count,
        recommendations: Vec::new(),
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        part as f64 / total as f64
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cardinality, Relationship};

    #[test]
    fn test_empty_model_is_perfect() {
        let model = Model::new("Empty", Vec::new(), Vec::new());
        let quality = calculate_model_quality(&QualityInputs {
            model: &model,
            issues: &[],
            complexities: &[],
            cycle_count: 0,
            unused_measure_count: 0,
            naming_issue_count: 0,
        });
        assert_eq!(quality.overall_score, 100.0);
        assert_eq!(quality.documentation_coverage, 1.0);
    }

    #[test]
    fn test_incomplete_relationships_and_cycles_lower_score() {
        let relationships = vec![
            Relationship {
                from_table: "Sales".into(),
                to_table: "Date".into(),
                from_cardinality: Some(Cardinality::Many),
                to_cardinality: Some(Cardinality::One),
                ..Relationship::default()
            },
            Relationship {
                from_table: "Sales".into(),
                to_table: "Product".into(),
                ..Relationship::default()
            },
        ];
        let model = Model::new("M", Vec::new(), relationships);
        let quality = calculate_model_quality(&QualityInputs {
            model: &model,
            issues: &[],
            complexities: &[],
            cycle_count: 1,
            unused_measure_count: 0,
            naming_issue_count: 0,
        });
        assert_eq!(quality.relationship_completeness, 0.5);
        // 35 + 15 + 10 + 7.5 + 15 + 7.5
        assert_eq!(quality.overall_score, 90.0);
    }
}
