/*!
# Recommendations Engine

Generates actionable recommendations from model quality metrics.
*/

use super::model_quality::ModelQuality;
use crate::config::AnalysisConfig;

const MAX_RECOMMENDATIONS: usize = 5;
const WARNING_LIMIT: usize = 5;

/// Engine for generating recommendations
pub struct RecommendationsEngine {
    coverage_threshold: f64,
    complexity_threshold: f64,
}

impl RecommendationsEngine {
    pub fn new() -> Self {
        Self::with_config(&AnalysisConfig::default())
    }

    pub fn with_config(config: &AnalysisConfig) -> Self {
        Self {
            coverage_threshold: config.coverage_threshold,
            complexity_threshold: config.moderate_threshold as f64,
        }
    }

    /// Generate recommendations for every sub-metric below its threshold,
    /// most severe first
    pub fn generate_recommendations(&self, quality: &ModelQuality) -> Vec<String> {
        let mut recommendations = Vec::new();

        if quality.cycle_count > 0 {
            recommendations.push(format!(
                "Break {} circular measure dependencies; they fail at query time",
                quality.cycle_count
            ));
        }

        if quality.error_count > 0 {
            recommendations.push(format!(
                "Fix {} error-level DAX issues, starting with divisions that should use DIVIDE",
                quality.error_count
            ));
        }

        if quality.warning_count > WARNING_LIMIT {
            recommendations.push(format!(
                "Review {} DAX warnings (nested conditions, IFERROR, FILTER over ALL)",
                quality.warning_count
            ));
        }

        if quality.relationship_completeness < 1.0 {
            let missing = quality.total_relationships
                - (quality.relationship_completeness * quality.total_relationships as f64).round()
                    as usize;
            recommendations.push(format!(
                "Declare explicit cardinality on {} relationships",
                missing
            ));
        }

        if quality.average_complexity >= self.complexity_threshold {
            recommendations.push(format!(
                "Simplify complex measures (average complexity {:.1}) with variables and base measures",
                quality.average_complexity
            ));
        }

        if quality.documentation_coverage < self.coverage_threshold {
            recommendations.push(format!(
                "Add descriptions to measures: only {:.0}% are documented",
                quality.documentation_coverage * 100.0
            ));
        }

        if quality.display_folder_coverage < self.coverage_threshold {
            recommendations.push(format!(
                "Organize measures into display folders: {:.0}% are assigned",
                quality.display_folder_coverage * 100.0
            ));
        }

        if quality.naming_issue_count > 0 {
            recommendations.push(format!(
                "Rename {} objects to follow naming conventions",
                quality.naming_issue_count
            ));
        }

        if recommendations.is_empty() {
            recommendations.push("Model quality looks good! Keep documenting new measures".to_string());
            recommendations
                .push("Keep monitoring quality metrics as the model grows".to_string());
        }

        if recommendations.len() > MAX_RECOMMENDATIONS {
            recommendations.truncate(MAX_RECOMMENDATIONS);
            recommendations.push(
                "Additional recommendations available - focus on top priorities first".to_string(),
            );
        }

        recommendations
    }
}

impl Default for RecommendationsEngine {
    fn default() -> Self {
        Self::new()
    }
}
