/*!
# DAX Quality Metrics System

Per-measure and per-model analysis of a semantic model: complexity scores,
pattern classification, rule-based quality issues, naming conventions,
circular dependencies and an aggregate 0-100 quality score with recommendations.

Every result is derived from the current [`Model`] and [`DependencyGraph`];
nothing is cached between calls.
*/

pub mod complexity;
pub mod issues;
pub mod keywords;
pub mod model_quality;
pub mod naming;
pub mod patterns;
pub mod recommendations;

pub use complexity::{ComplexityAnalyzer, ComplexityLevel, DaxComplexity};
pub use issues::{DaxIssue, IssueCategory, IssueDetector, IssueSeverity, KEYWORD_RULES};
pub use model_quality::{calculate_model_quality, ModelQuality, QualityInputs};
pub use naming::{NamingChecker, NamingIssue, ObjectKind};
pub use patterns::{DaxPattern, PatternDetector, PatternType};
pub use recommendations::RecommendationsEngine;

use crate::config::AnalysisConfig;
use crate::core::ModelResult;
use crate::dependencies::{DependencyCycle, DependencyGraph, DependencyStatistics};
use crate::model::{Measure, Model};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Complete analysis of one measure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureAnalysis {
    pub measure: String,
    pub table: String,
    pub expression: String,
    pub complexity: DaxComplexity,
    pub pattern: DaxPattern,
    pub issues: Vec<DaxIssue>,
}

/// Complete analysis of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    pub model_name: String,
    pub quality: ModelQuality,
    pub measures: Vec<MeasureAnalysis>,
    pub naming_issues: Vec<NamingIssue>,
    pub cycles: Vec<DependencyCycle>,
    pub dependency_statistics: DependencyStatistics,
}

/// Facade over all analyzers
pub struct ModelAnalyzer {
    complexity_analyzer: ComplexityAnalyzer,
    pattern_detector: PatternDetector,
    issue_detector: IssueDetector,
    naming_checker: NamingChecker,
    recommendations_engine: RecommendationsEngine,
}

impl ModelAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            complexity_analyzer: ComplexityAnalyzer::with_config(config),
            pattern_detector: PatternDetector::new(),
            issue_detector: IssueDetector::with_config(config),
            naming_checker: NamingChecker::with_config(config),
            recommendations_engine: RecommendationsEngine::with_config(config),
        }
    }

    /// Complexity of a measure; `MeasureNotFound` when the name is unknown
    pub fn complexity(
        &self,
        model: &Model,
        graph: &DependencyGraph,
        measure: &str,
    ) -> ModelResult<DaxComplexity> {
        let (_, found) = model.measure(measure)?;
        Ok(self
            .complexity_analyzer
            .analyze(&found.expression, graph.get(&found.name)))
    }

    pub fn pattern(&self, model: &Model, measure: &str) -> ModelResult<DaxPattern> {
        let (_, found) = model.measure(measure)?;
        Ok(self.pattern_detector.detect(&found.expression))
    }

    pub fn issues(
        &self,
        model: &Model,
        graph: &DependencyGraph,
        measure: &str,
    ) -> ModelResult<Vec<DaxIssue>> {
        Ok(self.analyze_measure(model, graph, measure)?.issues)
    }

    /// Complexity, pattern and issues of one measure
    pub fn analyze_measure(
        &self,
        model: &Model,
        graph: &DependencyGraph,
        measure: &str,
    ) -> ModelResult<MeasureAnalysis> {
        let (table, found) = model.measure(measure)?;
        Ok(self.measure_analysis(&table.name, found, graph))
    }

    fn measure_analysis(
        &self,
        table: &str,
        measure: &Measure,
        graph: &DependencyGraph,
    ) -> MeasureAnalysis {
        let dependency = graph.get(&measure.name);
        let complexity = self
            .complexity_analyzer
            .analyze(&measure.expression, dependency);
        let pattern = self.pattern_detector.detect(&measure.expression);
        let issues = self
            .issue_detector
            .detect(measure, dependency, Some(&complexity));

        MeasureAnalysis {
            measure: measure.name.clone(),
            table: table.to_string(),
            expression: measure.expression.clone(),
            complexity,
            pattern,
            issues,
        }
    }

    /// Every measure in model order
    pub fn analyze_measures(&self, model: &Model, graph: &DependencyGraph) -> Vec<MeasureAnalysis> {
        model
            .measures()
            .map(|(table, measure)| self.measure_analysis(&table.name, measure, graph))
            .collect()
    }

    pub fn naming_issues(&self, model: &Model) -> Vec<NamingIssue> {
        self.naming_checker.check_model(model)
    }

    pub fn circular_dependencies(&self, graph: &DependencyGraph) -> Vec<DependencyCycle> {
        graph.find_cycles()
    }

    /// Aggregate quality score with recommendations
    pub fn model_quality(&self, model: &Model, graph: &DependencyGraph) -> ModelQuality {
        let measures = self.analyze_measures(model, graph);
        let naming_issue_count = self.naming_issues(model).len();
        let cycle_count = graph.find_cycles().len();
        self.quality_of(model, graph, &measures, cycle_count, naming_issue_count)
    }

    fn quality_of(
        &self,
        model: &Model,
        graph: &DependencyGraph,
        measures: &[MeasureAnalysis],
        cycle_count: usize,
        naming_issue_count: usize,
    ) -> ModelQuality {
        let issues: Vec<DaxIssue> = measures.iter().flat_map(|m| m.issues.clone()).collect();
        let complexities: Vec<DaxComplexity> =
            measures.iter().map(|m| m.complexity.clone()).collect();

        let mut quality = calculate_model_quality(&QualityInputs {
            model,
            issues: &issues,
            complexities: &complexities,
            cycle_count,
            unused_measure_count: graph.unused_measures().len(),
            naming_issue_count,
        });
        quality.recommendations = self.recommendations_engine.generate_recommendations(&quality);
        quality
    }

    /// Runs every analysis over the model. Builds the dependency graph once.
    pub fn analyze_model(&self, model: &Model) -> ModelReport {
        let graph = DependencyGraph::build(model);
        let measures = self.analyze_measures(model, &graph);
        let naming_issues = self.naming_issues(model);
        let cycles = graph.find_cycles();
        let quality = self.quality_of(model, &graph, &measures, cycles.len(), naming_issues.len());

        info!(
            "Analyzed model '{}': {} measures, score {:.1}",
            model.name,
            measures.len(),
            quality.overall_score
        );

        ModelReport {
            model_name: model.name.clone(),
            quality,
            measures,
            naming_issues,
            cycles,
            dependency_statistics: graph.statistics(),
        }
    }
}

impl Default for ModelAnalyzer {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}
