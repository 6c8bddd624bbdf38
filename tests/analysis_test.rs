/*!
# Analysis Integration Tests

Complexity, patterns, issues, naming and the model quality score,
computed through the `ModelAnalyzer` facade.
*/

use pbi_model_analyzer::config::AnalysisConfig;
use pbi_model_analyzer::dependencies::DependencyGraph;
use pbi_model_analyzer::metrics::{
    ComplexityLevel, IssueSeverity, ModelAnalyzer, ObjectKind, PatternType,
};
use pbi_model_analyzer::model::Model;
use pbi_model_analyzer::parser::parse_table;
use pretty_assertions::assert_eq;

const SALES: &str = "\
table Sales
\t/// Sum of the sales amount
\tmeasure 'Total Sales' = SUM(Sales[Amount])
\t\tdisplayFolder: Base
\tmeasure Margin = [Profit]/[Total Sales]
\tmeasure Profit = [Total Sales] - SUM(Sales[Cost])
\t\tdisplayFolder: Base
\tmeasure 'Profit Ratio' = DIVIDE([Profit],[Total Sales])
\tmeasure 'Sales PY' = SAMEPERIODLASTYEAR('Date'[Date])
\tcolumn Amount
\t\tdataType: decimal
\tcolumn Cost
\t\tdataType: decimal
";

fn sales_model(text: &str) -> Model {
    Model::new("Sales Model", vec![parse_table(text).expect("table")], Vec::new())
}

#[test]
fn test_pattern_scenarios() {
    let model = sales_model(SALES);
    let analyzer = ModelAnalyzer::default();

    let ratio = analyzer.pattern(&model, "Profit Ratio").unwrap();
    assert_eq!(ratio.pattern_type, PatternType::Ratio);
    assert!(ratio.confidence > 0.0);

    let time = analyzer.pattern(&model, "Sales PY").unwrap();
    assert_eq!(time.pattern_type, PatternType::TimeIntelligence);
    assert_eq!(time.pattern_type.to_string(), "time_intelligence");
}

#[test]
fn test_bare_division_is_an_error() {
    let model = sales_model(SALES);
    let graph = DependencyGraph::build(&model);
    let issues = ModelAnalyzer::default()
        .issues(&model, &graph, "Margin")
        .unwrap();

    assert!(issues.iter().any(|i| i.severity == IssueSeverity::Error));
    assert!(issues.iter().any(|i| i.code == "DAX001"));
}

#[test]
fn test_division_with_divide_is_not_an_error() {
    let text = "\
table Sales
\tmeasure Share = DIVIDE([Customer's Sales], [Total]) * 100 / 2
\tmeasure 'Customer''s Sales' = SUM(Sales[Amount])
\tmeasure Total = SUM(Sales[Amount])
";
    let model = sales_model(text);
    let graph = DependencyGraph::build(&model);
    let analysis = ModelAnalyzer::default()
        .analyze_measure(&model, &graph, "Share")
        .unwrap();

    assert!(analysis.issues.iter().all(|i| i.code != "DAX001"));
    assert_eq!(analysis.pattern.pattern_type, PatternType::Ratio);
    assert_eq!(analysis.complexity.function_count, 1);
    assert_eq!(graph.get("Share").unwrap().measures, vec!["Customer's Sales", "Total"]);
}

#[test]
fn test_complexity_golden_values() {
    let model = sales_model(SALES);
    let graph = DependencyGraph::build(&model);
    let analyzer = ModelAnalyzer::default();

    // depth 1 * 8 + 1 function * 3 + 1 table * 5
    let total = analyzer.complexity(&model, &graph, "Total Sales").unwrap();
    assert_eq!(total.score, 16);
    assert_eq!(total.level, ComplexityLevel::Simple);

    let text = "\
table Sales
\tmeasure Heavy = CALCULATE(SUMX(FILTER(Sales, Sales[Qty] > 1), Sales[Amount]), ALL('Date'))
";
    let model = sales_model(text);
    let graph = DependencyGraph::build(&model);
    let heavy = analyzer.complexity(&model, &graph, "Heavy").unwrap();
    // depth 3 * 8 + 4 functions * 3 + 2 tables * 5 + iterator 15 + filter modifier 10
    assert_eq!(heavy.score, 71);
    assert_eq!(heavy.level, ComplexityLevel::Complex);
}

#[test]
fn test_complexity_is_monotonic() {
    let analyzer = ModelAnalyzer::default();
    let formulas = [
        "1",
        "SUM(Sales[Amount])",
        "SUM(Sales[Amount]) + [Other]",
        "CALCULATE(SUM(Sales[Amount]) + [Other], ALL('Date'))",
    ];
    let mut previous = 0;
    for formula in formulas {
        let text = format!("table Sales\n\tmeasure Other = 1\n\tmeasure M = {}\n", formula);
        let model = sales_model(&text);
        let graph = DependencyGraph::build(&model);
        let score = analyzer.complexity(&model, &graph, "M").unwrap().score;
        assert!(score >= previous, "{formula} scored {score} < {previous}");
        previous = score;
    }
}

#[test]
fn test_model_quality_golden_score() {
    let text = "\
table Sales
\tmeasure 'Total Sales' = SUM(Sales[Amount])
\t\tdescription: Sum of sales
\t\tdisplayFolder: Base
\tmeasure Margin = [Profit]/[Total Sales]
\tmeasure Profit = [Total Sales] - SUM(Sales[Cost])
\t\tdisplayFolder: Base
";
    let model = sales_model(text);
    let graph = DependencyGraph::build(&model);
    let quality = ModelAnalyzer::default().model_quality(&model, &graph);

    // 90 * 0.35 + 33.3 * 0.15 + 66.7 * 0.10 + 100 * 0.15 + (100 - 14.7) * 0.15 + 100 * 0.10
    assert_eq!(quality.overall_score, 81.0);
    assert_eq!(quality.error_count, 1);
    assert_eq!(quality.warning_count, 0);
    assert_eq!(quality.info_count, 3);
    assert_eq!(quality.unused_measure_count, 1);
    assert_eq!(quality.naming_issue_count, 0);
    assert_eq!(quality.recommendations.len(), 2);
    assert!(quality.recommendations[1].contains("33%"));
}

#[test]
fn test_naming_issues_one_per_object() {
    let text = "\
table fact_sales
\tmeasure 'total amt' = SUM(fact_sales[amt])
\tcolumn amt
";
    let model = sales_model(text);
    let issues = ModelAnalyzer::default().naming_issues(&model);

    assert_eq!(issues.len(), 3);
    assert_eq!(issues[0].object_kind, ObjectKind::Table);
    assert_eq!(issues[0].suggested_name, "Fact Sales");
    assert_eq!(issues[1].suggested_name, "Total Amount");
    assert_eq!(issues[2].object_kind, ObjectKind::Column);
    assert_eq!(issues[2].suggested_name, "Amount");
}

#[test]
fn test_circular_dependencies_reported() {
    let text = "\
table T
\tmeasure A = [B] + 1
\tmeasure B = [A] + 1
";
    let model = sales_model(text);
    let report = ModelAnalyzer::default().analyze_model(&model);

    assert_eq!(report.cycles.len(), 1);
    assert_eq!(report.quality.cycle_count, 1);
    assert!(report.quality.recommendations[0].contains("circular"));
}

#[test]
fn test_thresholds_come_from_config() {
    let config = AnalysisConfig {
        moderate_threshold: 10,
        complex_threshold: 15,
        ..AnalysisConfig::default()
    };
    let model = sales_model(SALES);
    let graph = DependencyGraph::build(&model);
    let complexity = ModelAnalyzer::new(&config)
        .complexity(&model, &graph, "Total Sales")
        .unwrap();
    assert_eq!(complexity.level, ComplexityLevel::Complex);
}

#[test]
fn test_unknown_measure_is_lookup_miss() {
    let model = sales_model(SALES);
    let graph = DependencyGraph::build(&model);
    let err = ModelAnalyzer::default()
        .analyze_measure(&model, &graph, "Missing")
        .unwrap_err();
    assert!(err.is_lookup_miss());
    assert_eq!(err.to_string(), "Measure not found: Missing");
}
