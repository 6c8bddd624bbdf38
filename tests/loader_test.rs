/*!
# Loader Integration Tests

On-disk projects, project caching and configuration files.
*/

use pbi_model_analyzer::config::AnalyzerConfig;
use pbi_model_analyzer::core::ModelError;
use pbi_model_analyzer::loader::{FsModelSource, ProjectLoader};
use pbi_model_analyzer::metrics::ModelAnalyzer;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write_project(root: &Path) -> String {
    let definition = root.join("Sales.SemanticModel").join("definition");
    let tables = definition.join("tables");
    fs::create_dir_all(&tables).unwrap();

    fs::write(definition.join("model.tmdl"), "model 'Sales Analysis'\n\tculture: en-US\n").unwrap();
    fs::write(
        tables.join("Sales.tmdl"),
        "table Sales\n\
\tmeasure 'Total Sales' = SUM(Sales[Amount])\n\
\t\tformatString: #,0\n\
\tmeasure 'Sales YoY' = ```\n\
\t\t\tDIVIDE(\n\
\t\t\t\t[Total Sales] - CALCULATE([Total Sales], SAMEPERIODLASTYEAR('Date'[Date])),\n\
\t\t\t\t[Total Sales]\n\
\t\t\t)\n\
\t\t\t```\n\
\tcolumn Amount\n\
\t\tdataType: decimal\n\
\tcolumn DateKey\n\
\t\tdataType: int64\n",
    )
    .unwrap();
    fs::write(
        tables.join("Date.tmdl"),
        "table Date\n\tcolumn Date\n\t\tdataType: dateTime\n",
    )
    .unwrap();
    // UTF-8 BOM
    let mut bom = vec![0xEF, 0xBB, 0xBF];
    bom.extend_from_slice(b"table Product\n\tcolumn Name\n");
    fs::write(tables.join("Product.tmdl"), bom).unwrap();
    fs::write(tables.join("README.md"), "not a table").unwrap();
    fs::write(
        definition.join("relationships.tmdl"),
        "relationship a1\n\
\tfromColumn: Sales.DateKey\n\
\ttoColumn: Date.Date\n\
\n\
relationship incomplete\n\
\tfromColumn: Sales.ProductKey\n",
    )
    .unwrap();

    root.join("Sales.pbip").to_string_lossy().into_owned()
}

#[test]
fn test_load_project_from_disk() {
    let dir = TempDir::new().unwrap();
    let pbip = write_project(dir.path());

    let project = ProjectLoader::filesystem().load(&pbip).unwrap();
    let model = &project.model;

    assert_eq!(model.name, "Sales Analysis");
    let names: Vec<&str> = model.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Date", "Product", "Sales"]);
    assert_eq!(model.relationships.len(), 1);
    assert_eq!(project.source_path, pbip);
    assert_eq!(
        project.semantic_model_path,
        dir.path().join("Sales.SemanticModel")
    );

    let (_, yoy) = model.measure("sales yoy").unwrap();
    assert!(yoy.expression.starts_with("DIVIDE(\n\t[Total Sales]"));
    assert!(yoy.expression.ends_with(')'));
}

#[test]
fn test_missing_model_is_not_found() {
    let dir = TempDir::new().unwrap();
    let pbip = dir.path().join("Missing.pbip");

    let err = ProjectLoader::filesystem()
        .load(&pbip.to_string_lossy())
        .unwrap_err();
    assert!(matches!(err, ModelError::ModelNotFound { .. }));
    assert!(!err.is_lookup_miss());
}

#[test]
fn test_empty_model_directory_is_an_empty_model() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("Empty.SemanticModel")).unwrap();

    let project = ProjectLoader::filesystem()
        .load(&dir.path().join("Empty.pbip").to_string_lossy())
        .unwrap();
    assert!(project.model.tables.is_empty());
    assert_eq!(project.model.name, "Model");
}

#[test]
fn test_cache_returns_same_instance() {
    let dir = TempDir::new().unwrap();
    let pbip = write_project(dir.path());
    let loader = ProjectLoader::filesystem();

    let first = loader.load(&pbip).unwrap();
    // edits after the first load are not observed
    fs::remove_file(dir.path().join("Sales.SemanticModel/definition/tables/Date.tmdl")).unwrap();
    let second = loader.load(&pbip).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.model.tables.len(), 3);
}

#[test]
fn test_bounded_cache_from_config() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("analyzer.yaml");
    fs::write(&config_path, "cache:\n  capacity: 1\nanalysis:\n  coverage_threshold: 0.9\n").unwrap();
    let config = AnalyzerConfig::load_from_file(&config_path).unwrap();
    assert_eq!(config.cache.capacity, Some(1));

    let first_root = dir.path().join("one");
    let second_root = dir.path().join("two");
    let first = write_project(&first_root);
    let second = write_project(&second_root);

    let loader = ProjectLoader::from_config(FsModelSource, &config);
    let a = loader.load(&first).unwrap();
    loader.load(&second).unwrap();
    assert_eq!(loader.cache().len(), 1);

    // evicted, so it is assembled again
    let again = loader.load(&first).unwrap();
    assert!(!Arc::ptr_eq(&a, &again));
    assert_eq!(*a, *again);
}

#[test]
fn test_analyze_loaded_project() {
    let dir = TempDir::new().unwrap();
    let pbip = write_project(dir.path());
    let project = ProjectLoader::filesystem().load(&pbip).unwrap();

    let report = ModelAnalyzer::default().analyze_model(&project.model);
    assert_eq!(report.model_name, "Sales Analysis");
    assert_eq!(report.measures.len(), 2);
    assert_eq!(report.dependency_statistics.measure_edges, 1);
    assert!(report.cycles.is_empty());
    assert_eq!(report.quality.total_relationships, 1);
    assert_eq!(report.quality.relationship_completeness, 0.0);
}
