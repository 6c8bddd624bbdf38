/*!
# CLI Integration Tests

Runs the built `pbi-model-analyzer` binary against a project on disk.
*/

use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn write_project(root: &Path) -> String {
    let tables = root.join("Shop.SemanticModel").join("definition").join("tables");
    fs::create_dir_all(&tables).unwrap();
    fs::write(
        root.join("Shop.SemanticModel/definition/model.tmdl"),
        "model Shop\n",
    )
    .unwrap();
    fs::write(
        tables.join("Sales.tmdl"),
        "table Sales\n\
\tmeasure 'Total Sales' = SUM(Sales[Amount])\n\
\t\tformatString: #,0\n\
\tmeasure 'Customer''s Share' = DIVIDE([Total Sales], [Customer's Count])\n\
\tmeasure 'Customer''s Count' = DISTINCTCOUNT(Sales[CustomerKey])\n\
\tcolumn Amount\n\
\t\tdataType: decimal\n",
    )
    .unwrap();
    fs::write(
        root.join("Shop.SemanticModel/definition/relationships.tmdl"),
        "relationship\n\tfromColumn: Sales.DateKey\n\ttoColumn: Date.DateKey\n",
    )
    .unwrap();
    root.join("Shop.pbip").to_string_lossy().into_owned()
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pbi-model-analyzer"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("binary runs")
}

fn json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("json output")
}

#[test]
fn test_summary_json() {
    let dir = TempDir::new().unwrap();
    let pbip = write_project(dir.path());

    let summary = json(&run(&["summary", &pbip, "--format", "json"]));
    assert_eq!(summary["model_name"], "Shop");
    assert_eq!(summary["tables"][0]["name"], "Sales");
    assert_eq!(summary["tables"][0]["measures"], 3);
    assert_eq!(summary["relationships"].as_array().map(Vec::len), Some(1));
}

#[test]
fn test_every_subcommand_succeeds() {
    let dir = TempDir::new().unwrap();
    let pbip = write_project(dir.path());

    for args in [
        vec!["summary", pbip.as_str()],
        vec!["measure", pbip.as_str(), "total sales"],
        vec!["dependencies", pbip.as_str()],
        vec!["dependencies", pbip.as_str(), "Total Sales"],
        vec!["cycles", pbip.as_str()],
        vec!["quality", pbip.as_str()],
        vec!["naming", pbip.as_str()],
        vec!["export-dax", pbip.as_str(), "Sales"],
    ] {
        let output = run(&args);
        assert!(
            output.status.success(),
            "{:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

#[test]
fn test_measure_json_with_apostrophe_in_reference() {
    let dir = TempDir::new().unwrap();
    let pbip = write_project(dir.path());

    let report = json(&run(&["-f", "json", "measure", &pbip, "Customer's Share"]));
    assert_eq!(report["analysis"]["pattern"]["pattern_type"], "ratio");
    assert_eq!(
        report["dependencies"]["measures"],
        serde_json::json!(["Total Sales", "Customer's Count"])
    );
}

#[test]
fn test_export_dax_text() {
    let dir = TempDir::new().unwrap();
    let pbip = write_project(dir.path());

    let output = run(&["export-dax", &pbip, "Sales"]);
    assert!(output.status.success());
    let script = String::from_utf8_lossy(&output.stdout);
    assert!(script.starts_with("-- DAX Measures for Sales"));
    assert!(script.contains("[Total Sales] = SUM(Sales[Amount])"));
    assert!(script.contains("-- Format: #,0"));
}

#[test]
fn test_unknown_measure_fails() {
    let dir = TempDir::new().unwrap();
    let pbip = write_project(dir.path());

    let output = run(&["measure", &pbip, "Nope"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Measure not found: Nope"));
}

#[test]
fn test_missing_project_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("Missing.pbip");

    let output = run(&["quality", &missing.to_string_lossy()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load project"));
}
