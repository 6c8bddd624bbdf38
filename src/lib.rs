/*!
# PBI Model Analyzer

Static analyzer for Power BI semantic models stored as TMDL text.
Parses table, relationship and model files into an in-memory model,
builds the DAX measure dependency graph and scores formulas and the
model as a whole.

## Architecture

```text
PBI Model Analyzer
├── Parser        - TMDL tables, relationships, model declaration
├── Model         - Tables, measures, columns, hierarchies, relationships
├── Loader        - Project discovery over a pluggable file source
├── Cache         - Unbounded and LRU project caches
├── Dependencies  - Measure graph, cycles, statistics
├── Metrics       - Complexity, patterns, issues, naming, model quality
├── Export        - DAX script and table schema
└── Config        - TOML/YAML analyzer settings
```

## Usage

### CLI
```bash
pbi-model-analyzer summary ./Sales.pbip
pbi-model-analyzer quality ./Sales.pbip --format json
pbi-model-analyzer measure ./Sales.pbip "Total Sales"
pbi-model-analyzer cycles ./Sales.pbip
```

### Library
```rust
use pbi_model_analyzer::metrics::{ModelAnalyzer, PatternType};
use pbi_model_analyzer::parser::parse_table;
use pbi_model_analyzer::model::Model;

let table = parse_table("table Sales\n\tmeasure Margin = DIVIDE([Profit], [Sales])\n").unwrap();
let model = Model::new("Model", vec![table], Vec::new());

let analyzer = ModelAnalyzer::default();
let pattern = analyzer.pattern(&model, "Margin").unwrap();
assert_eq!(pattern.pattern_type, PatternType::Ratio);
```
*/

pub mod cache;
pub mod cli_common;
pub mod config;
pub mod core;
pub mod dependencies;
pub mod export;
pub mod loader;
pub mod metrics;
pub mod model;
pub mod parser;

// Re-export main types for convenience
pub use cache::{project_cache, LruProjectCache, ProjectCache, UnboundedProjectCache};
pub use config::AnalyzerConfig;
pub use core::{ModelError, ModelResult};
pub use dependencies::{DependencyCycle, DependencyGraph, MeasureDependency};
pub use export::{export_dax_script, table_schema, DaxExport, TableSchema};
pub use loader::{FsModelSource, MemoryModelSource, ModelSource, ProjectLoader};
pub use metrics::{
    DaxComplexity, DaxIssue, DaxPattern, ModelAnalyzer, ModelQuality, ModelReport, NamingIssue,
};
pub use model::{Column, Hierarchy, Measure, Model, Project, Relationship, Table};
pub use parser::{parse_model_name, parse_relationships, parse_table};

use std::sync::Arc;

/// Loads a project from disk with the default configuration
pub fn load_project(source_path: &str) -> ModelResult<Arc<Project>> {
    ProjectLoader::filesystem().load(source_path)
}
