/*!
# PBI Model Analyzer CLI

Command-line interface over the semantic model analyzer.
*/

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use pbi_model_analyzer::cli_common::{
    self, colored_score, format_percent, print_error, print_warning, OutputFormat, OutputWriter,
};
use pbi_model_analyzer::config::AnalyzerConfig;
use pbi_model_analyzer::dependencies::DependencyGraph;
use pbi_model_analyzer::export::export_dax_script;
use pbi_model_analyzer::loader::{FsModelSource, ProjectLoader};
use pbi_model_analyzer::metrics::{IssueSeverity, ModelAnalyzer};
use pbi_model_analyzer::model::Project;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "pbi-model-analyzer",
    version = env!("CARGO_PKG_VERSION"),
    about = "Static analyzer for Power BI semantic models (TMDL) and DAX measures"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short = 'f', long, default_value = "text", global = true)]
    format: String,

    /// Path to analyzer configuration (TOML or YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show tables, measures and relationships of a project
    Summary {
        /// Path to the .pbip project
        project: String,
    },

    /// Analyze one measure: complexity, pattern, issues and dependencies
    Measure {
        project: String,
        /// Measure name (case-insensitive)
        name: String,
    },

    /// Show the dependency graph, or the dependencies of one measure
    Dependencies {
        project: String,
        measure: Option<String>,
    },

    /// List circular measure dependencies
    Cycles { project: String },

    /// Compute the model quality score with recommendations
    Quality { project: String },

    /// Check naming conventions of tables, measures and columns
    Naming { project: String },

    /// Export the measures of a table as a DAX script
    ExportDax { project: String, table: String },
}

#[derive(Serialize)]
struct TableSummary {
    name: String,
    measures: usize,
    columns: usize,
    hierarchies: usize,
    is_hidden: bool,
}

#[derive(Serialize)]
struct ProjectSummary {
    model_name: String,
    semantic_model_path: String,
    tables: Vec<TableSummary>,
    relationships: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli_common::init_logging(cli.verbose) {
        eprintln!("{}", e);
    }

    if let Err(e) = run(cli) {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let format: OutputFormat = cli.format.parse()?;
    let mut out = OutputWriter::stdout(format);

    let config = match &cli.config {
        Some(path) => {
            cli_common::validate_path(path, "Config file")?;
            AnalyzerConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?
        }
        None => AnalyzerConfig::default(),
    };
    config.validate().context("Invalid analyzer configuration")?;
    debug!("Analyzer config: {:?}", config);

    let loader = ProjectLoader::from_config(FsModelSource, &config);
    let analyzer = ModelAnalyzer::new(&config.analysis);

    match cli.command {
        Commands::Summary { project } => {
            let project = load(&loader, &project)?;
            summary(&mut out, &project)
        }
        Commands::Measure { project, name } => {
            let project = load(&loader, &project)?;
            measure(&mut out, &analyzer, &project, &name)
        }
        Commands::Dependencies { project, measure } => {
            let project = load(&loader, &project)?;
            dependencies(&mut out, &project, measure.as_deref())
        }
        Commands::Cycles { project } => {
            let project = load(&loader, &project)?;
            cycles(&mut out, &analyzer, &project)
        }
        Commands::Quality { project } => {
            let project = load(&loader, &project)?;
            quality(&mut out, &analyzer, &project)
        }
        Commands::Naming { project } => {
            let project = load(&loader, &project)?;
            naming(&mut out, &analyzer, &project)
        }
        Commands::ExportDax { project, table } => {
            let project = load(&loader, &project)?;
            export_dax(&mut out, &project, &table)
        }
    }?;

    out.flush()
}

fn load(loader: &ProjectLoader, project: &str) -> Result<Arc<Project>> {
    loader
        .load(project)
        .with_context(|| format!("Failed to load project: {}", project))
}

fn summary(out: &mut OutputWriter, project: &Project) -> Result<()> {
    let model = &project.model;
    let summary = ProjectSummary {
        model_name: model.name.clone(),
        semantic_model_path: project.semantic_model_path.display().to_string(),
        tables: model
            .tables
            .iter()
            .map(|t| TableSummary {
                name: t.name.clone(),
                measures: t.measures.len(),
                columns: t.columns.len(),
                hierarchies: t.hierarchies.len(),
                is_hidden: t.is_hidden,
            })
            .collect(),
        relationships: model.relationships.iter().map(|r| r.to_string()).collect(),
    };

    if out.is_json() {
        return out.write_json(&summary);
    }

    out.write_header(&format!("Model: {}", summary.model_name))?;
    out.write_field("Path", &summary.semantic_model_path)?;
    out.write_field("Tables", &model.tables.len().to_string())?;
    out.write_field("Measures", &model.measure_count().to_string())?;
    out.write_field("Columns", &model.column_count().to_string())?;
    out.write_field("Relationships", &model.relationships.len().to_string())?;

    out.write_header("Tables")?;
    let rows = summary
        .tables
        .iter()
        .map(|t| {
            vec![
                t.name.clone(),
                t.measures.to_string(),
                t.columns.to_string(),
                t.hierarchies.to_string(),
            ]
        })
        .collect();
    out.write_table(&["Table", "Measures", "Columns", "Hierarchies"], rows)?;

    if !summary.relationships.is_empty() {
        out.write_header("Relationships")?;
        for relationship in &summary.relationships {
            out.write_list_item(relationship)?;
        }
    }
    Ok(())
}

fn measure(
    out: &mut OutputWriter,
    analyzer: &ModelAnalyzer,
    project: &Project,
    name: &str,
) -> Result<()> {
    let graph = DependencyGraph::build(&project.model);
    let analysis = analyzer.analyze_measure(&project.model, &graph, name)?;
    let dependency = graph.dependency(&analysis.measure)?;

    if out.is_json() {
        return out.write_json(&serde_json::json!({
            "analysis": analysis,
            "dependencies": dependency,
        }));
    }

    out.write_header(&format!("{}[{}]", analysis.table, analysis.measure))?;
    out.write_line(&analysis.expression)?;

    out.write_header("Complexity")?;
    let complexity = &analysis.complexity;
    out.write_field(
        "Score",
        &format!("{} ({})", complexity.score, complexity.level),
    )?;
    out.write_field("Nesting depth", &complexity.nesting_depth.to_string())?;
    out.write_field("Functions", &complexity.function_count.to_string())?;
    out.write_field("Recommendation", &complexity.recommendation)?;

    out.write_header("Pattern")?;
    out.write_field(
        "Type",
        &format!(
            "{} (confidence {:.1})",
            analysis.pattern.pattern_type, analysis.pattern.confidence
        ),
    )?;
    if !analysis.pattern.matched_keywords.is_empty() {
        out.write_field("Keywords", &analysis.pattern.matched_keywords.join(", "))?;
    }

    out.write_header("Dependencies")?;
    out.write_field("Measures", &join_or_dash(&dependency.measures))?;
    let columns: Vec<String> = dependency.columns.iter().map(|c| c.to_string()).collect();
    out.write_field("Columns", &join_or_dash(&columns))?;
    out.write_field("Tables", &join_or_dash(&dependency.tables))?;
    out.write_field("Used by", &join_or_dash(&dependency.dependents))?;

    out.write_header("Issues")?;
    if analysis.issues.is_empty() {
        out.write_line(&"No issues found".green().to_string())?;
    }
    for issue in &analysis.issues {
        let severity = match issue.severity {
            IssueSeverity::Error => issue.severity.to_string().red().bold(),
            IssueSeverity::Warning => issue.severity.to_string().yellow(),
            IssueSeverity::Info => issue.severity.to_string().blue(),
        };
        out.write_list_item(&format!("{} {} {}", severity, issue.code, issue.message))?;
        if let Some(suggestion) = &issue.suggestion {
            out.write_line(&format!("      {}", suggestion.dimmed()))?;
        }
    }
    Ok(())
}

fn dependencies(out: &mut OutputWriter, project: &Project, measure: Option<&str>) -> Result<()> {
    let graph = DependencyGraph::build(&project.model);

    if let Some(name) = measure {
        let dependency = graph.dependency(name)?;
        if out.is_json() {
            return out.write_json(dependency);
        }
        out.write_header(&format!("{}[{}]", dependency.table, dependency.measure))?;
        out.write_field("Measures", &join_or_dash(&dependency.measures))?;
        let columns: Vec<String> = dependency.columns.iter().map(|c| c.to_string()).collect();
        out.write_field("Columns", &join_or_dash(&columns))?;
        out.write_field("Tables", &join_or_dash(&dependency.tables))?;
        return out.write_field("Used by", &join_or_dash(&dependency.dependents));
    }

    let statistics = graph.statistics();
    if out.is_json() {
        return out.write_json(&serde_json::json!({
            "statistics": statistics,
            "edges": graph.edges(),
        }));
    }

    out.write_header("Dependency graph")?;
    out.write_field("Measures", &statistics.total_measures.to_string())?;
    out.write_field(
        "Edges",
        &format!(
            "{} measure, {} column, {} table",
            statistics.measure_edges, statistics.column_edges, statistics.table_edges
        ),
    )?;
    out.write_field("Root measures", &statistics.root_measures.to_string())?;
    out.write_field("Unused measures", &statistics.unused_measures.to_string())?;
    out.write_field("Max depth", &statistics.max_depth.to_string())?;
    out.write_field(
        "Circular dependencies",
        &statistics.circular_dependencies.to_string(),
    )?;

    let rows = graph
        .iter()
        .filter(|d| !d.measures.is_empty())
        .map(|d| vec![d.measure.clone(), d.measures.join(", ")])
        .collect::<Vec<_>>();
    if !rows.is_empty() {
        out.write_header("Measure references")?;
        out.write_table(&["Measure", "References"], rows)?;
    }
    Ok(())
}

fn cycles(out: &mut OutputWriter, analyzer: &ModelAnalyzer, project: &Project) -> Result<()> {
    let graph = DependencyGraph::build(&project.model);
    let cycles = analyzer.circular_dependencies(&graph);

    if out.is_json() {
        return out.write_json(&cycles);
    }

    if cycles.is_empty() {
        return out.write_line(&"No circular dependencies".green().to_string());
    }
    print_warning(&format!("{} circular dependencies found", cycles.len()));
    for cycle in &cycles {
        out.write_list_item(&cycle.to_string())?;
    }
    Ok(())
}

fn quality(out: &mut OutputWriter, analyzer: &ModelAnalyzer, project: &Project) -> Result<()> {
    let graph = DependencyGraph::build(&project.model);
    let quality = analyzer.model_quality(&project.model, &graph);

    if out.is_json() {
        return out.write_json(&quality);
    }

    out.write_header(&format!("Model quality: {}", project.model.name))?;
    out.write_field("Overall score", &colored_score(quality.overall_score))?;
    out.write_field(
        "Issues",
        &format!(
            "{} errors, {} warnings, {} info",
            quality.error_count, quality.warning_count, quality.info_count
        ),
    )?;
    out.write_field("Documented measures", &format_percent(quality.documentation_coverage))?;
    out.write_field(
        "Measures in folders",
        &format_percent(quality.display_folder_coverage),
    )?;
    out.write_field(
        "Relationships with cardinality",
        &format_percent(quality.relationship_completeness),
    )?;
    out.write_field(
        "Average complexity",
        &format!("{:.1}", quality.average_complexity),
    )?;
    out.write_field("Circular dependencies", &quality.cycle_count.to_string())?;
    out.write_field("Unused measures", &quality.unused_measure_count.to_string())?;
    out.write_field("Naming issues", &quality.naming_issue_count.to_string())?;

    out.write_header("Recommendations")?;
    for recommendation in &quality.recommendations {
        out.write_list_item(recommendation)?;
    }
    Ok(())
}

fn naming(out: &mut OutputWriter, analyzer: &ModelAnalyzer, project: &Project) -> Result<()> {
    let issues = analyzer.naming_issues(&project.model);

    if out.is_json() {
        return out.write_json(&issues);
    }

    if issues.is_empty() {
        return out.write_line(&"All names follow the conventions".green().to_string());
    }
    out.write_header(&format!("Naming issues ({})", issues.len()))?;
    for issue in &issues {
        out.write_list_item(&issue.to_string())?;
    }
    Ok(())
}

fn export_dax(out: &mut OutputWriter, project: &Project, table: &str) -> Result<()> {
    let table = project.model.table(table)?;
    let export = export_dax_script(table);

    if out.is_json() {
        return out.write_json(&export);
    }
    out.write_line(&export.dax_script)
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}
