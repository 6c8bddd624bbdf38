/*!
# Analyzer Configuration

Settings for project discovery, caching and analysis thresholds.
Loaded from TOML or YAML files; every field has a default, so an empty
file (or no file at all) yields the standard behavior.

```toml
[loader]
model_dir_suffix = ".SemanticModel"

[cache]
capacity = 32

[analysis]
max_if_nesting = 3
allowed_abbreviations = ["YTD", "MTD", "KPI"]
```
*/

use crate::core::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Layout of a semantic model directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Appended to the project path stem to get the model directory
    #[serde(default = "default_model_dir_suffix")]
    pub model_dir_suffix: String,
    #[serde(default = "default_definition_dir")]
    pub definition_dir: String,
    #[serde(default = "default_tables_dir")]
    pub tables_dir: String,
    #[serde(default = "default_table_extension")]
    pub table_extension: String,
    #[serde(default = "default_relationships_file")]
    pub relationships_file: String,
    #[serde(default = "default_model_file")]
    pub model_file: String,
    /// Used when `model.tmdl` is missing or has no `model` line
    #[serde(default = "default_model_name")]
    pub default_model_name: String,
}

fn default_model_dir_suffix() -> String {
    ".SemanticModel".to_string()
}

fn default_definition_dir() -> String {
    "definition".to_string()
}

fn default_tables_dir() -> String {
    "tables".to_string()
}

fn default_table_extension() -> String {
    "tmdl".to_string()
}

fn default_relationships_file() -> String {
    "relationships.tmdl".to_string()
}

fn default_model_file() -> String {
    "model.tmdl".to_string()
}

fn default_model_name() -> String {
    "Model".to_string()
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            model_dir_suffix: default_model_dir_suffix(),
            definition_dir: default_definition_dir(),
            tables_dir: default_tables_dir(),
            table_extension: default_table_extension(),
            relationships_file: default_relationships_file(),
            model_file: default_model_file(),
            default_model_name: default_model_name(),
        }
    }
}

/// Project cache settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// `None` keeps every project for the process lifetime
    #[serde(default)]
    pub capacity: Option<usize>,
}

/// Thresholds used by the analyzers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// IF nesting above this depth is reported
    #[serde(default = "default_max_if_nesting")]
    pub max_if_nesting: usize,
    /// Complexity scores from here on are "moderate"
    #[serde(default = "default_moderate_threshold")]
    pub moderate_threshold: u32,
    /// Complexity scores from here on are "complex"
    #[serde(default = "default_complex_threshold")]
    pub complex_threshold: u32,
    /// Documentation coverage below this ratio produces a recommendation
    #[serde(default = "default_coverage_threshold")]
    pub coverage_threshold: f64,
    /// Upper-case abbreviations that are never reported by the naming check
    #[serde(default = "default_allowed_abbreviations")]
    pub allowed_abbreviations: Vec<String>,
}

fn default_max_if_nesting() -> usize {
    3
}

fn default_moderate_threshold() -> u32 {
    30
}

fn default_complex_threshold() -> u32 {
    60
}

fn default_coverage_threshold() -> f64 {
    0.5
}

fn default_allowed_abbreviations() -> Vec<String> {
    ["YTD", "MTD", "QTD", "KPI", "ID"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_if_nesting: default_max_if_nesting(),
            moderate_threshold: default_moderate_threshold(),
            complex_threshold: default_complex_threshold(),
            coverage_threshold: default_coverage_threshold(),
            allowed_abbreviations: default_allowed_abbreviations(),
        }
    }
}

impl AnalyzerConfig {
    /// Loads configuration from a `.toml`, `.yaml` or `.yml` file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ModelResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let config: Self = match extension.as_deref() {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| {
                ModelError::Config(format!("Failed to parse YAML config {}: {}", path.display(), e))
            })?,
            _ => toml::from_str(&content).map_err(|e| {
                ModelError::Config(format!("Failed to parse TOML config {}: {}", path.display(), e))
            })?,
        };

        config.validate()?;
        tracing::debug!("Loaded analyzer config from {}", path.display());
        Ok(config)
    }

    /// Loads the file when it exists, otherwise returns defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> ModelResult<Self> {
        if path.as_ref().exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Serializes to TOML
    pub fn to_toml(&self) -> ModelResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ModelError::Config(format!("Failed to serialize config: {}", e)))
    }

    pub fn validate(&self) -> ModelResult<()> {
        let analysis = &self.analysis;
        if analysis.moderate_threshold >= analysis.complex_threshold {
            return Err(ModelError::Config(format!(
                "moderate_threshold ({}) must be below complex_threshold ({})",
                analysis.moderate_threshold, analysis.complex_threshold
            )));
        }
        if analysis.complex_threshold > 100 {
            return Err(ModelError::Config(
                "complex_threshold must not exceed 100".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&analysis.coverage_threshold) {
            return Err(ModelError::Config(
                "coverage_threshold must be between 0 and 1".to_string(),
            ));
        }
        if self.cache.capacity == Some(0) {
            return Err(ModelError::Config(
                "cache capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
