/*!
# Project Loader

Assembles a [`Project`] from a semantic model directory:

```text
Sales.pbip                       <- source path (cache key)
Sales.SemanticModel/             <- derived: stem + ".SemanticModel"
└── definition/
    ├── model.tmdl               <- display name (optional)
    ├── relationships.tmdl       <- relationships (optional)
    └── tables/
        ├── Date.tmdl
        └── Sales.tmdl
```

File access goes through the [`ModelSource`] trait so that the same loader runs
over the filesystem ([`FsModelSource`]) or in-memory text ([`MemoryModelSource`]).
Assembled projects are kept in a [`ProjectCache`]; repeated loads of the same
source path return the cached `Arc<Project>`.
*/

use crate::cache::{project_cache, ProjectCache};
use crate::config::{AnalyzerConfig, LoaderConfig};
use crate::core::{read_tmdl_file, ModelError, ModelResult};
use crate::model::{Model, Project, Table};
use crate::parser::{parse_model_name, parse_relationships, parse_table};
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Backing store for model text files
pub trait ModelSource: Send + Sync {
    fn is_dir(&self, path: &Path) -> bool;

    fn is_file(&self, path: &Path) -> bool;

    /// Files directly inside `dir` with the given extension, sorted by path
    fn list_files(&self, dir: &Path, extension: &str) -> ModelResult<Vec<PathBuf>>;

    fn read_text(&self, path: &Path) -> ModelResult<String>;
}

/// Derives the semantic model directory: the source path without its
/// extension, followed by `suffix`
pub fn semantic_model_dir(source_path: &Path, suffix: &str) -> PathBuf {
    let mut dir: OsString = source_path.with_extension("").into_os_string();
    dir.push(suffix);
    PathBuf::from(dir)
}

/// Local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsModelSource;

impl ModelSource for FsModelSource {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn list_files(&self, dir: &Path, extension: &str) -> ModelResult<Vec<PathBuf>> {
        let files = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| has_extension(p, extension))
            .collect();
        Ok(files)
    }

    fn read_text(&self, path: &Path) -> ModelResult<String> {
        read_tmdl_file(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// In-memory file set, for tests and for callers that already hold the text
#[derive(Debug, Clone, Default)]
pub struct MemoryModelSource {
    files: BTreeMap<PathBuf, String>,
}

impl MemoryModelSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file (builder style)
    pub fn with_file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }
}

impl ModelSource for MemoryModelSource {
    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .keys()
            .any(|file| file != path && file.starts_with(path))
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn list_files(&self, dir: &Path, extension: &str) -> ModelResult<Vec<PathBuf>> {
        Ok(self
            .files
            .keys()
            .filter(|file| file.parent() == Some(dir) && has_extension(file, extension))
            .cloned()
            .collect())
    }

    fn read_text(&self, path: &Path) -> ModelResult<String> {
        self.files.get(path).cloned().ok_or_else(|| ModelError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such in-memory file"),
        })
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// Loads and caches projects
pub struct ProjectLoader {
    source: Box<dyn ModelSource>,
    cache: Box<dyn ProjectCache>,
    config: LoaderConfig,
}

impl ProjectLoader {
    pub fn new(
        source: Box<dyn ModelSource>,
        cache: Box<dyn ProjectCache>,
        config: LoaderConfig,
    ) -> Self {
        Self {
            source,
            cache,
            config,
        }
    }

    /// Filesystem loader with an unbounded cache and the default layout
    pub fn filesystem() -> Self {
        Self::from_config(FsModelSource, &AnalyzerConfig::default())
    }

    pub fn from_config(source: impl ModelSource + 'static, config: &AnalyzerConfig) -> Self {
        Self::new(
            Box::new(source),
            project_cache(config.cache.capacity),
            config.loader.clone(),
        )
    }

    pub fn cache(&self) -> &dyn ProjectCache {
        self.cache.as_ref()
    }

    /// Returns the project for `source_path`, assembling it on first use
    pub fn load(&self, source_path: &str) -> ModelResult<Arc<Project>> {
        if let Some(project) = self.cache.get(source_path) {
            return Ok(project);
        }

        let project = Arc::new(self.assemble(source_path)?);
        self.cache.insert(source_path, Arc::clone(&project));
        Ok(project)
    }

    /// Reads and parses every model file without touching the cache
    pub fn assemble(&self, source_path: &str) -> ModelResult<Project> {
        let model_dir = semantic_model_dir(Path::new(source_path), &self.config.model_dir_suffix);
        if !self.source.is_dir(&model_dir) {
            return Err(ModelError::ModelNotFound { path: model_dir });
        }

        tracing::info!("Loading semantic model from: {}", model_dir.display());
        let definition = model_dir.join(&self.config.definition_dir);

        let name = self.load_model_name(&definition);
        let tables = self.load_tables(&definition.join(&self.config.tables_dir))?;
        let relationships = self.load_relationships(&definition);

        let model = Model::new(name, tables, relationships);
        warn_duplicate_measures(&model);

        tracing::info!(
            "Semantic model '{}' loaded: {} tables, {} measures, {} relationships",
            model.name,
            model.tables.len(),
            model.measure_count(),
            model.relationships.len()
        );

        Ok(Project {
            source_path: source_path.to_string(),
            semantic_model_path: model_dir,
            model,
        })
    }

    fn load_model_name(&self, definition: &Path) -> String {
        let path = definition.join(&self.config.model_file);
        if !self.source.is_file(&path) {
            return self.config.default_model_name.clone();
        }
        match self.source.read_text(&path) {
            Ok(text) => {
                parse_model_name(&text).unwrap_or_else(|| self.config.default_model_name.clone())
            }
            Err(e) => {
                tracing::warn!("{}", e);
                self.config.default_model_name.clone()
            }
        }
    }

    fn load_tables(&self, tables_dir: &Path) -> ModelResult<Vec<Table>> {
        if !self.source.is_dir(tables_dir) {
            tracing::debug!("No tables directory at {}", tables_dir.display());
            return Ok(Vec::new());
        }

        let mut tables = Vec::new();
        for path in self
            .source
            .list_files(tables_dir, &self.config.table_extension)?
        {
            let text = match self.source.read_text(&path) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("Skipping unreadable table file: {}", e);
                    continue;
                }
            };
            match parse_table(&text) {
                Some(table) => {
                    tracing::debug!("{}: table '{}'", path.display(), table.name);
                    tables.push(table);
                }
                None => tracing::debug!("{}: no table declaration", path.display()),
            }
        }
        Ok(tables)
    }

    fn load_relationships(&self, definition: &Path) -> Vec<crate::model::Relationship> {
        let path = definition.join(&self.config.relationships_file);
        if !self.source.is_file(&path) {
            return Vec::new();
        }
        match self.source.read_text(&path) {
            Ok(text) => parse_relationships(&text),
            Err(e) => {
                tracing::warn!("Skipping relationships: {}", e);
                Vec::new()
            }
        }
    }
}

fn warn_duplicate_measures(model: &Model) {
    let mut owners: HashMap<String, &str> = HashMap::new();
    for (table, measure) in model.measures() {
        let key = measure.name.to_lowercase();
        if let Some(first) = owners.get(&key) {
            tracing::warn!(
                "Measure '{}' in table '{}' duplicates a measure in '{}'; the first declaration wins",
                measure.name,
                table.name,
                first
            );
        } else {
            owners.insert(key, &table.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_project() -> MemoryModelSource {
        MemoryModelSource::new()
            .with_file(
                "demo/Sales.SemanticModel/definition/model.tmdl",
                "model 'Demo Model'\n",
            )
            .with_file(
                "demo/Sales.SemanticModel/definition/tables/Sales.tmdl",
                "table Sales\n\tmeasure Total = SUM(Sales[Amount])\n",
            )
            .with_file(
                "demo/Sales.SemanticModel/definition/tables/Date.tmdl",
                "table Date\n\tcolumn Date\n\t\tdataType: dateTime\n",
            )
            .with_file(
                "demo/Sales.SemanticModel/definition/tables/notes.txt",
                "table Ignored\n",
            )
            .with_file(
                "demo/Sales.SemanticModel/definition/relationships.tmdl",
                "relationship r1\n\tfromColumn: Sales.DateKey\n\ttoColumn: Date.Date\n",
            )
    }

    #[test]
    fn test_semantic_model_dir() {
        assert_eq!(
            semantic_model_dir(Path::new("/work/Sales.pbip"), ".SemanticModel"),
            PathBuf::from("/work/Sales.SemanticModel")
        );
        assert_eq!(
            semantic_model_dir(Path::new("Sales"), ".SemanticModel"),
            PathBuf::from("Sales.SemanticModel")
        );
    }

    #[test]
    fn test_assemble_from_memory() {
        let loader = ProjectLoader::from_config(memory_project(), &AnalyzerConfig::default());
        let project = loader.load("demo/Sales.pbip").unwrap();

        assert_eq!(project.model.name, "Demo Model");
        let names: Vec<_> = project.model.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Date", "Sales"]);
        assert_eq!(project.model.relationships.len(), 1);
        assert_eq!(
            project.semantic_model_path,
            PathBuf::from("demo/Sales.SemanticModel")
        );
    }

    #[test]
    fn test_missing_directory_is_not_found() {
        let loader = ProjectLoader::from_config(memory_project(), &AnalyzerConfig::default());
        match loader.load("demo/Other.pbip") {
            Err(ModelError::ModelNotFound { path }) => {
                assert_eq!(path, PathBuf::from("demo/Other.SemanticModel"))
            }
            other => panic!("expected ModelNotFound, got {:?}", other.map(|p| p.source_path.clone())),
        }
        assert!(loader.cache().is_empty());
    }

    #[test]
    fn test_repeated_load_hits_cache() {
        let loader = ProjectLoader::from_config(memory_project(), &AnalyzerConfig::default());
        let first = loader.load("demo/Sales.pbip").unwrap();
        let second = loader.load("demo/Sales.pbip").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.cache().len(), 1);
    }

    #[test]
    fn test_default_model_name_without_model_file() {
        let source = MemoryModelSource::new().with_file(
            "p/X.SemanticModel/definition/tables/T.tmdl",
            "table T\n",
        );
        let loader = ProjectLoader::from_config(source, &AnalyzerConfig::default());
        let project = loader.load("p/X.pbip").unwrap();
        assert_eq!(project.model.name, "Model");
        assert_eq!(project.model.tables.len(), 1);
    }
}
