/*!
# Dependency Graph

Граф зависимостей мер семантической модели.

Each measure is a node. Its formula is scanned for references and produces
edges tagged by [`EdgeKind`]: measure → measure, measure → column and
measure → table. Adjacency is kept in insertion-ordered maps (table order,
then declaration order), so every iteration over the graph is reproducible.

## Возможности
- Прямые зависимости и обратные ссылки (`dependents`)
- Поиск циклических зависимостей между мерами
- Корневые меры, листовые меры, неиспользуемые меры
- Статистика графа

## Использование

```rust
use pbi_model_analyzer::dependencies::DependencyGraph;
use pbi_model_analyzer::model::{Measure, Model, Table};

let mut sales = Table::new("Sales");
sales.measures.push(Measure::new("Total", "SUM(Sales[Amount])"));
sales.measures.push(Measure::new("Double", "[Total] * 2"));
let model = Model::new("Model", vec![sales], Vec::new());

let graph = DependencyGraph::build(&model);
assert_eq!(graph.get("Total").unwrap().dependents, vec!["Double".to_string()]);
assert!(graph.find_cycles().is_empty());
```
*/

pub mod references;

pub use references::{
    has_literal, mask_bracket_names, scan_references, strip_comments_and_strings,
    FormulaReferences,
};

use crate::core::{ModelError, ModelResult};
use crate::model::Model;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Тип ребра графа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Measure,
    Column,
    Table,
}

/// Column referenced by a formula
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'[{}]", self.table, self.column)
    }
}

/// Dependencies of one measure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureDependency {
    pub measure: String,
    /// Owning table
    pub table: String,
    /// Referenced measures
    pub measures: Vec<String>,
    pub columns: Vec<ColumnRef>,
    pub tables: Vec<String>,
    /// Measures whose formula references this one
    pub dependents: Vec<String>,
}

impl MeasureDependency {
    fn new(measure: &str, table: &str) -> Self {
        Self {
            measure: measure.to_string(),
            table: table.to_string(),
            measures: Vec::new(),
            columns: Vec::new(),
            tables: Vec::new(),
            dependents: Vec::new(),
        }
    }

    /// Depends on no other measure
    pub fn is_root(&self) -> bool {
        self.measures.is_empty()
    }

    /// No other measure depends on it
    pub fn is_leaf(&self) -> bool {
        self.dependents.is_empty()
    }

    /// Nothing was referenced at all
    pub fn has_no_dependencies(&self) -> bool {
        self.measures.is_empty() && self.columns.is_empty() && self.tables.is_empty()
    }
}

/// Tagged edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from: String,
    /// Measure name, `'Table'[Column]` or table name depending on `kind`
    pub to: String,
    pub kind: EdgeKind,
}

/// Циклическая зависимость: упорядоченный список мер, замыкающийся на первую
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyCycle {
    pub measures: Vec<String>,
}

impl DependencyCycle {
    pub fn contains(&self, measure: &str) -> bool {
        self.measures.iter().any(|m| m == measure)
    }

    pub fn len(&self) -> usize {
        self.measures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }
}

impl fmt::Display for DependencyCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut path = self.measures.join(" -> ");
        if let Some(first) = self.measures.first() {
            path.push_str(" -> ");
            path.push_str(first);
        }
        write!(f, "{}", path)
    }
}

/// Статистика графа зависимостей
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyStatistics {
    /// Общее количество мер
    pub total_measures: usize,
    pub measure_edges: usize,
    pub column_edges: usize,
    pub table_edges: usize,
    pub root_measures: usize,
    pub leaf_measures: usize,
    pub unused_measures: usize,
    /// Количество циклических зависимостей
    pub circular_dependencies: usize,
    /// Максимальная глубина зависимостей
    pub max_depth: usize,
    /// Среднее количество зависимостей от мер на меру
    pub avg_measure_dependencies: f64,
}

/// Граф зависимостей мер
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyGraph {
    nodes: IndexMap<String, MeasureDependency>,
}

impl DependencyGraph {
    /// Builds the graph for every measure of the model.
    ///
    /// Unqualified `[Name]` references resolve against measure names
    /// (case-insensitive); anything else is a column of the owning table.
    /// Duplicated measure names keep the first declaration.
    pub fn build(model: &Model) -> Self {
        let mut canonical: HashMap<String, String> = HashMap::new();
        let mut nodes: IndexMap<String, MeasureDependency> = IndexMap::new();

        for (table, measure) in model.measures() {
            let key = measure.name.to_lowercase();
            if canonical.contains_key(&key) {
                tracing::debug!("Skipping duplicate measure '{}' in '{}'", measure.name, table.name);
                continue;
            }
            canonical.insert(key, measure.name.clone());
            nodes.insert(
                measure.name.clone(),
                MeasureDependency::new(&measure.name, &table.name),
            );
        }

        for (table, measure) in model.measures() {
            let Some(node) = nodes.get_mut(&measure.name) else {
                continue;
            };
            if node.table != table.name {
                continue;
            }

            let refs = scan_references(&measure.expression);
            for name in &refs.brackets {
                match canonical.get(&name.to_lowercase()) {
                    Some(target) => push_unique(&mut node.measures, target.clone()),
                    None => push_unique(
                        &mut node.columns,
                        ColumnRef {
                            table: table.name.clone(),
                            column: name.clone(),
                        },
                    ),
                }
            }
            for ref_table in &refs.standalone_tables {
                push_unique(&mut node.tables, ref_table.clone());
            }
            for (ref_table, column) in &refs.qualified {
                push_unique(&mut node.tables, ref_table.clone());
                push_unique(
                    &mut node.columns,
                    ColumnRef {
                        table: ref_table.clone(),
                        column: column.clone(),
                    },
                );
            }
        }

        // обратные ребра
        let reverse: Vec<(String, String)> = nodes
            .values()
            .flat_map(|dep| {
                dep.measures
                    .iter()
                    .map(move |target| (target.clone(), dep.measure.clone()))
            })
            .collect();
        for (target, dependent) in reverse {
            if let Some(node) = nodes.get_mut(&target) {
                push_unique(&mut node.dependents, dependent);
            }
        }

        let graph = Self { nodes };
        tracing::info!(
            "Dependency graph built: {} measures, {} measure edges",
            graph.len(),
            graph.edges_of_kind(EdgeKind::Measure)
        );
        graph
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, measure: &str) -> Option<&MeasureDependency> {
        self.nodes.get(measure).or_else(|| {
            self.nodes
                .values()
                .find(|dep| dep.measure.eq_ignore_ascii_case(measure))
        })
    }

    /// Like [`get`](Self::get), but a missing measure is an error
    pub fn dependency(&self, measure: &str) -> ModelResult<&MeasureDependency> {
        self.get(measure)
            .ok_or_else(|| ModelError::MeasureNotFound(measure.to_string()))
    }

    /// All nodes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &MeasureDependency> {
        self.nodes.values()
    }

    /// Every tagged edge, grouped by source measure
    pub fn edges(&self) -> Vec<DependencyEdge> {
        let mut edges = Vec::new();
        for dep in self.nodes.values() {
            for target in &dep.measures {
                edges.push(DependencyEdge {
                    from: dep.measure.clone(),
                    to: target.clone(),
                    kind: EdgeKind::Measure,
                });
            }
            for column in &dep.columns {
                edges.push(DependencyEdge {
                    from: dep.measure.clone(),
                    to: column.to_string(),
                    kind: EdgeKind::Column,
                });
            }
            for table in &dep.tables {
                edges.push(DependencyEdge {
                    from: dep.measure.clone(),
                    to: table.clone(),
                    kind: EdgeKind::Table,
                });
            }
        }
        edges
    }

    fn edges_of_kind(&self, kind: EdgeKind) -> usize {
        self.nodes
            .values()
            .map(|dep| match kind {
                EdgeKind::Measure => dep.measures.len(),
                EdgeKind::Column => dep.columns.len(),
                EdgeKind::Table => dep.tables.len(),
            })
            .sum()
    }

    pub fn is_root(&self, measure: &str) -> bool {
        self.get(measure).is_some_and(MeasureDependency::is_root)
    }

    pub fn is_leaf(&self, measure: &str) -> bool {
        self.get(measure).is_some_and(MeasureDependency::is_leaf)
    }

    /// Measures that reference no other measure
    pub fn roots(&self) -> Vec<&str> {
        self.nodes
            .values()
            .filter(|dep| dep.is_root())
            .map(|dep| dep.measure.as_str())
            .collect()
    }

    /// Measures no other measure references
    pub fn leaves(&self) -> Vec<&str> {
        self.nodes
            .values()
            .filter(|dep| dep.is_leaf())
            .map(|dep| dep.measure.as_str())
            .collect()
    }

    /// Measures not referenced by any other measure. Report-level usage is
    /// not visible to the model, so this is the leaf set.
    pub fn unused_measures(&self) -> Vec<&str> {
        self.leaves()
    }

    /// Ищет циклические зависимости (DFS со стеком рекурсии).
    /// Each back edge to a measure still on the stack reports the stack slice
    /// from that measure, so a measure taking part in several cycles is
    /// reported once per cycle.
    pub fn find_cycles(&self) -> Vec<DependencyCycle> {
        let mut cycles = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = Vec::new();

        for name in self.nodes.keys() {
            if !visited.contains(name.as_str()) {
                self.dfs_find_cycles(name, &mut visited, &mut stack, &mut cycles);
            }
        }
        cycles
    }

    fn dfs_find_cycles<'a>(
        &'a self,
        node: &'a str,
        visited: &mut HashSet<&'a str>,
        stack: &mut Vec<&'a str>,
        cycles: &mut Vec<DependencyCycle>,
    ) {
        visited.insert(node);
        stack.push(node);

        if let Some(dep) = self.nodes.get(node) {
            for neighbor in &dep.measures {
                let neighbor = neighbor.as_str();
                if let Some(start) = stack.iter().position(|n| *n == neighbor) {
                    cycles.push(DependencyCycle {
                        measures: stack[start..].iter().map(|s| s.to_string()).collect(),
                    });
                } else if !visited.contains(neighbor) {
                    self.dfs_find_cycles(neighbor, visited, stack, cycles);
                }
            }
        }

        stack.pop();
    }

    /// Вычисляет максимальную глубину зависимостей: длину самой длинной
    /// цепочки мер. Edges closing a cycle are not followed.
    pub fn max_depth(&self) -> usize {
        let mut memo: HashMap<&str, usize> = HashMap::new();
        let mut on_path: HashSet<&str> = HashSet::new();
        self.nodes
            .keys()
            .map(|start| self.longest_chain(start, &mut memo, &mut on_path))
            .max()
            .unwrap_or(0)
    }

    fn longest_chain<'a>(
        &'a self,
        node: &'a str,
        memo: &mut HashMap<&'a str, usize>,
        on_path: &mut HashSet<&'a str>,
    ) -> usize {
        if let Some(&depth) = memo.get(node) {
            return depth;
        }
        on_path.insert(node);

        let mut depth = 0;
        if let Some(dep) = self.nodes.get(node) {
            for neighbor in &dep.measures {
                if on_path.contains(neighbor.as_str()) {
                    continue;
                }
                depth = depth.max(1 + self.longest_chain(neighbor, memo, on_path));
            }
        }

        on_path.remove(node);
        memo.insert(node, depth);
        depth
    }

    /// Вычисляет статистику зависимостей
    pub fn statistics(&self) -> DependencyStatistics {
        let total_measures = self.len();
        let measure_edges = self.edges_of_kind(EdgeKind::Measure);
        let leaf_measures = self.leaves().len();

        DependencyStatistics {
            total_measures,
            measure_edges,
            column_edges: self.edges_of_kind(EdgeKind::Column),
            table_edges: self.edges_of_kind(EdgeKind::Table),
            root_measures: self.roots().len(),
            leaf_measures,
            unused_measures: leaf_measures,
            circular_dependencies: self.find_cycles().len(),
            max_depth: self.max_depth(),
            avg_measure_dependencies: if total_measures > 0 {
                measure_edges as f64 / total_measures as f64
            } else {
                0.0
            },
        }
    }
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Measure, Table};

    fn model(measures: &[(&str, &str)]) -> Model {
        let mut table = Table::new("Sales");
        for (name, expr) in measures {
            table.measures.push(Measure::new(*name, *expr));
        }
        Model::new("Model", vec![table], Vec::new())
    }

    #[test]
    fn test_measure_and_column_resolution() {
        let graph = DependencyGraph::build(&model(&[
            ("Total Sales", "SUM(Sales[Amount])"),
            ("Profit", "[total sales] - [Cost]"),
        ]));

        let profit = graph.get("Profit").unwrap();
        assert_eq!(profit.measures, vec!["Total Sales".to_string()]);
        assert_eq!(
            profit.columns,
            vec![ColumnRef {
                table: "Sales".to_string(),
                column: "Cost".to_string()
            }]
        );

        let total = graph.get("Total Sales").unwrap();
        assert_eq!(total.tables, vec!["Sales".to_string()]);
        assert_eq!(total.dependents, vec!["Profit".to_string()]);
        assert!(!total.is_leaf() && total.is_root());
    }

    #[test]
    fn test_three_measure_cycle() {
        let graph = DependencyGraph::build(&model(&[("A", "[B]"), ("B", "[C]"), ("C", "[A]")]));
        let cycles = graph.find_cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].measures, vec!["A", "B", "C"]);
        assert_eq!(cycles[0].to_string(), "A -> B -> C -> A");
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let graph = DependencyGraph::build(&model(&[("A", "[A] + 1")]));
        assert_eq!(graph.find_cycles().len(), 1);
    }

    #[test]
    fn test_statistics() {
        let graph = DependencyGraph::build(&model(&[
            ("Base", "SUM(Sales[Amount])"),
            ("Mid", "[Base] * 2"),
            ("Top", "[Mid] + [Base]"),
        ]));
        let stats = graph.statistics();
        assert_eq!(stats.total_measures, 3);
        assert_eq!(stats.measure_edges, 3);
        assert_eq!(stats.root_measures, 1);
        assert_eq!(stats.leaf_measures, 1);
        assert_eq!(stats.circular_dependencies, 0);
        assert_eq!(stats.max_depth, 2);
        assert_eq!(graph.unused_measures(), vec!["Top"]);
    }

    #[test]
    fn test_missing_measure_is_lookup_miss() {
        let graph = DependencyGraph::build(&model(&[("A", "1")]));
        assert!(matches!(
            graph.dependency("Nope"),
            Err(ModelError::MeasureNotFound(_))
        ));
    }
}
