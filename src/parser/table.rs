/*!
# Table Parser

Parses the TMDL text of one table (`tables/<Name>.tmdl`) into a [`Table`].

The parser is an explicit state machine. [`Open`] holds the single child record
(measure, column or hierarchy) that is currently being filled; opening any other
record flushes it into the table, and [`TableParser::finish`] flushes it once more
at end of input so the last record is never lost. [`Mode`] tracks whether the
current line belongs to a multi-line expression or to a skipped block.

Unrecognized lines are ignored: newer model versions add properties all the time
and they must not abort parsing.
*/

use super::lines::{
    join_expression_lines, parse_flag, unquote_identifier, unquote_value, Keyword, Line,
    LineKind, FENCE,
};
use crate::model::{Annotation, Column, Hierarchy, Level, Measure, Table, Variation};

/// Parses the text of one table definition. Returns `None` when no `table`
/// declaration is present (empty and malformed input alike).
pub fn parse_table(text: &str) -> Option<Table> {
    let mut parser = TableParser::new();
    for raw in text.lines() {
        parser.feed(raw);
    }
    parser.finish()
}

/// Child record currently being filled
enum Open {
    Nothing,
    Measure(MeasureDraft),
    Column(ColumnDraft),
    Hierarchy(HierarchyDraft),
}

struct MeasureDraft {
    measure: Measure,
    depth: usize,
}

struct ColumnDraft {
    column: Column,
    depth: usize,
    variation: Option<(Variation, usize)>,
}

struct HierarchyDraft {
    hierarchy: Hierarchy,
    depth: usize,
    level: Option<(Level, usize)>,
}

impl Open {
    fn depth(&self) -> Option<usize> {
        match self {
            Open::Nothing => None,
            Open::Measure(d) => Some(d.depth),
            Open::Column(d) => Some(d.depth),
            Open::Hierarchy(d) => Some(d.depth),
        }
    }
}

/// How the next line is consumed
enum Mode {
    Scan,
    /// Inside a ``` fenced expression
    Fenced(Vec<String>),
    /// Unfenced expression: lines at `min_depth` or deeper
    Indented { min_depth: usize, lines: Vec<String> },
    /// Ignoring everything nested below an unparsed block header
    Skip { depth: usize },
}

/// Where a property or annotation line is applied
enum Target {
    Table,
    Child,
}

/// Line-by-line table parser
pub struct TableParser {
    table: Option<Table>,
    table_depth: usize,
    open: Open,
    mode: Mode,
    pending_doc: Vec<String>,
}

impl Default for TableParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TableParser {
    pub fn new() -> Self {
        Self {
            table: None,
            table_depth: 0,
            open: Open::Nothing,
            mode: Mode::Scan,
            pending_doc: Vec::new(),
        }
    }

    /// Consumes one raw line
    pub fn feed(&mut self, raw: &str) {
        let line = Line::parse(raw);

        match std::mem::replace(&mut self.mode, Mode::Scan) {
            Mode::Fenced(mut lines) => {
                if line.trimmed() == FENCE {
                    self.set_expression(join_expression_lines(&lines));
                } else {
                    lines.push(raw.to_string());
                    self.mode = Mode::Fenced(lines);
                }
                return;
            }
            Mode::Indented { min_depth, mut lines } => {
                if line.is_blank() || line.depth >= min_depth {
                    lines.push(raw.to_string());
                    self.mode = Mode::Indented { min_depth, lines };
                    return;
                }
                self.set_expression(join_expression_lines(&lines));
            }
            Mode::Skip { depth } => {
                if line.is_blank() || line.depth > depth {
                    self.mode = Mode::Skip { depth };
                    return;
                }
            }
            Mode::Scan => {}
        }

        self.scan(line);
    }

    /// Ends the input: closes any pending expression and flushes the open record
    pub fn finish(mut self) -> Option<Table> {
        match std::mem::replace(&mut self.mode, Mode::Scan) {
            Mode::Fenced(lines) => {
                tracing::debug!("Unterminated expression fence at end of table text");
                self.set_expression(join_expression_lines(&lines));
            }
            Mode::Indented { lines, .. } => self.set_expression(join_expression_lines(&lines)),
            Mode::Skip { .. } | Mode::Scan => {}
        }
        self.flush_open();

        if let Some(table) = &self.table {
            tracing::debug!(
                "Parsed table '{}': {} measures, {} columns, {} hierarchies",
                table.name,
                table.measures.len(),
                table.columns.len(),
                table.hierarchies.len()
            );
        }
        self.table
    }

    fn scan(&mut self, line: Line<'_>) {
        match line.kind {
            LineKind::Blank => return,
            LineKind::DocComment(text) => {
                self.pending_doc.push(text.to_string());
                return;
            }
            LineKind::Declaration {
                keyword,
                name,
                value,
            } => self.declare(keyword, name, value, line.depth),
            LineKind::Opaque(keyword) => self.open_opaque(keyword, line.depth),
            LineKind::Property { key, value } => self.property(key, value, line.depth),
            LineKind::Flag(flag) => self.property(flag, "", line.depth),
            LineKind::Other => tracing::trace!("Ignored line: {}", line.raw.trim()),
        }
        self.pending_doc.clear();
    }

    fn take_doc(&mut self) -> Option<String> {
        if self.pending_doc.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending_doc).join("\n"))
        }
    }

    fn declare(&mut self, keyword: Keyword, name: String, value: Option<String>, depth: usize) {
        if keyword == Keyword::Table {
            if self.table.is_none() {
                let mut table = Table::new(name);
                table.description = self.take_doc();
                self.table = Some(table);
                self.table_depth = depth;
            } else {
                tracing::debug!("Ignoring second table declaration '{}'", name);
            }
            return;
        }
        if self.table.is_none() {
            return;
        }

        match keyword {
            Keyword::Measure => {
                self.flush_open();
                let mut measure = Measure::new(name, "");
                measure.description = self.take_doc();
                self.open = Open::Measure(MeasureDraft { measure, depth });
                if let Some(expr) = self.begin_expression(value, depth) {
                    self.set_expression(expr);
                }
            }
            Keyword::Column => {
                self.flush_open();
                let mut column = Column::new(name);
                column.description = self.take_doc();
                self.open = Open::Column(ColumnDraft {
                    column,
                    depth,
                    variation: None,
                });
                if let Some(expr) = self.begin_expression(value, depth) {
                    self.set_expression(expr);
                }
            }
            Keyword::Hierarchy => {
                self.flush_open();
                self.open = Open::Hierarchy(HierarchyDraft {
                    hierarchy: Hierarchy {
                        name,
                        ..Hierarchy::default()
                    },
                    depth,
                    level: None,
                });
            }
            Keyword::Level => {
                if let Open::Hierarchy(draft) = &mut self.open {
                    if let Some((level, _)) = draft.level.take() {
                        draft.hierarchy.levels.push(level);
                    }
                    let level = Level {
                        name,
                        ..Level::default()
                    };
                    draft.level = Some((level, depth));
                }
            }
            Keyword::Variation => {
                if let Open::Column(draft) = &mut self.open {
                    let variation = Variation {
                        name,
                        ..Variation::default()
                    };
                    draft.variation = Some((variation, depth));
                }
            }
            Keyword::Annotation => {
                let value = value.map(|v| unquote_value(&v)).unwrap_or_default();
                self.annotation(Annotation { name, value }, depth);
            }
            Keyword::Model | Keyword::Table | Keyword::Relationship => {}
        }
    }

    /// Interprets the value after `=` of a measure or column declaration.
    /// Returns the expression when it is complete on the declaration line.
    fn begin_expression(&mut self, value: Option<String>, depth: usize) -> Option<String> {
        let value = value?;
        if let Some(after_fence) = value.strip_prefix(FENCE) {
            let inline = after_fence.trim_end();
            if let Some(body) = inline.strip_suffix(FENCE) {
                return Some(body.trim().to_string());
            }
            self.mode = Mode::Fenced(Vec::new());
            return None;
        }
        if value.is_empty() {
            self.mode = Mode::Indented {
                min_depth: depth + 2,
                lines: Vec::new(),
            };
            return None;
        }
        Some(value)
    }

    fn set_expression(&mut self, expression: String) {
        match &mut self.open {
            Open::Measure(draft) => draft.measure.expression = expression,
            Open::Column(draft) => draft.column.expression = Some(expression),
            Open::Hierarchy(_) | Open::Nothing => {}
        }
    }

    fn open_opaque(&mut self, keyword: &str, depth: usize) {
        let nested_in_child = self.open.depth().is_some_and(|child| depth > child);
        if !nested_in_child {
            self.flush_open();
        }
        tracing::trace!("Skipping {} block", keyword);
        self.mode = Mode::Skip { depth };
    }

    /// Decides whether a property line belongs to the table or to the open child.
    /// A line at the depth of the child's own declaration is a sibling of the child
    /// (unless the child is not indented below the table at all).
    fn route(&mut self, depth: usize) -> Target {
        match self.open.depth() {
            None => Target::Table,
            Some(child) if depth > child || child <= self.table_depth => Target::Child,
            Some(_) => {
                self.flush_open();
                Target::Table
            }
        }
    }

    fn property(&mut self, key: &str, value: &str, depth: usize) {
        if self.table.is_none() {
            return;
        }
        match self.route(depth) {
            Target::Table => {
                if let Some(table) = &mut self.table {
                    apply_table_property(table, key, value);
                }
            }
            Target::Child => match &mut self.open {
                Open::Measure(draft) => apply_measure_property(&mut draft.measure, key, value),
                Open::Column(draft) => match &mut draft.variation {
                    Some((variation, vdepth)) if depth > *vdepth || is_variation_key(key) => {
                        apply_variation_property(variation, key, value)
                    }
                    _ => apply_column_property(&mut draft.column, key, value),
                },
                Open::Hierarchy(draft) => match &mut draft.level {
                    Some((level, ldepth)) if depth > *ldepth || is_level_key(key) => {
                        apply_level_property(level, key, value)
                    }
                    _ => apply_hierarchy_property(&mut draft.hierarchy, key, value),
                },
                Open::Nothing => {}
            },
        }
    }

    fn annotation(&mut self, annotation: Annotation, depth: usize) {
        if self.table.is_none() {
            return;
        }
        match self.route(depth) {
            Target::Table => {
                if let Some(table) = &mut self.table {
                    table.annotations.push(annotation);
                }
            }
            Target::Child => match &mut self.open {
                Open::Measure(draft) => draft.measure.annotations.push(annotation),
                Open::Column(draft) => draft.column.annotations.push(annotation),
                Open::Hierarchy(_) | Open::Nothing => {}
            },
        }
    }

    /// Appends the open child record to the table
    fn flush_open(&mut self) {
        let open = std::mem::replace(&mut self.open, Open::Nothing);
        let Some(table) = &mut self.table else {
            return;
        };
        match open {
            Open::Nothing => {}
            Open::Measure(draft) => table.measures.push(draft.measure),
            Open::Column(mut draft) => {
                draft.column.variation = draft.variation.map(|(v, _)| v);
                table.columns.push(draft.column);
            }
            Open::Hierarchy(mut draft) => {
                if let Some((level, _)) = draft.level {
                    draft.hierarchy.levels.push(level);
                }
                table.hierarchies.push(draft.hierarchy);
            }
        }
    }
}

fn is_variation_key(key: &str) -> bool {
    matches!(key, "isDefault" | "relationship" | "defaultHierarchy")
}

fn is_level_key(key: &str) -> bool {
    matches!(key, "column" | "ordinal")
}

fn set_flag(target: &mut bool, value: &str) {
    if let Some(flag) = parse_flag(value) {
        *target = flag;
    }
}

fn apply_table_property(table: &mut Table, key: &str, value: &str) {
    match key {
        "lineageTag" => table.lineage_tag = Some(unquote_value(value)),
        "isHidden" => set_flag(&mut table.is_hidden, value),
        "description" => table.description = Some(unquote_value(value)),
        _ => {}
    }
}

fn apply_measure_property(measure: &mut Measure, key: &str, value: &str) {
    match key {
        "formatString" => measure.format_string = Some(unquote_value(value)),
        "displayFolder" => measure.display_folder = Some(unquote_value(value)),
        "description" => measure.description = Some(unquote_value(value)),
        "isHidden" => set_flag(&mut measure.is_hidden, value),
        "dataCategory" => measure.data_category = Some(unquote_value(value)),
        "lineageTag" => measure.lineage_tag = Some(unquote_value(value)),
        _ => {}
    }
}

fn apply_column_property(column: &mut Column, key: &str, value: &str) {
    match key {
        "dataType" => column.data_type = unquote_value(value),
        "sourceColumn" => column.source_column = Some(unquote_value(value)),
        "isHidden" => set_flag(&mut column.is_hidden, value),
        "formatString" => column.format_string = Some(unquote_value(value)),
        "dataCategory" => column.data_category = Some(unquote_value(value)),
        "summarizeBy" => column.summarize_by = Some(unquote_value(value)),
        "sortByColumn" => column.sort_by_column = Some(unquote_identifier(value)),
        "displayFolder" => column.display_folder = Some(unquote_value(value)),
        "lineageTag" => column.lineage_tag = Some(unquote_value(value)),
        "description" => column.description = Some(unquote_value(value)),
        _ => {}
    }
}

fn apply_variation_property(variation: &mut Variation, key: &str, value: &str) {
    match key {
        "isDefault" => set_flag(&mut variation.is_default, value),
        "relationship" => variation.relationship = Some(unquote_value(value)),
        "defaultHierarchy" => variation.default_hierarchy = Some(value.trim().to_string()),
        _ => {}
    }
}

fn apply_hierarchy_property(hierarchy: &mut Hierarchy, key: &str, value: &str) {
    match key {
        "lineageTag" => hierarchy.lineage_tag = Some(unquote_value(value)),
        "isHidden" => set_flag(&mut hierarchy.is_hidden, value),
        "displayFolder" => hierarchy.display_folder = Some(unquote_value(value)),
        _ => {}
    }
}

fn apply_level_property(level: &mut Level, key: &str, value: &str) {
    match key {
        "lineageTag" => level.lineage_tag = Some(unquote_value(value)),
        "column" => level.column = Some(unquote_identifier(value)),
        "ordinal" => level.ordinal = value.trim().parse().ok(),
        _ => {}
    }
}
