/*!
# Line Classification for TMDL Text

TMDL is line oriented: every non-blank line is a declaration (`measure Name = ...`),
a property (`key: value`), a standalone flag (`isHidden`) or a `///` doc comment.
This module turns a raw line into a [`Line`] with its indentation depth so that the
table and relationship state machines only deal with already-classified input.
*/

/// Number of spaces counted as one indentation unit when tabs are not used
pub const SPACES_PER_INDENT: usize = 4;

/// Fence marking a multi-line expression block
pub const FENCE: &str = "```";

/// Declaration keywords the parsers understand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Model,
    Table,
    Measure,
    Column,
    Hierarchy,
    Level,
    Variation,
    Annotation,
    Relationship,
}

impl Keyword {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "model" => Some(Keyword::Model),
            "table" => Some(Keyword::Table),
            "measure" => Some(Keyword::Measure),
            "column" => Some(Keyword::Column),
            "hierarchy" => Some(Keyword::Hierarchy),
            "level" => Some(Keyword::Level),
            "variation" => Some(Keyword::Variation),
            "annotation" => Some(Keyword::Annotation),
            "relationship" => Some(Keyword::Relationship),
            _ => None,
        }
    }
}

/// Block keywords recognized but never parsed. Everything nested below them is skipped.
pub const OPAQUE_BLOCKS: &[&str] = &[
    "partition",
    "calculationGroup",
    "calculationItem",
    "perspective",
    "perspectiveTable",
    "role",
    "tablePermission",
    "culture",
    "linguisticMetadata",
    "expression",
    "formatStringDefinition",
    "detailRowsDefinition",
    "extendedProperty",
    "changedProperty",
    "alternateOf",
    "refreshPolicy",
    "queryGroup",
    "dataAccessOptions",
];

/// Classified content of one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    /// `/// text`
    DocComment(&'a str),
    /// `keyword name [= value]`
    Declaration {
        keyword: Keyword,
        name: String,
        value: Option<String>,
    },
    /// Block that is recognized but not parsed (`partition X = m`)
    Opaque(&'a str),
    /// `key: value`
    Property { key: &'a str, value: &'a str },
    /// Standalone boolean flag such as `isHidden`
    Flag(&'a str),
    Other,
}

/// One line of input with its indentation depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<'a> {
    pub raw: &'a str,
    pub depth: usize,
    pub kind: LineKind<'a>,
}

impl<'a> Line<'a> {
    pub fn parse(raw: &'a str) -> Self {
        Self {
            raw,
            depth: indent_depth(raw),
            kind: classify(raw.trim()),
        }
    }

    pub fn trimmed(&self) -> &'a str {
        self.raw.trim()
    }

    pub fn is_blank(&self) -> bool {
        matches!(self.kind, LineKind::Blank)
    }
}

/// Counts indentation units at line start: each tab is one unit, every
/// [`SPACES_PER_INDENT`] spaces are one unit.
pub fn indent_depth(line: &str) -> usize {
    let mut depth = 0;
    let mut spaces = 0;
    for ch in line.chars() {
        match ch {
            '\t' => {
                depth += 1;
                spaces = 0;
            }
            ' ' => {
                spaces += 1;
                if spaces == SPACES_PER_INDENT {
                    depth += 1;
                    spaces = 0;
                }
            }
            _ => break,
        }
    }
    depth
}

fn classify(trimmed: &str) -> LineKind<'_> {
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if let Some(doc) = trimmed.strip_prefix("///") {
        return LineKind::DocComment(doc.trim());
    }

    let (head, rest) = match trimmed.find(char::is_whitespace) {
        Some(pos) => (&trimmed[..pos], trimmed[pos..].trim_start()),
        None => (trimmed, ""),
    };

    if let Some(keyword) = Keyword::from_token(head) {
        if !rest.is_empty() && !rest.starts_with(':') {
            let (name, value) = split_declaration(rest);
            return LineKind::Declaration {
                keyword,
                name,
                value,
            };
        }
    }

    if OPAQUE_BLOCKS.contains(&head) && !rest.starts_with(':') {
        return LineKind::Opaque(head);
    }

    if let Some((key, value)) = split_property(trimmed) {
        return LineKind::Property { key, value };
    }

    if is_identifier(trimmed) {
        return LineKind::Flag(trimmed);
    }

    LineKind::Other
}

fn split_property(trimmed: &str) -> Option<(&str, &str)> {
    let colon = trimmed.find(':')?;
    let key = trimmed[..colon].trim_end();
    if !is_identifier(key) {
        return None;
    }
    Some((key, trimmed[colon + 1..].trim()))
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Splits `Name = value` / `'Quoted Name' = value` into the unquoted name and the value.
/// The value is `None` when no `=` follows the name and `Some("")` when it is empty.
pub fn split_declaration(rest: &str) -> (String, Option<String>) {
    let rest = rest.trim();
    if rest.starts_with('\'') {
        if let Some(end) = closing_quote(rest) {
            let name = rest[1..end].replace("''", "'");
            let remainder = rest[end + 1..].trim_start();
            let value = remainder
                .strip_prefix('=')
                .map(|v| v.trim().to_string());
            return (name, value);
        }
    }

    match rest.find('=') {
        Some(eq) => (
            rest[..eq].trim().to_string(),
            Some(rest[eq + 1..].trim().to_string()),
        ),
        None => (rest.to_string(), None),
    }
}

/// Byte index of the quote closing a `'...'` identifier that starts at index 0
fn closing_quote(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Removes one pair of surrounding single quotes from an identifier (`'Sales Data'`)
pub fn unquote_identifier(text: &str) -> String {
    let text = text.trim();
    if text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') {
        text[1..text.len() - 1].replace("''", "'")
    } else {
        text.to_string()
    }
}

/// Removes one pair of surrounding double or single quotes from a property value
pub fn unquote_value(text: &str) -> String {
    let text = text.trim();
    if text.len() >= 2
        && ((text.starts_with('"') && text.ends_with('"'))
            || (text.starts_with('\'') && text.ends_with('\'')))
    {
        text[1..text.len() - 1].to_string()
    } else {
        text.to_string()
    }
}

/// Parses a boolean property value; a bare flag counts as `true`
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Joins accumulated expression lines: strips the common leading indentation of
/// non-blank lines, joins with newlines and trims the outer whitespace.
pub fn join_expression_lines(lines: &[String]) -> String {
    let common = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|l| {
            if l.trim().is_empty() {
                ""
            } else if l.is_char_boundary(common) {
                &l[common..]
            } else {
                l.trim_start()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
