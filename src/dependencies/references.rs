/*!
# Formula Reference Scanner

Lexical extraction of object references from DAX formula text:

- `[Name]` - measure, or a column of the owning table
- `Table[Column]` / `'Table Name'[Column]` - table-qualified column
- `'Table Name'` on its own - table (e.g. `ALL('Date')`)

String literals and comments (`//`, `--`, `/* */`) are blanked before scanning,
so brackets inside them never produce references.
*/

use once_cell::sync::Lazy;
use regex::Regex;

static BRACKET_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]").expect("bracket pattern is valid"));

static QUALIFIED_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:'((?:[^']|'')+)'|([\p{L}_][\p{L}\p{N}_]*))\[([^\]]+)\]")
        .expect("qualified reference pattern is valid")
});

static QUOTED_TABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'((?:[^']|'')+)'").expect("quoted table pattern is valid"));

/// References found in one formula, deduplicated, in order of first occurrence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormulaReferences {
    /// Unqualified `[Name]` references
    pub brackets: Vec<String>,
    /// `(table, column)` pairs
    pub qualified: Vec<(String, String)>,
    /// Quoted table names not followed by a column
    pub standalone_tables: Vec<String>,
}

impl FormulaReferences {
    pub fn is_empty(&self) -> bool {
        self.brackets.is_empty() && self.qualified.is_empty() && self.standalone_tables.is_empty()
    }

    /// Distinct table names, in order of first occurrence (qualified first)
    pub fn tables(&self) -> Vec<&str> {
        let mut tables: Vec<&str> = Vec::new();
        let names = self
            .qualified
            .iter()
            .map(|(table, _)| table.as_str())
            .chain(self.standalone_tables.iter().map(String::as_str));
        for table in names {
            if !tables.contains(&table) {
                tables.push(table);
            }
        }
        tables
    }
}

/// Scans a formula for references
pub fn scan_references(formula: &str) -> FormulaReferences {
    let code = strip_comments_and_strings(formula);
    // same byte offsets as `code`, names inside brackets blanked
    let masked = mask_bracket_names(&code);
    let mut refs = FormulaReferences::default();

    for caps in QUALIFIED_REF.captures_iter(&masked) {
        let table = match (caps.get(1), caps.get(2)) {
            (Some(quoted), _) => quoted.as_str().replace("''", "'"),
            (None, Some(plain)) => plain.as_str().to_string(),
            (None, None) => continue,
        };
        let Some(column) = caps.get(3) else {
            continue;
        };
        let pair = (table, code[column.range()].trim().to_string());
        if !refs.qualified.contains(&pair) {
            refs.qualified.push(pair);
        }
    }

    for caps in QUOTED_TABLE.captures_iter(&masked) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if masked[whole.end()..].starts_with('[') {
            continue;
        }
        let table = name.as_str().replace("''", "'");
        if !refs.standalone_tables.contains(&table) {
            refs.standalone_tables.push(table);
        }
    }

    for m in BRACKET_REF.find_iter(&masked) {
        if is_qualified(&masked, m.start()) {
            continue;
        }
        let name = code[m.start() + 1..m.end() - 1].trim().to_string();
        if !name.is_empty() && !refs.brackets.contains(&name) {
            refs.brackets.push(name);
        }
    }

    refs
}

/// A bracket directly preceded by a table identifier or a quoted table name
fn is_qualified(code: &str, bracket_start: usize) -> bool {
    code[..bracket_start]
        .chars()
        .next_back()
        .is_some_and(|c| c == '\'' || c == '_' || c.is_alphanumeric())
}

/// Replaces every character between `[` and `]` with spaces of the same byte
/// length. Quoted table names are copied as is, so offsets into the result
/// are valid offsets into the input. Expects stripped text.
pub fn mask_bracket_names(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    let mut chars = code.chars().peekable();

    while let Some(c) = chars.next() {
        out.push(c);
        match c {
            '[' => {
                for n in chars.by_ref() {
                    if n == ']' {
                        out.push(n);
                        break;
                    }
                    out.extend(std::iter::repeat(' ').take(n.len_utf8()));
                }
            }
            '\'' => {
                while let Some(n) = chars.next() {
                    out.push(n);
                    if n == '\'' {
                        if chars.peek() == Some(&'\'') {
                            if let Some(escaped) = chars.next() {
                                out.push(escaped);
                            }
                        } else {
                            break;
                        }
                    }
                }
            }
            _ => {}
        }
    }
    out
}

/// Replaces string literals with `""` and comments with a single space.
/// Bracketed names and quoted table names are copied untouched.
pub fn strip_comments_and_strings(formula: &str) -> String {
    let mut out = String::with_capacity(formula.len());
    let mut chars = formula.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                // "" inside a literal is an escaped quote
                while let Some(n) = chars.next() {
                    if n == '"' {
                        if chars.peek() == Some(&'"') {
                            chars.next();
                        } else {
                            break;
                        }
                    }
                }
                out.push_str("\"\"");
            }
            '[' => {
                out.push(c);
                for n in chars.by_ref() {
                    out.push(n);
                    if n == ']' {
                        break;
                    }
                }
            }
            '\'' => {
                out.push(c);
                while let Some(n) = chars.next() {
                    out.push(n);
                    if n == '\'' {
                        if chars.peek() == Some(&'\'') {
                            if let Some(escaped) = chars.next() {
                                out.push(escaped);
                            }
                        } else {
                            break;
                        }
                    }
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                skip_line(&mut chars);
                out.push(' ');
            }
            '-' if chars.peek() == Some(&'-') => {
                skip_line(&mut chars);
                out.push(' ');
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for n in chars.by_ref() {
                    if prev == '*' && n == '/' {
                        break;
                    }
                    prev = n;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

fn skip_line(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while let Some(&n) = chars.peek() {
        if n == '\n' {
            break;
        }
        chars.next();
    }
}

/// True when the formula contains a numeric or string constant outside comments
pub fn has_literal(formula: &str) -> bool {
    let code = strip_comments_and_strings(formula);
    if code.contains("\"\"") {
        return true;
    }
    // digits that are not part of an identifier or an object name
    let mut in_bracket = false;
    let mut in_quote = false;
    let mut prev = ' ';
    for c in code.chars() {
        match c {
            '[' if !in_quote => in_bracket = true,
            ']' if !in_quote => in_bracket = false,
            '\'' if !in_bracket => in_quote = !in_quote,
            _ if !in_bracket
                && !in_quote
                && c.is_ascii_digit()
                && !(prev.is_alphanumeric() || prev == '_') =>
            {
                return true;
            }
            _ => {}
        }
        prev = c;
    }
    let upper = code.to_uppercase();
    upper.contains("TRUE()") || upper.contains("FALSE()") || upper.contains("BLANK()")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracket_and_qualified_references() {
        let refs = scan_references("DIVIDE([Profit], SUM('Sales Data'[Amount])) + Sales[Qty] + [Profit]");
        assert_eq!(refs.brackets, vec!["Profit".to_string()]);
        assert_eq!(
            refs.qualified,
            vec![
                ("Sales Data".to_string(), "Amount".to_string()),
                ("Sales".to_string(), "Qty".to_string())
            ]
        );
        assert_eq!(refs.tables(), vec!["Sales Data", "Sales"]);
    }

    #[test]
    fn test_standalone_quoted_table() {
        let refs = scan_references("CALCULATE([Total], ALL('Date'), 'Date'[Year] = 2024)");
        assert_eq!(refs.standalone_tables, vec!["Date".to_string()]);
        assert_eq!(refs.tables(), vec!["Date"]);
        assert!(scan_references("[Customer's Name]").standalone_tables.is_empty());
    }

    #[test]
    fn test_apostrophe_inside_bracket_name() {
        let refs = scan_references("[Bob's Sales] + COUNTROWS('Date') + [Ann's]");
        assert_eq!(refs.brackets, vec!["Bob's Sales".to_string(), "Ann's".to_string()]);
        assert_eq!(refs.standalone_tables, vec!["Date".to_string()]);

        let refs = scan_references("[Bob's Sales] - SUM('Sales Data'[Amount's Net])");
        assert_eq!(
            refs.qualified,
            vec![("Sales Data".to_string(), "Amount's Net".to_string())]
        );
    }

    #[test]
    fn test_mask_bracket_names_keeps_offsets() {
        assert_eq!(mask_bracket_names("[Bob's] + 'It''s'[X]"), "[     ] + 'It''s'[ ]");
        let masked = mask_bracket_names("[Größe] + 1");
        assert_eq!(masked.len(), "[Größe] + 1".len());
        assert!(masked.ends_with("] + 1"));
    }

    #[test]
    fn test_comments_and_strings_are_ignored() {
        let formula = "// uses [Old Measure]\n[New] & \"[Not A Ref]\" /* [Hidden] */ -- [Tail]";
        let refs = scan_references(formula);
        assert_eq!(refs.brackets, vec!["New".to_string()]);
        assert!(refs.qualified.is_empty());
    }

    #[test]
    fn test_strip_keeps_brackets_with_comment_markers() {
        assert_eq!(strip_comments_and_strings("[A--B] - 1"), "[A--B] - 1");
        assert_eq!(strip_comments_and_strings("\"a\"\"b\" & x"), "\"\" & x");
        assert_eq!(strip_comments_and_strings("'It''s'[X]"), "'It''s'[X]");
    }

    #[test]
    fn test_has_literal() {
        assert!(has_literal("[Sales] * 1.1"));
        assert!(has_literal("\"n/a\""));
        assert!(has_literal("BLANK()"));
        assert!(!has_literal("[Sales 2024] + Sales[Q1]"));
        assert!(!has_literal("COUNTROWS('FY 2024')"));
        assert!(!has_literal("SUM(Sales[Amount])"));
    }
}
