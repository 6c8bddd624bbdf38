//! Top-level `model.tmdl` declaration. Only the display name is recovered.

use super::lines::{Keyword, Line, LineKind};

/// Returns the name from the first `model <Name>` line, if any
pub fn parse_model_name(text: &str) -> Option<String> {
    text.lines().find_map(|raw| match Line::parse(raw).kind {
        LineKind::Declaration {
            keyword: Keyword::Model,
            name,
            ..
        } if !name.is_empty() => Some(name),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_name() {
        let text = "model Model\n\tculture: en-US\n\tdefaultPowerBIDataSourceVersion: powerBI_V3\n";
        assert_eq!(parse_model_name(text).as_deref(), Some("Model"));
        assert_eq!(
            parse_model_name("/// doc\nmodel 'Sales Analysis'").as_deref(),
            Some("Sales Analysis")
        );
        assert_eq!(parse_model_name("culture: en-US"), None);
        assert_eq!(parse_model_name(""), None);
    }
}
