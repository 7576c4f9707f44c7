use std::collections::HashSet;

use crate::{Category, Result};

// Helper method for parsing comma-separated category lists
pub fn parse_categories(categories: Option<String>) -> Result<HashSet<Category>> {
    categories
        .map(|c| {
            c.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::parse::<Category>)
                .collect()
        })
        .unwrap_or_else(|| Ok(HashSet::new()))
}

/// Maps an optional CLI value onto a patch field: absent keeps the stored
/// value, an empty string clears it.
pub fn optional_field(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Empty strings become `None`.
pub fn non_empty(value: Option<String>) -> Option<String> {
    optional_field(value).flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_category_lists() {
        let parsed = parse_categories(Some("vehicles, computing,,".to_string())).unwrap();
        assert_eq!(
            parsed,
            HashSet::from([Category::Vehicles, Category::Computing])
        );
        assert!(parse_categories(None).unwrap().is_empty());
        assert!(parse_categories(Some("vehicles,boats".to_string())).is_err());
    }

    #[test]
    fn optional_fields() {
        assert_eq!(optional_field(None), None);
        assert_eq!(optional_field(Some(" ".to_string())), Some(None));
        assert_eq!(
            optional_field(Some(" hi ".to_string())),
            Some(Some("hi".to_string()))
        );
        assert_eq!(non_empty(Some(String::new())), None);
    }
}
