//! Hierarchical category label parsing.
//!
//! Sources describe categories as labels like
//! `"Dining and Drinking > Restaurant > American Restaurant"`, sometimes as a
//! single string, sometimes as a list of such labels (a Postgres `text[]`, a
//! JSON array, or a `;`/`|`-delimited string). Only the first label is used:
//! its top segment becomes the category and its last segment the subcategory.

/// Category reported when a record has no usable label.
pub const DEFAULT_CATEGORY: &str = "Place";

const SEGMENT_DELIMITER: char = '>';
const LIST_DELIMITERS: &[char] = &[';', '|'];

/// Result of parsing a raw category label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCategory {
    /// Top segment of the first label; never empty.
    pub category: String,
    /// Last segment of the first label, present only with two or more segments.
    pub subcategory: Option<String>,
}

impl Default for ParsedCategory {
    fn default() -> Self {
        Self {
            category: DEFAULT_CATEGORY.to_string(),
            subcategory: None,
        }
    }
}

/// Parses a category from a single text value.
///
/// Accepts a plain label, a `;`/`|`-delimited list of labels, or the textual
/// form of an array (`{"A > B","C"}` or `["A > B", "C"]`). Commas are not
/// treated as list separators outside of array syntax because real labels
/// contain them (`"Cafe, Coffee, and Tea House"`).
#[must_use]
pub fn parse_category_text(raw: Option<&str>) -> ParsedCategory {
    raw.and_then(first_label_in_text)
        .map(|label| parse_label(&label))
        .unwrap_or_default()
}

/// Parses a category from a list of labels, using the first non-blank one.
#[must_use]
pub fn parse_category_list<S: AsRef<str>>(labels: &[S]) -> ParsedCategory {
    labels
        .iter()
        .map(|l| l.as_ref().trim())
        .find(|l| !l.is_empty())
        .map(parse_label)
        .unwrap_or_default()
}

fn parse_label(label: &str) -> ParsedCategory {
    let segments: Vec<&str> = label
        .split(SEGMENT_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    match segments.as_slice() {
        [] => ParsedCategory::default(),
        [only] => ParsedCategory {
            category: (*only).to_string(),
            subcategory: None,
        },
        [first, .., last] => ParsedCategory {
            category: (*first).to_string(),
            subcategory: Some((*last).to_string()),
        },
    }
}

fn first_label_in_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let array_body = trimmed
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .or_else(|| trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')));

    if let Some(body) = array_body {
        return split_array_body(body)
            .into_iter()
            .find(|item| !item.trim().is_empty());
    }

    trimmed
        .split(LIST_DELIMITERS)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

/// Splits the inside of an array literal on commas that sit outside double
/// quotes, unquoting and unescaping each element.
fn split_array_body(body: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for ch in body.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                items.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    items.push(current);

    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.eq_ignore_ascii_case("null"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_three_level_label() {
        let parsed =
            parse_category_text(Some("Dining and Drinking > Restaurant > American Restaurant"));
        assert_eq!(parsed.category, "Dining and Drinking");
        assert_eq!(parsed.subcategory.as_deref(), Some("American Restaurant"));
    }

    #[test]
    fn single_segment_has_no_subcategory() {
        let parsed = parse_category_text(Some("  Retail  "));
        assert_eq!(parsed.category, "Retail");
        assert_eq!(parsed.subcategory, None);
    }

    #[test]
    fn empty_and_missing_labels_use_default() {
        assert_eq!(parse_category_text(None), ParsedCategory::default());
        assert_eq!(parse_category_text(Some("")), ParsedCategory::default());
        assert_eq!(parse_category_text(Some("   ")), ParsedCategory::default());
        assert_eq!(parse_category_text(Some(" > > ")).category, DEFAULT_CATEGORY);
        assert_eq!(parse_category_text(Some("{}")).category, DEFAULT_CATEGORY);
    }

    #[test]
    fn keeps_commas_inside_a_plain_label() {
        let parsed = parse_category_text(Some(
            "Dining and Drinking > Cafe, Coffee, and Tea House",
        ));
        assert_eq!(parsed.category, "Dining and Drinking");
        assert_eq!(
            parsed.subcategory.as_deref(),
            Some("Cafe, Coffee, and Tea House")
        );
    }

    #[test]
    fn takes_first_label_of_semicolon_list() {
        let parsed = parse_category_text(Some("Retail > Bookstore; Arts and Entertainment"));
        assert_eq!(parsed.category, "Retail");
        assert_eq!(parsed.subcategory.as_deref(), Some("Bookstore"));
    }

    #[test]
    fn parses_postgres_array_literal() {
        let parsed = parse_category_text(Some(
            r#"{"Dining and Drinking > Cafe, Coffee, and Tea House","Retail > Bakery"}"#,
        ));
        assert_eq!(parsed.category, "Dining and Drinking");
        assert_eq!(
            parsed.subcategory.as_deref(),
            Some("Cafe, Coffee, and Tea House")
        );
    }

    #[test]
    fn parses_json_array_text() {
        let parsed = parse_category_text(Some(r#"["", "Sports and Recreation > Gym"]"#));
        assert_eq!(parsed.category, "Sports and Recreation");
        assert_eq!(parsed.subcategory.as_deref(), Some("Gym"));
    }

    #[test]
    fn list_input_skips_blank_entries() {
        let labels = vec![
            String::new(),
            "Travel and Transportation > Lodging > Hotel".to_string(),
        ];
        let parsed = parse_category_list(&labels);
        assert_eq!(parsed.category, "Travel and Transportation");
        assert_eq!(parsed.subcategory.as_deref(), Some("Hotel"));
    }

    #[test]
    fn empty_list_uses_default() {
        let labels: Vec<String> = Vec::new();
        assert_eq!(parse_category_list(&labels), ParsedCategory::default());
    }
}
