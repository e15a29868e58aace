//! Purpose: Pull a `{id, name, email}` row out of an INSERT statement's VALUES clause.
//! Exports: `extract_row`, `DEFAULT_NAME`, `DEFAULT_EMAIL`.
//! Role: Naive positional extractor paired with the lexical classifier.
//! Invariants: Assumes a fixed `(id, name, email)` column shape; never errors.
//! Invariants: The literal id in the statement is ignored; id = store length + 1.
//! Invariants: Surrounding `(`/`)` and `'`/`'` are removed only as matched pairs.
use super::classify::find_ignore_case;
use super::row::Row;

pub const DEFAULT_NAME: &str = "Unknown";
pub const DEFAULT_EMAIL: &str = "unknown@example.com";

const VALUES: &str = "VALUES";

pub fn extract_row(query: &str, store_len: usize) -> Option<Row> {
    let start = find_ignore_case(query, VALUES)?;
    let tail = query[start + VALUES.len()..].trim();
    let tuple = remove_surrounding(tail, "(", ")");
    let fields: Vec<&str> = tuple.split(',').collect();

    let name = positional_field(&fields, 1).unwrap_or(DEFAULT_NAME);
    let email = positional_field(&fields, 2).unwrap_or(DEFAULT_EMAIL);
    let id = i64::try_from(store_len).ok()?.checked_add(1)?;
    Some(Row::user(id, name, email))
}

fn positional_field<'a>(fields: &[&'a str], index: usize) -> Option<&'a str> {
    fields
        .get(index)
        .map(|field| remove_surrounding(field.trim(), "'", "'"))
}

fn remove_surrounding<'a>(text: &'a str, prefix: &str, suffix: &str) -> &'a str {
    if text.len() >= prefix.len() + suffix.len() && text.starts_with(prefix) && text.ends_with(suffix)
    {
        &text[prefix.len()..text.len() - suffix.len()]
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_EMAIL, DEFAULT_NAME, extract_row, remove_surrounding};
    use crate::core::row::{FieldValue, Row};

    fn text(row: &Row, key: &str) -> String {
        match row.get(key) {
            Some(FieldValue::Text(value)) => value.clone(),
            other => panic!("expected text for {key}, got {other:?}"),
        }
    }

    #[test]
    fn extracts_name_and_email_with_quotes_stripped() {
        let row = extract_row(
            "INSERT INTO users (id, name, email) VALUES (1, 'Ada', 'ada@example.com')",
            0,
        )
        .expect("row");
        assert_eq!(row.get("id"), Some(&FieldValue::Integer(1)));
        assert_eq!(text(&row, "name"), "Ada");
        assert_eq!(text(&row, "email"), "ada@example.com");
    }

    #[test]
    fn id_follows_store_length_not_literal() {
        let row = extract_row("insert into users values (99, 'B', 'C')", 4).expect("row");
        assert_eq!(row.get("id"), Some(&FieldValue::Integer(5)));
    }

    #[test]
    fn missing_values_keyword_yields_none() {
        assert_eq!(extract_row("INSERT INTO users SELECT * FROM staging", 0), None);
        assert_eq!(extract_row("", 0), None);
    }

    #[test]
    fn short_tuples_fall_back_to_defaults() {
        let row = extract_row("INSERT INTO users VALUES (1)", 0).expect("row");
        assert_eq!(text(&row, "name"), DEFAULT_NAME);
        assert_eq!(text(&row, "email"), DEFAULT_EMAIL);

        let row = extract_row("INSERT INTO users VALUES (1, 'Only Name')", 0).expect("row");
        assert_eq!(text(&row, "name"), "Only Name");
        assert_eq!(text(&row, "email"), DEFAULT_EMAIL);
    }

    #[test]
    fn trailing_semicolon_keeps_parentheses_and_quote() {
        let row = extract_row("INSERT INTO users VALUES (1, 'A', 'B');", 0).expect("row");
        assert_eq!(text(&row, "name"), "A");
        assert_eq!(text(&row, "email"), "'B');");
    }

    #[test]
    fn empty_positional_field_is_kept_as_empty_string() {
        let row = extract_row("INSERT INTO users VALUES (1, , 'x@y')", 0).expect("row");
        assert_eq!(text(&row, "name"), "");
        assert_eq!(text(&row, "email"), "x@y");
    }

    #[test]
    fn remove_surrounding_requires_both_ends() {
        assert_eq!(remove_surrounding("(a)", "(", ")"), "a");
        assert_eq!(remove_surrounding("(a", "(", ")"), "(a");
        assert_eq!(remove_surrounding("'", "'", "'"), "'");
        assert_eq!(remove_surrounding("''", "'", "'"), "");
    }
}
