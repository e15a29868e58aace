//! Purpose: Classify raw statement text into a coarse intent.
//! Exports: `Intent`, `classify`, `mentions_select`, `find_ignore_case`.
//! Role: Lexical stand-in for a statement parser; no grammar is checked.
//! Invariants: Matching is case-insensitive substring search (ASCII folding).
//! Notes: Non-ASCII characters never fold onto keywords (`ſELECT` is not `SELECT`),
//! unlike full Unicode case-insensitive matching.
//! Invariants: Priority is CREATE TABLE, then INSERT INTO, then SELECT.
//! Notes: Keywords inside string literals or comments still match.

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Intent {
    Create,
    Insert,
    Select,
    Other,
}

const CREATE_TABLE: &str = "CREATE TABLE";
const INSERT_INTO: &str = "INSERT INTO";
const SELECT: &str = "SELECT";

pub fn classify(query: &str) -> Intent {
    if find_ignore_case(query, CREATE_TABLE).is_some() {
        Intent::Create
    } else if find_ignore_case(query, INSERT_INTO).is_some() {
        Intent::Insert
    } else if mentions_select(query) {
        Intent::Select
    } else {
        Intent::Other
    }
}

/// `SELECT` check used on the query path, independent of the create/insert priority.
pub fn mentions_select(query: &str) -> bool {
    find_ignore_case(query, SELECT).is_some()
}

/// Byte offset of the first ASCII-case-insensitive match of `needle`.
///
/// `needle` must be ASCII, which keeps the returned offset on a char boundary.
pub fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    debug_assert!(needle.is_ascii());
    let hay = haystack.as_bytes();
    let pat = needle.as_bytes();
    if pat.is_empty() {
        return Some(0);
    }
    if hay.len() < pat.len() {
        return None;
    }
    hay.windows(pat.len())
        .position(|window| window.eq_ignore_ascii_case(pat))
}

#[cfg(test)]
mod tests {
    use super::{Intent, classify, find_ignore_case, mentions_select};

    #[test]
    fn classifies_by_keyword_in_any_case() {
        assert_eq!(classify("CREATE TABLE users (id INT)"), Intent::Create);
        assert_eq!(classify("create table users"), Intent::Create);
        assert_eq!(classify("Insert Into users VALUES (1)"), Intent::Insert);
        assert_eq!(classify("select * from users"), Intent::Select);
        assert_eq!(classify("DROP TABLE users"), Intent::Other);
    }

    #[test]
    fn empty_query_is_other() {
        assert_eq!(classify(""), Intent::Other);
        assert!(!mentions_select(""));
    }

    #[test]
    fn create_wins_over_insert_and_select() {
        assert_eq!(
            classify("CREATE TABLE t AS SELECT * FROM s"),
            Intent::Create
        );
        assert_eq!(
            classify("INSERT INTO t SELECT * FROM s"),
            Intent::Insert
        );
    }

    #[test]
    fn keywords_inside_literals_still_match() {
        assert_eq!(
            classify("UPDATE notes SET body = 'please create table later'"),
            Intent::Create
        );
        assert!(mentions_select("-- selected rows"));
    }

    #[test]
    fn non_ascii_lookalikes_do_not_fold_onto_keywords() {
        assert!(!mentions_select("\u{17f}ELECT * FROM t"));
        assert_eq!(classify("\u{17f}ELECT * FROM t"), Intent::Other);
        assert_eq!(classify("INSERT \u{131}NTO t VALUES (1)"), Intent::Other);
    }

    #[test]
    fn find_returns_byte_offset_after_multibyte_prefix() {
        let text = "é VALUES (1)";
        let offset = find_ignore_case(text, "values").expect("match");
        assert_eq!(&text[offset..offset + 6], "VALUES");
        assert_eq!(find_ignore_case("val", "VALUES"), None);
    }
}
