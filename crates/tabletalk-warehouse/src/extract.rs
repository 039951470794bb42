// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tolerant extraction of SQL from model completions.

const OPEN_TAG: &str = "<sql>";
const CLOSE_TAG: &str = "</sql>";

/// Extracts the SQL payload from a completion.
///
/// The payload is the text between `<sql>` and `</sql>`. A missing closing
/// tag does not fail: the remainder of the text after the opening tag is the
/// payload. Without an opening tag the whole completion is the payload.
/// Backslashes the model introduces to escape identifiers are stripped
/// unconditionally, and the result is trimmed.
pub fn extract_sql(completion: &str) -> String {
    let payload = match completion.find(OPEN_TAG) {
        Some(start) => {
            let rest = &completion[start + OPEN_TAG.len()..];
            match rest.find(CLOSE_TAG) {
                Some(end) => &rest[..end],
                None => rest,
            }
        }
        None => completion,
    };
    payload.replace('\\', "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_between_tags() {
        let text = "Here you go:\n<sql>\nSELECT * FROM t\n</sql>\nDone.";
        assert_eq!(extract_sql(text), "SELECT * FROM t");
    }

    #[test]
    fn missing_close_tag_takes_remainder() {
        let text = "<sql>SELECT count(*) FROM orders";
        assert_eq!(extract_sql(text), "SELECT count(*) FROM orders");
    }

    #[test]
    fn missing_open_tag_takes_whole_text() {
        assert_eq!(extract_sql("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn strips_backslashes_unconditionally() {
        let text = "<sql>SELECT \\\"total\\_paid\\\" FROM sales</sql>";
        assert_eq!(extract_sql(text), "SELECT \"total_paid\" FROM sales");
    }

    #[test]
    fn uses_first_open_tag() {
        let text = "<sql>SELECT 1</sql> ignored <sql>SELECT 2</sql>";
        assert_eq!(extract_sql(text), "SELECT 1");
    }
}
