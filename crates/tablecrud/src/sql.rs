//! SQL text helpers: positional placeholders and keyword detection.
//!
//! Statements are assembled with `?` placeholders. Connections that number
//! their parameters (`$1, $2, ...`) get the text rewritten before it is
//! compiled. Placeholders inside quoted literals (including Postgres `E'...'`
//! escape strings and `$tag$...$tag$` dollar quoting), quoted identifiers and
//! comments are left alone. Any other `?`, such as the jsonb `?` operator, is a
//! placeholder.

/// How a connection spells positional parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceholderStyle {
    /// `?` for every parameter (MySQL, SQLite).
    #[default]
    Question,
    /// `$1, $2, ...` (PostgreSQL).
    Dollar,
}

/// Byte offsets of every `?` placeholder outside literals and comments.
pub(crate) fn placeholder_positions(sql: &str) -> Vec<usize> {
    let bytes = sql.as_bytes();
    let mut positions = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'?' => positions.push(i),
            quote @ (b'\'' | b'"' | b'`') => {
                // Skip quoted text; a doubled quote is an escaped quote.
                let backslash_escapes = quote == b'\'' && is_escape_string_prefix(bytes, i);
                i += 1;
                while i < bytes.len() {
                    if backslash_escapes && bytes[i] == b'\\' {
                        i += 2;
                        continue;
                    }
                    if bytes[i] == quote {
                        if i + 1 < bytes.len() && bytes[i + 1] == quote {
                            i += 1;
                        } else {
                            break;
                        }
                    }
                    i += 1;
                }
            }
            b'$' => {
                if let Some(tag_len) = dollar_quote_tag_len(bytes, i) {
                    let tag = &sql[i..i + tag_len];
                    let body = i + tag_len;
                    i = match sql[body..].find(tag) {
                        Some(end) => body + end + tag_len - 1,
                        None => bytes.len(),
                    };
                }
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    i += 1;
                }
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    positions
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || !b.is_ascii()
}

/// Whether the quote at `quote` opens an `E'...'` escape string.
fn is_escape_string_prefix(bytes: &[u8], quote: usize) -> bool {
    quote > 0
        && matches!(bytes[quote - 1], b'E' | b'e')
        && (quote == 1 || !is_ident_byte(bytes[quote - 2]))
}

/// Length of the `$tag$` opening delimiter at `start`, if there is one.
///
/// `$1` parameters and `$` inside identifiers are not delimiters.
fn dollar_quote_tag_len(bytes: &[u8], start: usize) -> Option<usize> {
    if start > 0 && is_ident_byte(bytes[start - 1]) {
        return None;
    }
    let mut j = start + 1;
    if bytes.get(j).is_some_and(u8::is_ascii_digit) {
        return None;
    }
    while j < bytes.len() && bytes[j] != b'$' {
        if !(bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_' || !bytes[j].is_ascii()) {
            return None;
        }
        j += 1;
    }
    (j < bytes.len()).then_some(j + 1 - start)
}

/// Number of positional placeholders in `sql`.
pub fn count_placeholders(sql: &str) -> usize {
    placeholder_positions(sql).len()
}

/// Rewrite `?` placeholders into the given style.
pub fn render_placeholders(sql: &str, style: PlaceholderStyle) -> String {
    match style {
        PlaceholderStyle::Question => sql.to_string(),
        PlaceholderStyle::Dollar => {
            let positions = placeholder_positions(sql);
            let mut out = String::with_capacity(sql.len() + positions.len() * 2);
            let mut last = 0;
            for (n, pos) in positions.into_iter().enumerate() {
                out.push_str(&sql[last..pos]);
                out.push('$');
                out.push_str(&(n + 1).to_string());
                last = pos + 1;
            }
            out.push_str(&sql[last..]);
            out
        }
    }
}

/// Strip leading whitespace, SQL comments (`--` and `/* */`), and parentheses
/// from a SQL string to find the first meaningful keyword.
pub(crate) fn strip_sql_prefix(sql: &str) -> &str {
    let mut s = sql;
    loop {
        let before = s;
        s = s.trim_start();
        if s.starts_with("--") {
            if let Some(pos) = s.find('\n') {
                s = &s[pos + 1..];
                continue;
            }
            return "";
        }
        if s.starts_with("/*") {
            if let Some(pos) = s.find("*/") {
                s = &s[pos + 2..];
                continue;
            }
            return "";
        }
        if let Some(rest) = s.strip_prefix('(') {
            s = rest;
            continue;
        }
        if s == before {
            break;
        }
    }
    s
}

pub(crate) fn starts_with_keyword(s: &str, keyword: &str) -> bool {
    match s.get(0..keyword.len()) {
        Some(prefix) => prefix.eq_ignore_ascii_case(keyword),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_placeholders() {
        assert_eq!(count_placeholders("SELECT * FROM users"), 0);
        assert_eq!(count_placeholders("INSERT INTO users (a,b) VALUES (?,?)"), 2);
        assert_eq!(
            count_placeholders("SELECT * FROM t WHERE a = '?' AND b = ? AND \"c?\" = ?"),
            2
        );
        assert_eq!(count_placeholders("SELECT 'it''s ?' , ?"), 1);
        assert_eq!(count_placeholders("SELECT ? -- trailing ?\n, ?"), 2);
        assert_eq!(count_placeholders("SELECT /* ? */ ?"), 1);
    }

    #[test]
    fn test_postgres_escape_strings_and_dollar_quotes() {
        assert_eq!(count_placeholders(r"SELECT E'it\'s ?' , ?"), 1);
        assert_eq!(count_placeholders(r"SELECT e'\\' , ?"), 1);
        // Without the E prefix a backslash is an ordinary character.
        assert_eq!(count_placeholders(r"SELECT '\' , ?"), 1);
        assert_eq!(count_placeholders(r"SELECT name'?' , ?"), 1);

        assert_eq!(count_placeholders("SELECT $$ ? $$, ?"), 1);
        assert_eq!(count_placeholders("SELECT $fn$ it's ? $ $fn$ , ?"), 1);
        assert_eq!(count_placeholders("SELECT $$ unterminated ?"), 0);
        // `$1` and `$` inside identifiers are not dollar quotes.
        assert_eq!(count_placeholders("SELECT $1, a$b$ , ?"), 1);

        assert_eq!(
            render_placeholders(
                "UPDATE t SET body = ? WHERE note = E'\\?' AND tag = $x$?$x$ AND id = ?",
                PlaceholderStyle::Dollar
            ),
            "UPDATE t SET body = $1 WHERE note = E'\\?' AND tag = $x$?$x$ AND id = $2"
        );
    }

    #[test]
    fn test_render_dollar() {
        assert_eq!(
            render_placeholders(
                "UPDATE users SET age = ? WHERE id = ?",
                PlaceholderStyle::Dollar
            ),
            "UPDATE users SET age = $1 WHERE id = $2"
        );
        assert_eq!(
            render_placeholders("SELECT '?' , ?", PlaceholderStyle::Dollar),
            "SELECT '?' , $1"
        );
    }

    #[test]
    fn test_render_question_is_identity() {
        let sql = "DELETE FROM users WHERE id = ?";
        assert_eq!(render_placeholders(sql, PlaceholderStyle::Question), sql);
    }

    #[test]
    fn test_strip_prefix_and_keyword() {
        assert_eq!(strip_sql_prefix("  /* c */ -- x\n (SELECT 1)"), "SELECT 1)");
        assert!(starts_with_keyword("select *", "SELECT"));
        assert!(!starts_with_keyword("SEL", "SELECT"));
    }
}
