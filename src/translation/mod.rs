use std::borrow::Cow;
use std::fmt::Write;

mod parsers;
mod scanner;

use parsers::{is_block_comment_end, is_block_comment_start, is_doubled, is_line_comment_start};
use scanner::{State, is_ident_byte, scan_identifier};

/// Something in a SQL fragment that lets it escape the statement it is spliced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hazard {
    /// A `;` outside literals and comments
    StatementTerminator,
    /// A `--` or `/*` comment
    Comment,
    /// A string literal or quoted identifier that is never closed
    UnterminatedLiteral,
}

/// Rewrite named placeholders (`@name`) into the positional `@P1`, `@P2`, ... form
/// SQL Server expects for RPC parameters.
///
/// `position` maps a parameter name to its zero-based bind position. String
/// literals, quoted and bracketed identifiers, comments and `@@` system functions
/// are left alone. Returns a borrowed `Cow` when the statement has no placeholders,
/// and the unknown name as the error when `position` has no entry for it.
///
/// ```rust
/// use mssql_connector::translation::bind_named_placeholders;
///
/// let sql = "UPDATE [t] SET [name] = @name WHERE id = @id -- @ignored";
/// let out = bind_named_placeholders(sql, |n| ["name", "id"].iter().position(|p| *p == n)).unwrap();
/// assert_eq!(out, "UPDATE [t] SET [name] = @P1 WHERE id = @P2 -- @ignored");
/// ```
pub fn bind_named_placeholders<F>(sql: &str, mut position: F) -> Result<Cow<'_, str>, String>
where
    F: FnMut(&str) -> Option<usize>,
{
    let bytes = sql.as_bytes();
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => {
                if let Some((next, skip)) = enter(bytes, idx) {
                    state = next;
                    idx += skip;
                } else if b == b'@' && bytes.get(idx + 1) == Some(&b'@') {
                    idx += 2;
                    while idx < bytes.len() && is_ident_byte(bytes[idx]) {
                        idx += 1;
                    }
                    continue;
                } else if b == b'@' && (idx == 0 || !is_ident_byte(bytes[idx - 1])) {
                    if let Some((end, name)) = scan_identifier(bytes, idx + 1) {
                        let pos = position(name).ok_or_else(|| name.to_string())?;
                        let buf = out.get_or_insert_with(|| String::with_capacity(sql.len() + 8));
                        buf.push_str(&sql[copied..idx]);
                        let _ = write!(buf, "@P{}", pos + 1);
                        copied = end;
                        idx = end;
                        continue;
                    }
                }
            }
            quoted => {
                let (next, skip) = step(quoted, bytes, idx);
                state = next;
                idx += skip;
            }
        }
        idx += 1;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied..]);
            Ok(Cow::Owned(buf))
        }
        None => Ok(Cow::Borrowed(sql)),
    }
}

/// Find the first construct that would let `fragment` break out of the statement
/// it gets spliced into (a WHERE clause, a column type).
#[must_use]
pub fn find_hazard(fragment: &str) -> Option<Hazard> {
    let bytes = fragment.as_bytes();
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        match state {
            State::Normal => {
                if is_line_comment_start(bytes, idx) || is_block_comment_start(bytes, idx) {
                    return Some(Hazard::Comment);
                }
                if bytes[idx] == b';' {
                    return Some(Hazard::StatementTerminator);
                }
                if let Some((next, skip)) = enter(bytes, idx) {
                    state = next;
                    idx += skip;
                }
            }
            quoted => {
                let (next, skip) = step(quoted, bytes, idx);
                state = next;
                idx += skip;
            }
        }
        idx += 1;
    }

    match state {
        State::Normal => None,
        State::LineComment | State::BlockComment(_) => Some(Hazard::Comment),
        State::SingleQuoted | State::DoubleQuoted | State::Bracketed => {
            Some(Hazard::UnterminatedLiteral)
        }
    }
}

/// State entered from `Normal` at `idx`, and the extra bytes the opener takes.
fn enter(bytes: &[u8], idx: usize) -> Option<(State, usize)> {
    match bytes[idx] {
        b'\'' => Some((State::SingleQuoted, 0)),
        b'"' => Some((State::DoubleQuoted, 0)),
        b'[' => Some((State::Bracketed, 0)),
        _ if is_line_comment_start(bytes, idx) => Some((State::LineComment, 1)),
        _ if is_block_comment_start(bytes, idx) => Some((State::BlockComment(1), 1)),
        _ => None,
    }
}

fn step(state: State, bytes: &[u8], idx: usize) -> (State, usize) {
    let b = bytes[idx];
    match state {
        State::SingleQuoted => close_delimited(state, bytes, idx, b'\''),
        State::DoubleQuoted => close_delimited(state, bytes, idx, b'"'),
        State::Bracketed => close_delimited(state, bytes, idx, b']'),
        State::LineComment if b == b'\n' => (State::Normal, 0),
        State::BlockComment(depth) if is_block_comment_start(bytes, idx) => {
            (State::BlockComment(depth + 1), 1)
        }
        State::BlockComment(depth) if is_block_comment_end(bytes, idx) => {
            if depth == 1 {
                (State::Normal, 1)
            } else {
                (State::BlockComment(depth - 1), 1)
            }
        }
        other => (other, 0),
    }
}

fn close_delimited(state: State, bytes: &[u8], idx: usize, delimiter: u8) -> (State, usize) {
    if bytes[idx] != delimiter {
        (state, 0)
    } else if is_doubled(bytes, idx, delimiter) {
        (state, 1)
    } else {
        (State::Normal, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(names: &'a [&'a str]) -> impl FnMut(&str) -> Option<usize> + 'a {
        move |name| names.iter().position(|n| n.eq_ignore_ascii_case(name))
    }

    #[test]
    fn rewrites_named_placeholders() {
        let sql = "UPDATE [users] SET [name] = @name, [age] = @age WHERE id = @id";
        let res = bind_named_placeholders(sql, lookup(&["name", "age", "id"])).unwrap();
        assert_eq!(
            res,
            "UPDATE [users] SET [name] = @P1, [age] = @P2 WHERE id = @P3"
        );
    }

    #[test]
    fn repeated_names_share_a_position() {
        let sql = "SELECT * FROM t WHERE a = @x OR b = @x";
        let res = bind_named_placeholders(sql, lookup(&["x"])).unwrap();
        assert_eq!(res, "SELECT * FROM t WHERE a = @P1 OR b = @P1");
    }

    #[test]
    fn skips_literals_identifiers_and_comments() {
        let sql = "SELECT '@a', N'it''s @a', [col@a], \"@a\" -- @a\n/* @a /* @a */ */ FROM t WHERE x = @a";
        let res = bind_named_placeholders(sql, lookup(&["a"])).unwrap();
        assert_eq!(
            res,
            "SELECT '@a', N'it''s @a', [col@a], \"@a\" -- @a\n/* @a /* @a */ */ FROM t WHERE x = @P1"
        );
    }

    #[test]
    fn leaves_system_functions_alone() {
        let sql = "SELECT @@ROWCOUNT, @@IDENTITY";
        let res = bind_named_placeholders(sql, lookup(&[])).unwrap();
        assert!(matches!(res, Cow::Borrowed(_)));
    }

    #[test]
    fn keeps_multibyte_text_intact() {
        let sql = "UPDATE t SET [名前] = @name WHERE note = 'ñandú'";
        let res = bind_named_placeholders(sql, lookup(&["name"])).unwrap();
        assert_eq!(res, "UPDATE t SET [名前] = @P1 WHERE note = 'ñandú'");
    }

    #[test]
    fn unknown_name_is_reported() {
        let err = bind_named_placeholders("SELECT @missing", lookup(&["a"])).unwrap_err();
        assert_eq!(err, "missing");
    }

    #[test]
    fn hazards_outside_literals() {
        assert_eq!(find_hazard("id = 1; DROP TABLE users"), Some(Hazard::StatementTerminator));
        assert_eq!(find_hazard("id = 1 -- trailing"), Some(Hazard::Comment));
        assert_eq!(find_hazard("id = 1 /* x */"), Some(Hazard::Comment));
        assert_eq!(find_hazard("name = 'abc"), Some(Hazard::UnterminatedLiteral));
        assert_eq!(find_hazard("name = 'a;b' AND [x;y] = 2"), None);
        assert_eq!(find_hazard("name = 'O''Brien'"), None);
    }
}
