use std::sync::LazyLock;

use regex::Regex;

use crate::diagnostics::{DriverError, RequestCode};
use crate::translation::{Hazard, find_hazard};

use super::BuildError;

/// Longest identifier SQL Server accepts (`sysname`).
pub const MAX_IDENTIFIER_LEN: usize = 128;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}_#][\p{L}\p{N}_@$# ]*$").expect("valid regex"));

static COLUMN_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_ (),]*$").expect("valid regex"));

fn injection(message: String) -> BuildError {
    BuildError::Rejected(DriverError::request(RequestCode::InjectionSuspected, message))
}

/// Check that `name` is a plain identifier.
///
/// # Errors
/// `BuildError::Invalid` for an empty name, request `EINJECT` for anything that is
/// not an identifier.
pub fn validate_identifier(name: &str) -> Result<&str, BuildError> {
    if name.trim().is_empty() {
        return Err(BuildError::Invalid("identifier must not be empty".into()));
    }
    if name.chars().count() > MAX_IDENTIFIER_LEN || !IDENTIFIER.is_match(name) {
        return Err(injection(format!("Invalid identifier: {name:?}")));
    }
    Ok(name)
}

/// Validate and bracket-quote one identifier.
///
/// # Errors
/// See [`validate_identifier`].
pub fn quote_identifier(name: &str) -> Result<String, BuildError> {
    let name = validate_identifier(name)?;
    Ok(format!("[{}]", name.replace(']', "]]")))
}

/// Quote a possibly schema-qualified object name such as `dbo.Users`.
///
/// # Errors
/// See [`validate_identifier`]; more than three parts is also `EINJECT`.
pub fn quote_object_name(name: &str) -> Result<String, BuildError> {
    let parts: Vec<&str> = name.trim().split('.').collect();
    if parts.len() > 3 {
        return Err(injection(format!("Invalid object name: {name:?}")));
    }
    let quoted = parts
        .into_iter()
        .map(quote_identifier)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(quoted.join("."))
}

/// Check a column type declaration such as `NVARCHAR(255) NOT NULL`.
///
/// # Errors
/// `EINJECT` when the declaration contains anything beyond words, digits,
/// parentheses and commas.
pub fn validate_column_type(ty: &str) -> Result<&str, BuildError> {
    let ty = ty.trim();
    if ty.is_empty() {
        return Err(BuildError::Invalid("column type must not be empty".into()));
    }
    if !COLUMN_TYPE.is_match(ty) {
        return Err(injection(format!("Invalid column type: {ty:?}")));
    }
    Ok(ty)
}

/// Check a caller-supplied WHERE clause before it is spliced into a statement.
///
/// # Errors
/// `BuildError::Invalid` when empty, `EINJECT` when it contains a statement
/// terminator, a comment or an unterminated literal.
pub fn validate_condition(condition: &str) -> Result<&str, BuildError> {
    let condition = condition.trim();
    if condition.is_empty() {
        return Err(BuildError::Invalid("conditions must not be empty".into()));
    }
    match find_hazard(condition) {
        None => Ok(condition),
        Some(Hazard::StatementTerminator) => Err(injection(
            "Conditions must not contain a statement terminator".into(),
        )),
        Some(Hazard::Comment) => Err(injection("Conditions must not contain comments".into())),
        Some(Hazard::UnterminatedLiteral) => Err(injection(
            "Conditions contain an unterminated literal".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DriverErrorKind;

    fn is_injection(err: &BuildError) -> bool {
        matches!(
            err,
            BuildError::Rejected(e)
                if e.kind() == &DriverErrorKind::Request(RequestCode::InjectionSuspected)
        )
    }

    #[test]
    fn quotes_plain_and_qualified_names() {
        assert_eq!(quote_identifier("users").unwrap(), "[users]");
        assert_eq!(quote_identifier("first name").unwrap(), "[first name]");
        assert_eq!(quote_object_name("dbo.Users").unwrap(), "[dbo].[Users]");
        assert_eq!(quote_identifier("Ürün").unwrap(), "[Ürün]");
    }

    #[test]
    fn rejects_non_identifiers() {
        assert!(is_injection(&quote_identifier("users]; DROP TABLE x").unwrap_err()));
        assert!(is_injection(&quote_identifier("1abc").unwrap_err()));
        assert!(is_injection(&quote_object_name("a.b.c.d").unwrap_err()));
        assert!(is_injection(&quote_identifier(&"a".repeat(129)).unwrap_err()));
        assert!(matches!(quote_identifier("  ").unwrap_err(), BuildError::Invalid(_)));
    }

    #[test]
    fn column_types() {
        assert_eq!(validate_column_type(" DECIMAL(10, 2) ").unwrap(), "DECIMAL(10, 2)");
        assert!(validate_column_type("INT PRIMARY KEY IDENTITY(1,1)").is_ok());
        assert!(is_injection(&validate_column_type("INT); DROP TABLE x; --").unwrap_err()));
    }

    #[test]
    fn conditions() {
        assert_eq!(validate_condition(" id = 1 ").unwrap(), "id = 1");
        assert!(validate_condition("name = 'a;b'").is_ok());
        assert!(is_injection(&validate_condition("1=1; DROP TABLE users").unwrap_err()));
        assert!(is_injection(&validate_condition("1=1 --").unwrap_err()));
        assert!(matches!(validate_condition("").unwrap_err(), BuildError::Invalid(_)));
    }
}
