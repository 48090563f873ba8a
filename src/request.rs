use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::diagnostics::{DriverError, RequestCode};
use crate::translation::bind_named_placeholders;
use crate::types::RowValues;

static PARAM_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_#][A-Za-z0-9_@#$]{0,127}$").expect("valid regex"));

/// Whether `name` can be used as a parameter name (without the leading `@`).
#[must_use]
pub fn is_valid_param_name(name: &str) -> bool {
    PARAM_NAME.is_match(name)
}

/// A named parameter of an [`OperationRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct NamedParam {
    pub name: String,
    pub value: RowValues,
}

/// A single SQL statement plus the named parameters it references as `@name`.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRequest {
    sql: String,
    params: Vec<NamedParam>,
}

/// A request ready to hand to the driver: positional SQL and values in bind order.
#[derive(Debug)]
pub struct BoundStatement<'a> {
    pub sql: Cow<'a, str>,
    pub values: Vec<&'a RowValues>,
}

impl OperationRequest {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Replace the statement text, keeping the parameters.
    #[must_use]
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = sql.into();
        self
    }

    /// Add a named parameter; `name` is given without the leading `@`.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: RowValues) -> Self {
        self.params.push(NamedParam {
            name: name.into(),
            value,
        });
        self
    }

    pub fn push_param(&mut self, name: impl Into<String>, value: RowValues) {
        self.params.push(NamedParam {
            name: name.into(),
            value,
        });
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn params(&self) -> &[NamedParam] {
        &self.params
    }

    /// Look up a parameter value by name (case-insensitive, like SQL Server).
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&RowValues> {
        self.params
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| &p.value)
    }

    /// Rewrite the statement to positional placeholders.
    ///
    /// # Errors
    /// Request `EINJECT` when a parameter name is not a valid identifier, request
    /// `EARGS` when a name is declared twice or the statement references a name that
    /// was not supplied.
    pub fn bind(&self) -> Result<BoundStatement<'_>, DriverError> {
        if self.params.is_empty() {
            return Ok(BoundStatement {
                sql: Cow::Borrowed(self.sql.as_str()),
                values: Vec::new(),
            });
        }

        for (idx, param) in self.params.iter().enumerate() {
            if !is_valid_param_name(&param.name) {
                return Err(DriverError::request(
                    RequestCode::InjectionSuspected,
                    format!("Invalid parameter name: {:?}", param.name),
                ));
            }
            if self.params[..idx]
                .iter()
                .any(|p| p.name.eq_ignore_ascii_case(&param.name))
            {
                return Err(DriverError::request(
                    RequestCode::BadArgs,
                    format!("Parameter @{} was supplied more than once", param.name),
                ));
            }
        }

        let sql = bind_named_placeholders(&self.sql, |name| {
            self.params
                .iter()
                .position(|p| p.name.eq_ignore_ascii_case(name))
        })
        .map_err(|name| {
            DriverError::request(
                RequestCode::BadArgs,
                format!("Must declare the scalar variable \"@{name}\"."),
            )
        })?;

        Ok(BoundStatement {
            sql,
            values: self.params.iter().map(|p| &p.value).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DriverErrorKind;

    #[test]
    fn binds_in_declaration_order() {
        let request = OperationRequest::new("UPDATE t SET a = @a, b = @b WHERE b > @b")
            .with_param("a", RowValues::Int(1))
            .with_param("b", RowValues::Text("x".into()));
        let bound = request.bind().unwrap();
        assert_eq!(bound.sql, "UPDATE t SET a = @P1, b = @P2 WHERE b > @P2");
        assert_eq!(bound.values, vec![&RowValues::Int(1), &RowValues::Text("x".into())]);
    }

    #[test]
    fn statements_without_params_pass_through() {
        let request = OperationRequest::new("DECLARE @x INT = 1; SELECT @x");
        let bound = request.bind().unwrap();
        assert!(matches!(bound.sql, Cow::Borrowed(_)));
        assert!(bound.values.is_empty());
    }

    #[test]
    fn missing_param_is_bad_args() {
        let request = OperationRequest::new("SELECT @a, @b").with_param("a", RowValues::Int(1));
        let err = request.bind().unwrap_err();
        assert_eq!(err.kind(), &DriverErrorKind::Request(RequestCode::BadArgs));
    }

    #[test]
    fn duplicate_param_is_bad_args() {
        let request = OperationRequest::new("SELECT @a")
            .with_param("a", RowValues::Int(1))
            .with_param("A", RowValues::Int(2));
        let err = request.bind().unwrap_err();
        assert_eq!(err.kind(), &DriverErrorKind::Request(RequestCode::BadArgs));
    }

    #[test]
    fn suspicious_param_name_is_injection() {
        let request =
            OperationRequest::new("SELECT 1").with_param("a; DROP TABLE t", RowValues::Int(1));
        let err = request.bind().unwrap_err();
        assert_eq!(
            err.kind(),
            &DriverErrorKind::Request(RequestCode::InjectionSuspected)
        );
    }
}
