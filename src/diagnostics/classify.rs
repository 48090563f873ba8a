use std::fmt;

use serde::Serialize;
use tracing::error;

use super::{
    ConnectionCode, DriverError, DriverErrorKind, ErrorCategory, PreparedStatementCode,
    RequestCode, ServerDiagnostics, TransactionCode,
};

/// Diagnostic record derived from a [`DriverError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedError {
    pub category: ErrorCategory,
    pub code: &'static str,
    pub message: String,
    /// The driver's own text for the error
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerDiagnostics>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<ClassifiedCause>,
}

/// Where a cause sits relative to the classified error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "kebab-case")]
pub enum CausePosition {
    Original,
    /// 1-based position among the preceding errors
    Preceding(usize),
}

/// A cause of a classified error, classified one level deep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedCause {
    pub position: CausePosition,
    pub category: ErrorCategory,
    pub code: &'static str,
    pub message: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerDiagnostics>,
}

/// Classify a driver error.
///
/// Total: every error gets exactly one category and a non-empty message. The
/// original cause (one level) and the preceding errors are classified as well and
/// listed in `causes`, original first, then preceding errors in order.
#[must_use]
pub fn classify(err: &DriverError) -> ClassifiedError {
    let mut causes = Vec::with_capacity(err.preceding().len() + 1);
    if let Some(original) = err.original() {
        causes.push(cause(CausePosition::Original, original));
    }
    for (idx, preceding) in err.preceding().iter().enumerate() {
        causes.push(cause(CausePosition::Preceding(idx + 1), preceding));
    }

    ClassifiedError {
        category: err.category(),
        code: err.kind().symbol(),
        message: headline(err),
        detail: err.message().to_string(),
        server: server_of(err),
        causes,
    }
}

fn server_of(err: &DriverError) -> Option<ServerDiagnostics> {
    match err.kind() {
        DriverErrorKind::Request(RequestCode::ServerMessage(diagnostics)) => {
            Some(diagnostics.as_ref().clone())
        }
        _ => None,
    }
}

fn cause(position: CausePosition, err: &DriverError) -> ClassifiedCause {
    ClassifiedCause {
        position,
        category: err.category(),
        code: err.kind().symbol(),
        message: headline(err),
        detail: err.message().to_string(),
        server: server_of(err),
    }
}

fn headline(err: &DriverError) -> String {
    let text = match err.kind() {
        DriverErrorKind::Connection(code) => connection_message(*code, err.message()),
        DriverErrorKind::Transaction(code) => transaction_message(*code, err.message()),
        DriverErrorKind::Request(code) => request_message(code, err.message()),
        DriverErrorKind::PreparedStatement(code) => {
            prepared_statement_message(*code, err.message())
        }
        DriverErrorKind::Unknown => format!("Unknown SQL error: {}", err.message()),
    };
    if text.trim().is_empty() {
        format!("{} error", err.category())
    } else {
        text
    }
}

fn connection_message(code: ConnectionCode, message: &str) -> String {
    match code {
        ConnectionCode::Login => "Login failed for user.".to_string(),
        ConnectionCode::Timeout => "Connection timeout.".to_string(),
        ConnectionCode::Driver => "Unknown driver.".to_string(),
        ConnectionCode::AlreadyConnected => "Database is already connected!".to_string(),
        ConnectionCode::AlreadyConnecting => "Already connecting to database!".to_string(),
        ConnectionCode::NotOpen => "Connection not yet open.".to_string(),
        ConnectionCode::InstanceLookup => "Instance lookup failed.".to_string(),
        ConnectionCode::Socket => "Socket error.".to_string(),
        ConnectionCode::Closed => "Connection is closed.".to_string(),
        ConnectionCode::Other => format!("Connection error: {message}"),
    }
}

fn transaction_message(code: TransactionCode, message: &str) -> String {
    match code {
        TransactionCode::NotBegun => "Transaction has not begun.".to_string(),
        TransactionCode::AlreadyBegun => "Transaction has already begun.".to_string(),
        TransactionCode::RequestInProgress => {
            "Can't commit/rollback transaction. There is a request in progress.".to_string()
        }
        TransactionCode::Aborted => "Transaction has been aborted.".to_string(),
        TransactionCode::Other => format!("Transaction error: {message}"),
    }
}

fn request_message(code: &RequestCode, message: &str) -> String {
    match code {
        RequestCode::ServerMessage(_) => "Message from SQL Server.".to_string(),
        RequestCode::Cancelled => "Request cancelled.".to_string(),
        RequestCode::Timeout => "Request timeout.".to_string(),
        RequestCode::BadArgs => "Invalid number of arguments.".to_string(),
        RequestCode::InjectionSuspected => "SQL injection warning.".to_string(),
        RequestCode::NoConnection => "No connection is specified for that request.".to_string(),
        RequestCode::Other => format!("Request error: {message}"),
    }
}

fn prepared_statement_message(code: PreparedStatementCode, message: &str) -> String {
    match code {
        PreparedStatementCode::BadArgs => {
            "Invalid number of arguments for prepared statement.".to_string()
        }
        PreparedStatementCode::InjectionSuspected => {
            "SQL injection warning for prepared statement.".to_string()
        }
        PreparedStatementCode::AlreadyPrepared => "Statement is already prepared.".to_string(),
        PreparedStatementCode::NotPrepared => "Statement is not prepared.".to_string(),
        PreparedStatementCode::Other => format!("Prepared statement error: {message}"),
    }
}

impl ClassifiedError {
    /// The report, one line per logged entry.
    #[must_use]
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("[{}/{}] {}", self.category, self.code, self.message)];
        if self.detail != self.message {
            lines.push(format!("Driver message: {}", self.detail));
        }
        lines.extend(self.server.as_ref().map(server_line));
        for cause in &self.causes {
            match cause.position {
                CausePosition::Original => {
                    lines.push(format!("Original error: {}", cause.detail));
                }
                CausePosition::Preceding(idx) => {
                    lines.push(format!("Preceding error {idx}: {}", cause.detail));
                }
            }
            lines.extend(cause.server.as_ref().map(server_line));
        }
        lines
    }

    /// Emit the report through `tracing`.
    pub fn log(&self) {
        for line in self.report_lines() {
            error!(category = %self.category, code = self.code, "{line}");
        }
    }
}

fn server_line(server: &ServerDiagnostics) -> String {
    format!(
        "Error number: {}, state: {}, class: {}, line number: {}, server: {}, procedure: {}",
        server.number,
        server.state,
        server.class,
        server.line_number,
        server.server,
        server.procedure
    )
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if self.detail != self.message && !self.detail.is_empty() {
            write!(f, " ({})", self.detail)?;
        }
        Ok(())
    }
}
