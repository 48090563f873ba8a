//! Driver error taxonomy and classification.
//!
//! Every failure raised while talking to SQL Server is turned into a
//! [`DriverError`]: a closed set of error classes, each with its own code
//! enumeration. [`classify`] turns one into a [`ClassifiedError`], the diagnostic
//! record that gets logged and attached to the failure surfaced to the caller.

mod classify;
mod mssql;

use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub use classify::{CausePosition, ClassifiedCause, ClassifiedError, classify};
pub use mssql::Phase;

/// Error class, the first level of the taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    Connection,
    Transaction,
    Request,
    PreparedStatement,
    Unknown,
}

impl ErrorCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Connection => "connection",
            ErrorCategory::Transaction => "transaction",
            ErrorCategory::Request => "request",
            ErrorCategory::PreparedStatement => "prepared-statement",
            ErrorCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionCode {
    Login,
    Timeout,
    Driver,
    AlreadyConnected,
    AlreadyConnecting,
    NotOpen,
    InstanceLookup,
    Socket,
    Closed,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionCode {
    NotBegun,
    AlreadyBegun,
    RequestInProgress,
    Aborted,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestCode {
    /// The server answered with an error token
    ServerMessage(Box<ServerDiagnostics>),
    Cancelled,
    Timeout,
    BadArgs,
    InjectionSuspected,
    NoConnection,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreparedStatementCode {
    BadArgs,
    InjectionSuspected,
    AlreadyPrepared,
    NotPrepared,
    Other,
}

/// The fields of a SQL Server error token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDiagnostics {
    pub number: u32,
    pub state: u8,
    pub class: u8,
    pub line_number: u32,
    pub server: String,
    pub procedure: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverErrorKind {
    Connection(ConnectionCode),
    Transaction(TransactionCode),
    Request(RequestCode),
    PreparedStatement(PreparedStatementCode),
    Unknown,
}

impl DriverErrorKind {
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            DriverErrorKind::Connection(_) => ErrorCategory::Connection,
            DriverErrorKind::Transaction(_) => ErrorCategory::Transaction,
            DriverErrorKind::Request(_) => ErrorCategory::Request,
            DriverErrorKind::PreparedStatement(_) => ErrorCategory::PreparedStatement,
            DriverErrorKind::Unknown => ErrorCategory::Unknown,
        }
    }

    /// Driver symbol for the code, as SQL Server client libraries report it.
    #[must_use]
    pub fn symbol(&self) -> &'static str {
        match self {
            DriverErrorKind::Connection(code) => match code {
                ConnectionCode::Login => "ELOGIN",
                ConnectionCode::Timeout => "ETIMEOUT",
                ConnectionCode::Driver => "EDRIVER",
                ConnectionCode::AlreadyConnected => "EALREADYCONNECTED",
                ConnectionCode::AlreadyConnecting => "EALREADYCONNECTING",
                ConnectionCode::NotOpen => "ENOTOPEN",
                ConnectionCode::InstanceLookup => "EINSTLOOKUP",
                ConnectionCode::Socket => "ESOCKET",
                ConnectionCode::Closed => "ECONNCLOSED",
                ConnectionCode::Other => "ECONNECTION",
            },
            DriverErrorKind::Transaction(code) => match code {
                TransactionCode::NotBegun => "ENOTBEGUN",
                TransactionCode::AlreadyBegun => "EALREADYBEGUN",
                TransactionCode::RequestInProgress => "EREQINPROG",
                TransactionCode::Aborted => "EABORT",
                TransactionCode::Other => "ETRANSACTION",
            },
            DriverErrorKind::Request(code) => match code {
                RequestCode::ServerMessage(_) => "EREQUEST",
                RequestCode::Cancelled => "ECANCEL",
                RequestCode::Timeout => "ETIMEOUT",
                RequestCode::BadArgs => "EARGS",
                RequestCode::InjectionSuspected => "EINJECT",
                RequestCode::NoConnection => "ENOCONN",
                RequestCode::Other => "EREQUESTFAILED",
            },
            DriverErrorKind::PreparedStatement(code) => match code {
                PreparedStatementCode::BadArgs => "EARGS",
                PreparedStatementCode::InjectionSuspected => "EINJECT",
                PreparedStatementCode::AlreadyPrepared => "EALREADYPREPARED",
                PreparedStatementCode::NotPrepared => "ENOTPREPARED",
                PreparedStatementCode::Other => "EPREPARED",
            },
            DriverErrorKind::Unknown => "EUNKNOWN",
        }
    }
}

/// An error raised while opening the pool or running a request.
///
/// `original` is the lower-level error this one was derived from (e.g. the server
/// message behind a failed login). `preceding` holds the errors that came before
/// this one in a batched execution, in order.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct DriverError {
    kind: DriverErrorKind,
    message: String,
    original: Option<Box<DriverError>>,
    preceding: Vec<DriverError>,
}

impl DriverError {
    pub fn new(kind: DriverErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            original: None,
            preceding: Vec::new(),
        }
    }

    pub fn connection(code: ConnectionCode, message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Connection(code), message)
    }

    pub fn transaction(code: TransactionCode, message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Transaction(code), message)
    }

    pub fn request(code: RequestCode, message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Request(code), message)
    }

    pub fn prepared_statement(code: PreparedStatementCode, message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::PreparedStatement(code), message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Unknown, message)
    }

    /// An error token sent by the server in answer to a request.
    #[must_use]
    pub fn server_message(diagnostics: ServerDiagnostics) -> Self {
        let message = diagnostics.message.clone();
        Self::request(RequestCode::ServerMessage(Box::new(diagnostics)), message)
    }

    #[must_use]
    pub fn with_original(mut self, original: DriverError) -> Self {
        self.original = Some(Box::new(original));
        self
    }

    #[must_use]
    pub fn with_preceding(mut self, preceding: Vec<DriverError>) -> Self {
        self.preceding = preceding;
        self
    }

    #[must_use]
    pub fn kind(&self) -> &DriverErrorKind {
        &self.kind
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn original(&self) -> Option<&DriverError> {
        self.original.as_deref()
    }

    #[must_use]
    pub fn preceding(&self) -> &[DriverError] {
        &self.preceding
    }
}
