use std::io::ErrorKind;

use deadpool::managed::PoolError;
use tiberius::error::{Error as TiberiusError, TokenError};

use super::{ConnectionCode, DriverError, RequestCode, ServerDiagnostics};

/// Which step of the work an error was raised in. The same driver error means
/// different things while logging in and while running a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connect,
    Request,
}

// Login failed, password expired/must change, account locked, cannot open database.
const LOGIN_ERRORS: &[u32] = &[18456, 18452, 18486, 18487, 18488, 4060];

impl From<&TokenError> for ServerDiagnostics {
    fn from(token: &TokenError) -> Self {
        ServerDiagnostics {
            number: token.code(),
            state: token.state(),
            class: token.class(),
            line_number: token.line(),
            server: token.server().to_string(),
            procedure: token.procedure().to_string(),
            message: token.message().to_string(),
        }
    }
}

impl DriverError {
    /// Map a tiberius error raised during `phase`.
    #[must_use]
    pub fn from_tiberius(err: TiberiusError, phase: Phase) -> Self {
        let text = err.to_string();
        match (err, phase) {
            (TiberiusError::Server(token), Phase::Connect) => {
                let number = token.code();
                let server = DriverError::server_message(ServerDiagnostics::from(&token));
                let code = if LOGIN_ERRORS.contains(&number) {
                    ConnectionCode::Login
                } else {
                    ConnectionCode::Other
                };
                DriverError::connection(code, token.message()).with_original(server)
            }
            (TiberiusError::Server(token), Phase::Request) => {
                DriverError::server_message(ServerDiagnostics::from(&token))
            }
            (TiberiusError::Io { kind, message }, phase) => Self::from_io_kind(kind, message, phase),
            (TiberiusError::Protocol(_) | TiberiusError::Encoding(_), Phase::Connect) => {
                DriverError::connection(ConnectionCode::Driver, text)
            }
            (TiberiusError::Tls(_) | TiberiusError::Routing { .. }, _) => {
                DriverError::connection(ConnectionCode::Other, text)
            }
            (
                TiberiusError::Conversion(_)
                | TiberiusError::Encoding(_)
                | TiberiusError::Utf8
                | TiberiusError::Utf16
                | TiberiusError::ParseInt(_)
                | TiberiusError::BulkInput(_)
                | TiberiusError::Protocol(_),
                Phase::Request,
            ) => DriverError::request(RequestCode::Other, text),
            (_, Phase::Connect) => DriverError::connection(ConnectionCode::Other, text),
            (_, Phase::Request) => DriverError::unknown(text),
        }
    }

    /// Map an I/O failure raised during `phase`.
    #[must_use]
    pub fn from_io(err: &std::io::Error, phase: Phase) -> Self {
        Self::from_io_kind(err.kind(), err.to_string(), phase)
    }

    fn from_io_kind(kind: ErrorKind, message: String, phase: Phase) -> Self {
        match (kind, phase) {
            (ErrorKind::TimedOut, Phase::Connect) => {
                DriverError::connection(ConnectionCode::Timeout, message)
            }
            (ErrorKind::TimedOut, Phase::Request) => {
                DriverError::request(RequestCode::Timeout, message)
            }
            (ErrorKind::Interrupted, Phase::Request) => {
                DriverError::request(RequestCode::Cancelled, message)
            }
            (ErrorKind::UnexpectedEof, _)
            | (
                ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe,
                Phase::Request,
            ) => DriverError::connection(ConnectionCode::Closed, message),
            _ => DriverError::connection(ConnectionCode::Socket, message),
        }
    }

    /// Map a pool checkout failure raised during `phase`.
    #[must_use]
    pub fn from_pool(err: PoolError<DriverError>, phase: Phase) -> Self {
        match err {
            PoolError::Backend(inner) => inner,
            PoolError::Timeout(kind) => DriverError::connection(
                ConnectionCode::Timeout,
                format!("Timed out waiting for a pooled connection ({kind:?})"),
            ),
            PoolError::Closed if phase == Phase::Request => {
                DriverError::request(RequestCode::NoConnection, "The connection pool is closed")
            }
            PoolError::Closed => {
                DriverError::connection(ConnectionCode::Closed, "The connection pool is closed")
            }
            PoolError::NoRuntimeSpecified => DriverError::connection(
                ConnectionCode::Driver,
                "The connection pool has no async runtime configured",
            ),
            other => DriverError::connection(ConnectionCode::Other, other.to_string()),
        }
    }
}
