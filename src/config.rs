use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConnectorError;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 1433;
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_SIZE: usize = 10;

/// Connection settings for the one database the connector talks to.
///
/// Deserializes from the integration configuration the platform sends
/// (`user`, `password`, `instanceName`, `database`, `port`), with optional
/// extras for the host and pool sizing. Immutable once built.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    user: String,
    password: String,
    #[serde(default = "default_host")]
    host: String,
    #[serde(default, alias = "server")]
    instance_name: Option<String>,
    database: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_idle_timeout_millis")]
    idle_timeout_millis: u64,
    #[serde(default = "default_max_size")]
    max_size: usize,
    #[serde(default)]
    encrypt: bool,
    #[serde(default = "default_true")]
    trust_server_certificate: bool,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

#[allow(clippy::cast_possible_truncation)]
fn default_idle_timeout_millis() -> u64 {
    DEFAULT_IDLE_TIMEOUT.as_millis() as u64
}

fn default_max_size() -> usize {
    DEFAULT_MAX_SIZE
}

fn default_true() -> bool {
    true
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("instance_name", &self.instance_name)
            .field("database", &self.database)
            .field("port", &self.port)
            .field("idle_timeout_millis", &self.idle_timeout_millis)
            .field("max_size", &self.max_size)
            .field("encrypt", &self.encrypt)
            .field("trust_server_certificate", &self.trust_server_certificate)
            .finish()
    }
}

impl ConnectionConfig {
    #[must_use]
    pub fn builder(
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::new(user.into(), password.into(), database.into())
    }

    /// Parse and validate a JSON configuration object.
    ///
    /// # Errors
    /// Returns `ConnectorError::Config` if the JSON is malformed or a field is invalid.
    pub fn from_json_str(json: &str) -> Result<Self, ConnectorError> {
        let config: ConnectionConfig = serde_json::from_str(json)
            .map_err(|e| ConnectorError::Config(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    ///
    /// # Errors
    /// Returns `ConnectorError::Config` if the file cannot be read or is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConnectorError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ConnectorError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// # Errors
    /// Returns `ConnectorError::Config` naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConnectorError> {
        if self.user.trim().is_empty() {
            return Err(ConnectorError::Config("user must not be empty".into()));
        }
        if self.database.trim().is_empty() {
            return Err(ConnectorError::Config("database must not be empty".into()));
        }
        if self.host.trim().is_empty() {
            return Err(ConnectorError::Config("host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(ConnectorError::Config("port must not be 0".into()));
        }
        if self.max_size == 0 {
            return Err(ConnectorError::Config("maxSize must be at least 1".into()));
        }
        if self.idle_timeout_millis == 0 {
            return Err(ConnectorError::Config(
                "idleTimeoutMillis must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Named instance, resolved through the SQL Server Browser. Blank names count as none.
    #[must_use]
    pub fn instance_name(&self) -> Option<&str> {
        self.instance_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_millis)
    }

    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    #[must_use]
    pub fn encrypt(&self) -> bool {
        self.encrypt
    }

    #[must_use]
    pub fn trust_server_certificate(&self) -> bool {
        self.trust_server_certificate
    }
}

/// Fluent builder for [`ConnectionConfig`].
#[derive(Debug, Clone)]
pub struct ConnectionConfigBuilder {
    config: ConnectionConfig,
}

impl ConnectionConfigBuilder {
    fn new(user: String, password: String, database: String) -> Self {
        Self {
            config: ConnectionConfig {
                user,
                password,
                host: default_host(),
                instance_name: None,
                database,
                port: DEFAULT_PORT,
                idle_timeout_millis: default_idle_timeout_millis(),
                max_size: DEFAULT_MAX_SIZE,
                encrypt: false,
                trust_server_certificate: true,
            },
        }
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    #[must_use]
    pub fn instance_name(mut self, instance_name: Option<String>) -> Self {
        self.config.instance_name = instance_name;
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.config.idle_timeout_millis = idle_timeout.as_millis() as u64;
        self
    }

    #[must_use]
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.config.max_size = max_size;
        self
    }

    #[must_use]
    pub fn encrypt(mut self, encrypt: bool) -> Self {
        self.config.encrypt = encrypt;
        self
    }

    #[must_use]
    pub fn trust_server_certificate(mut self, trust: bool) -> Self {
        self.config.trust_server_certificate = trust;
        self
    }

    /// # Errors
    /// Returns `ConnectorError::Config` if the assembled configuration is invalid.
    pub fn build(self) -> Result<ConnectionConfig, ConnectorError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_configuration_uses_defaults() {
        let config = ConnectionConfig::from_json_str(
            r#"{"user":"sa","password":"pw","instanceName":"SQLEXPRESS","database":"bots","port":1433}"#,
        )
        .unwrap();
        assert_eq!(config.host(), "localhost");
        assert_eq!(config.instance_name(), Some("SQLEXPRESS"));
        assert_eq!(config.idle_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_size(), DEFAULT_MAX_SIZE);
        assert!(config.trust_server_certificate());
        assert!(!config.encrypt());
    }

    #[test]
    fn server_is_accepted_as_instance_alias() {
        let config = ConnectionConfig::from_json_str(
            r#"{"user":"sa","password":"pw","server":"  ","database":"bots"}"#,
        )
        .unwrap();
        assert_eq!(config.instance_name(), None);
        assert_eq!(config.port(), 1433);
    }

    #[test]
    fn rejects_invalid_values() {
        let err = ConnectionConfig::from_json_str(
            r#"{"user":"","password":"pw","database":"bots"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConnectorError::Config(_)));

        let err = ConnectionConfig::builder("sa", "pw", "bots")
            .port(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("port"));
    }

    #[test]
    fn debug_redacts_password() {
        let config = ConnectionConfig::builder("sa", "hunter2", "bots")
            .build()
            .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
