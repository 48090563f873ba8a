use deadpool::managed::{Manager, Metrics, RecycleError, RecycleResult};
use tiberius::{AuthMethod, Client, Config as TiberiusConfig, EncryptionLevel};
use tokio::net::TcpStream;
use tokio_util::compat::Compat;
use tracing::debug;

use super::client;
use crate::config::ConnectionConfig;
use crate::diagnostics::{DriverError, Phase};

/// Type alias for SQL Server client
pub type MssqlClient = Client<Compat<TcpStream>>;

const APPLICATION_NAME: &str = "mssql-connector";

pub(crate) fn build_tiberius_config(config: &ConnectionConfig) -> TiberiusConfig {
    let mut tiberius = TiberiusConfig::new();
    tiberius.host(config.host());
    tiberius.database(config.database());
    tiberius.port(config.port());
    tiberius.authentication(AuthMethod::sql_server(config.user(), config.password()));
    tiberius.application_name(APPLICATION_NAME);
    if let Some(instance) = config.instance_name() {
        tiberius.instance_name(instance);
    }
    tiberius.encryption(if config.encrypt() {
        EncryptionLevel::Required
    } else {
        EncryptionLevel::Off
    });
    if config.trust_server_certificate() {
        tiberius.trust_cert();
    }
    tiberius
}

/// deadpool manager that opens tiberius clients for one configuration.
///
/// Recycling drops connections that sat idle longer than the configured idle
/// timeout and probes the rest with `SELECT 1`.
#[derive(Debug)]
pub struct MssqlManager {
    config: ConnectionConfig,
}

impl MssqlManager {
    #[must_use]
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }
}

impl Manager for MssqlManager {
    type Type = MssqlClient;
    type Error = DriverError;

    async fn create(&self) -> Result<MssqlClient, DriverError> {
        client::connect(&self.config).await
    }

    async fn recycle(
        &self,
        conn: &mut MssqlClient,
        metrics: &Metrics,
    ) -> RecycleResult<DriverError> {
        let idle = metrics.last_used();
        if idle > self.config.idle_timeout() {
            debug!(idle_ms = idle.as_millis(), "discarding idle SQL Server connection");
            return Err(RecycleError::Message(
                "connection exceeded the idle timeout".into(),
            ));
        }
        conn.simple_query("SELECT 1")
            .await
            .map_err(|e| RecycleError::Backend(DriverError::from_tiberius(e, Phase::Request)))?
            .into_results()
            .await
            .map_err(|e| RecycleError::Backend(DriverError::from_tiberius(e, Phase::Request)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiberius_config_uses_port_without_instance() {
        let config = ConnectionConfig::builder("sa", "pw", "bots")
            .host("db.internal")
            .port(14333)
            .build()
            .unwrap();
        let tiberius = build_tiberius_config(&config);
        assert_eq!(tiberius.get_addr(), "db.internal:14333");
    }

    #[test]
    fn named_instance_is_kept_on_the_config() {
        let config = ConnectionConfig::builder("sa", "pw", "bots")
            .instance_name(Some("SQLEXPRESS".into()))
            .build()
            .unwrap();
        let tiberius = build_tiberius_config(&config);
        assert!(tiberius.get_addr().starts_with("localhost:"));
    }
}
