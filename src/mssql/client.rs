use tiberius::error::Error as TiberiusError;
use tiberius::{Client, Config as TiberiusConfig, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::TokioAsyncWriteCompatExt;
use tracing::debug;

use super::config::{MssqlClient, build_tiberius_config};
use crate::config::ConnectionConfig;
use crate::diagnostics::{ConnectionCode, DriverError, Phase};

/// Open a single client connection.
///
/// Named instances are resolved through the SQL Server Browser; otherwise the
/// configured host and port are dialled directly. A routing redirect from the
/// server (Azure gateways) is followed once.
///
/// # Errors
/// Returns a connection-category `DriverError` describing the failed step.
pub async fn connect(config: &ConnectionConfig) -> Result<MssqlClient, DriverError> {
    let tiberius = build_tiberius_config(config);
    let named = config.instance_name().is_some();
    let tcp = open_stream(&tiberius, named).await?;

    match Client::connect(tiberius.clone(), tcp.compat_write()).await {
        Ok(client) => Ok(client),
        Err(TiberiusError::Routing { host, port }) => {
            debug!(%host, port, "SQL Server redirected the connection");
            let mut routed = tiberius;
            routed.host(&host);
            routed.port(port);
            let tcp = open_stream(&routed, false).await?;
            Client::connect(routed, tcp.compat_write())
                .await
                .map_err(|e| DriverError::from_tiberius(e, Phase::Connect))
        }
        Err(e) => Err(DriverError::from_tiberius(e, Phase::Connect)),
    }
}

async fn open_stream(tiberius: &TiberiusConfig, named: bool) -> Result<TcpStream, DriverError> {
    let tcp = if named {
        TcpStream::connect_named(tiberius).await.map_err(|e| {
            let message = format!("Failed to resolve the named instance: {e}");
            DriverError::connection(ConnectionCode::InstanceLookup, message)
                .with_original(DriverError::from_tiberius(e, Phase::Connect))
        })?
    } else {
        TcpStream::connect(tiberius.get_addr())
            .await
            .map_err(|e| DriverError::from_io(&e, Phase::Connect))?
    };
    tcp.set_nodelay(true)
        .map_err(|e| DriverError::from_io(&e, Phase::Connect))?;
    Ok(tcp)
}
