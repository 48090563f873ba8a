use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mssql_connector::{ActionKind, ConnectionConfig, ConnectorError};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run Microsoft SQL Server integration actions")]
pub(crate) struct Args {
    /// JSON configuration file (`user`, `password`, `instanceName`, `database`, `port`)
    #[arg(long, global = true, conflicts_with_all = ["user", "password", "database"])]
    pub(crate) config: Option<PathBuf>,
    #[arg(long, global = true)]
    pub(crate) user: Option<String>,
    #[arg(long, global = true)]
    pub(crate) password: Option<String>,
    #[arg(long, global = true)]
    pub(crate) database: Option<String>,
    #[arg(long, global = true)]
    pub(crate) host: Option<String>,
    #[arg(long, global = true)]
    pub(crate) instance_name: Option<String>,
    #[arg(long, global = true)]
    pub(crate) port: Option<u16>,
    /// Also write logs to this file
    #[arg(long, global = true)]
    pub(crate) log: Option<PathBuf>,
    #[arg(short, long, global = true)]
    pub(crate) verbose: bool,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Check that the server accepts the configured credentials
    Register,
    /// Run one action with a JSON input object
    Run {
        #[arg(value_enum)]
        action: ActionKind,
        /// Input JSON, or `-` to read it from stdin
        #[arg(long, default_value = "-")]
        input: String,
    },
}

impl Args {
    pub(crate) fn connection_config(&self) -> Result<ConnectionConfig, ConnectorError> {
        if let Some(path) = &self.config {
            return ConnectionConfig::from_file(path);
        }
        let (Some(user), Some(password), Some(database)) =
            (&self.user, &self.password, &self.database)
        else {
            return Err(ConnectorError::Config(
                "either --config or --user, --password and --database are required".into(),
            ));
        };

        let mut builder = ConnectionConfig::builder(user, password, database)
            .instance_name(self.instance_name.clone());
        if let Some(host) = &self.host {
            builder = builder.host(host);
        }
        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        builder.build()
    }
}

pub(crate) fn read_input(input: &str) -> Result<serde_json::Value, ConnectorError> {
    let text = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| ConnectorError::Validation(format!("cannot read stdin: {e}")))?;
        buf
    } else {
        input.to_string()
    };
    Ok(serde_json::from_str(&text)?)
}
