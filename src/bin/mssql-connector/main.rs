mod args;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use mssql_connector::{Connector, ConnectorError};
use serde_json::{Value as JsonValue, json};
use tracing::Level;

use crate::args::{Args, Command, read_input};
use crate::logging::LogWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let writer = LogWriter::new(args.log.clone()).unwrap_or_else(|err| {
        eprintln!("failed to open log file: {err}");
        std::process::exit(1);
    });

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_target(false)
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .init();

    match run(&args).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            println!("{}", error_record(&err));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<JsonValue, ConnectorError> {
    let connector = Connector::new(args.connection_config()?);
    match &args.command {
        Command::Register => {
            connector.register().await?;
            Ok(json!({}))
        }
        Command::Run { action, input } => {
            let input = read_input(input)?;
            tracing::debug!(%action, "dispatching action");
            connector.dispatch(*action, input).await
        }
    }
}

fn error_record(err: &ConnectorError) -> JsonValue {
    json!({
        "error": err.to_string(),
        "category": err.category(),
        "details": err.classified(),
    })
}
