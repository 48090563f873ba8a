// SQL Server driver layer on top of tiberius:
// - config: tiberius configuration and the deadpool manager
// - client: raw connection setup (named instances, routing)
// - params: binding request values onto queries
// - query: result stream decoding
// - executor: running one request on a client
// - pool: the pooled executor and its opener

pub mod client;
pub mod config;
pub mod executor;
mod params;
mod pool;
mod query;

pub use config::{MssqlClient, MssqlManager};
pub use pool::{MssqlPool, MssqlPoolOpener};
