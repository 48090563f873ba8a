use std::time::Duration;

use mssql_connector::diagnostics::ConnectionCode;
use mssql_connector::test_utils::FakeOpener;
use mssql_connector::{ConnectionConfig, ConnectorError, DriverError, ErrorCategory, PoolManager};

fn config() -> Result<ConnectionConfig, ConnectorError> {
    ConnectionConfig::builder("sa", "secret", "bots")
        .instance_name(Some("SQLEXPRESS".into()))
        .build()
}

#[tokio::test(flavor = "current_thread")]
async fn later_acquires_return_the_same_pool() -> Result<(), ConnectorError> {
    let opener = FakeOpener::new();
    let manager = PoolManager::with_opener(config()?, opener.clone());

    let first = manager.acquire().await?;
    for _ in 0..5 {
        let again = manager.acquire().await?;
        assert!(std::ptr::eq(first, again), "acquire must not replace the pool");
    }
    assert_eq!(opener.opens(), 1);
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn failed_first_acquire_is_a_connection_failure_and_retries() -> Result<(), ConnectorError> {
    let opener = FakeOpener::new().fail_first(
        1,
        DriverError::connection(ConnectionCode::Socket, "connect ECONNREFUSED 127.0.0.1:1433"),
    );
    let manager = PoolManager::with_opener(config()?, opener.clone());

    let err = manager.acquire().await.expect_err("first open fails");
    assert!(err.is_connection_failure());
    assert_eq!(err.category(), Some(ErrorCategory::Connection));
    assert!(
        err.to_string()
            .starts_with("Failed to connect to Microsoft SQL Server, Socket error.")
    );
    assert!(!manager.is_open());

    manager.acquire().await?;
    assert!(manager.is_open());
    assert_eq!(opener.opens(), 2);
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn concurrent_first_acquires_open_once() -> Result<(), ConnectorError> {
    let opener = FakeOpener::new().with_delay(Duration::from_millis(20));
    let manager = PoolManager::with_opener(config()?, opener.clone());

    let (a, b, c) = tokio::join!(manager.acquire(), manager.acquire(), manager.acquire());
    let (a, b, c) = (a?, b?, c?);
    assert!(std::ptr::eq(a, b));
    assert!(std::ptr::eq(b, c));
    assert_eq!(opener.opens(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shared_manager_opens_once_across_tasks() -> Result<(), ConnectorError> {
    let opener = FakeOpener::new().with_delay(Duration::from_millis(20));
    let manager = std::sync::Arc::new(PoolManager::with_opener(config()?, opener.clone()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager = std::sync::Arc::clone(&manager);
            tokio::spawn(async move { manager.acquire().await.map(|_| ()) })
        })
        .collect();
    for handle in handles {
        handle.await.expect("task panicked")?;
    }
    assert_eq!(opener.opens(), 1);
    Ok(())
}
