use mssql_connector::actions::{
    CreateTableInput, DeleteDataInput, InsertDataInput, QueryDataInput, UpdateDataInput,
};
use mssql_connector::diagnostics::ServerDiagnostics;
use mssql_connector::test_utils::{FakeOpener, record_set_result};
use mssql_connector::{
    ActionKind, ConnectionConfig, Connector, ConnectorError, DriverError, ErrorCategory,
    ExecutionMode, PoolManager, RowValues,
};
use serde_json::json;

fn connector() -> Result<(Connector<FakeOpener>, FakeOpener), ConnectorError> {
    let opener = FakeOpener::new();
    let config = ConnectionConfig::builder("sa", "secret", "bots").build()?;
    let connector = Connector::with_pool_manager(PoolManager::with_opener(config, opener.clone()));
    Ok((connector, opener))
}

#[tokio::test(flavor = "current_thread")]
async fn insert_writes_all_rows_in_one_batch() -> Result<(), ConnectorError> {
    let (connector, opener) = connector()?;
    let output = connector
        .insert_data(&InsertDataInput {
            table_name: "users".into(),
            data: r#"[{"name":"Ada","age":36},{"name":"Grace","age":45}]"#.into(),
        })
        .await?;
    assert!(output.result.total_rows_affected() >= 1);

    let requests = opener.requests();
    assert_eq!(requests.len(), 1, "rows must go out as a single statement");
    let (request, mode) = &requests[0];
    assert_eq!(*mode, ExecutionMode::Execute);
    assert_eq!(
        request.sql(),
        "INSERT INTO [users] ([name], [age]) VALUES (@r0c0, @r0c1), (@r1c0, @r1c1)"
    );
    assert_eq!(request.param("r0c0"), Some(&RowValues::Text("Ada".into())));
    assert_eq!(request.param("r1c1"), Some(&RowValues::Int(45)));
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn empty_insert_is_rejected_before_the_pool_opens() -> Result<(), ConnectorError> {
    let (connector, opener) = connector()?;
    let err = connector
        .insert_data(&InsertDataInput {
            table_name: "users".into(),
            data: "[]".into(),
        })
        .await
        .expect_err("empty insert");
    assert!(matches!(err, ConnectorError::Validation(_)));
    assert_eq!(opener.opens(), 0);
    assert!(opener.requests().is_empty());
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn update_binds_params_named_after_fields() -> Result<(), ConnectorError> {
    let (connector, opener) = connector()?;
    connector
        .update_data(&UpdateDataInput {
            table_name: "users".into(),
            data: r#"{"name":"Ada","active":true}"#.into(),
            conditions: "id = 1".into(),
        })
        .await?;

    let requests = opener.requests();
    let names: Vec<&str> = requests[0].0.params().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["name", "active"]);
    assert_eq!(
        requests[0].0.sql(),
        "UPDATE [users] SET [name] = @name, [active] = @active WHERE id = 1"
    );
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn unknown_column_surfaces_as_request_failure() -> Result<(), ConnectorError> {
    let (connector, opener) = connector()?;
    opener.respond_with(Err(DriverError::server_message(ServerDiagnostics {
        number: 207,
        state: 1,
        class: 16,
        line_number: 1,
        server: "sql01\\SQLEXPRESS".into(),
        procedure: String::new(),
        message: "Invalid column name 'nope'.".into(),
    })));

    let err = connector
        .update_data(&UpdateDataInput {
            table_name: "users".into(),
            data: r#"{"nope":1}"#.into(),
            conditions: "id = 1".into(),
        })
        .await
        .expect_err("server rejects the column");

    assert!(err.is_operation_failure());
    assert_eq!(err.category(), Some(ErrorCategory::Request));
    assert!(err.to_string().starts_with("failed to update data in users: "));
    let cause = err.classified().expect("classified cause");
    assert_eq!(cause.code, "EREQUEST");
    assert_eq!(cause.server.as_ref().map(|s| s.number), Some(207));
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn query_returns_record_sets() -> Result<(), ConnectorError> {
    let (connector, opener) = connector()?;
    opener.respond_with(Ok(record_set_result(
        &["id", "name"],
        vec![
            vec![RowValues::Int(1), RowValues::Text("Ada".into())],
            vec![RowValues::Int(2), RowValues::Null],
        ],
    )));

    let output = connector
        .query_data(&QueryDataInput {
            query: "SELECT id, name FROM users".into(),
        })
        .await?;
    let json = serde_json::to_value(&output).expect("serializable");
    assert_eq!(json["result"]["rowsAffected"], json!([2]));
    assert_eq!(
        json["result"]["recordset"],
        json!([{"id": 1, "name": "Ada"}, {"id": 2, "name": null}])
    );
    assert_eq!(opener.requests()[0].1, ExecutionMode::Query);
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn dispatch_routes_by_action_name() -> Result<(), ConnectorError> {
    let (connector, opener) = connector()?;
    let out = connector
        .dispatch(
            ActionKind::CreateTable,
            json!({"tableName": "notes", "data": "{\"id\":\"INT\",\"body\":\"NVARCHAR(MAX)\"}"}),
        )
        .await?;
    assert_eq!(out, json!({}));

    let out = connector
        .dispatch(
            ActionKind::DeleteData,
            json!({"tableName": "notes", "conditions": "id = 3"}),
        )
        .await?;
    assert_eq!(out, json!({"result": {"rowsAffected": [1]}}));

    let sql: Vec<String> = opener
        .requests()
        .iter()
        .map(|(r, _)| r.sql().to_string())
        .collect();
    assert_eq!(
        sql,
        vec![
            "CREATE TABLE [notes] ([id] INT, [body] NVARCHAR(MAX))".to_string(),
            "DELETE FROM [notes] WHERE id = 3".to_string(),
        ]
    );
    assert_eq!(opener.opens(), 1);
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn register_opens_the_pool() -> Result<(), ConnectorError> {
    let (connector, opener) = connector()?;
    connector.register().await?;
    connector.register().await?;
    assert_eq!(opener.opens(), 1);
    assert!(connector.pool_manager().is_open());
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn create_table_keeps_caller_column_order() -> Result<(), ConnectorError> {
    let (connector, opener) = connector()?;
    connector
        .create_table(&CreateTableInput {
            table_name: "users".into(),
            data: r#"{"name":"NVARCHAR(50)","id":"INT PRIMARY KEY"}"#.into(),
        })
        .await?;
    assert_eq!(
        opener.requests()[0].0.sql(),
        "CREATE TABLE [users] ([name] NVARCHAR(50), [id] INT PRIMARY KEY)"
    );
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn failed_operation_keeps_the_shared_pool() -> Result<(), ConnectorError> {
    let (connector, opener) = connector()?;
    opener.respond_with(Err(DriverError::server_message(ServerDiagnostics {
        number: 208,
        state: 1,
        class: 16,
        line_number: 1,
        server: "sql01".into(),
        procedure: String::new(),
        message: "Invalid object name 'missing'.".into(),
    })));

    let err = connector
        .delete_data(&DeleteDataInput {
            table_name: "missing".into(),
            conditions: "id = 1".into(),
        })
        .await
        .expect_err("server rejects the table");
    assert!(err.is_operation_failure());
    let first: *const _ = connector.pool_manager().acquire().await?;

    let output = connector
        .delete_data(&DeleteDataInput {
            table_name: "users".into(),
            conditions: "id = 1".into(),
        })
        .await?;
    assert_eq!(output.result.total_rows_affected(), 1);

    let second: *const _ = connector.pool_manager().acquire().await?;
    assert!(std::ptr::eq(first, second));
    assert_eq!(opener.opens(), 1);
    assert_eq!(opener.requests().len(), 2);
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn update_with_case_duplicate_fields_never_opens_the_pool() -> Result<(), ConnectorError> {
    let (connector, opener) = connector()?;
    let err = connector
        .update_data(&UpdateDataInput {
            table_name: "users".into(),
            data: r#"{"Name":1,"name":2}"#.into(),
            conditions: "id = 1".into(),
        })
        .await
        .expect_err("duplicate field");
    assert_eq!(err.category(), Some(ErrorCategory::Request));
    assert_eq!(opener.opens(), 0);
    assert!(opener.requests().is_empty());
    Ok(())
}
