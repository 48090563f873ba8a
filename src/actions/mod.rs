//! Inputs, outputs and names of the actions the connector exposes.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::results::OperationResult;

/// The callable actions, named as the platform names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[value(rename_all = "camelCase")]
pub enum ActionKind {
    CreateTable,
    DropTable,
    InsertData,
    UpdateData,
    DeleteData,
    QueryData,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::CreateTable,
        ActionKind::DropTable,
        ActionKind::InsertData,
        ActionKind::UpdateData,
        ActionKind::DeleteData,
        ActionKind::QueryData,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::CreateTable => "createTable",
            ActionKind::DropTable => "dropTable",
            ActionKind::InsertData => "insertData",
            ActionKind::UpdateData => "updateData",
            ActionKind::DeleteData => "deleteData",
            ActionKind::QueryData => "queryData",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `data` maps column names to SQL types, e.g. `{"id":"INT PRIMARY KEY"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableInput {
    pub table_name: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropTableInput {
    pub table_name: String,
}

/// `data` is a JSON array of row objects sharing the same keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertDataInput {
    pub table_name: String,
    pub data: String,
}

/// `data` is a JSON object of column → new value; `conditions` is the WHERE clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDataInput {
    pub table_name: String,
    pub data: String,
    pub conditions: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDataInput {
    pub table_name: String,
    pub conditions: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDataInput {
    pub query: String,
}

/// Output of actions that return nothing (`{}`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EmptyOutput {}

/// Output of actions that return a driver result (`{"result": ...}`).
#[derive(Debug, Clone, Serialize)]
pub struct ResultOutput {
    pub result: OperationResult,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn inputs_use_camel_case() {
        let input: UpdateDataInput = serde_json::from_value(json!({
            "tableName": "users",
            "data": "{\"name\":\"Ada\"}",
            "conditions": "id = 1"
        }))
        .unwrap();
        assert_eq!(input.table_name, "users");
        assert_eq!(input.conditions, "id = 1");
    }

    #[test]
    fn action_names_round_trip_through_clap_and_serde() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::from_str(kind.as_str(), false).unwrap(), kind);
            assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.as_str()));
        }
    }

    #[test]
    fn empty_output_is_an_empty_object() {
        assert_eq!(serde_json::to_value(EmptyOutput {}).unwrap(), json!({}));
    }
}
