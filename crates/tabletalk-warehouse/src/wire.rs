// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the warehouse data API.
//!
//! The service speaks an RPC-over-JSON protocol: every operation is a POST
//! to the endpoint root with an `x-amz-target` header naming the operation.
//! Top-level request/response keys are PascalCase; nested column and table
//! descriptors are camelCase.

use serde::{Deserialize, Serialize};
use tabletalk_core::types::{ColumnMetadata, FieldValue};

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExecuteStatementRequest<'a> {
    pub sql: &'a str,
    pub database: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_identifier: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workgroup_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchExecuteStatementRequest<'a> {
    pub sqls: &'a [String],
    pub database: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_identifier: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workgroup_name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExecuteStatementResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatementIdRequest<'a> {
    pub id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeStatementResponse {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub query_string: Option<String>,
    #[serde(default)]
    pub sub_statements: Vec<SubStatementData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubStatementData {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetStatementResultResponse {
    #[serde(default)]
    pub column_metadata: Vec<WireColumn>,
    #[serde(default)]
    pub records: Vec<Vec<WireField>>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireColumn {
    pub name: String,
}

/// A typed result cell. Exactly one field is populated per cell.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireField {
    #[serde(default)]
    pub string_value: Option<String>,
    #[serde(default)]
    pub long_value: Option<i64>,
    #[serde(default)]
    pub double_value: Option<f64>,
    #[serde(default)]
    pub boolean_value: Option<bool>,
    #[serde(default)]
    pub is_null: Option<bool>,
}

impl WireField {
    pub fn into_field_value(self) -> FieldValue {
        if let Some(s) = self.string_value {
            FieldValue::String(s)
        } else if let Some(v) = self.long_value {
            FieldValue::Long(v)
        } else if let Some(v) = self.double_value {
            FieldValue::Double(v)
        } else if let Some(v) = self.boolean_value {
            FieldValue::Boolean(v)
        } else {
            FieldValue::Null
        }
    }
}

impl From<WireColumn> for ColumnMetadata {
    fn from(col: WireColumn) -> Self {
        ColumnMetadata { name: col.name }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListDatabasesRequest<'a> {
    pub database: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_identifier: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workgroup_name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListDatabasesResponse {
    #[serde(default)]
    pub databases: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListSchemasResponse {
    #[serde(default)]
    pub schemas: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListTablesRequest<'a> {
    pub database: &'a str,
    pub schema_pattern: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_identifier: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workgroup_name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListTablesResponse {
    #[serde(default)]
    pub tables: Vec<TableEntry>,
}

#[derive(Debug, Deserialize)]
pub struct TableEntry {
    pub name: String,
}

/// Error body returned by the data API on failure.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(rename = "__type", default)]
    pub type_: String,
    #[serde(default, alias = "Message")]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_request_serializes_pascal_case() {
        let req = ExecuteStatementRequest {
            sql: "SELECT 1",
            database: "dev",
            cluster_identifier: None,
            workgroup_name: Some("analytics"),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["Sql"], "SELECT 1");
        assert_eq!(json["WorkgroupName"], "analytics");
        assert!(json.get("ClusterIdentifier").is_none());
    }

    #[test]
    fn wire_field_maps_each_variant() {
        let cell: WireField =
            serde_json::from_value(serde_json::json!({"stringValue": "x"})).unwrap();
        assert_eq!(cell.into_field_value(), FieldValue::String("x".into()));

        let cell: WireField = serde_json::from_value(serde_json::json!({"longValue": 7})).unwrap();
        assert_eq!(cell.into_field_value(), FieldValue::Long(7));

        let cell: WireField =
            serde_json::from_value(serde_json::json!({"doubleValue": 1.5})).unwrap();
        assert_eq!(cell.into_field_value(), FieldValue::Double(1.5));

        let cell: WireField =
            serde_json::from_value(serde_json::json!({"booleanValue": false})).unwrap();
        assert_eq!(cell.into_field_value(), FieldValue::Boolean(false));

        let cell: WireField =
            serde_json::from_value(serde_json::json!({"isNull": true})).unwrap();
        assert_eq!(cell.into_field_value(), FieldValue::Null);
    }

    #[test]
    fn describe_response_parses_sub_statements() {
        let body = serde_json::json!({
            "Id": "batch-1",
            "Status": "FINISHED",
            "SubStatements": [
                {"Id": "batch-1:1", "Status": "FINISHED"},
                {"Id": "batch-1:2", "Status": "FAILED", "Error": "relation does not exist"}
            ]
        });
        let resp: DescribeStatementResponse = serde_json::from_value(body).unwrap();
        assert_eq!(resp.sub_statements.len(), 2);
        assert_eq!(
            resp.sub_statements[1].error.as_deref(),
            Some("relation does not exist")
        );
    }
}
