// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the warehouse data API.
//!
//! Implements [`WarehouseApi`] over the RPC-over-JSON protocol. Statement
//! submission is fire-and-forget: the service returns a handle immediately
//! and completion is observed by polling describe.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tabletalk_config::model::WarehouseConfig;
use tabletalk_core::types::{
    ConnectionTarget, ResultSet, StatementDescription, StatementHandle, StatementStatus,
    SubStatementDescription,
};
use tabletalk_core::{TabletalkError, WarehouseApi};
use tracing::debug;

use crate::wire::{
    ApiErrorResponse, BatchExecuteStatementRequest, DescribeStatementResponse,
    ExecuteStatementRequest, ExecuteStatementResponse, GetStatementResultResponse,
    ListDatabasesRequest, ListDatabasesResponse, ListSchemasResponse, ListTablesRequest,
    ListTablesResponse, StatementIdRequest,
};

const TARGET_PREFIX: &str = "RedshiftData";

/// HTTP client for the warehouse data API.
#[derive(Debug, Clone)]
pub struct DataApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl DataApiClient {
    /// Creates a new data-API client against the given endpoint.
    pub fn new(endpoint: String, api_key: String) -> Result<Self, TabletalkError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| TabletalkError::Config(format!("invalid API key header value: {e}")))?;
        auth.set_sensitive(true);
        headers.insert("authorization", auth);
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/x-amz-json-1.1"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| TabletalkError::Warehouse {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Builds a client from configuration. The API key must be present in
    /// config or via the `TABLETALK_WAREHOUSE_API_KEY` environment override.
    pub fn from_config(config: &WarehouseConfig) -> Result<Self, TabletalkError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| TabletalkError::Config("warehouse.api_key is not set".to_string()))?;
        Self::new(config.endpoint.clone(), api_key)
    }

    /// Sends one RPC operation and parses the response.
    async fn call<Req, Resp>(&self, operation: &str, request: &Req) -> Result<Resp, TabletalkError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let response = self
            .client
            .post(&self.base_url)
            .header("x-amz-target", format!("{TARGET_PREFIX}.{operation}"))
            .json(request)
            .send()
            .await
            .map_err(|e| TabletalkError::Warehouse {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, operation, "data API response received");

        let body = response
            .text()
            .await
            .map_err(|e| TabletalkError::Warehouse {
                message: format!("failed to read response body: {e}"),
                source: Some(Box::new(e)),
            })?;

        if !status.is_success() {
            return Err(classify_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| TabletalkError::Warehouse {
            message: format!("failed to parse {operation} response: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

/// Maps a non-success response to an error kind.
///
/// `ResourceNotFoundException` means "no result materialized for this
/// handle"; callers poll describe instead of surfacing it.
fn classify_error(status: reqwest::StatusCode, body: &str) -> TabletalkError {
    if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(body)
        && !api_err.type_.is_empty()
    {
        let message = format!("{}: {}", api_err.type_, api_err.message);
        if api_err.type_.contains("ResourceNotFoundException") {
            return TabletalkError::ResourceNotFound { message };
        }
        if api_err.type_.contains("ThrottlingException") {
            return TabletalkError::Throttled { message };
        }
        return TabletalkError::Warehouse {
            message,
            source: None,
        };
    }
    TabletalkError::Warehouse {
        message: format!("API returned {status}: {body}"),
        source: None,
    }
}

fn parse_status(raw: &str) -> Result<StatementStatus, TabletalkError> {
    StatementStatus::from_str(raw).map_err(|_| TabletalkError::Warehouse {
        message: format!("unknown statement status: {raw}"),
        source: None,
    })
}

/// Splits the connection target into the pair of optional request fields.
fn target_fields(target: &ConnectionTarget) -> (Option<&str>, Option<&str>) {
    match target {
        ConnectionTarget::Cluster(id) => (Some(id.as_str()), None),
        ConnectionTarget::Workgroup(name) => (None, Some(name.as_str())),
    }
}

#[async_trait]
impl WarehouseApi for DataApiClient {
    async fn execute_statement(
        &self,
        sql: &str,
        target: &ConnectionTarget,
        database: &str,
    ) -> Result<StatementHandle, TabletalkError> {
        let (cluster_identifier, workgroup_name) = target_fields(target);
        let response: ExecuteStatementResponse = self
            .call(
                "ExecuteStatement",
                &ExecuteStatementRequest {
                    sql,
                    database,
                    cluster_identifier,
                    workgroup_name,
                },
            )
            .await?;
        Ok(StatementHandle(response.id))
    }

    async fn batch_execute_statement(
        &self,
        sqls: &[String],
        target: &ConnectionTarget,
        database: &str,
    ) -> Result<StatementHandle, TabletalkError> {
        let (cluster_identifier, workgroup_name) = target_fields(target);
        let response: ExecuteStatementResponse = self
            .call(
                "BatchExecuteStatement",
                &BatchExecuteStatementRequest {
                    sqls,
                    database,
                    cluster_identifier,
                    workgroup_name,
                },
            )
            .await?;
        Ok(StatementHandle(response.id))
    }

    async fn describe_statement(
        &self,
        handle: &StatementHandle,
    ) -> Result<StatementDescription, TabletalkError> {
        let response: DescribeStatementResponse = self
            .call(
                "DescribeStatement",
                &StatementIdRequest {
                    id: &handle.0,
                    next_token: None,
                },
            )
            .await?;

        let mut sub_statements = Vec::with_capacity(response.sub_statements.len());
        for sub in response.sub_statements {
            sub_statements.push(SubStatementDescription {
                status: parse_status(&sub.status)?,
                id: sub.id,
                error: sub.error,
            });
        }
        Ok(StatementDescription {
            status: parse_status(&response.status)?,
            id: response.id,
            error: response.error,
            query_string: response.query_string,
            sub_statements,
        })
    }

    async fn get_statement_result(
        &self,
        handle: &StatementHandle,
    ) -> Result<ResultSet, TabletalkError> {
        let mut result = ResultSet::default();
        let mut next_token: Option<String> = None;

        // Results are paginated; follow the token until exhausted.
        loop {
            let response: GetStatementResultResponse = self
                .call(
                    "GetStatementResult",
                    &StatementIdRequest {
                        id: &handle.0,
                        next_token: next_token.as_deref(),
                    },
                )
                .await?;

            if result.columns.is_empty() {
                result.columns = response.column_metadata.into_iter().map(Into::into).collect();
            }
            result.records.extend(
                response
                    .records
                    .into_iter()
                    .map(|row| row.into_iter().map(|cell| cell.into_field_value()).collect()),
            );

            match response.next_token {
                Some(token) => next_token = Some(token),
                None => return Ok(result),
            }
        }
    }

    async fn list_databases(
        &self,
        target: &ConnectionTarget,
        database: &str,
    ) -> Result<Vec<String>, TabletalkError> {
        let (cluster_identifier, workgroup_name) = target_fields(target);
        let response: ListDatabasesResponse = self
            .call(
                "ListDatabases",
                &ListDatabasesRequest {
                    database,
                    cluster_identifier,
                    workgroup_name,
                },
            )
            .await?;
        Ok(response.databases)
    }

    async fn list_schemas(
        &self,
        target: &ConnectionTarget,
        database: &str,
    ) -> Result<Vec<String>, TabletalkError> {
        let (cluster_identifier, workgroup_name) = target_fields(target);
        let response: ListSchemasResponse = self
            .call(
                "ListSchemas",
                &ListDatabasesRequest {
                    database,
                    cluster_identifier,
                    workgroup_name,
                },
            )
            .await?;
        Ok(response.schemas)
    }

    async fn list_tables(
        &self,
        target: &ConnectionTarget,
        database: &str,
        schema: &str,
    ) -> Result<Vec<String>, TabletalkError> {
        let (cluster_identifier, workgroup_name) = target_fields(target);
        let response: ListTablesResponse = self
            .call(
                "ListTables",
                &ListTablesRequest {
                    database,
                    schema_pattern: schema,
                    cluster_identifier,
                    workgroup_name,
                },
            )
            .await?;
        Ok(response.tables.into_iter().map(|t| t.name).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabletalk_core::types::FieldValue;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> DataApiClient {
        DataApiClient::new(base_url.to_string(), "test-api-key".into()).unwrap()
    }

    fn workgroup() -> ConnectionTarget {
        ConnectionTarget::Workgroup("analytics".into())
    }

    #[tokio::test]
    async fn execute_statement_returns_handle() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("x-amz-target", "RedshiftData.ExecuteStatement"))
            .and(body_partial_json(serde_json::json!({
                "Sql": "SELECT 1",
                "Database": "dev",
                "WorkgroupName": "analytics"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"Id": "stmt-42"})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let handle = client
            .execute_statement("SELECT 1", &workgroup(), "dev")
            .await
            .unwrap();
        assert_eq!(handle.0, "stmt-42");
    }

    #[tokio::test]
    async fn describe_statement_parses_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", "RedshiftData.DescribeStatement"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Id": "stmt-42",
                "Status": "FAILED",
                "Error": "column \"prce\" does not exist",
                "QueryString": "SELECT prce FROM public.products"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let desc = client
            .describe_statement(&StatementHandle("stmt-42".into()))
            .await
            .unwrap();
        assert_eq!(desc.status, StatementStatus::Failed);
        assert!(desc.error.unwrap().contains("does not exist"));
        assert_eq!(
            desc.query_string.as_deref(),
            Some("SELECT prce FROM public.products")
        );
    }

    #[tokio::test]
    async fn get_statement_result_maps_typed_cells() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", "RedshiftData.GetStatementResult"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ColumnMetadata": [{"name": "a"}, {"name": "b"}],
                "Records": [
                    [{"longValue": 1}, {"stringValue": "x"}],
                    [{"isNull": true}, {"booleanValue": true}]
                ]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client
            .get_statement_result(&StatementHandle("stmt-42".into()))
            .await
            .unwrap();
        assert_eq!(result.columns.len(), 2);
        assert_eq!(result.records[0][0], FieldValue::Long(1));
        assert_eq!(result.records[1][0], FieldValue::Null);
    }

    #[tokio::test]
    async fn get_statement_result_follows_pagination() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", "RedshiftData.GetStatementResult"))
            .and(body_partial_json(serde_json::json!({"NextToken": "page2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ColumnMetadata": [{"name": "a"}],
                "Records": [[{"longValue": 2}]]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", "RedshiftData.GetStatementResult"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ColumnMetadata": [{"name": "a"}],
                "Records": [[{"longValue": 1}]],
                "NextToken": "page2"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client
            .get_statement_result(&StatementHandle("stmt-42".into()))
            .await
            .unwrap();
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[1][0], FieldValue::Long(2));
    }

    #[tokio::test]
    async fn missing_result_maps_to_resource_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", "RedshiftData.GetStatementResult"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "__type": "ResourceNotFoundException",
                "message": "Query does not have a result"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client
            .get_statement_result(&StatementHandle("stmt-42".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, TabletalkError::ResourceNotFound { .. }));
    }

    #[tokio::test]
    async fn list_tables_sends_schema_pattern() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", "RedshiftData.ListTables"))
            .and(body_partial_json(
                serde_json::json!({"SchemaPattern": "public"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Tables": [{"name": "products"}, {"name": "sales"}]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let tables = client
            .list_tables(&workgroup(), "dev", "public")
            .await
            .unwrap();
        assert_eq!(tables, vec!["products", "sales"]);
    }
}
