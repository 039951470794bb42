// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Warehouse data-API adapter trait.

use async_trait::async_trait;

use crate::error::TabletalkError;
use crate::types::{
    ConnectionTarget, ResultSet, StatementDescription, StatementHandle,
};

/// The asynchronous statement service of the warehouse.
///
/// Submission returns immediately with a handle; completion is observed by
/// polling [`describe_statement`](WarehouseApi::describe_statement).
/// Fetching a result that has not materialized yet returns
/// [`TabletalkError::ResourceNotFound`], which callers treat as "poll
/// describe instead".
#[async_trait]
pub trait WarehouseApi: Send + Sync {
    /// Submits a single statement for asynchronous execution.
    async fn execute_statement(
        &self,
        sql: &str,
        target: &ConnectionTarget,
        database: &str,
    ) -> Result<StatementHandle, TabletalkError>;

    /// Submits several statements as one batch. Only supported for cluster
    /// targets; the returned handle describes the whole batch.
    async fn batch_execute_statement(
        &self,
        sqls: &[String],
        target: &ConnectionTarget,
        database: &str,
    ) -> Result<StatementHandle, TabletalkError>;

    /// Reports the current status of a statement (or batch).
    async fn describe_statement(
        &self,
        handle: &StatementHandle,
    ) -> Result<StatementDescription, TabletalkError>;

    /// Fetches the typed column/row records for a finished statement.
    async fn get_statement_result(
        &self,
        handle: &StatementHandle,
    ) -> Result<ResultSet, TabletalkError>;

    /// Lists databases reachable through the connection target.
    async fn list_databases(
        &self,
        target: &ConnectionTarget,
        database: &str,
    ) -> Result<Vec<String>, TabletalkError>;

    /// Lists schemas in the given database.
    async fn list_schemas(
        &self,
        target: &ConnectionTarget,
        database: &str,
    ) -> Result<Vec<String>, TabletalkError>;

    /// Lists table names in the given schema.
    async fn list_tables(
        &self,
        target: &ConnectionTarget,
        database: &str,
        schema: &str,
    ) -> Result<Vec<String>, TabletalkError>;
}
