// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Statement executor: submission, polling, result rendering.
//!
//! Wraps a [`WarehouseApi`] with the connection target and timing budgets,
//! and converts typed result records into tabular text.

use std::sync::Arc;
use std::time::Duration;

use tabletalk_config::model::WarehouseConfig;
use tabletalk_core::types::{
    ConnectionTarget, ResultSet, StatementDescription, StatementHandle, StatementStatus,
};
use tabletalk_core::{TabletalkError, WarehouseApi};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Executes statements against a fixed connection target.
///
/// A cluster target supports native batch submission; a serverless workgroup
/// does not, so batches run sequentially there.
#[derive(Clone)]
pub struct StatementExecutor {
    api: Arc<dyn WarehouseApi>,
    target: ConnectionTarget,
    database: String,
    poll_interval: Duration,
    timeout: Duration,
}

impl std::fmt::Debug for StatementExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatementExecutor")
            .field("target", &self.target)
            .field("database", &self.database)
            .field("poll_interval", &self.poll_interval)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl StatementExecutor {
    pub fn new(
        api: Arc<dyn WarehouseApi>,
        target: ConnectionTarget,
        database: String,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            api,
            target,
            database,
            poll_interval,
            timeout,
        }
    }

    /// Builds an executor from configuration. Exactly one of the cluster and
    /// workgroup identifiers must be set; anything else fails fast.
    pub fn from_config(
        api: Arc<dyn WarehouseApi>,
        config: &WarehouseConfig,
    ) -> Result<Self, TabletalkError> {
        let target = match (&config.cluster_identifier, &config.workgroup_name) {
            (Some(cluster), None) => ConnectionTarget::Cluster(cluster.clone()),
            (None, Some(workgroup)) => ConnectionTarget::Workgroup(workgroup.clone()),
            _ => {
                return Err(TabletalkError::Config(
                    "warehouse connection requires exactly one of cluster_identifier or workgroup_name"
                        .to_string(),
                ));
            }
        };
        Ok(Self::new(
            api,
            target,
            config.database.clone(),
            Duration::from_millis(config.poll_interval_ms),
            Duration::from_secs(config.statement_timeout_secs),
        ))
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Submits one statement for asynchronous execution.
    pub async fn submit(&self, sql: &str) -> Result<StatementHandle, TabletalkError> {
        debug!(sql, "submitting statement");
        self.api
            .execute_statement(sql, &self.target, &self.database)
            .await
    }

    /// Polls describe until the statement leaves the pending statuses.
    ///
    /// Does not treat FAILED/ABORTED as an error; callers inspect the
    /// returned description. Fails with [`TabletalkError::Timeout`] when the
    /// wall-clock budget elapses first.
    pub async fn wait_until_terminal(
        &self,
        handle: &StatementHandle,
    ) -> Result<StatementDescription, TabletalkError> {
        let start = Instant::now();
        loop {
            let description = self.api.describe_statement(handle).await?;
            if description.status.is_terminal() {
                debug!(id = %description.id, status = %description.status, "statement terminal");
                return Ok(description);
            }
            if start.elapsed() >= self.timeout {
                warn!(id = %handle.0, "statement polling budget exhausted");
                return Err(TabletalkError::Timeout {
                    duration: self.timeout,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Polls until terminal and fails if the statement did not finish.
    pub async fn await_finished(
        &self,
        sql: &str,
        handle: &StatementHandle,
    ) -> Result<StatementDescription, TabletalkError> {
        let description = self.wait_until_terminal(handle).await?;
        match description.status {
            StatementStatus::Finished => Ok(description),
            _ => Err(TabletalkError::ExecutionFailed {
                sql: sql.to_string(),
                error: description
                    .error
                    .unwrap_or_else(|| "Unknown error".to_string()),
            }),
        }
    }

    /// Fetches the typed records for a finished statement.
    pub async fn fetch_result(
        &self,
        handle: &StatementHandle,
    ) -> Result<ResultSet, TabletalkError> {
        self.api.get_statement_result(handle).await
    }

    /// Lists databases visible through the connection target.
    pub async fn list_databases(&self) -> Result<Vec<String>, TabletalkError> {
        self.api.list_databases(&self.target, &self.database).await
    }

    /// Lists schemas in the configured database.
    pub async fn list_schemas(&self) -> Result<Vec<String>, TabletalkError> {
        self.api.list_schemas(&self.target, &self.database).await
    }

    /// Lists tables in one schema of the configured database.
    pub async fn list_tables(&self, schema: &str) -> Result<Vec<String>, TabletalkError> {
        self.api
            .list_tables(&self.target, &self.database, schema)
            .await
    }

    /// Runs several statements and returns one tabular text per statement,
    /// in submission order. The whole batch fails if any statement fails.
    ///
    /// Cluster targets submit the list as one native batch and demultiplex
    /// per-substatement results; workgroup targets execute sequentially.
    pub async fn run_batch(&self, sqls: &[String]) -> Result<Vec<String>, TabletalkError> {
        match self.target {
            ConnectionTarget::Cluster(_) => self.run_batch_clustered(sqls).await,
            ConnectionTarget::Workgroup(_) => self.run_batch_sequential(sqls).await,
        }
    }

    async fn run_batch_clustered(&self, sqls: &[String]) -> Result<Vec<String>, TabletalkError> {
        let handle = self
            .api
            .batch_execute_statement(sqls, &self.target, &self.database)
            .await?;
        let description = self.wait_until_terminal(&handle).await?;
        if description.status != StatementStatus::Finished {
            return Err(TabletalkError::ExecutionFailed {
                sql: sqls.join("; "),
                error: description
                    .error
                    .unwrap_or_else(|| "Unknown error".to_string()),
            });
        }

        let mut results = Vec::with_capacity(description.sub_statements.len());
        for (index, sub) in description.sub_statements.iter().enumerate() {
            if sub.status != StatementStatus::Finished {
                return Err(TabletalkError::ExecutionFailed {
                    sql: sqls.get(index).cloned().unwrap_or_default(),
                    error: sub.error.clone().unwrap_or_else(|| "Unknown error".to_string()),
                });
            }
            let result = self
                .fetch_result(&StatementHandle(sub.id.clone()))
                .await?;
            results.push(render_table(&result));
        }
        Ok(results)
    }

    async fn run_batch_sequential(&self, sqls: &[String]) -> Result<Vec<String>, TabletalkError> {
        let mut results = Vec::with_capacity(sqls.len());
        for sql in sqls {
            let handle = self.submit(sql).await?;
            self.await_finished(sql, &handle).await?;
            let result = self.fetch_result(&handle).await?;
            results.push(render_table(&result));
        }
        Ok(results)
    }
}

/// Renders a result set as tabular text: a comma-joined header line of
/// column names, then one comma-joined line per record. Nulls render empty.
pub fn render_table(result: &ResultSet) -> String {
    let mut lines = Vec::with_capacity(result.records.len() + 1);
    lines.push(
        result
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(","),
    );
    for row in &result.records {
        lines.push(row.iter().map(|v| v.render()).collect::<Vec<_>>().join(","));
    }
    let mut text = lines.join("\n");
    text.push('\n');
    text
}
