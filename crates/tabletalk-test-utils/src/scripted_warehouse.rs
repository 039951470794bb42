// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted warehouse fake for deterministic testing.
//!
//! Each submission consumes one [`ScriptedStatement`] from a FIFO queue. The
//! script drives the describe status sequence, how many result fetches report
//! "not materialized yet", and the final result set. Submitted SQL is
//! recorded for assertions.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use tabletalk_core::types::{
    ConnectionTarget, ResultSet, StatementDescription, StatementHandle, StatementStatus,
    SubStatementDescription,
};
use tabletalk_core::{TabletalkError, WarehouseApi};

/// Builds a result set from column names and rows of field values.
pub fn result_set(
    columns: &[&str],
    records: Vec<Vec<tabletalk_core::types::FieldValue>>,
) -> ResultSet {
    ResultSet {
        columns: columns
            .iter()
            .map(|name| tabletalk_core::types::ColumnMetadata {
                name: name.to_string(),
            })
            .collect(),
        records,
    }
}

/// Script for one submitted statement.
pub struct ScriptedStatement {
    /// Describe status sequence; the last entry repeats.
    pub statuses: Vec<StatementStatus>,
    /// Engine error text attached to the description.
    pub error: Option<String>,
    /// Number of initial result fetches that report ResourceNotFound.
    pub fetch_not_found: u32,
    /// Result returned once the not-found budget is consumed; `None` means
    /// the result never materializes.
    pub result: Option<ResultSet>,
    /// Substatement scripts for batch submissions.
    pub subs: Vec<ScriptedStatement>,
}

impl ScriptedStatement {
    pub fn new(statuses: Vec<StatementStatus>) -> Self {
        Self {
            statuses,
            error: None,
            fetch_not_found: 0,
            result: None,
            subs: Vec::new(),
        }
    }

    /// A statement that finishes immediately with the given result.
    pub fn finished(result: ResultSet) -> Self {
        Self::new(vec![StatementStatus::Finished]).with_result(result)
    }

    /// A statement that fails immediately with the given engine error.
    pub fn failed(error: &str) -> Self {
        let mut script = Self::new(vec![StatementStatus::Failed]);
        script.error = Some(error.to_string());
        script
    }

    pub fn with_result(mut self, result: ResultSet) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_fetch_not_found(mut self, count: u32) -> Self {
        self.fetch_not_found = count;
        self
    }

    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn with_subs(mut self, subs: Vec<ScriptedStatement>) -> Self {
        self.subs = subs;
        self
    }
}

struct ActiveStatement {
    sql: String,
    statuses: Vec<StatementStatus>,
    error: Option<String>,
    fetch_not_found: u32,
    result: Option<ResultSet>,
    sub_ids: Vec<String>,
    describe_calls: usize,
    fetch_calls: u32,
}

impl ActiveStatement {
    fn from_script(script: ScriptedStatement, sql: String, sub_ids: Vec<String>) -> Self {
        Self {
            sql,
            statuses: script.statuses,
            error: script.error,
            fetch_not_found: script.fetch_not_found,
            result: script.result,
            sub_ids,
            describe_calls: 0,
            fetch_calls: 0,
        }
    }

    fn final_status(&self) -> StatementStatus {
        *self.statuses.last().unwrap_or(&StatementStatus::Finished)
    }
}

#[derive(Default)]
struct Inner {
    scripts: VecDeque<ScriptedStatement>,
    active: HashMap<String, ActiveStatement>,
    submitted: Vec<String>,
    next_id: u32,
    databases: Vec<String>,
    schemas: Vec<String>,
    tables: Vec<String>,
}

/// A warehouse fake whose behavior is scripted per submission.
pub struct ScriptedWarehouse {
    inner: Mutex<Inner>,
}

impl ScriptedWarehouse {
    pub fn new(scripts: Vec<ScriptedStatement>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                scripts: VecDeque::from(scripts),
                ..Inner::default()
            }),
        }
    }

    pub fn with_catalog(
        self,
        databases: Vec<String>,
        schemas: Vec<String>,
        tables: Vec<String>,
    ) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.databases = databases;
            inner.schemas = schemas;
            inner.tables = tables;
        }
        self
    }

    /// All SQL submitted so far, single statements and batch members alike,
    /// in submission order.
    pub fn submitted_sql(&self) -> Vec<String> {
        self.inner.lock().unwrap().submitted.clone()
    }

    fn not_found(id: &str) -> TabletalkError {
        TabletalkError::ResourceNotFound {
            message: format!("ResourceNotFoundException: no result for {id}"),
        }
    }
}

#[async_trait]
impl WarehouseApi for ScriptedWarehouse {
    async fn execute_statement(
        &self,
        sql: &str,
        _target: &ConnectionTarget,
        _database: &str,
    ) -> Result<StatementHandle, TabletalkError> {
        let mut inner = self.inner.lock().unwrap();
        let script = inner.scripts.pop_front().ok_or_else(|| {
            TabletalkError::Internal("no scripted statement left".to_string())
        })?;
        inner.next_id += 1;
        let id = format!("stmt-{}", inner.next_id);
        inner.submitted.push(sql.to_string());
        inner.active.insert(
            id.clone(),
            ActiveStatement::from_script(script, sql.to_string(), Vec::new()),
        );
        Ok(StatementHandle(id))
    }

    async fn batch_execute_statement(
        &self,
        sqls: &[String],
        _target: &ConnectionTarget,
        _database: &str,
    ) -> Result<StatementHandle, TabletalkError> {
        let mut inner = self.inner.lock().unwrap();
        let mut script = inner.scripts.pop_front().ok_or_else(|| {
            TabletalkError::Internal("no scripted statement left".to_string())
        })?;
        inner.next_id += 1;
        let id = format!("stmt-{}", inner.next_id);

        let subs = std::mem::take(&mut script.subs);
        let mut sub_ids = Vec::with_capacity(subs.len());
        for (index, sub) in subs.into_iter().enumerate() {
            let sub_id = format!("{id}:{}", index + 1);
            let sub_sql = sqls.get(index).cloned().unwrap_or_default();
            inner
                .active
                .insert(sub_id.clone(), ActiveStatement::from_script(sub, sub_sql, Vec::new()));
            sub_ids.push(sub_id);
        }

        for sql in sqls {
            inner.submitted.push(sql.clone());
        }
        inner.active.insert(
            id.clone(),
            ActiveStatement::from_script(script, sqls.join("; "), sub_ids),
        );
        Ok(StatementHandle(id))
    }

    async fn describe_statement(
        &self,
        handle: &StatementHandle,
    ) -> Result<StatementDescription, TabletalkError> {
        let mut inner = self.inner.lock().unwrap();

        // Collect substatement views first to avoid aliasing the map entry.
        let sub_ids = match inner.active.get(&handle.0) {
            Some(active) => active.sub_ids.clone(),
            None => return Err(Self::not_found(&handle.0)),
        };
        let mut sub_statements = Vec::with_capacity(sub_ids.len());
        for sub_id in &sub_ids {
            if let Some(sub) = inner.active.get(sub_id) {
                sub_statements.push(SubStatementDescription {
                    id: sub_id.clone(),
                    status: sub.final_status(),
                    error: sub.error.clone(),
                });
            }
        }

        let active = inner
            .active
            .get_mut(&handle.0)
            .ok_or_else(|| Self::not_found(&handle.0))?;
        let index = active.describe_calls.min(active.statuses.len().saturating_sub(1));
        let status = *active
            .statuses
            .get(index)
            .unwrap_or(&StatementStatus::Finished);
        active.describe_calls += 1;

        Ok(StatementDescription {
            id: handle.0.clone(),
            status,
            error: active.error.clone(),
            query_string: Some(active.sql.clone()),
            sub_statements,
        })
    }

    async fn get_statement_result(
        &self,
        handle: &StatementHandle,
    ) -> Result<ResultSet, TabletalkError> {
        let mut inner = self.inner.lock().unwrap();
        let active = inner
            .active
            .get_mut(&handle.0)
            .ok_or_else(|| Self::not_found(&handle.0))?;
        if active.fetch_calls < active.fetch_not_found {
            active.fetch_calls += 1;
            return Err(Self::not_found(&handle.0));
        }
        match &active.result {
            Some(result) => Ok(result.clone()),
            None => Err(Self::not_found(&handle.0)),
        }
    }

    async fn list_databases(
        &self,
        _target: &ConnectionTarget,
        _database: &str,
    ) -> Result<Vec<String>, TabletalkError> {
        Ok(self.inner.lock().unwrap().databases.clone())
    }

    async fn list_schemas(
        &self,
        _target: &ConnectionTarget,
        _database: &str,
    ) -> Result<Vec<String>, TabletalkError> {
        Ok(self.inner.lock().unwrap().schemas.clone())
    }

    async fn list_tables(
        &self,
        _target: &ConnectionTarget,
        _database: &str,
        _schema: &str,
    ) -> Result<Vec<String>, TabletalkError> {
        Ok(self.inner.lock().unwrap().tables.clone())
    }
}
