// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Self-correcting query runner.
//!
//! Submits SQL, polls to a terminal status, and on failure asks the
//! completion service to repair the statement given the engine error, the
//! schema, sample rows, and the user's intent. The repair budget is bounded;
//! exhaustion returns a sentinel result string rather than an error so the
//! conversational layer can surface it as text.

use std::sync::Arc;

use tabletalk_config::model::RunnerConfig;
use tabletalk_core::types::{ResultSet, RunOutcome, StatementHandle, StatementStatus};
use tabletalk_core::{CompletionProvider, TabletalkError};
use tracing::{info, warn};

use crate::executor::{render_table, StatementExecutor};
use crate::extract::extract_sql;

/// Context handed to the repair prompt alongside the failing statement.
#[derive(Debug, Clone, Default)]
pub struct RepairContext {
    pub schema_text: String,
    pub sample_text: String,
    /// The user's natural-language intent.
    pub intent: String,
}

/// Drives the execute, detect-failure, repair, re-execute cycle.
#[derive(Clone)]
pub struct QueryRunner {
    executor: StatementExecutor,
    provider: Arc<dyn CompletionProvider>,
    sql_model: String,
    max_repair_attempts: u32,
    result_fetch_retries: u32,
}

impl QueryRunner {
    pub fn new(
        executor: StatementExecutor,
        provider: Arc<dyn CompletionProvider>,
        sql_model: String,
        config: &RunnerConfig,
    ) -> Self {
        Self {
            executor,
            provider,
            sql_model,
            max_repair_attempts: config.max_repair_attempts,
            result_fetch_retries: config.result_fetch_retries,
        }
    }

    pub fn executor(&self) -> &StatementExecutor {
        &self.executor
    }

    /// Runs one statement to completion, repairing it on failure.
    ///
    /// `final_sql` in the outcome equals the input when the first execution
    /// succeeded; otherwise it is the last repaired statement. When the
    /// repair budget is exhausted the outcome carries the sentinel text
    /// instead of a result table.
    pub async fn run(
        &self,
        sql: &str,
        context: &RepairContext,
    ) -> Result<RunOutcome, TabletalkError> {
        let mut current_sql = sql.trim().to_string();
        let handle = self.executor.submit(&current_sql).await?;

        // Fast path: the result may already be available for statements
        // that finish before the first describe.
        match self.executor.fetch_result(&handle).await {
            Ok(result) => {
                return Ok(RunOutcome {
                    table_text: render_table(&result),
                    final_sql: current_sql,
                    repair_count: 0,
                });
            }
            Err(TabletalkError::ResourceNotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let mut description = self.executor.wait_until_terminal(&handle).await?;
        let mut handle = handle;
        let mut repair_count = 0u32;

        while description.status != StatementStatus::Finished
            && repair_count < self.max_repair_attempts
        {
            let bad_sql = description
                .query_string
                .clone()
                .unwrap_or_else(|| current_sql.clone());
            let error = description
                .error
                .clone()
                .unwrap_or_else(|| "Unknown error".to_string());
            warn!(
                attempt = repair_count + 1,
                error = %error,
                "statement failed, asking the model for a repair"
            );

            let prompt = repair_prompt(&bad_sql, &error, context);
            let completion = self.provider.complete(&prompt, &self.sql_model).await?;
            current_sql = extract_sql(&completion);
            repair_count += 1;
            info!(attempt = repair_count, sql = %current_sql, "repaired statement");

            handle = self.executor.submit(&current_sql).await?;
            description = self.executor.wait_until_terminal(&handle).await?;
        }

        if description.status != StatementStatus::Finished {
            warn!(
                attempts = self.max_repair_attempts,
                "repair budget exhausted, returning sentinel"
            );
            return Ok(RunOutcome {
                table_text: format!(
                    "DEBUGGING FAILED IN {} ATTEMPTS. NO RESULT AVAILABLE",
                    self.max_repair_attempts
                ),
                final_sql: current_sql,
                repair_count,
            });
        }

        let result = self.fetch_result_with_retry(&handle).await?;
        Ok(RunOutcome {
            table_text: render_table(&result),
            final_sql: current_sql,
            repair_count,
        })
    }

    /// Fetches a finished statement's result, retrying while the engine
    /// reports it has not materialized yet.
    async fn fetch_result_with_retry(
        &self,
        handle: &StatementHandle,
    ) -> Result<ResultSet, TabletalkError> {
        let mut last_error = None;
        for attempt in 0..=self.result_fetch_retries {
            match self.executor.fetch_result(handle).await {
                Ok(result) => return Ok(result),
                Err(e @ TabletalkError::ResourceNotFound { .. }) => {
                    if attempt < self.result_fetch_retries {
                        tokio::time::sleep(self.executor.poll_interval()).await;
                    }
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or(TabletalkError::Internal(
            "result fetch retry loop ended without an error".to_string(),
        )))
    }
}

/// Builds the debug prompt for a failing statement.
fn repair_prompt(statement: &str, error: &str, context: &RepairContext) -> String {
    format!(
        "You are a PostgreSQL developer who is an expert at debugging errors.\n\
\n\
Here are the schema definition of table(s):\n\
{schema}\n\
#############################\n\
Here are example records for each table:\n\
{sample}\n\
#############################\n\
Here is the sql statement that threw the error below:\n\
{statement}\n\
#############################\n\
Here is the error to debug:\n\
{error}\n\
#############################\n\
Here is the intent of the user:\n\
{intent}\n\
\n\
First understand the error and think about how you can fix the error.\n\
Use the provided schema and sample records to guide your thought process for a solution.\n\
Do all this thinking inside <thinking></thinking> XML tags. This is a space for you to write down relevant content and will not be shown to the user.\n\
\n\
Once you are done debugging, provide the correct SQL statement without any additional text.\n\
When generating the correct SQL statement:\n\
1. Pay attention to the schema and table name and use them correctly in your generated sql.\n\
2. Never query for all columns from a table unless the question says so. You must query only the columns that are needed to answer the question.\n\
3. Wrap each column name in double quotes (\") to denote them as delimited identifiers. Do not use backslash (\\) to escape underscores (_) in column names.\n\
\n\
Format your response as:\n\
<sql> Correct SQL Statement </sql>",
        schema = context.schema_text,
        sample = context.sample_text,
        statement = statement,
        error = error,
        intent = context.intent,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tabletalk_core::types::{ConnectionTarget, FieldValue};
    use tabletalk_test_utils::{
        result_set, MockCompletion, ScriptedCompletion, ScriptedStatement, ScriptedWarehouse,
    };

    fn runner(
        api: Arc<ScriptedWarehouse>,
        provider: Arc<MockCompletion>,
        max_repair_attempts: u32,
    ) -> QueryRunner {
        let executor = StatementExecutor::new(
            api,
            ConnectionTarget::Workgroup("wg".into()),
            "dev".into(),
            Duration::from_millis(1),
            Duration::from_millis(500),
        );
        let config = RunnerConfig {
            max_repair_attempts,
            result_fetch_retries: 5,
        };
        QueryRunner::new(executor, provider, "amazon.nova-pro-v1:0".into(), &config)
    }

    fn sample_result() -> tabletalk_core::ResultSet {
        result_set(
            &["a", "b"],
            vec![vec![FieldValue::Long(1), FieldValue::String("x".into())]],
        )
    }

    #[tokio::test]
    async fn first_try_success_returns_input_sql_unchanged() {
        let api = Arc::new(ScriptedWarehouse::new(vec![ScriptedStatement::finished(
            sample_result(),
        )]));
        let provider = Arc::new(MockCompletion::with_texts(&[]));
        let outcome = runner(api, provider.clone(), 5)
            .run("SELECT * FROM t LIMIT 1", &RepairContext::default())
            .await
            .unwrap();
        assert_eq!(outcome.final_sql, "SELECT * FROM t LIMIT 1");
        assert_eq!(outcome.repair_count, 0);
        assert!(outcome.table_text.contains("a,b"));
        // No repair completion was requested.
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn success_after_polling_pending_statuses() {
        let api = Arc::new(ScriptedWarehouse::new(vec![ScriptedStatement::new(vec![
            StatementStatus::Submitted,
            StatementStatus::Picked,
            StatementStatus::Started,
            StatementStatus::Finished,
        ])
        .with_fetch_not_found(1)
        .with_result(sample_result())]));
        let provider = Arc::new(MockCompletion::with_texts(&[]));
        let outcome = runner(api, provider, 5)
            .run("SELECT 1", &RepairContext::default())
            .await
            .unwrap();
        assert_eq!(outcome.repair_count, 0);
    }

    #[tokio::test]
    async fn failed_statement_is_repaired_once() {
        let api = Arc::new(ScriptedWarehouse::new(vec![
            ScriptedStatement::failed("column \"prce\" does not exist"),
            ScriptedStatement::finished(sample_result()).with_fetch_not_found(1),
        ]));
        let provider = Arc::new(MockCompletion::with_texts(&[
            "<thinking>typo in column</thinking>\n<sql>SELECT \"price\" FROM public.products</sql>",
        ]));
        let context = RepairContext {
            schema_text: "products: price numeric".into(),
            sample_text: "price\n9.99".into(),
            intent: "show product prices".into(),
        };
        let outcome = runner(api.clone(), provider.clone(), 5)
            .run("SELECT prce FROM public.products", &context)
            .await
            .unwrap();

        assert_eq!(outcome.final_sql, "SELECT \"price\" FROM public.products");
        assert_eq!(outcome.repair_count, 1);
        assert_eq!(provider.calls(), 1);
        assert_eq!(
            api.submitted_sql(),
            vec![
                "SELECT prce FROM public.products",
                "SELECT \"price\" FROM public.products"
            ]
        );

        // The debug prompt carries schema, samples, error, and intent.
        let prompt = &provider.prompts()[0];
        assert!(prompt.contains("products: price numeric"));
        assert!(prompt.contains("column \"prce\" does not exist"));
        assert!(prompt.contains("show product prices"));
        assert!(prompt.contains("SELECT prce FROM public.products"));
    }

    #[tokio::test]
    async fn exhausted_repairs_return_sentinel_not_error() {
        let scripts = (0..6)
            .map(|_| ScriptedStatement::failed("relation \"t\" does not exist"))
            .collect();
        let api = Arc::new(ScriptedWarehouse::new(scripts));
        let provider = Arc::new(MockCompletion::with_texts(&[
            "<sql>SELECT 1</sql>",
            "<sql>SELECT 2</sql>",
            "<sql>SELECT 3</sql>",
            "<sql>SELECT 4</sql>",
            "<sql>SELECT 5</sql>",
        ]));
        let outcome = runner(api.clone(), provider.clone(), 5)
            .run("SELECT * FROM t", &RepairContext::default())
            .await
            .unwrap();

        assert_eq!(
            outcome.table_text,
            "DEBUGGING FAILED IN 5 ATTEMPTS. NO RESULT AVAILABLE"
        );
        assert_eq!(outcome.repair_count, 5);
        // Exactly five repairs: one initial execution plus five resubmissions,
        // and never a sixth completion request.
        assert_eq!(provider.calls(), 5);
        assert_eq!(api.submitted_sql().len(), 6);
    }

    #[tokio::test]
    async fn result_fetch_retries_through_not_found() {
        let api = Arc::new(ScriptedWarehouse::new(vec![ScriptedStatement::new(vec![
            StatementStatus::Started,
            StatementStatus::Finished,
        ])
        .with_fetch_not_found(3)
        .with_result(sample_result())]));
        let provider = Arc::new(MockCompletion::with_texts(&[]));
        let outcome = runner(api, provider, 5)
            .run("SELECT 1", &RepairContext::default())
            .await
            .unwrap();
        assert!(outcome.table_text.contains("a,b"));
    }

    #[tokio::test]
    async fn throttled_repair_completion_propagates() {
        let api = Arc::new(ScriptedWarehouse::new(vec![ScriptedStatement::failed(
            "syntax error",
        )]));
        let provider = Arc::new(MockCompletion::new(vec![ScriptedCompletion::Throttled]));
        let err = runner(api, provider, 5)
            .run("SELEC 1", &RepairContext::default())
            .await
            .unwrap_err();
        assert!(err.is_throttled());
    }
}
