// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The fixed tool surface advertised to the conversation model.
//!
//! Five operations, each taking and returning plain text so they compose
//! uniformly in a conversational transcript. Tool failures are rendered as
//! text (never raised) so the conversation continues gracefully.

use std::str::FromStr;
use std::sync::Arc;

use strum::{Display, EnumString};
use tabletalk_core::{CompletionProvider, ContextCheckpoint, ToolCall, ToolSpec, TabletalkError};
use tabletalk_warehouse::{extract_sql, QueryRunner, RepairContext};
use tracing::{error, info};

use crate::context::ContextUpdate;

/// The closed set of tools the model may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ToolKind {
    GetDatabaseSchema,
    GetSampleData,
    GenerateSqlWithContext,
    QuickTestSql,
    QueryExistingTable,
}

/// Tool definitions advertised to the conversation model.
pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "get_database_schema".into(),
            description:
                "Retrieve the structure of database tables including columns and data types."
                    .into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "schema_name": {
                        "type": "string",
                        "description": "The schema name to query (e.g., 'public', 'sales')"
                    }
                },
                "required": ["schema_name"]
            }),
        },
        ToolSpec {
            name: "get_sample_data".into(),
            description:
                "Fetch sample data (3 rows) from specified tables to understand data structure."
                    .into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "schema_name": {
                        "type": "string",
                        "description": "The schema containing the tables"
                    },
                    "table_names": {
                        "type": "string",
                        "description": "Comma-separated table names (e.g., \"products,sales\")"
                    }
                },
                "required": ["schema_name", "table_names"]
            }),
        },
        ToolSpec {
            name: "generate_sql_with_context".into(),
            description:
                "Generate a SQL query based on user question, schema structure, and sample data."
                    .into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "question": {
                        "type": "string",
                        "description": "The user's question in natural language"
                    },
                    "schema_info": {
                        "type": "string",
                        "description": "Database schema information"
                    },
                    "sample_data": {
                        "type": "string",
                        "description": "Sample data from relevant tables"
                    }
                },
                "required": ["question"]
            }),
        },
        ToolSpec {
            name: "quick_test_sql".into(),
            description: "Test if a SQL query is valid without retrieving full results.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "sql_query": {
                        "type": "string",
                        "description": "The SQL query to validate"
                    }
                },
                "required": ["sql_query"]
            }),
        },
        ToolSpec {
            name: "query_existing_table".into(),
            description: "Execute a SQL query and retrieve actual data from the database.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "sql_query": {
                        "type": "string",
                        "description": "The SQL query to execute"
                    }
                },
                "required": ["sql_query"]
            }),
        },
    ]
}

/// Executes tool calls against the warehouse and the completion service.
#[derive(Clone)]
pub struct Toolbox {
    runner: QueryRunner,
    provider: Arc<dyn CompletionProvider>,
    sql_model: String,
}

impl Toolbox {
    pub fn new(
        runner: QueryRunner,
        provider: Arc<dyn CompletionProvider>,
        sql_model: String,
    ) -> Self {
        Self {
            runner,
            provider,
            sql_model,
        }
    }

    /// Dispatches one tool call.
    ///
    /// Returns the tool result text plus any context update the result
    /// implies. Only the two fetch tools produce updates. Failures come
    /// back as text so the model can react to them.
    pub async fn dispatch(
        &self,
        call: &ToolCall,
        cache: &ContextCheckpoint,
        question: &str,
    ) -> (String, ContextUpdate) {
        let Ok(kind) = ToolKind::from_str(&call.name) else {
            error!(tool = %call.name, "model requested an unknown tool");
            return (
                format!("Error: unknown tool {}", call.name),
                ContextUpdate::default(),
            );
        };
        info!(tool = %kind, "dispatching tool call");

        match kind {
            ToolKind::GetDatabaseSchema => {
                match self.get_database_schema(&call.arguments, cache, question).await {
                    Ok(text) => {
                        let update = ContextUpdate {
                            schema_text: Some(text.clone()),
                            sample_text: None,
                        };
                        (text, update)
                    }
                    Err(e) => {
                        error!(tool = %kind, error = %e, "tool failed");
                        (format!("Error: {e}"), ContextUpdate::default())
                    }
                }
            }
            ToolKind::GetSampleData => match self.get_sample_data(&call.arguments).await {
                Ok(text) => {
                    let update = ContextUpdate {
                        schema_text: None,
                        sample_text: Some(text.clone()),
                    };
                    (text, update)
                }
                Err(e) => {
                    error!(tool = %kind, error = %e, "tool failed");
                    (format!("Error: {e}"), ContextUpdate::default())
                }
            },
            ToolKind::GenerateSqlWithContext => {
                match self.generate_sql_with_context(&call.arguments).await {
                    Ok(text) => (text, ContextUpdate::default()),
                    Err(e) => {
                        error!(tool = %kind, error = %e, "tool failed");
                        (format!("Error: {e}"), ContextUpdate::default())
                    }
                }
            }
            ToolKind::QuickTestSql => match self.quick_test_sql(&call.arguments).await {
                Ok(text) => (text, ContextUpdate::default()),
                Err(e) => (format!("SQL Failed: {e}"), ContextUpdate::default()),
            },
            ToolKind::QueryExistingTable => {
                match self.query_existing_table(&call.arguments, cache, question).await {
                    Ok(text) => (text, ContextUpdate::default()),
                    Err(e) => {
                        error!(tool = %kind, error = %e, "tool failed");
                        (format!("Error: {e}"), ContextUpdate::default())
                    }
                }
            }
        }
    }

    async fn get_database_schema(
        &self,
        args: &serde_json::Value,
        cache: &ContextCheckpoint,
        question: &str,
    ) -> Result<String, TabletalkError> {
        let schema_name = arg(args, "schema_name");
        let sql = format!(
            "SELECT table_catalog,table_schema,table_name,column_name,\
             ordinal_position,is_nullable,data_type \
             FROM information_schema.columns WHERE table_schema='{schema_name}'"
        );
        let outcome = self.runner.run(&sql, &repair_context(cache, question)).await?;
        Ok(outcome.table_text)
    }

    async fn get_sample_data(&self, args: &serde_json::Value) -> Result<String, TabletalkError> {
        let schema_name = arg(args, "schema_name");
        let sqls: Vec<String> = arg(args, "table_names")
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|table| format!("SELECT * FROM {schema_name}.{table} LIMIT 3"))
            .collect();
        let results = self.runner.executor().run_batch(&sqls).await?;
        Ok(results.join("\n\n"))
    }

    async fn generate_sql_with_context(
        &self,
        args: &serde_json::Value,
    ) -> Result<String, TabletalkError> {
        let prompt = generation_prompt(
            arg(args, "question"),
            arg(args, "schema_info"),
            arg(args, "sample_data"),
        );
        let response = self.provider.complete(&prompt, &self.sql_model).await?;
        Ok(extract_sql(&response))
    }

    async fn quick_test_sql(&self, args: &serde_json::Value) -> Result<String, TabletalkError> {
        let mut test_query = arg(args, "sql_query").trim().to_string();
        // Keep the probe cheap.
        if !test_query.to_uppercase().contains("LIMIT") {
            test_query.push_str(" LIMIT 1");
        }
        let executor = self.runner.executor();
        let handle = executor.submit(&test_query).await?;
        executor.await_finished(&test_query, &handle).await?;
        Ok("SQL is valid ✓".to_string())
    }

    async fn query_existing_table(
        &self,
        args: &serde_json::Value,
        cache: &ContextCheckpoint,
        question: &str,
    ) -> Result<String, TabletalkError> {
        let sql = arg(args, "sql_query");
        let outcome = self.runner.run(sql, &repair_context(cache, question)).await?;
        Ok(outcome.table_text)
    }
}

fn arg<'a>(args: &'a serde_json::Value, key: &str) -> &'a str {
    args.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

fn repair_context(cache: &ContextCheckpoint, question: &str) -> RepairContext {
    RepairContext {
        schema_text: cache.schema_text.clone(),
        sample_text: cache.sample_text.clone(),
        intent: question.to_string(),
    }
}

/// Builds the SQL generation prompt from the question and cached context.
fn generation_prompt(question: &str, schema_info: &str, sample_data: &str) -> String {
    format!(
        "You are an expert PostgreSQL/Redshift developer.\n\
\n\
Schema Information:\n\
########\n\
{schema_info}\n\
########\n\
\n\
Sample Data:\n\
########\n\
{sample_data}\n\
########\n\
\n\
Instructions:\n\
1. Always include schema name for tables (e.g., public.product_catalog)\n\
2. Use only required columns for efficiency\n\
3. Wrap column/table names with double quotes if they contain special characters\n\
4. Don't reference the database name explicitly\n\
5. Use appropriate JOINs when querying multiple tables\n\
6. Consider aggregations (SUM, COUNT, AVG) for analytical questions\n\
\n\
Return ONLY the SQL query inside <sql> tags:\n\
<sql>\n\
your SQL query here\n\
</sql>\n\
\n\
User Question: {question}"
    )
}
