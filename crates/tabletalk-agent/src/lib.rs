// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent control loop for Tabletalk.
//!
//! One [`Agent::invoke`] call is one conversational turn: the model sees the
//! system directive (embedding a preview of the cached context), the message
//! history, and the five tool specs, and loops through tool dispatch until
//! it answers in plain text. Provider throttling retries the whole turn with
//! backoff, reloading the context checkpoint from the store first.

pub mod context;
pub mod tools;
pub mod turn;

use std::sync::Arc;
use std::time::Duration;

use tabletalk_config::model::{AgentConfig, RetryConfig};
use tabletalk_core::{
    ChatBlock, ChatMessage, ContextCheckpoint, ConversationModel, TabletalkError,
};
use tabletalk_storage::SessionStore;
use tracing::{info, warn};

use crate::context::ContextUpdate;
use crate::tools::{tool_specs, Toolbox};
use crate::turn::{system_directive, TurnState};

pub use crate::context::ContextCache;
pub use crate::tools::ToolKind;

/// The conversational entry point.
pub struct Agent {
    model: Arc<dyn ConversationModel>,
    toolbox: Toolbox,
    store: SessionStore,
    conversation_model: String,
    max_turn_iterations: usize,
    max_throttle_retries: u32,
}

impl Agent {
    pub fn new(
        model: Arc<dyn ConversationModel>,
        toolbox: Toolbox,
        store: SessionStore,
        agent_config: &AgentConfig,
        retry_config: &RetryConfig,
    ) -> Self {
        Self {
            model,
            toolbox,
            store,
            conversation_model: agent_config.conversation_model.clone(),
            max_turn_iterations: agent_config.max_turn_iterations,
            max_throttle_retries: retry_config.max_throttle_retries,
        }
    }

    /// Runs one conversational turn and returns the assistant's answer.
    ///
    /// `reset_memory` discards the session's cached context for this turn.
    /// Throttling errors retry the whole turn with exponential backoff,
    /// reloading the checkpoint from the store before each retry so progress
    /// persisted by a partial attempt is not lost.
    pub async fn invoke(
        &self,
        question: &str,
        actor_id: &str,
        session_id: &str,
        reset_memory: bool,
    ) -> Result<String, TabletalkError> {
        info!(question, actor_id, session_id, reset_memory, "turn started");

        let mut checkpoint = if reset_memory {
            ContextCheckpoint::default()
        } else {
            self.store.load_checkpoint(session_id, actor_id).await
        };
        let history = self.load_history(session_id, actor_id).await?;

        let mut attempt = 0u32;
        let (answer, final_checkpoint) = loop {
            let mut messages = history.clone();
            messages.push(ChatMessage::text("user", question));
            let mut state = TurnState::new(messages, checkpoint.clone(), question.to_string());

            match self.run_turn(&mut state, session_id, actor_id).await {
                Ok(answer) => break (answer, state.cache.into_checkpoint()),
                Err(e) if e.is_throttled() && attempt < self.max_throttle_retries => {
                    let wait = Duration::from_secs((1u64 << attempt) + 1);
                    warn!(
                        attempt = attempt + 1,
                        wait_secs = wait.as_secs(),
                        "provider throttled the turn, backing off"
                    );
                    tokio::time::sleep(wait).await;
                    // A partial attempt may have advanced and persisted the
                    // cache; pick that up instead of the stale copy.
                    checkpoint = self.store.load_checkpoint(session_id, actor_id).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        self.store
            .append_message(session_id, actor_id, "user", question)
            .await?;
        self.store
            .append_message(session_id, actor_id, "assistant", &answer)
            .await?;
        self.store
            .save_checkpoint(session_id, actor_id, &final_checkpoint)
            .await?;
        info!(session_id, "turn finished");
        Ok(answer)
    }

    /// The tool-dispatch loop for one attempt of one turn.
    async fn run_turn(
        &self,
        state: &mut TurnState,
        session_id: &str,
        actor_id: &str,
    ) -> Result<String, TabletalkError> {
        let specs = tool_specs();
        for _ in 0..self.max_turn_iterations {
            let directive = system_directive(state.cache.get());
            let turn = self
                .model
                .converse(&self.conversation_model, &directive, &state.messages, &specs)
                .await?;

            if turn.tool_calls.is_empty() {
                state
                    .messages
                    .push(ChatMessage::text("assistant", turn.text.clone()));
                return Ok(turn.text);
            }

            let mut content = Vec::new();
            if !turn.text.is_empty() {
                content.push(ChatBlock::Text {
                    text: turn.text.clone(),
                });
            }
            for call in &turn.tool_calls {
                content.push(ChatBlock::ToolUse {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    input: call.arguments.clone(),
                });
            }
            state.messages.push(ChatMessage {
                role: "assistant".to_string(),
                content,
            });

            let mut round_update = ContextUpdate::default();
            let mut results = Vec::with_capacity(turn.tool_calls.len());
            for call in &turn.tool_calls {
                let (text, update) = self
                    .toolbox
                    .dispatch(call, state.cache.get(), &state.question)
                    .await;
                self.store
                    .append_message(session_id, actor_id, "tool", &text)
                    .await?;
                results.push(ChatBlock::ToolResult {
                    tool_use_id: call.id.clone(),
                    content: text,
                });
                round_update.merge(update);
            }
            state.messages.push(ChatMessage {
                role: "user".to_string(),
                content: results,
            });

            if !round_update.is_empty() {
                state.cache.apply(round_update);
                // Persist mid-turn so a throttled retry starts from here.
                self.store
                    .save_checkpoint(session_id, actor_id, state.cache.get())
                    .await?;
            }
        }
        Err(TabletalkError::Internal(
            "reached the tool iteration limit for one turn".to_string(),
        ))
    }

    /// Restores the user/assistant transcript for the session.
    async fn load_history(
        &self,
        session_id: &str,
        actor_id: &str,
    ) -> Result<Vec<ChatMessage>, TabletalkError> {
        let stored = self.store.load_messages(session_id, actor_id).await?;
        Ok(stored
            .into_iter()
            .filter(|m| m.role == "user" || m.role == "assistant")
            .map(|m| ChatMessage::text(&m.role, m.content))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabletalk_config::model::RunnerConfig;
    use tabletalk_core::types::{ConnectionTarget, FieldValue};
    use tabletalk_test_utils::{
        result_set, MockCompletion, MockConversation, ScriptedStatement, ScriptedTurn,
        ScriptedWarehouse,
    };
    use tabletalk_warehouse::{QueryRunner, StatementExecutor};

    struct Fixture {
        agent: Agent,
        model: Arc<MockConversation>,
        store: SessionStore,
    }

    async fn fixture(
        turns: Vec<ScriptedTurn>,
        scripts: Vec<ScriptedStatement>,
        max_turn_iterations: usize,
    ) -> Fixture {
        let api = Arc::new(ScriptedWarehouse::new(scripts));
        let completion = Arc::new(MockCompletion::with_texts(&[]));
        let executor = StatementExecutor::new(
            api,
            ConnectionTarget::Workgroup("wg".into()),
            "dev".into(),
            Duration::from_millis(1),
            Duration::from_millis(500),
        );
        let runner = QueryRunner::new(
            executor,
            completion.clone(),
            "amazon.nova-pro-v1:0".into(),
            &RunnerConfig::default(),
        );
        let toolbox = Toolbox::new(runner, completion, "amazon.nova-pro-v1:0".into());
        let model = Arc::new(MockConversation::new(turns));
        let store = SessionStore::open_in_memory().await.unwrap();
        let agent_config = AgentConfig {
            max_turn_iterations,
            ..AgentConfig::default()
        };
        let agent = Agent::new(
            model.clone(),
            toolbox,
            store.clone(),
            &agent_config,
            &RetryConfig::default(),
        );
        Fixture {
            agent,
            model,
            store,
        }
    }

    fn schema_rows() -> tabletalk_core::ResultSet {
        result_set(
            &["table_name", "column_name"],
            vec![vec![
                FieldValue::String("products".into()),
                FieldValue::String("price".into()),
            ]],
        )
    }

    #[tokio::test]
    async fn plain_answer_persists_transcript() {
        let fx = fixture(vec![ScriptedTurn::text("There are 3 products.")], vec![], 10).await;
        let answer = fx
            .agent
            .invoke("how many products?", "a1", "s1", false)
            .await
            .unwrap();
        assert_eq!(answer, "There are 3 products.");

        let messages = fx.store.load_messages("s1", "a1").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[1].role, "assistant");
    }

    #[tokio::test]
    async fn tool_round_updates_cache_and_loops_back() {
        let fx = fixture(
            vec![
                ScriptedTurn::tool_call(
                    "tu_1",
                    "get_database_schema",
                    serde_json::json!({"schema_name": "public"}),
                ),
                ScriptedTurn::text("The products table has a price column."),
            ],
            vec![ScriptedStatement::finished(schema_rows())],
            10,
        )
        .await;

        let answer = fx
            .agent
            .invoke("what columns exist?", "a1", "s1", false)
            .await
            .unwrap();
        assert!(answer.contains("price column"));

        // The checkpoint picked up the fetched schema.
        let checkpoint = fx.store.load_checkpoint("s1", "a1").await;
        assert!(checkpoint.schema_text.contains("products"));
        assert!(checkpoint.sample_text.is_empty());

        // Second model call saw the tool round appended to the history.
        let histories = fx.model.histories();
        assert_eq!(histories.len(), 2);
        assert_eq!(histories[1].len(), 3);
        assert_eq!(histories[1][1].role, "assistant");
        assert!(matches!(
            histories[1][2].content[0],
            ChatBlock::ToolResult { .. }
        ));

        // And the refreshed directive previews the cached schema.
        assert!(fx.model.systems()[1].contains("products"));
    }

    #[tokio::test]
    async fn reset_memory_discards_cached_context() {
        let fx = fixture(vec![ScriptedTurn::text("Starting fresh.")], vec![], 10).await;
        fx.store
            .save_checkpoint(
                "s1",
                "a1",
                &ContextCheckpoint {
                    schema_text: "old schema".into(),
                    sample_text: "old sample".into(),
                },
            )
            .await
            .unwrap();

        fx.agent
            .invoke("hello", "a1", "s1", true)
            .await
            .unwrap();

        let directive = &fx.model.systems()[0];
        assert!(directive.contains("Cached Schema: Not loaded"));
        assert!(directive.contains("Cached Sample Data: Not loaded"));
    }

    #[tokio::test(start_paused = true)]
    async fn throttled_turn_retries_with_reloaded_checkpoint() {
        let fx = fixture(
            vec![
                ScriptedTurn::tool_call(
                    "tu_1",
                    "get_database_schema",
                    serde_json::json!({"schema_name": "public"}),
                ),
                ScriptedTurn::Throttled,
                ScriptedTurn::text("Recovered."),
            ],
            vec![ScriptedStatement::finished(schema_rows())],
            10,
        )
        .await;

        let answer = fx
            .agent
            .invoke("what columns exist?", "a1", "s1", false)
            .await
            .unwrap();
        assert_eq!(answer, "Recovered.");
        assert_eq!(fx.model.calls(), 3);

        // The retry's directive used the checkpoint persisted mid-turn by
        // the first attempt, not the empty starting copy.
        let systems = fx.model.systems();
        assert!(systems[0].contains("Not loaded"));
        assert!(systems[2].contains("products"));
    }

    #[tokio::test(start_paused = true)]
    async fn throttling_exhausts_after_configured_retries() {
        let fx = fixture(
            vec![
                ScriptedTurn::Throttled,
                ScriptedTurn::Throttled,
                ScriptedTurn::Throttled,
                ScriptedTurn::Throttled,
            ],
            vec![],
            10,
        )
        .await;

        let err = fx
            .agent
            .invoke("hello", "a1", "s1", false)
            .await
            .unwrap_err();
        assert!(err.is_throttled());
        // One initial attempt plus three retries.
        assert_eq!(fx.model.calls(), 4);
    }

    #[tokio::test]
    async fn iteration_limit_stops_runaway_tool_loops() {
        let fx = fixture(
            vec![ScriptedTurn::tool_call(
                "tu_1",
                "get_database_schema",
                serde_json::json!({"schema_name": "public"}),
            )],
            vec![ScriptedStatement::finished(schema_rows())],
            1,
        )
        .await;

        let err = fx
            .agent
            .invoke("loop forever", "a1", "s1", false)
            .await
            .unwrap_err();
        assert!(matches!(err, TabletalkError::Internal(_)));
    }

    #[tokio::test]
    async fn follow_up_turn_sees_prior_transcript() {
        let fx = fixture(
            vec![
                ScriptedTurn::text("All dog food products cost under 500."),
                ScriptedTurn::text("Filtered to premium products."),
            ],
            vec![],
            10,
        )
        .await;

        fx.agent
            .invoke("show me dog food", "a1", "s1", false)
            .await
            .unwrap();
        fx.agent
            .invoke("now filter above 500 THB", "a1", "s1", false)
            .await
            .unwrap();

        let histories = fx.model.histories();
        let second = &histories[1];
        assert_eq!(second.len(), 3);
        assert_eq!(second[0].text_content(), "show me dog food");
        assert_eq!(
            second[1].text_content(),
            "All dog food products cost under 500."
        );
        assert_eq!(second[2].text_content(), "now filter above 500 THB");
    }
}
