// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-turn state and the system directive composed for each model call.

use tabletalk_core::{ChatMessage, ContextCheckpoint};

use crate::context::ContextCache;

/// Characters of cached context shown in the directive preview.
const PREVIEW_CHARS: usize = 200;

/// Mutable state for one conversational turn.
#[derive(Debug, Clone)]
pub struct TurnState {
    pub messages: Vec<ChatMessage>,
    pub cache: ContextCache,
    /// The user's question driving this turn.
    pub question: String,
}

impl TurnState {
    pub fn new(messages: Vec<ChatMessage>, checkpoint: ContextCheckpoint, question: String) -> Self {
        Self {
            messages,
            cache: ContextCache::new(checkpoint),
            question,
        }
    }
}

/// Composes the system directive embedding the current cache preview and
/// the strict tool-use workflow.
pub fn system_directive(cache: &ContextCheckpoint) -> String {
    format!(
        "You are a Text-to-SQL expert assistant.\n\
\n\
Cached Schema: {schema}\n\
Cached Sample Data: {sample}\n\
\n\
STRICT WORKFLOW (follow in order):\n\
1. Load database schema/data: Call get_database_schema ONLY if NOT cached. Call get_sample_data ONLY if NOT cached.\n\
2. Generate SQL once: Call generate_sql_with_context EXACTLY ONCE. Do NOT regenerate SQL.\n\
3. Validate SQL: Call quick_test_sql to verify syntax. If it passes, STOP regenerating.\n\
4. Execute: Call query_existing_table to get final results.\n\
\n\
CRITICAL RULES:\n\
- NEVER call generate_sql_with_context multiple times for the same query\n\
- Once quick_test_sql passes, proceed to query_existing_table immediately\n\
- If SQL has issues, explain to user instead of regenerating infinitely\n\
- Reuse cached schema/sample data from previous questions",
        schema = preview(&cache.schema_text),
        sample = preview(&cache.sample_text),
    )
}

fn preview(text: &str) -> String {
    if text.is_empty() {
        "Not loaded".to_string()
    } else {
        text.chars().take(PREVIEW_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_marks_absent_context() {
        let directive = system_directive(&ContextCheckpoint::default());
        assert!(directive.contains("Cached Schema: Not loaded"));
        assert!(directive.contains("Cached Sample Data: Not loaded"));
        assert!(directive.contains("EXACTLY ONCE"));
    }

    #[test]
    fn directive_previews_cached_context_truncated() {
        let checkpoint = ContextCheckpoint {
            schema_text: "s".repeat(500),
            sample_text: "price\n9.99".into(),
        };
        let directive = system_directive(&checkpoint);
        assert!(directive.contains(&"s".repeat(PREVIEW_CHARS)));
        assert!(!directive.contains(&"s".repeat(PREVIEW_CHARS + 1)));
        assert!(directive.contains("price\n9.99"));
    }
}
