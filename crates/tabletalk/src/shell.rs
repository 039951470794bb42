// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tabletalk shell` command implementation.
//!
//! Launches an interactive REPL with a colored prompt and readline history.
//! Each shell invocation gets its own session; `/reset` abandons the current
//! session and starts a fresh one with empty cached context.

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tabletalk_agent::Agent;
use tabletalk_config::model::TabletalkConfig;
use tabletalk_core::TabletalkError;
use tabletalk_warehouse::StatementExecutor;
use tracing::info;

/// Runs the interactive REPL until `/quit`, Ctrl+C, or Ctrl+D.
pub async fn run_shell(
    config: &TabletalkConfig,
    agent: Agent,
    executor: StatementExecutor,
) -> Result<(), TabletalkError> {
    let mut rl = DefaultEditor::new()
        .map_err(|e| TabletalkError::Internal(format!("failed to initialize readline: {e}")))?;

    let actor_id = "local";
    let mut session_id = uuid::Uuid::new_v4().to_string();
    info!(session_id, "shell session started");

    println!("{}", format!("{} shell", config.agent.name).bold().green());
    println!(
        "Type {} to exit, {} to start over with fresh context.",
        "/quit".yellow(),
        "/reset".yellow()
    );
    println!(
        "Catalog commands: {}, {}, {}.\n",
        "/databases".yellow(),
        "/schemas".yellow(),
        "/tables <schema>".yellow()
    );

    let prompt = format!("{}> ", config.agent.name.green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "/quit" || trimmed == "/exit" {
                    break;
                }
                if trimmed == "/reset" {
                    session_id = uuid::Uuid::new_v4().to_string();
                    info!(session_id, "shell session reset");
                    println!("{}", "started a fresh session".dimmed());
                    continue;
                }
                if trimmed.is_empty() {
                    continue;
                }
                if let Some(command) = trimmed.strip_prefix('/') {
                    run_catalog_command(&executor, command).await;
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                match agent.invoke(trimmed, actor_id, &session_id, false).await {
                    Ok(answer) => println!("{answer}"),
                    Err(e) => eprintln!("{}: {e}", "error".red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C
                break;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D
                break;
            }
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    println!("{}", "goodbye".dimmed());
    Ok(())
}

/// Handles `/databases`, `/schemas`, and `/tables <schema>`.
async fn run_catalog_command(executor: &StatementExecutor, command: &str) {
    let mut parts = command.split_whitespace();
    let listing = match (parts.next(), parts.next()) {
        (Some("databases"), None) => executor.list_databases().await,
        (Some("schemas"), None) => executor.list_schemas().await,
        (Some("tables"), Some(schema)) => executor.list_tables(schema).await,
        (Some("tables"), None) => {
            eprintln!("{}: usage: /tables <schema>", "error".red());
            return;
        }
        _ => {
            eprintln!("{}: unknown command /{command}", "error".red());
            return;
        }
    };
    match listing {
        Ok(names) if names.is_empty() => println!("{}", "(none)".dimmed()),
        Ok(names) => {
            for name in names {
                println!("{name}");
            }
        }
        Err(e) => eprintln!("{}: {e}", "error".red()),
    }
}
