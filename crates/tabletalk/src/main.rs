// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tabletalk - a natural-language-to-SQL warehouse assistant.
//!
//! This is the binary entry point for the Tabletalk CLI.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tabletalk_agent::tools::Toolbox;
use tabletalk_agent::Agent;
use tabletalk_bedrock::BedrockProvider;
use tabletalk_config::model::TabletalkConfig;
use tabletalk_core::{TabletalkError, WarehouseApi};
use tabletalk_storage::SessionStore;
use tabletalk_warehouse::{DataApiClient, QueryRunner, StatementExecutor};
use tracing_subscriber::EnvFilter;

mod shell;

/// Tabletalk - ask your warehouse questions in plain language.
#[derive(Parser, Debug)]
#[command(name = "tabletalk", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Launch an interactive REPL session.
    Shell,
    /// Ask a single question and print the answer.
    Ask {
        question: String,
        /// Session to continue; a fresh one is created when omitted.
        #[arg(long)]
        session: Option<String>,
        /// Discard the session's cached schema and sample context first.
        #[arg(long)]
        reset: bool,
    },
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match tabletalk_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            tabletalk_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config);

    let outcome = match cli.command {
        Some(Commands::Ask {
            question,
            session,
            reset,
        }) => run_ask(&config, &question, session.as_deref(), reset).await,
        Some(Commands::Config) => print_config(&config),
        Some(Commands::Shell) | None => match build_agent(&config).await {
            Ok((agent, executor)) => shell::run_shell(&config, agent, executor).await,
            Err(e) => Err(e),
        },
    };

    if let Err(e) = outcome {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(config: &TabletalkConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.agent.log_level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Wires the provider, warehouse executor, query runner, toolbox, and
/// session store into a ready agent. Also hands back an executor clone for
/// the shell's catalog commands.
async fn build_agent(
    config: &TabletalkConfig,
) -> Result<(Agent, StatementExecutor), TabletalkError> {
    let provider = Arc::new(BedrockProvider::from_config(&config.bedrock)?);
    let api: Arc<dyn WarehouseApi> = Arc::new(DataApiClient::from_config(&config.warehouse)?);
    let executor = StatementExecutor::from_config(api, &config.warehouse)?;
    let runner = QueryRunner::new(
        executor.clone(),
        provider.clone(),
        config.bedrock.sql_model.clone(),
        &config.runner,
    );
    let toolbox = Toolbox::new(runner, provider.clone(), config.bedrock.sql_model.clone());
    let store = SessionStore::open_from_config(&config.storage).await?;
    let agent = Agent::new(provider, toolbox, store, &config.agent, &config.retry);
    Ok((agent, executor))
}

async fn run_ask(
    config: &TabletalkConfig,
    question: &str,
    session: Option<&str>,
    reset: bool,
) -> Result<(), TabletalkError> {
    let (agent, _) = build_agent(config).await?;
    let session_id = session
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let answer = agent.invoke(question, "local", &session_id, reset).await?;
    println!("{answer}");
    Ok(())
}

fn print_config(config: &TabletalkConfig) -> Result<(), TabletalkError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| TabletalkError::Internal(format!("failed to render config: {e}")))?;
    println!("{rendered}");
    Ok(())
}
