//! `edgee chat`: Interactive or single-message chat with tool execution.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use edgee_agent::{AgentLoop, Client, StreamEvent};
use edgee_config::ClientConfig;
use edgee_core::message::Message;
use edgee_core::tool::ToolRegistry;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::ChatArgs;

pub async fn run(args: ChatArgs) -> anyhow::Result<()> {
    let config = ClientConfig::load().context("Failed to load config")?;

    // Check for API key early and give a clear error
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set the environment variable:");
        eprintln!("    export EDGEE_API_KEY='...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", ClientConfig::config_dir().join("config.toml").display());
        eprintln!();
        anyhow::bail!("EDGEE_API_KEY is not set");
    }

    let model = args.model.clone().unwrap_or_else(|| config.default_model.clone());
    let client = Client::new(config)?;

    let registry = if args.no_tools {
        ToolRegistry::new()
    } else {
        edgee_tools::default_registry()
    };
    let tool_names = registry.names().join(", ");
    let mut agent = client.agent(Arc::new(registry));
    if let Some(max) = args.max_iterations {
        agent = agent.with_max_iterations(max);
    }

    if let Some(msg) = args.message {
        // Single message mode
        let history = vec![Message::user(msg)];
        respond(&agent, &model, history, args.stream).await?;
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  Edgee Chat (interactive mode)");
    println!();
    println!("  Model:     {model}");
    println!("  Tools:     {}", if tool_names.is_empty() { "none" } else { &tool_names });
    println!("  Budget:    {} iterations", agent.max_iterations());
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut history: Vec<Message> = Vec::new();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        history.push(Message::user(line));
        match respond(&agent, &model, history.clone(), args.stream).await {
            Ok(updated) => history = updated,
            Err(e) => {
                // Drop the unanswered message so the next turn starts clean.
                history.pop();
                eprintln!("  [Error] {e}");
            }
        }
        println!();
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

/// Answer the last user message and return the extended history.
async fn respond(
    agent: &AgentLoop,
    model: &str,
    history: Vec<Message>,
    stream: bool,
) -> anyhow::Result<Vec<Message>> {
    if !stream {
        let result = agent.run(model, history).await?;
        println!("  Assistant > {}", result.text());
        tracing::debug!(
            iterations = result.iterations,
            total_tokens = result.usage().total_tokens,
            "Turn complete"
        );
        return Ok(result.conversation.into_messages());
    }

    let mut feed = agent.stream(model, history.clone());
    let mut answer = String::new();
    print!("  Assistant > ");

    while let Some(event) = feed.next_event().await {
        match event {
            StreamEvent::Chunk { chunk } => {
                let text = chunk.text();
                answer.push_str(text);
                print!("{text}");
                std::io::stdout().flush()?;
            }
            StreamEvent::ToolStart { tool_call } => {
                eprintln!();
                eprintln!("  [tool] {}({})", tool_call.name(), tool_call.arguments());
            }
            StreamEvent::ToolResult { tool_name, result, .. } => {
                eprintln!("  [tool] {tool_name} -> {result}");
            }
            StreamEvent::IterationComplete { iteration } => {
                tracing::debug!(iteration, "Iteration complete");
                print!("  Assistant > ");
                answer.clear();
            }
        }
    }
    println!();
    feed.finish().await?;

    let mut history = history;
    history.push(Message::assistant(answer));
    Ok(history)
}
