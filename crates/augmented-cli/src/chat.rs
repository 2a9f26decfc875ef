//! Interactive chat loop over stdin.

use std::io::Write;

use anyhow::{Context, Result};
use augmented_config::{Credentials, DebugFlags, SessionConfig};
use augmented_core::ProviderKind;
use augmented_engine::Session;
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

use crate::tools::register_demo_tools;
use crate::ChatArgs;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// `--provider`, else guessed from `--model`, else Anthropic.
fn chosen_provider(args: &ChatArgs) -> Option<ProviderKind> {
    args.provider.or_else(|| args.model.as_deref().map(ProviderKind::detect))
}

/// Builds the session config: file (if any), then flags on top.
fn session_config(args: &ChatArgs) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::from_file(path)
            .with_context(|| format!("loading session config {}", path.display()))?,
        None => SessionConfig::builder(chosen_provider(args).unwrap_or(ProviderKind::Anthropic))
            .system_prompt(DEFAULT_SYSTEM_PROMPT)
            .build(),
    };

    if let Some(provider) = chosen_provider(args) {
        config.provider = provider;
    }
    if let Some(model) = &args.model {
        config.model = Some(model.clone());
    }
    if let Some(system) = &args.system {
        config.system_prompt = system.clone();
    }
    if let Some(temperature) = args.temperature {
        config.temperature = temperature;
    }
    if let Some(max_tokens) = args.max_tokens {
        config.max_tokens = Some(max_tokens);
    }
    if let Some(effort) = args.reasoning_effort {
        config.reasoning_effort = effort;
    }
    if let Some(dir) = &args.log_dir {
        config.log_dir = dir.clone();
    }
    config.use_react |= args.react;
    config.debug = DebugFlags {
        tools: config.debug.tools || args.debug_tools,
        tokens: config.debug.tokens || args.debug_tokens,
        settings: config.debug.settings || args.debug_settings,
        messages: config.debug.messages || args.debug_messages,
    };
    Ok(config.with_credentials(Credentials::from_env()))
}

fn prompt() {
    print!("\n> ");
    let _ = std::io::stdout().flush();
}

pub async fn run(args: ChatArgs) -> Result<()> {
    let config = session_config(&args)?;
    let mut session = Session::new(config)?;
    register_demo_tools(&mut session);
    session.log_tools();

    info!("Type a message; /clear resets the conversation, /quit exits");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        match text {
            "" => {
                prompt();
                continue;
            }
            "/quit" | "/exit" => break,
            "/clear" => {
                session.clear_history();
                info!("History cleared");
                prompt();
                continue;
            }
            _ => {}
        }

        let reply = session.generate(text);
        futures::pin_mut!(reply);
        while let Some(chunk) = reply.next().await {
            match chunk {
                Ok(chunk) => {
                    print!("{}", chunk);
                    let _ = std::io::stdout().flush();
                }
                Err(e) => {
                    error!("{}", e);
                    break;
                }
            }
        }
        println!();
        prompt();
    }
    Ok(())
}
