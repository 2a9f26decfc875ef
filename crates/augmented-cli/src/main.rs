//! Command-line entry point.
//!
//! `augmented chat` runs an interactive session on stdin with two demo
//! tools; `augmented graph` generates, prints and saves a knowledge graph.

mod chat;
mod graph;
mod tools;

use std::path::PathBuf;

use anyhow::Result;
use augmented_config::{parse_provider, parse_reasoning_effort};
use augmented_core::{ProviderKind, ReasoningEffort};
use augmented_graph::Complexity;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "augmented")]
#[command(about = "Tool-calling chat and knowledge-graph generation over hosted LLMs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat with the demo tools (add, current_time)
    Chat(ChatArgs),
    /// Generate a knowledge graph about a topic
    Graph(GraphArgs),
}

#[derive(Args)]
pub struct ChatArgs {
    /// anthropic or openai (guessed from --model, else anthropic)
    #[arg(long, env = "AUGMENTED_PROVIDER", value_parser = parse_provider)]
    pub provider: Option<ProviderKind>,

    /// Model name (provider default when omitted)
    #[arg(long, short = 'm')]
    pub model: Option<String>,

    /// System prompt
    #[arg(long, short = 's')]
    pub system: Option<String>,

    /// Session config file (JSON); flags override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Prepend the ReAct reasoning preamble
    #[arg(long)]
    pub react: bool,

    #[arg(long)]
    pub temperature: Option<f32>,

    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Sent to reasoning models only
    #[arg(long, value_parser = parse_reasoning_effort)]
    pub reasoning_effort: Option<ReasoningEffort>,

    /// Log tool markers instead of printing them
    #[arg(long)]
    pub debug_tools: bool,

    /// Print the token and cost summary after each reply
    #[arg(long)]
    pub debug_tokens: bool,

    /// Log request settings before each reply
    #[arg(long)]
    pub debug_settings: bool,

    /// Write the transcript after each reply
    #[arg(long)]
    pub debug_messages: bool,

    /// Directory for diagnostic records
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct GraphArgs {
    /// Topic to build the graph about
    #[arg(long, short = 't')]
    pub topic: String,

    /// basic, standard or advanced
    #[arg(long, short = 'c', default_value = "standard")]
    pub complexity: Complexity,

    /// Output file (defaults to <complexity>_knowledge_graph.json)
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,

    /// Structured-output model
    #[arg(long, short = 'm')]
    pub model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match Cli::parse().command {
        Command::Chat(args) => chat::run(args).await,
        Command::Graph(args) => graph::run(args).await,
    }
}
