//! Edgee CLI: chat with a model through the Edgee gateway.
//!
//! Commands:
//! - `chat`    : Interactive chat or single-message mode, with tool execution
//! - `tools`   : List the demo tools and their schemas
//! - `config`  : Show the resolved configuration

use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "edgee",
    about = "Edgee: chat completions with automatic tool execution",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with a model
    Chat(ChatArgs),

    /// List the available demo tools
    Tools,

    /// Show the resolved configuration
    Config,
}

#[derive(Args, Debug, Clone)]
pub struct ChatArgs {
    /// Send a single message instead of entering interactive mode
    #[arg(short, long)]
    message: Option<String>,

    /// Model to use (defaults to the configured model)
    #[arg(long)]
    model: Option<String>,

    /// Stream the answer as it is generated
    #[arg(long)]
    stream: bool,

    /// Override the tool iteration budget
    #[arg(long)]
    max_iterations: Option<u32>,

    /// Don't offer any tools to the model
    #[arg(long)]
    no_tools: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Chat(args) => commands::chat::run(args).await?,
        Commands::Tools => commands::tools::run()?,
        Commands::Config => commands::config_cmd::run()?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chat_flags() {
        let cli = Cli::parse_from([
            "edgee",
            "chat",
            "-m",
            "What's the weather in Paris?",
            "--model",
            "gpt-4o",
            "--stream",
            "--max-iterations",
            "3",
        ]);
        let Commands::Chat(args) = cli.command else {
            panic!("expected chat");
        };
        assert_eq!(args.message.as_deref(), Some("What's the weather in Paris?"));
        assert_eq!(args.model.as_deref(), Some("gpt-4o"));
        assert!(args.stream);
        assert_eq!(args.max_iterations, Some(3));
        assert!(!args.no_tools);
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::parse_from(["edgee", "tools", "--verbose"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Tools));
    }
}
