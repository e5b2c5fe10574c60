//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure with global options.

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for driving a local llama-server.
#[derive(Parser)]
#[command(name = "llmctl")]
#[command(about = "Run a local LLM service and chat with it")]
#[command(version)]
pub struct Cli {
    /// Override the models directory for this invocation
    #[arg(long = "models-dir", global = true, env = "LLMCTL_MODELS_DIR")]
    pub models_dir: Option<String>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_commands::ConfigCommand;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from(["llmctl", "--verbose", "--models-dir", "/tmp/models", "models"]);
        assert!(cli.verbose);
        assert_eq!(cli.models_dir, Some("/tmp/models".to_string()));
        assert!(matches!(cli.command, Some(Commands::Models)));
    }

    #[test]
    fn test_ask_joins_words() {
        let cli = Cli::parse_from(["llmctl", "ask", "what", "is", "rust?"]);
        let Some(Commands::Ask { prompt, manual }) = cli.command else {
            panic!("expected ask");
        };
        assert_eq!(prompt.join(" "), "what is rust?");
        assert!(!manual);
    }

    #[test]
    fn test_chat_manual_flag() {
        let cli = Cli::parse_from(["llmctl", "chat", "--manual"]);
        assert!(matches!(cli.command, Some(Commands::Chat { manual: true })));
        let cli = Cli::parse_from(["llmctl", "chat"]);
        assert!(matches!(cli.command, Some(Commands::Chat { manual: false })));
    }

    #[test]
    fn test_config_subcommand() {
        let cli = Cli::parse_from(["llmctl", "config", "reset", "--force"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                command: ConfigCommand::Reset { force: true }
            })
        ));
    }
}
