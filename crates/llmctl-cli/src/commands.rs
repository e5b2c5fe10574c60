//! Top-level subcommands.

use clap::Subcommand;

use crate::config_commands::ConfigCommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Show the service status and configuration
    Status,
    /// List the models available in the models directory
    Models,
    /// Check the models directory (and the server, if running)
    Health,
    /// Start the service, ask one question, print the answer and stop
    Ask {
        /// The prompt to send
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
        /// Start with the stored config directly, skipping the auto-start policy
        #[arg(long)]
        manual: bool,
    },
    /// Start the service and chat interactively
    Chat {
        /// Leave the service down; start it from the REPL with /start
        #[arg(long)]
        manual: bool,
    },
    /// View or change the stored configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Show resolved filesystem paths
    Paths,
}
