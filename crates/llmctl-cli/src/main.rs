//! CLI entry point.
//!
//! Logging goes to stderr so that replies printed by `ask` can be piped.
//! `RUST_LOG` wins over `--verbose` when both are given.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use llmctl_cli::{Cli, CliConfig, CliContext, CliError, Commands, bootstrap, handlers};

const DEFAULT_FILTER: &str = "warn,llmctl_core=info,llmctl_runtime=info,llmctl_cli=info";

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { DEFAULT_FILTER }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn dispatch(ctx: &CliContext, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Status => handlers::status::execute(ctx).await,
        Commands::Models => handlers::models::execute(ctx).await,
        Commands::Health => handlers::health::execute(ctx).await,
        Commands::Ask { prompt, manual } => handlers::ask::execute(ctx, &prompt, manual).await,
        Commands::Chat { manual } => handlers::chat::execute(ctx, manual).await,
        Commands::Config { command } => handlers::config::execute(ctx, command).await,
        Commands::Paths => {
            handlers::paths::execute(ctx);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads LLMCTL_* overrides
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = CliConfig {
        models_dir: cli.models_dir,
    };
    let result = match bootstrap(&config) {
        Ok(ctx) => dispatch(&ctx, command).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
    Ok(())
}
