//! Config command handler.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::bootstrap::CliContext;
use crate::config_commands::{ConfigCommand, ConfigSetArgs};
use crate::error::CliError;

pub async fn execute(ctx: &CliContext, command: ConfigCommand) -> Result<(), CliError> {
    match command {
        ConfigCommand::Show => show(ctx).await,
        ConfigCommand::Reset { force } => reset(ctx, force).await,
        ConfigCommand::Set(args) => set(ctx, &args).await,
    }
}

async fn show(ctx: &CliContext) -> Result<(), CliError> {
    let config = ctx.app().config_store().load().await;
    println!("# {}", ctx.paths().config_path.display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

async fn reset(ctx: &CliContext, force: bool) -> Result<(), CliError> {
    if !force && !confirm("Reset all settings to defaults?").await? {
        println!("Cancelled.");
        return Ok(());
    }
    ctx.app().config_store().reset().await;
    println!("✓ Configuration reset to defaults.");
    Ok(())
}

async fn set(ctx: &CliContext, args: &ConfigSetArgs) -> Result<(), CliError> {
    if args.is_empty() {
        return Err(CliError::Arguments(
            "no settings given; see `llmctl config set --help`".to_string(),
        ));
    }
    let config = ctx.app().update_config(&args.to_update()).await?;
    println!("✓ Configuration updated.");
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

async fn confirm(question: &str) -> Result<bool, CliError> {
    print!("{question} [y/N]: ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
