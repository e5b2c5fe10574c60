//! Status command handler.

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::format_status;

pub async fn execute(ctx: &CliContext) -> Result<(), CliError> {
    let controller = ctx.app().controller();
    let status = controller.refresh_status().await?;
    println!("{}", format_status(&status, controller.lifecycle()));

    let config = ctx.app().config_store().load().await;
    println!();
    println!(
        "Configured model: {}",
        config.default_service_config.model_name
    );
    println!(
        "Auto-start:       {} ({} attempts, {} ms apart)",
        if config.auto_start_enabled { "on" } else { "off" },
        config.retry_attempts,
        config.retry_delay_ms
    );
    println!("Models directory: {}", ctx.paths().models_dir.display());
    Ok(())
}
