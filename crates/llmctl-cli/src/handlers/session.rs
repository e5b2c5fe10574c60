//! Bringing the service up and down around interactive commands.

use tracing::warn;

use llmctl_core::AutoStartOutcome;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::describe_outcome;

/// Run the auto-start policy and require a running service afterwards.
pub async fn ensure_started(ctx: &CliContext) -> Result<(), CliError> {
    let outcome = ctx.app().auto_start().run().await;
    let controller = ctx.app().controller();

    if controller.is_running() {
        eprintln!("{}", describe_outcome(&outcome));
        return Ok(());
    }

    Err(match outcome {
        AutoStartOutcome::Disabled => CliError::Config(
            "Auto-start is disabled; enable it with `llmctl config set --auto-start true` \
             or pass --manual"
                .to_string(),
        ),
        AutoStartOutcome::NoAttempts => CliError::Config(
            "Auto-start has zero retry attempts; raise it with `llmctl config set --retry-attempts 3`"
                .to_string(),
        ),
        other => CliError::Service(
            controller
                .last_error()
                .unwrap_or_else(|| describe_outcome(&other)),
        ),
    })
}

/// Stop the service if it is still running.
pub async fn shutdown(ctx: &CliContext) {
    let controller = ctx.app().controller();
    if !controller.is_running() {
        return;
    }
    if let Err(e) = controller.stop().await {
        warn!(error = %e, "Failed to stop service");
    }
}

/// Initialize with the stored service config and start, bypassing the
/// auto-start policy.
pub async fn start_manually(ctx: &CliContext) -> Result<String, CliError> {
    let controller = ctx.app().controller();
    controller.refresh_status().await?;
    if controller.is_running() {
        return Err(CliError::Service("LLM service is already running".to_string()));
    }
    if controller.is_busy() {
        return Err(CliError::Service(
            "Another start or stop is still in progress".to_string(),
        ));
    }

    let config = ctx.app().config_store().load().await.default_service_config;
    controller.initialize(config).await?;
    if !controller.can_start() {
        return Err(CliError::Service(
            "LLM service cannot be started right now".to_string(),
        ));
    }
    Ok(controller.start().await?)
}

/// Stop a running service on request.
pub async fn stop_manually(ctx: &CliContext) -> Result<String, CliError> {
    let controller = ctx.app().controller();
    if !controller.can_stop() {
        let reason = if controller.is_busy() {
            "Another start or stop is still in progress"
        } else {
            "LLM service is not running"
        };
        return Err(CliError::Service(reason.to_string()));
    }
    Ok(controller.stop().await?)
}

/// Stop if running, then start again with the stored config.
pub async fn restart(ctx: &CliContext) -> Result<String, CliError> {
    if ctx.app().controller().can_stop() {
        stop_manually(ctx).await?;
    }
    start_manually(ctx).await
}
