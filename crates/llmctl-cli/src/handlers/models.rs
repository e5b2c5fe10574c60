//! Models command handler.

use crate::bootstrap::CliContext;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext) -> Result<(), CliError> {
    let models = ctx.app().controller().list_models().await?;
    let configured = ctx
        .app()
        .config_store()
        .load()
        .await
        .default_service_config
        .model_name;

    if models.data.is_empty() {
        println!(
            "No models found in {}",
            ctx.paths().models_dir.display()
        );
        return Ok(());
    }

    for model in &models.data {
        let marker = if model.id == configured { '*' } else { ' ' };
        println!("{marker} {}", model.id);
    }
    Ok(())
}
