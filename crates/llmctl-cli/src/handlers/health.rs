//! Health command handler.

use crate::bootstrap::CliContext;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext) -> Result<(), CliError> {
    let message = ctx.app().controller().health_check().await?;
    println!("{message}");
    Ok(())
}
