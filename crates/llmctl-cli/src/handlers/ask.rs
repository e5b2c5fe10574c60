//! Ask command handler - one question, one answer.

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::handlers::session;

pub async fn execute(ctx: &CliContext, prompt: &[String], manual: bool) -> Result<(), CliError> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        return Err(CliError::Arguments("prompt must not be empty".to_string()));
    }

    if manual {
        eprintln!("{}", session::start_manually(ctx).await?);
    } else {
        session::ensure_started(ctx).await?;
    }
    let result = ctx.app().chat().send_message(prompt).await;
    session::shutdown(ctx).await;

    let exchange = result?;
    println!("{}", exchange.reply.content);
    Ok(())
}
