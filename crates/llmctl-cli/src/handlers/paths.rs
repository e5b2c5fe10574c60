//! Paths command handler.

use crate::bootstrap::CliContext;

pub fn execute(ctx: &CliContext) {
    println!("{}", ctx.paths());
}
