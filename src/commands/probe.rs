//! `cardno probe` command.

use crate::context::ServiceContext;

/// Ask the uniqueness oracle whether `value` is already taken.
///
/// # Errors
///
/// Returns an error string if the oracle query fails.
pub async fn run_with_context(ctx: &ServiceContext, value: &str) -> Result<(), String> {
    let taken =
        ctx.oracle.exists(value).await.map_err(|e| format!("uniqueness check failed: {e}"))?;
    if taken {
        println!("{value}: taken");
    } else {
        println!("{value}: free");
    }
    Ok(())
}
