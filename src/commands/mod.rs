//! Command dispatch and handlers.

pub mod probe;
pub mod run;

use crate::cli::Command;
use crate::context::ServiceContext;

/// Dispatch a parsed command to its handler.
///
/// # Errors
///
/// Returns an error string if the async runtime cannot start or the selected
/// command handler fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start async runtime: {e}"))?;

    let ctx = ServiceContext::live();
    match command {
        Command::Run { event } => runtime.block_on(run::run_with_context(&ctx, event.as_deref())),
        Command::Probe { value } => runtime.block_on(probe::run_with_context(&ctx, value)),
    }
}
