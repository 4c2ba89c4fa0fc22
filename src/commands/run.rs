//! `cardno run` command.

use std::io::Read;
use std::path::Path;

use crate::action::{self, WorkflowEvent};
use crate::context::ServiceContext;

/// Execute the workflow action for a single event read from `path` or stdin.
///
/// Prints the action response as JSON on stdout. A response with error
/// status still exits successfully: the hosting contract is that every
/// invocation terminates in a well-formed output record.
///
/// # Errors
///
/// Returns an error string if the event cannot be read or parsed, or the
/// response cannot be serialized.
pub async fn run_with_context(ctx: &ServiceContext, path: Option<&Path>) -> Result<(), String> {
    let raw = read_event(path)?;
    let event: WorkflowEvent =
        serde_json::from_str(&raw).map_err(|e| format!("failed to parse workflow event: {e}"))?;

    let mut rng = rand::thread_rng();
    let response = action::handle(&event, ctx.oracle.as_ref(), ctx.store.as_ref(), &mut rng).await;

    let json = serde_json::to_string_pretty(&response)
        .map_err(|e| format!("failed to serialize response: {e}"))?;
    println!("{json}");
    Ok(())
}

fn read_event(path: Option<&Path>) -> Result<String, String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read event file {}: {e}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("failed to read event from stdin: {e}"))?;
            Ok(buf)
        }
    }
}
