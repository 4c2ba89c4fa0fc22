//! Binary entrypoint for the `cardno` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    // The CRM access token may be provided via a local .env file.
    let _ = dotenvy::dotenv();
    match cardno::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
