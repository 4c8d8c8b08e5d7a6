//! Entry point for the `flotilla` binary.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout = io::stdout().lock();
    // Unlocked: the event relay thread also writes to standard error.
    let mut stderr = io::stderr();
    flotilla_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
