use std::process::ExitCode;

fn main() -> ExitCode {
    match flotillad::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("flotillad: {error}");
            ExitCode::FAILURE
        }
    }
}
