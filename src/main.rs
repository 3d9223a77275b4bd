use std::process::ExitCode;

fn main() -> ExitCode {
    draughtsman::cli::run()
}
