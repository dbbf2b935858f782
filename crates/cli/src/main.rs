use std::process::ExitCode;

fn main() -> ExitCode {
    sourcing_cli::run()
}
