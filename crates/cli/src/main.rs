use std::process::ExitCode;

fn main() -> ExitCode {
    agentic_cli::run()
}
