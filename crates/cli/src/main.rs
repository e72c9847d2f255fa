use std::process::ExitCode;

fn main() -> ExitCode {
    camquote_cli::run()
}
