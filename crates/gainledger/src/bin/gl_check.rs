//! gl-check - Validate a transactions file.

fn main() -> std::process::ExitCode {
    gainledger::cmd::check::main()
}
