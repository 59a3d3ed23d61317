//! gl-location - Realized FIFO gains for one storage location.

fn main() -> std::process::ExitCode {
    gainledger::cmd::location_cmd::main()
}
