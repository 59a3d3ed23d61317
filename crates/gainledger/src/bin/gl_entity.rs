//! gl-entity - Consolidated gains for every location of one entity.

fn main() -> std::process::ExitCode {
    gainledger::cmd::entity_cmd::main()
}
