//! data-validator conformance harness entry point

fn main() {
    dv_conformance::cli::run();
}
