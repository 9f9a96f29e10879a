//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

#[expect(
    clippy::print_stderr,
    reason = "the binary reports fatal errors on standard error"
)]
fn main() {
    if let Err(err) = chance_verify_cli::run() {
        eprintln!("chance-verify: {err}");
        std::process::exit(1);
    }
}
