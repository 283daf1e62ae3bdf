pub mod cli;
pub mod cmd;
pub mod error;
pub mod format;
pub mod io;

pub use cli::{Cli, Command, OutputFormat};

use clap::Parser;

fn main() {
    #[cfg(unix)]
    install_sigpipe_default();

    let cli = Cli::parse();

    let result = dispatch(&cli);

    if let Err(e) = result {
        eprintln!("{}", e.message());
        std::process::exit(e.exit_code());
    }
}

/// Dispatches the parsed CLI arguments to the appropriate command handler.
///
/// Returns `Ok(())` on success or a [`error::CliError`] on failure. The
/// caller is responsible for printing the error message and exiting with the
/// appropriate exit code.
fn dispatch(cli: &Cli) -> Result<(), error::CliError> {
    match &cli.command {
        Command::Validate {
            path,
            codespace,
            profile,
            skip_schema,
            skip_xpath_rules,
            no_network,
            max_findings,
            format,
        } => {
            let options = cmd::validate::options_from_flags(codespace, profile, *skip_schema, *skip_xpath_rules, *no_network, *max_findings);
            cmd::validate::run(path, &options, *format, cli.quiet, cli.verbose, cli.no_color)
        }
    }
}

/// Resets `SIGPIPE` to its default disposition (`SIG_DFL`).
///
/// Rust's runtime ignores `SIGPIPE` by default, which causes programs that
/// write to a closed pipe (e.g. `netex-validator validate file.xml | head`)
/// to receive an `Err(BrokenPipe)` from a write call rather than being
/// terminated silently. Restoring the default disposition lets the kernel
/// terminate the process with exit code 0 when a write to a closed pipe
/// occurs, matching standard Unix behavior.
///
/// This uses `libc::signal`, the only unavoidable use of `unsafe` in this
/// crate; the workspace denies `unsafe_code` globally except here.
#[cfg(unix)]
fn install_sigpipe_default() {
    // SAFETY: signal() is safe to call during single-threaded program
    // initialization before any other threads are spawned. SIG_DFL is a
    // valid handler for SIGPIPE. The return value (previous handler) is
    // discarded.
    #[allow(unsafe_code)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
}
