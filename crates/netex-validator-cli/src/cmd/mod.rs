/// Command module for the `netex-validator` CLI.
///
/// Each submodule implements one subcommand. `run` takes the parsed
/// arguments and returns `Ok(())` on success or a [`crate::error::CliError`]
/// on failure.
pub mod validate;
