//! `twinpack overrides` — Show the project options the host must apply.

use std::path::PathBuf;

use clap::Args;
use twinpack_compose::composer::project_overrides;

use crate::output;

/// Arguments for the `overrides` command.
#[derive(Args, Debug)]
pub struct OverridesArgs {
    /// Write the options to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Executes the `overrides` command.
///
/// # Errors
///
/// Returns an error if the options cannot be written.
pub fn execute(args: &OverridesArgs) -> anyhow::Result<()> {
    output::write_json(&project_overrides(), args.output.as_deref())
}
