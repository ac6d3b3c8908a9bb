//! `twinpack compose` — Build a fresh graph for the selected process.

use std::path::PathBuf;

use clap::Args;
use twinpack_common::config::{BuildEnv, HostOptions};
use twinpack_compose::composer::ConfigComposer;

use crate::output;

/// Arguments for the `compose` command.
#[derive(Args, Debug)]
pub struct ComposeArgs {
    /// Write the graph to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Executes the `compose` command.
///
/// # Errors
///
/// Returns an error if the target is invalid or the graph cannot be written.
pub fn execute(args: &ComposeArgs, options: &HostOptions, env: &BuildEnv) -> anyhow::Result<()> {
    let graph = ConfigComposer::new(env).compose_from(options)?;
    tracing::info!(entries = graph.entry.len(), rules = graph.module.rules.len(), "composed graph");
    output::write_json(&graph, args.output.as_deref())
}
