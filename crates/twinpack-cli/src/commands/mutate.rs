//! `twinpack mutate` — Patch a host-supplied graph in place.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use twinpack_common::config::{BuildEnv, HostOptions};
use twinpack_compose::composer::ConfigComposer;
use twinpack_compose::graph::BuildGraphDescriptor;
use twinpack_compose::target;

use crate::output;

/// Arguments for the `mutate` command.
#[derive(Args, Debug)]
pub struct MutateArgs {
    /// JSON graph produced by the host orchestrator.
    #[arg(long)]
    pub base: PathBuf,

    /// Write the patched graph to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Executes the `mutate` command.
///
/// # Errors
///
/// Returns an error if the base graph cannot be read, the target is
/// invalid, or a patch cannot be applied.
pub fn execute(args: &MutateArgs, options: &HostOptions, env: &BuildEnv) -> anyhow::Result<()> {
    let target = target::resolve(options, env)?;
    let base = BuildGraphDescriptor::from_json_file(&args.base)
        .with_context(|| format!("loading base graph {}", args.base.display()))?;
    tracing::info!(base = %args.base.display(), process = %target.process, "mutating graph");
    let graph = ConfigComposer::new(env).mutate(base, &target)?;
    output::write_json(&graph, args.output.as_deref())
}
