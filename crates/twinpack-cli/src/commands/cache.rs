//! `twinpack cache` — Show the cache settings of both compiler stages.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use twinpack_common::config::{BuildEnv, HostOptions};
use twinpack_compose::cache::{CacheComponent, CacheKeyDeriver, CacheStage};
use twinpack_compose::target;

use crate::output;

/// Arguments for the `cache` command.
#[derive(Args, Debug)]
pub struct CacheArgs {
    /// Write the settings to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Executes the `cache` command.
///
/// # Errors
///
/// Returns an error if the target is invalid or a cache key cannot be
/// derived.
pub fn execute(args: &CacheArgs, options: &HostOptions, env: &BuildEnv) -> anyhow::Result<()> {
    let target = target::resolve(options, env)?;
    let deriver = CacheKeyDeriver::new(env);
    let mut configs = BTreeMap::new();
    for stage in [CacheStage::TemplateCompiler, CacheStage::ComponentLoader] {
        let component = CacheComponent::for_stage(stage, env);
        let _ = configs.insert(stage.namespace(), deriver.derive(&component, &target)?);
    }
    output::write_json(&configs, args.output.as_deref())
}
