//! CLI command definitions and dispatch.

pub mod cache;
pub mod compose;
pub mod mutate;
pub mod overrides;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use twinpack_common::config::{BuildEnv, HostOptions, flag_enabled};
use twinpack_common::constants::{DEFAULT_CACHE_ROOT, DEFAULT_MAIN_ENTRY, DEFAULT_TEMPLATE_COMPILER};
use twinpack_common::types::BuildMode;

/// twinpack — build graph compositor for the service/view app target.
#[derive(Parser, Debug)]
#[command(name = "twinpack", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Target selection and build environment.
    #[command(flatten)]
    pub target: TargetArgs,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compose a fresh build graph.
    Compose(compose::ComposeArgs),
    /// Patch a host-supplied build graph.
    Mutate(mutate::MutateArgs),
    /// Show the cache settings of both compiler stages.
    Cache(cache::CacheArgs),
    /// Show the project options the host must apply.
    Overrides(overrides::OverridesArgs),
}

/// Host flags and environment, read once and frozen into a [`BuildEnv`].
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Compile the service (logic) process.
    #[arg(long, global = true)]
    pub service: bool,

    /// Compile the view (rendering) process.
    #[arg(long, global = true)]
    pub view: bool,

    /// Target platform id.
    #[arg(long, global = true, env = "UNI_PLATFORM", default_value = "app-plus")]
    pub platform: String,

    /// Root of the source tree.
    #[arg(long, global = true, env = "UNI_INPUT_DIR", default_value = "src")]
    pub input_dir: PathBuf,

    /// Main entry, relative to the input root.
    #[arg(long, global = true, default_value = DEFAULT_MAIN_ENTRY)]
    pub main_entry: PathBuf,

    /// Build mode (`production` or anything else for development).
    #[arg(long, global = true, env = "NODE_ENV", default_value = "development")]
    pub node_env: String,

    /// Inject the analytics import.
    #[arg(long, global = true, env = "UNI_USING_STAT")]
    pub using_stat: Option<String>,

    /// Cache compiler stages on disk.
    #[arg(long, global = true, env = "UNI_USING_CACHE")]
    pub using_cache: Option<String>,

    /// Running inside the packaged IDE.
    #[arg(long, global = true, env = "UNI_HBUILDERX")]
    pub hbuilderx: Option<String>,

    /// Directory stage caches live under.
    #[arg(long, global = true, env = "UNI_CACHE_DIR", default_value = DEFAULT_CACHE_ROOT)]
    pub cache_dir: PathBuf,

    /// Template compiler module.
    #[arg(long, global = true, default_value = DEFAULT_TEMPLATE_COMPILER)]
    pub template_compiler: String,

    /// Template compiler version, part of its cache key.
    #[arg(long, global = true, default_value = "0.0.0")]
    pub template_compiler_version: String,

    /// Component loader version, part of its cache key.
    #[arg(long, global = true, default_value = "0.0.0")]
    pub component_loader_version: String,

    /// Global component as `name=source`. Repeatable.
    #[arg(long = "global-component", global = true, value_parser = parse_component)]
    pub global_components: Vec<(String, String)>,
}

impl TargetArgs {
    /// Host flags selecting the process.
    pub const fn host_options(&self) -> HostOptions {
        HostOptions {
            service: self.service,
            view: self.view,
        }
    }

    /// Freezes the arguments into the build environment.
    pub fn build_env(&self) -> BuildEnv {
        BuildEnv {
            platform: self.platform.clone(),
            input_dir: self.input_dir.clone(),
            main_entry: self.main_entry.clone(),
            mode: BuildMode::from_node_env(&self.node_env),
            using_stats: flag_enabled(self.using_stat.as_deref()),
            using_cache: flag_enabled(self.using_cache.as_deref()),
            packaged_ide: flag_enabled(self.hbuilderx.as_deref()),
            template_compiler: self.template_compiler.clone(),
            template_compiler_version: self.template_compiler_version.clone(),
            component_loader_version: self.component_loader_version.clone(),
            cache_root: self.cache_dir.clone(),
            global_components: self.global_components.iter().cloned().collect(),
        }
    }
}

fn parse_component(value: &str) -> Result<(String, String), String> {
    let (name, source) = value
        .split_once('=')
        .ok_or_else(|| format!("expected name=source, got \"{value}\""))?;
    if name.is_empty() || source.is_empty() {
        return Err(format!("expected name=source, got \"{value}\""));
    }
    Ok((name.to_owned(), source.to_owned()))
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let env = cli.target.build_env();
    let options = cli.target.host_options();
    match cli.command {
        Command::Compose(args) => compose::execute(&args, &options, &env),
        Command::Mutate(args) => mutate::execute(&args, &options, &env),
        Command::Cache(args) => cache::execute(&args, &options, &env),
        Command::Overrides(args) => overrides::execute(&args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_components() {
        let cli = Cli::try_parse_from([
            "twinpack",
            "compose",
            "--view",
            "--global-component",
            "uni-badge=components/uni-badge/uni-badge",
        ])
        .expect("parse");
        let env = cli.target.build_env();
        assert_eq!(
            env.global_components.get("uni-badge").map(String::as_str),
            Some("components/uni-badge/uni-badge")
        );
        assert!(cli.target.host_options().view);
    }

    #[test]
    fn rejects_malformed_component() {
        assert!(parse_component("no-separator").is_err());
        assert!(parse_component("=source").is_err());
        assert!(parse_component("name=").is_err());
    }

    #[test]
    fn production_node_env_maps_to_production_mode() {
        let cli = Cli::try_parse_from([
            "twinpack",
            "--service",
            "--node-env",
            "production",
            "--using-cache",
            "1",
            "compose",
        ])
        .expect("parse");
        let env = cli.target.build_env();
        assert_eq!(env.mode, BuildMode::Production);
        assert!(env.using_cache);
        assert!(!env.using_stats);
    }
}
