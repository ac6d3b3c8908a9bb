//! Explicit configuration handed to the compositor.
//!
//! Everything the compositor would otherwise read from the process
//! environment is captured once in [`BuildEnv`] and passed by reference.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CACHE_ROOT, DEFAULT_MAIN_ENTRY, DEFAULT_TEMPLATE_COMPILER};
use crate::types::BuildMode;

/// Plugin options supplied by the host orchestrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostOptions {
    /// Compile the service process.
    pub service: bool,
    /// Compile the view process.
    pub view: bool,
}

/// Immutable snapshot of the build environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildEnv {
    /// Target platform id (e.g. `app-plus`, `weixin`).
    pub platform: String,
    /// Root of the source tree.
    pub input_dir: PathBuf,
    /// Main entry, relative to `input_dir` unless absolute.
    pub main_entry: PathBuf,
    /// Production or development build.
    pub mode: BuildMode,
    /// Inject the analytics import into the boot sequence.
    pub using_stats: bool,
    /// Enable on-disk caching of compiler stages.
    pub using_cache: bool,
    /// Running inside the packaged IDE.
    pub packaged_ide: bool,
    /// Template compiler handed to the component and entry loaders.
    pub template_compiler: String,
    /// Version of the structural template compiler, part of its cache key.
    pub template_compiler_version: String,
    /// Version of the component loader, part of its cache key.
    pub component_loader_version: String,
    /// Opaque directory under which stage caches live.
    pub cache_root: PathBuf,
    /// Globally registered components, name to source.
    pub global_components: BTreeMap<String, String>,
}

impl Default for BuildEnv {
    fn default() -> Self {
        Self {
            platform: String::from("app-plus"),
            input_dir: PathBuf::from("src"),
            main_entry: PathBuf::from(DEFAULT_MAIN_ENTRY),
            mode: BuildMode::default(),
            using_stats: false,
            using_cache: false,
            packaged_ide: false,
            template_compiler: String::from(DEFAULT_TEMPLATE_COMPILER),
            template_compiler_version: String::from("0.0.0"),
            component_loader_version: String::from("0.0.0"),
            cache_root: PathBuf::from(DEFAULT_CACHE_ROOT),
            global_components: BTreeMap::new(),
        }
    }
}

/// Interprets an environment flag. Unset, empty, `0`, and `false` are off.
#[must_use]
pub fn flag_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        let v = v.trim();
        !(v.is_empty() || v == "0" || v.eq_ignore_ascii_case("false"))
    })
}
