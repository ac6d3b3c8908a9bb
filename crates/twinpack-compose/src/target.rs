//! Target resolution.
//!
//! Turns the host's plugin options and the build environment into a
//! validated [`TargetDescriptor`], the only input every builder reads.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use twinpack_common::config::{BuildEnv, HostOptions};
use twinpack_common::error::{ConfigError, Result};
use twinpack_common::types::{BuildMode, ProcessKind};

/// Everything the compositor needs to know about one build invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDescriptor {
    /// Process being compiled.
    pub process: ProcessKind,
    /// Platform id.
    pub platform: String,
    /// Normalized root of the source tree.
    pub input_root: PathBuf,
    /// Normalized main entry, under `input_root`.
    pub main_entry: PathBuf,
    /// Build mode.
    pub mode: BuildMode,
    /// Analytics import enabled.
    pub using_stats: bool,
    /// Stage caching enabled.
    pub using_cache: bool,
    /// Running inside the packaged IDE.
    pub packaged_ide: bool,
}

impl TargetDescriptor {
    /// Checks the descriptor's invariants.
    ///
    /// # Errors
    ///
    /// Returns `Config` for an empty platform, `UnresolvedMainEntry` when the
    /// entry does not name a file, and `EntryOutsideRoot` when it escapes the
    /// input root.
    pub fn validate(&self) -> Result<()> {
        if self.platform.trim().is_empty() {
            return Err(ConfigError::Config {
                message: "platform id is empty".into(),
            });
        }
        let root = normalize(&self.input_root);
        let entry = normalize(&self.main_entry);
        check_entry(&entry, &root)
    }
}

/// Derives a target from host options and the build environment.
///
/// # Errors
///
/// Returns `AmbiguousTarget` unless exactly one of service/view is set, and
/// any error raised by [`TargetDescriptor::validate`].
pub fn resolve(options: &HostOptions, env: &BuildEnv) -> Result<TargetDescriptor> {
    let process = process_kind(options)?;
    let main_entry = env.main_entry.as_os_str();
    if main_entry.is_empty() {
        return Err(ConfigError::UnresolvedMainEntry {
            message: "no main entry configured".into(),
        });
    }
    let input_root = normalize(&env.input_dir);
    let main_entry = normalize(&input_root.join(&env.main_entry));

    let target = TargetDescriptor {
        process,
        platform: env.platform.clone(),
        input_root,
        main_entry,
        mode: env.mode,
        using_stats: env.using_stats,
        using_cache: env.using_cache,
        packaged_ide: env.packaged_ide,
    };
    target.validate()?;
    tracing::info!(
        process = %target.process,
        platform = %target.platform,
        entry = %target.main_entry.display(),
        "resolved build target"
    );
    Ok(target)
}

/// Maps the two mutually singular host flags onto a process kind.
///
/// # Errors
///
/// Returns `AmbiguousTarget` when neither or both flags are set.
pub fn process_kind(options: &HostOptions) -> Result<ProcessKind> {
    match (options.service, options.view) {
        (true, false) => Ok(ProcessKind::Service),
        (false, true) => Ok(ProcessKind::View),
        (service, view) => Err(ConfigError::AmbiguousTarget { service, view }),
    }
}

fn check_entry(entry: &Path, root: &Path) -> Result<()> {
    if entry == root || entry.file_name().is_none() {
        return Err(ConfigError::UnresolvedMainEntry {
            message: format!("{} does not name a file", entry.display()),
        });
    }
    if !entry.starts_with(root) {
        return Err(ConfigError::EntryOutsideRoot {
            entry: entry.to_path_buf(),
            root: root.to_path_buf(),
        });
    }
    Ok(())
}

/// Folds `.` and `..` components without touching the filesystem.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
