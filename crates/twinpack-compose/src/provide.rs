//! Link-time provide bindings.
//!
//! Generated code refers to a handful of free identifiers (`__f__`, `wx`,
//! `Page`, ...). The bundler's provide plugin substitutes each one with a
//! module export; this module decides which identifiers are bound for which
//! process.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::{Deserialize, Serialize};
use twinpack_common::constants::{FILTER_HELPER_MODULE, FORMAT_LOG_MODULE, RUNTIME_MODULE};
use twinpack_common::error::{ConfigError, Result};
use twinpack_common::types::PluginId;

use crate::graph::{Plugin, to_object};
use crate::target::TargetDescriptor;

/// Module export bound to an identifier, serialized as `[module, export]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvideTarget(String, String);

impl ProvideTarget {
    /// Creates a binding target.
    #[must_use]
    pub fn new(module: impl Into<String>, export: impl Into<String>) -> Self {
        Self(module.into(), export.into())
    }

    /// Module path.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.0
    }

    /// Export name.
    #[must_use]
    pub fn export(&self) -> &str {
        &self.1
    }
}

/// One identifier binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvideBinding {
    /// Free identifier in generated code.
    pub key: String,
    /// Export it resolves to.
    pub target: ProvideTarget,
}

impl ProvideBinding {
    /// Creates a binding.
    #[must_use]
    pub fn new(key: impl Into<String>, module: &str, export: &str) -> Self {
        Self {
            key: key.into(),
            target: ProvideTarget::new(module, export),
        }
    }
}

/// Validated identifier bindings for one target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvideMap(BTreeMap<String, ProvideTarget>);

impl ProvideMap {
    /// Looks up an identifier.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ProvideTarget> {
        self.0.get(key)
    }

    /// Number of bound identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Bound identifiers in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Wraps the map as the provide plugin registration.
    ///
    /// # Errors
    ///
    /// Returns an error if the map cannot be serialized.
    pub fn to_plugin(&self) -> Result<Plugin> {
        Ok(Plugin {
            id: PluginId::Provide,
            options: to_object(self)?,
        })
    }

    fn insert(&mut self, binding: &ProvideBinding) -> Result<()> {
        match self.0.entry(binding.key.clone()) {
            Entry::Occupied(_) => Err(ConfigError::DuplicateProvideKey {
                key: binding.key.clone(),
            }),
            Entry::Vacant(slot) => {
                let _ = slot.insert(binding.target.clone());
                Ok(())
            }
        }
    }
}

/// Computes the provide bindings for a target.
#[derive(Debug, Clone)]
pub struct GlobalSymbolBinder {
    baseline: Vec<ProvideBinding>,
    service: Vec<ProvideBinding>,
}

impl Default for GlobalSymbolBinder {
    fn default() -> Self {
        Self::with_sets(baseline_bindings(), service_bindings())
    }
}

impl GlobalSymbolBinder {
    /// Creates a binder with the stock binding sets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a binder with custom binding sets.
    #[must_use]
    pub const fn with_sets(baseline: Vec<ProvideBinding>, service: Vec<ProvideBinding>) -> Self {
        Self { baseline, service }
    }

    /// Binds the baseline set, plus the runtime framework set for the service.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateProvideKey` if any identifier is bound twice. A later
    /// binding never overrides an earlier one.
    pub fn bind(&self, target: &TargetDescriptor) -> Result<ProvideMap> {
        let mut map = ProvideMap::default();
        for binding in &self.baseline {
            map.insert(binding)?;
        }
        if target.process.is_service() {
            for binding in &self.service {
                map.insert(binding)?;
            }
        }
        tracing::debug!(process = %target.process, bindings = map.len(), "bound provide map");
        Ok(map)
    }
}

fn baseline_bindings() -> Vec<ProvideBinding> {
    vec![
        ProvideBinding::new("__f__", FORMAT_LOG_MODULE, "default"),
        ProvideBinding::new("getDate", FILTER_HELPER_MODULE, "getDate"),
        ProvideBinding::new("getRegExp", FILTER_HELPER_MODULE, "getRegExp"),
    ]
}

fn service_bindings() -> Vec<ProvideBinding> {
    vec![
        ProvideBinding::new("wx", RUNTIME_MODULE, "default"),
        ProvideBinding::new("wx.nextTick", RUNTIME_MODULE, "nextTick"),
        ProvideBinding::new("Page", RUNTIME_MODULE, "Page"),
        ProvideBinding::new("Component", RUNTIME_MODULE, "Component"),
        ProvideBinding::new("Behavior", RUNTIME_MODULE, "Behavior"),
    ]
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use twinpack_common::types::{BuildMode, ProcessKind};

    use super::*;

    fn target(process: ProcessKind) -> TargetDescriptor {
        TargetDescriptor {
            process,
            platform: "app-plus".into(),
            input_root: PathBuf::from("/proj"),
            main_entry: PathBuf::from("/proj/main.js"),
            mode: BuildMode::Development,
            using_stats: false,
            using_cache: false,
            packaged_ide: false,
        }
    }

    #[test]
    fn view_gets_baseline_only() {
        let map = GlobalSymbolBinder::new()
            .bind(&target(ProcessKind::View))
            .expect("bind");
        let keys: Vec<_> = map.keys().collect();
        assert_eq!(keys, vec!["__f__", "getDate", "getRegExp"]);
    }

    #[test]
    fn service_adds_runtime_framework() {
        let map = GlobalSymbolBinder::new()
            .bind(&target(ProcessKind::Service))
            .expect("bind");
        assert_eq!(map.len(), 8);
        let next_tick = map.get("wx.nextTick").expect("wx.nextTick");
        assert_eq!(next_tick.module(), RUNTIME_MODULE);
        assert_eq!(next_tick.export(), "nextTick");
        assert_eq!(map.get("__f__").map(ProvideTarget::export), Some("default"));
    }

    #[test]
    fn collision_across_sets_is_an_error() {
        let binder = GlobalSymbolBinder::with_sets(
            baseline_bindings(),
            vec![ProvideBinding::new("getDate", RUNTIME_MODULE, "getDate")],
        );
        let err = binder.bind(&target(ProcessKind::Service)).unwrap_err();
        assert!(
            matches!(err, ConfigError::DuplicateProvideKey { ref key } if key == "getDate"),
            "got: {err}"
        );
        assert!(binder.bind(&target(ProcessKind::View)).is_ok());
    }

    #[test]
    fn collision_within_a_set_is_an_error() {
        let binder = GlobalSymbolBinder::with_sets(
            vec![
                ProvideBinding::new("__f__", FORMAT_LOG_MODULE, "default"),
                ProvideBinding::new("__f__", FORMAT_LOG_MODULE, "other"),
            ],
            Vec::new(),
        );
        assert!(binder.bind(&target(ProcessKind::View)).is_err());
    }

    #[test]
    fn plugin_options_serialize_as_pairs() {
        let map = GlobalSymbolBinder::new()
            .bind(&target(ProcessKind::View))
            .expect("bind");
        let plugin = map.to_plugin().expect("plugin");
        assert_eq!(plugin.id, PluginId::Provide);
        assert_eq!(
            plugin.options.get("getRegExp"),
            Some(&serde_json::json!([FILTER_HELPER_MODULE, "getRegExp"]))
        );
    }
}
