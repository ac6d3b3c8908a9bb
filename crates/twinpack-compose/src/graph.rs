//! Declarative build graph consumed by the bundler.
//!
//! The descriptor mirrors the bundler's configuration shape: an entry map,
//! ordered module rules, plugins, an optimization block, resolution settings,
//! and output naming. It carries no behavior beyond lookup helpers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use twinpack_common::error::{ConfigError, Result};
use twinpack_common::types::{BuildMode, LoaderId, PluginId, RuleId};

/// Complete build graph for one process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildGraphDescriptor {
    /// Bundler mode.
    pub mode: BuildMode,
    /// Entry name to entry module.
    pub entry: BTreeMap<String, PathBuf>,
    /// Output naming.
    pub output: OutputDescriptor,
    /// Module transformation rules.
    pub module: ModuleConfig,
    /// Registered plugins, in registration order.
    pub plugins: Vec<Plugin>,
    /// Chunking and emission policy.
    pub optimization: OptimizationPolicy,
    /// Module resolution settings.
    pub resolve: ResolveConfig,
    /// Loader resolution settings.
    pub resolve_loader: ResolveLoaderConfig,
    /// Modules provided by the runtime instead of being bundled.
    pub externals: BTreeMap<String, String>,
    /// Bundle size warnings.
    pub performance: PerformanceConfig,
}

impl BuildGraphDescriptor {
    /// Reads a host-supplied descriptor from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid descriptor.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "reading build graph");
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Serializes the descriptor to its canonical JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_canonical_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Returns the rule with the given identifier.
    #[must_use]
    pub fn rule(&self, id: &RuleId) -> Option<&Rule> {
        self.module.rules.iter().find(|r| &r.id == id)
    }

    /// Returns the rule with the given identifier, mutably.
    pub fn rule_mut(&mut self, id: &RuleId) -> Option<&mut Rule> {
        self.module.rules.iter_mut().find(|r| &r.id == id)
    }

    /// Returns the plugin with the given identifier.
    #[must_use]
    pub fn plugin(&self, id: &PluginId) -> Option<&Plugin> {
        self.plugins.iter().find(|p| &p.id == id)
    }

    /// Returns `true` if a plugin with the given identifier is registered.
    #[must_use]
    pub fn has_plugin(&self, id: &PluginId) -> bool {
        self.plugin(id).is_some()
    }
}

/// Output file naming.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputDescriptor {
    /// Pattern for entry bundles.
    pub filename: String,
    /// Pattern for non-entry chunks.
    pub chunk_filename: String,
    /// Global object the runtime attaches to.
    pub global_object: String,
}

/// The module section of the graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Rules in declaration order.
    pub rules: Vec<Rule>,
}

/// A resource test on the module path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceTest {
    /// Exact module path.
    Path(PathBuf),
    /// Regular expression source matched against the path.
    Pattern(String),
}

/// One transformation rule: a match condition plus an ordered loader chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Stage identifier.
    pub id: RuleId,
    /// Path tests; any match selects the rule.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test: Vec<ResourceTest>,
    /// Resource-query patterns; any match selects the rule.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_query: Vec<String>,
    /// Loaders in declaration order.
    #[serde(default, rename = "use")]
    pub uses: Vec<LoaderUse>,
}

impl Rule {
    /// Creates a rule with no condition and no loaders.
    #[must_use]
    pub const fn new(id: RuleId) -> Self {
        Self {
            id,
            test: Vec::new(),
            resource_query: Vec::new(),
            uses: Vec::new(),
        }
    }

    /// Adds a path test.
    #[must_use]
    pub fn with_test(mut self, test: ResourceTest) -> Self {
        self.test.push(test);
        self
    }

    /// Adds a resource-query pattern.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.resource_query.push(query.into());
        self
    }

    /// Appends a loader to the chain.
    #[must_use]
    pub fn with_loader(mut self, loader: LoaderUse) -> Self {
        self.uses.push(loader);
        self
    }

    /// Declaration index of a loader.
    #[must_use]
    pub fn position(&self, id: &LoaderId) -> Option<usize> {
        self.uses.iter().position(|u| &u.id == id)
    }

    /// Returns the loader with the given identifier.
    #[must_use]
    pub fn loader(&self, id: &LoaderId) -> Option<&LoaderUse> {
        self.uses.iter().find(|u| &u.id == id)
    }

    /// Loaders in the order the bundler runs them: last declared runs first.
    pub fn execution_order(&self) -> impl Iterator<Item = &LoaderUse> {
        self.uses.iter().rev()
    }
}

/// A loader reference with its options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderUse {
    /// Stage identifier.
    pub id: LoaderId,
    /// Module specifier the bundler resolves.
    pub loader: String,
    /// Loader options.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
}

impl LoaderUse {
    /// Creates a loader with its default specifier and no options.
    #[must_use]
    pub fn new(id: LoaderId) -> Self {
        let loader = id.specifier();
        Self {
            id,
            loader,
            options: Map::new(),
        }
    }

    /// Replaces the options with a serialized options struct.
    ///
    /// # Errors
    ///
    /// Returns an error if the options do not serialize to a JSON object.
    pub fn with_options<T: Serialize>(mut self, options: &T) -> Result<Self> {
        self.options = to_object(options)?;
        Ok(self)
    }
}

/// A bundler plugin with its options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plugin {
    /// Plugin identifier.
    pub id: PluginId,
    /// Plugin options.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
}

/// How the bundler extracts its runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuntimeChunkPolicy {
    /// Host default.
    #[default]
    None,
    /// Runtime emitted as a separate named chunk.
    Named(String),
    /// Runtime inlined into each entry.
    Disabled,
}

/// Source map emission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceMapPolicy {
    /// No source maps.
    #[default]
    Disabled,
    /// Source maps embedded in `eval` wrappers.
    EvalSourceMap,
}

/// Optimization block of the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OptimizationPolicy {
    /// Whether common modules are split into shared chunks.
    pub split_chunks: bool,
    /// Runtime chunk extraction.
    pub runtime_chunk: RuntimeChunkPolicy,
    /// Whether assets are emitted even when a module failed to build.
    pub emit_on_error: bool,
    /// Source map emission.
    pub source_map: SourceMapPolicy,
}

/// Module resolution settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Extensions tried when resolving extension-less imports.
    pub extensions: Vec<String>,
}

/// Loader resolution settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveLoaderConfig {
    /// Loader name to substitute specifier.
    pub alias: BTreeMap<String, String>,
}

/// Bundle size warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Whether oversized assets produce warnings.
    pub hints: bool,
}

/// Serializes a value that must be a JSON object.
pub(crate) fn to_object<T: Serialize>(value: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(ConfigError::Config {
            message: format!("loader options must serialize to an object, got {other}"),
        }),
    }
}
