//! Orchestrates the builders into a complete graph.
//!
//! Two modes are offered. [`ConfigComposer::compose`] builds a fresh graph
//! from nothing; [`ConfigComposer::mutate`] patches a graph the host already
//! owns. Both are pure functions of the target and the build environment.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use twinpack_common::config::{BuildEnv, HostOptions};
use twinpack_common::constants::{
    APP_STYLE_LOADER, FILTER_HELPER_MODULE, HOST_DEFAULT_ENTRY, OUTPUT_CHUNK_FILENAME,
    OUTPUT_FILENAME, OUTPUT_GLOBAL_OBJECT, RESOLVE_EXTENSIONS, RUNTIME_MODULE,
    SERVICE_RUNTIME_CHUNK, UNARY_TAGS,
};
use twinpack_common::error::Result;
use twinpack_common::types::{BuildMode, LoaderId, PluginId, ProcessKind, RuleId};

use crate::assets::AssetRuleComposer;
use crate::cache::{CacheComponent, CacheConfig, CacheKeyDeriver, CacheStage};
use crate::graph::{
    BuildGraphDescriptor, LoaderUse, ModuleConfig, OptimizationPolicy, OutputDescriptor,
    PerformanceConfig, ResolveConfig, ResolveLoaderConfig, ResourceTest, RuntimeChunkPolicy,
    SourceMapPolicy,
};
use crate::patch::{LoaderAnchor, MutationPass, Patch};
use crate::provide::GlobalSymbolBinder;
use crate::rules::RulePipelineBuilder;
use crate::target::{self, TargetDescriptor};

/// Template compiler options forwarded by the component loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    /// Tags compiled as self-closing.
    pub unary_tags: Vec<String>,
    /// Whether whitespace between tags is kept.
    pub preserve_whitespace: bool,
    /// Compiling for the service process.
    pub service: bool,
    /// Compiling for the view process.
    pub view: bool,
}

/// Options of the single-file component loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentLoaderOptions {
    /// Strip style blocks for the service process.
    pub is_app_service: bool,
    /// Return a fixed script for the view process.
    pub is_app_view: bool,
    /// Template compiler module.
    pub compiler: String,
    /// Options forwarded to the template compiler.
    pub compiler_options: CompilerOptions,
    /// Template compiler cache directory; `false` when not caching.
    #[serde(with = "false_when_none")]
    pub cache_directory: Option<PathBuf>,
    /// Template compiler cache identifier; `false` when not caching.
    #[serde(with = "false_when_none")]
    pub cache_identifier: Option<String>,
}

/// Encodes an absent cache setting as the literal `false` the component
/// loader expects.
mod false_when_none {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Setting<T> {
        Off(bool),
        On(T),
    }

    #[allow(clippy::ref_option)]
    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_bool(false),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        match Option::<Setting<T>>::deserialize(deserializer)? {
            Some(Setting::On(inner)) => Ok(Some(inner)),
            Some(Setting::Off(true)) => Err(D::Error::custom("expected a cache setting or false")),
            Some(Setting::Off(false)) | None => Ok(None),
        }
    }
}

/// Options of the cache stage in front of the component loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheLoaderOptions {
    /// Cache directory.
    pub cache_directory: PathBuf,
    /// Cache identifier.
    pub cache_identifier: String,
}

/// Project-level options the host must apply alongside the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOverrides {
    /// Whether loaders may run in worker threads.
    pub parallel: bool,
    /// Dependencies that must be transpiled rather than consumed as-is.
    pub transpile_dependencies: Vec<String>,
}

/// Project options for the dual-process target.
#[must_use]
pub fn project_overrides() -> ProjectOverrides {
    ProjectOverrides {
        parallel: false,
        transpile_dependencies: vec![FILTER_HELPER_MODULE.to_owned(), RUNTIME_MODULE.to_owned()],
    }
}

/// Optimization block for a target.
///
/// Chunk splitting is off because the two processes never share a module
/// cache. Emission continues past module errors; the packaging step reports
/// them.
#[must_use]
pub fn optimization_policy(target: &TargetDescriptor) -> OptimizationPolicy {
    let (runtime_chunk, source_map) = match target.process {
        ProcessKind::Service => {
            let source_map = if target.mode == BuildMode::Production {
                SourceMapPolicy::Disabled
            } else {
                SourceMapPolicy::EvalSourceMap
            };
            (RuntimeChunkPolicy::Named(SERVICE_RUNTIME_CHUNK.to_owned()), source_map)
        }
        ProcessKind::View => (RuntimeChunkPolicy::Disabled, SourceMapPolicy::Disabled),
    };
    OptimizationPolicy {
        split_chunks: false,
        runtime_chunk,
        emit_on_error: true,
        source_map,
    }
}

/// Composes build graphs for the service and view processes.
#[derive(Debug, Clone)]
pub struct ConfigComposer<'a> {
    env: &'a BuildEnv,
    binder: GlobalSymbolBinder,
}

impl<'a> ConfigComposer<'a> {
    /// Creates a composer over an explicit build environment.
    #[must_use]
    pub fn new(env: &'a BuildEnv) -> Self {
        Self {
            env,
            binder: GlobalSymbolBinder::new(),
        }
    }

    /// Replaces the provide binder.
    #[must_use]
    pub fn with_binder(mut self, binder: GlobalSymbolBinder) -> Self {
        self.binder = binder;
        self
    }

    /// Resolves the target from host options, then composes a fresh graph.
    ///
    /// # Errors
    ///
    /// Returns `AmbiguousTarget`, `EntryOutsideRoot`, or `UnresolvedMainEntry`
    /// from target resolution, and any error from [`Self::compose`].
    pub fn compose_from(&self, options: &HostOptions) -> Result<BuildGraphDescriptor> {
        let target = target::resolve(options, self.env)?;
        self.compose(&target)
    }

    /// Builds a complete graph for the target.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is invalid or provide bindings collide.
    pub fn compose(&self, target: &TargetDescriptor) -> Result<BuildGraphDescriptor> {
        self.build_fresh(target)
    }

    fn build_fresh(&self, target: &TargetDescriptor) -> Result<BuildGraphDescriptor> {
        target.validate()?;
        let rules = RulePipelineBuilder::new(self.env).build(target)?;

        let mut graph = BuildGraphDescriptor {
            mode: target.mode,
            output: OutputDescriptor {
                filename: OUTPUT_FILENAME.to_owned(),
                chunk_filename: OUTPUT_CHUNK_FILENAME.to_owned(),
                global_object: OUTPUT_GLOBAL_OBJECT.to_owned(),
            },
            module: ModuleConfig { rules },
            resolve: ResolveConfig {
                extensions: RESOLVE_EXTENSIONS.iter().map(|e| (*e).to_owned()).collect(),
            },
            resolve_loader: ResolveLoaderConfig {
                alias: BTreeMap::from([("vue-style-loader".to_owned(), APP_STYLE_LOADER.to_owned())]),
            },
            externals: BTreeMap::from([("vue".to_owned(), "Vue".to_owned())]),
            performance: PerformanceConfig { hints: false },
            ..BuildGraphDescriptor::default()
        };
        self.mutation_pass(target)?.apply(&mut graph)?;

        tracing::info!(
            process = %target.process,
            platform = %target.platform,
            rules = graph.module.rules.len(),
            "composed build graph"
        );
        Ok(graph)
    }

    /// Patches a host-supplied graph for the target.
    ///
    /// Applying the same mutation twice yields the same graph as applying it
    /// once.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is invalid or a patch cannot apply.
    pub fn mutate(
        &self,
        base: BuildGraphDescriptor,
        target: &TargetDescriptor,
    ) -> Result<BuildGraphDescriptor> {
        target.validate()?;
        let mut graph = base;
        let pass = self.mutation_pass(target)?;
        pass.apply(&mut graph)?;
        tracing::info!(
            process = %target.process,
            patches = pass.patches().len(),
            "mutated host build graph"
        );
        Ok(graph)
    }

    /// The ordered patches [`Self::mutate`] applies.
    ///
    /// # Errors
    ///
    /// Returns an error if loader options cannot be serialized.
    pub fn mutation_pass(&self, target: &TargetDescriptor) -> Result<MutationPass> {
        let assets = AssetRuleComposer::new().build(target)?;
        let deriver = CacheKeyDeriver::new(self.env);
        let template_cache = deriver.derive(
            &CacheComponent::for_stage(CacheStage::TemplateCompiler, self.env),
            target,
        )?;
        let loader_cache = deriver.derive(
            &CacheComponent::for_stage(CacheStage::ComponentLoader, self.env),
            target,
        )?;

        let provide = self.binder.bind(target)?;

        let pass = MutationPass::new()
            .then(Patch::RemoveEntry(HOST_DEFAULT_ENTRY.to_owned()))
            .then(Patch::UpsertEntry {
                name: target.process.entry_key().to_owned(),
                module: target.main_entry.clone(),
            })
            .then(Patch::SetOptimization(optimization_policy(target)))
            .extend(assets.into_iter().map(Patch::ReplaceRule))
            .then(Patch::EnsureRule {
                id: RuleId::Component,
                test: vec![
                    ResourceTest::Pattern(r"\.vue$".to_owned()),
                    ResourceTest::Pattern(r"\.nvue$".to_owned()),
                ],
            })
            .then(Patch::AppendLoader {
                rule: RuleId::Component,
                loader: self.component_loader(target, &template_cache)?,
                anchor: LoaderAnchor::End,
            })
            .then(cache_stage_patch(&loader_cache)?)
            .then(Patch::UpsertPlugin(provide.to_plugin()?))
            .extend(PluginId::WEB_ONLY.into_iter().map(Patch::RemovePlugin));
        Ok(pass)
    }

    fn component_loader(
        &self,
        target: &TargetDescriptor,
        template_cache: &CacheConfig,
    ) -> Result<LoaderUse> {
        let service = target.process.is_service();
        let view = target.process.is_view();
        let options = ComponentLoaderOptions {
            is_app_service: service,
            is_app_view: view,
            compiler: self.env.template_compiler.clone(),
            compiler_options: CompilerOptions {
                unary_tags: UNARY_TAGS.iter().map(|t| (*t).to_owned()).collect(),
                preserve_whitespace: false,
                service,
                view,
            },
            cache_directory: template_cache.directory.clone(),
            cache_identifier: template_cache.identifier.clone(),
        };
        LoaderUse::new(LoaderId::ComponentLoader).with_options(&options)
    }
}

fn cache_stage_patch(cache: &CacheConfig) -> Result<Patch> {
    let (Some(directory), Some(identifier)) = (&cache.directory, &cache.identifier) else {
        return Ok(Patch::RemoveLoader {
            rule: RuleId::Component,
            loader: LoaderId::CacheLoader,
        });
    };
    let options = CacheLoaderOptions {
        cache_directory: directory.clone(),
        cache_identifier: identifier.clone(),
    };
    Ok(Patch::AppendLoader {
        rule: RuleId::Component,
        loader: LoaderUse::new(LoaderId::CacheLoader).with_options(&options)?,
        anchor: LoaderAnchor::Before(LoaderId::ComponentLoader),
    })
}
