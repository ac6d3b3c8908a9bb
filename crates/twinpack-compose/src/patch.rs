//! Ordered patch operations over a host-owned build graph.
//!
//! Every operation is either an upsert or a remove-if-present, so applying
//! the same [`MutationPass`] twice leaves the graph unchanged the second time.

use std::path::PathBuf;

use twinpack_common::error::{ConfigError, Result};
use twinpack_common::types::{LoaderId, PluginId, RuleId};

use crate::graph::{BuildGraphDescriptor, LoaderUse, OptimizationPolicy, Plugin, ResourceTest, Rule};

/// Where a loader is inserted when it is not yet part of the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderAnchor {
    /// After every declared loader.
    End,
    /// Immediately before the given loader, or at the end if it is absent.
    Before(LoaderId),
}

/// A single named patch operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    /// Drops an entry point.
    RemoveEntry(String),
    /// Sets an entry point, replacing any module already bound to the name.
    UpsertEntry {
        /// Entry name.
        name: String,
        /// Entry module.
        module: PathBuf,
    },
    /// Overwrites the optimization block.
    SetOptimization(OptimizationPolicy),
    /// Drops a rule.
    RemoveRule(RuleId),
    /// Replaces a rule in place, or appends it.
    ReplaceRule(Rule),
    /// Creates the rule if missing and sets its path tests.
    EnsureRule {
        /// Rule to ensure.
        id: RuleId,
        /// Path tests the rule must carry.
        test: Vec<ResourceTest>,
    },
    /// Upserts a loader: merges options into an existing stage, or inserts it.
    AppendLoader {
        /// Rule owning the chain.
        rule: RuleId,
        /// Loader to upsert.
        loader: LoaderUse,
        /// Insertion point for a new stage.
        anchor: LoaderAnchor,
    },
    /// Drops a loader from a rule's chain.
    RemoveLoader {
        /// Rule owning the chain.
        rule: RuleId,
        /// Loader to drop.
        loader: LoaderId,
    },
    /// Replaces a plugin's options in place, or registers it.
    UpsertPlugin(Plugin),
    /// Unregisters a plugin.
    RemovePlugin(PluginId),
}

impl Patch {
    fn apply(&self, graph: &mut BuildGraphDescriptor) -> Result<()> {
        match self {
            Self::RemoveEntry(name) => {
                let _ = graph.entry.remove(name);
            }
            Self::UpsertEntry { name, module } => {
                let _ = graph.entry.insert(name.clone(), module.clone());
            }
            Self::SetOptimization(policy) => graph.optimization.clone_from(policy),
            Self::RemoveRule(id) => graph.module.rules.retain(|r| &r.id != id),
            Self::ReplaceRule(rule) => {
                if let Some(existing) = graph.rule_mut(&rule.id) {
                    existing.clone_from(rule);
                } else {
                    graph.module.rules.push(rule.clone());
                }
            }
            Self::EnsureRule { id, test } => {
                if let Some(existing) = graph.rule_mut(id) {
                    existing.test.clone_from(test);
                } else {
                    let mut rule = Rule::new(id.clone());
                    rule.test.clone_from(test);
                    graph.module.rules.push(rule);
                }
            }
            Self::AppendLoader {
                rule,
                loader,
                anchor,
            } => {
                let target = graph.rule_mut(rule).ok_or_else(|| ConfigError::Config {
                    message: format!("cannot add loader {} to missing rule {rule}", loader.id),
                })?;
                upsert_loader(target, loader, anchor);
            }
            Self::RemoveLoader { rule, loader } => {
                if let Some(target) = graph.rule_mut(rule) {
                    target.uses.retain(|u| &u.id != loader);
                }
            }
            Self::UpsertPlugin(plugin) => {
                if let Some(existing) = graph.plugins.iter_mut().find(|p| p.id == plugin.id) {
                    existing.options.clone_from(&plugin.options);
                } else {
                    graph.plugins.push(plugin.clone());
                }
            }
            Self::RemovePlugin(id) => graph.plugins.retain(|p| &p.id != id),
        }
        Ok(())
    }
}

fn upsert_loader(rule: &mut Rule, loader: &LoaderUse, anchor: &LoaderAnchor) {
    if let Some(existing) = rule.uses.iter_mut().find(|u| u.id == loader.id) {
        existing.loader.clone_from(&loader.loader);
        for (key, value) in &loader.options {
            let _ = existing.options.insert(key.clone(), value.clone());
        }
        return;
    }
    let index = match anchor {
        LoaderAnchor::End => None,
        LoaderAnchor::Before(id) => rule.position(id),
    };
    match index {
        Some(i) => rule.uses.insert(i, loader.clone()),
        None => rule.uses.push(loader.clone()),
    }
}

/// An ordered sequence of patches applied as one unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationPass {
    patches: Vec<Patch>,
}

impl MutationPass {
    /// Creates an empty pass.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a patch.
    #[must_use]
    pub fn then(mut self, patch: Patch) -> Self {
        self.patches.push(patch);
        self
    }

    /// Appends every patch from an iterator.
    #[must_use]
    pub fn extend(mut self, patches: impl IntoIterator<Item = Patch>) -> Self {
        self.patches.extend(patches);
        self
    }

    /// Patches in application order.
    #[must_use]
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// Applies every patch in order.
    ///
    /// # Errors
    ///
    /// Returns an error if a patch references a rule that does not exist.
    pub fn apply(&self, graph: &mut BuildGraphDescriptor) -> Result<()> {
        for patch in &self.patches {
            tracing::debug!(?patch, "applying patch");
            patch.apply(graph)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::graph::RuntimeChunkPolicy;

    fn component_rule() -> Rule {
        Rule::new(RuleId::Component).with_loader(LoaderUse::new(LoaderId::ComponentLoader))
    }

    fn loader_with(id: LoaderId, key: &str, value: serde_json::Value) -> LoaderUse {
        let mut loader = LoaderUse::new(id);
        let _ = loader.options.insert(key.into(), value);
        loader
    }

    #[test]
    fn insert_before_anchor() {
        let mut graph = BuildGraphDescriptor::default();
        graph.module.rules.push(component_rule());
        MutationPass::new()
            .then(Patch::AppendLoader {
                rule: RuleId::Component,
                loader: LoaderUse::new(LoaderId::CacheLoader),
                anchor: LoaderAnchor::Before(LoaderId::ComponentLoader),
            })
            .apply(&mut graph)
            .expect("apply");
        let rule = graph.rule(&RuleId::Component).expect("rule");
        assert_eq!(rule.position(&LoaderId::CacheLoader), Some(0));
        assert_eq!(rule.position(&LoaderId::ComponentLoader), Some(1));
    }

    #[test]
    fn append_loader_twice_does_not_duplicate() {
        let mut graph = BuildGraphDescriptor::default();
        graph.module.rules.push(component_rule());
        let pass = MutationPass::new().then(Patch::AppendLoader {
            rule: RuleId::Component,
            loader: loader_with(LoaderId::CacheLoader, "cacheDirectory", json!("/tmp/c")),
            anchor: LoaderAnchor::Before(LoaderId::ComponentLoader),
        });
        pass.apply(&mut graph).expect("first");
        pass.apply(&mut graph).expect("second");
        let rule = graph.rule(&RuleId::Component).expect("rule");
        assert_eq!(rule.uses.len(), 2);
    }

    #[test]
    fn append_loader_merges_into_existing_options() {
        let mut graph = BuildGraphDescriptor::default();
        graph.module.rules.push(
            Rule::new(RuleId::Component)
                .with_loader(loader_with(LoaderId::ComponentLoader, "hotReload", json!(true))),
        );
        MutationPass::new()
            .then(Patch::AppendLoader {
                rule: RuleId::Component,
                loader: loader_with(LoaderId::ComponentLoader, "isAppView", json!(true)),
                anchor: LoaderAnchor::End,
            })
            .apply(&mut graph)
            .expect("apply");
        let loader = graph
            .rule(&RuleId::Component)
            .and_then(|r| r.loader(&LoaderId::ComponentLoader))
            .expect("loader");
        assert_eq!(loader.options.get("hotReload"), Some(&json!(true)));
        assert_eq!(loader.options.get("isAppView"), Some(&json!(true)));
    }

    #[test]
    fn append_loader_to_missing_rule_fails() {
        let mut graph = BuildGraphDescriptor::default();
        let result = MutationPass::new()
            .then(Patch::AppendLoader {
                rule: RuleId::Component,
                loader: LoaderUse::new(LoaderId::CacheLoader),
                anchor: LoaderAnchor::End,
            })
            .apply(&mut graph);
        assert!(result.is_err());
    }

    #[test]
    fn replace_rule_keeps_position() {
        let mut graph = BuildGraphDescriptor::default();
        graph.module.rules.push(Rule::new(RuleId::Host("js".into())));
        graph.module.rules.push(Rule::new(RuleId::Svg));
        graph.module.rules.push(Rule::new(RuleId::Host("css".into())));
        let replacement = Rule::new(RuleId::Svg).with_loader(LoaderUse::new(LoaderId::UrlLoader));
        MutationPass::new()
            .then(Patch::ReplaceRule(replacement.clone()))
            .apply(&mut graph)
            .expect("apply");
        assert_eq!(graph.module.rules.len(), 3);
        assert_eq!(graph.module.rules[1], replacement);
    }

    #[test]
    fn removals_tolerate_absence() {
        let mut graph = BuildGraphDescriptor::default();
        graph.plugins.push(Plugin {
            id: PluginId::Html,
            options: serde_json::Map::new(),
        });
        let pass = MutationPass::new()
            .then(Patch::RemoveEntry("app".into()))
            .then(Patch::RemoveRule(RuleId::Fonts))
            .then(Patch::RemoveLoader {
                rule: RuleId::Component,
                loader: LoaderId::CacheLoader,
            })
            .then(Patch::RemovePlugin(PluginId::Html))
            .then(Patch::RemovePlugin(PluginId::Copy));
        pass.apply(&mut graph).expect("apply");
        assert!(graph.plugins.is_empty());
    }

    #[test]
    fn ensure_rule_creates_then_updates() {
        let mut graph = BuildGraphDescriptor::default();
        let test = vec![ResourceTest::Pattern(r"\.vue$".into())];
        let pass = MutationPass::new().then(Patch::EnsureRule {
            id: RuleId::Component,
            test: test.clone(),
        });
        pass.apply(&mut graph).expect("first");
        pass.apply(&mut graph).expect("second");
        assert_eq!(graph.module.rules.len(), 1);
        assert_eq!(graph.module.rules[0].test, test);
    }

    #[test]
    fn upsert_entry_replaces_module() {
        let mut graph = BuildGraphDescriptor::default();
        let _ = graph.entry.insert("app-view".into(), PathBuf::from("/old/main.js"));
        let pass = MutationPass::new().then(Patch::UpsertEntry {
            name: "app-view".into(),
            module: PathBuf::from("/proj/main.js"),
        });
        pass.apply(&mut graph).expect("first");
        pass.apply(&mut graph).expect("second");
        assert_eq!(graph.entry.len(), 1);
        assert_eq!(graph.entry["app-view"], PathBuf::from("/proj/main.js"));
    }

    #[test]
    fn set_optimization_overwrites_host_block() {
        let mut graph = BuildGraphDescriptor::default();
        graph.optimization.split_chunks = true;
        let policy = OptimizationPolicy {
            split_chunks: false,
            runtime_chunk: RuntimeChunkPolicy::Disabled,
            emit_on_error: true,
            ..OptimizationPolicy::default()
        };
        MutationPass::new()
            .then(Patch::SetOptimization(policy.clone()))
            .apply(&mut graph)
            .expect("apply");
        assert_eq!(graph.optimization, policy);
    }

    #[test]
    fn upsert_plugin_replaces_options_without_duplicating() {
        let mut graph = BuildGraphDescriptor::default();
        let mut stale = serde_json::Map::new();
        let _ = stale.insert("Page".into(), json!(["stale", "Page"]));
        graph.plugins.push(Plugin {
            id: PluginId::Provide,
            options: stale,
        });
        let mut fresh = serde_json::Map::new();
        let _ = fresh.insert("__f__".into(), json!(["log", "default"]));
        let pass = MutationPass::new().then(Patch::UpsertPlugin(Plugin {
            id: PluginId::Provide,
            options: fresh.clone(),
        }));
        pass.apply(&mut graph).expect("first");
        pass.apply(&mut graph).expect("second");
        assert_eq!(graph.plugins.len(), 1);
        assert_eq!(graph.plugins[0].options, fresh);
    }
}
