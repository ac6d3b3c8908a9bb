//! Cache identifiers for the compiler stages.
//!
//! The structural template compiler and the component loader keep separate
//! namespaces: each has its own directory and its own identifier, so bumping
//! one stage's version leaves the other stage's cache valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use twinpack_common::config::BuildEnv;
use twinpack_common::error::Result;
use twinpack_common::types::{BuildMode, ProcessKind};

use crate::target::TargetDescriptor;

/// Cached compiler stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheStage {
    /// Structural template compilation.
    TemplateCompiler,
    /// Single-file component loading.
    ComponentLoader,
}

impl CacheStage {
    /// Namespace the stage's cache lives under.
    #[must_use]
    pub const fn namespace(self) -> &'static str {
        match self {
            Self::TemplateCompiler => "vue-template-compiler",
            Self::ComponentLoader => "vue-loader",
        }
    }
}

/// A stage together with the version of the component implementing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheComponent {
    /// The stage.
    pub stage: CacheStage,
    /// Version of the implementing component.
    pub version: String,
}

impl CacheComponent {
    /// Picks the stage version out of the build environment.
    #[must_use]
    pub fn for_stage(stage: CacheStage, env: &BuildEnv) -> Self {
        let version = match stage {
            CacheStage::TemplateCompiler => env.template_compiler_version.clone(),
            CacheStage::ComponentLoader => env.component_loader_version.clone(),
        };
        Self { stage, version }
    }
}

/// Cache settings for one stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// Whether the stage is cached.
    pub enabled: bool,
    /// Cache directory.
    pub directory: Option<PathBuf>,
    /// Identifier invalidating stale entries.
    pub identifier: Option<String>,
}

impl CacheConfig {
    /// Caching switched off.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            directory: None,
            identifier: None,
        }
    }
}

#[derive(Serialize)]
struct OptionFingerprint {
    process: ProcessKind,
    mode: BuildMode,
    using_stats: bool,
    packaged_ide: bool,
}

#[derive(Serialize)]
struct CacheKey<'a> {
    namespace: &'a str,
    version: &'a str,
    platform: &'a str,
    fingerprint: OptionFingerprint,
}

/// Derives cache settings from the target.
#[derive(Debug, Clone)]
pub struct CacheKeyDeriver<'a> {
    cache_root: &'a Path,
}

impl<'a> CacheKeyDeriver<'a> {
    /// Creates a deriver placing caches under `env.cache_root`.
    #[must_use]
    pub fn new(env: &'a BuildEnv) -> Self {
        Self {
            cache_root: &env.cache_root,
        }
    }

    /// Derives the cache settings of one stage.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache key cannot be serialized.
    pub fn derive(
        &self,
        component: &CacheComponent,
        target: &TargetDescriptor,
    ) -> Result<CacheConfig> {
        if !target.using_cache {
            return Ok(CacheConfig::disabled());
        }
        let namespace = component.stage.namespace();
        let key = CacheKey {
            namespace,
            version: &component.version,
            platform: &target.platform,
            fingerprint: OptionFingerprint {
                process: target.process,
                mode: target.mode,
                using_stats: target.using_stats,
                packaged_ide: target.packaged_ide,
            },
        };
        let digest = Sha256::digest(serde_json::to_vec(&key)?);
        let identifier = format!("{digest:x}");
        let directory = self.cache_root.join(namespace).join(&target.platform);
        tracing::debug!(
            namespace,
            directory = %directory.display(),
            identifier = %identifier,
            "derived cache config"
        );
        Ok(CacheConfig {
            enabled: true,
            directory: Some(directory),
            identifier: Some(identifier),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(using_cache: bool) -> TargetDescriptor {
        TargetDescriptor {
            process: ProcessKind::Service,
            platform: "weixin".into(),
            input_root: PathBuf::from("/proj"),
            main_entry: PathBuf::from("/proj/main.js"),
            mode: BuildMode::Development,
            using_stats: false,
            using_cache,
            packaged_ide: false,
        }
    }

    fn env() -> BuildEnv {
        BuildEnv {
            platform: "weixin".into(),
            template_compiler_version: "2.6.11".into(),
            component_loader_version: "15.9.8".into(),
            cache_root: PathBuf::from("/cache"),
            ..BuildEnv::default()
        }
    }

    #[test]
    fn disabled_when_cache_is_off() {
        let env = env();
        let component = CacheComponent::for_stage(CacheStage::ComponentLoader, &env);
        let config = CacheKeyDeriver::new(&env)
            .derive(&component, &target(false))
            .expect("derive");
        assert_eq!(config, CacheConfig::disabled());
    }

    #[test]
    fn enabled_config_has_namespaced_directory() {
        let env = env();
        let component = CacheComponent::for_stage(CacheStage::TemplateCompiler, &env);
        let config = CacheKeyDeriver::new(&env)
            .derive(&component, &target(true))
            .expect("derive");
        assert!(config.enabled);
        assert_eq!(
            config.directory,
            Some(PathBuf::from("/cache/vue-template-compiler/weixin"))
        );
        let id = config.identifier.expect("identifier");
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn stages_have_independent_identifiers() {
        let env = env();
        let deriver = CacheKeyDeriver::new(&env);
        let template = CacheComponent::for_stage(CacheStage::TemplateCompiler, &env);
        let loader = CacheComponent::for_stage(CacheStage::ComponentLoader, &env);
        let a = deriver.derive(&template, &target(true)).expect("template");
        let b = deriver.derive(&loader, &target(true)).expect("loader");
        assert_ne!(a.identifier, b.identifier);
        assert_ne!(a.directory, b.directory);
    }

    #[test]
    fn bumping_one_stage_leaves_the_other_untouched() {
        let env = env();
        let mut bumped = env.clone();
        bumped.component_loader_version = "16.0.0".into();

        let template_before = CacheKeyDeriver::new(&env)
            .derive(&CacheComponent::for_stage(CacheStage::TemplateCompiler, &env), &target(true))
            .expect("derive");
        let template_after = CacheKeyDeriver::new(&bumped)
            .derive(&CacheComponent::for_stage(CacheStage::TemplateCompiler, &bumped), &target(true))
            .expect("derive");
        assert_eq!(template_before, template_after);

        let loader_before = CacheKeyDeriver::new(&env)
            .derive(&CacheComponent::for_stage(CacheStage::ComponentLoader, &env), &target(true))
            .expect("derive");
        let loader_after = CacheKeyDeriver::new(&bumped)
            .derive(&CacheComponent::for_stage(CacheStage::ComponentLoader, &bumped), &target(true))
            .expect("derive");
        assert_ne!(loader_before.identifier, loader_after.identifier);
    }

    #[test]
    fn fingerprint_covers_process_kind() {
        let env = env();
        let deriver = CacheKeyDeriver::new(&env);
        let component = CacheComponent::for_stage(CacheStage::ComponentLoader, &env);
        let service = deriver.derive(&component, &target(true)).expect("service");
        let mut view_target = target(true);
        view_target.process = ProcessKind::View;
        let view = deriver.derive(&component, &view_target).expect("view");
        assert_ne!(service.identifier, view.identifier);
    }

    #[test]
    fn derivation_is_deterministic() {
        let env = env();
        let deriver = CacheKeyDeriver::new(&env);
        let component = CacheComponent::for_stage(CacheStage::ComponentLoader, &env);
        let a = deriver.derive(&component, &target(true)).expect("a");
        let b = deriver.derive(&component, &target(true)).expect("b");
        assert_eq!(a, b);
    }
}
